//! Command-line interface for css-grammar
//! This binary parses value definition grammars and inspects the reconciled property and syntax tables.
//!
//! Usage:
//!   css-grammar parse `<grammar>` [--format `<format>`]   - Parse and print a grammar
//!   css-grammar types `<grammar>`                         - Data types a grammar references
//!   css-grammar dissolve `<grammar>`                      - Data types a grammar reaches
//!   css-grammar validate `<source>` `<patch>`             - Check a patch against its source
//!   css-grammar property `<name>` / syntax `<name>`       - Effective syntax
//!   css-grammar list properties|syntaxes                  - Effective tables
//!   css-grammar check                                     - Check every configured patch
//!
//! Global flags: `--config <file>` layers a TOML file over the defaults,
//! `--max-depth <n>` limits data type resolution.

mod commands;

use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use css_grammar_config::{CssGrammarConfig, Loader};
use std::process::ExitCode;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt::SubscriberBuilder;

fn cli() -> Command {
    Command::new("css-grammar")
        .version(env!("CARGO_PKG_VERSION"))
        .about("A tool for parsing CSS value grammars and reconciling them with curated patches")
        .arg_required_else_help(true)
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .help("TOML file layered over the built-in defaults")
                .global(true),
        )
        .arg(
            Arg::new("max-depth")
                .long("max-depth")
                .help("Levels of data types to expand (default: until nothing new turns up)")
                .value_parser(value_parser!(usize))
                .global(true),
        )
        .subcommand(
            Command::new("parse")
                .about("Parse a grammar and print its tree")
                .arg(Arg::new("grammar").required(true).index(1))
                .arg(
                    Arg::new("format")
                        .long("format")
                        .short('f')
                        .help("Output format")
                        .value_parser(["canonical", "treeviz", "json"])
                        .default_value("canonical"),
                ),
        )
        .subcommand(
            Command::new("types")
                .about("List the data types a grammar references")
                .arg(Arg::new("grammar").required(true).index(1)),
        )
        .subcommand(
            Command::new("dissolve")
                .about("List every data type a grammar reaches through the compatibility data")
                .arg(Arg::new("grammar").required(true).index(1)),
        )
        .subcommand(
            Command::new("validate")
                .about("Check that a patch keeps every type of its source and adds one")
                .arg(Arg::new("source").required(true).index(1))
                .arg(Arg::new("patch").required(true).index(2))
                .arg(
                    Arg::new("property")
                        .long("property")
                        .help("Resolve types in the compatibility context of this property"),
                ),
        )
        .subcommand(
            Command::new("property")
                .about("Print the effective syntax of a property")
                .arg(Arg::new("name").required(true).index(1)),
        )
        .subcommand(
            Command::new("syntax")
                .about("Print the effective syntax of a data type")
                .arg(Arg::new("name").required(true).index(1)),
        )
        .subcommand(
            Command::new("list")
                .about("Print an effective table")
                .arg(
                    Arg::new("table")
                        .required(true)
                        .index(1)
                        .value_parser(["properties", "syntaxes"]),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .help("Print the full definitions as JSON")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(Command::new("check").about("Check every configured patch against its source"))
}

/// Load the configuration, layering `--config` and `--max-depth` over the defaults
fn load_config(matches: &ArgMatches) -> CssGrammarConfig {
    let mut loader = Loader::new();
    if let Some(path) = matches.get_one::<String>("config") {
        loader = loader.with_file(path);
    }
    loader
        .with_max_depth(matches.get_one::<usize>("max-depth").copied())
        .unwrap_or_else(|e| commands::fail(format!("Invalid --max-depth: {}", e)))
        .build()
        .unwrap_or_else(|e| commands::fail(format!("Configuration error: {}", e)))
}

/// Diagnostics go to stderr so stdout stays machine readable
fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = SubscriberBuilder::default()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let matches = cli().get_matches();
    let config = load_config(&matches);
    init_tracing(&config.logging.level);

    match matches.subcommand() {
        Some(("parse", sub)) => {
            let grammar = sub.get_one::<String>("grammar").expect("grammar is required");
            let format = sub.get_one::<String>("format").expect("format has a default");
            commands::handle_parse_command(grammar, format)
        }
        Some(("types", sub)) => {
            let grammar = sub.get_one::<String>("grammar").expect("grammar is required");
            commands::handle_types_command(grammar)
        }
        Some(("dissolve", sub)) => {
            let grammar = sub.get_one::<String>("grammar").expect("grammar is required");
            commands::handle_dissolve_command(&config, grammar).await
        }
        Some(("validate", sub)) => {
            let source = sub.get_one::<String>("source").expect("source is required");
            let patch = sub.get_one::<String>("patch").expect("patch is required");
            let property = sub.get_one::<String>("property").map(String::as_str);
            commands::handle_validate_command(&config, source, patch, property).await
        }
        Some(("property", sub)) => {
            let name = sub.get_one::<String>("name").expect("name is required");
            commands::handle_property_command(&config, name).await
        }
        Some(("syntax", sub)) => {
            let name = sub.get_one::<String>("name").expect("name is required");
            commands::handle_syntax_command(&config, name).await
        }
        Some(("list", sub)) => {
            let table = sub.get_one::<String>("table").expect("table is required");
            commands::handle_list_command(&config, table, sub.get_flag("json")).await
        }
        Some(("check", _)) => commands::handle_check_command(&config).await,
        _ => unreachable!("a subcommand is required"),
    }
}
