//! Subcommand handlers
//!
//! Handlers print results on stdout and return the exit code. Errors are
//! reported on stderr and end the process with status 1. A patch that fails its
//! check exits with status 2.

use css_grammar::css::syntax::{parse, to_treeviz_str, SyntaxNode};
use css_grammar::css::{
    assess_patch, create_property_data_type_resolver, resolve_data_types, typing, CompatCategory,
    CompatibilityProvider, CompatibilityRecord, CssData, Layers, PatchStatus,
    StaticCompatibility,
};
use css_grammar_config::CssGrammarConfig;
use std::fmt::Display;
use std::process::ExitCode;

const INVALID: u8 = 2;

/// Report an error and exit
pub fn fail(message: impl Display) -> ! {
    eprintln!("{}", message);
    std::process::exit(1);
}

fn parse_or_fail(grammar: &str) -> SyntaxNode {
    parse(grammar).unwrap_or_else(|e| fail(format!("Invalid grammar `{}`: {}", grammar, e)))
}

fn load_data(config: &CssGrammarConfig) -> (Layers, StaticCompatibility) {
    let layers = config
        .data
        .load_layers()
        .unwrap_or_else(|e| fail(format!("Failed to load datasets: {}", e)));
    let compat = config
        .data
        .load_compat(&layers)
        .unwrap_or_else(|e| fail(format!("Failed to load compatibility data: {}", e)));
    (layers, compat)
}

fn css_data(config: &CssGrammarConfig) -> CssData<StaticCompatibility> {
    let (layers, compat) = load_data(config);
    CssData::new(layers, compat).with_depth_limit(config.depth_limit())
}

/// Handle the parse command
pub fn handle_parse_command(grammar: &str, format: &str) -> ExitCode {
    let tree = parse_or_fail(grammar);
    let formatted = match format {
        "canonical" => tree.to_string(),
        "treeviz" => to_treeviz_str(&tree),
        "json" => serde_json::to_string_pretty(&tree)
            .unwrap_or_else(|e| fail(format!("Error formatting tree: {}", e))),
        other => fail(format!(
            "Format '{}' not supported. Available formats: canonical, treeviz, json",
            other
        )),
    };
    println!("{}", formatted);
    ExitCode::SUCCESS
}

/// Handle the types command
pub fn handle_types_command(grammar: &str) -> ExitCode {
    for name in &typing(&parse_or_fail(grammar)) {
        println!("{}", name);
    }
    ExitCode::SUCCESS
}

/// Handle the dissolve command
pub async fn handle_dissolve_command(config: &CssGrammarConfig, grammar: &str) -> ExitCode {
    let usages = typing(&parse_or_fail(grammar));
    let (_, compat) = load_data(config);
    let record = CompatibilityRecord::default();
    let depth = config.depth_limit();
    let resolver = create_property_data_type_resolver(&compat, &record, depth);

    let dissolved = resolve_data_types(&usages, &resolver, depth)
        .await
        .unwrap_or_else(|e| fail(e));
    for name in &dissolved {
        println!("{}", name);
    }
    ExitCode::SUCCESS
}

/// Handle the validate command
pub async fn handle_validate_command(
    config: &CssGrammarConfig,
    source: &str,
    patch: &str,
    property: Option<&str>,
) -> ExitCode {
    let (_, compat) = load_data(config);
    let record = match property {
        Some(name) => compat
            .lookup(CompatCategory::Property, name)
            .await
            .unwrap_or_default(),
        None => CompatibilityRecord::default(),
    };

    let verdict = assess_patch(&compat, &record, source, patch, config.depth_limit())
        .await
        .unwrap_or_else(|e| fail(e));
    if verdict.is_valid() {
        println!("valid: {}", verdict);
        ExitCode::SUCCESS
    } else {
        println!("invalid: {}", verdict);
        ExitCode::from(INVALID)
    }
}

/// Handle the property command
pub async fn handle_property_command(config: &CssGrammarConfig, name: &str) -> ExitCode {
    let data = css_data(config);
    if !data.is_property(name) {
        fail(format!("Unknown property `{}`", name));
    }
    print_syntax(name, data.get_property_syntax(name).await)
}

/// Handle the syntax command
pub async fn handle_syntax_command(config: &CssGrammarConfig, name: &str) -> ExitCode {
    let data = css_data(config);
    if !data.is_syntax(name) {
        fail(format!("Unknown syntax `{}`", name));
    }
    print_syntax(name, data.get_syntax(name).await)
}

fn print_syntax(name: &str, syntax: Option<String>) -> ExitCode {
    match syntax {
        Some(syntax) => {
            println!("{}", syntax);
            ExitCode::SUCCESS
        }
        None => fail(format!("No syntax defined for `{}`", name)),
    }
}

/// Handle the list command
pub async fn handle_list_command(config: &CssGrammarConfig, table: &str, json: bool) -> ExitCode {
    let data = css_data(config);
    let output = match (table, json) {
        ("properties", true) => serde_json::to_string_pretty(data.get_properties().await),
        ("syntaxes", true) => serde_json::to_string_pretty(data.get_syntaxes().await),
        ("properties", false) => Ok(lines(
            data.get_properties()
                .await
                .values()
                .map(|p| (p.name.as_str(), p.syntax.as_deref())),
        )),
        ("syntaxes", false) => Ok(lines(
            data.get_syntaxes()
                .await
                .values()
                .map(|s| (s.name.as_str(), s.syntax.as_deref())),
        )),
        (other, _) => fail(format!(
            "Table '{}' not supported. Available tables: properties, syntaxes",
            other
        )),
    };
    let output = output.unwrap_or_else(|e| fail(format!("Error formatting table: {}", e)));
    println!("{}", output);
    ExitCode::SUCCESS
}

fn lines<'a>(entries: impl Iterator<Item = (&'a str, Option<&'a str>)>) -> String {
    entries
        .map(|(name, syntax)| format!("{}: {}", name, syntax.unwrap_or("-")))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Handle the check command
pub async fn handle_check_command(config: &CssGrammarConfig) -> ExitCode {
    let data = css_data(config);
    let reports = data.check_patches().await;
    let mut failed = 0;

    for report in &reports {
        let category = match report.category {
            CompatCategory::Property => "property",
            CompatCategory::Type => "syntax",
        };
        let outcome = match &report.status {
            PatchStatus::Unchecked => "unchecked: no compatibility data".to_string(),
            PatchStatus::Valid(verdict) => format!("valid: {}", verdict),
            PatchStatus::Invalid(verdict) => {
                failed += 1;
                format!("invalid: {}", verdict)
            }
            PatchStatus::Failed(error) => {
                failed += 1;
                format!("error: {}", error)
            }
        };
        println!("{} {}: {}", category, report.name, outcome);
    }

    println!("{} patches checked, {} failed", reports.len(), failed);
    if failed == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(INVALID)
    }
}
