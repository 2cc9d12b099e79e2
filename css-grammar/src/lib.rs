//! # css-grammar
//!
//! Parser and reconciler for CSS value definition grammars.
//!
//! File Layout
//!
//! The library is organised around the path a grammar takes:
//!
//! src/css
//!   ├── syntax       Tokenizer, parser, tree and renderers for grammar strings
//!   ├── typing       Collects the data types a tree references
//!   ├── compat       Compatibility records and providers
//!   ├── data_types   Recursive dissolution of data types
//!   ├── validation   Patch comparator
//!   ├── dataset      Baseline, supplemental and patch layers
//!   └── reconcile    Effective property and syntax tables
//!
//! For shared fixtures used by the integration tests, see the [testing module](css::testing).

pub mod css;
