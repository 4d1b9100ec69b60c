//! rustbnf - BNF grammar compiler
//!
//! Compiles grammars written in Backus-Naur Form into a graph of parser
//! combinators that can be run against input straight away, or turned into
//! Rust source that rebuilds the same graph without the compiler.
//!
//! # Quick Start
//!
//! ```rust
//! use rustbnf::BnfCompiler;
//!
//! let bnf = r#"
//!     <greeting> ::= 'Hello,' <name> '!'
//!     <name>     ::= { <Letter> }
//! "#;
//!
//! let mut compiler = BnfCompiler::new();
//! let grammar = compiler.compile(bnf, "greeting").expect("Invalid grammar");
//!
//! assert!(grammar.accepts("Hello, World !"));
//!
//! let source = compiler
//!     .generate(bnf, "greeting", "GreetingGrammar")
//!     .expect("Code generation failed");
//! assert!(source.contains("pub struct GreetingGrammar;"));
//! ```
//!
//! # Notation
//!
//! - `<name> ::= body` defines a rule; rules end at the end of a line
//! - `'text'` or `"text"` matches literal text
//! - `<name>` refers to a rule, which may be defined later (or be recursive)
//! - terms written apart need whitespace between them in the input
//! - `a | b` tries `a`, then `b`
//! - `( ... )` groups, `{ ... }` repeats zero or more times, `[ ... ]` is optional
//! - `<Digit>`, `<Letter>`, `<WhiteSpace>`, `<Eol>` and other built-ins need
//!   no definition

pub mod builder;
pub mod builtins;
pub mod charclass;
pub mod codegen;
pub mod compiler;
pub mod events;
pub mod graph;
pub mod match_tree;
pub mod matcher;
pub mod meta_grammar;
pub mod parse_context;
pub mod registry;
pub mod scanner;

// WASM bindings (only when compiling for wasm32)
#[cfg(target_arch = "wasm32")]
pub mod wasm;

// Re-export main API
pub use builtins::Terminal;
pub use charclass::{CharClass, CharSet};
pub use codegen::{CodegenError, CodegenOptions, Program};
pub use compiler::{BnfCompiler, CompileError, CompiledGrammar, CompilerOptions, GapWhitespace};
pub use graph::{Anchor, Graph, NodeId, NodeKind};
pub use match_tree::Match;
pub use matcher::Matcher;
pub use parse_context::MatchError;
pub use registry::RuleRegistry;
pub use scanner::Scanner;

// Re-export WASM API for convenience
#[cfg(target_arch = "wasm32")]
pub use wasm::*;
