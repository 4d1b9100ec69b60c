//! WebAssembly bindings for rustbnf
//!
//! JavaScript-friendly wrappers around the BNF compiler. Only compiled when
//! targeting wasm32.

#![cfg(target_arch = "wasm32")]

use crate::{BnfCompiler, CodegenOptions, CompiledGrammar, CompilerOptions, Scanner};
use wasm_bindgen::prelude::*;

// Set panic hook for better error messages in browser
#[cfg(feature = "console_error_panic_hook")]
pub fn set_panic_hook() {
    console_error_panic_hook::set_once();
}

// Use smaller allocator for WASM
#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

/// Result type for JavaScript interop
#[wasm_bindgen]
#[derive(Debug)]
pub struct BnfResult {
    success: bool,
    output: String,
    error: Option<String>,
}

#[wasm_bindgen]
impl BnfResult {
    #[wasm_bindgen(getter)]
    pub fn success(&self) -> bool {
        self.success
    }

    #[wasm_bindgen(getter)]
    pub fn output(&self) -> String {
        self.output.clone()
    }

    #[wasm_bindgen(getter)]
    pub fn error(&self) -> Option<String> {
        self.error.clone()
    }
}

impl BnfResult {
    fn ok(output: String) -> Self {
        BnfResult {
            success: true,
            output,
            error: None,
        }
    }

    fn err(error: String) -> Self {
        BnfResult {
            success: false,
            output: String::new(),
            error: Some(error),
        }
    }
}

/// A compiled BNF grammar
#[wasm_bindgen]
pub struct BnfGrammar {
    bnf: String,
    start: String,
    enhanced: bool,
    grammar: CompiledGrammar,
}

#[wasm_bindgen]
impl BnfGrammar {
    /// Compile `bnf`, starting from the rule `start`
    #[wasm_bindgen(constructor)]
    pub fn new(bnf: &str, start: &str, enhanced: bool) -> Result<BnfGrammar, JsValue> {
        #[cfg(feature = "console_error_panic_hook")]
        set_panic_hook();

        let options = CompilerOptions::new().with_enhanced(enhanced);
        let grammar = BnfCompiler::with_options(options)
            .compile(bnf, start)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;

        Ok(BnfGrammar {
            bnf: bnf.to_string(),
            start: start.to_string(),
            enhanced,
            grammar,
        })
    }

    /// Match `input` against the grammar; the output is the match tree
    pub fn parse(&self, input: &str) -> BnfResult {
        match self.grammar.parse(input) {
            Ok(tree) => BnfResult::ok(tree.to_tree_string(&Scanner::new(input))),
            Err(e) => BnfResult::err(e.format_with_context(input)),
        }
    }

    /// Rust source rebuilding this grammar; `timestamp` is seconds since the
    /// Unix epoch (pass `Date.now() / 1000`)
    pub fn generate(&self, class_name: &str, timestamp: f64) -> BnfResult {
        let codegen = CodegenOptions::default()
            .with_class_name(class_name)
            .with_timestamp(timestamp.max(0.0) as u64);
        let options = CompilerOptions::new().with_enhanced(self.enhanced);
        match BnfCompiler::with_options(options).generate_with(&self.bnf, &self.start, codegen) {
            Ok(source) => BnfResult::ok(source),
            Err(e) => BnfResult::err(e.to_string()),
        }
    }

    /// The grammar's rules, one `<name> ::= body` line each
    pub fn rules(&self) -> String {
        self.grammar.to_bnf()
    }

    pub fn rule_count(&self) -> usize {
        self.grammar.rule_names().len()
    }
}

/// Convenience function: compile a grammar and match input in one step
#[wasm_bindgen]
pub fn parse_bnf(bnf: &str, start: &str, input: &str) -> BnfResult {
    match BnfGrammar::new(bnf, start, true) {
        Ok(grammar) => grammar.parse(input),
        Err(e) => BnfResult::err(e.as_string().unwrap_or_else(|| format!("{:?}", e))),
    }
}

/// Get version information
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
