//! BNF compiler
//!
//! Parses BNF text with the [`MetaGrammar`], builds the combinator graph as
//! the parse's events fire, and hands back the graph rooted at the start
//! rule. Rules that are referenced but never defined compile to a permissive
//! fallback (one or more letters or digits) and are logged as warnings.
//!
//! A [`BnfCompiler`] keeps the rule registry of its last compile, so
//! `compile` takes `&mut self`: one compiler per thread.

use crate::builder::GraphBuilder;
use crate::builtins::{fallback_terminal, Builtins};
use crate::codegen::{self, CodegenError, CodegenOptions};
use crate::graph::{Graph, NodeId, NodeKind};
use crate::match_tree::Match;
use crate::matcher::Matcher;
use crate::meta_grammar::MetaGrammar;
use crate::parse_context::MatchError;
use crate::registry::RuleRegistry;
use crate::scanner::Scanner;
use std::collections::HashMap;

/// What an explicit whitespace gap between two terms compiles to
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GapWhitespace {
    /// At least one same-line whitespace character
    #[default]
    Required,
    /// Any amount of same-line whitespace, including none
    Optional,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CompilerOptions {
    /// Grouping, repetition, optional terms and the built-in primitives
    pub enhanced: bool,
    /// Token between a rule name and its body
    pub rule_separator: String,
    pub gap: GapWhitespace,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        CompilerOptions {
            enhanced: true,
            rule_separator: "::=".to_string(),
            gap: GapWhitespace::default(),
        }
    }
}

impl CompilerOptions {
    pub fn new() -> Self {
        CompilerOptions::default()
    }

    pub fn with_enhanced(mut self, enhanced: bool) -> Self {
        self.enhanced = enhanced;
        self
    }

    pub fn with_rule_separator(mut self, separator: &str) -> Self {
        self.rule_separator = separator.to_string();
        self
    }

    pub fn with_gap(mut self, gap: GapWhitespace) -> Self {
        self.gap = gap;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CompileError {
    /// The BNF text doesn't follow the BNF notation
    GrammarSyntax {
        position: usize,
        line: usize,
        column: usize,
        message: String,
    },
    /// The document parsed but doesn't define the start rule
    UnknownStartRule { name: String },
    Codegen(CodegenError),
}

impl CompileError {
    fn syntax(error: &MatchError, text: &str) -> CompileError {
        let position = error.position();
        let (line, column) = Scanner::new(text).line_col(position);
        CompileError::GrammarSyntax {
            position,
            line,
            column,
            message: error.to_string(),
        }
    }
}

impl std::fmt::Display for CompileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompileError::GrammarSyntax {
                line,
                column,
                message,
                ..
            } => write!(
                f,
                "Error parsing BNF at line {}, column {}: {}",
                line, column, message
            ),
            CompileError::UnknownStartRule { name } => {
                write!(f, "Start rule <{}> is not defined in this BNF", name)
            }
            CompileError::Codegen(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for CompileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CompileError::Codegen(e) => Some(e),
            _ => None,
        }
    }
}

impl From<CodegenError> for CompileError {
    fn from(e: CodegenError) -> Self {
        CompileError::Codegen(e)
    }
}

/// A compiled grammar: the target graph plus its start rule
#[derive(Debug, Clone)]
pub struct CompiledGrammar {
    graph: Graph,
    start: NodeId,
    rules: HashMap<String, NodeId>,
}

impl CompiledGrammar {
    /// Wrap a finished graph; every `NamedRule` in it becomes addressable by
    /// (case-insensitive) name
    pub fn from_graph(graph: Graph, start: NodeId) -> Self {
        let rules = graph
            .iter()
            .filter(|(_, node)| node.kind.is_rule())
            .filter_map(|(id, node)| node.name.as_ref().map(|name| (name.to_lowercase(), id)))
            .collect();
        CompiledGrammar {
            graph,
            start,
            rules,
        }
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn start(&self) -> NodeId {
        self.start
    }

    pub fn start_name(&self) -> &str {
        self.graph.name(self.start).unwrap_or("")
    }

    pub fn rule(&self, name: &str) -> Option<NodeId> {
        self.rules.get(&name.to_lowercase()).copied()
    }

    /// Body of the rule called `name`
    pub fn rule_body(&self, name: &str) -> Option<NodeId> {
        match self.graph.kind(self.rule(name)?) {
            NodeKind::NamedRule { inner } => *inner,
            _ => None,
        }
    }

    /// Rules reachable from the start rule, in first-discovered order
    pub fn rule_names(&self) -> Vec<&str> {
        self.graph
            .reachable(self.start)
            .into_iter()
            .filter(|&id| self.graph.kind(id).is_rule())
            .filter_map(|id| self.graph.name(id))
            .collect()
    }

    /// Match all of `input` against the start rule
    pub fn parse(&self, input: &str) -> Result<Match, MatchError> {
        Matcher::new(&self.graph).match_all(self.start, input)
    }

    pub fn accepts(&self, input: &str) -> bool {
        self.parse(input).is_ok()
    }

    /// One `<name> ::= body` line per reachable rule
    pub fn to_bnf(&self) -> String {
        let mut out = String::new();
        for id in self.graph.reachable(self.start) {
            if self.graph.kind(id).is_rule() {
                let name = self.graph.name(id).unwrap_or("?");
                out.push_str(&format!("<{}> ::= {}\n", name, self.graph.display(id)));
            }
        }
        out
    }
}

/// Compiles BNF text into a [`CompiledGrammar`]
pub struct BnfCompiler {
    options: CompilerOptions,
    meta: MetaGrammar,
    builtins: Builtins,
    registry: RuleRegistry,
}

impl Default for BnfCompiler {
    fn default() -> Self {
        BnfCompiler::new()
    }
}

impl BnfCompiler {
    pub fn new() -> Self {
        BnfCompiler::with_options(CompilerOptions::default())
    }

    pub fn with_options(options: CompilerOptions) -> Self {
        let meta = MetaGrammar::new(options.enhanced, &options.rule_separator);
        let builtins = Builtins::new(options.enhanced);
        BnfCompiler {
            options,
            meta,
            builtins,
            registry: RuleRegistry::new(),
        }
    }

    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    /// Rules seen by the last compile
    pub fn rules(&self) -> &RuleRegistry {
        &self.registry
    }

    pub fn compile(&mut self, text: &str, start: &str) -> Result<CompiledGrammar, CompileError> {
        self.registry.clear();
        self.builtins.reset();
        log::debug!(
            "compiling {} lines of BNF, start rule <{}>",
            text.lines().count(),
            start
        );

        let mut document = self
            .meta
            .parse::<NodeId>(text)
            .map_err(|e| CompileError::syntax(&e, text))?;

        let input = Scanner::new(text);
        let mut graph = GraphBuilder::new(
            &self.meta,
            &input,
            &mut self.registry,
            &mut self.builtins,
            self.options.gap,
        )
        .build(&mut document);

        let unresolved: Vec<(String, NodeId)> = self
            .registry
            .unresolved(&graph)
            .map(|entry| (entry.name.clone(), entry.node))
            .collect();
        for (name, node) in unresolved {
            log::warn!(
                "rule <{}> is referenced but never defined, it will match letters and digits",
                name
            );
            let body = fallback_terminal(&mut graph);
            graph.set_inner(node, body);
        }

        if !self.registry.is_defined(start) {
            return Err(CompileError::UnknownStartRule {
                name: start.to_string(),
            });
        }
        let root = self
            .registry
            .lookup(start)
            .ok_or_else(|| CompileError::UnknownStartRule {
                name: start.to_string(),
            })?;

        log::debug!(
            "compiled {} rules into {} nodes",
            self.registry.len(),
            graph.len()
        );
        Ok(CompiledGrammar::from_graph(graph, root))
    }

    /// Compile, then generate Rust source that rebuilds the grammar
    pub fn generate(
        &mut self,
        text: &str,
        start: &str,
        class_name: &str,
    ) -> Result<String, CompileError> {
        let options = CodegenOptions::default().with_class_name(class_name);
        self.generate_with(text, start, options)
    }

    pub fn generate_with(
        &mut self,
        text: &str,
        start: &str,
        options: CodegenOptions,
    ) -> Result<String, CompileError> {
        let grammar = self.compile(text, start)?;
        let options = options.with_source(text);
        Ok(codegen::generate(&grammar, &options)?)
    }
}
