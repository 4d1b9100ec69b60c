//! Rust source generation for compiled grammars
//!
//! [`plan`] walks a graph from its start node and produces a [`Program`]: a
//! flat list of construction statements in the order the generated code
//! runs them. Every rule is declared first as an unbound `named_rule`, then
//! the non-rule nodes are built bottom-up (each shared node once), then every
//! rule body is bound with `set_inner`. Cycles only ever pass through rules,
//! so declaring rules up front is enough to build recursive grammars.
//!
//! A program can be rendered as Rust source ([`Program::render`]) or replayed
//! directly into a fresh graph ([`Program::replay`]); both perform the same
//! statements.

use crate::charclass::{CharClass, CharSet};
use crate::compiler::CompiledGrammar;
use crate::graph::{Anchor, Graph, NodeId, NodeKind};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone, PartialEq)]
pub enum CodegenError {
    /// A `NamedRule` without a body is reachable from the start node
    UnresolvedRule { name: String },
    /// A cycle that doesn't pass through any `NamedRule`
    Cycle { node: NodeId },
    /// A statement refers to a variable no earlier statement defined
    UndefinedVariable { name: String },
    /// The struct name is not a Rust identifier
    InvalidClassName { name: String },
}

impl std::fmt::Display for CodegenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CodegenError::UnresolvedRule { name } => {
                write!(f, "Cannot generate code: rule <{}> has no definition", name)
            }
            CodegenError::Cycle { node } => {
                write!(f, "Cannot generate code: node {} is part of a cycle with no rule", node)
            }
            CodegenError::UndefinedVariable { name } => {
                write!(f, "Variable '{}' is used before it is defined", name)
            }
            CodegenError::InvalidClassName { name } => {
                write!(f, "Cannot generate code: '{}' is not a valid struct name", name)
            }
        }
    }
}

impl std::error::Error for CodegenError {}

#[derive(Debug, Clone, PartialEq)]
pub struct CodegenOptions {
    /// Name of the generated struct
    pub class_name: String,
    /// Path the generated code imports the graph API from
    pub crate_path: String,
    /// Seconds since the Unix epoch for the header; `None` means now
    pub timestamp: Option<u64>,
    /// BNF text to reproduce in the header
    pub source: Option<String>,
}

impl Default for CodegenOptions {
    fn default() -> Self {
        CodegenOptions {
            class_name: "GeneratedGrammar".to_string(),
            crate_path: "rustbnf".to_string(),
            timestamp: None,
            source: None,
        }
    }
}

impl CodegenOptions {
    pub fn with_class_name(mut self, class_name: &str) -> Self {
        self.class_name = class_name.to_string();
        self
    }

    pub fn with_crate_path(mut self, crate_path: &str) -> Self {
        self.crate_path = crate_path.to_string();
        self
    }

    pub fn with_timestamp(mut self, timestamp: u64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn with_source(mut self, source: &str) -> Self {
        self.source = Some(source.to_string());
        self
    }
}

/// Right-hand side of a node statement, with children as variable names
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Literal(String),
    CharSet { set: CharSet, negated: bool },
    Sequence(Vec<String>),
    Alternative(Vec<String>),
    Repeat {
        inner: String,
        min: usize,
        max: Option<usize>,
        separator: Option<String>,
    },
    Optional(String),
    Anchor(Anchor),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// `let var = g.named_rule(name);`
    Rule { var: String, name: String },
    /// `let var = g.<value>;` plus `g.set_name(var, name);` for named nodes
    Node {
        var: String,
        name: Option<String>,
        value: Value,
    },
    /// `g.set_inner(rule, inner);`
    SetInner { rule: String, inner: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    statements: Vec<Statement>,
    start: String,
}

/// Plan the statements that rebuild the graph reachable from `start`
pub fn plan(graph: &Graph, start: NodeId) -> Result<Program, CodegenError> {
    let order = graph.reachable(start);
    let mut planner = Planner {
        graph,
        vars: HashMap::new(),
        used: HashSet::new(),
        visited: HashSet::new(),
        unnamed: 0,
        statements: Vec::new(),
    };

    // phase 1: every rule exists before anything refers to it
    let mut rules = Vec::new();
    for &id in &order {
        if let NodeKind::NamedRule { inner } = graph.kind(id) {
            let name = graph.name(id).unwrap_or("rule").to_string();
            let Some(inner) = inner else {
                return Err(CodegenError::UnresolvedRule { name });
            };
            let var = planner.allocate(&identifier(&name));
            planner.vars.insert(id, var.clone());
            planner.statements.push(Statement::Rule { var, name });
            rules.push((id, *inner));
        }
    }

    planner.visit(start)?;

    // phase 2: bind rule bodies
    for (rule, inner) in rules {
        let rule = planner.var(rule)?;
        let inner = planner.var(inner)?;
        planner.statements.push(Statement::SetInner { rule, inner });
    }

    let start = planner.var(start)?;
    Ok(Program {
        statements: planner.statements,
        start,
    })
}

/// Plan and render `grammar` as Rust source
pub fn generate(grammar: &CompiledGrammar, options: &CodegenOptions) -> Result<String, CodegenError> {
    if !is_type_name(&options.class_name) {
        return Err(CodegenError::InvalidClassName {
            name: options.class_name.clone(),
        });
    }
    let program = plan(grammar.graph(), grammar.start())?;
    log::debug!(
        "generating {} for <{}>: {} statements",
        options.class_name,
        grammar.start_name(),
        program.statements.len()
    );
    Ok(program.render(options))
}

struct Planner<'g> {
    graph: &'g Graph,
    vars: HashMap<NodeId, String>,
    used: HashSet<String>,
    visited: HashSet<NodeId>,
    unnamed: usize,
    statements: Vec<Statement>,
}

impl Planner<'_> {
    fn allocate(&mut self, base: &str) -> String {
        let mut var = base.to_string();
        let mut n = 2;
        while !self.used.insert(var.clone()) {
            var = format!("{}_{}", base, n);
            n += 1;
        }
        var
    }

    fn var(&self, id: NodeId) -> Result<String, CodegenError> {
        self.vars
            .get(&id)
            .cloned()
            .ok_or(CodegenError::Cycle { node: id })
    }

    fn vars_of(&self, ids: &[NodeId]) -> Result<Vec<String>, CodegenError> {
        ids.iter().map(|&id| self.var(id)).collect()
    }

    /// Emit `id` after everything it refers to
    fn visit(&mut self, id: NodeId) -> Result<(), CodegenError> {
        let kind = self.graph.kind(id);
        if !self.visited.insert(id) {
            // seen before: fine unless it is a non-rule node still being built
            if !kind.is_rule() && !self.vars.contains_key(&id) {
                return Err(CodegenError::Cycle { node: id });
            }
            return Ok(());
        }

        for child in kind.children() {
            self.visit(child)?;
        }

        let value = match kind {
            NodeKind::NamedRule { .. } => return Ok(()),
            NodeKind::Literal(text) => Value::Literal(text.clone()),
            NodeKind::CharacterSet { set, negated } => Value::CharSet {
                set: set.clone(),
                negated: *negated,
            },
            NodeKind::Sequence(items) => Value::Sequence(self.vars_of(items)?),
            NodeKind::Alternative(items) => Value::Alternative(self.vars_of(items)?),
            NodeKind::Repeat {
                inner,
                min,
                max,
                separator,
            } => Value::Repeat {
                inner: self.var(*inner)?,
                min: *min,
                max: *max,
                separator: separator.map(|sep| self.var(sep)).transpose()?,
            },
            NodeKind::Optional(inner) => Value::Optional(self.var(*inner)?),
            NodeKind::Anchor(anchor) => Value::Anchor(*anchor),
        };

        let name = self.graph.name(id).map(str::to_string);
        let var = match &name {
            Some(name) => self.allocate(&identifier(name)),
            None => {
                self.unnamed += 1;
                self.allocate(&format!("n{}", self.unnamed))
            }
        };
        self.vars.insert(id, var.clone());
        self.statements.push(Statement::Node { var, name, value });
        Ok(())
    }
}

const KEYWORDS: &[&str] = &[
    "abstract", "as", "async", "await", "become", "box", "break", "const", "continue", "crate",
    "do", "dyn", "else", "enum", "extern", "false", "final", "fn", "for", "if", "impl", "in",
    "let", "loop", "macro", "match", "mod", "move", "mut", "override", "priv", "pub", "ref",
    "return", "self", "static", "struct", "super", "trait", "true", "try", "type", "typeof",
    "union", "unsafe", "unsized", "use", "virtual", "where", "while", "yield",
];

/// Whether `name` can be used as the generated struct's name
fn is_type_name(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && name != "_"
        && name != "Self"
        && !KEYWORDS.contains(&name)
}

/// snake_case identifier for a node name, never a keyword
pub fn identifier(name: &str) -> String {
    let mut ident = String::new();
    let mut prev: Option<char> = None;
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            if ch.is_ascii_uppercase()
                && prev.is_some_and(|p| p.is_ascii_lowercase() || p.is_ascii_digit())
            {
                ident.push('_');
            }
            ident.push(ch.to_ascii_lowercase());
            prev = Some(ch);
        } else if !ident.is_empty() && !ident.ends_with('_') {
            ident.push('_');
            prev = None;
        }
    }
    while ident.ends_with('_') {
        ident.pop();
    }

    if ident.is_empty() {
        ident.push_str("rule");
    }
    if ident.starts_with(|c: char| c.is_ascii_digit()) {
        ident.insert_str(0, "r_");
    }
    // `g` is the graph being built
    if ident == "g" || KEYWORDS.contains(&ident.as_str()) {
        ident.push('_');
    }
    ident
}

impl Program {
    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    /// Variable holding the start node
    pub fn start(&self) -> &str {
        &self.start
    }

    /// Run the statements against a fresh graph
    pub fn replay(&self) -> Result<CompiledGrammar, CodegenError> {
        let mut g = Graph::new();
        let mut vars: HashMap<&str, NodeId> = HashMap::new();

        for statement in &self.statements {
            match statement {
                Statement::Rule { var, name } => {
                    vars.insert(var, g.named_rule(name));
                }
                Statement::Node { var, name, value } => {
                    let id = match value {
                        Value::Literal(text) => g.literal(text),
                        Value::CharSet { set, negated } => g.char_set(set.clone(), *negated),
                        Value::Sequence(items) => {
                            let items = items
                                .iter()
                                .map(|item| lookup(&vars, item))
                                .collect::<Result<Vec<_>, _>>()?;
                            g.sequence(items)
                        }
                        Value::Alternative(items) => {
                            let items = items
                                .iter()
                                .map(|item| lookup(&vars, item))
                                .collect::<Result<Vec<_>, _>>()?;
                            g.alternative(items)
                        }
                        Value::Repeat {
                            inner,
                            min,
                            max,
                            separator,
                        } => {
                            let inner = lookup(&vars, inner)?;
                            let separator = separator
                                .as_deref()
                                .map(|sep| lookup(&vars, sep))
                                .transpose()?;
                            g.repeat(inner, *min, *max, separator)
                        }
                        Value::Optional(inner) => {
                            let inner = lookup(&vars, inner)?;
                            g.optional(inner)
                        }
                        Value::Anchor(anchor) => g.anchor(*anchor),
                    };
                    if let Some(name) = name {
                        g.set_name(id, name);
                    }
                    vars.insert(var, id);
                }
                Statement::SetInner { rule, inner } => {
                    let rule = lookup(&vars, rule)?;
                    let inner = lookup(&vars, inner)?;
                    g.set_inner(rule, inner);
                }
            }
        }

        let start = lookup(&vars, &self.start)?;
        Ok(CompiledGrammar::from_graph(g, start))
    }

    /// Rust source for a struct whose `build()` runs these statements
    pub fn render(&self, options: &CodegenOptions) -> String {
        let timestamp = options.timestamp.unwrap_or_else(|| {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0)
        });

        let mut out = String::new();
        out.push_str(&format!("// Date Created: {}\n", timestamp));
        if let Some(source) = &options.source {
            out.push_str("// Source BNF:\n");
            for line in source.lines() {
                out.push_str(format!("//     {}", line).trim_end());
                out.push('\n');
            }
        }
        out.push('\n');

        out.push_str(&format!(
            "use {}::{{{}}};\n\n",
            options.crate_path,
            self.imports().join(", ")
        ));
        out.push_str(&format!("pub struct {};\n\n", options.class_name));
        out.push_str(&format!("impl {} {{\n", options.class_name));
        out.push_str("    pub fn build() -> CompiledGrammar {\n");
        out.push_str("        let mut g = Graph::new();\n");

        let mut section = None;
        for statement in &self.statements {
            let current = std::mem::discriminant(statement);
            if section != Some(current) {
                out.push('\n');
                section = Some(current);
            }
            for line in render_statement(statement) {
                out.push_str("        ");
                out.push_str(&line);
                out.push('\n');
            }
        }

        out.push('\n');
        out.push_str(&format!(
            "        CompiledGrammar::from_graph(g, {})\n",
            self.start
        ));
        out.push_str("    }\n");
        out.push_str("}\n");
        out
    }

    fn imports(&self) -> Vec<&'static str> {
        let mut imports = BTreeSet::from(["CompiledGrammar", "Graph"]);
        for statement in &self.statements {
            match statement {
                Statement::Node {
                    value: Value::CharSet { set, .. },
                    ..
                } => {
                    imports.insert("CharSet");
                    if !set.classes().is_empty() {
                        imports.insert("CharClass");
                    }
                }
                Statement::Node {
                    value: Value::Anchor(_),
                    ..
                } => {
                    imports.insert("Anchor");
                }
                _ => {}
            }
        }
        imports.into_iter().collect()
    }
}

fn lookup(vars: &HashMap<&str, NodeId>, name: &str) -> Result<NodeId, CodegenError> {
    vars.get(name)
        .copied()
        .ok_or_else(|| CodegenError::UndefinedVariable {
            name: name.to_string(),
        })
}

fn render_statement(statement: &Statement) -> Vec<String> {
    match statement {
        Statement::Rule { var, name } => {
            vec![format!("let {} = g.named_rule({:?});", var, name)]
        }
        Statement::SetInner { rule, inner } => {
            vec![format!("g.set_inner({}, {});", rule, inner)]
        }
        Statement::Node { var, name, value } => {
            let call = match value {
                Value::Literal(text) => format!("g.literal({:?})", text),
                Value::CharSet { set, negated } => {
                    format!("g.char_set({}, {})", render_set(set), negated)
                }
                Value::Sequence(items) => format!("g.sequence(vec![{}])", items.join(", ")),
                Value::Alternative(items) => {
                    format!("g.alternative(vec![{}])", items.join(", "))
                }
                Value::Repeat {
                    inner,
                    min,
                    max,
                    separator,
                } => format!(
                    "g.repeat({}, {}, {}, {})",
                    inner,
                    min,
                    render_option(max.as_ref()),
                    render_option(separator.as_ref())
                ),
                Value::Optional(inner) => format!("g.optional({})", inner),
                Value::Anchor(anchor) => format!("g.anchor(Anchor::{:?})", anchor),
            };
            let mut lines = vec![format!("let {} = {};", var, call)];
            if let Some(name) = name {
                lines.push(format!("g.set_name({}, {:?});", var, name));
            }
            lines
        }
    }
}

fn render_option<T: std::fmt::Display>(value: Option<&T>) -> String {
    match value {
        Some(value) => format!("Some({})", value),
        None => "None".to_string(),
    }
}

fn render_set(set: &CharSet) -> String {
    let mut out = "CharSet::new()".to_string();
    for &(start, end) in set.ranges().ranges() {
        if start == end {
            out.push_str(&format!(".with_char({:?})", start));
        } else {
            out.push_str(&format!(".with_range({:?}, {:?})", start, end));
        }
    }
    for class in set.classes() {
        let class = match class {
            CharClass::Category(name) => format!("CharClass::category({:?})", name),
            CharClass::WhiteSpace => "CharClass::WhiteSpace".to_string(),
            CharClass::SingleLineWhiteSpace => "CharClass::SingleLineWhiteSpace".to_string(),
        };
        out.push_str(&format!(".with_class({})", class));
    }
    out
}
