//! Rule registry and forward-reference resolution
//!
//! Maps rule names (case-insensitively) to `NamedRule` nodes in the target
//! graph. A reference to a rule that is not defined yet creates an unbound
//! placeholder; the later definition reuses that same node, so every
//! reference ends up pointing at the real rule.

use crate::graph::{Graph, NodeId, NodeKind};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct RuleEntry {
    /// Spelling of the name as first seen
    pub name: String,
    pub node: NodeId,
    /// Set once a definition for the rule has been seen
    pub defined: bool,
}

#[derive(Debug, Clone, Default)]
pub struct RuleRegistry {
    entries: Vec<RuleEntry>,
    index: HashMap<String, usize>,
}

impl RuleRegistry {
    pub fn new() -> Self {
        RuleRegistry::default()
    }

    fn key(name: &str) -> String {
        name.to_lowercase()
    }

    fn entry(&self, name: &str) -> Option<&RuleEntry> {
        self.index.get(&Self::key(name)).map(|&i| &self.entries[i])
    }

    fn insert(&mut self, name: &str, graph: &mut Graph) -> usize {
        let node = graph.named_rule(name);
        self.entries.push(RuleEntry {
            name: name.to_string(),
            node,
            defined: false,
        });
        let i = self.entries.len() - 1;
        self.index.insert(Self::key(name), i);
        i
    }

    /// Node registered under `name`, if any
    pub fn lookup(&self, name: &str) -> Option<NodeId> {
        self.entry(name).map(|e| e.node)
    }

    /// Node for a reference to `name`, creating an unbound placeholder if the
    /// name hasn't been seen
    pub fn resolve(&mut self, name: &str, graph: &mut Graph) -> NodeId {
        if let Some(node) = self.lookup(name) {
            return node;
        }
        let i = self.insert(name, graph);
        log::trace!("forward reference to <{}>", name);
        self.entries[i].node
    }

    /// Node for a definition of `name`, reusing any placeholder
    ///
    /// Defining a name twice returns the same node; the caller's later
    /// `set_inner` replaces the earlier body.
    pub fn define(&mut self, name: &str, graph: &mut Graph) -> NodeId {
        let i = match self.index.get(&Self::key(name)) {
            Some(&i) => i,
            None => self.insert(name, graph),
        };
        let entry = &mut self.entries[i];
        if entry.defined {
            log::debug!("<{}> defined again, later definition wins", name);
        }
        entry.defined = true;
        entry.node
    }

    pub fn is_defined(&self, name: &str) -> bool {
        self.entry(name).is_some_and(|e| e.defined)
    }

    /// Rules referenced but never defined
    pub fn undefined(&self) -> impl Iterator<Item = &RuleEntry> {
        self.entries.iter().filter(|e| !e.defined)
    }

    /// Rules whose node has no body in `graph`
    pub fn unresolved<'a>(&'a self, graph: &'a Graph) -> impl Iterator<Item = &'a RuleEntry> {
        self.entries
            .iter()
            .filter(move |e| matches!(graph.kind(e.node), NodeKind::NamedRule { inner: None }))
    }

    /// All rules in the order they were first seen
    pub fn iter(&self) -> impl Iterator<Item = &RuleEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_reference_reused_by_definition() {
        let mut g = Graph::new();
        let mut reg = RuleRegistry::new();

        let fwd = reg.resolve("expr", &mut g);
        assert!(!reg.is_defined("expr"));
        let def = reg.define("expr", &mut g);
        assert_eq!(fwd, def);
        assert!(reg.is_defined("expr"));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn test_names_are_case_insensitive() {
        let mut g = Graph::new();
        let mut reg = RuleRegistry::new();

        let a = reg.define("Name", &mut g);
        assert_eq!(reg.resolve("name", &mut g), a);
        assert_eq!(reg.lookup("NAME"), Some(a));
        // first spelling is kept
        assert_eq!(reg.iter().next().map(|e| e.name.as_str()), Some("Name"));
    }

    #[test]
    fn test_redefinition_keeps_node() {
        let mut g = Graph::new();
        let mut reg = RuleRegistry::new();

        let first = reg.define("a", &mut g);
        let body = g.literal("1");
        g.set_inner(first, body);
        let second = reg.define("a", &mut g);
        assert_eq!(first, second);
    }

    #[test]
    fn test_undefined_and_unresolved() {
        let mut g = Graph::new();
        let mut reg = RuleRegistry::new();

        let a = reg.define("a", &mut g);
        reg.resolve("b", &mut g);
        let c = reg.define("c", &mut g);
        let one = g.literal("1");
        g.set_inner(c, one);

        let undefined: Vec<_> = reg.undefined().map(|e| e.name.clone()).collect();
        assert_eq!(undefined, vec!["b"]);

        let unresolved: Vec<_> = reg.unresolved(&g).map(|e| e.node).collect();
        assert_eq!(unresolved.len(), 2);
        assert_eq!(unresolved[0], a);

        reg.clear();
        assert!(reg.is_empty());
        assert_eq!(reg.lookup("a"), None);
    }
}
