//! Combinator graph
//!
//! Nodes live in an arena and refer to each other by [`NodeId`], so a rule can
//! reference itself (or an ancestor) without ownership cycles. A `NamedRule`
//! is shared by id from every call site; it is never copied.

use crate::charclass::CharSet;
use std::collections::HashSet;
use std::fmt;

/// Index of a node in a [`Graph`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Zero-width position assertions
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Anchor {
    /// Start of input
    Start,
    /// End of input
    End,
}

#[derive(Clone, Debug, PartialEq)]
pub enum NodeKind {
    Literal(String),
    CharacterSet {
        set: CharSet,
        negated: bool,
    },
    Sequence(Vec<NodeId>),
    Alternative(Vec<NodeId>),
    Repeat {
        inner: NodeId,
        min: usize,
        max: Option<usize>,
        separator: Option<NodeId>,
    },
    Optional(NodeId),
    /// Rule wrapper; `inner` is `None` until the rule body is known
    NamedRule {
        inner: Option<NodeId>,
    },
    Anchor(Anchor),
}

impl NodeKind {
    /// Direct successors, in order
    pub fn children(&self) -> Vec<NodeId> {
        match self {
            NodeKind::Literal(_) | NodeKind::CharacterSet { .. } | NodeKind::Anchor(_) => {
                Vec::new()
            }
            NodeKind::Sequence(items) | NodeKind::Alternative(items) => items.clone(),
            NodeKind::Repeat {
                inner, separator, ..
            } => {
                let mut children = vec![*inner];
                children.extend(*separator);
                children
            }
            NodeKind::Optional(inner) => vec![*inner],
            NodeKind::NamedRule { inner } => inner.iter().copied().collect(),
        }
    }

    pub fn is_rule(&self) -> bool {
        matches!(self, NodeKind::NamedRule { .. })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub name: Option<String>,
    pub kind: NodeKind,
}

/// Arena of combinator nodes plus the construction operations
#[derive(Clone, Debug, Default)]
pub struct Graph {
    nodes: Vec<Node>,
}

impl Graph {
    pub fn new() -> Self {
        Graph { nodes: Vec::new() }
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node { name: None, kind });
        id
    }

    pub fn literal(&mut self, text: &str) -> NodeId {
        self.push(NodeKind::Literal(text.to_string()))
    }

    pub fn char_set(&mut self, set: CharSet, negated: bool) -> NodeId {
        self.push(NodeKind::CharacterSet { set, negated })
    }

    pub fn sequence(&mut self, items: Vec<NodeId>) -> NodeId {
        self.push(NodeKind::Sequence(items))
    }

    pub fn alternative(&mut self, items: Vec<NodeId>) -> NodeId {
        self.push(NodeKind::Alternative(items))
    }

    pub fn repeat(
        &mut self,
        inner: NodeId,
        min: usize,
        max: Option<usize>,
        separator: Option<NodeId>,
    ) -> NodeId {
        self.push(NodeKind::Repeat {
            inner,
            min,
            max,
            separator,
        })
    }

    pub fn optional(&mut self, inner: NodeId) -> NodeId {
        self.push(NodeKind::Optional(inner))
    }

    pub fn anchor(&mut self, anchor: Anchor) -> NodeId {
        self.push(NodeKind::Anchor(anchor))
    }

    /// New unbound rule called `name`; bind it later with [`Graph::set_inner`]
    pub fn named_rule(&mut self, name: &str) -> NodeId {
        let id = self.push(NodeKind::NamedRule { inner: None });
        self.set_name(id, name);
        id
    }

    pub fn set_name(&mut self, id: NodeId, name: &str) {
        self.nodes[id.index()].name = Some(name.to_string());
    }

    /// Bind (or rebind) the body of a `NamedRule`. Returns `false` when `rule`
    /// is some other kind of node.
    pub fn set_inner(&mut self, rule: NodeId, inner: NodeId) -> bool {
        match &mut self.nodes[rule.index()].kind {
            NodeKind::NamedRule { inner: slot } => {
                *slot = Some(inner);
                true
            }
            _ => false,
        }
    }

    /// Append to a `Sequence` or `Alternative`; other kinds are left alone
    pub fn push_item(&mut self, list: NodeId, item: NodeId) -> bool {
        match &mut self.nodes[list.index()].kind {
            NodeKind::Sequence(items) | NodeKind::Alternative(items) => {
                items.push(item);
                true
            }
            _ => false,
        }
    }

    /// Insert at `index` in a `Sequence` or `Alternative`
    pub fn insert_item(&mut self, list: NodeId, index: usize, item: NodeId) -> bool {
        match &mut self.nodes[list.index()].kind {
            NodeKind::Sequence(items) | NodeKind::Alternative(items) => {
                items.insert(index.min(items.len()), item);
                true
            }
            _ => false,
        }
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.index()].kind
    }

    pub fn name(&self, id: NodeId) -> Option<&str> {
        self.nodes[id.index()].name.as_deref()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (NodeId(index as u32), node))
    }

    /// Nodes reachable from `root`, depth-first in first-discovered order
    pub fn reachable(&self, root: NodeId) -> Vec<NodeId> {
        let mut seen = HashSet::new();
        let mut order = Vec::new();
        let mut stack = vec![root];

        while let Some(id) = stack.pop() {
            if !seen.insert(id) {
                continue;
            }
            order.push(id);
            // reversed so the first child is visited first
            for child in self.kind(id).children().into_iter().rev() {
                if !seen.contains(&child) {
                    stack.push(child);
                }
            }
        }

        order
    }

    /// BNF-like rendering of the expression at `id`. Rules other than `id`
    /// itself print as `<name>` references.
    pub fn display(&self, id: NodeId) -> String {
        match self.kind(id) {
            NodeKind::NamedRule { inner: Some(inner) } => self.display_expr(*inner, 0),
            NodeKind::NamedRule { inner: None } => "<unresolved>".to_string(),
            _ => self.display_expr(id, 0),
        }
    }

    fn display_expr(&self, id: NodeId, depth: usize) -> String {
        let node = self.node(id);
        match &node.kind {
            NodeKind::NamedRule { .. } => {
                format!("<{}>", node.name.as_deref().unwrap_or("?"))
            }
            _ if depth > 0 && node.name.is_some() => {
                // builtins and other named terminals print by name
                format!("<{}>", node.name.as_deref().unwrap_or("?"))
            }
            NodeKind::Literal(text) => format!("{:?}", text),
            NodeKind::CharacterSet { set, negated } => {
                if *negated {
                    format!("~{}", set)
                } else {
                    set.to_string()
                }
            }
            NodeKind::Sequence(items) => items
                .iter()
                .map(|item| self.display_grouped(*item, depth + 1))
                .collect::<Vec<_>>()
                .join(" "),
            NodeKind::Alternative(items) => items
                .iter()
                .map(|item| self.display_expr(*item, depth + 1))
                .collect::<Vec<_>>()
                .join(" | "),
            NodeKind::Repeat {
                inner, min, max, ..
            } => {
                let body = self.display_expr(*inner, depth + 1);
                match (min, max) {
                    (0, None) => format!("{{ {} }}", body),
                    (min, None) => format!("{{ {} }}{}..", body, min),
                    (min, Some(max)) => format!("{{ {} }}{}..{}", body, min, max),
                }
            }
            NodeKind::Optional(inner) => format!("[ {} ]", self.display_expr(*inner, depth + 1)),
            NodeKind::Anchor(Anchor::Start) => "^".to_string(),
            NodeKind::Anchor(Anchor::End) => "$".to_string(),
        }
    }

    fn display_grouped(&self, id: NodeId, depth: usize) -> String {
        let inner = self.display_expr(id, depth);
        match self.kind(id) {
            NodeKind::Alternative(_) if self.name(id).is_none() => format!("( {} )", inner),
            _ => inner,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charclass::CharClass;

    #[test]
    fn test_named_rule_placeholder_then_patch() {
        let mut g = Graph::new();
        let rule = g.named_rule("expr");
        assert_eq!(g.kind(rule), &NodeKind::NamedRule { inner: None });
        assert_eq!(g.name(rule), Some("expr"));

        let one = g.literal("1");
        assert!(g.set_inner(rule, one));
        assert_eq!(g.kind(rule), &NodeKind::NamedRule { inner: Some(one) });

        assert!(!g.set_inner(one, rule));
    }

    #[test]
    fn test_insert_item_prepends() {
        let mut g = Graph::new();
        let a = g.literal("a");
        let b = g.literal("b");
        let alt = g.alternative(vec![b]);
        assert!(g.insert_item(alt, 0, a));
        assert_eq!(g.kind(alt), &NodeKind::Alternative(vec![a, b]));
        assert!(!g.insert_item(a, 0, b));
    }

    #[test]
    fn test_reachable_handles_cycles() {
        let mut g = Graph::new();
        let e = g.named_rule("e");
        let plus = g.literal("+");
        let seq = g.sequence(vec![e, plus, e]);
        let one = g.literal("1");
        let alt = g.alternative(vec![seq, one]);
        g.set_inner(e, alt);
        let _unreachable = g.literal("nope");

        assert_eq!(g.reachable(e), vec![e, alt, seq, plus, one]);
    }

    #[test]
    fn test_display() {
        let mut g = Graph::new();
        let e = g.named_rule("e");
        let digit = g.char_set(CharSet::from_class(CharClass::category("Nd")), false);
        g.set_name(digit, "Digit");
        let plus = g.literal("+");
        let seq = g.sequence(vec![e, plus, digit]);
        let many = g.repeat(digit, 0, None, None);
        let opt = g.optional(many);
        let alt = g.alternative(vec![seq, opt]);
        g.set_inner(e, alt);

        assert_eq!(g.display(e), "<e> \"+\" <Digit> | [ { <Digit> } ]");
    }
}
