//! Builds the target combinator graph from a matched BNF document
//!
//! [`GraphBuilder`] is a [`MatchVisitor`] over the meta-grammar's match tree.
//! Each capture's tag is the target node it compiled to; a capture reads the
//! tags of its children (already set, as `matched` runs post-order) and sets
//! its own. Rule captures register their `NamedRule` in `pre_match`, before
//! anything inside the rule body runs, so recursion resolves to the same node.

use crate::builtins::Builtins;
use crate::charclass::{CharClass, CharSet};
use crate::compiler::GapWhitespace;
use crate::events::{self, MatchVisitor};
use crate::graph::{Graph, NodeId};
use crate::match_tree::Match;
use crate::meta_grammar::{names, MetaGrammar, Role};
use crate::registry::RuleRegistry;
use crate::scanner::Scanner;
use std::collections::HashSet;

pub struct GraphBuilder<'a> {
    meta: &'a MetaGrammar,
    input: &'a Scanner,
    registry: &'a mut RuleRegistry,
    builtins: &'a mut Builtins,
    graph: Graph,
    gap: GapWhitespace,
    /// Zero or more same-line whitespace, shared
    skip: Option<NodeId>,
    /// One or more same-line whitespace, shared
    required_gap: Option<NodeId>,
    /// Lowercased names of every rule the document defines
    declared: HashSet<String>,
}

impl<'a> GraphBuilder<'a> {
    pub fn new(
        meta: &'a MetaGrammar,
        input: &'a Scanner,
        registry: &'a mut RuleRegistry,
        builtins: &'a mut Builtins,
        gap: GapWhitespace,
    ) -> Self {
        GraphBuilder {
            meta,
            input,
            registry,
            builtins,
            graph: Graph::new(),
            gap,
            skip: None,
            required_gap: None,
            declared: HashSet::new(),
        }
    }

    /// Fire the build over `document` and hand back the finished graph
    pub fn build(mut self, document: &mut Match<NodeId>) -> Graph {
        for rule in document.children_named(names::RULE) {
            if let Some(name) = self.rule_name(rule) {
                self.declared.insert(name.to_lowercase());
            }
        }
        events::fire(&mut self, document);
        self.graph
    }

    fn rule_name(&self, rule: &Match<NodeId>) -> Option<String> {
        rule.get(names::DECLARATION)
            .and_then(|decl| decl.get(names::NAME))
            .map(|name| name.text(self.input))
    }

    fn skip(&mut self) -> NodeId {
        if let Some(id) = self.skip {
            return id;
        }
        let ch = self
            .graph
            .char_set(CharSet::from_class(CharClass::SingleLineWhiteSpace), false);
        let id = self.graph.repeat(ch, 0, None, None);
        self.skip = Some(id);
        id
    }

    fn gap(&mut self) -> NodeId {
        match self.gap {
            GapWhitespace::Optional => self.skip(),
            GapWhitespace::Required => {
                if let Some(id) = self.required_gap {
                    return id;
                }
                let ch = self
                    .graph
                    .char_set(CharSet::from_class(CharClass::SingleLineWhiteSpace), false);
                let id = self.graph.repeat(ch, 1, None, None);
                self.required_gap = Some(id);
                id
            }
        }
    }

    /// Target node for `<name>`: a known rule, then a rule defined later in
    /// the document, then a built-in, then a placeholder that is given the
    /// fallback body if nothing ever defines it
    fn reference(&mut self, name: &str) -> NodeId {
        if let Some(id) = self.registry.lookup(name) {
            return id;
        }
        if !self.declared.contains(&name.to_lowercase()) {
            if let Some(id) = self.builtins.resolve(name, &mut self.graph) {
                return id;
            }
        }
        self.registry.resolve(name, &mut self.graph)
    }

    fn list(&mut self, m: &Match<NodeId>) -> Option<NodeId> {
        let terms = m.children_named(names::TERM).count();
        if terms == 1 {
            return child_tag(m, names::TERM);
        }

        let mut items = Vec::with_capacity(m.children.len());
        for child in &m.children {
            match child.name.as_str() {
                names::TERM => items.push(child.tag?),
                names::GAP => items.push(self.gap()),
                _ => {}
            }
        }
        Some(self.graph.sequence(items))
    }

    fn expression(&mut self, m: &Match<NodeId>) -> Option<NodeId> {
        let choices = m
            .children_named(names::LIST)
            .map(|list| list.tag)
            .collect::<Option<Vec<_>>>()?;
        match choices.len() {
            0 => None,
            1 => choices.first().copied(),
            _ => Some(self.graph.alternative(choices)),
        }
    }

    fn build_tag(&mut self, role: Role, m: &Match<NodeId>) -> Option<NodeId> {
        match role {
            Role::Literal => {
                let value = m
                    .get(names::VALUE)
                    .map(|v| v.text(self.input))
                    .unwrap_or_default();
                Some(self.graph.literal(&value))
            }
            Role::Reference => {
                let name = m.get(names::NAME)?.text(self.input);
                Some(self.reference(&name))
            }
            Role::Group => child_tag(m, names::EXPRESSION),
            Role::Repeat => {
                let inner = child_tag(m, names::EXPRESSION)?;
                let skip = self.skip();
                Some(self.graph.repeat(inner, 0, None, Some(skip)))
            }
            Role::Optional => {
                let inner = child_tag(m, names::EXPRESSION)?;
                Some(self.graph.optional(inner))
            }
            Role::Term => m.children.first().and_then(|c| c.tag),
            Role::List => self.list(m),
            Role::Expression => self.expression(m),
            Role::Rule => {
                let rule = m.tag?;
                let body = child_tag(m, names::EXPRESSION)?;
                self.graph.set_inner(rule, body);
                Some(rule)
            }
        }
    }
}

fn child_tag(m: &Match<NodeId>, name: &str) -> Option<NodeId> {
    m.get(name).and_then(|child| child.tag)
}

impl MatchVisitor for GraphBuilder<'_> {
    type Tag = NodeId;

    fn pre_match(&mut self, m: &mut Match<NodeId>) {
        if self.meta.role(m.node) != Some(Role::Rule) {
            return;
        }
        if let Some(name) = self.rule_name(m) {
            let rule = self.registry.define(&name, &mut self.graph);
            log::trace!("rule <{}> -> {}", name, rule);
            m.tag = Some(rule);
        }
    }

    fn matched(&mut self, m: &mut Match<NodeId>) {
        let Some(role) = self.meta.role(m.node) else {
            return;
        };
        match self.build_tag(role, m) {
            Some(id) => {
                log::trace!("{:?} [{}..{}] -> {}", role, m.start, m.end, id);
                m.tag = Some(id);
            }
            None => log::error!("{:?} at {} has no node to build from", role, m.start),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::NodeKind;

    struct Built {
        graph: Graph,
        registry: RuleRegistry,
    }

    fn build(text: &str, gap: GapWhitespace) -> Built {
        let meta = MetaGrammar::new(true, "::=");
        let input = Scanner::new(text);
        let mut registry = RuleRegistry::new();
        let mut builtins = Builtins::enhanced();
        let mut doc = meta.parse::<NodeId>(text).expect("valid bnf");
        let graph = GraphBuilder::new(&meta, &input, &mut registry, &mut builtins, gap)
            .build(&mut doc);
        Built { graph, registry }
    }

    fn body(built: &Built, rule: &str) -> NodeId {
        let id = built.registry.lookup(rule).expect("rule registered");
        match built.graph.kind(id) {
            NodeKind::NamedRule { inner: Some(inner) } => *inner,
            other => panic!("unbound rule {}: {:?}", rule, other),
        }
    }

    #[test]
    fn test_three_way_choice_is_flat() {
        let built = build("<a> ::= '1' | '2' | '3'\n", GapWhitespace::Required);
        let alt = body(&built, "a");
        match built.graph.kind(alt) {
            NodeKind::Alternative(items) => {
                assert_eq!(items.len(), 3);
                let texts: Vec<_> = items
                    .iter()
                    .map(|&i| built.graph.kind(i).clone())
                    .collect();
                assert_eq!(texts[0], NodeKind::Literal("1".to_string()));
                assert_eq!(texts[2], NodeKind::Literal("3".to_string()));
            }
            other => panic!("expected alternative, got {:?}", other),
        }
    }

    #[test]
    fn test_single_term_not_wrapped() {
        let built = build("<a> ::= 'x'\n", GapWhitespace::Required);
        let x = body(&built, "a");
        assert_eq!(built.graph.kind(x), &NodeKind::Literal("x".to_string()));
    }

    #[test]
    fn test_gap_inserted_only_where_written() {
        let built = build("<a> ::= 'x' 'y'\n<b> ::= ('x')('y')\n", GapWhitespace::Required);

        let NodeKind::Sequence(spaced) = built.graph.kind(body(&built, "a")).clone() else {
            panic!("expected sequence");
        };
        assert_eq!(spaced.len(), 3);
        assert!(matches!(
            built.graph.kind(spaced[1]),
            NodeKind::Repeat { min: 1, .. }
        ));

        let NodeKind::Sequence(tight) = built.graph.kind(body(&built, "b")).clone() else {
            panic!("expected sequence");
        };
        assert_eq!(tight.len(), 2);
    }

    #[test]
    fn test_gap_node_is_shared() {
        let built = build("<a> ::= 'x' 'y' 'z'\n", GapWhitespace::Optional);
        let NodeKind::Sequence(items) = built.graph.kind(body(&built, "a")).clone() else {
            panic!("expected sequence");
        };
        assert_eq!(items.len(), 5);
        assert_eq!(items[1], items[3]);
        assert!(matches!(
            built.graph.kind(items[1]),
            NodeKind::Repeat { min: 0, .. }
        ));
    }

    #[test]
    fn test_recursive_rule_is_one_node() {
        let built = build("<e> ::= <e> '+' <e> | '1'\n", GapWhitespace::Required);
        let e = built.registry.lookup("e").expect("e");
        assert_eq!(built.registry.len(), 1);

        let NodeKind::Alternative(alts) = built.graph.kind(body(&built, "e")).clone() else {
            panic!("expected alternative");
        };
        let NodeKind::Sequence(seq) = built.graph.kind(alts[0]).clone() else {
            panic!("expected sequence");
        };
        let refs = seq.iter().filter(|&&id| id == e).count();
        assert_eq!(refs, 2);
    }

    #[test]
    fn test_repeat_and_optional() {
        let built = build("<a> ::= { 'x' } [ 'y' ]\n", GapWhitespace::Required);
        let NodeKind::Sequence(items) = built.graph.kind(body(&built, "a")).clone() else {
            panic!("expected sequence");
        };
        match built.graph.kind(items[0]) {
            NodeKind::Repeat {
                min: 0,
                max: None,
                separator: Some(sep),
                ..
            } => assert!(matches!(
                built.graph.kind(*sep),
                NodeKind::Repeat { min: 0, .. }
            )),
            other => panic!("expected repeat, got {:?}", other),
        }
        assert!(matches!(built.graph.kind(items[2]), NodeKind::Optional(_)));
    }

    #[test]
    fn test_builtin_reference() {
        let built = build("<a> ::= <digit> <Digit>\n", GapWhitespace::Required);
        let NodeKind::Sequence(items) = built.graph.kind(body(&built, "a")).clone() else {
            panic!("expected sequence");
        };
        assert_eq!(items[0], items[2]);
        assert_eq!(built.graph.name(items[0]), Some("Digit"));
        // builtins are not rules
        assert_eq!(built.registry.lookup("digit"), None);
    }

    #[test]
    fn test_user_rule_shadows_builtin() {
        let built = build("<a> ::= <digit>\n<digit> ::= '0'\n", GapWhitespace::Required);
        let digit = built.registry.lookup("digit").expect("user rule");
        assert_eq!(body(&built, "a"), digit);
    }

    #[test]
    fn test_forward_reference_left_unbound() {
        let built = build("<a> ::= <missing>\n", GapWhitespace::Required);
        let missing = built.registry.lookup("missing").expect("placeholder");
        assert_eq!(
            built.graph.kind(missing),
            &NodeKind::NamedRule { inner: None }
        );
        assert!(!built.registry.is_defined("missing"));
    }

    #[test]
    fn test_empty_literal() {
        let built = build("<a> ::= ''\n", GapWhitespace::Required);
        assert_eq!(
            built.graph.kind(body(&built, "a")),
            &NodeKind::Literal(String::new())
        );
    }
}
