//! The grammar of BNF itself
//!
//! Built once per compiler out of the same combinators it compiles BNF into.
//! Every capture the graph builder acts on has a [`Role`]; the rest (rule
//! names, literal values, whitespace gaps) are read by name from the
//! enclosing capture.

use crate::charclass::{CharClass, CharSet};
use crate::graph::{Anchor, Graph, NodeId};
use crate::match_tree::Match;
use crate::matcher::Matcher;
use crate::parse_context::MatchError;
use std::collections::HashMap;

/// Capture names shared with the graph builder
pub mod names {
    pub const DOCUMENT: &str = "document";
    pub const RULE: &str = "rule";
    pub const DECLARATION: &str = "declaration";
    pub const NAME: &str = "name";
    pub const EXPRESSION: &str = "expression";
    pub const LIST: &str = "list";
    pub const TERM: &str = "term";
    pub const GAP: &str = "ws";
    pub const LITERAL: &str = "literal";
    pub const VALUE: &str = "value";
    pub const REFERENCE: &str = "reference";
    pub const GROUP: &str = "group";
    pub const REPEAT: &str = "repeat";
    pub const OPTIONAL: &str = "optional";
}

/// What a capture means to the graph builder
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    Rule,
    Expression,
    List,
    Term,
    Literal,
    Reference,
    Group,
    Repeat,
    Optional,
}

pub struct MetaGrammar {
    graph: Graph,
    root: NodeId,
    roles: HashMap<NodeId, Role>,
    enhanced: bool,
}

impl MetaGrammar {
    /// BNF meta-grammar; `enhanced` adds `( )`, `{ }` and `[ ]`, and
    /// `separator` is the token between a rule name and its body
    pub fn new(enhanced: bool, separator: &str) -> Self {
        let mut g = Graph::new();
        let mut roles = HashMap::new();

        let sws_char = g.char_set(CharSet::from_class(CharClass::SingleLineWhiteSpace), false);
        let sws = g.repeat(sws_char, 0, None, None);
        let ws_char = g.char_set(CharSet::from_class(CharClass::WhiteSpace), false);
        let ws = g.repeat(ws_char, 0, None, None);

        // line_end: sws ( (sws eol)+ | end-of-input )
        let crlf = g.literal("\r\n");
        let lf = g.literal("\n");
        let eol = g.alternative(vec![crlf, lf]);
        let blank = g.sequence(vec![sws, eol]);
        let eols = g.repeat(blank, 1, None, None);
        let end = g.anchor(Anchor::End);
        let eol_or_end = g.alternative(vec![eols, end]);
        let line_end = g.sequence(vec![sws, eol_or_end]);

        // literal: "'" value? "'" | '"' value? '"'
        let literal = {
            let quoted = |g: &mut Graph, quote: char| {
                let mark = g.char_set(CharSet::from_chars(&[quote]), false);
                let body_char = g.char_set(CharSet::from_chars(&[quote]), true);
                let value = g.repeat(body_char, 1, None, None);
                g.set_name(value, names::VALUE);
                let value = g.optional(value);
                g.sequence(vec![mark, value, mark])
            };
            let single = quoted(&mut g, '\'');
            let double = quoted(&mut g, '"');
            g.alternative(vec![single, double])
        };
        g.set_name(literal, names::LITERAL);
        roles.insert(literal, Role::Literal);

        // rule name: "<" ~[">"]+ ">"
        let name_char = g.char_set(CharSet::from_chars(&['>']), true);
        let name = g.repeat(name_char, 1, None, None);
        g.set_name(name, names::NAME);
        let open_angle = g.literal("<");
        let close_angle = g.literal(">");
        let reference = g.sequence(vec![open_angle, name, close_angle]);
        g.set_name(reference, names::REFERENCE);
        roles.insert(reference, Role::Reference);
        let declaration = g.sequence(vec![open_angle, name, close_angle]);
        g.set_name(declaration, names::DECLARATION);

        // expression is recursive through groups; items are added below
        let expression = g.sequence(Vec::new());
        g.set_name(expression, names::EXPRESSION);
        roles.insert(expression, Role::Expression);

        // term: literal | reference | "(" expr ")" | "{" expr "}" | "[" expr "]"
        let mut terms = vec![literal, reference];
        if enhanced {
            let brackets = [
                ("(", ")", names::GROUP, Role::Group),
                ("{", "}", names::REPEAT, Role::Repeat),
                ("[", "]", names::OPTIONAL, Role::Optional),
            ];
            for (open, close, capture, role) in brackets {
                let open = g.literal(open);
                let close = g.literal(close);
                let bracketed = g.sequence(vec![open, sws, expression, sws, close]);
                g.set_name(bracketed, capture);
                roles.insert(bracketed, role);
                terms.push(bracketed);
            }
        }
        let term = g.alternative(terms);
        g.set_name(term, names::TERM);
        roles.insert(term, Role::Term);

        // list: term (gap? term)*
        let gap = g.repeat(sws_char, 1, None, None);
        g.set_name(gap, names::GAP);
        let gap = g.optional(gap);
        let next_term = g.sequence(vec![gap, term]);
        let more_terms = g.repeat(next_term, 0, None, None);
        let list = g.sequence(vec![term, more_terms]);
        g.set_name(list, names::LIST);
        roles.insert(list, Role::List);

        // expression: list (ws "|" sws list)*
        let pipe = g.literal("|");
        let choice = g.sequence(vec![ws, pipe, sws, list]);
        let choices = g.repeat(choice, 0, None, None);
        g.push_item(expression, list);
        g.push_item(expression, choices);

        // rule: line_end? sws declaration ws separator sws expression line_end
        let leading = g.optional(line_end);
        let separator = g.literal(separator);
        let rule = g.sequence(vec![
            leading,
            sws,
            declaration,
            ws,
            separator,
            sws,
            expression,
            line_end,
        ]);
        g.set_name(rule, names::RULE);
        roles.insert(rule, Role::Rule);

        // document: ws rule+ ws
        let rules = g.repeat(rule, 1, None, None);
        let root = g.sequence(vec![ws, rules, ws]);
        g.set_name(root, names::DOCUMENT);

        MetaGrammar {
            graph: g,
            root,
            roles,
            enhanced,
        }
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn is_enhanced(&self) -> bool {
        self.enhanced
    }

    pub fn role(&self, node: NodeId) -> Option<Role> {
        self.roles.get(&node).copied()
    }

    /// Match a whole BNF document
    pub fn parse<T>(&self, text: &str) -> Result<Match<T>, MatchError> {
        Matcher::new(&self.graph).match_all(self.root, text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::Scanner;

    fn parse(meta: &MetaGrammar, text: &str) -> Match {
        match meta.parse(text) {
            Ok(m) => m,
            Err(e) => panic!("{}", e.format_with_context(text)),
        }
    }

    #[test]
    fn test_rule_structure() {
        let meta = MetaGrammar::new(true, "::=");
        let text = "<a> ::= 'x' <b>\n";
        let doc = parse(&meta, text);
        let input = Scanner::new(text);

        assert_eq!(doc.name, names::DOCUMENT);
        let rule = doc.get(names::RULE).expect("rule");
        assert_eq!(meta.role(rule.node), Some(Role::Rule));

        let decl = rule.get(names::DECLARATION).expect("declaration");
        assert_eq!(decl.get(names::NAME).map(|n| n.text(&input)), Some("a".to_string()));

        let list = rule
            .get(names::EXPRESSION)
            .and_then(|e| e.get(names::LIST))
            .expect("list");
        let kinds: Vec<_> = list.children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(kinds, vec![names::TERM, names::GAP, names::TERM]);

        let value = list.find(names::VALUE).expect("literal value");
        assert_eq!(value.text(&input), "x");
    }

    #[test]
    fn test_many_rules_and_blank_lines() {
        let meta = MetaGrammar::new(true, "::=");
        let text = "\n<a> ::= <b> | 'x'\n\n\n  <b> ::= \"y\"  \n   <c> ::= ''";
        let doc = parse(&meta, text);
        assert_eq!(doc.children_named(names::RULE).count(), 3);
    }

    #[test]
    fn test_alternatives_continue_on_next_line() {
        let meta = MetaGrammar::new(true, "::=");
        let text = "<a> ::= 'x'\n      | 'y'\n      | 'z'\n";
        let doc = parse(&meta, text);
        let rule = doc.get(names::RULE).expect("rule");
        let expression = rule.get(names::EXPRESSION).expect("expression");
        assert_eq!(expression.children_named(names::LIST).count(), 3);
        assert!(expression.get(names::EXPRESSION).is_none());
    }

    #[test]
    fn test_long_choice_is_one_flat_expression() {
        let meta = MetaGrammar::new(true, "::=");
        let choices: Vec<_> = (0..5000).map(|i| format!("'k{}'", i)).collect();
        let text = format!("<a> ::= {}\n", choices.join(" | "));
        let doc = parse(&meta, &text);
        let expression = doc.find(names::EXPRESSION).expect("expression");
        assert_eq!(expression.children_named(names::LIST).count(), 5000);
    }

    #[test]
    fn test_enhanced_terms() {
        let meta = MetaGrammar::new(true, "::=");
        let doc = parse(&meta, "<a> ::= ( 'x' | 'y' ) { <b> } [ 'z' ]\n");
        assert!(doc.find(names::GROUP).is_some());
        assert!(doc.find(names::REPEAT).is_some());
        assert!(doc.find(names::OPTIONAL).is_some());
    }

    #[test]
    fn test_basic_mode_rejects_brackets() {
        let meta = MetaGrammar::new(false, "::=");
        assert!(!meta.is_enhanced());
        assert!(meta.parse::<()>("<a> ::= 'x'\n").is_ok());
        assert!(meta.parse::<()>("<a> ::= ( 'x' )\n").is_err());
    }

    #[test]
    fn test_custom_separator() {
        let meta = MetaGrammar::new(true, "=");
        assert!(meta.parse::<()>("<a> = 'x'\n").is_ok());
        assert!(meta.parse::<()>("<a> ::= 'x'\n").is_err());
    }

    #[test]
    fn test_syntax_error_position() {
        let meta = MetaGrammar::new(true, "::=");
        let text = "<a> ::= 'x'\n<b> :: 'y'\n";
        let err = meta.parse::<()>(text).unwrap_err();
        // furthest failure is inside the broken separator on line 2
        let (line, _) = Scanner::new(text).line_col(err.position());
        assert_eq!(line, 2);
    }
}
