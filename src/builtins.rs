//! Built-in primitives that BNF rules may reference without defining them
//!
//! `<Digit>`, `<WhiteSpace>`, `<Eol>` and friends. Names are matched
//! case-insensitively. A primitive is only added to the target graph the
//! first time a compile references it, and is then shared by every
//! reference.

use crate::charclass::{CharClass, CharSet};
use crate::graph::{Anchor, Graph, NodeId};
use std::collections::HashMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Terminal {
    AnyChar,
    Digit,
    HexDigit,
    Letter,
    LetterOrDigit,
    WhiteSpace,
    SingleLineWhiteSpace,
    Punctuation,
    Symbol,
    ControlCodes,
    Eol,
    Start,
    End,
}

impl Terminal {
    pub const ALL: [Terminal; 13] = [
        Terminal::AnyChar,
        Terminal::Digit,
        Terminal::HexDigit,
        Terminal::Letter,
        Terminal::LetterOrDigit,
        Terminal::WhiteSpace,
        Terminal::SingleLineWhiteSpace,
        Terminal::Punctuation,
        Terminal::Symbol,
        Terminal::ControlCodes,
        Terminal::Eol,
        Terminal::Start,
        Terminal::End,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Terminal::AnyChar => "AnyChar",
            Terminal::Digit => "Digit",
            Terminal::HexDigit => "HexDigit",
            Terminal::Letter => "Letter",
            Terminal::LetterOrDigit => "LetterOrDigit",
            Terminal::WhiteSpace => "WhiteSpace",
            Terminal::SingleLineWhiteSpace => "SingleLineWhiteSpace",
            Terminal::Punctuation => "Punctuation",
            Terminal::Symbol => "Symbol",
            Terminal::ControlCodes => "ControlCodes",
            Terminal::Eol => "Eol",
            Terminal::Start => "Start",
            Terminal::End => "End",
        }
    }

    /// Character set behind a single-character terminal
    pub fn char_set(self) -> Option<CharSet> {
        let set = match self {
            // negated empty set: anything at all
            Terminal::AnyChar => CharSet::new(),
            Terminal::Digit => CharSet::from_class(CharClass::category("Nd")),
            Terminal::HexDigit => CharSet::new()
                .with_range('0', '9')
                .with_range('a', 'f')
                .with_range('A', 'F'),
            Terminal::Letter => CharSet::from_class(CharClass::category("L")),
            Terminal::LetterOrDigit => CharSet::from_class(CharClass::category("L"))
                .with_class(CharClass::category("Nd")),
            Terminal::WhiteSpace => CharSet::from_class(CharClass::WhiteSpace),
            Terminal::SingleLineWhiteSpace => CharSet::from_class(CharClass::SingleLineWhiteSpace),
            Terminal::Punctuation => CharSet::from_class(CharClass::category("P")),
            Terminal::Symbol => CharSet::from_class(CharClass::category("S")),
            Terminal::ControlCodes => CharSet::from_class(CharClass::category("Cc")),
            Terminal::Eol | Terminal::Start | Terminal::End => return None,
        };
        Some(set)
    }

    /// Build this terminal into `graph` as one unnamed node
    pub fn build(self, graph: &mut Graph) -> NodeId {
        match self {
            Terminal::Eol => {
                let crlf = graph.literal("\r\n");
                let lf = graph.literal("\n");
                graph.alternative(vec![crlf, lf])
            }
            Terminal::Start => graph.anchor(Anchor::Start),
            Terminal::End => graph.anchor(Anchor::End),
            Terminal::AnyChar => graph.char_set(CharSet::new(), true),
            other => graph.char_set(other.char_set().unwrap_or_default(), false),
        }
    }
}

/// Default body for a rule that is referenced but never defined: one or more
/// letters or digits
pub fn fallback_terminal(graph: &mut Graph) -> NodeId {
    let item = Terminal::LetterOrDigit.build(graph);
    graph.repeat(item, 1, None, None)
}

/// Name table plus the nodes already materialised in the current graph
#[derive(Debug, Clone, Default)]
pub struct Builtins {
    table: HashMap<String, Terminal>,
    installed: HashMap<Terminal, NodeId>,
}

impl Builtins {
    /// Every [`Terminal`], as used in enhanced mode
    pub fn enhanced() -> Self {
        let table = Terminal::ALL
            .iter()
            .map(|t| (t.name().to_lowercase(), *t))
            .collect();
        Builtins {
            table,
            installed: HashMap::new(),
        }
    }

    /// No primitives at all
    pub fn empty() -> Self {
        Builtins::default()
    }

    pub fn new(enhanced: bool) -> Self {
        if enhanced {
            Builtins::enhanced()
        } else {
            Builtins::empty()
        }
    }

    pub fn lookup(&self, name: &str) -> Option<Terminal> {
        self.table.get(&name.to_lowercase()).copied()
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Node for `name` in `graph`, building and naming it on first use
    pub fn resolve(&mut self, name: &str, graph: &mut Graph) -> Option<NodeId> {
        let terminal = self.lookup(name)?;
        if let Some(&id) = self.installed.get(&terminal) {
            return Some(id);
        }
        let id = terminal.build(graph);
        graph.set_name(id, terminal.name());
        self.installed.insert(terminal, id);
        Some(id)
    }

    /// Forget installed nodes; call when starting a new graph
    pub fn reset(&mut self) {
        self.installed.clear();
    }
}
