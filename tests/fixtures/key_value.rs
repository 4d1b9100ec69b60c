// Date Created: 0
// Source BNF:
//     <pair>  ::= <key> '=' <value>
//     <key>   ::= <Letter>{<LetterOrDigit>}
//     <value> ::= <key> | <Start>'-'

use rustbnf::{Anchor, CharClass, CharSet, CompiledGrammar, Graph};

pub struct KeyValueGrammar;

impl KeyValueGrammar {
    pub fn build() -> CompiledGrammar {
        let mut g = Graph::new();

        let pair = g.named_rule("pair");
        let key = g.named_rule("key");
        let value = g.named_rule("value");

        let letter = g.char_set(CharSet::new().with_class(CharClass::category("L")), false);
        g.set_name(letter, "Letter");
        let letter_or_digit = g.char_set(CharSet::new().with_class(CharClass::category("L")).with_class(CharClass::category("Nd")), false);
        g.set_name(letter_or_digit, "LetterOrDigit");
        let n1 = g.char_set(CharSet::new().with_class(CharClass::SingleLineWhiteSpace), false);
        let n2 = g.repeat(n1, 0, None, None);
        let n3 = g.repeat(letter_or_digit, 0, None, Some(n2));
        let n4 = g.sequence(vec![letter, n3]);
        let n5 = g.char_set(CharSet::new().with_class(CharClass::SingleLineWhiteSpace), false);
        let n6 = g.repeat(n5, 1, None, None);
        let n7 = g.literal("=");
        let start = g.anchor(Anchor::Start);
        g.set_name(start, "Start");
        let n8 = g.literal("-");
        let n9 = g.sequence(vec![start, n8]);
        let n10 = g.alternative(vec![key, n9]);
        let n11 = g.sequence(vec![key, n6, n7, n6, value]);

        g.set_inner(pair, n11);
        g.set_inner(key, n4);
        g.set_inner(value, n10);

        CompiledGrammar::from_graph(g, pair)
    }
}
