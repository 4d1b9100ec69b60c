//! PEG matching engine
//!
//! Runs a [`Graph`] against input text by recursive descent: sequences are
//! all-or-nothing, alternatives are ordered (first match wins), repetitions
//! are greedy and never give back items. A rule that re-enters itself at the
//! same position fails instead of recursing forever, so left-recursive
//! grammars terminate (matching only their non-recursive branches).

use crate::graph::{Anchor, Graph, NodeId, NodeKind};
use crate::match_tree::Match;
use crate::parse_context::{MatchContext, MatchError};
use crate::scanner::Scanner;

/// Matches nodes of one graph against input
pub struct Matcher<'g> {
    graph: &'g Graph,
}

impl<'g> Matcher<'g> {
    pub fn new(graph: &'g Graph) -> Self {
        Matcher { graph }
    }

    /// Match `root` against the whole of `input`
    ///
    /// On failure the error is the one recorded furthest into the input.
    pub fn match_all<T>(&self, root: NodeId, input: &str) -> Result<Match<T>, MatchError> {
        let mut scanner = Scanner::new(input);
        let mut ctx = MatchContext::new();
        let mut captures = Vec::new();

        if let Err(e) = self.match_node(root, &mut scanner, &mut ctx, &mut captures) {
            return Err(ctx.best_error(e));
        }

        if !scanner.is_eof() {
            let incomplete = MatchError::IncompleteMatch {
                position: scanner.position(),
                remaining: scanner.remaining().chars().take(20).collect(),
            };
            return Err(ctx.best_error(incomplete));
        }

        Ok(self.root_match(root, captures, scanner.position()))
    }

    /// Match `root` against a prefix of `input`
    pub fn match_prefix<T>(&self, root: NodeId, input: &str) -> Result<Match<T>, MatchError> {
        let mut scanner = Scanner::new(input);
        let mut ctx = MatchContext::new();
        let mut captures = Vec::new();

        self.match_node(root, &mut scanner, &mut ctx, &mut captures)
            .map_err(|e| ctx.best_error(e))?;

        Ok(self.root_match(root, captures, scanner.position()))
    }

    /// Whether `root` accepts all of `input`
    pub fn accepts(&self, root: NodeId, input: &str) -> bool {
        self.match_all::<()>(root, input).is_ok()
    }

    fn root_match<T>(&self, root: NodeId, mut captures: Vec<Match<T>>, end: usize) -> Match<T> {
        if captures.len() == 1 && captures[0].node == root {
            if let Some(only) = captures.pop() {
                return only;
            }
        }
        let mut m = Match::new(root, self.graph.name(root).unwrap_or(""), 0, end);
        m.children = captures;
        m
    }

    /// Match one node, appending its captures to `out`. On failure the
    /// scanner and `out` are left as they were.
    fn match_node<T>(
        &self,
        id: NodeId,
        scanner: &mut Scanner,
        ctx: &mut MatchContext,
        out: &mut Vec<Match<T>>,
    ) -> Result<(), MatchError> {
        let start = scanner.position();
        let mark = out.len();
        let node = self.graph.node(id);

        let result = match &node.name {
            Some(name) => {
                let mut children = Vec::new();
                self.match_kind(id, &node.kind, scanner, ctx, &mut children)
                    .map(|()| {
                        let mut m = Match::new(id, name, start, scanner.position());
                        m.children = children;
                        out.push(m);
                    })
            }
            None => self.match_kind(id, &node.kind, scanner, ctx, out),
        };

        if result.is_err() {
            scanner.set_position(start);
            out.truncate(mark);
        }
        result
    }

    fn match_kind<T>(
        &self,
        id: NodeId,
        kind: &NodeKind,
        scanner: &mut Scanner,
        ctx: &mut MatchContext,
        out: &mut Vec<Match<T>>,
    ) -> Result<(), MatchError> {
        let start = scanner.position();

        match kind {
            NodeKind::Literal(text) => {
                if scanner.eat(text) {
                    return Ok(());
                }
                let len = text.chars().count();
                let actual = scanner.slice(start, start + len);
                let error = if actual.chars().count() < len && text.starts_with(&actual) {
                    MatchError::UnexpectedEof {
                        position: scanner.len(),
                        expected: format!("{:?}", text),
                    }
                } else {
                    MatchError::LiteralMismatch {
                        expected: text.clone(),
                        actual,
                        position: start,
                    }
                };
                Err(ctx.fail(error))
            }

            NodeKind::CharacterSet { set, negated } => match scanner.current() {
                Some(ch) if set.contains(ch) != *negated => {
                    scanner.advance();
                    Ok(())
                }
                Some(ch) => {
                    let set = if *negated {
                        format!("~{}", set)
                    } else {
                        set.to_string()
                    };
                    Err(ctx.fail(MatchError::SetMismatch {
                        set,
                        actual: ch,
                        position: start,
                    }))
                }
                None => Err(ctx.fail(MatchError::UnexpectedEof {
                    position: start,
                    expected: set.to_string(),
                })),
            },

            NodeKind::Sequence(items) => {
                for &item in items {
                    self.match_node(item, scanner, ctx, out)?;
                }
                Ok(())
            }

            NodeKind::Alternative(items) => {
                for &item in items {
                    if self.match_node(item, scanner, ctx, out).is_ok() {
                        return Ok(());
                    }
                }
                Err(ctx.fail(MatchError::NoAlternativeMatched {
                    position: start,
                    rule: ctx.rule_name.clone(),
                    attempts: items.len(),
                }))
            }

            NodeKind::Repeat {
                inner,
                min,
                max,
                separator,
            } => {
                let mut count = 0;
                loop {
                    if max.is_some_and(|max| count >= max) {
                        break;
                    }
                    let before = scanner.position();
                    let mark = out.len();

                    if count > 0 {
                        if let Some(sep) = separator {
                            if self.match_node(*sep, scanner, ctx, out).is_err() {
                                break;
                            }
                        }
                    }
                    if self.match_node(*inner, scanner, ctx, out).is_err() {
                        // give back a separator that led nowhere
                        scanner.set_position(before);
                        out.truncate(mark);
                        break;
                    }
                    count += 1;

                    if scanner.position() == before {
                        break;
                    }
                }

                if count < *min {
                    return Err(ctx.fail(MatchError::TooFewRepeats {
                        position: start,
                        min: *min,
                        found: count,
                    }));
                }
                Ok(())
            }

            NodeKind::Optional(inner) => {
                let _ = self.match_node(*inner, scanner, ctx, out);
                Ok(())
            }

            NodeKind::NamedRule { inner } => {
                let name = self.graph.name(id).unwrap_or("");
                let Some(inner) = inner else {
                    return Err(ctx.fail(MatchError::UnresolvedRule {
                        rule: name.to_string(),
                        position: start,
                    }));
                };

                if !ctx.enter_rule(id, name, start) {
                    log::trace!("cut left recursion of <{}> at {}", name, start);
                    return Err(ctx.fail(MatchError::LeftRecursion {
                        rule: name.to_string(),
                        position: start,
                    }));
                }
                let outer = std::mem::replace(&mut ctx.rule_name, name.to_string());
                let result = self.match_node(*inner, scanner, ctx, out);
                ctx.exit_rule(id, start);
                ctx.rule_name = outer;
                result
            }

            NodeKind::Anchor(anchor) => {
                let (ok, expected) = match anchor {
                    Anchor::Start => (start == 0, "start of input"),
                    Anchor::End => (scanner.is_eof(), "end of input"),
                };
                if ok {
                    Ok(())
                } else {
                    Err(ctx.fail(MatchError::AnchorMismatch {
                        expected: expected.to_string(),
                        position: start,
                    }))
                }
            }
        }
    }
}
