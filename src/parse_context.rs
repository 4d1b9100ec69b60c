//! Match context and error types for the matcher
//!
//! Tracks the rules currently being matched (to cut left recursion) and the
//! failure that got furthest into the input, which is what a user wants to
//! see when a whole-input match fails.

use crate::graph::NodeId;
use crate::scanner::Scanner;
use std::collections::HashSet;

/// State carried through one match of a graph against one input
#[derive(Debug, Clone, Default)]
pub struct MatchContext {
    /// (rule, position) pairs currently on the call stack
    pub active_rules: HashSet<(NodeId, usize)>,

    /// Name of the innermost rule being matched, for error messages
    pub rule_name: String,

    /// Failure recorded furthest into the input
    pub furthest: Option<MatchError>,
}

impl MatchContext {
    pub fn new() -> Self {
        MatchContext::default()
    }

    /// Enter `rule` at `position`. Returns `false` if the rule is already
    /// being matched at that position (left recursion).
    pub fn enter_rule(&mut self, rule: NodeId, name: &str, position: usize) -> bool {
        if !self.active_rules.insert((rule, position)) {
            return false;
        }
        self.rule_name = name.to_string();
        true
    }

    pub fn exit_rule(&mut self, rule: NodeId, position: usize) {
        self.active_rules.remove(&(rule, position));
    }

    /// Remember `error` if it is at least as far into the input as any
    /// failure seen so far, and hand it back
    pub fn fail(&mut self, error: MatchError) -> MatchError {
        let further = match &self.furthest {
            Some(previous) => error.position() >= previous.position(),
            None => true,
        };
        if further {
            self.furthest = Some(error.clone());
        }
        error
    }

    /// The most informative error for a failed match: the furthest failure,
    /// unless `fallback` got further
    pub fn best_error(&self, fallback: MatchError) -> MatchError {
        match &self.furthest {
            Some(furthest) if furthest.position() > fallback.position() => furthest.clone(),
            _ => fallback,
        }
    }
}

/// Why a node failed to match
#[derive(Debug, Clone, PartialEq)]
pub enum MatchError {
    /// Input ended while something was still expected
    UnexpectedEof { position: usize, expected: String },

    /// Literal text didn't match
    LiteralMismatch {
        expected: String,
        actual: String,
        position: usize,
    },

    /// Character not accepted by a character set
    SetMismatch {
        set: String,
        actual: char,
        position: usize,
    },

    /// Start/end-of-input assertion failed
    AnchorMismatch { expected: String, position: usize },

    /// No branch of an alternative matched
    NoAlternativeMatched {
        position: usize,
        rule: String,
        attempts: usize,
    },

    /// A repetition matched fewer items than its minimum
    TooFewRepeats {
        position: usize,
        min: usize,
        found: usize,
    },

    /// A rule re-entered itself without consuming input
    LeftRecursion { rule: String, position: usize },

    /// A `NamedRule` with no body was reached
    UnresolvedRule { rule: String, position: usize },

    /// The start node matched but input remains
    IncompleteMatch { position: usize, remaining: String },
}

impl MatchError {
    pub fn position(&self) -> usize {
        match self {
            MatchError::UnexpectedEof { position, .. } => *position,
            MatchError::LiteralMismatch { position, .. } => *position,
            MatchError::SetMismatch { position, .. } => *position,
            MatchError::AnchorMismatch { position, .. } => *position,
            MatchError::NoAlternativeMatched { position, .. } => *position,
            MatchError::TooFewRepeats { position, .. } => *position,
            MatchError::LeftRecursion { position, .. } => *position,
            MatchError::UnresolvedRule { position, .. } => *position,
            MatchError::IncompleteMatch { position, .. } => *position,
        }
    }

    /// Error message prefixed with line and column, plus surrounding input
    pub fn format_with_context(&self, input: &str) -> String {
        let scanner = Scanner::new(input);
        let (line, col) = scanner.line_col(self.position());
        let context = scanner.slice(
            self.position().saturating_sub(20),
            (self.position() + 20).min(scanner.len()),
        );

        format!(
            "Parse error at line {}, column {}: {}\nContext: ...{}...",
            line, col, self, context
        )
    }
}

impl std::fmt::Display for MatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchError::UnexpectedEof { expected, .. } => {
                write!(f, "Unexpected end of input, expected {}", expected)
            }
            MatchError::LiteralMismatch {
                expected, actual, ..
            } => {
                write!(f, "Expected {:?} but found {:?}", expected, actual)
            }
            MatchError::SetMismatch { set, actual, .. } => {
                write!(f, "Expected {} but found {:?}", set, actual)
            }
            MatchError::AnchorMismatch { expected, .. } => {
                write!(f, "Expected {}", expected)
            }
            MatchError::NoAlternativeMatched { rule, attempts, .. } => {
                write!(
                    f,
                    "No alternative matched in '{}' ({} tried)",
                    rule, attempts
                )
            }
            MatchError::TooFewRepeats { min, found, .. } => {
                write!(f, "Expected at least {} repetitions, found {}", min, found)
            }
            MatchError::LeftRecursion { rule, .. } => {
                write!(f, "Left recursion in rule '{}'", rule)
            }
            MatchError::UnresolvedRule { rule, .. } => {
                write!(f, "Rule '{}' has no definition", rule)
            }
            MatchError::IncompleteMatch { remaining, .. } => {
                write!(f, "Unexpected input {:?}", remaining)
            }
        }
    }
}

impl std::error::Error for MatchError {}
