//! Character scanner with position tracking and backtracking
//!
//! The matcher walks input one Unicode scalar at a time and rewinds freely
//! when an alternative fails, so input is held as a `Vec<char>` and every
//! position is a character index rather than a byte offset.

use std::fmt;

/// Scanning cursor over input text
#[derive(Clone)]
pub struct Scanner {
    chars: Vec<char>,
    position: usize,
}

impl Scanner {
    /// Create a scanner positioned at the start of `input`
    pub fn new(input: &str) -> Self {
        Scanner {
            chars: input.chars().collect(),
            position: 0,
        }
    }

    /// Character under the cursor
    pub fn current(&self) -> Option<char> {
        self.chars.get(self.position).copied()
    }

    /// Return the character under the cursor and step past it
    pub fn advance(&mut self) -> Option<char> {
        let ch = self.current();
        if ch.is_some() {
            self.position += 1;
        }
        ch
    }

    /// Consume `text` if the input continues with it, leaving the cursor
    /// untouched otherwise
    pub fn eat(&mut self, text: &str) -> bool {
        let mut offset = 0;
        for expected in text.chars() {
            if self.chars.get(self.position + offset) != Some(&expected) {
                return false;
            }
            offset += 1;
        }
        self.position += offset;
        true
    }

    /// Current position (character index)
    pub fn position(&self) -> usize {
        self.position
    }

    /// Move the cursor back (or forward) to `pos`
    pub fn set_position(&mut self, pos: usize) {
        self.position = pos.min(self.chars.len());
    }

    /// Remaining input, for diagnostics
    pub fn remaining(&self) -> String {
        self.chars[self.position..].iter().collect()
    }

    pub fn is_eof(&self) -> bool {
        self.position >= self.chars.len()
    }

    /// Total length in characters
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    /// Text between two character positions, clamped to the input
    pub fn slice(&self, start: usize, end: usize) -> String {
        let end = end.min(self.chars.len());
        let start = start.min(end);
        self.chars[start..end].iter().collect()
    }

    /// One-based line and column of a character position
    pub fn line_col(&self, pos: usize) -> (usize, usize) {
        let mut line = 1;
        let mut col = 1;

        for ch in self.chars.iter().take(pos) {
            if *ch == '\n' {
                line += 1;
                col = 1;
            } else {
                col += 1;
            }
        }

        (line, col)
    }
}

impl fmt::Debug for Scanner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Scanner(pos={}, remaining={:?})",
            self.position,
            self.remaining().chars().take(20).collect::<String>()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_to_end() {
        let mut scanner = Scanner::new("ab");
        assert_eq!(scanner.advance(), Some('a'));
        assert_eq!(scanner.advance(), Some('b'));
        assert_eq!(scanner.advance(), None);
        assert!(scanner.is_eof());
        assert_eq!(scanner.position(), 2);
    }

    #[test]
    fn test_eat_is_all_or_nothing() {
        let mut scanner = Scanner::new("::= x");
        assert!(!scanner.eat("::-"));
        assert_eq!(scanner.position(), 0);
        assert!(scanner.eat("::="));
        assert_eq!(scanner.position(), 3);
        assert!(scanner.eat(""));
        assert_eq!(scanner.position(), 3);
        assert!(!scanner.eat(" xy"));
    }

    #[test]
    fn test_backtracking() {
        let mut scanner = Scanner::new("test");
        scanner.advance();
        scanner.advance();
        assert_eq!(scanner.current(), Some('s'));

        scanner.set_position(0);
        assert_eq!(scanner.current(), Some('t'));

        scanner.set_position(100);
        assert!(scanner.is_eof());
    }

    #[test]
    fn test_unicode_positions() {
        let mut scanner = Scanner::new("<名前>");
        assert_eq!(scanner.len(), 4);
        assert!(scanner.eat("<名"));
        assert_eq!(scanner.current(), Some('前'));
        assert_eq!(scanner.slice(1, 3), "名前");
    }

    #[test]
    fn test_slice_clamps() {
        let scanner = Scanner::new("hello world");
        assert_eq!(scanner.slice(6, 11), "world");
        assert_eq!(scanner.slice(0, 100), "hello world");
        assert_eq!(scanner.slice(50, 100), "");
    }

    #[test]
    fn test_line_col() {
        let scanner = Scanner::new("<a> ::= 'x'\n<b> ::= 'y'");
        assert_eq!(scanner.line_col(0), (1, 1));
        assert_eq!(scanner.line_col(4), (1, 5));
        assert_eq!(scanner.line_col(12), (2, 1));
        assert_eq!(scanner.line_col(16), (2, 5));
    }

    #[test]
    fn test_empty() {
        let scanner = Scanner::new("");
        assert!(scanner.is_empty());
        assert!(scanner.is_eof());
        assert_eq!(scanner.current(), None);
    }
}
