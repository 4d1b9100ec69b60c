//! Match tree produced by the matcher
//!
//! Only named nodes produce a [`Match`]; captures of unnamed nodes are spliced
//! into the nearest named ancestor, so a tree mirrors the names a grammar
//! author chose rather than every combinator that ran.

use crate::graph::NodeId;
use crate::scanner::Scanner;

/// One named capture: which node matched, where, and its named sub-captures
#[derive(Debug, Clone, PartialEq)]
pub struct Match<T = ()> {
    pub node: NodeId,
    pub name: String,
    /// Character index of the first matched character
    pub start: usize,
    /// Character index one past the last matched character
    pub end: usize,
    pub children: Vec<Match<T>>,
    /// Value attached by a visitor
    pub tag: Option<T>,
}

impl<T> Match<T> {
    pub fn new(node: NodeId, name: &str, start: usize, end: usize) -> Self {
        Match {
            node,
            name: name.to_string(),
            start,
            end,
            children: Vec::new(),
            tag: None,
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Matched text, sliced out of the scanned input
    pub fn text(&self, input: &Scanner) -> String {
        input.slice(self.start, self.end)
    }

    /// First direct child called `name`
    pub fn get(&self, name: &str) -> Option<&Match<T>> {
        self.children.iter().find(|child| child.name == name)
    }

    /// First descendant called `name`, depth-first
    pub fn find(&self, name: &str) -> Option<&Match<T>> {
        for child in &self.children {
            if child.name == name {
                return Some(child);
            }
            if let Some(found) = child.find(name) {
                return Some(found);
            }
        }
        None
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Match<T>> {
        self.children.iter().filter(move |child| child.name == name)
    }

    /// Indented dump of the tree, one capture per line
    pub fn to_tree_string(&self, input: &Scanner) -> String {
        let mut out = String::new();
        self.write_tree(input, 0, &mut out);
        out
    }

    fn write_tree(&self, input: &Scanner, depth: usize, out: &mut String) {
        out.push_str(&"  ".repeat(depth));
        out.push_str(&format!(
            "{} [{}..{}] {:?}\n",
            self.name,
            self.start,
            self.end,
            self.text(input)
        ));
        for child in &self.children {
            child.write_tree(input, depth + 1, out);
        }
    }
}
