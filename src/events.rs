//! Match events
//!
//! After a successful match, a [`MatchVisitor`] is walked over the finished
//! tree: `pre_match` fires on the way down (before any child), `matched` on
//! the way back up (after every child). Because events run on the final tree,
//! a visitor never sees an attempt that was later backtracked.

use crate::match_tree::Match;

pub trait MatchVisitor {
    type Tag;

    /// Called before the children of `m` are visited
    fn pre_match(&mut self, _m: &mut Match<Self::Tag>) {}

    /// Called after every child of `m` has been visited
    fn matched(&mut self, m: &mut Match<Self::Tag>);
}

/// Walk `root` depth-first, firing both events on every capture
pub fn fire<V: MatchVisitor>(visitor: &mut V, root: &mut Match<V::Tag>) {
    visitor.pre_match(root);
    for child in root.children.iter_mut() {
        fire(visitor, child);
    }
    visitor.matched(root);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Graph;

    struct Recorder {
        log: Vec<String>,
    }

    impl MatchVisitor for Recorder {
        type Tag = usize;

        fn pre_match(&mut self, m: &mut Match<usize>) {
            self.log.push(format!("enter {}", m.name));
        }

        fn matched(&mut self, m: &mut Match<usize>) {
            // tag = number of captures in this subtree
            let below: usize = m.children.iter().filter_map(|c| c.tag).sum();
            m.tag = Some(below + 1);
            self.log.push(format!("leave {}", m.name));
        }
    }

    #[test]
    fn test_pre_order_and_post_order() {
        let mut g = Graph::new();
        let id = g.literal("x");
        let mut root: Match<usize> = Match::new(id, "rule", 0, 3);
        let mut decl = Match::new(id, "declaration", 0, 1);
        decl.children.push(Match::new(id, "name", 0, 1));
        root.children.push(decl);
        root.children.push(Match::new(id, "expression", 2, 3));

        let mut rec = Recorder { log: Vec::new() };
        fire(&mut rec, &mut root);

        assert_eq!(
            rec.log,
            vec![
                "enter rule",
                "enter declaration",
                "enter name",
                "leave name",
                "leave declaration",
                "enter expression",
                "leave expression",
                "leave rule",
            ]
        );
        // children's tags were available to the parent
        assert_eq!(root.tag, Some(4));
    }
}
