//! Position lookups and upward walks.

use super::{NodeId, SyntaxKind, SyntaxTree};

/// Iterator from a node up to the root, starting with the node itself.
pub struct Ancestors<'a> {
    tree: &'a SyntaxTree,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.tree.parent(current);
        Some(current)
    }
}

impl SyntaxTree {
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: Some(id),
        }
    }

    /// The leaf whose span contains `offset` (`start <= offset < end`).
    pub fn token_at(&self, offset: usize) -> Option<NodeId> {
        let tokens = self.tokens();
        let idx = tokens.partition_point(|&t| self.span(t).end <= offset);
        tokens
            .get(idx)
            .copied()
            .filter(|&t| self.span(t).contains(offset))
    }

    /// The leaf under a cursor at `offset`.
    ///
    /// A cursor sits between characters, so it touches the token on its
    /// right and the token ending exactly at it. Identifiers and literals win
    /// over punctuation (`foo|(` resolves to `foo`); otherwise the token on
    /// the right wins.
    pub fn token_touching(&self, offset: usize) -> Option<NodeId> {
        let right = self.token_at(offset);
        let left = self.token_ending_at(offset);
        match (left, right) {
            (Some(l), Some(r)) => {
                if is_word(self.kind(r)) || !is_word(self.kind(l)) {
                    Some(r)
                } else {
                    Some(l)
                }
            }
            (l, r) => r.or(l),
        }
    }

    /// The innermost node whose span contains `offset`, falling back to the
    /// token touching it (a cursor at the very end of a node or of the file).
    pub fn covering_node(&self, offset: usize) -> Option<NodeId> {
        if let Some(token) = self.token_at(offset) {
            return Some(token);
        }
        if let Some(token) = self.token_ending_at(offset) {
            return Some(token);
        }
        // Whitespace inside a node: descend from the root.
        let mut current = self.root();
        if !self.span(current).touches(offset) {
            return None;
        }
        loop {
            let next = self
                .children(current)
                .iter()
                .copied()
                .find(|&c| self.span(c).contains(offset));
            match next {
                Some(child) => current = child,
                None => return Some(current),
            }
        }
    }

    /// Nearest node at or above `start` that satisfies `predicate`.
    pub fn find_ancestor(
        &self,
        start: NodeId,
        mut predicate: impl FnMut(NodeId) -> bool,
    ) -> Option<NodeId> {
        self.ancestors(start).find(|&n| predicate(n))
    }

    /// Innermost node covering `offset`, then upward to the nearest match.
    pub fn find_at(
        &self,
        offset: usize,
        predicate: impl FnMut(NodeId) -> bool,
    ) -> Option<NodeId> {
        let start = self.covering_node(offset)?;
        self.find_ancestor(start, predicate)
    }

    fn token_ending_at(&self, offset: usize) -> Option<NodeId> {
        let tokens = self.tokens();
        let idx = tokens.partition_point(|&t| self.span(t).end < offset);
        tokens
            .get(idx)
            .copied()
            .filter(|&t| self.span(t).end == offset && !self.span(t).is_empty())
    }
}

fn is_word(kind: SyntaxKind) -> bool {
    matches!(
        kind,
        SyntaxKind::Identifier | SyntaxKind::Literal | SyntaxKind::Keyword
    )
}

#[cfg(test)]
mod tests {
    use crate::syntax::tests::call_tree;
    use crate::syntax::{Role, SyntaxKind};

    #[test]
    fn token_at_finds_containing_leaf() {
        let tree = call_tree();
        let t = tree.token_at(2).unwrap();
        assert_eq!(tree.kind(t), SyntaxKind::Literal);
        assert!(tree.token_at(4).is_none(), "whitespace has no token");
    }

    #[test]
    fn token_touching_prefers_words() {
        let tree = call_tree();
        // Between `f` and `(`.
        let t = tree.token_touching(1).unwrap();
        assert_eq!(tree.kind(t), SyntaxKind::Identifier);
        // Right after `x`, before `)`.
        let t = tree.token_touching(6).unwrap();
        assert_eq!(tree.span(t).start, 5);
    }

    #[test]
    fn covering_node_falls_back_to_token_on_the_left() {
        let tree = call_tree();
        // Offset 4 is the space after the comma.
        let node = tree.covering_node(4).unwrap();
        assert_eq!(tree.kind(node), SyntaxKind::Separator);
        let parent = tree.parent(node).unwrap();
        assert_eq!(tree.kind(parent), SyntaxKind::ArgumentList);
    }

    #[test]
    fn find_at_walks_up_to_predicate() {
        let tree = call_tree();
        let call = tree
            .find_at(5, |n| tree.kind(n).is_argument_bearing())
            .unwrap();
        let args = tree.child_with_role(call, Role::Arguments).unwrap();
        assert!(tree.span(args).contains(5));
    }

    #[test]
    fn ancestors_start_at_self_and_end_at_root() {
        let tree = call_tree();
        let leaf = tree.token_at(5).unwrap();
        let chain: Vec<_> = tree.ancestors(leaf).collect();
        assert_eq!(chain.first(), Some(&leaf));
        assert_eq!(chain.last(), Some(&tree.root()));
    }
}
