use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;
use core::fmt;

use crate::ids::NodeId;

#[cfg(feature = "serde")]
use serde::{Deserialize as SerdeDeserialize, Serialize as SerdeSerialize};

/// One node of a constituency tree. Leaves carry the word as their label.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(SerdeDeserialize, SerdeSerialize))]
pub struct TreeNode {
    pub id: NodeId,
    pub label: String,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    /// 1-based position of the word in the sentence (leaves only).
    pub word_index: Option<u32>,
}

/// Arena-backed ordered tree. Node ids are positions in the arena and are
/// never reused, so graphs over a tree can key vertices by `NodeId`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(SerdeDeserialize, SerdeSerialize))]
pub struct Tree {
    nodes: Vec<TreeNode>,
    root: NodeId,
}

impl Tree {
    pub fn new(root_label: impl Into<String>) -> Self {
        let root = NodeId(0);
        Self {
            nodes: vec![TreeNode {
                id: root,
                label: root_label.into(),
                parent: None,
                children: Vec::new(),
                word_index: None,
            }],
            root,
        }
    }

    /// Appends a new rightmost child under `parent`.
    pub fn add_child(&mut self, parent: NodeId, label: impl Into<String>) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(TreeNode {
            id,
            label: label.into(),
            parent: Some(parent),
            children: Vec::new(),
            word_index: None,
        });
        self.nodes[parent.index()].children.push(id);
        id
    }

    /// Numbers the leaves 1..=n in left-to-right order and returns n.
    pub fn index_words(&mut self) -> usize {
        let leaves = self.leaves();
        for (i, leaf) in leaves.iter().enumerate() {
            self.nodes[leaf.index()].word_index = Some(i as u32 + 1);
        }
        leaves.len()
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> &TreeNode {
        &self.nodes[id.index()]
    }

    pub fn get(&self, id: NodeId) -> Option<&TreeNode> {
        self.nodes.get(id.index())
    }

    pub fn nodes(&self) -> &[TreeNode] {
        &self.nodes
    }

    pub fn label(&self, id: NodeId) -> &str {
        &self.nodes[id.index()].label
    }

    pub fn set_label(&mut self, id: NodeId, label: impl Into<String>) {
        self.nodes[id.index()].label = label.into();
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.index()].children
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.index()].parent
    }

    pub fn word_index(&self, id: NodeId) -> Option<u32> {
        self.nodes[id.index()].word_index
    }

    pub fn is_leaf(&self, id: NodeId) -> bool {
        self.children(id).is_empty()
    }

    /// A node with exactly one child, which is a leaf (a POS tag over a word).
    pub fn is_preterminal(&self, id: NodeId) -> bool {
        match self.children(id) {
            [only] => self.is_leaf(*only),
            _ => false,
        }
    }

    /// Neither a leaf nor a preterminal.
    pub fn is_phrasal(&self, id: NodeId) -> bool {
        !(self.is_leaf(id) || self.is_preterminal(id))
    }

    /// Position of `id` among its parent's children.
    pub fn child_position(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|&c| c == id)
    }

    /// All node ids in pre-order (parents before children, left to right).
    pub fn preorder(&self) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }
        out
    }

    /// Leaves in sentence order.
    pub fn leaves(&self) -> Vec<NodeId> {
        self.preorder()
            .into_iter()
            .filter(|&id| self.is_leaf(id))
            .collect()
    }

    /// Leaf with the given 1-based word index.
    pub fn leaf_at(&self, word_index: u32) -> Option<NodeId> {
        self.nodes
            .iter()
            .find(|n| n.word_index == Some(word_index))
            .map(|n| n.id)
    }

    /// POS tag of a leaf: the label of its preterminal parent.
    pub fn tag(&self, leaf: NodeId) -> Option<&str> {
        let parent = self.parent(leaf)?;
        if self.is_preterminal(parent) {
            Some(self.label(parent))
        } else {
            None
        }
    }

    /// True iff `ancestor` is `node` or lies on `node`'s parent chain.
    pub fn dominates(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    fn fmt_node(&self, id: NodeId, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let node = self.node(id);
        if node.children.is_empty() {
            return f.write_str(&node.label);
        }
        write!(f, "({}", node.label)?;
        for &child in &node.children {
            f.write_str(" ")?;
            self.fmt_node(child, f)?;
        }
        f.write_str(")")
    }
}

impl fmt::Display for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_node(self.root, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    fn sam_died() -> Tree {
        let mut t = Tree::new("ROOT");
        let s = t.add_child(t.root(), "S");
        let np = t.add_child(s, "NP");
        let nnp = t.add_child(np, "NNP");
        t.add_child(nnp, "Sam");
        let vp = t.add_child(s, "VP");
        let vbd = t.add_child(vp, "VBD");
        t.add_child(vbd, "died");
        t.index_words();
        t
    }

    #[test]
    fn test_word_indexing_follows_leaf_order() {
        let t = sam_died();
        let leaves = t.leaves();
        assert_eq!(leaves.len(), 2);
        assert_eq!(t.label(leaves[0]), "Sam");
        assert_eq!(t.word_index(leaves[0]), Some(1));
        assert_eq!(t.word_index(leaves[1]), Some(2));
        assert_eq!(t.leaf_at(2), Some(leaves[1]));
    }

    #[test]
    fn test_node_kinds() {
        let t = sam_died();
        let s = t.children(t.root())[0];
        let np = t.children(s)[0];
        let nnp = t.children(np)[0];
        assert!(t.is_phrasal(s));
        // unary over a preterminal is still phrasal
        assert!(t.is_phrasal(np));
        assert!(t.is_preterminal(nnp));
        assert_eq!(t.tag(t.children(nnp)[0]), Some("NNP"));
        assert!(t.dominates(s, nnp));
        assert!(!t.dominates(nnp, s));
    }

    #[test]
    fn test_display_is_bracketed() {
        let t = sam_died();
        assert_eq!(t.to_string(), "(ROOT (S (NP (NNP Sam)) (VP (VBD died))))");
    }
}
