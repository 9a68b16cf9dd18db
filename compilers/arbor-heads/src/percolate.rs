use arbor_protocol::{NodeId, Tree};
use tracing::trace;

use crate::error::HeadError;
use crate::selector::HeadSelector;

/// Per-node head annotation of one tree, indexed by `NodeId`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadAnnotations {
    head_child: Vec<Option<NodeId>>,
    head_word: Vec<NodeId>,
}

impl HeadAnnotations {
    pub fn head_child(&self, node: NodeId) -> Option<NodeId> {
        self.head_child[node.index()]
    }

    /// The leaf that heads `node`; a leaf heads itself.
    pub fn head_word(&self, node: NodeId) -> NodeId {
        self.head_word[node.index()]
    }

    /// POS tag of the head word, when the head word sits under a preterminal.
    pub fn head_tag<'t>(&self, tree: &'t Tree, node: NodeId) -> Option<&'t str> {
        tree.tag(self.head_word(node))
    }

    /// Walks up while the parent has the same head word.
    pub fn highest_with_same_head(&self, tree: &Tree, node: NodeId) -> NodeId {
        let word = self.head_word(node);
        let mut current = node;
        while let Some(parent) = tree.parent(current) {
            if self.head_word(parent) != word {
                break;
            }
            current = parent;
        }
        current
    }
}

/// Annotates every node of a tree with its head child and head word.
///
/// Children are resolved before their parent, left to right, on an explicit
/// stack, so tree depth is not bounded by the call stack.
pub fn percolate(selector: &HeadSelector, tree: &Tree) -> Result<HeadAnnotations, HeadError> {
    let mut ann = HeadAnnotations {
        head_child: vec![None; tree.len()],
        head_word: (0..tree.len() as u32).map(NodeId).collect(),
    };
    let mut stack: Vec<(NodeId, Option<NodeId>, bool)> = vec![(tree.root(), None, false)];
    while let Some((node, parent, expanded)) = stack.pop() {
        let kids = tree.children(node);
        if kids.is_empty() {
            continue;
        }
        if !expanded {
            stack.push((node, parent, true));
            stack.extend(kids.iter().rev().map(|&kid| (kid, Some(node), false)));
            continue;
        }
        let idx = selector.select_head(tree, node, parent)?;
        let head = kids[idx];
        ann.head_child[node.index()] = Some(head);
        ann.head_word[node.index()] = ann.head_word[head.index()];
        trace!(
            label = tree.label(node),
            head = tree.label(ann.head_word[node.index()]),
            "percolated"
        );
    }
    Ok(ann)
}
