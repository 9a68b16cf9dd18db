//! Structural matching of tree patterns against a head-annotated tree.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use arbor_heads::HeadAnnotations;
use arbor_parser::{parse_pattern, NodeDesc, ParseError, Pattern, RelOp};
use arbor_protocol::{NodeId, Tree, TreebankPack};
use regex::Regex;

use crate::error::SolverError;

/// Everything a pattern may look at while matching.
#[derive(Clone, Copy)]
pub struct MatchContext<'a> {
    pub tree: &'a Tree,
    pub heads: &'a HeadAnnotations,
    pub pack: &'a TreebankPack,
}

/// Finds the nodes a relation points at from an anchor node.
pub trait NodeMatcher: fmt::Debug + Send + Sync {
    /// Distinct nodes bound to `name` over every match anchored at `anchor`,
    /// in discovery order.
    fn bound_nodes(&self, ctx: &MatchContext<'_>, anchor: NodeId, name: &str) -> Vec<NodeId>;

    /// Source text, for printing.
    fn text(&self) -> &str;
}

#[derive(Debug, Clone)]
enum LabelMatcher {
    Wildcard,
    Exact(Vec<String>),
    Basic(Vec<String>),
    Regex(Arc<Regex>),
}

impl LabelMatcher {
    fn matches(&self, ctx: &MatchContext<'_>, node: NodeId) -> bool {
        let label = ctx.tree.label(node);
        match self {
            LabelMatcher::Wildcard => true,
            LabelMatcher::Exact(labels) => labels.iter().any(|l| l == label),
            LabelMatcher::Basic(labels) => {
                let basic = ctx.pack.basic_category(label);
                labels.iter().any(|l| l == basic)
            }
            LabelMatcher::Regex(re) => re.is_match(label),
        }
    }
}

#[derive(Debug, Clone)]
struct CompiledNode {
    label: LabelMatcher,
    name: Option<String>,
    constraints: Vec<CompiledConstraint>,
}

#[derive(Debug, Clone)]
struct CompiledConstraint {
    negated: bool,
    op: RelOp,
    target: CompiledNode,
}

type Bindings<'p> = Vec<(&'p str, NodeId)>;

/// A parsed pattern with its regexes compiled.
#[derive(Debug, Clone)]
pub struct TreePattern {
    text: String,
    root: CompiledNode,
    names: Vec<String>,
}

/// Regex bodies compiled once per pattern; repeated bodies share one `Regex`.
type RegexCache<'p> = HashMap<&'p str, Arc<Regex>>;

impl TreePattern {
    pub fn compile(text: &str) -> Result<Self, SolverError> {
        let parsed = parse_pattern(text)?;
        let mut cache = RegexCache::new();
        for body in parsed.regexes() {
            if cache.contains_key(body) {
                continue;
            }
            let compiled = Regex::new(body).map_err(|e| ParseError::BadPattern {
                pattern: text.to_string(),
                reason: e.to_string(),
            })?;
            cache.insert(body, Arc::new(compiled));
        }
        let root = Self::compile_node(text, &parsed, &cache)?;
        Ok(Self {
            text: text.to_string(),
            root,
            names: parsed.names().into_iter().map(str::to_string).collect(),
        })
    }

    fn compile_node(
        text: &str,
        pattern: &Pattern,
        cache: &RegexCache<'_>,
    ) -> Result<CompiledNode, SolverError> {
        let label = match &pattern.node {
            NodeDesc::Any => LabelMatcher::Wildcard,
            NodeDesc::Labels(labels) => LabelMatcher::Exact(labels.clone()),
            NodeDesc::Basic(labels) => LabelMatcher::Basic(labels.clone()),
            NodeDesc::Regex(re) => {
                let compiled = cache.get(re.as_str()).ok_or_else(|| ParseError::BadPattern {
                    pattern: text.to_string(),
                    reason: format!("regex `{re}` was not compiled"),
                })?;
                LabelMatcher::Regex(Arc::clone(compiled))
            }
        };
        let constraints = pattern
            .constraints
            .iter()
            .map(|c| {
                Ok(CompiledConstraint {
                    negated: c.negated,
                    op: c.op,
                    target: Self::compile_node(text, &c.target, cache)?,
                })
            })
            .collect::<Result<Vec<_>, SolverError>>()?;
        Ok(CompiledNode {
            label,
            name: pattern.name.clone(),
            constraints,
        })
    }

    /// True if some node of the pattern is named `name`.
    pub fn binds(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// True if the pattern matches with its root at `anchor`.
    pub fn matches(&self, ctx: &MatchContext<'_>, anchor: NodeId) -> bool {
        !solutions(&self.root, ctx, anchor, Vec::new()).is_empty()
    }
}

impl NodeMatcher for TreePattern {
    fn bound_nodes(&self, ctx: &MatchContext<'_>, anchor: NodeId, name: &str) -> Vec<NodeId> {
        let mut out = Vec::new();
        for bindings in solutions(&self.root, ctx, anchor, Vec::new()) {
            for (key, node) in bindings {
                if key == name && !out.contains(&node) {
                    out.push(node);
                }
            }
        }
        out
    }

    fn text(&self) -> &str {
        &self.text
    }
}

/// Every consistent binding set with `pattern` rooted at `node`.
fn solutions<'p>(
    pattern: &'p CompiledNode,
    ctx: &MatchContext<'_>,
    node: NodeId,
    mut bindings: Bindings<'p>,
) -> Vec<Bindings<'p>> {
    if !pattern.label.matches(ctx, node) {
        return Vec::new();
    }
    if let Some(name) = &pattern.name {
        match bindings.iter().find(|(key, _)| *key == name.as_str()) {
            Some(&(_, bound)) if bound != node => return Vec::new(),
            Some(_) => {}
            None => bindings.push((name.as_str(), node)),
        }
    }

    let mut partial = vec![bindings];
    for constraint in &pattern.constraints {
        let candidates = related(ctx, node, constraint.op);
        let mut next = Vec::new();
        for b in partial {
            if constraint.negated {
                let blocked = candidates
                    .iter()
                    .any(|&c| !solutions(&constraint.target, ctx, c, b.clone()).is_empty());
                if !blocked {
                    next.push(b);
                }
            } else {
                for &c in &candidates {
                    next.extend(solutions(&constraint.target, ctx, c, b.clone()));
                }
            }
        }
        partial = next;
        if partial.is_empty() {
            break;
        }
    }
    partial
}

/// Nodes standing in relation `op` to `node`.
fn related(ctx: &MatchContext<'_>, node: NodeId, op: RelOp) -> Vec<NodeId> {
    let tree = ctx.tree;
    let siblings = || -> (Vec<NodeId>, usize) {
        match (tree.parent(node), tree.child_position(node)) {
            (Some(parent), Some(pos)) => (tree.children(parent).to_vec(), pos),
            _ => (Vec::new(), 0),
        }
    };

    match op {
        RelOp::Child => tree.children(node).to_vec(),
        RelOp::Parent => tree.parent(node).into_iter().collect(),
        RelOp::Dominates => {
            let mut out = Vec::new();
            let mut stack: Vec<NodeId> = tree.children(node).iter().rev().copied().collect();
            while let Some(n) = stack.pop() {
                out.push(n);
                stack.extend(tree.children(n).iter().rev().copied());
            }
            out
        }
        RelOp::DominatedBy => {
            let mut out = Vec::new();
            let mut current = tree.parent(node);
            while let Some(p) = current {
                out.push(p);
                current = tree.parent(p);
            }
            out
        }
        RelOp::FirstChild => tree.children(node).first().copied().into_iter().collect(),
        RelOp::LastChild => tree.children(node).last().copied().into_iter().collect(),
        RelOp::OnlyChild => match tree.children(node) {
            [only] => vec![*only],
            _ => Vec::new(),
        },
        RelOp::HeadChild => ctx.heads.head_child(node).into_iter().collect(),
        RelOp::HeadOf => tree
            .parent(node)
            .filter(|&p| ctx.heads.head_child(p) == Some(node))
            .into_iter()
            .collect(),
        RelOp::Sister => {
            let (sisters, pos) = siblings();
            sisters
                .into_iter()
                .enumerate()
                .filter(|&(i, _)| i != pos)
                .map(|(_, s)| s)
                .collect()
        }
        RelOp::NextSister => {
            let (sisters, pos) = siblings();
            sisters.get(pos + 1).copied().into_iter().collect()
        }
        RelOp::PreviousSister => {
            let (sisters, pos) = siblings();
            pos.checked_sub(1)
                .and_then(|prev| sisters.get(prev).copied())
                .into_iter()
                .collect()
        }
        RelOp::FollowingSister => {
            let (sisters, pos) = siblings();
            sisters.into_iter().skip(pos + 1).collect()
        }
        RelOp::PrecedingSister => {
            let (sisters, pos) = siblings();
            sisters.into_iter().take(pos).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbor_heads::{english::semantic_selector, percolate};
    use arbor_parser::read_tree;

    fn targets(pattern: &str, tree_text: &str, anchor_label: &str) -> Vec<String> {
        let tree = read_tree(tree_text).unwrap();
        let heads = percolate(&semantic_selector(), &tree).unwrap();
        let pack = TreebankPack::penn();
        let ctx = MatchContext { tree: &tree, heads: &heads, pack: &pack };
        let anchor = tree
            .preorder()
            .into_iter()
            .find(|&n| tree.label(n) == anchor_label)
            .unwrap();
        TreePattern::compile(pattern)
            .unwrap()
            .bound_nodes(&ctx, anchor, "target")
            .into_iter()
            .map(|n| tree.to_string_at(n))
            .collect()
    }

    trait SubtreeText {
        fn to_string_at(&self, node: NodeId) -> String;
    }

    impl SubtreeText for Tree {
        fn to_string_at(&self, node: NodeId) -> String {
            let leaves: Vec<&str> = self
                .leaves()
                .into_iter()
                .filter(|&l| self.dominates(node, l))
                .map(|l| self.label(l))
                .collect();
            format!("{}:{}", self.label(node), leaves.join(" "))
        }
    }

    const SENT: &str = "(ROOT (S (NP (DT the) (JJ old) (NN man)) (VP (VBD saw) (NP (NNP Kim))) (. .)))";

    #[test]
    fn test_subject_before_vp() {
        assert_eq!(targets("S < (@NP=target $++ VP)", SENT, "S"), vec!["NP:the old man"]);
        assert!(targets("S < (@NP=target $-- VP)", SENT, "S").is_empty());
    }

    #[test]
    fn test_compile_records_names_and_shares_regexes() {
        let pattern = TreePattern::compile("NP < (/^NN/=target $+ /^NN/=other)").unwrap();
        assert!(pattern.binds("target"));
        assert!(pattern.binds("other"));
        assert!(!pattern.binds("missing"));
        assert_eq!(targets("NP < (/^NN/ $- /^NN|JJ/=target)", SENT, "NP"), vec!["JJ:old"]);
    }

    #[test]
    fn test_sister_operators() {
        assert_eq!(targets("NP < (JJ $+ NN=target)", SENT, "NP"), vec!["NN:man"]);
        assert_eq!(targets("NP < (NN $- JJ=target)", SENT, "NP"), vec!["JJ:old"]);
        assert_eq!(targets("NP < (NN $-- __=target)", SENT, "NP"), vec!["DT:the", "JJ:old"]);
        assert_eq!(targets("NP < (DT $ __=target)", SENT, "NP"), vec!["JJ:old", "NN:man"]);
    }

    #[test]
    fn test_negation_and_regex() {
        assert_eq!(targets("NP < /^(?:JJ|DT)$/=target", SENT, "NP"), vec!["DT:the", "JJ:old"]);
        assert_eq!(targets("NP < (/^(?:JJ|DT)$/=target !$+ NN)", SENT, "NP"), vec!["DT:the"]);
    }

    #[test]
    fn test_dominance_and_heads() {
        assert_eq!(targets("S << NNP=target", SENT, "S"), vec!["NNP:Kim"]);
        assert_eq!(targets("VP > S=target", SENT, "VP"), vec!["S:the old man saw Kim ."]);
        assert_eq!(targets("S <# __=target", SENT, "S"), vec!["VP:saw Kim"]);
        assert_eq!(targets("NP >#  VP=target", SENT, "NP").len(), 0);
        assert_eq!(targets("VBD >> VP=target", SENT, "VBD"), vec!["VP:saw Kim"]);
        assert_eq!(targets("VBD >> (S=target <- __)", SENT, "VBD"), vec!["S:the old man saw Kim ."]);
    }

    #[test]
    fn test_leaf_words_match() {
        assert_eq!(targets("VP < (VBD=target < saw)", SENT, "VP"), vec!["VBD:saw"]);
        assert!(targets("VP < (VBD=target < went)", SENT, "VP").is_empty());
    }

    #[test]
    fn test_bad_regex_is_reported() {
        assert!(matches!(
            TreePattern::compile("NP < /(/=target"),
            Err(SolverError::Parse(ParseError::BadPattern { .. }))
        ));
    }
}
