use std::sync::Arc;

use arbor_protocol::{Mode, NodeId, Tree, TreebankPack};
use tracing::{debug, trace};

use crate::error::HeadError;
use crate::table::{RuleGroup, RuleTable};

/// Points where a language variant can bend the generic head rules.
pub trait HeadHooks: Send + Sync {
    /// A head index to use before any rule is consulted.
    fn explicit_head(&self, _tree: &Tree, _node: NodeId, _parent: Option<NodeId>) -> Option<usize> {
        None
    }

    /// Rewrites a head index found by a successful rule scan.
    fn post_selection_fix(
        &self,
        _tree: &Tree,
        _pack: &TreebankPack,
        _children: &[NodeId],
        index: usize,
    ) -> usize {
        index
    }
}

/// Rules only, no adjustments.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHooks;

impl HeadHooks for NoHooks {}

/// Moves a head that landed right after a coordinator onto the first real
/// conjunct to its left, skipping punctuation and further coordinators.
#[derive(Debug, Clone, Copy, Default)]
pub struct CoordinationFix;

impl CoordinationFix {
    fn skippable(tree: &Tree, pack: &TreebankPack, node: NodeId) -> bool {
        let category = pack.basic_category(tree.label(node));
        if category == "CC" || category == "CONJP" {
            return true;
        }
        tree.is_preterminal(node) && pack.is_punctuation_tag(category)
    }
}

impl HeadHooks for CoordinationFix {
    fn post_selection_fix(
        &self,
        tree: &Tree,
        pack: &TreebankPack,
        children: &[NodeId],
        index: usize,
    ) -> usize {
        if index < 2 {
            return index;
        }
        let prev = pack.basic_category(tree.label(children[index - 1]));
        if prev != "CC" && prev != "CONJP" {
            return index;
        }
        let mut candidate = index - 2;
        loop {
            if !Self::skippable(tree, pack, children[candidate]) {
                return candidate;
            }
            if candidate == 0 {
                return index;
            }
            candidate -= 1;
        }
    }
}

/// Picks the head child of a node by walking a `RuleTable`.
///
/// Cheap to clone; the table and hooks are shared.
#[derive(Clone)]
pub struct HeadSelector {
    table: Arc<RuleTable>,
    hooks: Arc<dyn HeadHooks>,
    pack: TreebankPack,
}

impl std::fmt::Debug for HeadSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeadSelector")
            .field("table", &self.table.name())
            .field("pack", &self.pack)
            .finish()
    }
}

impl HeadSelector {
    pub fn new(table: RuleTable, pack: TreebankPack) -> Self {
        Self::with_hooks(table, pack, NoHooks)
    }

    pub fn with_hooks(
        table: RuleTable,
        pack: TreebankPack,
        hooks: impl HeadHooks + 'static,
    ) -> Self {
        Self {
            table: Arc::new(table),
            hooks: Arc::new(hooks),
            pack,
        }
    }

    pub fn table(&self) -> &RuleTable {
        &self.table
    }

    pub fn pack(&self) -> &TreebankPack {
        &self.pack
    }

    /// Index of the head child of `node`.
    pub fn select_head(
        &self,
        tree: &Tree,
        node: NodeId,
        parent: Option<NodeId>,
    ) -> Result<usize, HeadError> {
        let kids = tree.children(node);
        if kids.is_empty() {
            return Err(HeadError::InvalidTree {
                label: tree.label(node).to_string(),
            });
        }
        if let Some(idx) = self.hooks.explicit_head(tree, node, parent) {
            if idx < kids.len() {
                return Ok(idx);
            }
        }
        if kids.len() == 1 {
            return Ok(0);
        }
        self.determine_non_trivial_head(tree, node, kids)
    }

    fn determine_non_trivial_head(
        &self,
        tree: &Tree,
        node: NodeId,
        kids: &[NodeId],
    ) -> Result<usize, HeadError> {
        let basic = self.pack.basic_category(tree.label(node));
        let mother = basic.strip_prefix('@').unwrap_or(basic);

        let groups = match self.table.get(mother) {
            Some(groups) if !groups.is_empty() => groups,
            _ => {
                if self.table.is_empty() {
                    return Err(HeadError::UninitializedRuleTable);
                }
                let rule = self.table.default_rule().ok_or_else(|| HeadError::NoHeadRule {
                    category: mother.to_string(),
                })?;
                debug!(category = mother, "no head rule, using default");
                return self.resolve(tree, kids, rule, mother);
            }
        };

        let last = groups.len() - 1;
        for (i, group) in groups.iter().enumerate() {
            if let Some(idx) = self.traverse_locate(tree, kids, group, i == last) {
                trace!(category = mother, group = i, head = idx, "head located");
                return Ok(idx);
            }
        }
        // traverse_locate with last_resort always answers
        Err(HeadError::NoHeadRule {
            category: mother.to_string(),
        })
    }

    fn resolve(
        &self,
        tree: &Tree,
        kids: &[NodeId],
        rule: &RuleGroup,
        mother: &str,
    ) -> Result<usize, HeadError> {
        self.traverse_locate(tree, kids, rule, true)
            .ok_or_else(|| HeadError::NoHeadRule {
                category: mother.to_string(),
            })
    }

    /// Scans `kids` with one rule group. With `last_resort` set a failed
    /// scan falls back to the default rule of the same direction and then
    /// to the literal end child, so the result is always `Some`.
    pub fn traverse_locate(
        &self,
        tree: &Tree,
        kids: &[NodeId],
        rule: &RuleGroup,
        last_resort: bool,
    ) -> Option<usize> {
        if kids.is_empty() {
            return None;
        }
        let category = |k: &NodeId| self.pack.basic_category(tree.label(*k));

        let found = match rule.mode {
            Mode::Left => rule
                .categories
                .iter()
                .find_map(|cat| kids.iter().position(|k| category(k) == cat)),
            Mode::Right => rule
                .categories
                .iter()
                .find_map(|cat| kids.iter().rposition(|k| category(k) == cat)),
            Mode::LeftDis => kids.iter().position(|k| rule.contains(category(k))),
            Mode::RightDis => kids.iter().rposition(|k| rule.contains(category(k))),
            Mode::LeftExcept => kids.iter().position(|k| !rule.contains(category(k))),
            Mode::RightExcept => kids.iter().rposition(|k| !rule.contains(category(k))),
        };

        match found {
            Some(idx) => Some(self.hooks.post_selection_fix(tree, &self.pack, kids, idx)),
            None if !last_resort => None,
            None => {
                let (fallback, literal) = if rule.mode.is_leftward() {
                    (self.table.default_left(), 0)
                } else {
                    (self.table.default_right(), kids.len() - 1)
                };
                self.traverse_locate(tree, kids, fallback, false)
                    .or(Some(literal))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// (X c0 c1 ...) with each child a preterminal over a dummy word.
    fn flat(mother: &str, cats: &[&str]) -> (Tree, NodeId) {
        let mut t = Tree::new(mother);
        for (i, cat) in cats.iter().enumerate() {
            let pre = t.add_child(t.root(), *cat);
            t.add_child(pre, format!("w{i}"));
        }
        t.index_words();
        let root = t.root();
        (t, root)
    }

    fn selector(table: RuleTable) -> HeadSelector {
        HeadSelector::new(table, TreebankPack::penn())
    }

    #[test]
    fn test_leaf_is_invalid() {
        let (t, root) = flat("NP", &["NN"]);
        let leaf = t.leaves()[0];
        let sel = selector(RuleTable::new("t", &[]).with("NP", vec![RuleGroup::left(&["NN"])]));
        assert_eq!(
            sel.select_head(&t, leaf, t.parent(leaf)),
            Err(HeadError::InvalidTree { label: "w0".to_string() })
        );
        assert_eq!(sel.select_head(&t, root, None), Ok(0));
    }

    #[test]
    fn test_unary_needs_no_rule() {
        let (t, root) = flat("FOO", &["BAR"]);
        let sel = selector(RuleTable::new("t", &[]).with("NP", vec![RuleGroup::left(&["NN"])]));
        assert_eq!(sel.select_head(&t, root, None), Ok(0));
    }

    #[test]
    fn test_missing_rule_and_empty_table() {
        let (t, root) = flat("FOO", &["A", "B"]);
        let sel = selector(RuleTable::new("t", &[]).with("NP", vec![RuleGroup::left(&["NN"])]));
        assert_eq!(
            sel.select_head(&t, root, None),
            Err(HeadError::NoHeadRule { category: "FOO".to_string() })
        );
        assert_eq!(
            selector(RuleTable::default()).select_head(&t, root, None),
            Err(HeadError::UninitializedRuleTable)
        );

        let with_default = selector(
            RuleTable::new("t", &[])
                .with("NP", vec![RuleGroup::left(&["NN"])])
                .with_default_rule(RuleGroup::right(&["A"])),
        );
        assert_eq!(with_default.select_head(&t, root, None), Ok(0));
    }

    #[test]
    fn test_left_is_category_priority() {
        let (t, root) = flat("X", &["B", "A", "B"]);
        let sel = selector(RuleTable::new("t", &[]).with("X", vec![RuleGroup::left(&["A", "B"])]));
        assert_eq!(sel.select_head(&t, root, None), Ok(1));
        let sel = selector(RuleTable::new("t", &[]).with("X", vec![RuleGroup::right(&["B", "A"])]));
        assert_eq!(sel.select_head(&t, root, None), Ok(2));
    }

    #[test]
    fn test_dis_is_position_priority() {
        let (t, root) = flat("X", &["B", "A", "C"]);
        let sel = selector(RuleTable::new("t", &[]).with("X", vec![RuleGroup::left_dis(&["A", "B"])]));
        assert_eq!(sel.select_head(&t, root, None), Ok(0));
        let sel = selector(RuleTable::new("t", &[]).with("X", vec![RuleGroup::right_dis(&["A", "B"])]));
        assert_eq!(sel.select_head(&t, root, None), Ok(1));
    }

    #[test]
    fn test_except_modes() {
        let (t, root) = flat("X", &[",", "A", "B", "."]);
        let sel = selector(
            RuleTable::new("t", &[]).with("X", vec![RuleGroup::left_except(&[",", "."])]),
        );
        assert_eq!(sel.select_head(&t, root, None), Ok(1));
        let sel = selector(
            RuleTable::new("t", &[]).with("X", vec![RuleGroup::right_except(&[",", "."])]),
        );
        assert_eq!(sel.select_head(&t, root, None), Ok(2));
    }

    #[test]
    fn test_fallback_skips_avoided_then_literal_end() {
        let (t, root) = flat("X", &["A", "B", "."]);
        let sel = selector(RuleTable::new("t", &["."]).with("X", vec![RuleGroup::right(&["Z"])]));
        // default right skips the period
        assert_eq!(sel.select_head(&t, root, None), Ok(1));

        let (t, root) = flat("X", &[".", ","]);
        let sel = selector(RuleTable::new("t", &[".", ","]).with("X", vec![RuleGroup::left(&["Z"])]));
        assert_eq!(sel.select_head(&t, root, None), Ok(0));
        let sel = selector(RuleTable::new("t", &[".", ","]).with("X", vec![RuleGroup::right(&["Z"])]));
        assert_eq!(sel.select_head(&t, root, None), Ok(1));
    }

    #[test]
    fn test_default_rule_without_avoid_set_takes_end_child() {
        let (t, root) = flat("X", &["A", "B", "C"]);
        let right = selector(RuleTable::new("t", &[]).with_default_rule(RuleGroup::right(&[])));
        assert_eq!(right.select_head(&t, root, None), Ok(2));
        let left = selector(RuleTable::new("t", &[]).with_default_rule(RuleGroup::left(&[])));
        assert_eq!(left.select_head(&t, root, None), Ok(0));
    }

    #[test]
    fn test_except_with_every_child_excluded() {
        let (t, root) = flat("X", &[",", "."]);
        let kids = t.children(root);
        let sel = selector(RuleTable::new("t", &[]).with("Y", vec![RuleGroup::left(&["Z"])]));
        for rule in [RuleGroup::left_except(&[",", "."]), RuleGroup::right_except(&[",", "."])] {
            assert_eq!(sel.traverse_locate(&t, kids, &rule, false), None);
        }
        let left = RuleGroup::left_except(&[",", "."]);
        assert_eq!(sel.traverse_locate(&t, kids, &left, true), Some(0));
        let right = RuleGroup::right_except(&[",", "."]);
        assert_eq!(sel.traverse_locate(&t, kids, &right, true), Some(1));
    }

    #[test]
    fn test_only_last_group_is_last_resort() {
        let (t, root) = flat("X", &["A", "B", "C"]);
        let sel = selector(RuleTable::new("t", &[]).with(
            "X",
            vec![RuleGroup::right(&["Z"]), RuleGroup::left(&["C"])],
        ));
        assert_eq!(sel.select_head(&t, root, None), Ok(2));
    }

    #[test]
    fn test_mother_annotations_are_stripped() {
        let (t, root) = flat("@NP-SBJ", &["DT", "NN"]);
        let sel = selector(RuleTable::new("t", &[]).with("NP", vec![RuleGroup::right_dis(&["NN"])]));
        assert_eq!(sel.select_head(&t, root, None), Ok(1));
    }

    #[test]
    fn test_coordination_fix_moves_head_left() {
        let (t, root) = flat("NP", &["NN", ",", "CC", "NN"]);
        let table = RuleTable::new("t", &[]).with("NP", vec![RuleGroup::right_dis(&["NN"])]);
        let plain = selector(table.clone());
        assert_eq!(plain.select_head(&t, root, None), Ok(3));
        let fixed = HeadSelector::with_hooks(table, TreebankPack::penn(), CoordinationFix);
        assert_eq!(fixed.select_head(&t, root, None), Ok(0));
    }

    #[test]
    fn test_coordination_fix_on_plain_coordination() {
        let (t, root) = flat("NP", &["NP", "CC", "NP"]);
        let table = RuleTable::new("t", &[]).with("NP", vec![RuleGroup::right_dis(&["NP"])]);
        assert_eq!(selector(table.clone()).select_head(&t, root, None), Ok(2));
        let fixed = HeadSelector::with_hooks(table, TreebankPack::penn(), CoordinationFix);
        assert_eq!(fixed.select_head(&t, root, None), Ok(0));
        let kids = t.children(root);
        assert_eq!(CoordinationFix.post_selection_fix(&t, fixed.pack(), kids, 2), 0);
    }

    #[test]
    fn test_coordination_fix_keeps_head_without_left_conjunct() {
        let (t, root) = flat("NP", &[",", "CC", "NN"]);
        let table = RuleTable::new("t", &[]).with("NP", vec![RuleGroup::right_dis(&["NN"])]);
        let fixed = HeadSelector::with_hooks(table, TreebankPack::penn(), CoordinationFix);
        assert_eq!(fixed.select_head(&t, root, None), Ok(2));
    }

    struct AlwaysLast;

    impl HeadHooks for AlwaysLast {
        fn explicit_head(
            &self,
            tree: &Tree,
            node: NodeId,
            _parent: Option<NodeId>,
        ) -> Option<usize> {
            tree.children(node).len().checked_sub(1)
        }
    }

    #[test]
    fn test_explicit_head_wins() {
        let (t, root) = flat("X", &["A", "B", "C"]);
        let table = RuleTable::new("t", &[]).with("X", vec![RuleGroup::left(&["A"])]);
        let sel = HeadSelector::with_hooks(table, TreebankPack::penn(), AlwaysLast);
        assert_eq!(sel.select_head(&t, root, None), Ok(2));
    }
}
