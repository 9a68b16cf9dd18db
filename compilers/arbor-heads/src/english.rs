//! English head rules: Collins' table with semantic overrides, so that
//! content words head their phrases and auxiliaries and copulas do not.

use arbor_protocol::{NodeId, Tree, TreebankPack};

use crate::selector::{CoordinationFix, HeadHooks, HeadSelector};
use crate::table::{RuleGroup as G, RuleTable};

const AUXILIARIES: [&str; 38] = [
    "will", "wo", "shall", "sha", "may", "might", "should", "would", "can", "could", "ca", "must",
    "has", "have", "had", "having", "'ve", "ve", "'d", "d", "do", "does", "did", "done", "to",
    "be", "being", "been", "am", "are", "is", "was", "were", "'s", "'re", "'m", "get", "got",
];

const COPULAS: [&str; 11] = [
    "be", "being", "been", "am", "are", "is", "was", "were", "'s", "'re", "'m",
];

const VERB_TAGS: [&str; 10] = ["TO", "MD", "VB", "VBD", "VBP", "VBZ", "VBG", "VBN", "AUX", "AUXG"];

const UNAMBIGUOUS_AUX_TAGS: [&str; 4] = ["TO", "MD", "AUX", "AUXG"];

/// Semantic head table for Penn Treebank English.
pub fn semantic_rules() -> RuleTable {
    let pack = TreebankPack::penn();
    let avoid: Vec<&str> = pack.punctuation_tags().iter().map(|s| s.as_str()).collect();

    RuleTable::new("english-semantic", &avoid)
        .with("ADJP", vec![
            G::left(&["$"]),
            G::right_dis(&["NNS", "NN", "JJ", "QP", "VBN", "VBG"]),
            G::left(&["ADJP"]),
            G::right_dis(&["JJP", "JJR", "JJS", "DT", "RB", "RBR", "CD", "IN", "VBD"]),
            G::left(&["ADVP", "NP"]),
        ])
        .with("JJP", vec![G::left(&[
            "NNS", "NN", "$", "QP", "JJ", "VBN", "VBG", "ADJP", "JJP", "JJR", "NP", "JJS", "DT",
            "FW", "RBR", "RBS", "SBAR", "RB",
        ])])
        .with("ADVP", vec![
            G::left(&["ADVP", "IN"]),
            G::right_dis(&["RB", "RBR", "RBS", "JJ", "JJR", "JJS"]),
            G::right_dis(&["RP", "DT", "NN", "CD", "NP", "VBN", "NNP", "CC", "FW", "NNS", "ADJP", "NML"]),
        ])
        .with("CONJP", vec![G::right(&["CC", "VB", "JJ", "RB", "IN"])])
        .with("FRAG", vec![
            G::left(&["IN"]),
            G::right(&["RB"]),
            G::left(&["NP"]),
            G::left(&["ADJP", "ADVP", "FRAG", "S", "SBAR", "VP"]),
        ])
        .with("INTJ", vec![G::left(&[])])
        .with("LST", vec![G::right(&["LS", ":"])])
        .with("NAC", vec![G::left(&[
            "NN", "NNS", "NML", "NNP", "NNPS", "NP", "NAC", "EX", "$", "CD", "QP", "PRP", "VBG",
            "JJ", "JJS", "JJR", "ADJP", "JJP", "FW",
        ])])
        .with("NP", vec![
            G::right_dis(&["NN", "NNP", "NNPS", "NNS", "NX", "NML", "JJR", "WP"]),
            G::left(&["NP", "PRP"]),
            G::right_dis(&["$", "ADJP", "FW"]),
            G::right(&["CD"]),
            G::right_dis(&["JJ", "JJS", "QP", "DT", "WDT", "NML", "PRN", "RB", "RBR", "ADVP"]),
            G::right_dis(&["VP", "VB", "VBZ", "VBD", "VBP"]),
            G::left(&["POS"]),
        ])
        .alias("NX", "NP")
        .alias("NML", "NP")
        .with("PP", vec![
            G::right(&["IN", "TO", "VBG", "VBN", "RP", "FW", "JJ", "SYM"]),
            G::left(&["PP"]),
        ])
        .with("PRN", vec![G::left(&[
            "VP", "SQ", "S", "SINV", "SBAR", "NP", "ADJP", "PP", "ADVP", "INTJ", "WHNP", "NAC",
            "VBP", "JJ", "NN", "NNP",
        ])])
        .with("PRT", vec![G::right(&["RP"])])
        .with("QP", vec![G::right(&[
            "$", "NNS", "NN", "CD", "JJ", "PDT", "DT", "IN", "RB", "NCD", "QP", "JJR", "JJS",
        ])])
        .with("RRC", vec![G::left(&["RRC"]), G::right(&["VP", "ADJP", "JJP", "NP", "PP", "ADVP"])])
        .with("S", vec![
            G::left(&["VP", "S", "FRAG", "SBAR", "ADJP", "UCP", "TO"]),
            G::right(&["NP"]),
        ])
        .with("SBAR", vec![G::left(&[
            "S", "SQ", "SINV", "SBAR", "FRAG", "VP", "WHNP", "WHPP", "WHADVP", "WHADJP", "IN", "DT",
        ])])
        .with("SBARQ", vec![G::left(&["SQ", "S", "SINV", "SBARQ", "FRAG", "SBAR"])])
        .with("SINV", vec![G::left(&[
            "VBZ", "VBD", "VBP", "VB", "MD", "VBN", "VP", "S", "SINV", "ADJP", "JJP", "NP",
        ])])
        .with("SQ", vec![G::left(&[
            "VP", "SQ", "ADJP", "VB", "VBZ", "VBD", "VBP", "MD", "AUX", "AUXG",
        ])])
        .with("UCP", vec![G::left(&[])])
        .with("VP", vec![G::left(&[
            "TO", "VBD", "VBN", "MD", "VBZ", "VB", "VBG", "VBP", "VP", "AUX", "AUXG", "ADJP", "JJP",
            "NN", "NNS", "JJ", "NP", "NNP",
        ])])
        .with("WHADJP", vec![G::left(&["ADJP", "JJ", "JJR", "WP"]), G::right(&["RB"]), G::right(&[])])
        .with("WHADVP", vec![G::right_dis(&["WRB", "WHADVP", "RB", "JJ"])])
        .with("WHNP", vec![
            G::right_dis(&["NN", "NNP", "NNPS", "NNS", "NX", "NML", "JJR", "WP"]),
            G::left(&["WHNP", "NP"]),
            G::right_dis(&["$", "ADJP", "PRN", "FW"]),
            G::right(&["CD"]),
            G::right_dis(&["JJ", "JJS", "RB", "QP"]),
            G::left(&["WHPP", "WHADJP", "WP$", "WDT"]),
        ])
        .with("WHPP", vec![G::right(&["IN", "TO", "FW"])])
        .with("X", vec![G::right(&["S", "VP", "ADJP", "JJP", "NP", "SBAR", "PP", "X"])])
        .with("ROOT", vec![G::left(&["S", "SQ", "SINV", "SBARQ", "FRAG", "X"])])
        .alias("TOP", "ROOT")
        .with("EMBED", vec![G::right(&["INTJ"])])
        .with("META", vec![G::left(&[])])
        .with("POSSP", vec![G::right(&["POS"])])
        .with("ADV", vec![G::right(&[
            "RB", "RBR", "RBS", "FW", "ADVP", "TO", "CD", "JJR", "JJ", "IN", "NP", "NML", "JJS", "NN",
        ])])
}

/// Semantic adjustments on top of the coordination repair: in a verb
/// phrase with an auxiliary the complement VP is the head, and with a
/// copula the predicate is.
#[derive(Debug, Clone, Default)]
pub struct SemanticHooks {
    pack: TreebankPack,
    coordination: CoordinationFix,
}

impl SemanticHooks {
    pub fn new(pack: TreebankPack) -> Self {
        Self {
            pack,
            coordination: CoordinationFix,
        }
    }

    fn verb_word<'t>(&self, tree: &'t Tree, kid: NodeId) -> Option<(&'t str, &'t str)> {
        if !tree.is_preterminal(kid) {
            return None;
        }
        let tag = self.pack.basic_category(tree.label(kid));
        if !VERB_TAGS.contains(&tag) {
            return None;
        }
        Some((tag, tree.label(tree.children(kid)[0])))
    }

    fn has_auxiliary(
        &self,
        tree: &Tree,
        kids: &[NodeId],
        words: &[&str],
        allow_unambiguous: bool,
    ) -> bool {
        kids.iter().any(|&kid| match self.verb_word(tree, kid) {
            Some((tag, word)) => {
                (allow_unambiguous && UNAMBIGUOUS_AUX_TAGS.contains(&tag))
                    || words.contains(&word.to_lowercase().as_str())
            }
            None => false,
        })
    }

    /// `There is ...`: an NP over an existential `EX` next to the verb.
    fn is_existential(&self, tree: &Tree, node: NodeId, parent: Option<NodeId>) -> bool {
        let scope = match parent {
            Some(p) if self.pack.basic_category(tree.label(node)) == "VP" => p,
            _ => node,
        };
        tree.children(scope).iter().any(|&kid| {
            self.pack.basic_category(tree.label(kid)) == "NP"
                && tree
                    .children(kid)
                    .first()
                    .map_or(false, |&first| tree.label(first) == "EX")
        })
    }

    /// First child, in category priority, among those not marked as
    /// temporal or adverbial.
    fn locate(
        &self,
        tree: &Tree,
        kids: &[NodeId],
        categories: &[&str],
        rightward: bool,
    ) -> Option<usize> {
        let eligible = |k: &NodeId| {
            let label = tree.label(*k);
            !label.contains("-TMP") && !label.contains("-ADV")
        };
        categories.iter().find_map(|cat| {
            let hit = |k: &NodeId| eligible(k) && self.pack.basic_category(tree.label(*k)) == *cat;
            if rightward {
                kids.iter().rposition(hit)
            } else {
                kids.iter().position(hit)
            }
        })
    }
}

impl HeadHooks for SemanticHooks {
    fn explicit_head(&self, tree: &Tree, node: NodeId, parent: Option<NodeId>) -> Option<usize> {
        let mother = self.pack.basic_category(tree.label(node));
        if !matches!(mother, "VP" | "SQ" | "SINV") {
            return None;
        }
        let kids = tree.children(node);
        if kids.len() < 2 {
            return None;
        }

        if self.has_auxiliary(tree, kids, &AUXILIARIES, true) {
            let how: &[&str] = if self.has_auxiliary(tree, kids, &COPULAS, true) {
                &["VP", "ADJP"]
            } else {
                &["VP"]
            };
            if let Some(idx) = self.locate(tree, kids, how, false) {
                return Some(idx);
            }
        }

        if self.has_auxiliary(tree, kids, &COPULAS, false)
            && !self.is_existential(tree, node, parent)
        {
            let how = ["VP", "ADJP", "NP", "WHADJP", "WHNP"];
            return self.locate(tree, kids, &how, mother == "SQ");
        }
        None
    }

    fn post_selection_fix(
        &self,
        tree: &Tree,
        pack: &TreebankPack,
        children: &[NodeId],
        index: usize,
    ) -> usize {
        self.coordination.post_selection_fix(tree, pack, children, index)
    }
}

/// Selector for English with semantic heads.
pub fn semantic_selector() -> HeadSelector {
    let pack = TreebankPack::penn();
    HeadSelector::with_hooks(semantic_rules(), pack.clone(), SemanticHooks::new(pack))
}
