//! Text formats around dependency conversion: bracketed trees, dependency
//! lines, CoNLL-X rows and the tree-pattern language.

pub mod conllx;
pub mod dependency;
pub mod error;
pub mod pattern;
pub mod token;
pub mod tree;

pub use conllx::{format_conllx_row, parse_conllx, ConllRow};
pub use dependency::{parse_dependency_line, DependencyLine};
pub use error::ParseError;
pub use pattern::{parse_pattern, Constraint, NodeDesc, Pattern, RelOp};
pub use token::{Span, TreeToken};
pub use tree::{read_tree, read_trees};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tree_and_dependency_formats_agree() {
        let tree = read_tree("(ROOT (S (NP (NNP Sam)) (VP (VBD died))))").unwrap();
        let sam = tree.leaf_at(1).unwrap();
        let died = tree.leaf_at(2).unwrap();

        let line = format!(
            "nsubj({}-{}, {}-{})",
            tree.label(died),
            tree.word_index(died).unwrap(),
            tree.label(sam),
            tree.word_index(sam).unwrap()
        );
        let dep = parse_dependency_line(&line).unwrap();
        assert_eq!(dep.governor.index, 2);
        assert_eq!(dep.dependent.word, "Sam");

        let row = format_conllx_row(1, "Sam", tree.tag(sam).unwrap(), 2, &dep.relation);
        let rows = parse_conllx(&row).unwrap();
        assert_eq!(rows[0][0].tag, "NNP");
        assert_eq!(rows[0][0].governor, Some(2));
    }
}
