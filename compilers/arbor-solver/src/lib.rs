//! Typed dependencies from head-annotated constituency trees.
//!
//! A [`RelationRegistry`] holds the relation hierarchy of one language.
//! [`DependencyGraphBuilder`] matches its relations against a tree, keeps a
//! tree-shaped `basic` graph next to a `complete` one, and turns both into
//! sorted [`TypedDependency`] lists inside a [`GrammaticalStructure`].

pub mod english;
pub mod error;
pub mod graph;
pub mod hooks;
pub mod matcher;
pub mod relation;
pub mod structure;
pub mod typed;

pub use error::SolverError;
pub use graph::DependencyMultiGraph;
pub use hooks::{EnhancementOptions, ExtraFlags, Extras, NoStructureHooks, StructureHooks};
pub use matcher::{MatchContext, NodeMatcher, TreePattern};
pub use relation::{
    GrammaticalRelation, RelationRef, RelationRegistry, RelationSetSpec, RelationSpec,
};
pub use structure::{read_conllx_structures, DependencyGraphBuilder, Filters, GrammaticalStructure};
pub use typed::{dependencies_to_string, get_roots, is_connected, TypedDependency};

#[cfg(test)]
mod tests {
    use super::*;
    use arbor_parser::read_trees;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_builder_is_shared_across_threads() {
        let builder = Arc::new(english::structure_builder().unwrap());
        let trees = read_trees(
            "(ROOT (S (NP (NNP Sam)) (VP (VBD died))))\n\
             (ROOT (S (NP (NNP Kim)) (VP (VBD left))))",
        )
        .unwrap();

        let handles: Vec<_> = trees
            .into_iter()
            .map(|tree| {
                let builder = Arc::clone(&builder);
                thread::spawn(move || {
                    let gs = builder.build(tree).unwrap();
                    dependencies_to_string(&gs.typed_dependencies(Extras::None), false)
                })
            })
            .collect();
        let outputs: Vec<String> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(outputs[0], "nsubj(died-2, Sam-1)\nroot(ROOT-0, died-2)\n");
        assert_eq!(outputs[1], "nsubj(left-2, Kim-1)\nroot(ROOT-0, left-2)\n");
    }

    #[test]
    fn test_conllx_output_reads_back() {
        let builder = english::structure_builder().unwrap();
        let tree = arbor_parser::read_tree("(ROOT (S (NP (DT The) (NN dog)) (VP (VBD barked))))").unwrap();
        let gs = builder.build(tree).unwrap();
        let deps = gs.typed_dependencies(Extras::None);
        let conll = gs.to_conllx(&deps);

        let registry = english::relations().unwrap();
        let back = read_conllx_structures(&conll, &registry).unwrap();
        assert_eq!(back.len(), 1);
        let reread = back[0].typed_dependencies(Extras::None);
        let mut sorted = reread.clone();
        sorted.sort();
        assert_eq!(sorted, deps);
    }

    #[test]
    fn test_hooks_see_each_projection() {
        #[derive(Default)]
        struct Renaming;

        impl StructureHooks for Renaming {
            fn collapse_dependencies(
                &self,
                deps: &mut Vec<TypedDependency>,
                cc_process: bool,
                _extras: ExtraFlags,
            ) {
                if cc_process {
                    deps.retain(|d| d.relation.short_name() != "det");
                }
            }

            fn correct_dependencies(&self, deps: &mut Vec<TypedDependency>) {
                deps.retain(|d| *d.relation != *relation::kill());
            }
        }

        let builder = english::structure_builder().unwrap().with_hooks(Renaming);
        let tree = arbor_parser::read_tree("(ROOT (S (NP (DT The) (NN dog)) (VP (VBD barked))))").unwrap();
        let gs = builder.build(tree).unwrap();
        assert_eq!(gs.typed_dependencies_collapsed(Extras::None).len(), 3);
        assert_eq!(gs.typed_dependencies_cc_processed(Extras::None).len(), 2);
        assert_eq!(gs.typed_dependencies_collapsed_tree().len(), 3);
        assert_eq!(gs.typed_dependencies_enhanced_plus_plus().len(), 3);
    }
}
