//! Language-specific post-processing points. Every hook is a no-op by
//! default; a language layer overrides only what it needs.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::typed::TypedDependency;

bitflags! {
    /// Which kinds of extra dependencies a projection asks for.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct ExtraFlags: u8 {
        const REF = 1 << 0;
        const COLLAPSED_REF = 1 << 1;
        const SUBJ = 1 << 2;
        const EXTRA = 1 << 3;
    }
}

/// Projection choice for the extras of a dependency list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Extras {
    /// Tree-shaped basic dependencies only.
    #[default]
    None,
    RefOnlyUncollapsed,
    RefOnlyCollapsed,
    SubjOnly,
    RefAndSubjUncollapsed,
    RefAndSubjCollapsed,
    /// Every extra the structure can find.
    Maximal,
}

impl Extras {
    pub fn flags(self) -> ExtraFlags {
        match self {
            Extras::None => ExtraFlags::empty(),
            Extras::RefOnlyUncollapsed => ExtraFlags::REF,
            Extras::RefOnlyCollapsed => ExtraFlags::COLLAPSED_REF,
            Extras::SubjOnly => ExtraFlags::SUBJ,
            Extras::RefAndSubjUncollapsed => ExtraFlags::REF | ExtraFlags::SUBJ,
            Extras::RefAndSubjCollapsed => ExtraFlags::COLLAPSED_REF | ExtraFlags::SUBJ,
            Extras::Maximal => ExtraFlags::all(),
        }
    }

    pub fn has_extras(self) -> bool {
        !self.flags().is_empty()
    }
}

/// Switches for the enhanced projections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EnhancementOptions {
    pub process_multi_word_prepositions: bool,
    pub enhance_prepositional_modifiers: bool,
    pub enhance_conjuncts: bool,
    pub propagate_dependents: bool,
    pub add_referent: bool,
    pub add_copy_nodes: bool,
    pub demote_quantificational_modifiers: bool,
    pub add_xsubj: bool,
}

impl EnhancementOptions {
    pub fn enhanced() -> Self {
        Self {
            enhance_prepositional_modifiers: true,
            enhance_conjuncts: true,
            propagate_dependents: true,
            add_referent: true,
            add_xsubj: true,
            ..Self::default()
        }
    }

    pub fn enhanced_plus_plus() -> Self {
        Self {
            process_multi_word_prepositions: true,
            add_copy_nodes: true,
            demote_quantificational_modifiers: true,
            ..Self::enhanced()
        }
    }
}

pub trait StructureHooks: Send + Sync {
    /// Derives extra dependencies from existing ones.
    fn get_extras(&self, _deps: &mut Vec<TypedDependency>) {}

    fn post_process_dependencies(&self, _deps: &mut Vec<TypedDependency>) {}

    fn collapse_dependencies(
        &self,
        _deps: &mut Vec<TypedDependency>,
        _cc_process: bool,
        _extras: ExtraFlags,
    ) {
    }

    fn collapse_dependencies_tree(&self, _deps: &mut Vec<TypedDependency>) {}

    fn add_enhancements(&self, _deps: &mut Vec<TypedDependency>, _options: &EnhancementOptions) {}

    fn correct_dependencies(&self, _deps: &mut Vec<TypedDependency>) {}

    /// Extra dependencies found in the tree must pass this to be kept.
    fn extra_tree_dep_filter(&self, _dep: &TypedDependency) -> bool {
        true
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoStructureHooks;

impl StructureHooks for NoStructureHooks {}
