use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};

use arbor_protocol::IndexedWord;

use crate::relation::RelationRef;

/// A labeled governor/dependent pair over words.
#[derive(Debug, Clone)]
pub struct TypedDependency {
    pub relation: RelationRef,
    pub governor: IndexedWord,
    pub dependent: IndexedWord,
    /// Not part of the tree-shaped basic analysis.
    pub extra: bool,
}

impl TypedDependency {
    pub fn new(relation: RelationRef, governor: IndexedWord, dependent: IndexedWord) -> Self {
        Self {
            relation,
            governor,
            dependent,
            extra: false,
        }
    }

    pub fn with_extra(mut self, extra: bool) -> Self {
        self.extra = extra;
        self
    }
}

impl PartialEq for TypedDependency {
    fn eq(&self, other: &Self) -> bool {
        self.relation == other.relation
            && self.governor == other.governor
            && self.dependent == other.dependent
    }
}

impl Eq for TypedDependency {}

impl Hash for TypedDependency {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.relation.hash(state);
        self.governor.hash(state);
        self.dependent.hash(state);
    }
}

impl PartialOrd for TypedDependency {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TypedDependency {
    fn cmp(&self, other: &Self) -> Ordering {
        self.dependent
            .index
            .cmp(&other.dependent.index)
            .then(self.dependent.copy_count.cmp(&other.dependent.copy_count))
            .then(self.governor.index.cmp(&other.governor.index))
            .then(self.governor.copy_count.cmp(&other.governor.copy_count))
            .then_with(|| self.relation.to_string().cmp(&other.relation.to_string()))
    }
}

impl fmt::Display for TypedDependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({}, {})", self.relation, self.governor, self.dependent)
    }
}

/// Dependencies whose governor never appears as a dependent, one per governor.
pub fn get_roots(deps: &[TypedDependency]) -> Vec<&TypedDependency> {
    let dependents: HashSet<&IndexedWord> = deps.iter().map(|d| &d.dependent).collect();
    let mut seen = HashSet::new();
    let mut roots = Vec::new();
    for dep in deps {
        if !dependents.contains(&dep.governor) && !seen.contains(&dep.governor) {
            roots.push(dep);
        }
        seen.insert(&dep.governor);
    }
    roots
}

pub fn is_connected(deps: &[TypedDependency]) -> bool {
    get_roots(deps).len() <= 1
}

/// One `reln(gov-i, dep-j)` per line. With `extra_sep`, extra dependencies
/// come last after a `======` line.
pub fn dependencies_to_string(deps: &[TypedDependency], extra_sep: bool) -> String {
    let mut out = String::new();
    if extra_sep {
        let (extras, basic): (Vec<_>, Vec<_>) = deps.iter().partition(|d| d.extra);
        for dep in basic {
            out.push_str(&format!("{dep}\n"));
        }
        if !extras.is_empty() {
            out.push_str("======\n");
            for dep in extras {
                out.push_str(&format!("{dep}\n"));
            }
        }
    } else {
        for dep in deps {
            out.push_str(&format!("{dep}\n"));
        }
    }
    out
}
