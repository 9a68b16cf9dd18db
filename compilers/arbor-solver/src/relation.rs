//! Grammatical relations, their hierarchy and the per-language registry.

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, OnceLock};

use arbor_protocol::{Language, NodeId};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::SolverError;
use crate::matcher::{MatchContext, NodeMatcher, TreePattern};

pub type RelationRef = Arc<GrammaticalRelation>;

/// A typed dependency label. Relations form a tree through `parent`;
/// a relation with a source pattern can be found in phrase structure.
#[derive(Debug, Clone)]
pub struct GrammaticalRelation {
    language: Language,
    short_name: String,
    long_name: Option<String>,
    specific: Option<String>,
    parent: Option<RelationRef>,
    source: Option<Regex>,
    source_text: Option<String>,
    targets: Vec<TreePattern>,
}

impl GrammaticalRelation {
    pub fn new(
        language: Language,
        short_name: impl Into<String>,
        long_name: Option<&str>,
        parent: Option<RelationRef>,
    ) -> Self {
        Self {
            language,
            short_name: short_name.into(),
            long_name: long_name.map(str::to_string),
            specific: None,
            parent,
            source: None,
            source_text: None,
            targets: Vec::new(),
        }
    }

    /// Sets the source pattern; it must match a whole node label.
    pub fn with_source(mut self, pattern: &str) -> Result<Self, SolverError> {
        let anchored = format!("^(?:{pattern})$");
        let re = Regex::new(&anchored).map_err(|e| SolverError::BadSourcePattern {
            relation: self.short_name.clone(),
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;
        self.source = Some(re);
        self.source_text = Some(pattern.to_string());
        Ok(self)
    }

    pub fn with_targets(mut self, patterns: &[&str]) -> Result<Self, SolverError> {
        for p in patterns {
            let compiled = TreePattern::compile(p)?;
            if !compiled.binds("target") {
                return Err(SolverError::MissingTarget {
                    relation: self.short_name.clone(),
                    pattern: p.to_string(),
                });
            }
            self.targets.push(compiled);
        }
        Ok(self)
    }

    pub fn with_specific(mut self, specific: impl Into<String>) -> Self {
        self.specific = Some(specific.into());
        self
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn short_name(&self) -> &str {
        &self.short_name
    }

    pub fn long_name(&self) -> Option<&str> {
        self.long_name.as_deref()
    }

    pub fn specific(&self) -> Option<&str> {
        self.specific.as_deref()
    }

    pub fn parent(&self) -> Option<&RelationRef> {
        self.parent.as_ref()
    }

    pub fn source_text(&self) -> Option<&str> {
        self.source_text.as_deref()
    }

    pub fn targets(&self) -> &[TreePattern] {
        &self.targets
    }

    pub fn has_source(&self) -> bool {
        self.source.is_some()
    }

    /// Created on the fly from a name rather than registered up front.
    pub fn is_from_string(&self) -> bool {
        self.long_name.is_none()
    }

    /// True if `self` is `other` or one of its ancestors.
    pub fn is_ancestor(&self, other: &GrammaticalRelation) -> bool {
        let mut current = Some(other);
        while let Some(rel) = current {
            if rel == self {
                return true;
            }
            current = rel.parent.as_deref();
        }
        false
    }

    /// Whether the relation could start at `node`, judged on its raw label.
    pub fn is_applicable(&self, ctx: &MatchContext<'_>, node: NodeId) -> bool {
        match &self.source {
            Some(re) => re.is_match(ctx.tree.label(node)),
            None => false,
        }
    }

    /// Nodes bound to `target` by any pattern anchored at `node`.
    pub fn related_nodes(&self, ctx: &MatchContext<'_>, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        for pattern in &self.targets {
            for found in pattern.bound_nodes(ctx, node, "target") {
                if !out.contains(&found) {
                    out.push(found);
                }
            }
        }
        out
    }

    fn sort_key(&self) -> (&str, &str) {
        (&self.short_name, self.specific.as_deref().unwrap_or(""))
    }
}

impl PartialEq for GrammaticalRelation {
    fn eq(&self, other: &Self) -> bool {
        self.language.compatible_with(other.language)
            && self.short_name == other.short_name
            && self.specific == other.specific
    }
}

impl Eq for GrammaticalRelation {}

impl Hash for GrammaticalRelation {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.short_name.hash(state);
        self.specific.hash(state);
    }
}

impl PartialOrd for GrammaticalRelation {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for GrammaticalRelation {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

impl fmt::Display for GrammaticalRelation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.specific {
            Some(specific) => write!(
                f,
                "{}{}{}",
                self.short_name,
                self.language.specific_separator(),
                specific
            ),
            None => f.write_str(&self.short_name),
        }
    }
}

fn singleton(cell: &'static OnceLock<RelationRef>, short: &str, long: &str) -> RelationRef {
    cell.get_or_init(|| Arc::new(GrammaticalRelation::new(Language::Any, short, Some(long), None)))
        .clone()
}

/// The most general relation; every other relation descends from it.
pub fn dependent() -> RelationRef {
    static CELL: OnceLock<RelationRef> = OnceLock::new();
    singleton(&CELL, "dep", "dependent")
}

/// Links the artificial ROOT word to the sentence head.
pub fn root() -> RelationRef {
    static CELL: OnceLock<RelationRef> = OnceLock::new();
    singleton(&CELL, "root", "root")
}

pub fn governor() -> RelationRef {
    static CELL: OnceLock<RelationRef> = OnceLock::new();
    singleton(&CELL, "gov", "governor")
}

/// Marks dependencies that later passes should drop.
pub fn kill() -> RelationRef {
    static CELL: OnceLock<RelationRef> = OnceLock::new();
    singleton(&CELL, "KILL", "dummy relation kill")
}

/// One relation as written in a relation-set file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationSpec {
    pub short_name: String,
    #[serde(default)]
    pub long_name: Option<String>,
    #[serde(default = "default_parent")]
    pub parent: String,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub targets: Vec<String>,
    #[serde(default)]
    pub specific: Option<String>,
}

fn default_parent() -> String {
    "dep".to_string()
}

/// A language's relations, parents listed before children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationSetSpec {
    pub language: Language,
    pub relations: Vec<RelationSpec>,
}

/// All relations known for one language, looked up by printed name.
#[derive(Debug, Clone)]
pub struct RelationRegistry {
    language: Language,
    relations: Vec<RelationRef>,
    by_name: HashMap<String, RelationRef>,
}

impl RelationRegistry {
    pub fn new(language: Language) -> Self {
        let mut registry = Self {
            language,
            relations: Vec::new(),
            by_name: HashMap::new(),
        };
        for rel in [dependent(), root(), governor(), kill()] {
            registry.relations.push(rel.clone());
            registry.by_name.insert(rel.to_string(), rel);
        }
        registry
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn register(&mut self, relation: GrammaticalRelation) -> Result<RelationRef, SolverError> {
        let name = relation.to_string();
        if self.by_name.contains_key(&name) {
            return Err(SolverError::DuplicateRelation(name));
        }
        let rel = Arc::new(relation);
        self.relations.push(rel.clone());
        self.by_name.insert(name, rel.clone());
        Ok(rel)
    }

    pub fn get(&self, name: &str) -> Option<RelationRef> {
        self.by_name.get(name).cloned()
    }

    /// Resolves a printed name; an unregistered `short_specific` name
    /// becomes a specific copy of `short`, a child of it without patterns.
    pub fn lookup(&self, name: &str) -> Option<RelationRef> {
        if let Some(rel) = self.get(name) {
            return Some(rel);
        }
        let (short, specific) = name.split_once(self.language.specific_separator())?;
        let base = self.get(short)?;
        let copy = GrammaticalRelation::new(
            self.language,
            short,
            base.long_name(),
            Some(base.clone()),
        )
        .with_specific(specific);
        Some(Arc::new(copy))
    }

    /// Like [`lookup`](Self::lookup), but a name nothing matches becomes a
    /// placeholder under `dep`, split into short name and specific the same
    /// way.
    pub fn value_of(&self, name: &str) -> RelationRef {
        self.lookup(name).unwrap_or_else(|| {
            let split = name
                .split_once(self.language.specific_separator())
                .filter(|(short, specific)| !short.is_empty() && !specific.is_empty());
            let placeholder = match split {
                Some((short, specific)) => {
                    GrammaticalRelation::new(self.language, short, None, Some(dependent()))
                        .with_specific(specific)
                }
                None => GrammaticalRelation::new(self.language, name, None, Some(dependent())),
            };
            Arc::new(placeholder)
        })
    }

    /// Every registered relation, including the built-in ones.
    pub fn all(&self) -> &[RelationRef] {
        &self.relations
    }

    /// Relations that can be found in phrase structure, in registration order.
    pub fn relations(&self) -> impl Iterator<Item = &RelationRef> {
        self.relations.iter().filter(|r| r.has_source())
    }

    pub fn from_spec(spec: &RelationSetSpec) -> Result<Self, SolverError> {
        let mut registry = Self::new(spec.language);
        for rel in &spec.relations {
            let parent = registry.get(&rel.parent).ok_or_else(|| SolverError::UnknownParent {
                relation: rel.short_name.clone(),
                parent: rel.parent.clone(),
            })?;
            let mut built = GrammaticalRelation::new(
                spec.language,
                rel.short_name.clone(),
                Some(rel.long_name.as_deref().unwrap_or(&rel.short_name)),
                Some(parent),
            );
            if let Some(specific) = &rel.specific {
                built = built.with_specific(specific.clone());
            }
            if let Some(source) = &rel.source {
                built = built.with_source(source)?;
            }
            let targets: Vec<&str> = rel.targets.iter().map(String::as_str).collect();
            built = built.with_targets(&targets)?;
            registry.register(built)?;
        }
        debug!(
            language = %spec.language,
            relations = registry.relations.len(),
            "built relation registry"
        );
        Ok(registry)
    }

    /// The relation hierarchy, two spaces of indent per level.
    pub fn to_pretty_string(&self) -> String {
        let mut out = String::new();
        self.write_pretty(&dependent(), 0, &mut out);
        for rel in &self.relations {
            if rel.parent().is_none() && **rel != *dependent() {
                self.write_pretty(rel, 0, &mut out);
            }
        }
        out
    }

    fn write_pretty(&self, rel: &RelationRef, depth: usize, out: &mut String) {
        out.push_str(&"  ".repeat(depth));
        out.push_str(&rel.to_string());
        if let Some(long) = rel.long_name() {
            out.push_str(&format!(" ({long})"));
        }
        let patterns: Vec<&str> = rel.targets().iter().map(|t| t.text()).collect();
        if !patterns.is_empty() {
            out.push_str(": ");
            out.push_str(&patterns.join(", "));
        }
        out.push('\n');
        for child in &self.relations {
            if child.parent().is_some_and(|p| Arc::ptr_eq(p, rel)) {
                self.write_pretty(child, depth + 1, out);
            }
        }
    }
}
