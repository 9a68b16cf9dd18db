//! From a head-annotated tree to typed dependencies.

use std::fmt;
use std::sync::Arc;

use arbor_heads::{percolate, HeadAnnotations, HeadSelector, RuleGroup, RuleTable};
use arbor_parser::{format_conllx_row, parse_conllx, parse_dependency_line, ParseError};
use arbor_protocol::{IndexedWord, NodeId, SentenceId, Tree, TreebankPack};
use tracing::{debug, trace, warn};

use crate::error::SolverError;
use crate::graph::DependencyMultiGraph;
use crate::hooks::{EnhancementOptions, Extras, NoStructureHooks, StructureHooks};
use crate::matcher::MatchContext;
use crate::relation::{self, RelationRef, RelationRegistry};
use crate::typed::TypedDependency;

type Predicate = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Word and tag predicates; a dependent whose head word fails either is
/// left out of the graphs.
#[derive(Clone)]
pub struct Filters {
    word: Predicate,
    tag: Predicate,
}

impl Filters {
    pub fn new(
        word: impl Fn(&str) -> bool + Send + Sync + 'static,
        tag: impl Fn(&str) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            word: Arc::new(word),
            tag: Arc::new(tag),
        }
    }

    /// Drops punctuation words and punctuation tags.
    pub fn punctuation(pack: &TreebankPack) -> Self {
        let words = pack.clone();
        let tags = pack.clone();
        Self::new(
            move |w| words.punctuation_word_accept(w),
            move |t| tags.punctuation_tag_accept(t),
        )
    }

    pub fn accept_all() -> Self {
        Self::new(|_| true, |_| true)
    }

    pub fn accepts(&self, word: &str, tag: Option<&str>) -> bool {
        (self.word)(word) && tag.map_or(true, |t| (self.tag)(t))
    }
}

impl fmt::Debug for Filters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Filters")
    }
}

/// Builds a [`GrammaticalStructure`] per tree. Everything it holds is
/// immutable and shared, so one builder can serve many threads.
#[derive(Clone)]
pub struct DependencyGraphBuilder {
    selector: HeadSelector,
    registry: Arc<RelationRegistry>,
    hooks: Arc<dyn StructureHooks>,
    filters: Filters,
}

impl fmt::Debug for DependencyGraphBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DependencyGraphBuilder")
            .field("selector", &self.selector)
            .field("language", &self.registry.language())
            .finish_non_exhaustive()
    }
}

impl DependencyGraphBuilder {
    pub fn new(selector: HeadSelector, registry: RelationRegistry) -> Self {
        let filters = Filters::punctuation(selector.pack());
        Self {
            selector,
            registry: Arc::new(registry),
            hooks: Arc::new(NoStructureHooks),
            filters,
        }
    }

    pub fn with_hooks(mut self, hooks: impl StructureHooks + 'static) -> Self {
        self.hooks = Arc::new(hooks);
        self
    }

    pub fn with_filters(mut self, filters: Filters) -> Self {
        self.filters = filters;
        self
    }

    /// Keeps punctuation in the output.
    pub fn keep_punctuation(self) -> Self {
        self.with_filters(Filters::accept_all())
    }

    pub fn selector(&self) -> &HeadSelector {
        &self.selector
    }

    pub fn registry(&self) -> &RelationRegistry {
        &self.registry
    }

    pub fn build(&self, tree: Tree) -> Result<GrammaticalStructure, SolverError> {
        self.build_inner(None, tree)
    }

    pub fn build_with_id(
        &self,
        id: SentenceId,
        tree: Tree,
    ) -> Result<GrammaticalStructure, SolverError> {
        self.build_inner(Some(id), tree)
    }

    fn build_inner(
        &self,
        sentence_id: Option<SentenceId>,
        tree: Tree,
    ) -> Result<GrammaticalStructure, SolverError> {
        let heads = percolate(&self.selector, &tree)?;
        let mut analysis = Analysis {
            ctx: MatchContext {
                tree: &tree,
                heads: &heads,
                pack: self.selector.pack(),
            },
            registry: &self.registry,
            filters: &self.filters,
            basic: DependencyMultiGraph::new(),
            complete: DependencyMultiGraph::new(),
        };
        analysis.analyze();
        analysis.attach_stranded();

        let typed = analysis.get_deps(self.hooks.as_ref(), false);
        let all = analysis.get_deps(self.hooks.as_ref(), true);
        debug!(
            words = tree.leaves().len(),
            basic = typed.len(),
            all = all.len(),
            "built grammatical structure"
        );

        let Analysis { basic, complete, .. } = analysis;
        Ok(GrammaticalStructure {
            sentence_id,
            tree,
            heads,
            basic,
            complete,
            typed_dependencies: typed,
            all_typed_dependencies: all,
            hooks: self.hooks.clone(),
        })
    }
}

struct Analysis<'a> {
    ctx: MatchContext<'a>,
    registry: &'a RelationRegistry,
    filters: &'a Filters,
    basic: DependencyMultiGraph,
    complete: DependencyMultiGraph,
}

impl Analysis<'_> {
    fn highest(&self, node: NodeId) -> NodeId {
        self.ctx.heads.highest_with_same_head(self.ctx.tree, node)
    }

    fn head_accepted(&self, node: NodeId) -> bool {
        let tree = self.ctx.tree;
        let word = self.ctx.heads.head_word(node);
        self.filters.accepts(tree.label(word), tree.tag(word))
    }

    fn word(&self, node: NodeId) -> IndexedWord {
        word_of(self.ctx.tree, self.ctx.heads, node)
    }

    /// Matches every relation at every phrasal node, in pre-order.
    fn analyze(&mut self) {
        let tree = self.ctx.tree;
        for t in tree.preorder() {
            if tree.is_phrasal(t) {
                self.analyze_node(t);
            }
        }
    }

    fn analyze_node(&mut self, t: NodeId) {
        let mut governor_high = None;
        let registry = self.registry;
        for rel in registry.relations() {
            if !rel.is_applicable(&self.ctx, t) {
                continue;
            }
            for u in rel.related_nodes(&self.ctx, t) {
                let t_high = *governor_high.get_or_insert_with(|| self.highest(t));
                let u_high = self.highest(u);
                if u_high == t_high || !self.head_accepted(u_high) {
                    continue;
                }
                trace!(relation = %rel, governor = %t_high, dependent = %u_high, "relation match");
                self.complete.add(t_high, u_high, rel.clone());

                let other_parent = self.basic.parents(u_high).into_iter().any(|p| p != t_high);
                if !other_parent && !self.basic.has_path(u_high, t_high) {
                    self.basic.add(t_high, u_high, rel.clone());
                }
            }
        }
    }

    /// Gives a governor to every non-head constituent the relations missed.
    fn attach_stranded(&mut self) {
        let tree = self.ctx.tree;
        for t in tree.preorder() {
            if tree.is_leaf(t) {
                continue;
            }
            let Some(parent) = tree.parent(t) else {
                continue;
            };
            let heads = self.ctx.heads;
            if heads.head_word(t) == heads.head_word(parent) {
                continue;
            }
            if !self.basic.has_parent(t) && self.head_accepted(t) {
                let gov = self.highest(parent);
                if !self.basic.contains_edge(gov, t) && !self.basic.has_path(t, gov) {
                    debug!(governor = %gov, dependent = %t, "attaching stranded node");
                    self.basic.add(gov, t, relation::dependent());
                }
            }
        }
    }

    fn get_deps(&self, hooks: &dyn StructureHooks, with_extra: bool) -> Vec<TypedDependency> {
        let mut deps: Vec<TypedDependency> = self
            .basic
            .edge_groups()
            .into_iter()
            .map(|(gov, dep, labels)| {
                TypedDependency::new(most_specific(&labels), self.word(gov), self.word(dep))
            })
            .collect();
        deps.sort();

        let root = self.ctx.tree.root();
        if self.head_accepted(root) {
            deps.push(TypedDependency::new(relation::root(), IndexedWord::root(), self.word(root)));
        } else {
            repair_root(&mut deps, &self.word(root));
        }

        hooks.post_process_dependencies(&mut deps);

        if with_extra {
            hooks.get_extras(&mut deps);
            for (gov, dep, labels) in self.complete.edge_groups() {
                for rel in remove_relation_ancestors(&labels) {
                    let extra =
                        TypedDependency::new(rel, self.word(gov), self.word(dep)).with_extra(true);
                    if !deps.contains(&extra) && hooks.extra_tree_dep_filter(&extra) {
                        deps.push(extra);
                    }
                }
            }
        }
        deps.sort();
        deps
    }
}

fn word_of(tree: &Tree, heads: &HeadAnnotations, node: NodeId) -> IndexedWord {
    let leaf = heads.head_word(node);
    IndexedWord::new(
        tree.word_index(leaf).unwrap_or(0),
        tree.label(leaf),
        tree.tag(leaf).map(str::to_string),
    )
}

/// Folds labels from `dep`, moving to a label whenever it refines the
/// current one.
fn most_specific(labels: &[RelationRef]) -> RelationRef {
    let mut best = relation::dependent();
    for label in labels {
        if best.is_ancestor(label) {
            best = label.clone();
        }
    }
    best
}

/// Keeps the labels that no other label on the edge refines.
fn remove_relation_ancestors(labels: &[RelationRef]) -> Vec<RelationRef> {
    labels
        .iter()
        .filter(|l| !labels.iter().any(|m| *m != **l && l.is_ancestor(m)))
        .cloned()
        .collect()
}

/// The natural root word was filtered out: promote the first word it
/// governs and move its other dependents there.
fn repair_root(deps: &mut [TypedDependency], old_root: &IndexedWord) {
    let Some(pos) = deps.iter().position(|d| d.governor == *old_root) else {
        warn!(root = %old_root, "filtered root governs nothing; no root dependency");
        return;
    };
    let new_root = deps[pos].dependent.clone();
    warn!(old = %old_root, new = %new_root, "root word filtered; promoting first dependent");
    for (i, dep) in deps.iter_mut().enumerate() {
        if i == pos {
            dep.relation = relation::root();
            dep.governor = IndexedWord::root();
        } else if dep.governor == *old_root {
            dep.governor = new_root.clone();
        }
    }
}

/// The analysis of one sentence: its tree, heads, both graphs and the
/// basic and extra-inclusive dependency lists.
pub struct GrammaticalStructure {
    sentence_id: Option<SentenceId>,
    tree: Tree,
    heads: HeadAnnotations,
    basic: DependencyMultiGraph,
    complete: DependencyMultiGraph,
    typed_dependencies: Vec<TypedDependency>,
    all_typed_dependencies: Vec<TypedDependency>,
    hooks: Arc<dyn StructureHooks>,
}

impl fmt::Debug for GrammaticalStructure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GrammaticalStructure")
            .field("sentence_id", &self.sentence_id)
            .field("tree", &self.tree.to_string())
            .field("typed_dependencies", &self.typed_dependencies)
            .finish_non_exhaustive()
    }
}

impl GrammaticalStructure {
    pub fn sentence_id(&self) -> Option<SentenceId> {
        self.sentence_id
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn heads(&self) -> &HeadAnnotations {
        &self.heads
    }

    pub fn basic_graph(&self) -> &DependencyMultiGraph {
        &self.basic
    }

    pub fn complete_graph(&self) -> &DependencyMultiGraph {
        &self.complete
    }

    /// Basic dependencies, plus every extra when `extras` asks for any.
    pub fn typed_dependencies(&self, extras: Extras) -> Vec<TypedDependency> {
        let mut deps = if extras.has_extras() {
            self.all_typed_dependencies.clone()
        } else {
            self.typed_dependencies.clone()
        };
        self.hooks.correct_dependencies(&mut deps);
        deps
    }

    pub fn all_typed_dependencies(&self) -> Vec<TypedDependency> {
        self.typed_dependencies(Extras::Maximal)
    }

    pub fn typed_dependencies_collapsed(&self, extras: Extras) -> Vec<TypedDependency> {
        let mut deps = self.typed_dependencies(Extras::None);
        self.hooks.collapse_dependencies(&mut deps, false, extras.flags());
        deps.sort();
        deps
    }

    pub fn typed_dependencies_cc_processed(&self, extras: Extras) -> Vec<TypedDependency> {
        let mut deps = self.typed_dependencies(Extras::None);
        self.hooks.collapse_dependencies(&mut deps, true, extras.flags());
        deps.sort();
        deps
    }

    pub fn typed_dependencies_collapsed_tree(&self) -> Vec<TypedDependency> {
        let mut deps = self.typed_dependencies(Extras::None);
        self.hooks.collapse_dependencies_tree(&mut deps);
        deps.sort();
        deps
    }

    pub fn typed_dependencies_enhanced(
        &self,
        options: &EnhancementOptions,
    ) -> Vec<TypedDependency> {
        let mut deps = self.typed_dependencies(Extras::Maximal);
        self.hooks.add_enhancements(&mut deps, options);
        deps.sort();
        deps
    }

    pub fn typed_dependencies_enhanced_plus_plus(&self) -> Vec<TypedDependency> {
        self.typed_dependencies_enhanced(&EnhancementOptions::enhanced_plus_plus())
    }

    /// Relation names on the way up from word `node_index` to word
    /// `root_index` in the basic dependencies.
    pub fn dependency_path(&self, node_index: u32, root_index: u32) -> Option<Vec<String>> {
        let mut path = Vec::new();
        let mut current = node_index;
        while current != root_index {
            if path.len() > self.typed_dependencies.len() {
                return None;
            }
            let dep = self
                .typed_dependencies
                .iter()
                .find(|d| d.dependent.index == current && d.dependent.copy_count == 0)?;
            path.push(dep.relation.to_string());
            current = dep.governor.index;
        }
        Some(path)
    }

    /// One CoNLL-X row per word. A word nothing governs is printed as
    /// `erased` under the root.
    pub fn to_conllx(&self, deps: &[TypedDependency]) -> String {
        let mut out = String::new();
        for leaf in self.tree.leaves() {
            let Some(index) = self.tree.word_index(leaf) else {
                continue;
            };
            let found = deps
                .iter()
                .filter(|d| d.dependent.index == index && d.dependent.copy_count == 0)
                .min_by_key(|d| d.extra);
            let (governor, relation) = match found {
                Some(d) => (d.governor.index, d.relation.to_string()),
                None => (0, "erased".to_string()),
            };
            let tag = self.tree.tag(leaf).unwrap_or("_");
            let row = format_conllx_row(index, self.tree.label(leaf), tag, governor, &relation);
            out.push_str(&row);
            out.push('\n');
        }
        out
    }

    fn from_dependencies(
        tokens: &[String],
        tags: &[String],
        build: impl FnOnce(&[IndexedWord]) -> Result<Vec<TypedDependency>, SolverError>,
    ) -> Result<Self, SolverError> {
        if tokens.len() != tags.len() {
            return Err(SolverError::TokenTagMismatch {
                tokens: tokens.len(),
                tags: tags.len(),
            });
        }
        let mut tree = Tree::new("ROOT");
        let root = tree.root();
        for (token, tag) in tokens.iter().zip(tags) {
            let pre = tree.add_child(root, tag.as_str());
            tree.add_child(pre, token.as_str());
        }
        tree.index_words();

        let flat = RuleTable::new("flat", &[]).with_default_rule(RuleGroup::left(&[]));
        let heads = percolate(&HeadSelector::new(flat, TreebankPack::penn()), &tree)?;

        let words: Vec<IndexedWord> = tokens
            .iter()
            .zip(tags)
            .enumerate()
            .map(|(i, (token, tag))| {
                IndexedWord::new(i as u32 + 1, token.as_str(), Some(tag.clone()))
            })
            .collect();
        let deps = build(&words)?;

        Ok(Self {
            sentence_id: None,
            tree,
            heads,
            basic: DependencyMultiGraph::new(),
            complete: DependencyMultiGraph::new(),
            typed_dependencies: deps.clone(),
            all_typed_dependencies: deps,
            hooks: Arc::new(NoStructureHooks),
        })
    }

    /// Rebuilds a structure from tokens, tags and `reln(gov-i, dep-j)`
    /// lines. Index 0 is the synthetic ROOT word.
    pub fn from_string_reps(
        tokens: &[String],
        tags: &[String],
        deps: &[String],
        registry: &RelationRegistry,
    ) -> Result<Self, SolverError> {
        Self::from_dependencies(tokens, tags, |words| {
            let word_at = |line: &str, word: &IndexedWord| -> Result<IndexedWord, SolverError> {
                if word.index == 0 {
                    return Ok(IndexedWord::root());
                }
                let found = words
                    .get(word.index as usize - 1)
                    .ok_or_else(|| ParseError::MalformedDependency(line.to_string()))?;
                Ok(found.clone().with_copy(word.copy_count))
            };
            deps.iter()
                .map(|line| -> Result<TypedDependency, SolverError> {
                    let parsed = parse_dependency_line(line)?;
                    Ok(TypedDependency::new(
                        registry.value_of(&parsed.relation),
                        word_at(line, &parsed.governor)?,
                        word_at(line, &parsed.dependent)?,
                    ))
                })
                .collect()
        })
    }
}

/// Reads CoNLL-X sentences back into structures.
pub fn read_conllx_structures(
    text: &str,
    registry: &RelationRegistry,
) -> Result<Vec<GrammaticalStructure>, SolverError> {
    let mut out = Vec::new();
    for rows in parse_conllx(text)? {
        let tokens: Vec<String> = rows.iter().map(|r| r.word.clone()).collect();
        let tags: Vec<String> = rows.iter().map(|r| r.tag.clone()).collect();
        let structure = GrammaticalStructure::from_dependencies(&tokens, &tags, |words| {
            let mut deps = Vec::new();
            for (row, word) in rows.iter().zip(words) {
                let Some(mut gov_index) = row.governor else {
                    continue;
                };
                let name = row.relation.to_lowercase();
                let relation: RelationRef = match name.as_str() {
                    "null" | "erased" => continue,
                    "root" => relation::root(),
                    _ => registry.lookup(&name).ok_or_else(|| SolverError::UnknownRelation {
                        name: row.relation.clone(),
                        line: row.line,
                    })?,
                };
                if gov_index as usize > words.len() {
                    warn!(
                        line = row.line,
                        governor = gov_index,
                        "governor index out of range, attaching to root"
                    );
                    gov_index = 0;
                }
                let governor = match gov_index {
                    0 => IndexedWord::root(),
                    i => words[i as usize - 1].clone(),
                };
                deps.push(TypedDependency::new(relation, governor, word.clone()));
            }
            Ok(deps)
        })?;
        out.push(structure);
    }
    Ok(out)
}
