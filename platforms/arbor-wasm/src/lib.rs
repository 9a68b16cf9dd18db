use arbor_heads::english::semantic_selector;
use arbor_heads::{CoordinationFix, HeadSelector, RuleTable};
use arbor_parser::read_trees;
use arbor_protocol::{RuleSet, SentenceId, TreebankPack};
use arbor_solver::{
    english, get_roots, DependencyGraphBuilder, EnhancementOptions, Extras, GrammaticalStructure,
    TypedDependency,
};
use rkyv::AlignedVec;
use serde::Serialize;
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
pub fn init_panic_hook() {
    console_error_panic_hook::set_once();
}

/// The structured response sent back to JavaScript
#[derive(Debug, Serialize)]
pub struct TokenReport {
    pub index: u32,
    pub word: String,
    pub tag: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DependencyReport {
    pub relation: String,
    pub governor: String,
    pub governor_index: u32,
    pub dependent: String,
    pub dependent_index: u32,
    pub extra: bool,
}

impl From<&TypedDependency> for DependencyReport {
    fn from(d: &TypedDependency) -> Self {
        Self {
            relation: d.relation.to_string(),
            governor: d.governor.word.clone(),
            governor_index: d.governor.index,
            dependent: d.dependent.word.clone(),
            dependent_index: d.dependent.index,
            extra: d.extra,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SentenceReport {
    pub tokens: Vec<TokenReport>,
    pub dependencies: Vec<DependencyReport>,
    /// Printed form of each root dependency; more than one means a forest.
    pub roots: Vec<String>,
    pub debug_info: String,
}

/// The converter instance running in the browser.
#[wasm_bindgen]
pub struct DependencyEngine {
    builder: DependencyGraphBuilder,
}

#[wasm_bindgen]
impl DependencyEngine {
    /// `rules` is an archive from `arbor-convert compile-rules`; without it
    /// the built-in English semantic heads are used.
    #[wasm_bindgen(constructor)]
    pub fn new(rules: Option<Vec<u8>>) -> Result<DependencyEngine, JsValue> {
        Self::from_rules(rules.as_deref()).map_err(|e| JsValue::from_str(&e))
    }

    /// Trees -> head annotation -> typed dependencies -> JSON
    pub fn convert(&self, input: &str, style: &str) -> Result<JsValue, JsValue> {
        let reports = self.analyze(input, style).map_err(|e| JsValue::from_str(&e))?;
        serde_wasm_bindgen::to_value(&reports).map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Indented relation hierarchy, one relation per line.
    pub fn relations(&self) -> String {
        self.builder.registry().to_pretty_string()
    }
}

impl DependencyEngine {
    pub fn from_rules(rules: Option<&[u8]>) -> Result<Self, String> {
        let selector = match rules {
            Some(bytes) => {
                let mut aligned = AlignedVec::with_capacity(bytes.len());
                aligned.extend_from_slice(bytes);
                let archived = rkyv::check_archived_root::<RuleSet>(&aligned)
                    .map_err(|e| format!("corrupt rule archive: {}", e))?;
                let table = RuleTable::from_archived(archived).map_err(|e| e.to_string())?;
                HeadSelector::with_hooks(table, TreebankPack::penn(), CoordinationFix)
            }
            None => semantic_selector(),
        };
        let registry = english::relations().map_err(|e| e.to_string())?;
        Ok(Self {
            builder: DependencyGraphBuilder::new(selector, registry),
        })
    }

    pub fn analyze(&self, input: &str, style: &str) -> Result<Vec<SentenceReport>, String> {
        let trees = read_trees(input).map_err(|e| e.to_string())?;
        trees
            .into_iter()
            .enumerate()
            .map(|(i, tree)| {
                let gs = self
                    .builder
                    .build_with_id(SentenceId::new(i as u32), tree)
                    .map_err(|e| e.to_string())?;
                let deps = project(&gs, style)?;
                Ok(report(&gs, &deps))
            })
            .collect()
    }
}

fn project(gs: &GrammaticalStructure, style: &str) -> Result<Vec<TypedDependency>, String> {
    Ok(match style {
        "basic" => gs.typed_dependencies(Extras::None),
        "non-collapsed" => gs.typed_dependencies(Extras::Maximal),
        "collapsed" => gs.typed_dependencies_collapsed(Extras::None),
        "cc-processed" => gs.typed_dependencies_cc_processed(Extras::None),
        "collapsed-tree" => gs.typed_dependencies_collapsed_tree(),
        "enhanced" => gs.typed_dependencies_enhanced(&EnhancementOptions::enhanced()),
        "enhanced++" => gs.typed_dependencies_enhanced_plus_plus(),
        other => return Err(format!("unknown style: {other}")),
    })
}

fn report(gs: &GrammaticalStructure, deps: &[TypedDependency]) -> SentenceReport {
    let tree = gs.tree();
    let tokens = tree
        .leaves()
        .into_iter()
        .filter_map(|leaf| {
            Some(TokenReport {
                index: tree.word_index(leaf)?,
                word: tree.label(leaf).to_string(),
                tag: tree.tag(leaf).map(str::to_string),
            })
        })
        .collect();

    SentenceReport {
        tokens,
        dependencies: deps.iter().map(DependencyReport::from).collect(),
        roots: get_roots(deps).iter().map(|d| d.to_string()).collect(),
        debug_info: format!(
            "{} basic edges, {} complete edges",
            gs.basic_graph().edge_count(),
            gs.complete_graph().edge_count()
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_for_simple_sentence() {
        let engine = DependencyEngine::from_rules(None).unwrap();
        let reports = engine
            .analyze("(ROOT (S (NP (NNP Sam)) (VP (VBD died))))", "basic")
            .unwrap();
        assert_eq!(reports.len(), 1);
        let report = &reports[0];
        assert_eq!(report.tokens.len(), 2);
        assert_eq!(report.tokens[1].tag.as_deref(), Some("VBD"));
        assert_eq!(report.dependencies[0].relation, "nsubj");
        assert_eq!(report.dependencies[0].governor_index, 2);
        assert_eq!(report.roots, vec!["root(ROOT-0, died-2)".to_string()]);
    }

    #[test]
    fn test_unknown_style_is_an_error() {
        let engine = DependencyEngine::from_rules(None).unwrap();
        assert!(engine.analyze("(ROOT (NP (NN x)))", "sideways").is_err());
    }

    #[test]
    fn test_bad_archive_is_rejected() {
        assert!(DependencyEngine::from_rules(Some(b"nope")).is_err());
    }
}
