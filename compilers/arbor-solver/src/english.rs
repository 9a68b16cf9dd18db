//! A compact English relation hierarchy over Penn Treebank trees.

use arbor_heads::english::semantic_selector;
use arbor_protocol::Language;

use crate::error::SolverError;
use crate::relation::{RelationRegistry, RelationSetSpec, RelationSpec};
use crate::structure::DependencyGraphBuilder;

const NOMINAL: &str = "NP(?:-[A-Z]+)*|NX|NML|WHNP";
const VERBAL: &str = "VP|SQ|SINV";
const CLAUSAL: &str = "S|SQ|SINV|SBARQ";
const CONJUNCT: &str = "/^(?:NP|NN|NNS|NNP|NNPS|NX|NML|VP|VB|VBD|VBG|VBN|VBP|VBZ|JJ|JJR|JJS|ADJP|RB|ADVP|S|SBAR|SQ|PP|CD|UCP)(?:-.*)?$/";
const COPULA_WORDS: &str = "am|is|are|was|were|be|being|been|'s|'re|'m";

fn rel(
    short: &str,
    long: &str,
    parent: &str,
    source: Option<String>,
    targets: &[String],
) -> RelationSpec {
    RelationSpec {
        short_name: short.to_string(),
        long_name: Some(long.to_string()),
        parent: parent.to_string(),
        source,
        targets: targets.to_vec(),
        specific: None,
    }
}

fn abstract_rel(short: &str, long: &str, parent: &str) -> RelationSpec {
    rel(short, long, parent, None, &[])
}

fn found(short: &str, long: &str, parent: &str, source: &str, targets: &[&str]) -> RelationSpec {
    let targets: Vec<String> = targets.iter().map(|t| t.to_string()).collect();
    rel(short, long, parent, Some(source.to_string()), &targets)
}

/// The English relation set as data, parents first.
pub fn relation_set_spec() -> RelationSetSpec {
    let conj_sources = format!("{NOMINAL}|{VERBAL}|{CLAUSAL}|ADJP|ADVP|PP|UCP|SBAR");
    let modified = format!("{VERBAL}|{CLAUSAL}|ADJP|ADVP|WHADVP|{NOMINAL}");
    let punct_target = r"__ < /^(?:''|``|-LRB-|-RRB-|,|\.|:)$/=target".to_string();

    let relations = vec![
        abstract_rel("arg", "argument", "dep"),
        abstract_rel("subj", "subject", "arg"),
        found("nsubj", "nominal subject", "subj", CLAUSAL, &["__ < (/^NP(?:-SBJ.*)?$/=target $++ VP)"]),
        abstract_rel("comp", "complement", "arg"),
        abstract_rel("obj", "object", "comp"),
        found("dobj", "direct object", "obj", "VP", &["__ < (NP=target $-- /^VB/)"]),
        found("pobj", "object of preposition", "obj", "PP|WHPP", &["__ < (/^NP/=target $-- /^(?:IN|TO|VBG)$/)"]),
        found("ccomp", "clausal complement", "comp", "VP", &["__ < (/^(?:SBAR|S)$/=target $-- /^VB/)"]),
        found("aux", "auxiliary", "dep", VERBAL, &["__ < (/^(?:MD|TO|VB|VBD|VBG|VBN|VBP|VBZ|AUX)$/=target $++ VP)"]),
        rel(
            "cop",
            "copula",
            "aux",
            Some(VERBAL.to_string()),
            &[format!("__ < (/^VB/=target < {COPULA_WORDS} $++ /^(?:ADJP|NP)/)")],
        ),
        abstract_rel("mod", "modifier", "dep"),
        found("det", "determiner", "mod", NOMINAL, &["__ < /^(?:DT|WDT|PDT)$/=target"]),
        found("amod", "adjectival modifier", "mod", NOMINAL, &["__ < /^(?:JJ|JJR|JJS|ADJP)$/=target"]),
        found("nn", "noun compound modifier", "mod", NOMINAL, &["__ < (/^NNP?S?$/=target $+ /^NN/)"]),
        found("num", "numeric modifier", "mod", NOMINAL, &["__ < /^(?:CD|QP)$/=target"]),
        found("poss", "possession modifier", "mod", NOMINAL, &["__ < (/^NP/=target < POS)", "__ < PRP$|WP$=target"]),
        found("possessive", "possessive modifier", "dep", NOMINAL, &["__ < POS=target"]),
        found("advmod", "adverbial modifier", "mod", &modified, &["__ < /^(?:RB|RBR|RBS|WRB|ADVP|WHADVP)$/=target"]),
        found("neg", "negation modifier", "advmod", &modified, &["__ < (RB=target < not|n't|never)"]),
        found("tmod", "temporal modifier", "mod", &modified, &["__ < /^NP-TMP/=target"]),
        found("prep", "prepositional modifier", "mod", &modified, &["__ < @PP=target"]),
        found("cc", "coordination", "dep", &conj_sources, &["__ < /^(?:CC|CONJP)$/=target"]),
        rel(
            "conj",
            "conj collapsed",
            "dep",
            Some(conj_sources.clone()),
            &[
                format!("__ < (CC|CONJP $++ {CONJUNCT}=target)"),
                format!("__ < (CC|CONJP $-- {CONJUNCT}=target)"),
            ],
        ),
        rel("punct", "punctuation", "dep", Some(".*".to_string()), &[punct_target]),
    ];

    RelationSetSpec {
        language: Language::English,
        relations,
    }
}

/// Registry built from [`relation_set_spec`].
pub fn relations() -> Result<RelationRegistry, SolverError> {
    RelationRegistry::from_spec(&relation_set_spec())
}

/// Semantic heads plus the English relations, punctuation filtered.
pub fn structure_builder() -> Result<DependencyGraphBuilder, SolverError> {
    Ok(DependencyGraphBuilder::new(semantic_selector(), relations()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::Extras;
    use arbor_parser::read_tree;

    fn convert(text: &str) -> Vec<String> {
        let builder = structure_builder().unwrap();
        let gs = builder.build(read_tree(text).unwrap()).unwrap();
        gs.typed_dependencies(Extras::None)
            .iter()
            .map(|d| d.to_string())
            .collect()
    }

    #[test]
    fn test_simple_transitive() {
        assert_eq!(
            convert("(ROOT (S (NP (DT The) (JJ old) (NN man)) (VP (VBD saw) (NP (NNP Kim))) (. .)))"),
            vec![
                "det(man-3, The-1)",
                "amod(man-3, old-2)",
                "nsubj(saw-4, man-3)",
                "root(ROOT-0, saw-4)",
                "dobj(saw-4, Kim-5)",
            ]
        );
    }

    #[test]
    fn test_temporal_modifier() {
        assert_eq!(
            convert("(S (NP (NNP Sam)) (VP (VBD died) (NP-TMP (NN today))))"),
            vec!["nsubj(died-2, Sam-1)", "root(ROOT-0, died-2)", "tmod(died-2, today-3)"]
        );
    }

    #[test]
    fn test_auxiliary_and_negation() {
        assert_eq!(
            convert("(ROOT (S (NP (NNP Sam)) (VP (MD will) (RB not) (VP (VB go)))))"),
            vec![
                "nsubj(go-4, Sam-1)",
                "aux(go-4, will-2)",
                "neg(go-4, not-3)",
                "root(ROOT-0, go-4)",
            ]
        );
    }

    #[test]
    fn test_copula() {
        assert_eq!(
            convert("(ROOT (S (NP (NNP Sam)) (VP (VBZ is) (ADJP (JJ happy)))))"),
            vec!["nsubj(happy-3, Sam-1)", "cop(happy-3, is-2)", "root(ROOT-0, happy-3)"]
        );
    }

    #[test]
    fn test_coordination_and_prepositions() {
        assert_eq!(
            convert("(ROOT (S (NP (NNS cats) (CC and) (NNS dogs)) (VP (VBP sleep) (PP (IN in) (NP (NN beds))))))"),
            vec![
                "nsubj(sleep-4, cats-1)",
                "cc(cats-1, and-2)",
                "conj(cats-1, dogs-3)",
                "root(ROOT-0, sleep-4)",
                "prep(sleep-4, in-5)",
                "pobj(in-5, beds-6)",
            ]
        );
    }

    #[test]
    fn test_possessives() {
        assert_eq!(
            convert("(ROOT (NP (NP (NNP John) (POS 's)) (NN dog)))"),
            vec!["poss(dog-3, John-1)", "possessive(John-1, 's-2)", "root(ROOT-0, dog-3)"]
        );
    }

    #[test]
    fn test_hierarchy_shape() {
        let registry = relations().unwrap();
        let neg = registry.get("neg").unwrap();
        let advmod = registry.get("advmod").unwrap();
        assert!(advmod.is_ancestor(&neg));
        assert!(registry.get("aux").unwrap().is_ancestor(&registry.get("cop").unwrap()));
        assert!(registry.relations().all(|r| r.has_source()));

        let pretty = registry.to_pretty_string();
        assert!(pretty.starts_with("dep (dependent)\n  arg (argument)\n    subj (subject)\n      nsubj (nominal subject)"));
        assert!(pretty.contains("\n      neg (negation modifier): __ < (RB=target < not|n't|never)\n"));
    }

    #[test]
    fn test_spec_round_trips_through_json() {
        let spec = relation_set_spec();
        let json = serde_json::to_string(&spec).unwrap();
        let back: RelationSetSpec = serde_json::from_str(&json).unwrap();
        assert_eq!(back, spec);
        assert!(RelationRegistry::from_spec(&back).is_ok());
    }
}
