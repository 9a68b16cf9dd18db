use std::collections::HashMap;

use arbor_protocol::{CategoryRules, Mode, RuleSet, RuleSpec};
use rkyv::{Archived, Deserialize, Infallible};

use crate::error::HeadError;

/// One step of a head rule: a scan mode plus the categories it looks for
/// (or, for the `*Except` modes, the categories it skips).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleGroup {
    pub mode: Mode,
    pub categories: Vec<String>,
}

impl RuleGroup {
    pub fn new(mode: Mode, categories: &[&str]) -> Self {
        Self {
            mode,
            categories: categories.iter().map(|c| c.to_string()).collect(),
        }
    }

    pub fn left(categories: &[&str]) -> Self {
        Self::new(Mode::Left, categories)
    }

    pub fn right(categories: &[&str]) -> Self {
        Self::new(Mode::Right, categories)
    }

    pub fn left_dis(categories: &[&str]) -> Self {
        Self::new(Mode::LeftDis, categories)
    }

    pub fn right_dis(categories: &[&str]) -> Self {
        Self::new(Mode::RightDis, categories)
    }

    pub fn left_except(categories: &[&str]) -> Self {
        Self::new(Mode::LeftExcept, categories)
    }

    pub fn right_except(categories: &[&str]) -> Self {
        Self::new(Mode::RightExcept, categories)
    }

    /// Validates the textual direction tag of a config entry.
    pub fn from_spec(spec: &RuleSpec) -> Result<Self, HeadError> {
        let mode = Mode::from_tag(&spec.direction)
            .ok_or_else(|| HeadError::InvalidRuleDirection(spec.direction.clone()))?;
        Ok(Self {
            mode,
            categories: spec.categories.clone(),
        })
    }

    pub fn to_spec(&self) -> RuleSpec {
        RuleSpec {
            direction: self.mode.tag().to_string(),
            categories: self.categories.clone(),
        }
    }

    pub fn contains(&self, category: &str) -> bool {
        self.categories.iter().any(|c| c == category)
    }
}

/// Category -> ordered rule groups, plus the default rules.
///
/// Built once, then shared read-only by every selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleTable {
    name: String,
    rules: HashMap<String, Vec<RuleGroup>>,
    default_rule: Option<RuleGroup>,
    avoid: Vec<String>,
    default_left: RuleGroup,
    default_right: RuleGroup,
}

impl RuleTable {
    /// An empty table whose default left/right rules skip `avoid`.
    pub fn new(name: impl Into<String>, avoid: &[&str]) -> Self {
        let avoid: Vec<String> = avoid.iter().map(|c| c.to_string()).collect();
        let (default_left, default_right) = Self::derive_defaults(&avoid);
        Self {
            name: name.into(),
            rules: HashMap::new(),
            default_rule: None,
            avoid,
            default_left,
            default_right,
        }
    }

    fn derive_defaults(avoid: &[String]) -> (RuleGroup, RuleGroup) {
        if avoid.is_empty() {
            (RuleGroup::left(&[]), RuleGroup::right(&[]))
        } else {
            (
                RuleGroup {
                    mode: Mode::LeftExcept,
                    categories: avoid.to_vec(),
                },
                RuleGroup {
                    mode: Mode::RightExcept,
                    categories: avoid.to_vec(),
                },
            )
        }
    }

    /// Builder-style insert; replaces any previous entry for `category`.
    pub fn with(mut self, category: &str, groups: Vec<RuleGroup>) -> Self {
        self.insert(category, groups);
        self
    }

    pub fn insert(&mut self, category: &str, groups: Vec<RuleGroup>) {
        self.rules.insert(category.to_string(), groups);
    }

    /// Gives `alias` the same rule groups as `category`.
    pub fn alias(mut self, alias: &str, category: &str) -> Self {
        if let Some(groups) = self.rules.get(category).cloned() {
            self.rules.insert(alias.to_string(), groups);
        }
        self
    }

    pub fn with_default_rule(mut self, rule: RuleGroup) -> Self {
        self.default_rule = Some(rule);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get(&self, category: &str) -> Option<&[RuleGroup]> {
        self.rules.get(category).map(|g| g.as_slice())
    }

    pub fn default_rule(&self) -> Option<&RuleGroup> {
        self.default_rule.as_ref()
    }

    pub fn default_left(&self) -> &RuleGroup {
        &self.default_left
    }

    pub fn default_right(&self) -> &RuleGroup {
        &self.default_right
    }

    pub fn avoid(&self) -> &[String] {
        &self.avoid
    }

    /// True when the table has neither entries nor a default rule.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty() && self.default_rule.is_none()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn from_rule_set(set: &RuleSet) -> Result<Self, HeadError> {
        let avoid: Vec<&str> = set.avoid.iter().map(|s| s.as_str()).collect();
        let mut table = Self::new(set.name.clone(), &avoid);
        for entry in &set.rules {
            let groups = entry
                .rules
                .iter()
                .map(RuleGroup::from_spec)
                .collect::<Result<Vec<_>, _>>()?;
            table.insert(&entry.category, groups);
        }
        if let Some(spec) = &set.default_rule {
            table.default_rule = Some(RuleGroup::from_spec(spec)?);
        }
        Ok(table)
    }

    /// Loads a table from a validated zero-copy archive.
    pub fn from_archived(archived: &Archived<RuleSet>) -> Result<Self, HeadError> {
        let set: RuleSet = match archived.deserialize(&mut Infallible) {
            Ok(set) => set,
            Err(never) => match never {},
        };
        Self::from_rule_set(&set)
    }

    /// Config form of the table; categories come out sorted so the output
    /// is stable.
    pub fn to_rule_set(&self, version: u32) -> RuleSet {
        let mut categories: Vec<&String> = self.rules.keys().collect();
        categories.sort();
        RuleSet {
            version,
            name: self.name.clone(),
            rules: categories
                .into_iter()
                .map(|category| CategoryRules {
                    category: category.clone(),
                    rules: self.rules[category].iter().map(RuleGroup::to_spec).collect(),
                })
                .collect(),
            default_rule: self.default_rule.as_ref().map(RuleGroup::to_spec),
            avoid: self.avoid.clone(),
        }
    }
}

impl Default for RuleTable {
    fn default() -> Self {
        Self::new("empty", &[])
    }
}
