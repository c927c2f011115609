//! Two-group membership of the cohort animals

use crate::error::GroupConfigError;
use crate::types::AnimalId;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Group an animal is assigned to
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GroupLabel {
    Treatment,
    Control,
    Unknown,
}

/// Named set of animal identifiers
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Group {
    pub label: String,
    pub animals: BTreeSet<AnimalId>,
}

impl Group {
    pub fn new(label: impl Into<String>, animals: impl IntoIterator<Item = AnimalId>) -> Self {
        Self {
            label: label.into(),
            animals: animals.into_iter().collect(),
        }
    }
}

/// What to do with an animal which is in neither of the groups
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum UnmatchedPolicy {
    /// Produce no records for the animal, report it as ungrouped
    #[default]
    Reject,
    /// Keep the animal under the given label
    Assign(String),
}

/// Treatment and control groups of a cohort
///
/// The groups must be disjoint, check it with [GroupConfig::validate] before an analysis.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct GroupConfig {
    pub treatment: Group,
    pub control: Group,
    #[serde(default)]
    pub unmatched: UnmatchedPolicy,
}

impl GroupConfig {
    pub fn new(treatment: Group, control: Group, unmatched: UnmatchedPolicy) -> Self {
        Self {
            treatment,
            control,
            unmatched,
        }
    }

    pub fn validate(&self) -> Result<(), GroupConfigError> {
        let overlap: BTreeSet<_> = self
            .treatment
            .animals
            .intersection(&self.control.animals)
            .copied()
            .collect();
        if !overlap.is_empty() {
            return Err(GroupConfigError::Overlapping(overlap));
        }

        let mut labels = vec![self.treatment.label.clone(), self.control.label.clone()];
        if let UnmatchedPolicy::Assign(label) = &self.unmatched {
            labels.push(label.clone());
        }
        let unique: BTreeSet<_> = labels.iter().collect();
        if unique.len() != labels.len() || labels.iter().any(|l| l.trim().is_empty()) {
            return Err(GroupConfigError::BadLabels(labels));
        }
        Ok(())
    }

    pub fn classify(&self, animal: AnimalId) -> GroupLabel {
        if self.treatment.animals.contains(&animal) {
            GroupLabel::Treatment
        } else if self.control.animals.contains(&animal) {
            GroupLabel::Control
        } else {
            GroupLabel::Unknown
        }
    }

    /// Label to put into result records, `None` if the animal must be rejected
    pub fn label_of(&self, animal: AnimalId) -> Option<&str> {
        match self.classify(animal) {
            GroupLabel::Treatment => Some(&self.treatment.label),
            GroupLabel::Control => Some(&self.control.label),
            GroupLabel::Unknown => match &self.unmatched {
                UnmatchedPolicy::Reject => None,
                UnmatchedPolicy::Assign(label) => Some(label),
            },
        }
    }

    #[inline]
    pub fn default_treatment() -> Group {
        Group::new("TBI", [2, 3, 6, 7, 8])
    }

    #[inline]
    pub fn default_control() -> Group {
        Group::new("Sham", [1, 4, 5, 9, 10])
    }
}

impl Default for GroupConfig {
    fn default() -> Self {
        Self::new(
            Self::default_treatment(),
            Self::default_control(),
            UnmatchedPolicy::default(),
        )
    }
}
