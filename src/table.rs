//! Flat table of fitted cosinor parameters

use crate::error::TableError;
use crate::types::{AnimalId, ExperimentId};
use crate::window::AnalysisWindow;

use itertools::Itertools;
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::io;

/// One row of the result table
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub animal: AnimalId,
    pub group: String,
    pub experiment: ExperimentId,
    pub window: AnalysisWindow,
    #[serde(rename = "Mesor")]
    pub mesor: f64,
    #[serde(rename = "Amplitude")]
    pub amplitude: f64,
    #[serde(rename = "Acrophase")]
    pub acrophase: f64,
}

impl ResultRecord {
    pub fn key(&self) -> (AnimalId, ExperimentId, AnalysisWindow) {
        (self.animal, self.experiment, self.window)
    }
}

/// Immutable collection of [ResultRecord] in insertion order
///
/// (animal, experiment, window) is unique across the table.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResultTable {
    records: Vec<ResultRecord>,
}

impl ResultTable {
    /// Table of `records` in the given order, fails on the first repeated key
    pub fn new(records: Vec<ResultRecord>) -> Result<Self, TableError> {
        match records.iter().map(ResultRecord::key).duplicates().next() {
            Some((animal, experiment, window)) => Err(TableError::DuplicateKey {
                animal,
                experiment,
                window,
            }),
            None => Ok(Self { records }),
        }
    }

    /// Records with keys unique by construction
    pub(crate) fn from_unique(records: Vec<ResultRecord>) -> Self {
        debug_assert!(records.iter().map(ResultRecord::key).all_unique());
        Self { records }
    }

    pub const COLUMNS: [&'static str; 7] = [
        "animal",
        "group",
        "experiment",
        "window",
        "Mesor",
        "Amplitude",
        "Acrophase",
    ];

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ResultRecord> {
        self.records.iter()
    }

    pub fn as_slice(&self) -> &[ResultRecord] {
        &self.records
    }

    pub fn get(
        &self,
        animal: AnimalId,
        experiment: ExperimentId,
        window: AnalysisWindow,
    ) -> Option<&ResultRecord> {
        self.iter().find(|r| r.key() == (animal, experiment, window))
    }

    pub fn by_group<'a>(&'a self, group: &'a str) -> impl Iterator<Item = &'a ResultRecord> + 'a {
        self.iter().filter(move |r| r.group == group)
    }

    pub fn by_window(&self, window: AnalysisWindow) -> impl Iterator<Item = &ResultRecord> + '_ {
        self.iter().filter(move |r| r.window == window)
    }

    /// Rows of `self` followed by rows of `other`, the two must not share a key
    pub fn concat(&self, other: &Self) -> Result<Self, TableError> {
        Self::new(self.iter().chain(other.iter()).cloned().collect())
    }

    /// Mean and spread of every parameter per group and window, sorted by group then window
    pub fn summarize(&self) -> Vec<GroupWindowSummary> {
        self.iter()
            .into_group_map_by(|r| (r.group.clone(), r.window))
            .into_iter()
            .sorted_by(|(a, _), (b, _)| a.cmp(b))
            .map(|((group, window), records)| GroupWindowSummary {
                count: records.len(),
                mesor: ParameterSummary::new(records.iter().map(|r| r.mesor)),
                amplitude: ParameterSummary::new(records.iter().map(|r| r.amplitude)),
                acrophase: ParameterSummary::new(records.iter().map(|r| r.acrophase)),
                group,
                window,
            })
            .collect()
    }

    /// Write the table as CSV with a header row
    pub fn write_csv<W: io::Write>(&self, writer: W) -> Result<(), csv::Error> {
        let mut wtr = csv::Writer::from_writer(writer);
        if self.is_empty() {
            wtr.write_record(Self::COLUMNS)?;
        }
        for record in self.iter() {
            wtr.serialize(record)?;
        }
        wtr.flush()?;
        Ok(())
    }
}

impl TryFrom<Vec<ResultRecord>> for ResultTable {
    type Error = TableError;

    fn try_from(records: Vec<ResultRecord>) -> Result<Self, Self::Error> {
        Self::new(records)
    }
}

impl IntoIterator for ResultTable {
    type Item = ResultRecord;
    type IntoIter = std::vec::IntoIter<ResultRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl<'a> IntoIterator for &'a ResultTable {
    type Item = &'a ResultRecord;
    type IntoIter = std::slice::Iter<'a, ResultRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Sample mean and standard deviation of a parameter
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ParameterSummary {
    pub mean: f64,
    /// Unbiased standard deviation, NaN for less than two values
    pub std: f64,
}

impl ParameterSummary {
    fn new(values: impl Iterator<Item = f64>) -> Self {
        let values: Array1<f64> = values.collect();
        let mean = values.mean().unwrap_or(f64::NAN);
        let std = if values.len() > 1 {
            values.std(1.0)
        } else {
            f64::NAN
        };
        Self { mean, std }
    }
}

/// Parameters of one group in one window
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GroupWindowSummary {
    pub group: String,
    pub window: AnalysisWindow,
    pub count: usize,
    pub mesor: ParameterSummary,
    pub amplitude: ParameterSummary,
    pub acrophase: ParameterSummary,
}
