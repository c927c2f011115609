//! Cohort-wide cosinor analysis
//!
//! [CohortAnalysis::analyze] walks every animal, experiment and requested window, selects the
//! window samples around the animal's event date and fits the cosinor model to them. Failures
//! are contained in their (animal, experiment, window) unit: the unit produces a [Diagnostic]
//! instead of a [ResultRecord] and the run continues.

use crate::config::AnalysisConfig;
use crate::error::{ConfigError, FitError, WindowError};
use crate::table::{ResultRecord, ResultTable};
use crate::time_series::TimeSeries;
use crate::types::{AnimalId, Cohort, EventDates, ExperimentId};
use crate::window::{AnalysisWindow, EventDate, WindowMode, select};

use log::{info, warn};
use std::fmt;

/// Why a unit of the analysis produced no record
#[derive(Clone, Debug, PartialEq)]
pub enum DiagnosticKind {
    /// Event date of the animal is missing or can't be parsed
    InvalidEventDate(WindowError),
    /// The window around the event date leaves the supported calendar range
    WindowOutOfRange(WindowError),
    /// No samples in the window, nothing to fit
    EmptyWindow,
    /// The window has fewer samples than the model has parameters
    ShortTimeSeries(FitError),
    /// The optimizer didn't converge, carries the solver's message
    ConvergenceFailure(FitError),
    /// The animal belongs to neither of the configured groups
    UngroupedAnimal,
}

/// Structured report of a skipped analysis unit
#[derive(Clone, Debug, PartialEq)]
pub struct Diagnostic {
    pub animal: AnimalId,
    /// `None` if the whole animal is skipped
    pub experiment: Option<ExperimentId>,
    /// `None` if all windows of the experiment are skipped
    pub window: Option<AnalysisWindow>,
    pub kind: DiagnosticKind,
}

impl Diagnostic {
    /// `false` for an empty window, which is an expected outcome rather than an error
    pub fn is_failure(&self) -> bool {
        !matches!(self.kind, DiagnosticKind::EmptyWindow)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "animal {}", self.animal)?;
        if let Some(experiment) = self.experiment {
            write!(f, " experiment {experiment}")?;
        }
        if let Some(window) = self.window {
            write!(f, " ({window} window)")?;
        }
        match &self.kind {
            DiagnosticKind::InvalidEventDate(e) | DiagnosticKind::WindowOutOfRange(e) => {
                write!(f, ": {e}")
            }
            DiagnosticKind::EmptyWindow => write!(f, ": no samples in the window"),
            DiagnosticKind::ShortTimeSeries(e) | DiagnosticKind::ConvergenceFailure(e) => {
                write!(f, ": curve fitting failed: {e}")
            }
            DiagnosticKind::UngroupedAnimal => write!(f, ": animal is in neither of the groups"),
        }
    }
}

/// Result of a cohort analysis: fitted records and everything that was skipped
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AnalysisReport {
    pub records: ResultTable,
    pub diagnostics: Vec<Diagnostic>,
}

impl AnalysisReport {
    pub fn failures(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.is_failure())
    }
}

/// Outcome of a single (animal, experiment, window) unit
pub type UnitOutcome = Result<ResultRecord, DiagnosticKind>;

/// Group analysis orchestrator
#[derive(Clone, Debug, Default)]
pub struct CohortAnalysis {
    config: AnalysisConfig,
}

impl CohortAnalysis {
    /// Create a new [CohortAnalysis], fails if the group configuration is invalid
    pub fn new(config: AnalysisConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Fit every animal, experiment and window of `mode`
    ///
    /// Records are ordered by animal, then experiment, then window. Animals without an entry in
    /// `event_dates` are treated as having a missing event date.
    pub fn analyze(
        &self,
        cohort: &Cohort,
        event_dates: &EventDates,
        mode: WindowMode,
    ) -> AnalysisReport {
        let mut records = vec![];
        let mut diagnostics = vec![];

        for (&animal, experiments) in cohort {
            let Some(group) = self.config.groups.label_of(animal) else {
                let diagnostic = Diagnostic {
                    animal,
                    experiment: None,
                    window: None,
                    kind: DiagnosticKind::UngroupedAnimal,
                };
                warn!("{diagnostic}");
                diagnostics.push(diagnostic);
                continue;
            };
            let event_date = event_dates.get(&animal).cloned().unwrap_or_default();

            for (&experiment, ts) in experiments {
                for &window in mode.windows() {
                    match self.analyze_unit(animal, group, experiment, ts, &event_date, window) {
                        Ok(record) => records.push(record),
                        Err(kind) => {
                            let diagnostic = Diagnostic {
                                animal,
                                experiment: Some(experiment),
                                window: Some(window),
                                kind,
                            };
                            if diagnostic.is_failure() {
                                warn!("{diagnostic}");
                            }
                            diagnostics.push(diagnostic);
                        }
                    }
                }
            }
        }

        let report = AnalysisReport {
            records: ResultTable::from_unique(records),
            diagnostics,
        };
        info!(
            "cosinor analysis of {} animals: {} records, {} failures",
            cohort.len(),
            report.records.len(),
            report.failures().count(),
        );
        report
    }

    /// Select one window of one experiment and fit it
    ///
    /// Units don't share any state, so they may be evaluated in any order or in parallel.
    pub fn analyze_unit(
        &self,
        animal: AnimalId,
        group: &str,
        experiment: ExperimentId,
        ts: &TimeSeries,
        event_date: &EventDate,
        window: AnalysisWindow,
    ) -> UnitOutcome {
        let windowed =
            select(ts, event_date, self.config.span(window)).map_err(|e| match e {
                WindowError::InvalidEventDate { .. } => DiagnosticKind::InvalidEventDate(e),
                WindowError::SpanOutOfRange { .. } => DiagnosticKind::WindowOutOfRange(e),
            })?;
        if windowed.is_empty() {
            return Err(DiagnosticKind::EmptyWindow);
        }
        let fit = self.config.fit.fit(&windowed).map_err(|e| match e {
            FitError::ShortTimeSeries { .. } => DiagnosticKind::ShortTimeSeries(e),
            FitError::ConvergenceFailure { .. } => DiagnosticKind::ConvergenceFailure(e),
        })?;
        let params = fit.params.normalized(self.config.acrophase);
        Ok(ResultRecord {
            animal,
            group: group.to_owned(),
            experiment,
            window,
            mesor: params.mesor,
            amplitude: params.amplitude,
            acrophase: params.acrophase,
        })
    }
}
