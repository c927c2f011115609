#![doc = include_str!("../README.md")]

mod analysis;
pub use analysis::{AnalysisReport, CohortAnalysis, Diagnostic, DiagnosticKind, UnitOutcome};

mod config;
pub use config::AnalysisConfig;

mod error;
pub use error::{
    ConfigError, FitError, GroupConfigError, TableError, TimeSeriesError, WindowError,
};

mod fit;
pub use fit::{CosinorFit, CosinorFitResult};

mod groups;
pub use groups::{Group, GroupConfig, GroupLabel, UnmatchedPolicy};

pub mod model;
pub use model::{AcrophaseNormalization, CosinorParams, PERIOD_HOURS, cosinor};

pub mod nl_fit;
pub use nl_fit::{CobylaCurveFit, CurveFitAlgorithm, LmCurveFit};

mod table;
pub use table::{GroupWindowSummary, ParameterSummary, ResultRecord, ResultTable};

mod time_series;
pub use time_series::TimeSeries;

mod types;
pub use types::{AnimalId, Cohort, EventDates, ExperimentId};

mod window;
pub use window::{AnalysisWindow, EventDate, ParseWindowModeError, WindowMode, WindowSpan, select};

pub use chrono;
pub use ndarray;
