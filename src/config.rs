use crate::error::ConfigError;
use crate::fit::CosinorFit;
use crate::groups::GroupConfig;
use crate::model::AcrophaseNormalization;
use crate::window::{AnalysisWindow, WindowSpan};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Settings of a cohort analysis
///
/// Every field has a default, so a JSON document only needs to list what differs, e.g.
/// `{"groups": {"treatment": {"label": "TBI", "animals": [2, 3]}, "control": {"label":
/// "Sham", "animals": [1, 4]}}}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct AnalysisConfig {
    pub groups: GroupConfig,
    pub before: WindowSpan,
    pub after: WindowSpan,
    pub acrophase: AcrophaseNormalization,
    pub fit: CosinorFit,
}

impl AnalysisConfig {
    pub fn span(&self, window: AnalysisWindow) -> WindowSpan {
        match window {
            AnalysisWindow::Before => self.before,
            AnalysisWindow::After => self.after,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.groups.validate()?;
        Ok(())
    }

    /// Parse and validate a JSON configuration
    pub fn from_json(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(AnalysisConfig)
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            groups: GroupConfig::default(),
            before: WindowSpan::default_before(),
            after: WindowSpan::default_after(),
            acrophase: AcrophaseNormalization::default(),
            fit: CosinorFit::default(),
        }
    }
}
