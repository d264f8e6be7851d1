// Machine component domain model
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Lower bound (inclusive) of the optimal health band.
pub const OPTIMAL_THRESHOLD: f64 = 80.0;
/// Lower bound (inclusive) of the warning health band.
pub const WARNING_THRESHOLD: f64 = 60.0;

/// The five stages of the flexo line, in machine order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ComponentName {
    #[serde(rename = "Pre-Feeder")]
    PreFeeder,
    Feeder,
    Printing,
    Slotter,
    Stacker,
}

impl ComponentName {
    pub const ALL: [ComponentName; 5] = [
        ComponentName::PreFeeder,
        ComponentName::Feeder,
        ComponentName::Printing,
        ComponentName::Slotter,
        ComponentName::Stacker,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentName::PreFeeder => "Pre-Feeder",
            ComponentName::Feeder => "Feeder",
            ComponentName::Printing => "Printing",
            ComponentName::Slotter => "Slotter",
            ComponentName::Stacker => "Stacker",
        }
    }
}

impl fmt::Display for ComponentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown machine component: {0}")]
pub struct UnknownComponent(pub String);

impl FromStr for ComponentName {
    type Err = UnknownComponent;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ComponentName::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownComponent(s.to_string()))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComponentMetrics {
    #[serde(default)]
    pub oee_score: f64,
    #[serde(default)]
    pub availability_rate: f64,
    #[serde(default)]
    pub performance_rate: f64,
    #[serde(default)]
    pub quality_rate: f64,
    #[serde(default)]
    pub rpn_score: f64,
}

impl ComponentMetrics {
    /// OEE recomputed as availability × performance × quality, all in percent.
    /// Reported alongside the backend's `oee_score`, never in place of it.
    pub fn oee_from_factors(&self) -> f64 {
        self.availability_rate * self.performance_rate * self.quality_rate / 10_000.0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub prediction: Option<f64>,
    #[serde(default)]
    pub prediction_formatted: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AutoPrediction {
    #[serde(default)]
    pub triggered: bool,
    #[serde(default)]
    pub trigger_threshold: f64,
    #[serde(default)]
    pub prediction_result: Option<PredictionResult>,
}

impl AutoPrediction {
    /// The backend's formatted estimate, only when its prediction succeeded.
    pub fn successful_estimate(&self) -> Option<&str> {
        self.prediction_result
            .as_ref()
            .filter(|r| r.success)
            .and_then(|r| r.prediction_formatted.as_deref())
    }
}

/// Latest telemetry snapshot for one component, as served by `GET /health/{name}`.
/// Every field is optional on the wire; missing values fall back to defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComponentRecord {
    #[serde(default)]
    pub component_name: Option<String>,
    #[serde(default)]
    pub health_index: Option<f64>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub metrics: ComponentMetrics,
    #[serde(default)]
    pub auto_prediction: Option<AutoPrediction>,
    #[serde(default)]
    pub recommendations: Vec<serde_json::Value>,
}

impl ComponentRecord {
    #[cfg(test)]
    pub fn with_health(health_index: f64) -> Self {
        Self {
            health_index: Some(health_index),
            ..Self::default()
        }
    }

    /// Health index usable for numeric aggregates.
    pub fn health(&self) -> Option<f64> {
        self.health_index.filter(|h| h.is_finite())
    }

    pub fn self_triggered(&self) -> bool {
        self.auto_prediction.as_ref().is_some_and(|p| p.triggered)
    }
}

/// Outcome of fetching one component during a poll cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ComponentReading {
    Record(ComponentRecord),
    Failed { error: String },
}

impl ComponentReading {
    pub fn failed(error: impl Into<String>) -> Self {
        ComponentReading::Failed {
            error: error.into(),
        }
    }

    pub fn record(&self) -> Option<&ComponentRecord> {
        match self {
            ComponentReading::Record(record) => Some(record),
            ComponentReading::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            ComponentReading::Record(_) => None,
            ComponentReading::Failed { error } => Some(error),
        }
    }

    /// A non-error reading that carries a health index.
    pub fn valid(&self) -> Option<(&ComponentRecord, f64)> {
        let record = self.record()?;
        record.health().map(|h| (record, h))
    }

    pub fn band(&self) -> HealthBand {
        match self {
            ComponentReading::Failed { .. } => HealthBand::Error,
            ComponentReading::Record(record) => {
                HealthBand::from_health(record.health().unwrap_or(0.0))
            }
        }
    }
}

/// One poll cycle's worth of readings, keyed by component.
pub type Readings = BTreeMap<ComponentName, ComponentReading>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthBand {
    Optimal,
    Warning,
    Critical,
    Error,
}

impl HealthBand {
    pub fn from_health(health: f64) -> Self {
        if health >= OPTIMAL_THRESHOLD {
            HealthBand::Optimal
        } else if health >= WARNING_THRESHOLD {
            HealthBand::Warning
        } else {
            HealthBand::Critical
        }
    }
}
