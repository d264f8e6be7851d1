// Auto-prediction trigger for machine-wide maintenance estimates
use super::component::{ComponentName, Readings};
use super::duration::format_hours;
use serde::Serialize;

/// Overall health at or below this value raises the maintenance alert.
pub const AUTO_PREDICTION_THRESHOLD: f64 = 40.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CriticalComponent {
    pub name: ComponentName,
    pub health: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PredictionSource {
    Backend { component: ComponentName },
    Heuristic,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AutoPredictionState {
    pub overall_health: f64,
    pub triggered: bool,
    pub critical_components: Vec<CriticalComponent>,
    pub prediction_formatted: String,
    pub source: PredictionSource,
    pub component_count: usize,
    pub critical_count: usize,
}

/// Evaluate the trigger for one cycle. `None` when nothing fired or no
/// component reported a usable health index.
pub fn evaluate(readings: &Readings) -> Option<AutoPredictionState> {
    let valid: Vec<_> = readings
        .iter()
        .filter_map(|(&name, reading)| reading.valid().map(|(record, health)| (name, record, health)))
        .collect();

    if valid.is_empty() {
        return None;
    }

    let overall_health = valid.iter().map(|(_, _, h)| h).sum::<f64>() / valid.len() as f64;

    // Lowest-health component among those whose own trigger fired
    let most_critical = valid
        .iter()
        .filter(|(_, record, _)| record.self_triggered())
        .min_by(|a, b| a.2.total_cmp(&b.2));

    if most_critical.is_none() && overall_health > AUTO_PREDICTION_THRESHOLD {
        return None;
    }

    let backend_estimate = most_critical.and_then(|(name, record, _)| {
        record
            .auto_prediction
            .as_ref()
            .and_then(|p| p.successful_estimate())
            .map(|estimate| (*name, estimate.to_string()))
    });

    let (prediction_formatted, source) = match backend_estimate {
        Some((component, estimate)) => (estimate, PredictionSource::Backend { component }),
        None => (
            format_hours(heuristic_hours(overall_health)),
            PredictionSource::Heuristic,
        ),
    };

    let critical_components: Vec<CriticalComponent> = valid
        .iter()
        .filter(|(_, _, h)| *h <= AUTO_PREDICTION_THRESHOLD)
        .map(|&(name, _, health)| CriticalComponent { name, health })
        .collect();

    Some(AutoPredictionState {
        overall_health,
        triggered: true,
        critical_count: critical_components.len(),
        critical_components,
        prediction_formatted,
        source,
        component_count: valid.len(),
    })
}

/// Fallback estimate: one hour per ten points of lost health, rounded up.
pub fn heuristic_hours(overall_health: f64) -> u64 {
    ((100.0 - overall_health) / 10.0).ceil().max(0.0) as u64
}

/// The current alert plus the user's dismissal of it.
#[derive(Debug, Clone, Default)]
pub struct PredictionAlert {
    state: Option<AutoPredictionState>,
    dismissed: bool,
}

impl PredictionAlert {
    /// Re-evaluate after a poll cycle. A fresh trigger (not triggered on the
    /// previous cycle) always re-surfaces the alert.
    pub fn update(&mut self, readings: &Readings) {
        let next = evaluate(readings);
        if next.is_some() && self.state.is_none() {
            self.dismissed = false;
        }
        self.state = next;
    }

    pub fn dismiss(&mut self) {
        self.dismissed = true;
    }

    pub fn state(&self) -> Option<&AutoPredictionState> {
        self.state.as_ref()
    }

    pub fn visible(&self, notifications_enabled: bool) -> Option<&AutoPredictionState> {
        if !notifications_enabled || self.dismissed {
            return None;
        }
        self.state.as_ref()
    }
}
