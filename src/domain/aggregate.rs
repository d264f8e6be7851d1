// Machine-level aggregates derived from one cycle of component readings
use super::component::{HealthBand, Readings};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthCounts {
    pub optimal: usize,
    pub warning: usize,
    pub critical: usize,
}

/// Mean of each OEE metric over the valid components.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct OeeAverage {
    pub oee: f64,
    pub availability: f64,
    pub performance: f64,
    pub quality: f64,
}

impl OeeAverage {
    /// OEE recomputed from the averaged factors. Differs in general from
    /// `oee`, which is the mean of the components' own scores.
    pub fn oee_from_factors(&self) -> f64 {
        self.availability * self.performance * self.quality / 10_000.0
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateSnapshot {
    pub overall_health: f64,
    pub counts: HealthCounts,
    pub oee_average: OeeAverage,
    /// `oee_average.oee_from_factors()`, kept next to the mean of scores.
    pub oee_from_factors: f64,
    pub valid_components: usize,
    /// Valid components whose own auto-prediction fired.
    pub predictions: usize,
}

impl AggregateSnapshot {
    pub fn overall_band(&self) -> HealthBand {
        HealthBand::from_health(self.overall_health)
    }
}

/// Combine per-component readings into machine-level figures.
///
/// Error readings and records without a health index are left out. Every mean
/// over an empty set is 0.
pub fn aggregate(readings: &Readings) -> AggregateSnapshot {
    let mut snapshot = AggregateSnapshot::default();
    let mut health_sum = 0.0;
    let mut oee_sum = OeeAverage::default();

    for (record, health) in readings.values().filter_map(|r| r.valid()) {
        snapshot.valid_components += 1;
        health_sum += health;

        match HealthBand::from_health(health) {
            HealthBand::Optimal => snapshot.counts.optimal += 1,
            HealthBand::Warning => snapshot.counts.warning += 1,
            _ => snapshot.counts.critical += 1,
        }

        if record.self_triggered() {
            snapshot.predictions += 1;
        }

        oee_sum.oee += record.metrics.oee_score;
        oee_sum.availability += record.metrics.availability_rate;
        oee_sum.performance += record.metrics.performance_rate;
        oee_sum.quality += record.metrics.quality_rate;
    }

    if snapshot.valid_components > 0 {
        let n = snapshot.valid_components as f64;
        snapshot.overall_health = health_sum / n;
        snapshot.oee_average = OeeAverage {
            oee: oee_sum.oee / n,
            availability: oee_sum.availability / n,
            performance: oee_sum.performance / n,
            quality: oee_sum.quality / n,
        };
        snapshot.oee_from_factors = snapshot.oee_average.oee_from_factors();
    }

    snapshot
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::component::{
        AutoPrediction, ComponentMetrics, ComponentName, ComponentReading, ComponentRecord,
    };

    fn readings(healths: &[(ComponentName, f64)]) -> Readings {
        healths
            .iter()
            .map(|&(name, h)| (name, ComponentReading::Record(ComponentRecord::with_health(h))))
            .collect()
    }

    #[test]
    fn test_empty_input_is_all_zero() {
        let snapshot = aggregate(&Readings::new());
        assert_eq!(snapshot, AggregateSnapshot::default());
        assert!(!snapshot.overall_health.is_nan());
    }

    #[test]
    fn test_only_errors_is_all_zero() {
        let mut input = Readings::new();
        input.insert(ComponentName::Feeder, ComponentReading::failed("timeout"));
        input.insert(ComponentName::Slotter, ComponentReading::failed("502"));
        input.insert(
            ComponentName::Stacker,
            ComponentReading::Record(ComponentRecord::default()),
        );

        let snapshot = aggregate(&input);
        assert_eq!(snapshot.overall_health, 0.0);
        assert_eq!(snapshot.counts, HealthCounts::default());
        assert_eq!(snapshot.oee_average, OeeAverage::default());
    }

    #[test]
    fn test_three_component_scenario() {
        let snapshot = aggregate(&readings(&[
            (ComponentName::PreFeeder, 90.0),
            (ComponentName::Feeder, 85.0),
            (ComponentName::Printing, 30.0),
        ]));
        assert!((snapshot.overall_health - 68.333_333).abs() < 1e-3);
        assert_eq!(
            snapshot.counts,
            HealthCounts {
                optimal: 2,
                warning: 0,
                critical: 1
            }
        );
        assert_eq!(snapshot.overall_band(), HealthBand::Warning);
    }

    #[test]
    fn test_error_entry_is_excluded_not_zeroed() {
        let mut input = readings(&[(ComponentName::Printing, 90.0)]);
        input.insert(ComponentName::Feeder, ComponentReading::failed("timeout"));

        let snapshot = aggregate(&input);
        assert_eq!(snapshot.overall_health, 90.0);
        assert_eq!(snapshot.valid_components, 1);
    }

    #[test]
    fn test_counts_partition_valid_components() {
        let cases: &[&[f64]] = &[
            &[],
            &[80.0],
            &[79.9, 60.0, 59.9],
            &[100.0, 0.0, 60.0, 80.0, 45.5],
        ];
        for healths in cases {
            let input: Readings = ComponentName::ALL
                .into_iter()
                .zip(healths.iter())
                .map(|(name, &h)| (name, ComponentReading::Record(ComponentRecord::with_health(h))))
                .collect();
            let snapshot = aggregate(&input);
            let counts = snapshot.counts;
            assert_eq!(counts.optimal + counts.warning + counts.critical, healths.len());
            assert_eq!(snapshot.valid_components, healths.len());
        }
    }

    #[test]
    fn test_overall_health_is_permutation_invariant() {
        let healths = [12.0, 99.0, 64.5, 80.0, 41.0];
        let forward: Readings = ComponentName::ALL
            .into_iter()
            .zip(healths)
            .map(|(name, h)| (name, ComponentReading::Record(ComponentRecord::with_health(h))))
            .collect();
        let reversed: Readings = ComponentName::ALL
            .into_iter()
            .zip(healths.into_iter().rev())
            .map(|(name, h)| (name, ComponentReading::Record(ComponentRecord::with_health(h))))
            .collect();

        let a = aggregate(&forward);
        let b = aggregate(&reversed);
        assert!((a.overall_health - b.overall_health).abs() < 1e-9);
        assert_eq!(a.counts, b.counts);
        assert!((a.overall_health - 59.3).abs() < 1e-9);
    }

    #[test]
    fn test_oee_average_is_mean_of_scores() {
        let record = |oee, a, p, q| {
            ComponentReading::Record(ComponentRecord {
                health_index: Some(75.0),
                metrics: ComponentMetrics {
                    oee_score: oee,
                    availability_rate: a,
                    performance_rate: p,
                    quality_rate: q,
                    rpn_score: 0.0,
                },
                ..ComponentRecord::default()
            })
        };
        let mut input = Readings::new();
        input.insert(ComponentName::Feeder, record(72.0, 90.0, 80.0, 100.0));
        input.insert(ComponentName::Printing, record(40.0, 50.0, 100.0, 80.0));

        let snapshot = aggregate(&input);
        let average = snapshot.oee_average;
        assert_eq!(average.oee, 56.0);
        assert_eq!(average.availability, 70.0);
        assert_eq!(average.performance, 90.0);
        assert_eq!(average.quality, 90.0);
        // 70 * 90 * 90 / 10000
        assert!((average.oee_from_factors() - 56.7).abs() < 1e-9);
        assert!((snapshot.oee_from_factors - 56.7).abs() < 1e-9);
        assert_ne!(average.oee, snapshot.oee_from_factors);
    }

    #[test]
    fn test_counts_self_triggered_predictions() {
        let mut input = readings(&[(ComponentName::Feeder, 95.0)]);
        input.insert(
            ComponentName::Printing,
            ComponentReading::Record(ComponentRecord {
                health_index: Some(35.0),
                auto_prediction: Some(AutoPrediction {
                    triggered: true,
                    ..AutoPrediction::default()
                }),
                ..ComponentRecord::default()
            }),
        );
        assert_eq!(aggregate(&input).predictions, 1);
    }
}
