// Rolling history buffers for trend charts
use super::aggregate::{AggregateSnapshot, OeeAverage};
use super::component::{ComponentName, ComponentReading, Readings};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::{BTreeMap, VecDeque};

pub const HISTORY_CAPACITY: usize = 50;

/// Fixed-capacity FIFO. Pushing onto a full series drops the oldest sample.
#[derive(Debug, Clone, PartialEq)]
pub struct HistorySeries<T> {
    capacity: usize,
    samples: VecDeque<T>,
}

impl<T> HistorySeries<T> {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            samples: VecDeque::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, sample: T) {
        self.samples.push_back(sample);
        while self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
    }

    pub fn last(&self) -> Option<&T> {
        self.samples.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.samples.iter()
    }
}

#[cfg(test)]
impl<T: Clone> HistorySeries<T> {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.samples.iter().cloned().collect()
    }
}

impl<T> Default for HistorySeries<T> {
    fn default() -> Self {
        Self::new(HISTORY_CAPACITY)
    }
}

impl<T: Serialize> Serialize for HistorySeries<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

/// What a series receives on a cycle where its component has no usable record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GapPolicy {
    /// Repeat the previous sample so series stay aligned with the timestamps.
    #[default]
    CarryForward,
    /// Append nothing; series lengths may drift apart.
    Skip,
}

#[derive(Debug, Clone, Serialize)]
pub struct HistoryBook {
    #[serde(skip)]
    policy: GapPolicy,
    health: BTreeMap<ComponentName, HistorySeries<f64>>,
    oee: HistorySeries<OeeAverage>,
    timestamps: HistorySeries<String>,
}

impl HistoryBook {
    pub fn new(components: &[ComponentName], capacity: usize, policy: GapPolicy) -> Self {
        Self {
            policy,
            health: components
                .iter()
                .map(|&name| (name, HistorySeries::new(capacity)))
                .collect(),
            oee: HistorySeries::new(capacity),
            timestamps: HistorySeries::new(capacity),
        }
    }

    /// Advance every series by one poll cycle.
    pub fn record_cycle(
        &mut self,
        readings: &Readings,
        snapshot: &AggregateSnapshot,
        label: impl Into<String>,
    ) {
        for (name, series) in self.health.iter_mut() {
            // A record without a health index still plots, as zero.
            let sample = readings
                .get(name)
                .and_then(ComponentReading::record)
                .map(|record| record.health().unwrap_or(0.0));

            match (sample, self.policy) {
                (Some(value), _) => series.push(value),
                (None, GapPolicy::CarryForward) => {
                    if let Some(&previous) = series.last() {
                        series.push(previous);
                    }
                }
                (None, GapPolicy::Skip) => {}
            }
        }

        if snapshot.valid_components > 0 {
            self.oee.push(snapshot.oee_average);
        } else if self.policy == GapPolicy::CarryForward {
            if let Some(&previous) = self.oee.last() {
                self.oee.push(previous);
            }
        }

        self.timestamps.push(label.into());
    }
}

#[cfg(test)]
impl HistoryBook {
    pub fn health(&self, name: ComponentName) -> Option<&HistorySeries<f64>> {
        self.health.get(&name)
    }

    pub fn oee(&self) -> &HistorySeries<OeeAverage> {
        &self.oee
    }

    pub fn timestamps(&self) -> &HistorySeries<String> {
        &self.timestamps
    }
}
