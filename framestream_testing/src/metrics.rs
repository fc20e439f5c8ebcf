//! Capture of counters recorded through the `metrics` facade.

use metrics_util::debugging::{DebugValue, DebuggingRecorder};

/// One counter observed by [`capture_counters`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CounterSample {
    /// Metric name.
    pub name: String,
    /// Label pairs in recording order.
    pub labels: Vec<(String, String)>,
    /// Counter value.
    pub value: u64,
}

impl CounterSample {
    /// Returns `true` if the sample carries `key=value`.
    pub fn has_label(&self, key: &str, value: &str) -> bool {
        self.labels.iter().any(|(k, v)| k == key && v == value)
    }
}

/// Run `f` with a thread-local debugging recorder and return the counters it
/// recorded.
pub fn capture_counters<F: FnOnce()>(f: F) -> Vec<CounterSample> {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    metrics::with_local_recorder(&recorder, f);

    snapshotter
        .snapshot()
        .into_vec()
        .into_iter()
        .filter_map(|(key, _, _, value)| match value {
            DebugValue::Counter(value) => Some(CounterSample {
                name: key.key().name().to_owned(),
                labels: key
                    .key()
                    .labels()
                    .map(|l| (l.key().to_owned(), l.value().to_owned()))
                    .collect(),
                value,
            }),
            _ => None,
        })
        .collect()
}

/// Sum of every sample named `name` carrying `label`, if given.
pub fn counter_total(samples: &[CounterSample], name: &str, label: Option<(&str, &str)>) -> u64 {
    samples
        .iter()
        .filter(|s| s.name == name && label.is_none_or(|(k, v)| s.has_label(k, v)))
        .map(|s| s.value)
        .sum()
}
