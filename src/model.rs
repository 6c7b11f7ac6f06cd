use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Memory metric recorded for each operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
pub enum MemMetric {
    #[serde(rename = "maxHeap")]
    #[value(name = "heap", alias = "maxHeap")]
    MaxHeap,
    #[serde(rename = "maxStack")]
    #[value(name = "stack", alias = "maxStack")]
    MaxStack,
}

impl MemMetric {
    /// Field name used in the benchmark JSON.
    pub fn key(self) -> &'static str {
        match self {
            MemMetric::MaxHeap => "maxHeap",
            MemMetric::MaxStack => "maxStack",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            MemMetric::MaxHeap => MemMetric::MaxStack,
            MemMetric::MaxStack => MemMetric::MaxHeap,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    Keygen,
    Encaps,
    Decaps,
}

impl Operation {
    pub const ALL: [Operation; 3] = [Operation::Keygen, Operation::Encaps, Operation::Decaps];

    /// Field name used in the benchmark JSON.
    pub fn key(self) -> &'static str {
        match self {
            Operation::Keygen => "keygen",
            Operation::Encaps => "encaps",
            Operation::Decaps => "decaps",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Operation::Keygen => "Key generation",
            Operation::Encaps => "Encapsulation",
            Operation::Decaps => "Decapsulation",
        }
    }
}

/// Keys carrying run metadata rather than algorithm measurements.
pub fn is_metadata_key(key: &str) -> bool {
    key.starts_with("config") || key.starts_with("cpuinfo")
}

/// All records measured on one date, keyed by algorithm (or metadata) name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot(pub Map<String, Value>);

impl Snapshot {
    /// Look up one measurement. Any missing or non-numeric step on the path yields `None`.
    pub fn value(&self, algorithm: &str, op: Operation, metric: MemMetric) -> Option<f64> {
        self.0
            .get(algorithm)?
            .get(op.key())?
            .get(metric.key())?
            .as_f64()
    }

    pub fn record(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Record keys in alphabetical order.
    pub fn sorted_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.0.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    pub fn algorithm_count(&self) -> usize {
        self.0.keys().filter(|k| !is_metadata_key(k)).count()
    }
}

/// Benchmark results keyed by date, in document order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    entries: Vec<(String, Snapshot)>,
}

impl Dataset {
    pub fn new(entries: Vec<(String, Snapshot)>) -> Self {
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn dates(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(d, _)| d.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Snapshot)> {
        self.entries.iter().map(|(d, s)| (d.as_str(), s))
    }

    pub fn get(&self, date: &str) -> Option<&Snapshot> {
        self.entries
            .iter()
            .find(|(d, _)| d == date)
            .map(|(_, s)| s)
    }

    /// Scoped lookup by date; a missing date degrades to `None` like any other missing step.
    pub fn value(
        &self,
        date: &str,
        algorithm: &str,
        op: Operation,
        metric: MemMetric,
    ) -> Option<f64> {
        self.get(date)?.value(algorithm, op, metric)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn snapshot(v: Value) -> Snapshot {
        match v {
            Value::Object(m) => Snapshot(m),
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn lookup_degrades_to_none_on_missing_steps() {
        let s = snapshot(json!({
            "Kyber512": {
                "keygen": {"maxHeap": 1024, "maxStack": 5600},
                "decaps": {"maxHeap": "n/a"}
            }
        }));
        assert_eq!(
            s.value("Kyber512", Operation::Keygen, MemMetric::MaxStack),
            Some(5600.0)
        );
        assert_eq!(s.value("Kyber512", Operation::Encaps, MemMetric::MaxHeap), None);
        assert_eq!(s.value("Kyber512", Operation::Decaps, MemMetric::MaxHeap), None);
        assert_eq!(s.value("Kyber768", Operation::Keygen, MemMetric::MaxHeap), None);
    }

    #[test]
    fn sorted_keys_and_metadata_detection() {
        let s = snapshot(json!({
            "config": {"compiler": "gcc"},
            "Saber-KEM": {},
            "BIKE-L1": {},
            "cpuinfo": {}
        }));
        assert_eq!(s.sorted_keys(), vec!["BIKE-L1", "Saber-KEM", "config", "cpuinfo"]);
        assert_eq!(s.algorithm_count(), 2);
        assert!(is_metadata_key("config_build"));
        assert!(!is_metadata_key("Kyber512"));
    }

    #[test]
    fn dataset_missing_date_is_absent() {
        let ds = Dataset::new(vec![(
            "2021-01-01".into(),
            snapshot(json!({"Kyber512": {"keygen": {"maxHeap": 1}}})),
        )]);
        assert_eq!(
            ds.value("2021-01-01", "Kyber512", Operation::Keygen, MemMetric::MaxHeap),
            Some(1.0)
        );
        assert_eq!(
            ds.value("2021-02-01", "Kyber512", Operation::Keygen, MemMetric::MaxHeap),
            None
        );
    }
}
