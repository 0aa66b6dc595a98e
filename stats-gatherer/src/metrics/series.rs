use chrono::{
    DateTime,
    Utc,
};

/// One datapoint of a series. Graphite reports `null` for slots without data.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// Seconds since the unix epoch.
    pub timestamp: i64,
    pub value: Option<f64>,
}

impl Sample {
    pub fn new(timestamp: i64, value: impl Into<Option<f64>>) -> Self {
        Self {
            timestamp,
            value: value.into(),
        }
    }

    pub fn time(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.timestamp, 0)
    }
}
