use crate::error::{
    GatherError,
    Result,
};
use serde::{
    Deserialize,
    Serialize,
};

/// Summary of one metric's series over the lookback window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricStatistics {
    pub count: u64,
    pub average: f64,
    pub sum: f64,
    pub maximum: f64,
    pub minimum: f64,
    pub standard_deviation: f64,
}

impl MetricStatistics {
    /// Reduce a series in a single pass. Items may be plain values or `Option`s; `None` items are skipped.
    ///
    /// Fails with [`GatherError::EmptyInput`] when no value is left, so a series without data never shows up as a
    /// record of zeros.
    pub fn reduce<I>(values: I) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: Into<Option<f64>>,
    {
        let mut accumulator = StatisticsAccumulator::default();
        for value in values {
            let value: Option<f64> = value.into();
            if let Some(value) = value {
                accumulator.push(value);
            }
        }
        accumulator.finish()
    }
}

/// Running state of [`MetricStatistics::reduce`].
#[derive(Debug, Clone, Default)]
pub struct StatisticsAccumulator {
    count: u64,
    sum: f64,
    sum_of_squares: f64,
    // Seeded by the first value, not by a sentinel.
    extremes: Option<(f64, f64)>,
}

impl StatisticsAccumulator {
    pub fn push(&mut self, value: f64) {
        self.count += 1;
        self.sum += value;
        self.sum_of_squares += value * value;
        self.extremes = Some(match self.extremes {
            Some((min, max)) => (min.min(value), max.max(value)),
            None => (value, value),
        });
    }

    pub fn finish(&self) -> Result<MetricStatistics> {
        let (minimum, maximum) = self.extremes.ok_or(GatherError::EmptyInput)?;
        let count = self.count as f64;
        let average = self.sum / count;
        // Cancellation can push the variance slightly below zero.
        let variance = (self.sum_of_squares / count) - average * average;

        Ok(MetricStatistics {
            count: self.count,
            average,
            sum: self.sum,
            maximum,
            minimum,
            standard_deviation: variance.max(0.0).sqrt(),
        })
    }
}
