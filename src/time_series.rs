use crate::error::TimeSeriesError;

use chrono::NaiveDateTime;
use itertools::{Itertools, MinMaxResult};
use ndarray::{Array1, ArrayView1};

const SECONDS_PER_HOUR: f64 = 3600.0;

/// Temperature time series of a single animal and experiment
///
/// Timestamps are non-decreasing and every temperature is finite, both are checked on
/// construction. The series is never mutated afterwards, windowing produces a new one.
#[derive(Clone, Debug, PartialEq)]
pub struct TimeSeries {
    t: Vec<NaiveDateTime>,
    m: Array1<f64>,
}

impl TimeSeries {
    /// Construct [TimeSeries] from timestamps and temperatures
    pub fn new(
        t: impl Into<Vec<NaiveDateTime>>,
        m: impl Into<Array1<f64>>,
    ) -> Result<Self, TimeSeriesError> {
        let t = t.into();
        let m = m.into();
        if t.len() != m.len() {
            return Err(TimeSeriesError::LengthMismatch {
                t: t.len(),
                m: m.len(),
            });
        }
        if let Some((index, _)) = t.iter().tuple_windows().find_position(|(a, b)| b < a) {
            return Err(TimeSeriesError::Unsorted { index: index + 1 });
        }
        if let Some(index) = m.iter().position(|x| !x.is_finite()) {
            return Err(TimeSeriesError::NonFinite { index });
        }
        Ok(Self { t, m })
    }

    /// Construct [TimeSeries] from `(timestamp, temperature)` pairs
    pub fn from_samples(
        samples: impl IntoIterator<Item = (NaiveDateTime, f64)>,
    ) -> Result<Self, TimeSeriesError> {
        let (t, m): (Vec<_>, Vec<_>) = samples.into_iter().unzip();
        Self::new(t, m)
    }

    pub fn empty() -> Self {
        Self {
            t: vec![],
            m: Array1::zeros(0),
        }
    }

    pub fn len(&self) -> usize {
        self.t.len()
    }

    pub fn is_empty(&self) -> bool {
        self.t.is_empty()
    }

    pub fn timestamps(&self) -> &[NaiveDateTime] {
        &self.t
    }

    pub fn temperatures(&self) -> ArrayView1<'_, f64> {
        self.m.view()
    }

    pub fn samples(&self) -> impl Iterator<Item = (NaiveDateTime, f64)> + '_ {
        self.t.iter().copied().zip(self.m.iter().copied())
    }

    pub fn first_timestamp(&self) -> Option<NaiveDateTime> {
        self.t.first().copied()
    }

    pub fn last_timestamp(&self) -> Option<NaiveDateTime> {
        self.t.last().copied()
    }

    /// Hours elapsed since the first sample of this series
    pub fn elapsed_hours(&self) -> Array1<f64> {
        match self.first_timestamp() {
            Some(t0) => self
                .t
                .iter()
                .map(|&t| {
                    let dt = t - t0;
                    dt.num_milliseconds() as f64 / (1e3 * SECONDS_PER_HOUR)
                })
                .collect(),
            None => Array1::zeros(0),
        }
    }

    pub fn mean(&self) -> Option<f64> {
        self.m.mean()
    }

    /// Minimum and maximum temperature
    pub fn min_max(&self) -> Option<(f64, f64)> {
        match self.m.iter().copied().minmax_by(f64::total_cmp) {
            MinMaxResult::NoElements => None,
            MinMaxResult::OneElement(x) => Some((x, x)),
            MinMaxResult::MinMax(min, max) => Some((min, max)),
        }
    }

    /// Sub-series with timestamps in `[start, end]`, both ends included
    pub fn slice_between(&self, start: NaiveDateTime, end: NaiveDateTime) -> Self {
        let begin = self.t.partition_point(|&t| t < start);
        let finish = self.t.partition_point(|&t| t <= end).max(begin);
        Self {
            t: self.t[begin..finish].to_vec(),
            m: self.m.slice(ndarray::s![begin..finish]).to_owned(),
        }
    }
}
