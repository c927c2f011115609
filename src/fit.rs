//! Cosinor fit of a windowed temperature series

use crate::error::FitError;
use crate::model::{CosinorModel, CosinorParams, NPARAMS};
use crate::nl_fit::{CurveFitAlgorithm, CurveFitTrait, Data};
use crate::time_series::TimeSeries;

use log::debug;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;
use std::rc::Rc;

/// Successful cosinor fit
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CosinorFitResult {
    pub params: CosinorParams,
    pub reduced_chi2: f64,
    /// Number of model evaluations spent by the optimizer
    pub nevaluations: usize,
}

/// Fit engine: non-linear least-squares fit of the 24-hour cosinor model
///
/// Time is measured in hours from the first sample of the given series, so two windows of the
/// same animal do not share a time axis. Acrophase is reported as found by the optimizer.
/// Bounded algorithms search inside [CosinorFit::bounds].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CosinorFit {
    algorithm: CurveFitAlgorithm,
}

impl CosinorFit {
    pub fn new(algorithm: CurveFitAlgorithm) -> Self {
        Self { algorithm }
    }

    pub fn algorithm(&self) -> &CurveFitAlgorithm {
        &self.algorithm
    }

    /// Minimum number of samples, one per parameter
    pub const fn min_ts_length() -> usize {
        NPARAMS
    }

    /// Mean temperature as mesor, half of the range as amplitude, zero acrophase
    ///
    /// Returns `None` for an empty series.
    pub fn initial_guess(ts: &TimeSeries) -> Option<CosinorParams> {
        let mesor = ts.mean()?;
        let (min, max) = ts.min_max()?;
        Some(CosinorParams::new(mesor, 0.5 * (max - min), 0.0))
    }

    /// Lower and upper parameter limits around the series
    ///
    /// Mesor and amplitude may move ten data ranges (plus one degree) away from the initial
    /// guess, acrophase is limited to one turn in either direction. Returns `None` for an empty
    /// series.
    pub fn bounds(ts: &TimeSeries) -> Option<([f64; NPARAMS], [f64; NPARAMS])> {
        let mesor = ts.mean()?;
        let (min, max) = ts.min_max()?;
        let scale = 10.0 * (max - min) + 1.0;
        Some((
            [mesor - scale, -scale, -TAU],
            [mesor + scale, scale, TAU],
        ))
    }

    pub fn fit(&self, ts: &TimeSeries) -> Result<CosinorFitResult, FitError> {
        if ts.len() < Self::min_ts_length() {
            return Err(FitError::ShortTimeSeries {
                actual: ts.len(),
                minimum: Self::min_ts_length(),
            });
        }
        let empty = || FitError::ShortTimeSeries {
            actual: 0,
            minimum: Self::min_ts_length(),
        };
        let x0: [f64; NPARAMS] = Self::initial_guess(ts).ok_or_else(empty)?.into();
        let (lower, upper) = Self::bounds(ts).ok_or_else(empty)?;

        let data = Rc::new(Data::new(ts.elapsed_hours(), ts.temperatures().to_owned()));
        let result = self.algorithm.curve_fit(
            data,
            &x0,
            (&lower, &upper),
            CosinorModel::model,
            CosinorModel::derivatives,
        );

        let finite = result.x.iter().all(|x| x.is_finite());
        if !result.success || !finite {
            let diagnostic = if finite {
                result.message
            } else {
                format!("non-finite parameters {:?}: {}", result.x, result.message)
            };
            return Err(FitError::ConvergenceFailure { diagnostic });
        }
        debug!(
            "cosinor fit of {} samples converged after {} evaluations: {}",
            ts.len(),
            result.nevaluations,
            result.message
        );
        Ok(CosinorFitResult {
            params: result.x.into(),
            reduced_chi2: result.reduced_chi2,
            nevaluations: result.nevaluations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::cosinor;
    use crate::nl_fit::{CobylaCurveFit, LmCurveFit};

    use approx::assert_abs_diff_eq;
    use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
    use rand::prelude::*;
    use rand_distr::StandardNormal;
    use std::f64::consts::TAU;

    fn start() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2023, 11, 2)
            .unwrap()
            .and_hms_opt(7, 0, 0)
            .unwrap()
    }

    fn hourly_series(n: usize, f: impl Fn(f64) -> f64) -> TimeSeries {
        TimeSeries::from_samples((0..n).map(|i| {
            let t = start() + TimeDelta::hours(i as i64);
            (t, f(i as f64))
        }))
        .unwrap()
    }

    #[test]
    fn initial_guess() {
        let ts = hourly_series(4, |t| [36.0, 37.0, 38.0, 37.0][t as usize]);
        let guess = CosinorFit::initial_guess(&ts).unwrap();
        assert_eq!(guess, CosinorParams::new(37.0, 1.0, 0.0));
        assert_eq!(CosinorFit::initial_guess(&TimeSeries::empty()), None);
    }

    #[test]
    fn noiseless_six_days() {
        let ts = hourly_series(6 * 24 + 1, |t| cosinor(t, 37.0, 0.5, 0.3));
        let result = CosinorFit::default().fit(&ts).unwrap();
        assert_abs_diff_eq!(result.params.mesor, 37.0, epsilon = 1e-6);
        assert_abs_diff_eq!(result.params.amplitude, 0.5, epsilon = 1e-6);
        assert_abs_diff_eq!(result.params.acrophase, 0.3, epsilon = 1e-6);
        assert!(result.reduced_chi2 < 1e-12);
    }

    #[test]
    fn noisy_six_days() {
        const NOISE: f64 = 0.05;

        let mut rng = StdRng::seed_from_u64(0);
        let ts = hourly_series(6 * 24 + 1, |t| cosinor(t, 37.0, 0.5, 0.3));
        let noisy = TimeSeries::from_samples(ts.samples().map(|(t, m)| {
            let eps: f64 = rng.sample(StandardNormal);
            (t, m + NOISE * eps)
        }))
        .unwrap();

        let result = CosinorFit::default().fit(&noisy).unwrap();
        assert_abs_diff_eq!(result.params.mesor, 37.0, epsilon = 0.02);
        assert_abs_diff_eq!(result.params.amplitude, 0.5, epsilon = 0.03);
        assert_abs_diff_eq!(result.params.acrophase, 0.3, epsilon = 0.05);
    }

    #[test]
    fn time_is_relative_to_first_sample() {
        // Same curve observed from a later start has a shifted acrophase
        let shift = 6.0;
        let ts = hourly_series(48, |t| cosinor(t + shift, 37.0, 0.5, 0.3));
        let params = CosinorFit::default().fit(&ts).unwrap().params.canonical();
        let expected = (0.3 - TAU * shift / 24.0).rem_euclid(TAU);
        assert_abs_diff_eq!(params.amplitude, 0.5, epsilon = 1e-6);
        assert_abs_diff_eq!(params.acrophase, expected, epsilon = 1e-6);
    }

    #[test]
    fn irregular_sampling() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut minutes: Vec<i64> = (0..300).map(|_| rng.random_range(0..3 * 24 * 60)).collect();
        minutes.sort_unstable();
        let ts = TimeSeries::from_samples(minutes.iter().map(|&m| {
            let hours = m as f64 / 60.0;
            (
                start() + TimeDelta::minutes(m),
                cosinor(hours - minutes[0] as f64 / 60.0, 36.8, 0.7, 1.2),
            )
        }))
        .unwrap();
        let params = CosinorFit::default().fit(&ts).unwrap().params.canonical();
        assert_abs_diff_eq!(params.mesor, 36.8, epsilon = 1e-6);
        assert_abs_diff_eq!(params.amplitude, 0.7, epsilon = 1e-6);
        assert_abs_diff_eq!(params.acrophase, 1.2, epsilon = 1e-6);
    }

    #[test]
    fn constant_series() {
        let ts = hourly_series(72, |_| 36.6);
        match CosinorFit::default().fit(&ts) {
            Ok(result) => {
                assert_abs_diff_eq!(result.params.mesor, 36.6, epsilon = 1e-9);
                assert_abs_diff_eq!(result.params.amplitude, 0.0, epsilon = 1e-9);
            }
            Err(err) => assert!(matches!(err, FitError::ConvergenceFailure { .. })),
        }
    }

    #[test]
    fn short_series() {
        let ts = hourly_series(2, |t| 36.0 + t);
        assert_eq!(
            CosinorFit::default().fit(&ts),
            Err(FitError::ShortTimeSeries {
                actual: 2,
                minimum: 3
            })
        );
        assert!(matches!(
            CosinorFit::default().fit(&TimeSeries::empty()),
            Err(FitError::ShortTimeSeries { actual: 0, .. })
        ));
    }

    #[test]
    fn convergence_failure_carries_diagnostic() {
        let ts = hourly_series(48, |t| 37.0 + 0.1 * t);
        let fitter = CosinorFit::new(LmCurveFit::new(1, 0.0, 0.0, 0.0).into());
        match fitter.fit(&ts) {
            Err(FitError::ConvergenceFailure { diagnostic }) => {
                assert!(diagnostic.contains("maximum number of iterations"), "{diagnostic}");
            }
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn cobyla_with_lm_fine_tuning() {
        let ts = hourly_series(6 * 24 + 1, |t| cosinor(t, 37.0, 0.5, 0.3));
        let cobyla = CobylaCurveFit::new(
            300,
            0.5,
            1e-6,
            1e-4,
            Some(LmCurveFit::default().into()),
        );
        let result = CosinorFit::new(cobyla.into()).fit(&ts).unwrap();
        assert_abs_diff_eq!(result.params.acrophase, 0.3, epsilon = 1e-6);
    }

    #[test]
    fn cobyla_converges_inside_bounds() {
        let ts = hourly_series(6 * 24 + 1, |t| cosinor(t, 37.0, 0.5, 0.3));
        let (lower, upper) = CosinorFit::bounds(&ts).unwrap();
        let result = CosinorFit::new(CobylaCurveFit::default().into())
            .fit(&ts)
            .unwrap();
        let x: [f64; NPARAMS] = result.params.into();
        for ((x, lo), hi) in x.into_iter().zip(lower).zip(upper) {
            assert!(lo < x && x < hi);
        }
        assert_abs_diff_eq!(result.params.canonical().acrophase, 0.3, epsilon = 1e-4);
        assert!(result.nevaluations < CobylaCurveFit::default_niterations() as usize);
    }

    #[test]
    fn bounds() {
        let ts = hourly_series(4, |t| [36.0, 37.0, 38.0, 37.0][t as usize]);
        let (lower, upper) = CosinorFit::bounds(&ts).unwrap();
        assert_eq!(lower, [16.0, -21.0, -TAU]);
        assert_eq!(upper, [58.0, 21.0, TAU]);
        assert!(CosinorFit::bounds(&TimeSeries::empty()).is_none());
    }
}
