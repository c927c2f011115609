use crate::nl_fit::curve_fit::{CurveFitAlgorithm, CurveFitResult, CurveFitTrait};
use crate::nl_fit::data::Data;

use cobyla::{FailStatus, Func, RhoBeg, StopTols, SuccessStatus, minimize};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::rc::Rc;

/// COBYLA (Constrained Optimization BY Linear Approximations) least-squares wrapper
///
/// Derivative-free alternative to [LmCurveFit](crate::nl_fit::LmCurveFit), useful for short
/// or noisy windows where the Jacobian-driven steps wander off. Parameters are kept inside the
/// given bounds, the trust region shrinks from `rhobeg` down to `xtol_rel * rhobeg`.
///
/// If `fine_tuning_algorithm` is `Some`, the COBYLA solution is used as the initial guess of
/// that algorithm and its result is returned.
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename = "Cobyla")]
pub struct CobylaCurveFit {
    pub niterations: u32,
    pub rhobeg: f64,
    pub ftol_rel: f64,
    pub xtol_rel: f64,
    pub fine_tuning_algorithm: Option<Box<CurveFitAlgorithm>>,
}

impl CobylaCurveFit {
    /// Create a new [CobylaCurveFit].
    ///
    /// # Arguments
    /// - `niterations`: maximum number of function evaluations
    /// - `rhobeg`: initial change of parameters
    /// - `ftol_rel`: relative tolerance on the sum of squares
    /// - `xtol_rel`: final trust region radius relative to `rhobeg`, must be positive
    /// - `fine_tuning_algorithm`: optional algorithm to refine COBYLA's result
    pub fn new(
        niterations: u32,
        rhobeg: f64,
        ftol_rel: f64,
        xtol_rel: f64,
        fine_tuning_algorithm: Option<CurveFitAlgorithm>,
    ) -> Self {
        assert!(niterations > 0, "niterations must be positive");
        assert!(
            rhobeg.is_finite() && rhobeg > 0.0,
            "rhobeg must be finite and positive"
        );
        assert!(
            ftol_rel.is_finite() && ftol_rel >= 0.0,
            "ftol_rel must be finite and non-negative"
        );
        assert!(
            xtol_rel.is_finite() && xtol_rel > 0.0,
            "xtol_rel must be finite and positive"
        );
        Self {
            niterations,
            rhobeg,
            ftol_rel,
            xtol_rel,
            fine_tuning_algorithm: fine_tuning_algorithm.map(|x| x.into()),
        }
    }

    #[inline]
    pub fn default_niterations() -> u32 {
        2000
    }

    #[inline]
    pub fn default_rhobeg() -> f64 {
        0.5
    }

    #[inline]
    pub fn default_ftol_rel() -> f64 {
        1e-10
    }

    #[inline]
    pub fn default_xtol_rel() -> f64 {
        1e-8
    }

    #[inline]
    pub fn default_fine_tuning_algorithm() -> Option<CurveFitAlgorithm> {
        None
    }
}

impl Default for CobylaCurveFit {
    fn default() -> Self {
        Self::new(
            Self::default_niterations(),
            Self::default_rhobeg(),
            Self::default_ftol_rel(),
            Self::default_xtol_rel(),
            Self::default_fine_tuning_algorithm(),
        )
    }
}

impl CurveFitTrait for CobylaCurveFit {
    fn curve_fit<F, DF, const NPARAMS: usize>(
        &self,
        ts: Rc<Data>,
        x0: &[f64; NPARAMS],
        bounds: (&[f64; NPARAMS], &[f64; NPARAMS]),
        model: F,
        derivatives: DF,
    ) -> CurveFitResult<NPARAMS>
    where
        F: 'static + Clone + Fn(f64, &[f64; NPARAMS]) -> f64,
        DF: 'static + Clone + Fn(f64, &[f64; NPARAMS], &mut [f64; NPARAMS]),
    {
        let nevaluations = Cell::new(0_usize);
        let objective = |x: &[f64], _user_data: &mut ()| -> f64 {
            nevaluations.set(nevaluations.get() + 1);
            // COBYLA keeps the length of x0
            let params: [f64; NPARAMS] = x.try_into().unwrap();
            ts.chi2(&model, &params)
        };

        let cobyla_bounds: Vec<_> = bounds
            .0
            .iter()
            .copied()
            .zip(bounds.1.iter().copied())
            .collect();
        let constraints: Vec<&dyn Func<()>> = vec![];
        let stop_tol = StopTols {
            ftol_rel: self.ftol_rel,
            xtol_rel: self.xtol_rel,
            ..StopTols::default()
        };

        let result = minimize(
            objective,
            x0,
            &cobyla_bounds,
            &constraints,
            (),
            self.niterations as usize,
            RhoBeg::All(self.rhobeg),
            Some(stop_tol),
        );

        let (x_vec, success, message, returned) = match result {
            Ok((status, x_vec, _chi2)) => {
                let success = matches!(
                    status,
                    SuccessStatus::Success
                        | SuccessStatus::FtolReached
                        | SuccessStatus::XtolReached
                );
                (x_vec, success, format!("COBYLA status: {status:?}"), true)
            }
            Err((status @ FailStatus::RoundoffLimited, x_vec, _chi2)) => (
                x_vec,
                false,
                format!("COBYLA failed: {status:?}, the trust region cannot shrink further"),
                false,
            ),
            Err((status, x_vec, _chi2)) => {
                (x_vec, false, format!("COBYLA failed: {status:?}"), false)
            }
        };
        // COBYLA keeps the length of x0
        let x: [f64; NPARAMS] = x_vec.try_into().unwrap();
        let cobyla_result = CurveFitResult {
            x,
            reduced_chi2: ts.reduced_chi2(&model, &x),
            nevaluations: nevaluations.get(),
            success,
            message,
        };

        match &self.fine_tuning_algorithm {
            Some(fine_tuning_algorithm) if returned => {
                let fine_tuned = fine_tuning_algorithm.curve_fit(
                    ts,
                    &cobyla_result.x,
                    bounds,
                    model,
                    derivatives,
                );
                CurveFitResult {
                    nevaluations: cobyla_result.nevaluations + fine_tuned.nevaluations,
                    ..fine_tuned
                }
            }
            _ => cobyla_result,
        }
    }
}
