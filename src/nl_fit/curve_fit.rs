use crate::nl_fit::cobyla::CobylaCurveFit;
use crate::nl_fit::data::Data;
use crate::nl_fit::lm::LmCurveFit;

use enum_dispatch::enum_dispatch;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::rc::Rc;

/// Outcome of a single optimizer run
#[derive(Clone, Debug)]
pub struct CurveFitResult<const NPARAMS: usize> {
    /// Best parameters found, meaningful even if `success` is false
    pub x: [f64; NPARAMS],
    pub reduced_chi2: f64,
    /// Number of objective function evaluations done by the optimizer
    pub nevaluations: usize,
    pub success: bool,
    /// Solver status, explains the reason of a failure
    pub message: String,
}

#[enum_dispatch]
pub trait CurveFitTrait: Clone + Debug + Serialize + DeserializeOwned {
    /// Minimize the sum of squared residuals `model(t, x) - m` starting from `x0`
    ///
    /// `bounds` are lower and upper limits of the parameters, they must be finite. `derivatives`
    /// fills the Jacobian of `model` over parameters. Algorithms that don't use bounds or
    /// derivatives ignore them.
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
        DF: 'static + Clone + Fn(f64, &[f64; NPARAMS], &mut [f64; NPARAMS]);
}

/// Optimization algorithm for the non-linear least squares problem
#[enum_dispatch(CurveFitTrait)]
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
#[non_exhaustive]
pub enum CurveFitAlgorithm {
    Lm(LmCurveFit),
    Cobyla(CobylaCurveFit),
}

impl Default for CurveFitAlgorithm {
    fn default() -> Self {
        LmCurveFit::default().into()
    }
}
