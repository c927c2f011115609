use crate::nl_fit::curve_fit::{CurveFitResult, CurveFitTrait};
use crate::nl_fit::data::Data;

use levenberg_marquardt::{LeastSquaresProblem, LevenbergMarquardt, TerminationReason};
use nalgebra::{Dyn, OMatrix, OVector, Owned};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::rc::Rc;

/// Levenberg-Marquardt non-linear least-squares solver
///
/// Wrapper of the MINPACK-derived `levenberg-marquardt` crate. It requires the function
/// Jacobian and ignores boundaries. The run is successful when one of the tolerance criteria is
/// met before the evaluation budget is exhausted:
/// - `xtol`: relative change of the parameters
/// - `ftol`: relative reduction of the sum of squares
/// - `gtol`: orthogonality of the residuals and the Jacobian columns
///
/// `niterations` bounds the number of function evaluations by `niterations * (NPARAMS + 1)`.
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename = "Lm")]
pub struct LmCurveFit {
    pub niterations: u32,
    pub xtol: f64,
    pub ftol: f64,
    pub gtol: f64,
}

impl LmCurveFit {
    /// Create a new [LmCurveFit]
    ///
    /// # Arguments
    /// - `niterations`: evaluation budget per parameter, see [LmCurveFit]
    /// - `xtol`, `ftol`, `gtol`: convergence tolerances, see [LmCurveFit]
    pub fn new(niterations: u32, xtol: f64, ftol: f64, gtol: f64) -> Self {
        assert!(niterations > 0, "niterations must be positive");
        for (name, tol) in [("xtol", xtol), ("ftol", ftol), ("gtol", gtol)] {
            assert!(
                tol.is_finite() && tol >= 0.0,
                "{name} must be finite and non-negative"
            );
        }
        Self {
            niterations,
            xtol,
            ftol,
            gtol,
        }
    }

    #[inline]
    pub fn default_niterations() -> u32 {
        200
    }

    #[inline]
    pub fn default_tolerance() -> f64 {
        1e-10
    }
}

impl Default for LmCurveFit {
    fn default() -> Self {
        Self::new(
            Self::default_niterations(),
            Self::default_tolerance(),
            Self::default_tolerance(),
            Self::default_tolerance(),
        )
    }
}

/// Curve-fit problem in terms of [LeastSquaresProblem], residuals are `model(t, x) - m`
struct CurveFitProblem<F, DF, const NPARAMS: usize> {
    ts: Rc<Data>,
    x: [f64; NPARAMS],
    model: F,
    derivatives: DF,
}

impl<F, DF, const NPARAMS: usize> LeastSquaresProblem<f64, Dyn, Dyn>
    for CurveFitProblem<F, DF, NPARAMS>
where
    F: Fn(f64, &[f64; NPARAMS]) -> f64,
    DF: Fn(f64, &[f64; NPARAMS], &mut [f64; NPARAMS]),
{
    type ResidualStorage = Owned<f64, Dyn>;
    type JacobianStorage = Owned<f64, Dyn, Dyn>;
    type ParameterStorage = Owned<f64, Dyn>;

    fn set_params(&mut self, x: &OVector<f64, Dyn>) {
        for (param, &value) in self.x.iter_mut().zip(x.iter()) {
            *param = value;
        }
    }

    fn params(&self) -> OVector<f64, Dyn> {
        OVector::<f64, Dyn>::from_vec(self.x.to_vec())
    }

    fn residuals(&self) -> Option<OVector<f64, Dyn>> {
        let residuals = OVector::<f64, Dyn>::from_iterator(
            self.ts.len(),
            self.ts
                .t
                .iter()
                .zip(self.ts.m.iter())
                .map(|(&t, &m)| (self.model)(t, &self.x) - m),
        );
        residuals.iter().all(|r| r.is_finite()).then_some(residuals)
    }

    fn jacobian(&self) -> Option<OMatrix<f64, Dyn, Dyn>> {
        let mut jac = OMatrix::<f64, Dyn, Dyn>::zeros(self.ts.len(), NPARAMS);
        let mut der = [0.0; NPARAMS];
        for (i, &t) in self.ts.t.iter().enumerate() {
            (self.derivatives)(t, &self.x, &mut der);
            for (j, &d) in der.iter().enumerate() {
                jac[(i, j)] = d;
            }
        }
        jac.iter().all(|d| d.is_finite()).then_some(jac)
    }
}

impl CurveFitTrait for LmCurveFit {
    fn curve_fit<F, DF, const NPARAMS: usize>(
        &self,
        ts: Rc<Data>,
        x0: &[f64; NPARAMS],
        _bounds: (&[f64; NPARAMS], &[f64; NPARAMS]),
        model: F,
        derivatives: DF,
    ) -> CurveFitResult<NPARAMS>
    where
        F: 'static + Clone + Fn(f64, &[f64; NPARAMS]) -> f64,
        DF: 'static + Clone + Fn(f64, &[f64; NPARAMS], &mut [f64; NPARAMS]),
    {
        let problem = CurveFitProblem {
            ts: ts.clone(),
            x: *x0,
            model: model.clone(),
            derivatives,
        };
        let (problem, report) = LevenbergMarquardt::new()
            .with_xtol(self.xtol)
            .with_ftol(self.ftol)
            .with_gtol(self.gtol)
            .with_patience(self.niterations as usize)
            .minimize(problem);

        let message = match &report.termination {
            TerminationReason::LostPatience => format!(
                "maximum number of iterations {} is reached",
                self.niterations
            ),
            TerminationReason::User(what) => format!("{what} are not finite"),
            termination => format!("LM status: {termination:?}"),
        };
        CurveFitResult {
            x: problem.x,
            reduced_chi2: ts.reduced_chi2(&model, &problem.x),
            nevaluations: report.number_of_evaluations,
            success: report.termination.was_successful(),
            message,
        }
    }
}
