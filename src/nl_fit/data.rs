use ndarray::{Array1, Zip};

/// Observations of a curve-fit problem: time and observed values, unit weights
#[derive(Clone, Debug)]
pub struct Data {
    pub t: Array1<f64>,
    pub m: Array1<f64>,
}

impl Data {
    pub fn new(t: Array1<f64>, m: Array1<f64>) -> Self {
        assert_eq!(t.len(), m.len(), "t and m should have the same size");
        Self { t, m }
    }

    pub fn len(&self) -> usize {
        self.t.len()
    }

    pub fn is_empty(&self) -> bool {
        self.t.is_empty()
    }

    /// Sum of squared residuals of `model` with parameters `x`
    pub fn chi2<F, const NPARAMS: usize>(&self, model: &F, x: &[f64; NPARAMS]) -> f64
    where
        F: Fn(f64, &[f64; NPARAMS]) -> f64,
    {
        Zip::from(&self.t)
            .and(&self.m)
            .fold(0.0, |acc, &t, &m| acc + (model(t, x) - m).powi(2))
    }

    /// Chi2 divided by the number of degrees of freedom, infinite if there are none
    pub fn reduced_chi2<F, const NPARAMS: usize>(&self, model: &F, x: &[f64; NPARAMS]) -> f64
    where
        F: Fn(f64, &[f64; NPARAMS]) -> f64,
    {
        match self.len().checked_sub(NPARAMS) {
            Some(dof) if dof > 0 => self.chi2(model, x) / dof as f64,
            _ => f64::INFINITY,
        }
    }
}
