//! Single-component cosinor model with a fixed 24-hour period

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::f64::consts::{PI, TAU};

/// Period of the rhythm, in hours
pub const PERIOD_HOURS: f64 = 24.0;

/// Number of cosinor parameters: mesor, amplitude, acrophase
pub const NPARAMS: usize = 3;

#[inline]
fn phase(t: f64, acrophase: f64) -> f64 {
    TAU * t / PERIOD_HOURS - acrophase
}

/// Cosinor function
///
/// $$
/// f(t) = M + A \cos\left(\frac{2\pi t}{24} - \phi\right),
/// $$
/// where $M$ is mesor, $A$ is amplitude and $\phi$ is acrophase in radians, $t$ is in hours.
#[inline]
pub fn cosinor(t: f64, mesor: f64, amplitude: f64, acrophase: f64) -> f64 {
    mesor + amplitude * f64::cos(phase(t, acrophase))
}

/// Fitted cosinor parameters
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CosinorParams {
    pub mesor: f64,
    pub amplitude: f64,
    pub acrophase: f64,
}

impl CosinorParams {
    pub fn new(mesor: f64, amplitude: f64, acrophase: f64) -> Self {
        Self {
            mesor,
            amplitude,
            acrophase,
        }
    }

    pub fn eval(&self, t: f64) -> f64 {
        cosinor(t, self.mesor, self.amplitude, self.acrophase)
    }

    /// Same curve with non-negative amplitude and acrophase wrapped into `[0, 2π)`
    pub fn canonical(&self) -> Self {
        let (amplitude, acrophase) = if self.amplitude < 0.0 {
            (-self.amplitude, self.acrophase + PI)
        } else {
            (self.amplitude, self.acrophase)
        };
        let mut acrophase = acrophase.rem_euclid(TAU);
        // rem_euclid may round up to exactly 2π for tiny negative inputs
        if acrophase >= TAU {
            acrophase = 0.0;
        }
        Self {
            mesor: self.mesor,
            amplitude,
            acrophase,
        }
    }

    pub fn normalized(&self, normalization: AcrophaseNormalization) -> Self {
        match normalization {
            AcrophaseNormalization::Raw => *self,
            AcrophaseNormalization::Canonical => self.canonical(),
        }
    }
}

impl From<[f64; NPARAMS]> for CosinorParams {
    fn from(x: [f64; NPARAMS]) -> Self {
        Self::new(x[0], x[1], x[2])
    }
}

impl From<CosinorParams> for [f64; NPARAMS] {
    fn from(p: CosinorParams) -> Self {
        [p.mesor, p.amplitude, p.acrophase]
    }
}

/// How acrophase is reported in result records
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum AcrophaseNormalization {
    /// As returned by the optimizer, amplitude may be negative and acrophase is unbounded
    #[default]
    Raw,
    /// Non-negative amplitude, acrophase in `[0, 2π)`
    Canonical,
}

/// Model and its Jacobian over the parameter array `[mesor, amplitude, acrophase]`
pub struct CosinorModel;

impl CosinorModel {
    #[inline]
    pub fn model(t: f64, param: &[f64; NPARAMS]) -> f64 {
        cosinor(t, param[0], param[1], param[2])
    }

    pub fn derivatives(t: f64, param: &[f64; NPARAMS], jac: &mut [f64; NPARAMS]) {
        let (sin, cos) = f64::sin_cos(phase(t, param[2]));
        // mesor
        jac[0] = 1.0;
        // amplitude
        jac[1] = cos;
        // acrophase
        jac[2] = param[1] * sin;
    }
}
