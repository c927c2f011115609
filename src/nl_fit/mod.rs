//! Non-linear least-squares infrastructure for the cosinor fit
//!
//! Algorithms implement [CurveFitTrait] over plain `[f64; NPARAMS]` parameter arrays and
//! [Data] observations, the fit engine picks one through the serializable
//! [CurveFitAlgorithm] enum.
//!
//! - [LmCurveFit]: Levenberg-Marquardt. Uses derivatives. Default.
//! - [CobylaCurveFit]: COBYLA. Derivative-free, can be chained with another algorithm.

pub mod cobyla;
pub use cobyla::CobylaCurveFit;

pub mod curve_fit;
pub use curve_fit::{CurveFitAlgorithm, CurveFitResult, CurveFitTrait};

pub mod data;
pub use data::Data;

pub mod lm;
pub use lm::LmCurveFit;
