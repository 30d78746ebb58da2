//! Probability distribution kernels
//!
//! f64 pdf/cdf/inverse functions for the normal, Student's t, chi-squared
//! and F distributions, plus the special functions they share. Everything
//! downstream (p-values, confidence intervals, power solving) builds on
//! these.

pub mod chi;
pub mod f;
pub mod normal;
pub mod t;

pub use chi::{chi_cdf, chi_inv, chi_pdf};
pub use f::{f_cdf, f_inv, f_pdf};
pub use normal::{norm_cdf, norm_inv, norm_pdf};
pub use t::{gamma_ln, regularized_incomplete_beta, t_cdf, t_inv, t_pdf};
