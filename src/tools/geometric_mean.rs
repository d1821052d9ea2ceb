//! Geometric mean of a sequence of positive numbers.

use crate::error::{MathMcpError, Result};

/// Compute the geometric mean of `values`: the n-th root of their product.
///
/// The product is accumulated directly, so very large inputs can overflow to
/// infinity.
pub fn geometric_mean(values: &[f64]) -> Result<f64> {
    if values.is_empty() {
        return Err(MathMcpError::InvalidInput(
            "Input list cannot be empty".into(),
        ));
    }

    if values.iter().any(|v| v.is_nan() || *v <= 0.0) {
        return Err(MathMcpError::InvalidInput(
            "All values must be positive for geometric mean calculation".into(),
        ));
    }

    let product: f64 = values.iter().product();
    Ok(product.powf(1.0 / values.len() as f64))
}
