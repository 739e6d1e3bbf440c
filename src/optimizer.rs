mod gradient_descent;

use crate::{error::Result, matrix::Matrix};

pub use gradient_descent::GradientDescent;

/// Trait to abstract optimizers.
pub trait Optimizer {
    /// Move `parameter` against `gradient`, in place.
    fn update(&self, parameter: &mut Matrix, gradient: &Matrix) -> Result<()>;
}
