use crate::{
    error::{Error, Result},
    matrix::Matrix,
    optimizer::Optimizer,
};

/// Plain stochastic gradient descent: `p <- p - learning_rate * g`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientDescent {
    learning_rate: f64,
}

impl GradientDescent {
    pub fn new(learning_rate: f64) -> Result<Self> {
        if !(learning_rate.is_finite() && learning_rate > 0.0) {
            return Err(Error::Configuration(format!(
                "learning rate must be positive, got {}",
                learning_rate
            )));
        }
        Ok(Self { learning_rate })
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }
}

impl Optimizer for GradientDescent {
    fn update(&self, parameter: &mut Matrix, gradient: &Matrix) -> Result<()> {
        parameter.scaled_sub_assign(self.learning_rate, gradient)
    }
}
