use std::rc::Rc;

use crate::{
    error::{Error, Result},
    matrix::Matrix,
};

/// Elementwise nonlinearity applied after a layer's affine transform.
pub trait Activation {
    fn compute(&self, x: &Matrix) -> Matrix;

    /// Derivative evaluated at the pre-activation input `x`, not at `compute(x)`.
    fn derivative(&self, x: &Matrix) -> Matrix;
}

pub struct Identity;

impl Activation for Identity {
    fn compute(&self, x: &Matrix) -> Matrix {
        x.clone()
    }

    fn derivative(&self, x: &Matrix) -> Matrix {
        x.map(|_| 1.0)
    }
}

pub struct Sigmoid;

impl Sigmoid {
    fn compute_one(x: f64) -> f64 {
        1.0 / (1.0 + (-x).exp())
    }
}

impl Activation for Sigmoid {
    fn compute(&self, x: &Matrix) -> Matrix {
        x.map(Sigmoid::compute_one)
    }

    fn derivative(&self, x: &Matrix) -> Matrix {
        x.map(|v| {
            let w = Sigmoid::compute_one(v);
            w * (1.0 - w)
        })
    }
}

pub struct Relu;

impl Activation for Relu {
    fn compute(&self, x: &Matrix) -> Matrix {
        x.map(|v| if v > 0.0 { v } else { 0.0 })
    }

    fn derivative(&self, x: &Matrix) -> Matrix {
        x.map(|v| if v > 0.0 { 1.0 } else { 0.0 })
    }
}

/// Look up an activation by its lowercase name: `identity`, `sigmoid`,
/// `relu` or `leaky_relu` (alpha 0.1).
pub fn by_name(name: &str) -> Result<Rc<dyn Activation>> {
    let activation: Rc<dyn Activation> = match name {
        "identity" => Rc::new(Identity),
        "sigmoid" => Rc::new(Sigmoid),
        "relu" => Rc::new(Relu),
        "leaky_relu" => Rc::new(LeakyRelu::default()),
        _ => {
            return Err(Error::Configuration(format!(
                "unknown activation {:?}",
                name
            )))
        }
    };
    Ok(activation)
}

/// `max(x, alpha * x)`. The derivative at exactly zero takes the `alpha` branch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LeakyRelu {
    alpha: f64,
}

impl LeakyRelu {
    pub fn new(alpha: f64) -> Self {
        Self { alpha }
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }
}

impl Default for LeakyRelu {
    fn default() -> Self {
        Self::new(0.1)
    }
}

impl Activation for LeakyRelu {
    fn compute(&self, x: &Matrix) -> Matrix {
        let alpha = self.alpha;
        x.map(|v| v.max(alpha * v))
    }

    fn derivative(&self, x: &Matrix) -> Matrix {
        let alpha = self.alpha;
        x.map(|v| {
            let positive = if v > 0.0 { 1.0 } else { 0.0 };
            f64::max(positive, alpha)
        })
    }
}
