use crate::{
    error::{Error, Result},
    matrix::Matrix,
};

/// Scalar measure of how far `output` is from `target`, with its gradient.
pub trait Loss {
    fn value(&self, output: &Matrix, target: &Matrix) -> Result<f64>;

    /// Derivative of the loss with respect to `output`; same shape as `output`.
    fn grad(&self, output: &Matrix, target: &Matrix) -> Result<Matrix>;
}

fn ensure_same_shape(output: &Matrix, target: &Matrix, operation: &'static str) -> Result<()> {
    if output.shape() != target.shape() {
        return Err(Error::ShapeMismatch {
            operation,
            left: output.shape(),
            right: target.shape(),
        });
    }
    Ok(())
}

/// Computes mean squared error over all elements.
#[derive(Debug, Clone, Copy, Default)]
pub struct MeanSquaredError;

impl Loss for MeanSquaredError {
    fn value(&self, output: &Matrix, target: &Matrix) -> Result<f64> {
        Ok(output.sub(target)?.pow(2.0)?.mean())
    }

    fn grad(&self, output: &Matrix, target: &Matrix) -> Result<Matrix> {
        let diff = output.sub(target)?;
        Ok(&(2.0 * &diff) / output.size() as f64)
    }
}

fn softmax(x: &Matrix) -> Matrix {
    let max_element = x.iter().fold(f64::NEG_INFINITY, |v, &w| v.max(w));
    let exp_each = x.map(|v| (v - max_element).exp());
    let exp_sum = exp_each.sum();
    &exp_each / exp_sum
}

/// Cross entropy of `target` against the softmax of `output`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SoftmaxCrossEntropy;

impl Loss for SoftmaxCrossEntropy {
    fn value(&self, output: &Matrix, target: &Matrix) -> Result<f64> {
        ensure_same_shape(output, target, "softmax_cross_entropy")?;
        let log_probs = softmax(output).map(f64::ln);
        Ok(-target.mul(&log_probs)?.sum())
    }

    fn grad(&self, output: &Matrix, target: &Matrix) -> Result<Matrix> {
        ensure_same_shape(output, target, "softmax_cross_entropy")?;
        softmax(output).sub(target)
    }
}
