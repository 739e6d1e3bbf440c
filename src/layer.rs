use std::{fmt, rc::Rc};

use crate::{
    activation::Activation,
    error::{Error, Result},
    matrix::Matrix,
    optimizer::Optimizer,
    random::RandomSource,
};

/// Gradients of the loss with respect to one layer's parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Gradients {
    pub weights: Matrix,
    pub bias: Matrix,
}

/// Fully connected layer mapping an `(ins, 1)` column to an `(outs, 1)` column.
pub struct Layer {
    weights: Matrix,
    bias: Matrix,
    activation: Rc<dyn Activation>,
}

impl Layer {
    /// Create a layer with weights drawn from `[-1, 1) / (outs * ins)` and
    /// bias drawn from `[-1, 1) / outs`.
    pub fn new<R>(
        ins: usize,
        outs: usize,
        activation: Rc<dyn Activation>,
        rng: &mut R,
    ) -> Result<Self>
    where
        R: RandomSource + ?Sized,
    {
        let weights = &Matrix::random_uniform(outs, ins, rng)? / (outs * ins) as f64;
        let bias = &Matrix::random_uniform(outs, 1, rng)? / outs as f64;
        Layer::with_weights(activation, weights, bias)
    }

    /// Create a layer from explicit parameters. `weights` is `(outs, ins)`
    /// and `bias` must be `(outs, 1)`.
    pub fn with_weights(
        activation: Rc<dyn Activation>,
        weights: Matrix,
        bias: Matrix,
    ) -> Result<Self> {
        if bias.shape() != (weights.rows(), 1) {
            return Err(Error::ShapeMismatch {
                operation: "layer bias",
                left: weights.shape(),
                right: bias.shape(),
            });
        }
        Ok(Self {
            weights,
            bias,
            activation,
        })
    }

    pub fn ins(&self) -> usize {
        self.weights.cols()
    }

    pub fn outs(&self) -> usize {
        self.weights.rows()
    }

    pub fn weights(&self) -> &Matrix {
        &self.weights
    }

    pub fn bias(&self) -> &Matrix {
        &self.bias
    }

    pub(crate) fn weights_mut(&mut self) -> &mut Matrix {
        &mut self.weights
    }

    pub(crate) fn bias_mut(&mut self) -> &mut Matrix {
        &mut self.bias
    }

    /// `W x + b`, before the activation.
    pub fn pre_activation(&self, x: &Matrix) -> Result<Matrix> {
        if x.shape() != (self.ins(), 1) {
            return Err(Error::ShapeMismatch {
                operation: "layer input",
                left: (self.ins(), 1),
                right: x.shape(),
            });
        }
        self.weights.dot(x)?.add(&self.bias)
    }

    pub fn forward(&self, x: &Matrix) -> Result<Matrix> {
        Ok(self.activation.compute(&self.pre_activation(x)?))
    }

    /// Backpropagate `errors`, the gradient of the loss with respect to this
    /// layer's output, given the input `x` seen in the forward pass.
    ///
    /// Returns the gradient with respect to `x` together with the parameter
    /// gradients. The layer itself is left untouched.
    pub fn backward(&self, x: &Matrix, errors: &Matrix) -> Result<(Matrix, Gradients)> {
        let dot_products = self.pre_activation(x)?;
        let bias_derivative = self.activation.derivative(&dot_products).mul(errors)?;
        let weights_derivative = bias_derivative.dot(&x.t())?;
        let inputs_derivative = self.weights.t().dot(&bias_derivative)?;

        Ok((
            inputs_derivative,
            Gradients {
                weights: weights_derivative,
                bias: bias_derivative,
            },
        ))
    }

    pub fn update<O>(&mut self, optimizer: &O, gradients: &Gradients) -> Result<()>
    where
        O: Optimizer + ?Sized,
    {
        optimizer.update(&mut self.weights, &gradients.weights)?;
        optimizer.update(&mut self.bias, &gradients.bias)
    }
}

impl fmt::Debug for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Layer")
            .field("ins", &self.ins())
            .field("outs", &self.outs())
            .field("weights", &self.weights)
            .field("bias", &self.bias)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        activation::{LeakyRelu, Sigmoid},
        assert_rel_eq_mat,
        optimizer::GradientDescent,
        random::MersenneLcg,
    };

    use super::*;
    use approx::assert_relative_eq;

    fn sigmoid_layer() -> Layer {
        let weights =
            Matrix::from_rows(vec![vec![1.0, -1.0, 0.5], vec![2.0, -1.0, 2.0]]).unwrap();
        let bias = Matrix::column(vec![-2.0, -0.5]).unwrap();
        Layer::with_weights(Rc::new(Sigmoid), weights, bias).unwrap()
    }

    #[test]
    fn layer_forward() {
        let layer = sigmoid_layer();
        let inputs = Matrix::column(vec![1.0, 0.5, -0.5]).unwrap();
        let outputs = layer.forward(&inputs).unwrap();
        assert_rel_eq_mat!(
            outputs,
            Matrix::column(vec![0.1480471980316895, 0.5]).unwrap()
        );
    }

    #[test]
    fn layer_backward() {
        let layer = sigmoid_layer();
        let inputs = Matrix::column(vec![1.0, 0.5, -0.5]).unwrap();
        let outputs = layer.forward(&inputs).unwrap();

        let train = Matrix::column(vec![1.0, 0.0]).unwrap();
        let error = train.sub(&outputs).unwrap();
        let (dx, grads) = layer.backward(&inputs, &error).unwrap();

        assert_rel_eq_mat!(
            dx,
            Matrix::column(vec![
                -0.1425438531921371,
                0.0175438531921371,
                -0.1962719265960686,
            ])
            .unwrap()
        );
        assert_rel_eq_mat!(
            grads.weights,
            Matrix::from_rows(vec![
                vec![0.1074561468078629, 0.0537280734039314, -0.0537280734039314],
                vec![-0.125, -0.0625, 0.0625],
            ])
            .unwrap()
        );
        assert_rel_eq_mat!(
            grads.bias,
            Matrix::column(vec![0.1074561468078629, -0.125]).unwrap()
        );
    }

    #[test]
    fn layer_update() {
        let mut layer = sigmoid_layer();
        let grads = Gradients {
            weights: Matrix::filled(1.0, 2, 3).unwrap(),
            bias: Matrix::column(vec![2.0, -2.0]).unwrap(),
        };
        layer
            .update(&GradientDescent::new(0.5).unwrap(), &grads)
            .unwrap();
        assert_rel_eq_mat!(
            layer.weights(),
            Matrix::from_rows(vec![vec![0.5, -1.5, 0.0], vec![1.5, -1.5, 1.5]]).unwrap()
        );
        assert_rel_eq_mat!(layer.bias(), Matrix::column(vec![-3.0, 0.5]).unwrap());
    }

    #[test]
    fn reject_wrong_input_shape() {
        let layer = sigmoid_layer();
        let too_short = Matrix::column(vec![1.0, 2.0]).unwrap();
        assert!(matches!(
            layer.forward(&too_short),
            Err(Error::ShapeMismatch { .. })
        ));
        let row = Matrix::from_rows(vec![vec![1.0, 0.5, -0.5]]).unwrap();
        assert!(layer.forward(&row).is_err());
    }

    #[test]
    fn reject_wrong_bias_shape() {
        let weights = Matrix::zeros(2, 3).unwrap();
        let bias = Matrix::zeros(3, 1).unwrap();
        assert!(Layer::with_weights(Rc::new(Sigmoid), weights, bias).is_err());
    }

    #[test]
    fn random_initialisation_is_scaled() {
        let mut rng = MersenneLcg::new(7);
        let layer = Layer::new(4, 3, Rc::new(LeakyRelu::default()), &mut rng).unwrap();
        assert_eq!(layer.ins(), 4);
        assert_eq!(layer.outs(), 3);
        assert_eq!(layer.weights().shape(), (3, 4));
        assert_eq!(layer.bias().shape(), (3, 1));
        assert!(layer.weights().iter().all(|w| w.abs() <= 1.0 / 12.0));
        assert!(layer.bias().iter().all(|b| b.abs() <= 1.0 / 3.0));

        let mut rng = MersenneLcg::new(7);
        let other = Layer::new(4, 3, Rc::new(LeakyRelu::default()), &mut rng).unwrap();
        assert_eq!(layer.weights(), other.weights());
        assert_relative_eq!(layer.bias().sum(), other.bias().sum());
    }
}
