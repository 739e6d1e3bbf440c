use std::rc::Rc;

use log::{debug, trace};

use crate::{
    activation::Activation,
    error::{Error, Result},
    layer::{Gradients, Layer},
    loss::Loss,
    matrix::Matrix,
    optimizer::GradientDescent,
    random::RandomSource,
};

/// Ordered stack of compatible layers trained by per-sample gradient descent.
pub struct NeuralNetwork {
    layers: Vec<Layer>,
    loss: Rc<dyn Loss>,
    optimizer: GradientDescent,
}

impl NeuralNetwork {
    /// Fails with `Error::Configuration` when there are no layers, when the
    /// outputs of a layer do not match the inputs of the next one, or when
    /// `learning_rate` is not positive.
    pub fn new(layers: Vec<Layer>, loss: Rc<dyn Loss>, learning_rate: f64) -> Result<Self> {
        if layers.is_empty() {
            return Err(Error::Configuration("a network needs at least one layer".into()));
        }
        for (i, pair) in layers.windows(2).enumerate() {
            if pair[0].outs() != pair[1].ins() {
                return Err(Error::Configuration(format!(
                    "layers {} and {} are not compatible ({} != {})",
                    i,
                    i + 1,
                    pair[0].outs(),
                    pair[1].ins()
                )));
            }
        }
        let optimizer = GradientDescent::new(learning_rate)?;

        debug!(
            "network created: {} layers, sizes {:?}, learning rate {}",
            layers.len(),
            layers.iter().map(Layer::outs).collect::<Vec<_>>(),
            learning_rate
        );
        Ok(Self {
            layers,
            loss,
            optimizer,
        })
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub(crate) fn layers_mut(&mut self) -> &mut [Layer] {
        &mut self.layers
    }

    pub fn learning_rate(&self) -> f64 {
        self.optimizer.learning_rate()
    }

    /// Number of inputs the first layer expects.
    pub fn ins(&self) -> usize {
        self.layers[0].ins()
    }

    /// Number of outputs of the last layer.
    pub fn outs(&self) -> usize {
        self.layers[self.layers.len() - 1].outs()
    }

    /// Propagate a column vector through the whole network.
    pub fn forward(&self, x: &Matrix) -> Result<Matrix> {
        self.layers
            .iter()
            .try_fold(x.clone(), |out, layer| layer.forward(&out))
    }

    pub fn loss(&self, output: &Matrix, target: &Matrix) -> Result<f64> {
        self.loss.value(output, target)
    }

    /// Index of the largest output for `x`.
    pub fn predict(&self, x: &Matrix) -> Result<usize> {
        Ok(self.forward(x)?.argmax().0)
    }

    /// Gradients of the loss at `(x, target)` for every layer, in layer order.
    ///
    /// Each layer sends the gradient for its input back through its current
    /// weights, so the result is the exact gradient of the loss.
    pub fn gradients(&self, x: &Matrix, target: &Matrix) -> Result<Vec<Gradients>> {
        let mut xs = Vec::with_capacity(self.layers.len() + 1);
        xs.push(x.clone());
        for layer in &self.layers {
            let out = layer.forward(&xs[xs.len() - 1])?;
            xs.push(out);
        }

        let mut errors = self.loss.grad(&xs[self.layers.len()], target)?;
        let mut gradients = Vec::with_capacity(self.layers.len());
        for (layer, x) in self.layers.iter().zip(&xs[..self.layers.len()]).rev() {
            let (inputs_derivative, grads) = layer.backward(x, &errors)?;
            gradients.push(grads);
            errors = inputs_derivative;
        }
        gradients.reverse();
        Ok(gradients)
    }

    /// Take one gradient descent step so that `forward(x)` moves towards `target`.
    ///
    /// All gradients are computed before any parameter changes, so on error
    /// the network is left exactly as it was.
    pub fn train(&mut self, x: &Matrix, target: &Matrix) -> Result<()> {
        let gradients = self.gradients(x, target)?;
        for (layer, grads) in self.layers.iter_mut().zip(gradients.iter()) {
            layer.update(&self.optimizer, grads)?;
        }
        trace!("trained on one sample, {} layers updated", gradients.len());
        Ok(())
    }
}

/// Builder collecting the construction parameters of a `NeuralNetwork`.
///
/// ```
/// use std::rc::Rc;
/// use nnni::{activation::LeakyRelu, loss::MeanSquaredError, network::NetworkBuilder, random::MersenneLcg};
///
/// let act = Rc::new(LeakyRelu::default());
/// let net = NetworkBuilder::new(Rc::new(MeanSquaredError))
///     .layer(2, 3, act.clone())
///     .layer(3, 1, act)
///     .learning_rate(0.01)
///     .build(&mut MersenneLcg::new(73))
///     .unwrap();
/// assert_eq!(net.layers().len(), 2);
/// ```
pub struct NetworkBuilder {
    layers: Vec<(usize, usize, Rc<dyn Activation>)>,
    loss: Rc<dyn Loss>,
    learning_rate: f64,
}

impl NetworkBuilder {
    pub const DEFAULT_LEARNING_RATE: f64 = 0.01;

    pub fn new(loss: Rc<dyn Loss>) -> Self {
        Self {
            layers: Vec::new(),
            loss,
            learning_rate: Self::DEFAULT_LEARNING_RATE,
        }
    }

    pub fn layer(mut self, ins: usize, outs: usize, activation: Rc<dyn Activation>) -> Self {
        self.layers.push((ins, outs, activation));
        self
    }

    pub fn learning_rate(self, learning_rate: f64) -> Self {
        Self {
            learning_rate,
            ..self
        }
    }

    /// Initialise every layer from `rng`, in order, and assemble the network.
    pub fn build<R>(self, rng: &mut R) -> Result<NeuralNetwork>
    where
        R: RandomSource + ?Sized,
    {
        if let Some((ins, outs, _)) = self
            .layers
            .iter()
            .find(|(ins, outs, _)| *ins == 0 || *outs == 0)
        {
            return Err(Error::Configuration(format!(
                "layer sizes must be positive, got {} -> {}",
                ins, outs
            )));
        }

        let layers = self
            .layers
            .into_iter()
            .map(|(ins, outs, activation)| Layer::new(ins, outs, activation, &mut *rng))
            .collect::<Result<Vec<_>>>()?;
        NeuralNetwork::new(layers, self.loss, self.learning_rate)
    }
}
