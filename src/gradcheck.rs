use crate::{
    error::Result,
    layer::Gradients,
    matrix::Matrix,
    network::NeuralNetwork,
};

fn loss_at(network: &NeuralNetwork, x: &Matrix, target: &Matrix) -> Result<f64> {
    network.loss(&network.forward(x)?, target)
}

// Central difference of the loss for every element of one parameter matrix.
// `param` selects the matrix inside the layer; each element is restored after probing.
fn probe<F>(
    network: &mut NeuralNetwork,
    layer_index: usize,
    param: F,
    x: &Matrix,
    target: &Matrix,
    epsilon: f64,
) -> Result<Matrix>
where
    F: Fn(&mut NeuralNetwork, usize) -> &mut Matrix,
{
    let (rows, cols) = param(network, layer_index).shape();
    let mut grad = Matrix::zeros(rows, cols)?;
    for r in 0..rows {
        for c in 0..cols {
            let original = param(network, layer_index)[(r, c)];

            param(network, layer_index)[(r, c)] = original + epsilon;
            let plus = loss_at(network, x, target);
            param(network, layer_index)[(r, c)] = original - epsilon;
            let minus = loss_at(network, x, target);
            param(network, layer_index)[(r, c)] = original;

            grad[(r, c)] = (plus? - minus?) / (2.0 * epsilon);
        }
    }
    Ok(grad)
}

/// Finite-difference gradients of the loss at `(x, target)` with respect to
/// every layer's weights and bias, in layer order.
///
/// Parameters are perturbed by `epsilon` in both directions and restored, so
/// `network` is unchanged afterwards.
pub fn numerical_gradients(
    network: &mut NeuralNetwork,
    x: &Matrix,
    target: &Matrix,
    epsilon: f64,
) -> Result<Vec<Gradients>> {
    let n_layers = network.layers().len();
    let mut gradients = Vec::with_capacity(n_layers);
    for i in 0..n_layers {
        let weights = probe(
            network,
            i,
            |net, i| net.layers_mut()[i].weights_mut(),
            x,
            target,
            epsilon,
        )?;
        let bias = probe(
            network,
            i,
            |net, i| net.layers_mut()[i].bias_mut(),
            x,
            target,
            epsilon,
        )?;
        gradients.push(Gradients { weights, bias });
    }
    Ok(gradients)
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use crate::{
        activation::Identity,
        assert_rel_eq_mat,
        layer::Layer,
        loss::MeanSquaredError,
    };

    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn linear_layer_gradient() {
        // loss = (w1 * 1 + w2 * 2 + b - 0)^2 with w = [1, 1], b = 0, so loss = 9
        // d/dw = 2 * 3 * x = [6, 12], d/db = 6
        let weights = Matrix::from_rows(vec![vec![1.0, 1.0]]).unwrap();
        let bias = Matrix::zeros(1, 1).unwrap();
        let layer = Layer::with_weights(Rc::new(Identity), weights.clone(), bias).unwrap();
        let mut net = NeuralNetwork::new(vec![layer], Rc::new(MeanSquaredError), 0.1).unwrap();

        let x = Matrix::column(vec![1.0, 2.0]).unwrap();
        let t = Matrix::zeros(1, 1).unwrap();
        let grads = numerical_gradients(&mut net, &x, &t, 1e-5).unwrap();

        assert_eq!(grads.len(), 1);
        assert_rel_eq_mat!(
            grads[0].weights,
            Matrix::from_rows(vec![vec![6.0, 12.0]]).unwrap(),
            1e-6
        );
        assert_rel_eq_mat!(grads[0].bias, Matrix::column(vec![6.0]).unwrap(), 1e-6);
        assert_eq!(net.layers()[0].weights(), &weights);
    }
}
