use crate::{data::Sample, error::Result, network::NeuralNetwork};

/// Share of `samples` whose label equals the network's prediction.
/// An empty slice has accuracy 0.
pub fn accuracy(network: &NeuralNetwork, samples: &[Sample]) -> Result<f64> {
    if samples.is_empty() {
        return Ok(0.0);
    }
    let mut n_corrects = 0;
    for sample in samples {
        if network.predict(&sample.features)? == sample.label {
            n_corrects += 1;
        }
    }
    Ok(n_corrects as f64 / samples.len() as f64)
}

/// Confusion matrix over `n_classes` labels.
/// The item in i-th row and j-th column counts samples labelled i that were
/// predicted as j. Samples whose label or prediction falls outside
/// `0..n_classes` are ignored.
pub fn confusion_matrix(
    network: &NeuralNetwork,
    samples: &[Sample],
    n_classes: usize,
) -> Result<Vec<Vec<usize>>> {
    let mut matrix = vec![vec![0; n_classes]; n_classes];
    for sample in samples {
        let predicted = network.predict(&sample.features)?;
        if sample.label < n_classes && predicted < n_classes {
            matrix[sample.label][predicted] += 1;
        }
    }
    Ok(matrix)
}
