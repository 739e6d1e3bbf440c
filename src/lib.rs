use std::{collections::HashMap, hash::Hash};

pub mod activation;
pub mod data;
pub mod error;
pub mod gradcheck;
pub mod layer;
pub mod loss;
pub mod matrix;
pub mod metrics;
pub mod network;
pub mod optimizer;
pub mod random;

pub use error::{Error, Result};
pub use matrix::{Matrix, Operand};

/// Assert two matrices have the same shape and approximately equal elements.
/// `approx::assert_relative_eq` must be in scope.
#[macro_export]
macro_rules! assert_rel_eq_mat {
    ($actual:expr, $expected:expr) => {
        $crate::assert_rel_eq_mat!($actual, $expected, 1e-10)
    };
    ($actual:expr, $expected:expr, $epsilon:expr) => {{
        let actual: &$crate::matrix::Matrix = &$actual;
        let expected: &$crate::matrix::Matrix = &$expected;
        assert_eq!(actual.shape(), expected.shape());
        actual.iter().zip(expected.iter()).for_each(|(v, w)| {
            assert_relative_eq!(*v, *w, epsilon = $epsilon);
        });
    }};
}

/// Encode labels to one-hot column vectors and decode them.
pub struct OneHotEncoder<Label>
where
    Label: Hash + Eq + Clone,
{
    label_to_id: HashMap<Label, usize>,
    id_to_label: Vec<Label>,
}

impl<Label> OneHotEncoder<Label>
where
    Label: Hash + Eq + Clone,
{
    /// Record labels to convert. The position of a label is its row in the encoding.
    pub fn new(label_kinds: Vec<Label>) -> Self {
        let label_to_id = label_kinds
            .iter()
            .cloned()
            .enumerate()
            .map(|(id, label)| (label, id))
            .collect();
        Self {
            label_to_id,
            id_to_label: label_kinds,
        }
    }

    pub fn n_labels(&self) -> usize {
        self.id_to_label.len()
    }

    /// Encode `label` as an `(n_labels, 1)` column with a single `1.0`.
    pub fn encode(&self, label: &Label) -> Result<Matrix> {
        let id = self
            .label_to_id
            .get(label)
            .ok_or_else(|| Error::InvalidArgument("unknown label".into()))?;
        let mut one_hot = Matrix::zeros(self.n_labels(), 1)?;
        one_hot[(*id, 0)] = 1.0;
        Ok(one_hot)
    }

    /// Decode a network output to the label of its largest row.
    pub fn decode(&self, output: &Matrix) -> Option<&Label> {
        self.id_to_label.get(output.argmax().0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_labels() {
        let label_kinds = vec!["A", "B", "C"].into_iter().map(String::from).collect();
        let encoder = OneHotEncoder::new(label_kinds);

        assert_eq!(
            encoder.encode(&"C".to_string()).unwrap(),
            Matrix::column(vec![0.0, 0.0, 1.0]).unwrap()
        );
        assert_eq!(
            encoder.encode(&"A".to_string()).unwrap(),
            Matrix::column(vec![1.0, 0.0, 0.0]).unwrap()
        );
        assert!(encoder.encode(&"D".to_string()).is_err());
    }

    #[test]
    fn encode_digits() {
        let encoder = OneHotEncoder::new((0..10).collect());
        let target = encoder.encode(&7usize).unwrap();
        assert_eq!(target.shape(), (10, 1));
        assert_eq!(target.argmax(), (7, 0));
        assert_eq!(target.sum(), 1.0);
    }

    #[test]
    fn decode_one_hot() {
        let label_kinds = vec!["A", "B", "C"].into_iter().map(String::from).collect();
        let encoder = OneHotEncoder::new(label_kinds);

        let outputs = [
            vec![1.0, 0.0, 0.0],
            vec![0.8, 0.2, 0.0],
            vec![0.05, 0.05, 0.9],
            vec![0.0, 1.0, 0.0],
            vec![0.1, 0.2, 0.7],
        ];
        let labels = outputs
            .iter()
            .map(|o| {
                let column = Matrix::column(o.clone()).unwrap();
                encoder.decode(&column).cloned()
            })
            .collect::<Option<Vec<_>>>()
            .unwrap();
        assert_eq!(
            vec!["A", "A", "C", "B", "C"]
                .into_iter()
                .map(String::from)
                .collect::<Vec<_>>(),
            labels
        );
    }
}
