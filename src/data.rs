use std::{fs::File, io, path::Path};

use log::debug;
use rand::{rngs::StdRng, seq::index::sample, seq::SliceRandom};
use thiserror::Error;

use crate::matrix::Matrix;

/// Errors raised while reading a dataset.
#[derive(Error, Debug)]
pub enum DataError {
    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error("record {record}: invalid label {value:?}")]
    Label { record: usize, value: String },

    #[error("record {record}: invalid feature {value:?}")]
    Feature { record: usize, value: String },

    #[error("record {record}: expected {expected} features, found {found}")]
    Width {
        record: usize,
        expected: usize,
        found: usize,
    },

    #[error("sampler covers {expected} samples but the dataset has {found}")]
    SamplerSize { expected: usize, found: usize },

    #[error(transparent)]
    Matrix(#[from] crate::Error),
}

/// A labelled example. `features` is an `(n, 1)` column.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub label: usize,
    pub features: Matrix,
}

/// Reads records of the form `label,f1,f2,...,fn` into `Sample`s.
#[derive(Debug, Clone)]
pub struct CsvLoader {
    has_headers: bool,
    scale: f64,
}

impl Default for CsvLoader {
    fn default() -> Self {
        Self {
            has_headers: false,
            scale: 1.0,
        }
    }
}

impl CsvLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Skip the first record.
    pub fn has_headers(self, has_headers: bool) -> Self {
        Self {
            has_headers,
            ..self
        }
    }

    /// Divide every feature by `scale`, e.g. 255 for 8-bit pixels.
    pub fn scale(self, scale: f64) -> Self {
        Self { scale, ..self }
    }

    pub fn load_path(&self, path: impl AsRef<Path>) -> Result<Vec<Sample>, DataError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(csv::Error::from)?;
        let samples = self.load_reader(file)?;
        debug!("loaded {} samples from {}", samples.len(), path.display());
        Ok(samples)
    }

    pub fn load_reader<R: io::Read>(&self, reader: R) -> Result<Vec<Sample>, DataError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(self.has_headers)
            .flexible(true)
            .from_reader(reader);

        let mut samples = Vec::new();
        let mut width = None;
        for (record_index, row) in reader.records().enumerate() {
            let row = row?;
            let mut fields = row.iter();

            let label_field = fields.next().unwrap_or_default().trim();
            let label = label_field.parse().map_err(|_| DataError::Label {
                record: record_index,
                value: label_field.to_string(),
            })?;

            let features = fields
                .map(|field| {
                    let field = field.trim();
                    field
                        .parse::<f64>()
                        .map(|v| v / self.scale)
                        .map_err(|_| DataError::Feature {
                            record: record_index,
                            value: field.to_string(),
                        })
                })
                .collect::<Result<Vec<_>, _>>()?;

            let expected = *width.get_or_insert(features.len());
            if features.len() != expected {
                return Err(DataError::Width {
                    record: record_index,
                    expected,
                    found: features.len(),
                });
            }

            samples.push(Sample {
                label,
                features: Matrix::column(features)?,
            });
        }
        Ok(samples)
    }
}

/// Sampler produces the order in which samples are visited in one epoch.
pub enum Sampler {
    Sequential(usize),
    Random(usize, StdRng),
}

impl Sampler {
    pub fn size(&self) -> usize {
        match self {
            Self::Sequential(size) | Self::Random(size, _) => *size,
        }
    }

    pub fn sample(&mut self) -> Vec<usize> {
        match self {
            Self::Sequential(size) => (0..*size).collect(),
            Self::Random(size, rng) => sample(rng, *size, *size).into_vec(),
        }
    }

    /// Iterate over `samples` in this sampler's order. `samples` must have
    /// exactly `size()` elements.
    pub fn epoch<'a>(
        &mut self,
        samples: &'a [Sample],
    ) -> Result<impl Iterator<Item = &'a Sample>, DataError> {
        if samples.len() != self.size() {
            return Err(DataError::SamplerSize {
                expected: self.size(),
                found: samples.len(),
            });
        }
        Ok(self.sample().into_iter().map(move |index| &samples[index]))
    }
}

/// Shuffle `samples` and split off the last `test_ratio` share as test data.
pub fn train_test_split(
    samples: Vec<Sample>,
    test_ratio: f64,
    rng: &mut StdRng,
) -> (Vec<Sample>, Vec<Sample>) {
    let n_trains = (samples.len() as f64 * (1.0 - test_ratio)) as usize;
    let mut samples = samples;
    samples.shuffle(rng);
    let test = samples.split_off(n_trains.min(samples.len()));
    (samples, test)
}
