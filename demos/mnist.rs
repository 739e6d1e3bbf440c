use std::{env, error::Error, rc::Rc};

use log::info;
use nnni::{
    activation,
    data::{CsvLoader, Sampler},
    loss::MeanSquaredError,
    metrics::accuracy,
    network::NetworkBuilder,
    random::MersenneLcg,
    OneHotEncoder,
};
use rand::{rngs::StdRng, SeedableRng};

// Train on MNIST in CSV form (label followed by 784 pixel values per line),
// available here: https://pjreddie.com/projects/mnist-in-csv/
//
// usage: mnist [train.csv] [test.csv] [epochs] [learning rate] [activation]
fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let mut args = env::args().skip(1);
    let train_path = args
        .next()
        .unwrap_or_else(|| "mnistdata/mnist_train.csv".to_string());
    let test_path = args
        .next()
        .unwrap_or_else(|| "mnistdata/mnist_test.csv".to_string());
    let epochs: usize = args.next().map(|v| v.parse()).transpose()?.unwrap_or(1);
    let learning_rate: f64 = args.next().map(|v| v.parse()).transpose()?.unwrap_or(0.03);
    let act = activation::by_name(&args.next().unwrap_or_else(|| "leaky_relu".to_string()))?;

    let loader = CsvLoader::new().scale(255.0);
    let train_data = loader.load_path(&train_path)?;
    let test_data = loader.load_path(&test_path)?;
    println!(
        "loaded {} training and {} test samples",
        train_data.len(),
        test_data.len()
    );

    let mut net = NetworkBuilder::new(Rc::new(MeanSquaredError))
        .layer(784, 16, act.clone())
        .layer(16, 16, act.clone())
        .layer(16, 10, act)
        .learning_rate(learning_rate)
        .build(&mut MersenneLcg::new(73))?;

    let encoder = OneHotEncoder::new((0..10).collect());
    let targets = (0..10)
        .map(|digit| encoder.encode(&digit))
        .collect::<Result<Vec<_>, _>>()?;

    println!("accuracy before training: {}", accuracy(&net, &test_data)?);

    let mut sampler = Sampler::Random(train_data.len(), StdRng::seed_from_u64(0));
    for epoch in 0..epochs {
        for (i, sample) in sampler.epoch(&train_data)?.enumerate() {
            if i % 10000 == 0 {
                info!("epoch {}: {} samples", epoch, i);
            }
            net.train(&sample.features, &targets[sample.label])?;
        }
        println!(
            "epoch {}: accuracy {}",
            epoch,
            accuracy(&net, &test_data)?
        );
    }

    Ok(())
}
