use std::rc::Rc;

use nnni::{
    activation::LeakyRelu,
    loss::MeanSquaredError,
    matrix::Matrix,
    network::{NetworkBuilder, NeuralNetwork},
    random::{MersenneLcg, RandomSource},
};

fn build(rng: &mut impl RandomSource) -> NeuralNetwork {
    let act = Rc::new(LeakyRelu::default());
    NetworkBuilder::new(Rc::new(MeanSquaredError))
        .layer(2, 3, act.clone())
        .layer(3, 4, act.clone())
        .layer(4, 1, act)
        .learning_rate(0.01)
        .build(rng)
        .unwrap()
}

fn total_loss(net: &NeuralNetwork, inputs: &[Matrix], target: &Matrix) -> f64 {
    inputs
        .iter()
        .map(|x| net.loss(&net.forward(x).unwrap(), target).unwrap())
        .sum()
}

#[test]
fn fixed_pair_loss_decreases() {
    let mut rng = MersenneLcg::new(73);
    let act = Rc::new(LeakyRelu::default());
    let mut net = NetworkBuilder::new(Rc::new(MeanSquaredError))
        .layer(3, 5, act.clone())
        .layer(5, 2, act)
        .learning_rate(0.005)
        .build(&mut rng)
        .unwrap();

    let x = Matrix::column(vec![0.2, -0.6, 0.9]).unwrap();
    let t = Matrix::column(vec![0.5, 1.0]).unwrap();
    let before = net.loss(&net.forward(&x).unwrap(), &t).unwrap();
    for _ in 0..1000 {
        net.train(&x, &t).unwrap();
    }
    let after = net.loss(&net.forward(&x).unwrap(), &t).unwrap();
    assert!(after < before, "loss went from {} to {}", before, after);
}

#[test]
fn regression_towards_constant_target() {
    let mut rng = MersenneLcg::new(2022);
    let mut net = build(&mut rng);
    let target = Matrix::filled(0.5, 1, 1).unwrap();
    let inputs = (0..100)
        .map(|_| Matrix::random_uniform(2, 1, &mut rng).unwrap())
        .collect::<Vec<_>>();

    let before = total_loss(&net, &inputs, &target);
    for _ in 0..1000 {
        let x = Matrix::random_uniform(2, 1, &mut rng).unwrap();
        net.train(&x, &target).unwrap();
    }
    let after = total_loss(&net, &inputs, &target);
    assert!(after < before, "loss went from {} to {}", before, after);
}

#[test]
fn same_seed_same_network() {
    let a = build(&mut MersenneLcg::new(42));
    let b = build(&mut MersenneLcg::new(42));
    for (la, lb) in a.layers().iter().zip(b.layers()) {
        assert_eq!(la.weights(), lb.weights());
        assert_eq!(la.bias(), lb.bias());
    }

    let x = Matrix::column(vec![0.3, 0.4]).unwrap();
    assert_eq!(a.forward(&x).unwrap(), b.forward(&x).unwrap());

    let c = build(&mut MersenneLcg::new(43));
    assert_ne!(a.layers()[0].weights(), c.layers()[0].weights());
}

#[test]
fn same_seed_same_matrix() {
    let m1 = Matrix::random_uniform(4, 3, &mut MersenneLcg::new(7)).unwrap();
    let m2 = Matrix::random_uniform(4, 3, &mut MersenneLcg::new(7)).unwrap();
    assert_eq!(m1, m2);
}
