use rand::{rngs::StdRng, SeedableRng};

use ferrite_cnn::network::{MNIST_CLASSES, MNIST_INPUT};
use ferrite_cnn::{inference, Case, ConfigError, LayerKind, Network, Shape, Tensor};

fn digit_case(class: usize, seed: u64) -> Case {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut input = Tensor::random_with(MNIST_INPUT, &mut rng);
    // Map [-1, 1) into [0, 1) like a normalized image.
    input.as_mut_slice().iter_mut().for_each(|v| *v = (*v + 1.0) / 2.0);
    let mut target = Tensor::zeros(Shape::new(MNIST_CLASSES, 1, 1));
    target.set(class, 0, 0, 1.0);
    Case { input, target }
}

#[test]
fn mnist_chain_has_expected_intermediate_shapes() {
    let net = Network::mnist_seeded(0.001, 17).unwrap();
    let summary = net.summary();

    let kinds: Vec<LayerKind> = summary.iter().map(|s| s.kind).collect();
    assert_eq!(
        kinds,
        vec![LayerKind::Convolution, LayerKind::Rectifier, LayerKind::Pooling, LayerKind::FullyConnected]
    );
    let outputs: Vec<Shape> = summary.iter().map(|s| s.output).collect();
    assert_eq!(
        outputs,
        vec![Shape::new(24, 24, 8), Shape::new(24, 24, 8), Shape::new(12, 12, 8), Shape::new(10, 1, 1)]
    );
    assert_eq!(summary[0].input, Shape::new(28, 28, 1));
}

#[test]
fn train_one_returns_non_negative_error() {
    let mut net = Network::mnist_seeded(0.001, 3).unwrap();
    let case = digit_case(7, 99);
    let err = net.train_one(&case.input, &case.target);
    assert!(err.is_finite());
    assert!(err >= 0.0);
}

#[test]
fn infer_is_idempotent() {
    let mut net = Network::mnist_seeded(0.001, 4).unwrap();
    let case = digit_case(2, 5);

    let first = net.infer(&case.input);
    let second = net.infer(&case.input);
    assert_eq!(first, second);
    assert_eq!(first.shape(), Shape::new(10, 1, 1));
}

#[test]
fn repeated_training_pulls_output_toward_target() {
    let mut net = Network::mnist_seeded(0.0005, 11).unwrap();
    let case = digit_case(4, 12);

    let before = net.train_one(&case.input, &case.target);
    let mut after = before;
    for _ in 0..30 {
        after = net.train_one(&case.input, &case.target);
    }
    assert!(after < before, "error went from {before} to {after}");

    let output = net.infer(&case.input);
    assert_eq!(output.argmax(), 4);
    assert_eq!(inference::predictions(&output).len(), MNIST_CLASSES);
}

#[test]
fn evaluate_counts_matching_classes() {
    let mut net = Network::mnist_seeded(0.001, 6).unwrap();
    let cases: Vec<Case> = (0..3).map(|k| digit_case(k, 20 + k as u64)).collect();
    let accuracy = net.evaluate(&cases);
    assert!((0.0..=1.0).contains(&accuracy));
    assert_eq!(net.evaluate(&[]), 0.0);
}

#[test]
fn bad_geometry_fails_at_build_time() {
    let err = Network::builder(Shape::new(28, 28, 1)).conv(1, 5, 8).pool(5, 5).build().unwrap_err();
    assert!(matches!(err, ConfigError::MisalignedStride { layer: "pooling", .. }));
}

#[test]
#[should_panic(expected = "convolution built for")]
fn wrong_input_shape_panics() {
    let mut net = Network::mnist_seeded(0.001, 1).unwrap();
    net.infer(&Tensor::zeros(Shape::new(14, 14, 1)));
}
