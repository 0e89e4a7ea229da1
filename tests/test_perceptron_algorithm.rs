use maxent::train::{Perceptron, PerceptronWeights, Trainer};
use maxent::{accuracy, Counter, Identity};

fn weather_data() -> Vec<(Counter<String>, &'static str)> {
    vec![
        (Counter::from(&["walk", "shop"][..]), "sunny"),
        (Counter::from(&["walk"][..]), "sunny"),
        (Counter::from(&["clean"][..]), "rainy"),
        (Counter::from(&["clean", "shop"][..]), "rainy"),
        (Counter::from([("walk".to_string(), 2.0)]), "sunny"),
        (Counter::from([("clean".to_string(), 0.5)]), "rainy"),
    ]
}

fn trainer(seed: u64) -> Trainer<Perceptron, Identity<String>, &'static str> {
    let mut trainer = Trainer::perceptron(Identity::new())
        .with_iterations(20)
        .unwrap()
        .with_shuffle_seed(seed);
    trainer.verbose(true);
    let data = weather_data();
    trainer.extend(data.iter().map(|(c, l)| (c, l)));
    trainer
}

/// Test that the perceptron fits linearly separable data
#[test]
fn test_perceptron_separable_data() {
    let data = weather_data();
    for seed in 0..5 {
        let classifier = trainer(seed).train().unwrap();
        let acc = accuracy(&classifier, data.iter().map(|(c, l)| (c, l))).unwrap();
        assert_eq!(acc, 1.0, "seed {}", seed);
    }
}

#[test]
fn test_perceptron_seeded_runs_are_identical() {
    let first = trainer(42).train().unwrap();
    let second = trainer(42).train().unwrap();
    assert_eq!(first.weights(), second.weights());
}

#[test]
fn test_perceptron_averaged_weights() {
    let data = weather_data();
    for seed in 0..5 {
        let classifier = trainer(seed)
            .with_weights(PerceptronWeights::Averaged)
            .train()
            .unwrap();
        let acc = accuracy(&classifier, data.iter().map(|(c, l)| (c, l))).unwrap();
        assert_eq!(acc, 1.0, "seed {}", seed);

        let final_weights = trainer(seed).train().unwrap();
        assert_eq!(final_weights.weights().len(), classifier.weights().len());
    }
}

#[test]
fn test_perceptron_probabilities_are_normalized() {
    let classifier = trainer(7).train().unwrap();
    let probs = classifier
        .probabilities(&Counter::from(&["walk", "clean"][..]))
        .unwrap();
    assert!((probs.total() - 1.0).abs() < 1e-9);
    assert_eq!(probs.len(), 2);
}

#[test]
fn test_perceptron_string_params() {
    let mut weather = trainer(1);
    weather.set("iterations", "3").unwrap();
    weather.set("weights", "averaged").unwrap();
    assert_eq!(weather.get("iterations").unwrap(), "3");
    assert_eq!(weather.params().weights(), PerceptronWeights::Averaged);
    assert!(weather.train().is_ok());
}
