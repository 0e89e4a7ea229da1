use maxent::train::{MaxEnt, Perceptron, PerceptronWeights, Trainer};
use maxent::{accuracy, MostFrequentLabel, NameFeatures};

const TRAIN: &[(&str, &str)] = &[
    ("Xanax", "drug"),
    ("Valium", "drug"),
    ("Prozac", "drug"),
    ("Zoloft", "drug"),
    ("Lipitor", "drug"),
    ("Ambien", "drug"),
    ("Boston", "place"),
    ("Denver", "place"),
    ("Chicago", "place"),
    ("New Orleans", "place"),
    ("Lake Tahoe", "place"),
    ("Jaws", "movie"),
    ("The Godfather", "movie"),
    ("Star Wars", "movie"),
    ("Acme Corp", "company"),
    ("General Motors", "company"),
    ("Mary Smith", "person"),
    ("John Adams", "person"),
];

const TEST: &[(&str, &str)] = &[
    ("Zantac", "drug"),
    ("Paxil", "drug"),
    ("Austin", "place"),
    ("New Haven", "place"),
    ("Star Trek", "movie"),
    ("General Electric", "company"),
    ("John Smith", "person"),
];

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::default()
        .parse_env(env_logger::Env::default().filter_or("MAXENT_LOG", "info"))
        .init();

    println!("Proper Name Classification Example");
    println!("==================================\n");
    println!("Training names: {}", TRAIN.len());
    println!("Test names: {}\n", TEST.len());

    let labels = || TRAIN.iter().map(|&(_, label)| label);
    let pairs = |data: &'static [(&'static str, &'static str)]| {
        data.iter().map(|&(name, label)| (name, label))
    };

    let baseline: MostFrequentLabel<str, &str> = MostFrequentLabel::train(labels())?;
    println!("Baseline accuracy: {:.3}", accuracy(&baseline, pairs(TEST))?);

    let mut trainer: Trainer<MaxEnt, NameFeatures, &str> =
        Trainer::maxent(NameFeatures).with_sigma(1.0)?;
    trainer.verbose(true);
    trainer.set("max_iterations", "200")?;
    trainer.extend(pairs(TRAIN));
    let maxent = trainer.train()?;
    println!("Maxent accuracy: {:.3}", accuracy(&maxent, pairs(TEST))?);

    let mut trainer: Trainer<Perceptron, NameFeatures, &str> = Trainer::perceptron(NameFeatures)
        .with_iterations(20)?
        .with_shuffle_seed(42)
        .with_weights(PerceptronWeights::Averaged);
    trainer.extend(pairs(TRAIN));
    let perceptron = trainer.train()?;
    println!("Perceptron accuracy: {:.3}\n", accuracy(&perceptron, pairs(TEST))?);

    for &(name, gold) in TEST {
        let probs = maxent.probabilities(name)?;
        let guess = maxent.label(name)?;
        println!(
            "{:<18} gold={:<8} guess={:<8} p={:.3}",
            name,
            gold,
            guess,
            probs.get(guess)
        );
    }

    Ok(())
}
