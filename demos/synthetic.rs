/// Lesion-classification demo on generated 8×8 grayscale images.
///
/// Architecture: 64 → 6 (Sigmoid) → 1 (Sigmoid)
/// Training:     online backpropagation, η = 0.01, early stopping on validation error
///
/// Run with:
///   cargo run --example synthetic --release
use ferrite_ffbp::{Experiment, SyntheticProvider, TracingSink, TrainConfig};

fn main() -> Result<(), ferrite_ffbp::Error> {
    tracing_subscriber::fmt().compact().init();

    let config = TrainConfig {
        input_length: 8,
        input_width: 8,
        hidden_layers: vec![6],
        learning_rate: 0.01,
        training_len: 200,
        validation_len: 50,
        testing_len: 50,
        max_epochs: 30,
        error_threshold: 0.01,
        lesion_threshold: 0.5,
        seed: Some(42),
    };

    let mut experiment = Experiment::new(config)?;
    experiment.run(&mut SyntheticProvider::new(7), &mut TracingSink)?;

    for stats in experiment.history() {
        println!(
            "Epoch {:>3}: train = {:.6}  val = {:.6}  ({:?})",
            stats.epoch, stats.train_error, stats.val_error, stats.elapsed
        );
    }
    let cm = experiment.confusion_matrix()?;
    println!("Confusion matrix: {:?}", cm.as_array());
    if let Some(acc) = cm.accuracy() {
        println!("Test accuracy: {:.2}%", acc * 100.0);
    }
    Ok(())
}
