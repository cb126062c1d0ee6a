use std::error::Error;
use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use ferrite_ffbp::{
    DatasetProvider, Experiment, ImageFolderProvider, SyntheticProvider, TracingSink, TrainConfig,
};

/// Train and test a feed-forward lesion classifier.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Experiment configuration (JSON).
    #[arg(short, long, value_name = "PATH")]
    config: PathBuf,
    /// Image directory with `malignant/` and `benign/` subdirectories.
    #[arg(short, long, value_name = "DIR", conflicts_with = "synthetic")]
    data: Option<PathBuf>,
    /// Use generated images, seeded with this value, instead of a directory.
    #[arg(long, value_name = "SEED")]
    synthetic: Option<u64>,
    /// Overrides the configured lesion threshold.
    #[arg(long, value_name = "FLOAT")]
    lesion_threshold: Option<f64>,
    /// Writes the full experiment report here as JSON.
    #[arg(long, value_name = "PATH")]
    report: Option<PathBuf>,
}

fn install_logger() {
    tracing_subscriber::fmt()
        .compact()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}

fn main() -> Result<(), Box<dyn Error>> {
    install_logger();
    let cli = Cli::parse();

    let config = TrainConfig::load_json(&cli.config.to_string_lossy())?;
    let mut provider: Box<dyn DatasetProvider> = match (cli.data, cli.synthetic) {
        (Some(dir), _) => Box::new(ImageFolderProvider::new(dir)),
        (None, Some(seed)) => Box::new(SyntheticProvider::new(seed)),
        (None, None) => return Err("either --data or --synthetic is required".into()),
    };

    let mut experiment = Experiment::new(config)?;
    if let Some(threshold) = cli.lesion_threshold {
        experiment.set_lesion_threshold(threshold)?;
    }
    let outcome = experiment.run(provider.as_mut(), &mut TracingSink)?;
    println!("Average testing error: {:.6}", outcome.mean_error());

    let cm = experiment.confusion_matrix()?;
    println!("Confusion matrix (rows = true, columns = predicted):");
    for row in cm.as_array() {
        println!("  {:>6} {:>6}", row[0], row[1]);
    }
    let pct = |v: Option<f64>| {
        v.map(|v| format!("{:.2}%", v * 100.0)).unwrap_or_else(|| "n/a".into())
    };
    println!(
        "Accuracy {}  sensitivity {}  specificity {}",
        pct(cm.accuracy()),
        pct(cm.sensitivity()),
        pct(cm.specificity())
    );

    let total: f64 = experiment.computing_time().iter().map(|d| d.as_secs_f64()).sum();
    println!("Training time: {:.3}s over {} epochs", total, experiment.history().len());

    if let Some(path) = cli.report {
        experiment.report()?.save_json(&path.to_string_lossy())?;
        println!("Report written to {}", path.display());
    }
    Ok(())
}
