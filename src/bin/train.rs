use anyhow::Context;
use burn::backend::{Autodiff, NdArray};
use clap::Parser;
use std::path::{Path, PathBuf};

use siamese_ordering::data::{FileImageLoader, Manifest};
use siamese_ordering::detection::LabelFileDetector;
use siamese_ordering::model::adam_learner;
use siamese_ordering::training::{EpochOutcome, StopSignal, Trainer, TrainingConfig};

#[derive(Parser, Debug)]
#[command(author, version, about = "Train the Siamese temporal-ordering model")]
struct Args {
    /// Training config (created with defaults if missing)
    #[arg(short, long, default_value = "configs/train_config.yaml")]
    config: PathBuf,

    /// Dataset manifest (JSON with train/test partitions)
    #[arg(short, long)]
    manifest: Option<PathBuf>,

    /// Directory of exported detection label files
    #[arg(short, long)]
    detections: Option<PathBuf>,

    #[arg(short, long)]
    epochs: Option<usize>,

    #[arg(short, long)]
    batch_size: Option<usize>,

    #[arg(short, long)]
    save_dir: Option<PathBuf>,
}

fn load_config(path: &Path) -> anyhow::Result<TrainingConfig> {
    if path.exists() {
        println!("Loading config from {}", path.display());
        return Ok(TrainingConfig::from_yaml(path)?);
    }

    let config = TrainingConfig::default();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    config.save(path)?;
    println!("Created default config at {}", path.display());
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let args = Args::parse();

    type MyBackend = NdArray;
    type MyAutodiffBackend = Autodiff<MyBackend>;
    let device = Default::default();

    let mut config = load_config(&args.config)?;
    if let Some(manifest) = args.manifest {
        config.manifest_path = manifest;
    }
    if let Some(dir) = args.detections {
        config.detections_dir = Some(dir);
    }
    if let Some(epochs) = args.epochs {
        config.epochs = epochs;
    }
    if let Some(batch_size) = args.batch_size {
        config.batch_size = batch_size;
    }
    if let Some(save_dir) = args.save_dir {
        config.save_dir = save_dir;
    }

    println!("\nTraining Configuration:");
    println!("  Manifest: {}", config.manifest_path.display());
    println!("  Epochs: {}", config.epochs);
    println!("  Batch size: {}", config.batch_size);
    println!("  Learning rate: {}", config.learning_rate);
    println!("  Image size: {}x{}", config.image_size, config.image_size);
    println!("  Classes: {}", config.num_classes);
    println!("  Patience: {} ({:?})", config.patience, config.early_stop_rule);
    println!("  Save dir: {}", config.save_dir.display());
    println!();

    let manifest = Manifest::load(&config.manifest_path)
        .with_context(|| format!("loading {}", config.manifest_path.display()))?;
    let train = manifest.train.samples();
    let test = manifest.test.samples();
    println!("training length: {}, testing length: {}", train.len(), test.len());
    let plan = config.plan(train.len(), test.len())?;
    println!(
        "  Steps per epoch: {} train, {} validation",
        plan.train_steps, plan.validation_steps
    );

    let detector = match &config.detections_dir {
        Some(dir) => LabelFileDetector::new(dir),
        None => LabelFileDetector::beside_images(),
    };
    let loader = FileImageLoader::new(config.image_size);

    let learner = adam_learner::<MyAutodiffBackend>(
        &device,
        &config.model_config(),
        config.learning_rate,
        config.weight_decay,
        config.freeze_encoder,
    );

    let stop = StopSignal::new();
    stop.install_ctrl_c()?;

    let mut trainer = Trainer::new(learner, config, detector, loader, stop);
    let report = trainer.run(&train, &test)?;

    match report.outcome {
        EpochOutcome::Interrupted => println!(
            "\nTraining interrupted after {} completed epochs",
            report.epochs_completed
        ),
        EpochOutcome::StopEarly => println!(
            "\nStopped early after {} epochs",
            report.epochs_completed
        ),
        _ => println!("\nTraining completed: {} epochs", report.epochs_completed),
    }
    if let Some(dir) = report.checkpoint {
        println!("Model saved in {}", dir.display());
    }
    println!(
        "History written to {}",
        trainer.config().save_dir.join("history.json").display()
    );
    if report.epochs_completed > 0 {
        println!(
            "Training curves written to {}",
            trainer.config().save_dir.join("history.png").display()
        );
    }

    Ok(())
}
