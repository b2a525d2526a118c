use anyhow::Context;
use burn::backend::NdArray;
use burn::backend::ndarray::NdArrayDevice;
use clap::Parser;
use std::path::PathBuf;

use siamese_ordering::data::{FileImageLoader, PairBatchGenerator, Sample};
use siamese_ordering::detection::{DetectionAdapter, DetectionRequest, LabelFileDetector};
use siamese_ordering::model::{load_model, score_batch, DECISION_THRESHOLD};
use siamese_ordering::training::read_checkpoint_info;

#[derive(Parser, Debug)]
#[command(author, version, about = "Score whether image A precedes image B")]
struct Args {
    /// Earlier image candidate
    #[arg(short = 'a', long)]
    first: PathBuf,

    /// Later image candidate
    #[arg(short = 'b', long)]
    second: PathBuf,

    /// Checkpoint directory (e.g. runs/siamese/best)
    #[arg(short, long, default_value = "runs/siamese/best")]
    weights: PathBuf,

    /// Directory of exported detection label files
    #[arg(short, long)]
    detections: Option<PathBuf>,

    /// Detection confidence threshold
    #[arg(short, long, default_value_t = 0.35)]
    conf: f32,
}

fn main() -> anyhow::Result<()> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let args = Args::parse();

    type MyBackend = NdArray;
    let device = NdArrayDevice::default();

    let info = read_checkpoint_info(&args.weights)
        .with_context(|| format!("reading {}", args.weights.display()))?;
    println!("Loading model from {}", args.weights.display());
    println!("  Classes: {}", info.model_config.num_classes);
    println!("  Image Size: {}", info.image_size);

    let model = load_model::<MyBackend>(&args.weights.join("model"), &info.model_config, &device)?;

    let detector = match args.detections {
        Some(dir) => LabelFileDetector::new(dir),
        None => LabelFileDetector::beside_images(),
    };
    let request = DetectionRequest {
        conf_threshold: args.conf,
        ..Default::default()
    };
    let adapter = DetectionAdapter::new(detector, request, info.model_config.num_classes);
    let loader = FileImageLoader::new(info.image_size);

    let pair = [Sample {
        first: args.first.clone(),
        second: args.second.clone(),
        label: 0,
    }];
    let batch = PairBatchGenerator::new(&pair, 1, &loader)?.next_batch()?;
    let batch = adapter.enrich(batch)?;

    println!("  Detections A: {:?}", batch.freq_a[0].as_slice());
    println!("  Detections B: {:?}", batch.freq_b[0].as_slice());

    let score = score_batch(&model, &batch, &device)?
        .first()
        .copied()
        .context("model returned no score")?;

    println!();
    println!("Score: {:.4}", score);
    if score >= DECISION_THRESHOLD {
        println!("{} comes before {}", args.first.display(), args.second.display());
    } else {
        println!("{} does not come before {}", args.first.display(), args.second.display());
    }

    Ok(())
}
