use anyhow::{anyhow, bail, Context};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use siamese_ordering::annotation::{
    collect_images, label_path_for, write_label_file, ClassRegistry, PixelRect, YoloLabel,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Write YOLO label files from rectangles drawn on a scaled display")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write the label file for one image
    Write {
        #[arg(short, long)]
        image: PathBuf,

        #[arg(short, long)]
        labels_dir: PathBuf,

        /// Display scale the rectangles were drawn at
        #[arg(short, long, default_value_t = 0.5)]
        scale: f32,

        /// Rectangle as "Class:x1,y1,x2,y2" in display pixels (repeatable)
        #[arg(short, long = "rect")]
        rects: Vec<String>,

        /// Extra class appended after the built-in ones (repeatable)
        #[arg(long = "class")]
        classes: Vec<String>,
    },
    /// List images in a folder that have no label file yet
    Status {
        #[arg(short, long)]
        images_dir: PathBuf,

        #[arg(short, long)]
        labels_dir: PathBuf,
    },
}

fn parse_rect(raw: &str, registry: &ClassRegistry) -> anyhow::Result<(usize, PixelRect)> {
    let (class, coords) = raw
        .rsplit_once(':')
        .ok_or_else(|| anyhow!("expected Class:x1,y1,x2,y2, got '{}'", raw))?;

    let class_index = registry
        .index_of(class)
        .ok_or_else(|| anyhow!("unknown class '{}'", class))?;

    let values = coords
        .split(',')
        .map(|v| v.trim().parse::<f32>())
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("bad coordinates in '{}'", raw))?;
    let &[x1, y1, x2, y2] = values.as_slice() else {
        bail!("expected four coordinates in '{}'", raw);
    };

    Ok((class_index, PixelRect::from_drag((x1, y1), (x2, y2))))
}

fn main() -> anyhow::Result<()> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    match Args::parse().command {
        Command::Write {
            image,
            labels_dir,
            scale,
            rects,
            classes,
        } => {
            if scale <= 0.0 {
                bail!("scale must be positive");
            }

            let mut registry = ClassRegistry::default();
            for class in &classes {
                registry.add(class);
            }

            let (width, height) = image::image_dimensions(&image)
                .with_context(|| format!("reading {}", image.display()))?;
            let display_w = width as f32 * scale;
            let display_h = height as f32 * scale;

            let labels = rects
                .iter()
                .map(|raw| {
                    parse_rect(raw, &registry)
                        .map(|(class, rect)| YoloLabel::from_pixel_rect(class, rect, display_w, display_h))
                })
                .collect::<anyhow::Result<Vec<_>>>()?;

            std::fs::create_dir_all(&labels_dir)?;
            let path = label_path_for(&image, &labels_dir)
                .ok_or_else(|| anyhow!("{} has no file name", image.display()))?;
            write_label_file(&path, &labels)?;

            println!("Wrote {} boxes to {}", labels.len(), path.display());
            for label in &labels {
                println!("  {}", label.to_line());
            }
        }
        Command::Status {
            images_dir,
            labels_dir,
        } => {
            let images = collect_images(&images_dir);
            let pending: Vec<_> = images
                .iter()
                .filter(|img| {
                    label_path_for(img, &labels_dir)
                        .map(|p| !p.exists())
                        .unwrap_or(true)
                })
                .collect();

            println!(
                "{} images, {} labelled, {} pending",
                images.len(),
                images.len() - pending.len(),
                pending.len()
            );
            for img in pending {
                println!("  {}", img.display());
            }
        }
    }

    Ok(())
}
