//! YOLO label files and the headless half of the box annotator.
//!
//! One line per box: `<class> <x_center> <y_center> <width> <height>`, the
//! four geometric values normalized to the image size with 6 decimals.
//! Detection exports may append a sixth `<confidence>` column.

use crate::error::{Result, TrainError};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub const IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

pub const DEFAULT_CLASSES: [&str; 5] = [
    "Scalpel",
    "Forceps",
    "Scissors",
    "Hook",
    "Hemostats or Clamps",
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YoloLabel {
    pub class_index: usize,
    pub x_center: f32,
    pub y_center: f32,
    pub width: f32,
    pub height: f32,
    pub confidence: Option<f32>,
}

/// Axis-aligned rectangle in display pixels, top-left origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl PixelRect {
    /// Rectangle spanned by a mouse drag, whichever corner it started from.
    pub fn from_drag(start: (f32, f32), end: (f32, f32)) -> Self {
        let min_x = start.0.min(end.0);
        let min_y = start.1.min(end.1);
        Self {
            x: min_x,
            y: min_y,
            width: start.0.max(end.0) - min_x,
            height: start.1.max(end.1) - min_y,
        }
    }
}

impl YoloLabel {
    /// Normalize a display-space rectangle against the displayed image size.
    pub fn from_pixel_rect(
        class_index: usize,
        rect: PixelRect,
        display_width: f32,
        display_height: f32,
    ) -> Self {
        Self {
            class_index,
            x_center: (rect.x + rect.width / 2.0) / display_width,
            y_center: (rect.y + rect.height / 2.0) / display_height,
            width: rect.width / display_width,
            height: rect.height / display_height,
            confidence: None,
        }
    }

    pub fn to_line(&self) -> String {
        let mut line = format!(
            "{} {:.6} {:.6} {:.6} {:.6}",
            self.class_index, self.x_center, self.y_center, self.width, self.height
        );
        if let Some(conf) = self.confidence {
            let _ = write!(line, " {:.6}", conf);
        }
        line
    }

    pub fn parse_line(line: &str) -> std::result::Result<Self, String> {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() != 5 && parts.len() != 6 {
            return Err(format!("expected 5 or 6 fields, found {}", parts.len()));
        }

        let class_index = parts[0]
            .parse::<f32>()
            .ok()
            .filter(|v| *v >= 0.0 && v.fract() == 0.0)
            .map(|v| v as usize)
            .ok_or_else(|| format!("invalid class index '{}'", parts[0]))?;

        let mut values = [0.0f32; 4];
        for (slot, raw) in values.iter_mut().zip(&parts[1..5]) {
            *slot = raw
                .parse::<f32>()
                .map_err(|_| format!("invalid coordinate '{}'", raw))?;
        }

        let confidence = match parts.get(5) {
            Some(raw) => Some(
                raw.parse::<f32>()
                    .map_err(|_| format!("invalid confidence '{}'", raw))?,
            ),
            None => None,
        };

        Ok(Self {
            class_index,
            x_center: values[0],
            y_center: values[1],
            width: values[2],
            height: values[3],
            confidence,
        })
    }
}

/// Label file path for an image: same stem, `.txt`, inside `labels_dir`.
pub fn label_path_for(image: &Path, labels_dir: &Path) -> Option<PathBuf> {
    let stem = image.file_stem()?;
    Some(labels_dir.join(stem).with_extension("txt"))
}

pub fn write_label_file(path: &Path, labels: &[YoloLabel]) -> Result<()> {
    let mut content = String::new();
    for label in labels {
        content.push_str(&label.to_line());
        content.push('\n');
    }
    std::fs::write(path, content)?;
    Ok(())
}

pub fn read_label_file(path: &Path) -> Result<Vec<YoloLabel>> {
    let content = std::fs::read_to_string(path)?;
    let mut labels = Vec::new();

    for (idx, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let label = YoloLabel::parse_line(line).map_err(|message| TrainError::Label {
            path: path.to_path_buf(),
            line: idx + 1,
            message,
        })?;
        labels.push(label);
    }

    Ok(labels)
}

/// Images under `dir`, sorted by path.
pub fn collect_images(dir: &Path) -> Vec<PathBuf> {
    let mut images: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|e| e.into_path())
        .filter(|p| {
            p.is_file()
                && p.extension()
                    .and_then(|e| e.to_str())
                    .map(|e| IMAGE_EXTENSIONS.contains(&e.to_lowercase().as_str()))
                    .unwrap_or(false)
        })
        .collect();
    images.sort();
    images
}

/// Ordered class names; the position is the class index written to label files.
#[derive(Debug, Clone)]
pub struct ClassRegistry {
    names: Vec<String>,
}

impl Default for ClassRegistry {
    fn default() -> Self {
        Self {
            names: DEFAULT_CLASSES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl ClassRegistry {
    pub fn new(names: Vec<String>) -> Self {
        let mut registry = Self { names: Vec::new() };
        for name in names {
            registry.add(&name);
        }
        registry
    }

    /// Append a class. Empty names and duplicates are ignored.
    pub fn add(&mut self, name: &str) -> Option<usize> {
        let name = name.trim();
        if name.is_empty() || self.index_of(name).is_some() {
            return None;
        }
        self.names.push(name.to_string());
        Some(self.names.len() - 1)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
