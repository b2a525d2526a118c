use crate::error::{Result, TrainError};
use std::path::Path;

/// Decodes an image reference into a normalized CHW buffer of
/// `3 * image_size * image_size` values in `[0, 1]`.
pub trait ImageLoader {
    fn image_size(&self) -> usize;

    fn load(&self, path: &Path) -> Result<Vec<f32>>;
}

/// Reads images from disk, resizes them to a square and scales pixels to `[0, 1]`.
#[derive(Debug, Clone)]
pub struct FileImageLoader {
    image_size: usize,
}

impl FileImageLoader {
    pub fn new(image_size: usize) -> Self {
        Self { image_size }
    }
}

impl ImageLoader for FileImageLoader {
    fn image_size(&self) -> usize {
        self.image_size
    }

    fn load(&self, path: &Path) -> Result<Vec<f32>> {
        let img = image::open(path).map_err(|source| TrainError::Image {
            path: path.to_path_buf(),
            source,
        })?;

        let size = self.image_size as u32;
        let rgb = img
            .resize_exact(size, size, image::imageops::FilterType::Triangle)
            .to_rgb8();

        let mut data = Vec::with_capacity(3 * self.image_size * self.image_size);
        for c in 0..3 {
            for y in 0..size {
                for x in 0..size {
                    data.push(rgb.get_pixel(x, y)[c] as f32 / 255.0);
                }
            }
        }

        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn loads_chw_normalized() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("red.png");
        RgbImage::from_pixel(10, 6, Rgb([255, 0, 51])).save(&path).unwrap();

        let loader = FileImageLoader::new(4);
        let data = loader.load(&path).unwrap();
        assert_eq!(data.len(), 3 * 4 * 4);
        assert!(data[..16].iter().all(|&v| (v - 1.0).abs() < 1e-6));
        assert!(data[16..32].iter().all(|&v| v.abs() < 1e-6));
        assert!(data[32..].iter().all(|&v| (v - 0.2).abs() < 1e-6));
    }

    #[test]
    fn missing_file_is_an_error() {
        let loader = FileImageLoader::new(4);
        assert!(loader.load(Path::new("/definitely/not/here.png")).is_err());
    }
}
