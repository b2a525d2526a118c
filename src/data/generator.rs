use crate::data::loader::ImageLoader;
use crate::data::manifest::Sample;
use crate::error::{Result, TrainError};
use std::path::PathBuf;

/// One batch of image pairs, aligned by position.
#[derive(Debug, Clone)]
pub struct PairBatch {
    /// Positions of the samples in the underlying sequence.
    pub indices: Vec<usize>,
    pub paths_a: Vec<PathBuf>,
    pub paths_b: Vec<PathBuf>,
    /// Decoded CHW images, one buffer per sample.
    pub images_a: Vec<Vec<f32>>,
    pub images_b: Vec<Vec<f32>>,
    pub labels: Vec<u8>,
    pub image_size: usize,
}

impl PairBatch {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Side A images flattened into one `[N, 3, S, S]` buffer.
    pub fn flat_images_a(&self) -> Vec<f32> {
        self.images_a.concat()
    }

    pub fn flat_images_b(&self) -> Vec<f32> {
        self.images_b.concat()
    }
}

/// Cyclic, in-order batch producer over a fixed sample sequence.
///
/// The cursor only moves forward and wraps to zero after the last
/// (possibly short) batch. Build a new generator to restart.
pub struct PairBatchGenerator<'a, L: ImageLoader + ?Sized> {
    samples: &'a [Sample],
    batch_size: usize,
    loader: &'a L,
    cursor: usize,
}

impl<'a, L: ImageLoader + ?Sized> PairBatchGenerator<'a, L> {
    pub fn new(samples: &'a [Sample], batch_size: usize, loader: &'a L) -> Result<Self> {
        if batch_size == 0 {
            return Err(TrainError::Config("batch size must be positive".into()));
        }
        if samples.is_empty() {
            return Err(TrainError::Config(
                "cannot generate batches from an empty sample list".into(),
            ));
        }

        Ok(Self {
            samples,
            batch_size,
            loader,
            cursor: 0,
        })
    }

    /// Distinct batches produced before the sequence repeats.
    pub fn batches_per_cycle(&self) -> usize {
        (self.samples.len() + self.batch_size - 1) / self.batch_size
    }

    fn next_range(&mut self) -> std::ops::Range<usize> {
        let start = self.cursor;
        let end = (start + self.batch_size).min(self.samples.len());
        self.cursor = if end >= self.samples.len() { 0 } else { end };
        start..end
    }

    /// Produce the batch at the cursor and advance.
    pub fn next_batch(&mut self) -> Result<PairBatch> {
        let range = self.next_range();
        let chunk = &self.samples[range.clone()];

        let mut batch = PairBatch {
            indices: range.collect(),
            paths_a: Vec::with_capacity(chunk.len()),
            paths_b: Vec::with_capacity(chunk.len()),
            images_a: Vec::with_capacity(chunk.len()),
            images_b: Vec::with_capacity(chunk.len()),
            labels: Vec::with_capacity(chunk.len()),
            image_size: self.loader.image_size(),
        };

        for sample in chunk {
            batch.images_a.push(self.loader.load(&sample.first)?);
            batch.images_b.push(self.loader.load(&sample.second)?);
            batch.paths_a.push(sample.first.clone());
            batch.paths_b.push(sample.second.clone());
            batch.labels.push(sample.label);
        }

        log::debug!(
            "Generated batch of {} pairs ({:?}..)",
            batch.len(),
            batch.indices.first()
        );

        Ok(batch)
    }
}

impl<L: ImageLoader + ?Sized> Iterator for PairBatchGenerator<'_, L> {
    type Item = Result<PairBatch>;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.next_batch())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    struct ConstLoader;

    impl ImageLoader for ConstLoader {
        fn image_size(&self) -> usize {
            1
        }

        fn load(&self, _path: &Path) -> Result<Vec<f32>> {
            Ok(vec![0.5; 3])
        }
    }

    fn samples(n: usize) -> Vec<Sample> {
        (0..n)
            .map(|i| Sample {
                first: PathBuf::from(format!("a{}.jpg", i)),
                second: PathBuf::from(format!("b{}.jpg", i)),
                label: (i % 2) as u8,
            })
            .collect()
    }

    #[test]
    fn partitions_then_wraps() {
        let data = samples(5);
        let mut gen = PairBatchGenerator::new(&data, 2, &ConstLoader).unwrap();
        assert_eq!(gen.batches_per_cycle(), 3);

        let seen: Vec<Vec<usize>> = (0..4).map(|_| gen.next_batch().unwrap().indices).collect();
        assert_eq!(seen, vec![vec![0, 1], vec![2, 3], vec![4], vec![0, 1]]);
    }

    #[test]
    fn one_cycle_covers_every_sample_once() {
        let data = samples(11);
        let mut gen = PairBatchGenerator::new(&data, 3, &ConstLoader).unwrap();
        let cycle = gen.batches_per_cycle();
        let mut all: Vec<usize> = Vec::new();
        for _ in 0..cycle {
            all.extend(gen.next_batch().unwrap().indices);
        }
        assert_eq!(all, (0..11).collect::<Vec<_>>());
    }

    #[test]
    fn batch_carries_paths_images_and_labels() {
        let data = samples(3);
        let mut gen = PairBatchGenerator::new(&data, 3, &ConstLoader).unwrap();
        let batch = gen.next().unwrap().unwrap();
        assert_eq!(batch.len(), 3);
        assert_eq!(batch.paths_b[2], PathBuf::from("b2.jpg"));
        assert_eq!(batch.labels, vec![0, 1, 0]);
        assert_eq!(batch.flat_images_a().len(), 9);
    }

    #[test]
    fn rejects_empty_input_and_zero_batch() {
        let empty: Vec<Sample> = Vec::new();
        assert!(PairBatchGenerator::new(&empty, 2, &ConstLoader).is_err());
        let data = samples(2);
        assert!(PairBatchGenerator::new(&data, 0, &ConstLoader).is_err());
    }
}
