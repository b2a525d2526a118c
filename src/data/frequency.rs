/// Number of object classes the detector was trained on.
pub const DEFAULT_NUM_CLASSES: usize = 7;

/// Fixed-length count histogram of detected classes for one image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrequencyVector {
    counts: Vec<u32>,
}

impl FrequencyVector {
    /// Count occurrences of each class in `[0, num_classes)`.
    /// Indices outside the vocabulary are dropped.
    pub fn encode<I>(classes: I, num_classes: usize) -> Self
    where
        I: IntoIterator<Item = usize>,
    {
        let mut counts = vec![0u32; num_classes];
        for class_id in classes {
            if let Some(slot) = counts.get_mut(class_id) {
                *slot += 1;
            }
        }
        Self { counts }
    }

    pub fn zeros(num_classes: usize) -> Self {
        Self {
            counts: vec![0; num_classes],
        }
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn sum(&self) -> u32 {
        self.counts.iter().sum()
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.counts
    }

    pub fn to_f32(&self) -> Vec<f32> {
        self.counts.iter().map(|&c| c as f32).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_each_class() {
        let freq = FrequencyVector::encode([0, 2, 2, 6, 2], DEFAULT_NUM_CLASSES);
        assert_eq!(freq.as_slice(), &[1, 0, 3, 0, 0, 0, 1]);
        assert_eq!(freq.sum(), 5);
        assert_eq!(freq.len(), 7);
    }

    #[test]
    fn empty_input_is_all_zero() {
        let freq = FrequencyVector::encode(Vec::new(), 7);
        assert_eq!(freq, FrequencyVector::zeros(7));
        assert_eq!(freq.sum(), 0);
    }

    #[test]
    fn out_of_range_indices_are_ignored() {
        let freq = FrequencyVector::encode([1, 7, 8, 100, 1], 7);
        assert_eq!(freq.len(), 7);
        assert_eq!(freq.sum(), 2);
        assert_eq!(freq.as_slice()[1], 2);
    }

    #[test]
    fn sum_matches_valid_detection_count() {
        let classes: Vec<usize> = (0..50).map(|i| (i * 7 + 3) % 10).collect();
        let valid = classes.iter().filter(|&&c| c < 5).count() as u32;
        let freq = FrequencyVector::encode(classes, 5);
        assert_eq!(freq.len(), 5);
        assert_eq!(freq.sum(), valid);
    }
}
