//! Metrics - Confusion Matrix, Per-Class Accuracy and Macro-F1
//!
//! Rows of the confusion matrix are true classes, columns are predictions.
//! The matrix can be written as a NumPy `.npy` file (format 1.0,
//! little-endian `f4`).
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use homegin_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Per-class accuracy reported for classes absent from the evaluated set.
pub const ABSENT_CLASS_ACCURACY: f32 = -1.0;

// =============================================================================
// ConfusionMatrix
// =============================================================================

/// Counts of (true class, predicted class) pairs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    num_classes: usize,
    counts: Vec<u64>,
}

impl ConfusionMatrix {
    /// Creates an all-zero matrix.
    pub fn new(num_classes: usize) -> Self {
        Self {
            num_classes,
            counts: vec![0; num_classes * num_classes],
        }
    }

    /// Records one prediction.
    pub fn record(&mut self, truth: usize, predicted: usize) -> Result<()> {
        for class in [truth, predicted] {
            if class >= self.num_classes {
                return Err(Error::IndexOutOfBounds {
                    index: class,
                    size: self.num_classes,
                });
            }
        }
        self.counts[truth * self.num_classes + predicted] += 1;
        Ok(())
    }

    /// Number of classes.
    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    /// Count of samples of class `truth` predicted as `predicted`.
    pub fn get(&self, truth: usize, predicted: usize) -> u64 {
        self.counts[truth * self.num_classes + predicted]
    }

    /// Samples whose true class is `class`.
    pub fn row_sum(&self, class: usize) -> u64 {
        let start = class * self.num_classes;
        self.counts[start..start + self.num_classes].iter().sum()
    }

    /// Samples predicted as `class`.
    pub fn col_sum(&self, class: usize) -> u64 {
        (0..self.num_classes).map(|t| self.get(t, class)).sum()
    }

    /// Total number of recorded samples.
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Sum of the diagonal.
    pub fn correct(&self) -> u64 {
        (0..self.num_classes).map(|c| self.get(c, c)).sum()
    }

    /// Fraction of correct predictions, 0 when empty.
    pub fn accuracy(&self) -> f32 {
        match self.total() {
            0 => 0.0,
            total => self.correct() as f32 / total as f32,
        }
    }

    /// `diag / row_sum` per class; [`ABSENT_CLASS_ACCURACY`] for empty rows.
    pub fn per_class_accuracy(&self) -> Vec<f32> {
        (0..self.num_classes)
            .map(|c| match self.row_sum(c) {
                0 => ABSENT_CLASS_ACCURACY,
                n => self.get(c, c) as f32 / n as f32,
            })
            .collect()
    }

    /// Unweighted mean F1 over classes that occur in the truth or the
    /// predictions. A class with no true positives scores 0.
    pub fn macro_f1(&self) -> f32 {
        let mut sum = 0.0f64;
        let mut present = 0usize;
        for c in 0..self.num_classes {
            let actual = self.row_sum(c);
            let predicted = self.col_sum(c);
            if actual == 0 && predicted == 0 {
                continue;
            }
            present += 1;
            let tp = self.get(c, c) as f64;
            if tp > 0.0 {
                let precision = tp / predicted as f64;
                let recall = tp / actual as f64;
                sum += 2.0 * precision * recall / (precision + recall);
            }
        }
        if present == 0 {
            0.0
        } else {
            (sum / present as f64) as f32
        }
    }

    /// Writes the matrix as a `(C, C)` float32 `.npy` array.
    pub fn write_npy(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut writer = BufWriter::new(File::create(path)?);
        writer.write_all(&npy_header(&[self.num_classes, self.num_classes]))?;
        for &count in &self.counts {
            writer.write_all(&(count as f32).to_le_bytes())?;
        }
        writer.flush()?;
        Ok(())
    }
}

// =============================================================================
// NPY Header
// =============================================================================

const NPY_MAGIC: &[u8] = b"\x93NUMPY";
const NPY_ALIGN: usize = 64;

/// Header of a format 1.0 `.npy` file holding C-ordered `<f4` data.
fn npy_header(shape: &[usize]) -> Vec<u8> {
    let dims = match shape {
        [single] => format!("({single},)"),
        _ => format!(
            "({})",
            shape
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        ),
    };
    let mut dict = format!("{{'descr': '<f4', 'fortran_order': False, 'shape': {dims}, }}");

    // magic (6) + version (2) + header length (2)
    let prefix = NPY_MAGIC.len() + 4;
    let unpadded = prefix + dict.len() + 1;
    let padding = (NPY_ALIGN - unpadded % NPY_ALIGN) % NPY_ALIGN;
    dict.extend(std::iter::repeat(' ').take(padding));
    dict.push('\n');

    let mut header = Vec::with_capacity(prefix + dict.len());
    header.extend_from_slice(NPY_MAGIC);
    header.extend_from_slice(&[1, 0]);
    header.extend_from_slice(&(dict.len() as u16).to_le_bytes());
    header.extend_from_slice(dict.as_bytes());
    header
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix(pairs: &[(usize, usize)], classes: usize) -> ConfusionMatrix {
        let mut cm = ConfusionMatrix::new(classes);
        for &(t, p) in pairs {
            cm.record(t, p).unwrap();
        }
        cm
    }

    #[test]
    fn test_diagonal_matches_correct() {
        let cm = matrix(&[(0, 0), (0, 1), (1, 1), (2, 2), (2, 0)], 4);
        assert_eq!(cm.correct(), 3);
        assert_eq!(cm.total(), 5);
        assert!((cm.accuracy() - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_per_class_accuracy_sentinel() {
        let cm = matrix(&[(0, 0), (0, 1), (1, 1)], 3);
        let acc = cm.per_class_accuracy();
        assert!((acc[0] - 0.5).abs() < 1e-6);
        assert!((acc[1] - 1.0).abs() < 1e-6);
        assert_eq!(acc[2], ABSENT_CLASS_ACCURACY);
        assert!(acc
            .iter()
            .all(|&a| a == ABSENT_CLASS_ACCURACY || (0.0..=1.0).contains(&a)));
    }

    #[test]
    fn test_macro_f1() {
        // class 0: tp 1, fp 0, fn 1 -> p 1, r 0.5, f1 2/3
        // class 1: tp 1, fp 1, fn 0 -> p 0.5, r 1, f1 2/3
        // class 2: absent everywhere, skipped
        let cm = matrix(&[(0, 0), (0, 1), (1, 1)], 3);
        assert!((cm.macro_f1() - 2.0 / 3.0).abs() < 1e-6);

        // a predicted-only class counts with f1 0
        let cm = matrix(&[(0, 0), (0, 2)], 3);
        // class 0: p 1, r 0.5 -> 2/3; class 2: 0
        assert!((cm.macro_f1() - 1.0 / 3.0).abs() < 1e-6);

        assert_eq!(ConfusionMatrix::new(3).macro_f1(), 0.0);
    }

    #[test]
    fn test_record_out_of_range() {
        let mut cm = ConfusionMatrix::new(2);
        assert!(cm.record(2, 0).is_err());
        assert!(cm.record(0, 5).is_err());
    }

    #[test]
    fn test_npy_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test_confusion_matrix.npy");
        let cm = matrix(&[(0, 1), (1, 1), (1, 1)], 2);
        cm.write_npy(&path).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[..6], NPY_MAGIC);
        assert_eq!(&bytes[6..8], &[1, 0]);
        let header_len = u16::from_le_bytes([bytes[8], bytes[9]]) as usize;
        assert_eq!((10 + header_len) % NPY_ALIGN, 0);
        let header = std::str::from_utf8(&bytes[10..10 + header_len]).unwrap();
        assert!(header.contains("'shape': (2, 2)"));
        assert!(header.ends_with('\n'));

        let data: Vec<f32> = bytes[10 + header_len..]
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        assert_eq!(data, vec![0.0, 1.0, 0.0, 2.0]);
    }
}
