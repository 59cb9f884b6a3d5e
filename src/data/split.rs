//! Deterministic train/validation/test partitioning.
//!
//! Splits are defined purely as contiguous ranges of batch indices computed
//! from the total row count and the batch size. There is no randomness in
//! split assignment; shuffling, when enabled, reorders rows only inside the
//! training range.

use std::fmt;

/// Which partition of the batch stream to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Split {
    Train,
    Validation,
    Test,
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Split::Train => write!(f, "train"),
            Split::Validation => write!(f, "validation"),
            Split::Test => write!(f, "test"),
        }
    }
}

/// Row range of a split within the file: skip `skip` data rows, then read
/// up to `take` rows (`None` reads to the end of the file).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowRange {
    pub skip: usize,
    pub take: Option<usize>,
}

/// Batch-level split sizes for a file of `total_rows` rows read in batches
/// of `batch_size`.
///
/// Train takes the first 70% of batches, validation the next 15%, and test
/// the remainder, so the three ranges always cover exactly
/// `ceil(total_rows / batch_size)` batches with no overlap. The final
/// (possibly partial) batch always lands in the test range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitPlan {
    pub total_rows: usize,
    pub batch_size: usize,
    pub total_batches: usize,
    pub train_batches: usize,
    pub val_batches: usize,
    pub test_batches: usize,
}

impl SplitPlan {
    pub fn new(total_rows: usize, batch_size: usize) -> Self {
        assert!(batch_size > 0, "batch_size must be > 0");

        let total_batches = (total_rows + batch_size - 1) / batch_size;
        // Integer arithmetic keeps the floor exact for every batch count.
        let train_batches = total_batches * 70 / 100;
        let val_batches = total_batches * 15 / 100;
        let test_batches = total_batches - train_batches - val_batches;

        Self {
            total_rows,
            batch_size,
            total_batches,
            train_batches,
            val_batches,
            test_batches,
        }
    }

    /// Number of batches assigned to a split.
    pub fn batches(&self, split: Split) -> usize {
        match split {
            Split::Train => self.train_batches,
            Split::Validation => self.val_batches,
            Split::Test => self.test_batches,
        }
    }

    /// Whether a split received no batches (small files).
    pub fn is_empty(&self, split: Split) -> bool {
        self.batches(split) == 0
    }

    /// Row range covered by a split.
    ///
    /// Train and validation consist of full batches; test runs to the end of
    /// the file and therefore absorbs the partial final batch.
    pub fn row_range(&self, split: Split) -> RowRange {
        let train_rows = self.train_batches * self.batch_size;
        let val_rows = self.val_batches * self.batch_size;
        match split {
            Split::Train => RowRange {
                skip: 0,
                take: Some(train_rows),
            },
            Split::Validation => RowRange {
                skip: train_rows,
                take: Some(val_rows),
            },
            Split::Test => RowRange {
                skip: train_rows + val_rows,
                take: None,
            },
        }
    }

    /// Number of rows in a split.
    pub fn rows(&self, split: Split) -> usize {
        match self.row_range(split) {
            RowRange { take: Some(n), .. } => n,
            RowRange { skip, take: None } => self.total_rows.saturating_sub(skip),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_split() {
        // 1000 rows at batch size 32: 32 batches total, 22/4/6.
        let plan = SplitPlan::new(1000, 32);
        assert_eq!(plan.total_batches, 32);
        assert_eq!(plan.train_batches, 22);
        assert_eq!(plan.val_batches, 4);
        assert_eq!(plan.test_batches, 6);
    }

    #[test]
    fn test_splits_cover_all_batches() {
        for rows in [1, 31, 32, 33, 100, 999, 1000, 1001, 12_345] {
            for batch_size in [1, 7, 32, 64] {
                let plan = SplitPlan::new(rows, batch_size);
                let expected = (rows + batch_size - 1) / batch_size;
                assert_eq!(
                    plan.train_batches + plan.val_batches + plan.test_batches,
                    expected,
                    "rows={rows} batch_size={batch_size}"
                );
            }
        }
    }

    #[test]
    fn test_row_ranges_partition_the_file() {
        let plan = SplitPlan::new(1000, 32);
        let train = plan.row_range(Split::Train);
        let val = plan.row_range(Split::Validation);
        let test = plan.row_range(Split::Test);

        assert_eq!(train.skip, 0);
        assert_eq!(train.take, Some(22 * 32));
        assert_eq!(val.skip, 22 * 32);
        assert_eq!(val.take, Some(4 * 32));
        assert_eq!(test.skip, 26 * 32);
        assert_eq!(test.take, None);
        assert_eq!(plan.rows(Split::Test), 1000 - 26 * 32);
    }

    #[test]
    fn test_tiny_files_leave_splits_empty() {
        let plan = SplitPlan::new(10, 32);
        assert_eq!(plan.total_batches, 1);
        assert_eq!(plan.train_batches, 0);
        assert_eq!(plan.val_batches, 0);
        assert_eq!(plan.test_batches, 1);
        assert!(plan.is_empty(Split::Train));
        assert!(plan.is_empty(Split::Validation));

        let plan = SplitPlan::new(64, 32);
        assert_eq!(plan.total_batches, 2);
        assert_eq!(plan.train_batches, 1);
        assert_eq!(plan.val_batches, 0);
        assert_eq!(plan.test_batches, 1);
    }
}
