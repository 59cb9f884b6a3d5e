//! Streaming batched reader for the preprocessed feature file.
//!
//! The file is a delimited table: header row, numeric feature columns, and
//! the class label in the last column. Reads are lazy and single-pass; a
//! fresh pass is started for every epoch rather than holding the file in
//! memory. Optional shuffling is confined to a bounded, seeded buffer so a
//! given (seed, buffer size) pair always produces the same order.

use std::fs::File;
use std::path::{Path, PathBuf};

use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use super::batch::FeatureBatch;
use super::split::{Split, SplitPlan};
use crate::error::PipelineError;

/// Bounded-buffer shuffle parameters.
///
/// Rows are drawn at random from a buffer of at most `buffer_size` pending
/// rows; ordering beyond the buffer horizon is preserved, so shuffling never
/// moves a row across a split boundary.
#[derive(Debug, Clone, Copy)]
pub struct ShuffleConfig {
    pub buffer_size: usize,
    pub seed: u64,
}

/// Batched reader over one feature file.
///
/// Holds only the path and the schema learned from the header; every call to
/// [`CsvBatchReader::batches`] or [`CsvBatchReader::split_batches`] opens a
/// fresh pass over the file.
#[derive(Debug, Clone)]
pub struct CsvBatchReader {
    path: PathBuf,
    batch_size: usize,
    feature_count: usize,
}

impl CsvBatchReader {
    /// Open a feature file and learn its width from the header.
    pub fn open<P: AsRef<Path>>(path: P, batch_size: usize) -> Result<Self, PipelineError> {
        assert!(batch_size > 0, "batch_size must be > 0");
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            return Err(PipelineError::FileNotFound(path));
        }

        let mut reader = csv::Reader::from_path(&path)?;
        let headers = reader.headers()?;
        if headers.len() < 2 {
            return Err(PipelineError::Schema(format!(
                "header has {} columns, need at least one feature and a label",
                headers.len()
            )));
        }
        let feature_count = headers.len() - 1;
        debug!(
            path = %path.display(),
            feature_count,
            "opened feature file"
        );

        Ok(Self {
            path,
            batch_size,
            feature_count,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Number of feature columns (label column excluded).
    pub fn feature_count(&self) -> usize {
        self.feature_count
    }

    /// Count data rows with a streaming pass (the file is never loaded whole).
    pub fn count_rows(&self) -> Result<usize, PipelineError> {
        let mut reader = csv::Reader::from_path(&self.path)?;
        let mut rows = 0usize;
        for record in reader.records() {
            record?;
            rows += 1;
        }
        Ok(rows)
    }

    /// One ordered pass over the whole file.
    pub fn batches(&self) -> Result<BatchIter, PipelineError> {
        self.range_batches(0, None, None)
    }

    /// One pass over a single split's row range.
    ///
    /// `shuffle` must only be supplied for [`Split::Train`]; validation and
    /// test order is part of the split contract.
    pub fn split_batches(
        &self,
        plan: &SplitPlan,
        split: Split,
        shuffle: Option<ShuffleConfig>,
    ) -> Result<BatchIter, PipelineError> {
        debug_assert!(
            shuffle.is_none() || split == Split::Train,
            "only the training split may be shuffled"
        );
        let range = plan.row_range(split);
        self.range_batches(range.skip, range.take, shuffle)
    }

    fn range_batches(
        &self,
        skip: usize,
        take: Option<usize>,
        shuffle: Option<ShuffleConfig>,
    ) -> Result<BatchIter, PipelineError> {
        let reader = csv::Reader::from_path(&self.path)?;
        Ok(BatchIter {
            records: reader.into_records(),
            feature_count: self.feature_count,
            batch_size: self.batch_size,
            pending_skip: skip,
            remaining: take,
            shuffle: shuffle.map(|cfg| Shuffler {
                rng: StdRng::seed_from_u64(cfg.seed),
                buffer_size: cfg.buffer_size.max(1),
                buffer: Vec::new(),
            }),
            done: false,
        })
    }
}

struct Shuffler {
    rng: StdRng,
    buffer_size: usize,
    buffer: Vec<(Vec<f32>, usize)>,
}

/// Lazy iterator of batches over one pass of the file.
pub struct BatchIter {
    records: csv::StringRecordsIntoIter<File>,
    feature_count: usize,
    batch_size: usize,
    pending_skip: usize,
    remaining: Option<usize>,
    shuffle: Option<Shuffler>,
    done: bool,
}

impl BatchIter {
    /// Next row from the underlying range, in file order.
    fn next_raw_row(&mut self) -> Option<Result<(Vec<f32>, usize), PipelineError>> {
        if self.remaining == Some(0) {
            return None;
        }
        while self.pending_skip > 0 {
            match self.records.next() {
                Some(Ok(_)) => self.pending_skip -= 1,
                Some(Err(e)) => return Some(Err(e.into())),
                None => return None,
            }
        }
        let record = match self.records.next()? {
            Ok(record) => record,
            Err(e) => return Some(Err(e.into())),
        };
        if let Some(remaining) = self.remaining.as_mut() {
            *remaining -= 1;
        }
        Some(parse_row(&record, self.feature_count))
    }

    /// Next row after the optional bounded shuffle.
    fn next_row(&mut self) -> Option<Result<(Vec<f32>, usize), PipelineError>> {
        let Some(mut shuffler) = self.shuffle.take() else {
            return self.next_raw_row();
        };

        // Keep the buffer topped up, then draw a random element from it.
        let mut failure = None;
        while shuffler.buffer.len() < shuffler.buffer_size {
            match self.next_raw_row() {
                Some(Ok(row)) => shuffler.buffer.push(row),
                Some(Err(e)) => {
                    failure = Some(e);
                    break;
                }
                None => break,
            }
        }

        let item = match failure {
            Some(e) => Some(Err(e)),
            None if shuffler.buffer.is_empty() => None,
            None => {
                let idx = shuffler.rng.gen_range(0..shuffler.buffer.len());
                Some(Ok(shuffler.buffer.swap_remove(idx)))
            }
        };
        self.shuffle = Some(shuffler);
        item
    }
}

impl Iterator for BatchIter {
    type Item = Result<FeatureBatch, PipelineError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let mut rows: Vec<f32> = Vec::with_capacity(self.batch_size * self.feature_count);
        let mut labels = Vec::with_capacity(self.batch_size);

        while labels.len() < self.batch_size {
            match self.next_row() {
                Some(Ok((features, label))) => {
                    rows.extend_from_slice(&features);
                    labels.push(label);
                }
                Some(Err(e)) => {
                    self.done = true;
                    return Some(Err(e));
                }
                None => break,
            }
        }

        if labels.is_empty() {
            self.done = true;
            return None;
        }

        let features = Array2::from_shape_vec((labels.len(), self.feature_count), rows)
            .expect("row-major batch buffer matches its own dimensions");
        Some(Ok(FeatureBatch::new(features, labels)))
    }
}

fn parse_row(
    record: &csv::StringRecord,
    feature_count: usize,
) -> Result<(Vec<f32>, usize), PipelineError> {
    if record.len() != feature_count + 1 {
        return Err(PipelineError::Schema(format!(
            "row {} has {} columns, expected {}",
            record
                .position()
                .map(|p| p.line().to_string())
                .unwrap_or_else(|| "?".to_string()),
            record.len(),
            feature_count + 1
        )));
    }

    let mut features = Vec::with_capacity(feature_count);
    for cell in record.iter().take(feature_count) {
        let value: f32 = cell.trim().parse().map_err(|_| {
            PipelineError::Schema(format!("feature cell {cell:?} is not numeric"))
        })?;
        features.push(value);
    }

    let label_cell = record.get(feature_count).unwrap_or_default().trim();
    let label_value: f64 = label_cell.parse().map_err(|_| {
        PipelineError::Schema(format!("label cell {label_cell:?} is not numeric"))
    })?;
    if !label_value.is_finite() || label_value < 0.0 || label_value.fract() != 0.0 {
        return Err(PipelineError::Schema(format!(
            "label cell {label_cell:?} is not a non-negative integer"
        )));
    }

    Ok((features, label_value as usize))
}
