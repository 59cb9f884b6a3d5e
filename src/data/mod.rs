//! Data handling: streaming reads, deterministic splitting, normalization
//! and class-imbalance estimation for the feature file.

mod batch;
mod normalize;
mod reader;
mod split;
mod weights;

pub use batch::FeatureBatch;
pub use normalize::{NormStats, NormalizationMethod, StatsAccumulator};
pub use reader::{BatchIter, CsvBatchReader, ShuffleConfig};
pub use split::{RowRange, Split, SplitPlan};
pub use weights::{balanced_weights, count_labels};
