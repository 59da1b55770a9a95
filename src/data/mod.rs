/// Sensor records and the flattened CSV artifact.
pub mod record;

/// Hour flooring and hourly means.
pub mod aggregate;

/// Fixed-length windows over the hourly series.
pub mod window;

/// Seeded train/test split and the short-data policy.
pub mod split;

pub use aggregate::{aggregate_hourly, floor_to_hour, parse_timestamp, HourlyAggregate};
pub use record::{load_records, write_flattened_csv, SensorRecord};
pub use split::{prepare_samples, train_test_split, PreparedSamples, ShortDataPolicy};
pub use window::{build_windows, latest_window, samples_to_tensors, stack_windows, Sample, Window};
