//! Data module - CSV loading, time indexing and column extraction

mod loader;
mod processor;
mod table;

pub use loader::DataLoader;
pub use processor::{DataProcessor, OHLC_COLUMNS};
pub use table::{parse_timestamp, DateRange, Resolution, TimeSeriesTable};
