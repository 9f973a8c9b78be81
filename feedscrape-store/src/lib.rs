// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]

//! # Feedscrape Store
//!
//! Everything feedscrape writes to or reads from disk besides the session
//! file.
//!
//! - **CsvRecordWriter**: [`RecordSink`](feedscrape_core::RecordSink) that
//!   writes posts as CSV rows
//! - **ScrapeConfig**: run configuration with JSON persistence
//! - **Persistence**: File I/O helpers for JSON data
//!
//! ## Usage
//!
//! ```ignore
//! use feedscrape_store::{CsvRecordWriter, ScrapeConfig};
//!
//! let config = ScrapeConfig::load().await?;
//! config.validate()?;
//!
//! let mut writer = CsvRecordWriter::create(&config.output_path, config.append)?;
//! writer.write_record(&post)?;
//! writer.flush()?;
//! ```

pub mod config;
pub mod csv_writer;
pub mod error;
pub mod persistence;

pub use config::{ConfigOverrides, ScrapeConfig};
pub use csv_writer::{format_row, CsvRecordWriter, CSV_HEADER};
pub use error::StoreError;
pub use persistence::{default_config_dir, default_config_path, load_json, load_json_or_default, save_json};
