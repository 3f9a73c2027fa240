pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::CliConfig;
pub use config::TomlConfig;

pub use adapters::{csv_sink::CsvSink, storage::LocalStorage, vertex::VertexClient};
pub use core::{etl::EtlEngine, pipeline::ClaimPipeline};
pub use utils::error::{EtlError, Result};
