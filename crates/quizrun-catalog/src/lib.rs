//! quizrun-catalog: Quiz sources and score sinks.
//!
//! Implements the `QuizCatalog` and `ScoreSink` traits for the school data
//! service (HTTP), a local directory of TOML quizzes, and JSON result files.

pub mod config;
pub mod directory;
pub mod http;
pub mod mock;
pub mod sink;

pub use config::{
    create_catalog, create_sink, load_config, load_config_from, CatalogConfig, QuizrunConfig,
};
pub use directory::DirectoryCatalog;
pub use http::HttpCatalog;
pub use mock::MockCatalog;
pub use sink::JsonFileSink;
