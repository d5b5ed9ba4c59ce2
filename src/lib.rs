pub mod analyzers;
pub mod config;
pub mod dataset;
pub mod error;
pub mod fetch;
pub mod output;
pub mod predictor;
pub mod schema;
