pub mod analyzers;
pub mod config;
pub mod error;
pub mod input;
pub mod normalizer;
pub mod output;
pub mod pipeline;
