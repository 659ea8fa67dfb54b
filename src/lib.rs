pub mod completion;
pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod stats;
