pub mod client;
pub mod parser;

pub use client::{ChatMessage, CompletionClient, Completions};
pub use parser::parse_labels;
