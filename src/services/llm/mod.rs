pub mod client;

pub use client::{LlmService, StructuringService, STRUCTURING_PROMPT};
