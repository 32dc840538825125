pub mod adapter;

pub use adapter::{artifact_file_name, Synthesizer};
