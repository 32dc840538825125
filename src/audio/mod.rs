//! Decoding, mixing-free concatenation and export of speech clips.

pub mod buffer;
pub mod concat;
pub mod decode;
pub mod export;
pub mod resample;

pub use buffer::AudioBuffer;
pub use concat::concatenate;
pub use decode::decode_file;
pub use export::{encode_mp3, export, ExportFormat};
