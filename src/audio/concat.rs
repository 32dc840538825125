use std::path::Path;
use tracing::info;

use super::buffer::AudioBuffer;
use super::decode::decode_file;
use crate::error::{Error, Result};

/// Decodes each file in order and appends it to one buffer.
///
/// A missing path fails before anything after it is touched. No gaps,
/// fades or level changes are introduced.
pub fn concatenate<P: AsRef<Path>>(paths: &[P]) -> Result<AudioBuffer> {
    let mut combined = AudioBuffer::empty();
    for path in paths {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(Error::MissingFile(path.to_path_buf()));
        }
        let clip = decode_file(path)?;
        combined.append(clip)?;
    }
    info!(
        clips = paths.len(),
        seconds = combined.duration().as_secs_f64(),
        "concatenated audiobook"
    );
    Ok(combined)
}
