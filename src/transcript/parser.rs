use tracing::debug;

use super::types::{Transcript, UtteranceRecord};

const SEPARATOR: &str = ": ";

/// Parses `Speaker: utterance` lines into a transcript.
///
/// Lines without the `": "` separator are dropped without error. Speaker and
/// utterance are trimmed of whitespace and surrounding quote characters.
pub fn parse_transcript(structured: &str) -> Transcript {
    let mut records = Vec::new();

    for (index, line) in structured.trim().lines().enumerate() {
        let Some((speaker, text)) = line.split_once(SEPARATOR) else {
            if !line.trim().is_empty() {
                debug!(line = index + 1, "dropping line without speaker separator");
            }
            continue;
        };
        records.push(UtteranceRecord::new(speaker.trim(), strip_quotes(text)));
    }

    Transcript::new(records)
}

fn strip_quotes(text: &str) -> &str {
    text.trim_matches(|c: char| c.is_whitespace() || c == '"' || c == '\'')
}
