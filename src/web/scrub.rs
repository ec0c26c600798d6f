// Cleanup for text produced by the flattened-prompt provider.
//
// The prompt template renders the history as "role: content" lines and ends
// with an "assistant:" cue, so the backend can leak the cue or further role
// markers back into its output. This trims exactly that marker set and
// nothing more; it is cosmetic, not a parser.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref TRAILING_ROLE_MARKER: Regex =
        Regex::new(r"(?i)\n?\s*(user|system|assistant):\s*$").expect("valid regex");
}

/// Strip prompt-template artifacts from generated text.
///
/// Keeps only what follows an echoed "assistant:" cue (backends that echo
/// the prompt return the whole flattened history), then removes trailing
/// role markers the model sometimes appends before a stop sequence cuts in.
pub fn scrub_generated_text(raw: &str) -> String {
    let after_cue = match raw.find("assistant:") {
        Some(idx) => &raw[idx + "assistant:".len()..],
        None => raw,
    };

    let mut text = after_cue.trim().to_string();
    loop {
        let marker_start = TRAILING_ROLE_MARKER.find(&text).map(|m| m.start());
        match marker_start {
            Some(start) => {
                text.truncate(start);
                text.truncate(text.trim_end().len());
            }
            None => break,
        }
    }
    text
}
