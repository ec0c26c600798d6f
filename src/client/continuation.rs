// Continue-if-truncated loop for single-prompt questions.
//
// Providers enforce a hard output ceiling per call; a long answer comes back
// cut off. The loop re-asks with a continuation instruction until the answer
// looks finished or the round cap is hit. The completeness check is a fixed
// trailing-punctuation pattern, so a capped loop can still return a
// truncated answer.

use lazy_static::lazy_static;
use regex::Regex;

use super::relay::ClientError;

/// Hard cap on relay calls per question.
pub const MAX_ROUNDS: usize = 3;

pub const CONTINUE_INSTRUCTION: &str =
    "Continue from where you left off. Do not repeat earlier text.";

lazy_static! {
    // Terminal punctuation, optionally followed by one closing quote/bracket
    static ref SENTENCE_END: Regex = Regex::new(r#"[.!?]["')\]]?$"#).expect("valid regex");
}

/// One round's outcome: the generated text plus the provider-reported finish
/// reason where the calling surface has one (the relay contract does not
/// carry it, so relay-backed rounds pass `None`).
#[derive(Debug, Clone)]
pub struct RoundResult {
    pub text: String,
    pub finish_reason: Option<String>,
}

pub trait AskBackend {
    fn ask(&self, prompt: &str) -> Result<RoundResult, ClientError>;
}

/// Does the text end like a finished sentence?
pub fn looks_complete(text: &str) -> bool {
    SENTENCE_END.is_match(text.trim_end())
}

/// An explicit "length" always means truncated; any other explicit reason
/// means the provider stopped on its own. Without a reason the sentence
/// heuristic decides.
fn round_truncated(round: &RoundResult) -> bool {
    match round.finish_reason.as_deref() {
        Some("length") => true,
        Some(_) => false,
        None => !looks_complete(&round.text),
    }
}

/// Ask one question, extending the answer for up to [`MAX_ROUNDS`] rounds.
///
/// `on_round` runs after every completed round with the accumulated answer
/// so far, so the caller can refresh its display mid-loop.
pub fn ask_with_continuation<B: AskBackend>(
    backend: &B,
    prompt: &str,
    mut on_round: impl FnMut(&str),
) -> Result<String, ClientError> {
    let mut accumulated = String::new();

    for round in 0..MAX_ROUNDS {
        let prompt_for_round = if round == 0 {
            prompt.to_string()
        } else {
            format!("{prompt}\n\n{CONTINUE_INSTRUCTION}")
        };

        let result = backend.ask(&prompt_for_round)?;
        if !result.text.is_empty() {
            if !accumulated.is_empty() {
                accumulated.push(' ');
            }
            accumulated.push_str(result.text.trim());
        }
        on_round(&accumulated);

        if !round_truncated(&result) {
            break;
        }
    }

    Ok(accumulated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    /// Scripted backend that records every prompt it receives.
    struct ScriptedBackend {
        rounds: RefCell<Vec<RoundResult>>,
        prompts: RefCell<Vec<String>>,
    }

    impl ScriptedBackend {
        fn new(rounds: Vec<RoundResult>) -> Self {
            Self {
                rounds: RefCell::new(rounds),
                prompts: RefCell::new(Vec::new()),
            }
        }

        fn prompts(&self) -> Vec<String> {
            self.prompts.borrow().clone()
        }
    }

    impl AskBackend for ScriptedBackend {
        fn ask(&self, prompt: &str) -> Result<RoundResult, ClientError> {
            self.prompts.borrow_mut().push(prompt.to_string());
            Ok(self.rounds.borrow_mut().remove(0))
        }
    }

    fn round(text: &str, finish_reason: Option<&str>) -> RoundResult {
        RoundResult {
            text: text.to_string(),
            finish_reason: finish_reason.map(str::to_string),
        }
    }

    #[test]
    fn test_looks_complete() {
        assert!(looks_complete("Done."));
        assert!(looks_complete("Really?"));
        assert!(looks_complete("Stop!"));
        assert!(looks_complete("He said \"stop.\""));
        assert!(looks_complete("(like this.)"));
        assert!(looks_complete("item 42.]"));
        assert!(looks_complete("trailing spaces.   "));
        assert!(!looks_complete("ends with a comma,"));
        assert!(!looks_complete("no punctuation at all"));
        assert!(!looks_complete("- a list\n- of items"));
        assert!(!looks_complete(""));
    }

    #[test]
    fn test_length_reason_triggers_continuation() {
        let backend = ScriptedBackend::new(vec![
            round("First part without terminal", Some("length")),
            round("and the ending.", Some("stop")),
        ]);

        let answer = ask_with_continuation(&backend, "Explain.", |_| {}).unwrap();
        assert_eq!(answer, "First part without terminal and the ending.");

        let prompts = backend.prompts();
        assert_eq!(prompts.len(), 2);
        assert_eq!(prompts[0], "Explain.");
        assert!(prompts[1].starts_with("Explain."));
        assert!(prompts[1].contains(CONTINUE_INSTRUCTION));
    }

    #[test]
    fn test_stop_reason_ends_loop_regardless_of_text() {
        let backend = ScriptedBackend::new(vec![round("trails off without punctuation", Some("stop"))]);
        let answer = ask_with_continuation(&backend, "Explain.", |_| {}).unwrap();
        assert_eq!(answer, "trails off without punctuation");
        assert_eq!(backend.prompts().len(), 1);
    }

    #[test]
    fn test_terminal_punctuation_ends_loop_without_reason() {
        let backend = ScriptedBackend::new(vec![round("Short and complete.", None)]);
        let answer = ask_with_continuation(&backend, "Explain.", |_| {}).unwrap();
        assert_eq!(answer, "Short and complete.");
        assert_eq!(backend.prompts().len(), 1);
    }

    #[test]
    fn test_round_cap_is_never_exceeded() {
        let backend = ScriptedBackend::new(vec![
            round("part one", Some("length")),
            round("part two", Some("length")),
            round("part three", Some("length")),
            round("never requested", Some("length")),
        ]);

        let answer = ask_with_continuation(&backend, "Explain.", |_| {}).unwrap();
        assert_eq!(answer, "part one part two part three");
        assert_eq!(backend.prompts().len(), MAX_ROUNDS);
    }

    #[test]
    fn test_on_round_sees_running_accumulation() {
        let backend = ScriptedBackend::new(vec![
            round("part one", Some("length")),
            round("part two.", None),
        ]);

        let mut seen = Vec::new();
        ask_with_continuation(&backend, "Explain.", |acc| seen.push(acc.to_string())).unwrap();
        assert_eq!(seen, vec!["part one".to_string(), "part one part two.".to_string()]);
    }

    #[test]
    fn test_backend_error_propagates() {
        struct FailingBackend;
        impl AskBackend for FailingBackend {
            fn ask(&self, _prompt: &str) -> Result<RoundResult, ClientError> {
                Err(ClientError::Transport("connection refused".to_string()))
            }
        }

        let err = ask_with_continuation(&FailingBackend, "Explain.", |_| {}).unwrap_err();
        assert!(matches!(err, ClientError::Transport(_)));
    }
}
