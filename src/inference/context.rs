//! Chat prompt assembly and reply post-processing.

use crate::api::types::ChatMessage;

/// Number of trailing history entries included in the prompt.
const HISTORY_WINDOW: usize = 5;

/// Render the trailing history window and the new message into one prompt.
///
/// Each windowed entry becomes `User: <content>` or `AI: <content>`, oldest
/// first, one per line. The prompt ends with the new message and an
/// unanswered `AI:` cue for the engine to continue from. The separator
/// newline before the cue is emitted even when the history is empty.
pub fn build_prompt(history: &[ChatMessage], message: &str) -> String {
    let start = history.len().saturating_sub(HISTORY_WINDOW);
    let context = history[start..]
        .iter()
        .map(|msg| {
            let speaker = if msg.sender == "user" { "User" } else { "AI" };
            format!("{}: {}", speaker, msg.content)
        })
        .collect::<Vec<_>>()
        .join("\n");
    format!("{}\nUser: {}\nAI:", context, message)
}

/// Cut the echoed prompt out of a raw engine reply.
///
/// Removes the first literal occurrence of `prompt` and trims the result.
/// Engines that do not echo the prompt pass through untouched apart from the
/// trim; that is documented behavior, not a failure.
pub fn strip_prompt(raw: &str, prompt: &str) -> String {
    raw.replacen(prompt, "", 1).trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(sender: &str, content: &str) -> ChatMessage {
        ChatMessage {
            sender: sender.to_string(),
            content: content.to_string(),
        }
    }

    #[test]
    fn renders_senders_and_cue() {
        let history = vec![msg("user", "hi"), msg("ai", "hello")];
        let prompt = build_prompt(&history, "how are you?");
        assert_eq!(prompt, "User: hi\nAI: hello\nUser: how are you?\nAI:");
    }

    #[test]
    fn empty_history_keeps_the_separator() {
        let prompt = build_prompt(&[], "hi");
        assert_eq!(prompt, "\nUser: hi\nAI:");
    }

    #[test]
    fn non_user_senders_render_as_ai() {
        let history = vec![msg("assistant", "sure")];
        let prompt = build_prompt(&history, "go on");
        assert_eq!(prompt, "AI: sure\nUser: go on\nAI:");
    }

    #[test]
    fn window_keeps_only_the_last_five() {
        let history: Vec<ChatMessage> = (1..=8)
            .map(|i| {
                let sender = if i % 2 == 1 { "user" } else { "ai" };
                msg(sender, &format!("turn-{}", i))
            })
            .collect();

        let prompt = build_prompt(&history, "latest");
        for dropped in 1..=3 {
            assert!(!prompt.contains(&format!("turn-{}", dropped)));
        }
        for kept in 4..=8 {
            assert!(prompt.contains(&format!("turn-{}", kept)));
        }
        assert!(prompt.ends_with("\nUser: latest\nAI:"));
    }

    #[test]
    fn strip_removes_the_echoed_prompt() {
        let prompt = build_prompt(&[msg("user", "hi")], "hello");
        let raw = format!("{} Hello there", prompt);
        assert_eq!(strip_prompt(&raw, &prompt), "Hello there");
    }

    #[test]
    fn strip_is_a_noop_when_the_prompt_is_absent() {
        assert_eq!(strip_prompt("  plain reply  ", "User: x\nAI:"), "plain reply");
    }

    #[test]
    fn strip_removes_only_the_first_occurrence() {
        let prompt = "P";
        assert_eq!(strip_prompt("P one P two", prompt), "one P two");
    }
}
