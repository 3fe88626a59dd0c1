//! Prompt text

/// Instructions sent as the system message.
pub const SYSTEM_PROMPT: &str = r#"You turn raw AI conversation logs into durable knowledge notes.

Read the whole log, then separate what is worth keeping from the chatter:

1. Context: the concrete problem, bottleneck or question the conversation was about.
2. Solution: the conceptual shift that resolved it. Explain why the new approach works in terms of inputs, constraints and feedback loops.
3. Artifact: the reusable, tactical part. A checklist, recipe, command sequence or code block that can be dropped into daily use as-is. Omit it when the conversation produced nothing reusable.
4. Blog post: a first-person reflection in a plain, practical voice. Two or three short paragraphs for a quick fix. For long or multi-session conversations describe how the understanding evolved, using ### subheadings for each phase.

Ignore greetings, thanks and abandoned prompt attempts unless they reveal how the system failed.

Respond with a single JSON object and nothing else:
{
  "topic": "Concise technical summary in Title Case",
  "tags": ["specific", "lowercase", "tags"],
  "problem_context": "The operational challenge",
  "solution_insight": "The high-level resolution",
  "code_snippet": "The reusable artifact, or null",
  "blog_post": "First-person narrative"
}"#;

/// User message wrapping the (possibly truncated) conversation.
pub fn user_prompt(conversation: &str, max_chars: usize) -> String {
    format!(
        "Analyze this conversation log and extract the insights worth keeping.\n\n\
         Conversation log:\n\n{}",
        truncate_chars(conversation, max_chars)
    )
}

/// The first `max_chars` characters of `text`, never splitting a code point.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

/// Strip a surrounding markdown code fence, with or without a `json` tag.
pub fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest
        .strip_prefix("json")
        .or_else(|| rest.strip_prefix("JSON"))
        .unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}
