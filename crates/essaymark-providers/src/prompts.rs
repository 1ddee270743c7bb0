//! Prompts sent to chat-model engines.

/// System prompt: the grading role, the 0..=6 rubric, and the exact JSON
/// shape the parser expects.
pub const SYSTEM_PROMPT: &str = r#"You are an experienced essay examiner. Assess the essay the student wrote in answer to the given question.

Score every criterion with a whole number from 0 (absent) to 6 (excellent). Assess two groups of criteria:
- content: how well the essay answers the question (focus, arguments, structure, examples)
- language: how well it is written (grammar, vocabulary, style, spelling)

Reply ONLY with a JSON object of this shape:
{
  "general_conclusion": "<two or three sentences on the essay as a whole>",
  "content": {
    "conclusion": "<summary of the content assessment>",
    "criteria": [{"criterion": "<name>", "score": <0-6>, "feedback": "<one or two sentences>"}]
  },
  "language": {
    "conclusion": "<summary of the language assessment>",
    "criteria": [{"criterion": "<name>", "score": <0-6>, "feedback": "<one or two sentences>"}]
  },
  "suggestions": ["<concrete improvement>", "..."]
}

Both criteria lists must contain at least one criterion."#;

/// Build the user message for one submission.
pub fn user_prompt(question: &str, essay: &str) -> String {
    format!(
        "Question:\n{}\n\nEssay:\n{}\n\nAssess the essay and reply with the JSON object.",
        question.trim(),
        essay.trim()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_prompt_carries_question_and_essay() {
        let prompt = user_prompt("  Is homework useful? ", "Yes, mostly.\n");
        assert!(prompt.starts_with("Question:\nIs homework useful?\n\nEssay:\nYes, mostly.\n"));
    }

    #[test]
    fn system_prompt_names_both_groups() {
        assert!(SYSTEM_PROMPT.contains("\"content\""));
        assert!(SYSTEM_PROMPT.contains("\"language\""));
        assert!(SYSTEM_PROMPT.contains("0 (absent) to 6"));
    }
}
