//! Prompt construction for AI triage.
//!
//! The message body is passed through whole; providers apply their own
//! length limits.

/// System prompt for chat-style providers.
pub fn system_prompt() -> String {
    "You are a customer support triage assistant. Return JSON with \"category\" and \"priority\".\n\
     Category must be exactly one of: \"Bug\" (crashes, errors, things not working), \
     \"Billing\" (invoices, charges, payments, refunds, pricing), \
     \"Feature Request\" (suggestions for new features), \"General\" (questions, account help, anything else).\n\
     Priority must be exactly one of: \"High\" (urgent language, blocked users, Bug/Billing issues), \
     \"Medium\" (standard inquiries), \"Low\" (feature requests, nice-to-have suggestions).\n\
     Return only the JSON object: {\"category\": \"...\", \"priority\": \"...\"}"
        .to_string()
}

/// User turn for chat-style providers.
pub fn user_prompt(message: &str) -> String {
    format!("Categorize this support message: \"{}\"", message)
}

/// Single-shot prompt for completion-style providers (Ollama `/api/generate`).
pub fn completion_prompt(message: &str) -> String {
    format!(
        "{}\n\nMessage to analyze: \"{}\"\n\nReturn JSON format: {{\"category\": \"General\", \"priority\": \"Medium\"}}",
        system_prompt(),
        message
    )
}
