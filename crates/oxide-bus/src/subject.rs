//! NATS-style subject patterns.
//!
//! Subjects are `.`-separated tokens. In a pattern `*` matches exactly one token
//! and `>` matches one or more trailing tokens.

use oxide_core::{Error, Result};

/// Check whether `subject` matches `pattern`.
pub fn matches(pattern: &str, subject: &str) -> bool {
    let mut pattern_tokens = pattern.split('.');
    let mut subject_tokens = subject.split('.');
    loop {
        match (pattern_tokens.next(), subject_tokens.next()) {
            (Some(">"), Some(_)) => return true,
            (Some("*"), Some(_)) => {}
            (Some(p), Some(s)) if p == s => {}
            (None, None) => return true,
            _ => return false,
        }
    }
}

/// Reject patterns with empty tokens or a `>` that is not the last token.
pub fn validate_pattern(pattern: &str) -> Result<()> {
    let tokens: Vec<&str> = pattern.split('.').collect();
    for (i, token) in tokens.iter().enumerate() {
        if token.is_empty() {
            return Err(Error::EventBus(format!("Empty token in pattern: {pattern}")));
        }
        if *token == ">" && i + 1 != tokens.len() {
            return Err(Error::EventBus(format!(
                "'>' must be the last token: {pattern}"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_and_wildcards() {
        assert!(matches("agent.a1.idle", "agent.a1.idle"));
        assert!(matches("agent.*.idle", "agent.a1.idle"));
        assert!(!matches("agent.*.idle", "agent.a1.busy"));
        assert!(!matches("agent.*", "agent.a1.idle"));
        assert!(matches("work.>", "work.assigned.a1"));
        assert!(!matches("work.>", "work"));
        assert!(!matches("work.assigned", "work.assigned.a1"));
    }

    #[test]
    fn test_validate_pattern() {
        assert!(validate_pattern("agent.*.idle").is_ok());
        assert!(validate_pattern("work.>").is_ok());
        assert!(validate_pattern("work.>.a1").is_err());
        assert!(validate_pattern("agent..idle").is_err());
    }
}
