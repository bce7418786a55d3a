//! Provider fault classification
//!
//! Providers return unstructured, inconsistent text for the same underlying
//! quota condition, so the classifier is a case-insensitive phrase scan and
//! deliberately over-inclusive: a false positive costs one extra dry-run
//! pass, a false negative aborts an otherwise-recoverable batch.

const QUOTA_PHRASES: &[&str] = &[
    "exhausted balance",
    "insufficient credits",
    "insufficient balance",
    "user is locked",
    "top up your balance",
    "no credits remaining",
    "credit limit exceeded",
    "402",
];

/// True when a provider failure message indicates quota/credit exhaustion.
///
/// Any other failure (timeout, malformed request, missing model, network
/// error) is false and must stay fatal to that one asset only.
pub fn is_quota_error(message: &str) -> bool {
    let lower = message.to_lowercase();
    QUOTA_PHRASES.iter().any(|p| lower.contains(p))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_phrases_match() {
        for phrase in QUOTA_PHRASES {
            let embedded = format!("request rejected: {} (ref 8831)", phrase);
            assert!(is_quota_error(&embedded), "should match {:?}", phrase);
        }
    }

    #[test]
    fn test_case_insensitive() {
        assert!(is_quota_error("INSUFFICIENT CREDITS"));
        assert!(is_quota_error("User Is Locked, contact support"));
        assert!(is_quota_error("Please Top Up Your Balance to continue"));
    }

    #[test]
    fn test_status_code_402() {
        assert!(is_quota_error("provider returned 402: Payment Required"));
    }

    #[test]
    fn test_other_failures_are_not_quota() {
        assert!(!is_quota_error("timeout"));
        assert!(!is_quota_error("invalid api key"));
        assert!(!is_quota_error("model not found"));
        assert!(!is_quota_error("connection reset by peer"));
        assert!(!is_quota_error(""));
    }
}
