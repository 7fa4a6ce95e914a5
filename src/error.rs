//! Error taxonomy and categorization
//!
//! Every caller-facing failure resolves to an [`EnhancedError`] with a
//! short, non-technical message; the raw message is kept alongside for
//! diagnostics and is logged, never shown.
//!
//! Categorization matches the lowercased error text against an ordered
//! rule table. The order is deliberate and pinned by tests: network
//! keywords are checked before revert keywords, so a custom revert string
//! that merely mentions "timeout" still classifies by whichever rule
//! matches first. Substring matching on human text is brittle by nature;
//! it is kept as-is rather than replaced with something cleverer.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Failure category, determining retry eligibility and the user-facing
/// message template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Network,
    Contract,
    User,
    Validation,
    RateLimit,
    Unknown,
}

impl ErrorCategory {
    /// Whether a failure of this category may be retried.
    ///
    /// `User` is retryable: the user may re-approve the wallet prompt.
    /// `Contract` and `Unknown` are final for the attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ErrorCategory::Network | ErrorCategory::User | ErrorCategory::RateLimit
        )
    }

    /// Fixed user-facing message template for this category.
    pub fn user_friendly(&self) -> &'static str {
        match self {
            ErrorCategory::Network => {
                "Network connection issue. Please check your internet connection and try again."
            }
            ErrorCategory::Contract => {
                "Transaction failed due to contract conditions. Please check your inputs and try again."
            }
            ErrorCategory::User => "Transaction was cancelled by user.",
            ErrorCategory::Validation => "Invalid input.",
            ErrorCategory::RateLimit => "Too many requests. Please wait a moment and try again.",
            ErrorCategory::Unknown => {
                "An unexpected error occurred. Please try again or contact support."
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Network => "network",
            ErrorCategory::Contract => "contract",
            ErrorCategory::User => "user",
            ErrorCategory::Validation => "validation",
            ErrorCategory::RateLimit => "rate_limit",
            ErrorCategory::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An already-structured error raised inside this crate.
///
/// Passes through [`categorize_error`] untouched instead of going down the
/// pattern-matching path. Validation errors are always constructed this
/// way, before any chain call is made.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct RoscaError {
    pub category: ErrorCategory,
    pub message: String,
    pub retryable: bool,
}

impl RoscaError {
    pub fn new(category: ErrorCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            message: message.into(),
            retryable: category.is_retryable(),
        }
    }

    /// A local validation failure with a precise message.
    pub fn validation(message: impl Into<String>) -> Self {
        Self {
            category: ErrorCategory::Validation,
            message: message.into(),
            retryable: false,
        }
    }

    /// A pre-emptive rate-limit rejection (no request was made).
    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::RateLimit, message)
    }
}

/// Classified failure, ready for the UI layer.
#[derive(Debug, Clone)]
pub struct EnhancedError {
    pub category: ErrorCategory,
    /// Raw technical message, for diagnostics only.
    pub message: String,
    pub retryable: bool,
    /// Short, non-technical message safe to display.
    pub user_friendly: String,
}

/// Ordered categorization rules. First matching keyword wins; the table
/// order is part of the contract (see module docs).
const CATEGORY_RULES: &[(ErrorCategory, &[&str])] = &[
    (
        ErrorCategory::Network,
        &["network", "fetch", "timeout", "connection"],
    ),
    (ErrorCategory::Contract, &["revert", "execution reverted"]),
    (ErrorCategory::User, &["user rejected", "user denied"]),
    (
        ErrorCategory::RateLimit,
        &["rate limit", "too many requests"],
    ),
];

/// Classify an arbitrary failure into the taxonomy.
///
/// A [`RoscaError`] anywhere in the chain passes its fields through; for
/// everything else the stringified message is matched against
/// [`CATEGORY_RULES`], falling back to `Unknown`.
pub fn categorize_error(error: &eyre::Report) -> EnhancedError {
    if let Some(rosca) = error.downcast_ref::<RoscaError>() {
        return EnhancedError {
            category: rosca.category,
            message: rosca.message.clone(),
            retryable: rosca.retryable,
            user_friendly: rosca.message.clone(),
        };
    }

    let message = format!("{error:#}");
    let lower = message.to_lowercase();

    for (category, keywords) in CATEGORY_RULES {
        if keywords.iter().any(|k| lower.contains(k)) {
            return EnhancedError {
                category: *category,
                message,
                retryable: category.is_retryable(),
                user_friendly: category.user_friendly().to_string(),
            };
        }
    }

    EnhancedError {
        category: ErrorCategory::Unknown,
        message,
        retryable: false,
        user_friendly: ErrorCategory::Unknown.user_friendly().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eyre::eyre;

    #[test]
    fn test_network_errors_retryable() {
        let err = categorize_error(&eyre!("request timeout after 30s"));
        assert_eq!(err.category, ErrorCategory::Network);
        assert!(err.retryable);
    }

    #[test]
    fn test_contract_errors_final() {
        let err = categorize_error(&eyre!("execution reverted: Already registered"));
        assert_eq!(err.category, ErrorCategory::Contract);
        assert!(!err.retryable);
    }

    #[test]
    fn test_user_rejection() {
        let err = categorize_error(&eyre!("User rejected the request"));
        assert_eq!(err.category, ErrorCategory::User);
        assert!(err.retryable);
        assert_eq!(err.user_friendly, "Transaction was cancelled by user.");
    }

    #[test]
    fn test_rate_limit() {
        let err = categorize_error(&eyre!("429 too many requests"));
        assert_eq!(err.category, ErrorCategory::RateLimit);
        assert!(err.retryable);
    }

    #[test]
    fn test_unknown_fallback() {
        let err = categorize_error(&eyre!("something inexplicable"));
        assert_eq!(err.category, ErrorCategory::Unknown);
        assert!(!err.retryable);
    }

    #[test]
    fn test_rule_order_network_before_contract() {
        // Contains both a network keyword and a revert keyword; the
        // network rule is checked first and must win.
        let err = categorize_error(&eyre!("execution reverted: rpc timeout"));
        assert_eq!(err.category, ErrorCategory::Network);
    }

    #[test]
    fn test_structured_error_passthrough() {
        let inner = RoscaError::validation("Address must start with 0x");
        let err = categorize_error(&eyre::Report::new(inner));
        assert_eq!(err.category, ErrorCategory::Validation);
        assert!(!err.retryable);
        assert_eq!(err.user_friendly, "Address must start with 0x");
    }

    #[test]
    fn test_rule_table_order_is_pinned() {
        let order: Vec<ErrorCategory> = CATEGORY_RULES.iter().map(|(c, _)| *c).collect();
        assert_eq!(
            order,
            vec![
                ErrorCategory::Network,
                ErrorCategory::Contract,
                ErrorCategory::User,
                ErrorCategory::RateLimit,
            ]
        );
    }
}
