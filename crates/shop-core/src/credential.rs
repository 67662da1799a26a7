//! # Secret Key Sanitizer
//!
//! Normalizes the Stripe secret key pulled from the environment and validates it
//! before it is ever placed in an `Authorization` header.
//!
//! Normalization runs in a fixed order and is idempotent:
//!
//! 1. trim leading/trailing whitespace
//! 2. strip one layer of matching surrounding quotes (`'…'` or `"…"`)
//! 3. remove every remaining whitespace character
//!
//! Anything outside `[A-Za-z0-9_-]` left after that is rejected, never stripped,
//! so a mangled key fails loudly at startup instead of at the first checkout.

use crate::error::{ShopError, ShopResult};
use std::fmt;
use tracing::debug;

/// Minimum accepted length of a normalized secret key
pub const MIN_CREDENTIAL_LEN: usize = 20;

/// Prefix length that may appear in logs
pub const LOG_PREFIX_LEN: usize = 12;

/// Recognized key prefixes and the mode they denote
const KEY_PREFIXES: &[(&str, KeyMode)] = &[("sk_test_", KeyMode::Test), ("sk_live_", KeyMode::Live)];

/// Environment a secret key belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyMode {
    Test,
    Live,
}

/// A secret key that passed sanitization.
///
/// Only contains `[A-Za-z0-9_-]`, so it can be embedded verbatim in a header.
/// `Debug` is redacted; use [`ValidatedCredential::expose`] to get the raw value.
#[derive(Clone, PartialEq, Eq)]
pub struct ValidatedCredential {
    value: String,
    mode: KeyMode,
}

impl ValidatedCredential {
    /// The full key. Only for building the bearer header.
    pub fn expose(&self) -> &str {
        &self.value
    }

    pub fn mode(&self) -> KeyMode {
        self.mode
    }

    pub fn is_test_mode(&self) -> bool {
        self.mode == KeyMode::Test
    }

    pub fn is_live_mode(&self) -> bool {
        self.mode == KeyMode::Live
    }

    pub fn len(&self) -> usize {
        self.value.len()
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    /// `Authorization` header value
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.value)
    }

    /// Log-safe rendering: bounded prefix plus length
    pub fn redacted(&self) -> String {
        redact(&self.value)
    }
}

impl fmt::Debug for ValidatedCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidatedCredential")
            .field("key", &self.redacted())
            .field("mode", &self.mode)
            .finish()
    }
}

/// Log-safe rendering of any secret-ish string
pub fn redact(value: &str) -> String {
    let prefix: String = value.chars().take(LOG_PREFIX_LEN).collect();
    format!("{}… (len={})", prefix, value.chars().count())
}

/// Apply the trim / unquote / whitespace-removal steps.
pub fn normalize(raw: &str) -> String {
    let trimmed = raw.trim();
    let unquoted = strip_matching_quotes(trimmed);
    unquoted.chars().filter(|c| !c.is_whitespace()).collect()
}

fn strip_matching_quotes(s: &str) -> &str {
    for quote in ['"', '\''] {
        if s.len() >= 2 && s.starts_with(quote) && s.ends_with(quote) {
            return &s[1..s.len() - 1];
        }
    }
    s
}

fn is_allowed_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

/// Sanitize a raw Stripe secret key into a [`ValidatedCredential`].
pub fn sanitize_credential(raw: &str) -> ShopResult<ValidatedCredential> {
    if raw.trim().is_empty() {
        return Err(ShopError::Configuration(
            "STRIPE_SECRET_KEY is not set".to_string(),
        ));
    }

    let cleaned = normalize(raw);

    if let Some(bad) = cleaned.chars().find(|c| !is_allowed_char(*c)) {
        let reason = if bad.is_control() {
            "a control character"
        } else {
            "a character outside [A-Za-z0-9_-]"
        };
        return Err(ShopError::Configuration(format!(
            "STRIPE_SECRET_KEY contains {} ({})",
            reason,
            redact(&cleaned)
        )));
    }

    if cleaned.len() < MIN_CREDENTIAL_LEN {
        return Err(ShopError::Configuration(format!(
            "STRIPE_SECRET_KEY appears to be too short ({} chars, need at least {})",
            cleaned.len(),
            MIN_CREDENTIAL_LEN
        )));
    }

    let mode = KEY_PREFIXES
        .iter()
        .find(|(prefix, _)| cleaned.starts_with(prefix))
        .map(|(_, mode)| *mode)
        .ok_or_else(|| {
            ShopError::Configuration(
                "Invalid Stripe API key format. Key must start with sk_test_ or sk_live_"
                    .to_string(),
            )
        })?;

    debug!(
        key = %redact(&cleaned),
        raw_len = raw.len(),
        "Sanitized Stripe secret key"
    );

    Ok(ValidatedCredential {
        value: cleaned,
        mode,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "sk_test_51AbCdEfGhIjKlMnOpQrStUv";

    #[test]
    fn test_plain_key_accepted() {
        let cred = sanitize_credential(KEY).unwrap();
        assert_eq!(cred.expose(), KEY);
        assert!(cred.is_test_mode());
    }

    #[test]
    fn test_wrapped_key_matches_unwrapped() {
        let wrappings = [
            format!("  '{}' \n", KEY),
            format!("\"{}\"", KEY),
            format!("\t{}\r\n", KEY),
            format!(" \" {} \" ", KEY),
        ];
        for wrapped in wrappings {
            let cred = sanitize_credential(&wrapped).unwrap();
            assert_eq!(cred.expose(), KEY, "input {:?}", wrapped);
        }
    }

    #[test]
    fn test_inner_whitespace_removed() {
        let cred = sanitize_credential("sk_live_51AbCd\nEfGh IjKlMnOpQr").unwrap();
        assert_eq!(cred.expose(), "sk_live_51AbCdEfGhIjKlMnOpQr");
        assert!(cred.is_live_mode());
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let once = normalize("  'sk_test_abc def'\n");
        assert_eq!(normalize(&once), once);
    }

    #[test]
    fn test_only_one_quote_layer_stripped() {
        let result = sanitize_credential(&format!("''{}''", KEY));
        assert!(matches!(result, Err(ShopError::Configuration(_))));
    }

    #[test]
    fn test_rejects_invalid_characters() {
        for bad in [
            format!("{}!", KEY),
            format!("{}.x", KEY),
            format!("{}\u{7f}", KEY),
            format!("{}\u{0}", KEY),
            format!("{}é", KEY),
        ] {
            assert!(
                matches!(sanitize_credential(&bad), Err(ShopError::Configuration(_))),
                "accepted {:?}",
                bad
            );
        }
    }

    #[test]
    fn test_rejects_short_key() {
        let result = sanitize_credential("not_a_real_key");
        assert!(matches!(result, Err(ShopError::Configuration(_))));
        let result = sanitize_credential("sk_test_short");
        assert!(matches!(result, Err(ShopError::Configuration(_))));
    }

    #[test]
    fn test_rejects_unknown_prefix() {
        let result = sanitize_credential("pk_test_51AbCdEfGhIjKlMnOpQrStUv");
        assert!(matches!(result, Err(ShopError::Configuration(_))));
    }

    #[test]
    fn test_rejects_empty() {
        assert!(sanitize_credential("").is_err());
        assert!(sanitize_credential("   \n").is_err());
    }

    #[test]
    fn test_debug_is_redacted() {
        let cred = sanitize_credential(KEY).unwrap();
        let rendered = format!("{:?}", cred);
        assert!(!rendered.contains(KEY));
        assert!(rendered.contains("sk_test_51Ab"));
        assert!(rendered.contains(&format!("len={}", KEY.len())));
    }

    #[test]
    fn test_bearer_header() {
        let cred = sanitize_credential(KEY).unwrap();
        assert_eq!(cred.bearer(), format!("Bearer {}", KEY));
    }
}
