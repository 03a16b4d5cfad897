use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("API key is missing")]
    Missing,

    #[error("API key is malformed: expected a single token of printable ASCII characters")]
    Malformed,
}

/// API key supplied for the current session. Never persisted; `Debug` is redacted.
#[derive(Clone)]
pub struct Credential(String);

impl Credential {
    pub fn new(raw: &str) -> Result<Self, AuthError> {
        let key = raw.trim();
        if key.is_empty() {
            return Err(AuthError::Missing);
        }
        if !key.chars().all(|c| c.is_ascii_graphic()) {
            return Err(AuthError::Malformed);
        }
        Ok(Self(key.to_string()))
    }

    pub(crate) fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}
