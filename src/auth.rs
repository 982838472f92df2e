use std::fmt;

use serde::Deserialize;

/// Ordered list of shared secrets. A client's id is its position in the list.
#[derive(Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct ClientKeys(Vec<String>);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialError {
    /// Id missing, not a decimal integer, negative, or out of range
    InvalidId,
    /// Id is valid but the secret does not match its entry
    KeyMismatch,
}

impl ClientKeys {
    /// Parse the `CLIENT_KEYS` convention: comma separated, entries kept verbatim.
    pub fn from_csv(raw: &str) -> Self {
        if raw.is_empty() {
            return Self::default();
        }
        Self(raw.split(',').map(str::to_string).collect())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The id must be a plain decimal index. Unlike a JavaScript
    /// `parseInt` prefix parse, "1abc", " 1" and "1.5" are rejected.
    pub fn validate(&self, id: Option<&str>, key: Option<&str>) -> Result<(), CredentialError> {
        let index = id
            .and_then(|id| id.parse::<usize>().ok())
            .filter(|&index| index < self.0.len())
            .ok_or(CredentialError::InvalidId)?;

        match key {
            Some(key) if timing_safe_eq(key.as_bytes(), self.0[index].as_bytes()) => Ok(()),
            _ => Err(CredentialError::KeyMismatch),
        }
    }
}

// Never print the secrets themselves
impl fmt::Debug for ClientKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientKeys")
            .field("count", &self.0.len())
            .finish()
    }
}

pub fn timing_safe_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
