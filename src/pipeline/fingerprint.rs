// src/pipeline/fingerprint.rs

//! Content fingerprint over the identity-relevant fields of a record.

use std::fmt;

use serde_json::json;
use sha2::{Digest, Sha256};

use crate::models::Record;

/// SHA-256 over `{question, answers, most_voted}` encoded as key-sorted JSON.
///
/// Comments, the source link and images do not contribute.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    #[must_use]
    pub fn of(record: &Record) -> Self {
        // serde_json::Value keeps object keys sorted.
        let canonical = json!({
            "question": record.body,
            "answers": record.options,
            "most_voted": record.top_answer,
        })
        .to_string();
        Self(Sha256::digest(canonical.as_bytes()).into())
    }

    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex = self.to_hex();
        write!(f, "Fingerprint({})", hex.get(..16).unwrap_or(&hex))
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex = self.to_hex();
        write!(f, "{}", hex.get(..16).unwrap_or(&hex))
    }
}
