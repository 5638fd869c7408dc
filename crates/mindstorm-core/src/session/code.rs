//! Session codes: short identifiers participants type to join a session.
//!
//! Codes are uppercase letters and digits so they survive being read out
//! loud or pasted from chat. Lookup normalizes case, so `ab12cd` finds
//! `AB12CD`.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

const CODE_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// A normalized session code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionCode(String);

impl SessionCode {
    /// Normalizes user input into code form: trims whitespace and uppercases.
    pub fn normalize(input: &str) -> Self {
        Self(input.trim().to_ascii_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Generates random session codes of a fixed length.
///
/// Uniqueness is the caller's problem: the store checks generated codes
/// against its registry and retries on collisions.
#[derive(Debug, Clone)]
pub struct CodeGenerator {
    length: usize,
}

impl CodeGenerator {
    pub fn new(length: usize) -> Self {
        Self { length }
    }

    pub fn generate(&self) -> SessionCode {
        let mut rng = rand::thread_rng();
        let code: String = (0..self.length)
            .map(|_| {
                let idx = rng.gen_range(0..CODE_CHARSET.len());
                CODE_CHARSET[idx] as char
            })
            .collect();
        SessionCode(code)
    }
}
