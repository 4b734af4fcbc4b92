use std::fmt;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

/// Valor escalar armazenado: inteiro ou string.
///
/// No snapshot JSON inteiros viram números e strings viram strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Int(i64),
    Str(String),
}

impl Scalar {
    /// Interpreta o valor como inteiro base 10 (usado pelo INCR).
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Scalar::Int(n) => Some(*n),
            Scalar::Str(s) => s.parse().ok(),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Int(n) => write!(f, "{n}"),
            Scalar::Str(s) => f.write_str(s),
        }
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Scalar::Str(s)
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::Str(s.to_string())
    }
}

impl From<i64> for Scalar {
    fn from(n: i64) -> Self {
        Scalar::Int(n)
    }
}

/// Entrada no store: valor + instante absoluto de expiração opcional.
#[derive(Debug, Clone)]
pub(crate) struct Entry {
    pub value: Scalar,
    pub expires_at: Option<SystemTime>,
}

impl Entry {
    pub fn new(value: Scalar, expires_at: Option<SystemTime>) -> Self {
        Self { value, expires_at }
    }

    /// Expirada se o instante de expiração está estritamente no passado.
    pub fn is_expired_at(&self, now: SystemTime) -> bool {
        self.expires_at.is_some_and(|t| t < now)
    }
}

/// Visão de uma chave viva: valor + expiração absoluta (se houver).
#[derive(Debug, Clone, PartialEq)]
pub struct KeyInfo {
    pub value: Scalar,
    pub expires_at: Option<SystemTime>,
}
