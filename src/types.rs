// SPDX-License-Identifier: Apache-2.0

// types.rs for hwkit
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::DEFAULT_MAX_DEPTH;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HwkitError {
    #[error("Syntax error: {0}")]
    Syntax(String),
    #[error("Decode error: {0}")]
    Decode(String),
    #[error("Allocation failed: {0}")]
    Allocation(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Unsupported operation: {0}")]
    Unsupported(String),
}

impl HwkitError {
    /// The bare message, without the variant prefix.
    pub fn message(&self) -> &str {
        match self {
            HwkitError::Syntax(m)
            | HwkitError::Decode(m)
            | HwkitError::Allocation(m)
            | HwkitError::InvalidInput(m)
            | HwkitError::Unsupported(m) => m,
        }
    }
}

impl From<std::collections::TryReserveError> for HwkitError {
    fn from(err: std::collections::TryReserveError) -> Self {
        HwkitError::Allocation(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, HwkitError>;

/// Classification of the cursor position.
///
/// The integer codes are part of the C ABI and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum Token {
    Begin,
    StartObject,
    EndObject,
    StartArray,
    EndArray,
    FieldName,
    ValueString,
    ValueNumber,
    ValueBoolean,
    ValueNull,
    End,
    Error,
}

impl Token {
    #[inline]
    pub const fn code(self) -> i32 {
        match self {
            Token::StartObject => 0,
            Token::EndObject => 1,
            Token::StartArray => 2,
            Token::EndArray => 3,
            Token::FieldName => 4,
            Token::ValueString => 5,
            Token::ValueNumber => 6,
            Token::ValueBoolean => 7,
            Token::ValueNull => 8,
            Token::Begin => -1,
            Token::End => -2,
            Token::Error => -3,
        }
    }

    pub const fn from_code(code: i32) -> Option<Token> {
        Some(match code {
            0 => Token::StartObject,
            1 => Token::EndObject,
            2 => Token::StartArray,
            3 => Token::EndArray,
            4 => Token::FieldName,
            5 => Token::ValueString,
            6 => Token::ValueNumber,
            7 => Token::ValueBoolean,
            8 => Token::ValueNull,
            -1 => Token::Begin,
            -2 => Token::End,
            -3 => Token::Error,
            _ => return None,
        })
    }

    /// `END` and `ERROR` never transition again.
    #[inline]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Token::End | Token::Error)
    }
}

/// How the text of a `VALUE_NUMBER` token is best represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum NumberType {
    /// Integer syntax that fits in `i64`.
    Long,
    /// Integer syntax outside the `i64` range.
    BigInteger,
    /// Fraction and/or exponent present.
    Double,
}

/// A kernel implementation level. Selected once per process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
pub enum CapabilityTier {
    /// Portable scalar code, available everywhere.
    Scalar,
    /// Wide vector extension: AVX2 on x86_64, NEON on aarch64.
    Wide,
}

impl CapabilityTier {
    #[inline]
    pub const fn code(self) -> i32 {
        match self {
            CapabilityTier::Scalar => 0,
            CapabilityTier::Wide => 1,
        }
    }
}

/// Options applied to every parser a factory creates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Maximum object/array nesting before the cursor fails.
    pub max_depth: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}
