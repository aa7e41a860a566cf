//! Error type for `vellum-query`.
//!
//! Positional errors render as `<what> at position N: <prefix>...`, where
//! `<prefix>` is the input up to the offending byte, so a client can see
//! exactly where parsing stopped.

use std::fmt;

use thiserror::Error;

/// How much of the input preceding an error is echoed back.
const CONTEXT_CHARS: usize = 32;

/// What the grammar wanted at the point it gave up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expected {
  Identifier,
  Operator,
  Literal,
  LogicalOperator,
}

impl fmt::Display for Expected {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::Identifier => "identifier",
      Self::Operator => "operator",
      Self::Literal => "literal",
      Self::LogicalOperator => "logical operator",
    })
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
  #[error("{expected} expected at position {position}: {context}...")]
  Expected {
    expected: Expected,
    position: usize,
    context:  String,
  },

  #[error("incomplete expression")]
  Incomplete,

  #[error("unterminated string at position {position}: {context}...")]
  UnterminatedString { position: usize, context: String },

  #[error("invalid operator {operator:?} at position {position}: {context}...")]
  InvalidOperator {
    operator: String,
    position: usize,
    context:  String,
  },

  #[error("invalid number {literal:?} at position {position}: {context}...")]
  InvalidNumber {
    literal:  String,
    position: usize,
    context:  String,
  },

  #[error("invalid identifier {identifier:?} at position {position}: {context}...")]
  InvalidIdentifier {
    identifier: String,
    position:   usize,
    context:    String,
  },

  #[error("unexpected character {found:?} at position {position}: {context}...")]
  UnexpectedCharacter {
    found:    char,
    position: usize,
    context:  String,
  },
}

impl Error {
  /// Byte offset into the input, when the error has one.
  pub fn position(&self) -> Option<usize> {
    match self {
      Self::Incomplete => None,
      Self::Expected { position, .. }
      | Self::UnterminatedString { position, .. }
      | Self::InvalidOperator { position, .. }
      | Self::InvalidNumber { position, .. }
      | Self::InvalidIdentifier { position, .. }
      | Self::UnexpectedCharacter { position, .. } => Some(*position),
    }
  }
}

/// The input preceding `position`, trimmed to its last [`CONTEXT_CHARS`]
/// characters.
pub(crate) fn context(input: &str, position: usize) -> String {
  let prefix = input.get(..position).unwrap_or(input);
  let count = prefix.chars().count();
  if count <= CONTEXT_CHARS {
    return prefix.to_owned();
  }
  prefix.chars().skip(count - CONTEXT_CHARS).collect()
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn context_is_the_prefix() {
    assert_eq!(context("foo bar", 4), "foo ");
    assert_eq!(context("foo bar", 0), "");
  }

  #[test]
  fn long_context_keeps_the_tail() {
    let input = format!("{}=1 && x", "a".repeat(40));
    let ctx = context(&input, input.len());
    assert_eq!(ctx.chars().count(), CONTEXT_CHARS);
    assert!(ctx.ends_with("=1 && x"));
  }

  #[test]
  fn expected_message() {
    let err = Error::Expected {
      expected: Expected::Operator,
      position: 4,
      context:  context("foo bar", 4),
    };
    assert_eq!(err.to_string(), "operator expected at position 4: foo ...");
    assert_eq!(err.position(), Some(4));
  }
}
