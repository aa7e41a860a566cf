//! Grammar check over a token stream.
//!
//! ```text
//! identifier comparator literal ( logical identifier comparator literal )*
//! ```
//!
//! There is no grouping and no precedence; clauses chain strictly left to
//! right.

use crate::{
  error::{Error, Expected, Result, context},
  lexer::{Spanned, Token},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
  ExpectIdentifier,
  ExpectComparator,
  ExpectLiteral,
  ExpectLogicalOrEnd,
}

impl State {
  fn expected(self) -> Expected {
    match self {
      Self::ExpectIdentifier => Expected::Identifier,
      Self::ExpectComparator => Expected::Operator,
      Self::ExpectLiteral => Expected::Literal,
      Self::ExpectLogicalOrEnd => Expected::LogicalOperator,
    }
  }

  fn advance(self, token: &Token) -> Option<State> {
    match (self, token) {
      (Self::ExpectIdentifier, Token::Identifier(_)) => Some(Self::ExpectComparator),
      (Self::ExpectComparator, Token::Comparator(_)) => Some(Self::ExpectLiteral),
      (Self::ExpectLiteral, Token::Literal(_)) => Some(Self::ExpectLogicalOrEnd),
      (Self::ExpectLogicalOrEnd, Token::Logical(_)) => Some(Self::ExpectIdentifier),
      _ => None,
    }
  }
}

/// Verify that `tokens` (lexed from `input`) form a complete expression.
pub fn check(input: &str, tokens: &[Spanned]) -> Result<()> {
  let mut state = State::ExpectIdentifier;
  for spanned in tokens {
    state = state.advance(&spanned.token).ok_or_else(|| Error::Expected {
      expected: state.expected(),
      position: spanned.position,
      context:  context(input, spanned.position),
    })?;
  }

  // Only a literal may end an expression.
  if state != State::ExpectLogicalOrEnd {
    return Err(Error::Incomplete);
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::lexer::tokenize;

  fn parse(input: &str) -> Result<()> { check(input, &tokenize(input)?) }

  #[test]
  fn accepts_flat_chains() {
    for input in [
      "foo=123",
      "foo=\"bar\"",
      "foo!=123",
      "foo=bar && count=5",
      "a.b >= 1.5 || c < 2 && d == x",
    ] {
      assert!(parse(input).is_ok(), "{input}");
    }
  }

  #[test]
  fn missing_operator() {
    let err = parse("foo bar").unwrap_err();
    assert_eq!(err.to_string(), "operator expected at position 4: foo ...");
  }

  #[test]
  fn missing_logical_operator() {
    let err = parse("a=1 b=2").unwrap_err();
    assert_eq!(
      err.to_string(),
      "logical operator expected at position 4: a=1 ..."
    );
  }

  #[test]
  fn doubled_comparator() {
    let err = parse("a = = 1").unwrap_err();
    assert!(matches!(
      err,
      Error::Expected { expected: Expected::Literal, position: 4, .. }
    ));
  }

  #[test]
  fn literal_on_the_left() {
    let err = parse("\"a\" = 1").unwrap_err();
    assert!(matches!(
      err,
      Error::Expected { expected: Expected::Identifier, position: 0, .. }
    ));
  }

  #[test]
  fn incomplete_expressions() {
    for input in ["", "   ", "foo", "foo =", "foo = 1 &&"] {
      assert_eq!(parse(input), Err(Error::Incomplete), "{input:?}");
    }
  }
}
