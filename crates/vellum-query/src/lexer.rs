//! Tokenizer for filter expressions.
//!
//! Words (letters, digits, `_` and `.`) are ambiguous on their own: `foo` is
//! a field path on the left of a comparator and a bare string on the right.
//! The lexer resolves this from the previous token, which keeps the grammar
//! checker a pure state machine over token kinds. Field paths are limited to
//! ASCII; bare string literals may contain any letter.

use crate::error::{Error, Result, context};

// ─── Tokens ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
  Eq,
  /// `==`, an alias for `=`.
  EqEq,
  Ne,
  Lt,
  Gt,
  Le,
  Ge,
}

impl Comparator {
  pub fn as_sql(self) -> &'static str {
    match self {
      Self::Eq | Self::EqEq => "=",
      Self::Ne => "!=",
      Self::Lt => "<",
      Self::Gt => ">",
      Self::Le => "<=",
      Self::Ge => ">=",
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Logical {
  And,
  Or,
}

impl Logical {
  pub fn as_sql(self) -> &'static str {
    match self {
      Self::And => "AND",
      Self::Or => "OR",
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
  /// Quoted or bare-word string.
  String(String),
  Integer(i64),
  Float(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
  /// Dotted field path, split into its segments.
  Identifier(Vec<String>),
  Comparator(Comparator),
  Logical(Logical),
  Literal(Literal),
}

/// A token and the byte offset it starts at.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
  pub token:    Token,
  pub position: usize,
}

// ─── Scanner ─────────────────────────────────────────────────────────────────

fn is_word_char(c: char) -> bool { c.is_alphanumeric() || c == '_' || c == '.' }

/// Split `input` into tokens, left to right.
pub fn tokenize(input: &str) -> Result<Vec<Spanned>> {
  let bytes = input.as_bytes();
  let mut tokens: Vec<Spanned> = Vec::new();
  let mut pos = 0;

  while let Some(c) = input[pos..].chars().next() {
    let start = pos;

    if c.is_ascii_whitespace() {
      pos += 1;
      continue;
    }

    let token = match c {
      '"' => {
        let body = start + 1;
        let len = input[body..].find('"').ok_or_else(|| Error::UnterminatedString {
          position: start,
          context:  context(input, start),
        })?;
        pos = body + len + 1;
        Token::Literal(Literal::String(input[body..body + len].to_owned()))
      }
      '=' | '!' | '<' | '>' => {
        let next = bytes.get(start + 1).copied();
        let (cmp, len) = match (c, next) {
          ('=', Some(b'=')) => (Comparator::EqEq, 2),
          ('=', _) => (Comparator::Eq, 1),
          ('!', Some(b'=')) => (Comparator::Ne, 2),
          ('<', Some(b'=')) => (Comparator::Le, 2),
          ('<', _) => (Comparator::Lt, 1),
          ('>', Some(b'=')) => (Comparator::Ge, 2),
          ('>', _) => (Comparator::Gt, 1),
          _ => return Err(invalid_operator(input, start, 1)),
        };
        pos += len;
        Token::Comparator(cmp)
      }
      '&' | '|' => {
        if bytes.get(start + 1) != Some(&(c as u8)) {
          return Err(invalid_operator(input, start, 1));
        }
        pos += 2;
        Token::Logical(if c == '&' { Logical::And } else { Logical::Or })
      }
      c if is_word_char(c) => {
        let len = input[start..]
          .find(|c: char| !is_word_char(c))
          .unwrap_or(input.len() - start);
        pos += len;
        let word = &input[start..pos];
        let after_comparator = matches!(
          tokens.last(),
          Some(Spanned { token: Token::Comparator(_), .. })
        );
        if after_comparator {
          Token::Literal(word_literal(input, start, word)?)
        } else {
          Token::Identifier(identifier_path(input, start, word)?)
        }
      }
      found => {
        return Err(Error::UnexpectedCharacter {
          found,
          position: start,
          context: context(input, start),
        });
      }
    };

    tokens.push(Spanned { token, position: start });
  }

  Ok(tokens)
}

fn invalid_operator(input: &str, start: usize, len: usize) -> Error {
  Error::InvalidOperator {
    operator: input[start..start + len].to_owned(),
    position: start,
    context:  context(input, start),
  }
}

fn identifier_path(input: &str, start: usize, word: &str) -> Result<Vec<String>> {
  let path: Vec<String> = word.split('.').map(str::to_owned).collect();
  // Segments are spliced into SQL and JSON paths, so they stay ASCII.
  let plain = |s: &String| {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
  };
  if !path.iter().all(plain) {
    return Err(Error::InvalidIdentifier {
      identifier: word.to_owned(),
      position:   start,
      context:    context(input, start),
    });
  }
  Ok(path)
}

/// Classify a bare word on the right-hand side of a comparator.
fn word_literal(input: &str, start: usize, word: &str) -> Result<Literal> {
  if word.chars().any(|c| c.is_alphabetic() || c == '_') {
    return Ok(Literal::String(word.to_owned()));
  }

  let invalid = || Error::InvalidNumber {
    literal:  word.to_owned(),
    position: start,
    context:  context(input, start),
  };

  match word.matches('.').count() {
    0 => word.parse().map(Literal::Integer).map_err(|_| invalid()),
    1 => match word.parse::<f64>() {
      Ok(f) if f.is_finite() => Ok(Literal::Float(f)),
      _ => Err(invalid()),
    },
    _ => Err(invalid()),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn kinds(input: &str) -> Vec<Token> {
    tokenize(input).unwrap().into_iter().map(|s| s.token).collect()
  }

  fn ident(path: &str) -> Token {
    Token::Identifier(path.split('.').map(str::to_owned).collect())
  }

  #[test]
  fn simple_clause() {
    assert_eq!(kinds("foo=123"), vec![
      ident("foo"),
      Token::Comparator(Comparator::Eq),
      Token::Literal(Literal::Integer(123)),
    ]);
  }

  #[test]
  fn all_comparators() {
    let cases = [
      ("=", Comparator::Eq),
      ("==", Comparator::EqEq),
      ("!=", Comparator::Ne),
      ("<", Comparator::Lt),
      (">", Comparator::Gt),
      ("<=", Comparator::Le),
      (">=", Comparator::Ge),
    ];
    for (op, expected) in cases {
      let tokens = kinds(&format!("a{op}1"));
      assert_eq!(tokens[1], Token::Comparator(expected), "{op}");
    }
  }

  #[test]
  fn bare_word_and_quoted_strings() {
    assert_eq!(kinds("a = bar")[2], Token::Literal(Literal::String("bar".into())));
    assert_eq!(
      kinds(r#"a = "two words & more""#)[2],
      Token::Literal(Literal::String("two words & more".into()))
    );
    assert_eq!(kinds("a = v1_2")[2], Token::Literal(Literal::String("v1_2".into())));
    assert_eq!(kinds("a = 1.5")[2], Token::Literal(Literal::Float(1.5)));
  }

  #[test]
  fn dotted_paths_and_logical_operators() {
    assert_eq!(kinds("a.b.c=1 && d=2 || e=3"), vec![
      ident("a.b.c"),
      Token::Comparator(Comparator::Eq),
      Token::Literal(Literal::Integer(1)),
      Token::Logical(Logical::And),
      ident("d"),
      Token::Comparator(Comparator::Eq),
      Token::Literal(Literal::Integer(2)),
      Token::Logical(Logical::Or),
      ident("e"),
      Token::Comparator(Comparator::Eq),
      Token::Literal(Literal::Integer(3)),
    ]);
  }

  #[test]
  fn positions_are_byte_offsets() {
    let positions: Vec<usize> =
      tokenize("foo  != \"x\"").unwrap().iter().map(|s| s.position).collect();
    assert_eq!(positions, vec![0, 5, 8]);
  }

  #[test]
  fn rejects_malformed_input() {
    assert!(matches!(
      tokenize(r#"a = "open"#),
      Err(Error::UnterminatedString { position: 4, .. })
    ));
    assert!(matches!(tokenize("a ! 1"), Err(Error::InvalidOperator { position: 2, .. })));
    assert!(matches!(tokenize("a=1 & b=2"), Err(Error::InvalidOperator { position: 4, .. })));
    assert!(matches!(tokenize("a = 1.2.3"), Err(Error::InvalidNumber { .. })));
    assert!(matches!(tokenize("a = 99999999999999999999"), Err(Error::InvalidNumber { .. })));
    assert!(matches!(tokenize("a..b = 1"), Err(Error::InvalidIdentifier { .. })));
    assert!(matches!(tokenize("café = 1"), Err(Error::InvalidIdentifier { position: 0, .. })));
    assert!(matches!(
      tokenize("a = #"),
      Err(Error::UnexpectedCharacter { found: '#', position: 4, .. })
    ));
  }

  #[test]
  fn bare_words_may_hold_any_letter() {
    assert_eq!(kinds("name = été")[2], Token::Literal(Literal::String("été".into())));
    assert_eq!(
      kinds("city=Zürich && n=1")[2],
      Token::Literal(Literal::String("Zürich".into()))
    );
  }

  #[test]
  fn error_text_echoes_prefix() {
    let err = tokenize("count = 1.2.3").unwrap_err();
    assert_eq!(
      err.to_string(),
      "invalid number \"1.2.3\" at position 8: count = ..."
    );
  }
}
