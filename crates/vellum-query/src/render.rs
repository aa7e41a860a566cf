//! SQL rendering of a checked token stream.
//!
//! Targets SQLite's JSON functions. Every clause compares the field's decoded
//! SQL value (`->>` on the final path step), guarded by `json_type` so a
//! string literal only matches JSON strings and a numeric literal only
//! matches JSON numbers. Escapes in the stored text never matter: `"caf\u00e9"`
//! and `"café"` are the same string.

use std::fmt::Write as _;

use crate::lexer::{Comparator, Literal, Spanned, Token};

/// A value bound to a `?N` placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
  Text(String),
  Integer(i64),
  Real(f64),
}

/// A rendered predicate fragment plus its bind parameters, in placeholder
/// order.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
  pub sql:    String,
  pub params: Vec<Param>,
}

/// Render `tokens` against `column`, numbering placeholders from
/// `first_param` (1-based, as SQLite counts them).
///
/// `tokens` must already have passed [`check`](crate::syntax::check).
pub fn render(tokens: &[Spanned], column: &str, first_param: usize) -> Predicate {
  let mut sql = String::new();
  let mut params = Vec::new();
  let mut path: &[String] = &[];
  let mut comparator = Comparator::Eq;

  for spanned in tokens {
    match &spanned.token {
      Token::Identifier(segments) => path = segments,
      Token::Comparator(c) => comparator = *c,
      Token::Logical(l) => {
        let _ = write!(sql, " {} ", l.as_sql());
      }
      Token::Literal(literal) => {
        let guard = match literal {
          Literal::String(_) => "= 'text'",
          Literal::Integer(_) | Literal::Float(_) => "IN ('integer', 'real')",
        };
        let _ = write!(
          sql,
          "(json_type({column}, '{}') {guard} AND {} {} ?{})",
          json_path(path),
          value_expr(column, path),
          comparator.as_sql(),
          first_param + params.len()
        );
        params.push(match literal {
          Literal::String(s) => Param::Text(s.clone()),
          Literal::Integer(i) => Param::Integer(*i),
          Literal::Float(f) => Param::Real(*f),
        });
      }
    }
  }

  Predicate { sql, params }
}

/// `a.b.c` → `$.a.b.c`. Segments are plain ASCII words, checked by the
/// lexer, so they need no quoting.
fn json_path(path: &[String]) -> String {
  let mut out = String::from("$");
  for segment in path {
    out.push('.');
    out.push_str(segment);
  }
  out
}

/// `a.b.c` → `(column->'a'->'b'->>'c')`: JSON descent, then the decoded SQL
/// value of the final step.
fn value_expr(column: &str, path: &[String]) -> String {
  let mut out = format!("({column}");
  for (i, segment) in path.iter().enumerate() {
    let arrow = if i + 1 == path.len() { "->>" } else { "->" };
    let _ = write!(out, "{arrow}'{segment}'");
  }
  out.push(')');
  out
}
