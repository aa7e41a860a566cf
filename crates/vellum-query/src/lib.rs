//! Filter expression compiler for Vellum.
//!
//! Turns a flat expression such as `status=active && owner.age>=18` into a
//! parameterized SQL predicate over a JSON column. The pipeline is pure:
//! [`lexer::tokenize`] → [`syntax::check`] → [`render::render`].
//!
//! ```rust
//! use vellum_query::Param;
//!
//! let p = vellum_query::compile("foo=bar && count=5", "data", 1).unwrap();
//! assert_eq!(
//!   p.sql,
//!   "(json_type(data, '$.foo') = 'text' AND (data->>'foo') = ?1) AND \
//!    (json_type(data, '$.count') IN ('integer', 'real') AND (data->>'count') = ?2)"
//! );
//! assert_eq!(p.params, [Param::Text("bar".into()), Param::Integer(5)]);
//! ```

pub mod error;
pub mod lexer;
pub mod render;
pub mod syntax;

pub use error::{Error, Result};
pub use render::{Param, Predicate};

/// Compile `input` into a predicate over `column`, numbering placeholders
/// from `first_param`.
pub fn compile(input: &str, column: &str, first_param: usize) -> Result<Predicate> {
  let tokens = lexer::tokenize(input)?;
  syntax::check(input, &tokens)?;
  Ok(render::render(&tokens, column, first_param))
}
