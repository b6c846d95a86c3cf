//! Single-slot `%`-style command templates.
//!
//! Dependency-install commands are configured as templates such as
//! `.venv/bin/pip install %s`. The resolved dependency list is substituted
//! into the one `%s` slot when the command is rendered.
//!
//! # Escaping
//!
//! `%%` produces a literal `%`. Any other character after a `%` is an error,
//! as is a template with zero or several `%s` slots.
//!
//! # Example
//!
//! ```
//! use giftwrap_lib::template::substitute;
//!
//! let rendered = substitute(".venv/bin/pip install %s", "six==1.8.0 pbr==0.10.0").unwrap();
//! assert_eq!(rendered, ".venv/bin/pip install six==1.8.0 pbr==0.10.0");
//! ```

use thiserror::Error;

/// A segment of a parsed template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
  /// Literal text, with `%%` already collapsed to `%`.
  Literal(String),

  /// The `%s` substitution slot.
  Slot,
}

/// Errors that can occur while parsing or rendering a template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
  #[error("template '{0}' has no %s slot")]
  MissingSlot(String),

  #[error("template '{template}' has {count} %s slots, expected one")]
  ExtraSlots { template: String, count: usize },

  #[error("unsupported conversion '%{conversion}' at position {position}")]
  UnsupportedConversion { conversion: char, position: usize },

  #[error("incomplete format at end of template '{0}'")]
  Incomplete(String),
}

/// Parse a template into segments.
pub fn parse(input: &str) -> Result<Vec<Segment>, TemplateError> {
  let mut segments = Vec::new();
  let mut literal = String::new();
  let mut chars = input.char_indices();

  while let Some((pos, ch)) = chars.next() {
    if ch != '%' {
      literal.push(ch);
      continue;
    }

    match chars.next() {
      Some((_, '%')) => literal.push('%'),
      Some((_, 's')) => {
        if !literal.is_empty() {
          segments.push(Segment::Literal(std::mem::take(&mut literal)));
        }
        segments.push(Segment::Slot);
      }
      Some((_, other)) => {
        return Err(TemplateError::UnsupportedConversion {
          conversion: other,
          position: pos,
        });
      }
      None => return Err(TemplateError::Incomplete(input.to_string())),
    }
  }

  if !literal.is_empty() {
    segments.push(Segment::Literal(literal));
  }

  Ok(segments)
}

/// Check that a template has exactly one slot.
pub fn validate(input: &str) -> Result<(), TemplateError> {
  let slots = parse(input)?.iter().filter(|s| **s == Segment::Slot).count();
  match slots {
    1 => Ok(()),
    0 => Err(TemplateError::MissingSlot(input.to_string())),
    count => Err(TemplateError::ExtraSlots {
      template: input.to_string(),
      count,
    }),
  }
}

/// Render `input`, putting `value` into its single `%s` slot.
pub fn substitute(input: &str, value: &str) -> Result<String, TemplateError> {
  validate(input)?;

  let rendered = parse(input)?
    .into_iter()
    .map(|segment| match segment {
      Segment::Literal(text) => text,
      Segment::Slot => value.to_string(),
    })
    .collect();

  Ok(rendered)
}
