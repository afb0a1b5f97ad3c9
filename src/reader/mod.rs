//! Reading Templisp source into a document tree.
//!
//! The pipeline is one-directional: text goes through [`lex`] to an
//! EOF-terminated lexeme sequence, and through [`parse_lexemes`] to a
//! [`Node::Root`]. [`parse`] chains the two for callers holding raw text.
//!
//! Every failure is terminal for the call: the reader never resynchronizes
//! or returns a partial tree. Callers treat any `ReadError` as "reject
//! this input entirely" and re-invoke with corrected input.

use crate::data::Node;

mod parse;
mod token;

pub use parse::parse_lexemes;
pub use token::{lex, Lexeme, LexemeType};

/// Parse a whole source blob into its root node.
///
/// Lexical errors propagate unchanged; structural errors are reported as
/// described on [`parse_lexemes`].
pub fn parse(input: &str) -> ReadResult<Node> {
    let lexemes = lex(input)?;
    parse_lexemes(lexemes)
}

/// Error type if a read does not complete.
///
/// Each variant carries a human-readable message with the offending
/// excerpt (delimited `>>>...<<<`) and, for lexical errors, the line and
/// column where the current token started. The variant itself is the
/// machine-readable part: callers that care which rule failed can match
/// on it without picking the message apart.
#[derive(Debug, Clone, PartialEq)]
pub enum ReadError {
    /// A string's closing quote was never found.
    UnterminatedString(String),
    /// A `)` with no open list, or end of input with lists still open.
    UnmatchedParen(String),
    /// A numeric literal that violates the numeric grammar, including a
    /// number not followed by a separator.
    InvalidNumber(String),
    /// Reader sugar (`'`, `` ` ``, `,`) without a valid operand.
    IllegalModifierPosition(String),
    /// No lexing rule matches the current character.
    UnexpectedCharacter(String),
    /// A `#`-token that is neither a radix prefix nor the `#env` spelling.
    MalformedDirective(String),
}

impl ReadError {
    /// Add additional context to an error.
    pub fn annotate(self, more: impl AsRef<str>) -> Self {
        let more = more.as_ref();
        match self {
            ReadError::UnterminatedString(e) => {
                ReadError::UnterminatedString(format!("{more}: {e}"))
            }
            ReadError::UnmatchedParen(e) => ReadError::UnmatchedParen(format!("{more}: {e}")),
            ReadError::InvalidNumber(e) => ReadError::InvalidNumber(format!("{more}: {e}")),
            ReadError::IllegalModifierPosition(e) => {
                ReadError::IllegalModifierPosition(format!("{more}: {e}"))
            }
            ReadError::UnexpectedCharacter(e) => {
                ReadError::UnexpectedCharacter(format!("{more}: {e}"))
            }
            ReadError::MalformedDirective(e) => {
                ReadError::MalformedDirective(format!("{more}: {e}"))
            }
        }
    }

    fn message(&self) -> &str {
        match self {
            ReadError::UnterminatedString(e)
            | ReadError::UnmatchedParen(e)
            | ReadError::InvalidNumber(e)
            | ReadError::IllegalModifierPosition(e)
            | ReadError::UnexpectedCharacter(e)
            | ReadError::MalformedDirective(e) => e,
        }
    }
}

impl std::fmt::Display for ReadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let what = match self {
            ReadError::UnterminatedString(_) => "unterminated string",
            ReadError::UnmatchedParen(_) => "unmatched paren",
            ReadError::InvalidNumber(_) => "invalid number",
            ReadError::IllegalModifierPosition(_) => "illegal modifier position",
            ReadError::UnexpectedCharacter(_) => "unexpected character",
            ReadError::MalformedDirective(_) => "malformed directive",
        };
        write!(f, "{what}: {}", self.message())
    }
}

impl std::error::Error for ReadError {}

/// The main result type for this module:
/// a T (lexeme sequence, node, etc.) or an error.
pub type ReadResult<T> = Result<T, ReadError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn annotate_prefixes_and_keeps_variant() {
        let err = ReadError::InvalidNumber(">>>1._<<<".to_owned());
        let annotated = err.annotate("at line 3 column 4");
        assert_eq!(
            annotated,
            ReadError::InvalidNumber("at line 3 column 4: >>>1._<<<".to_owned())
        );
        assert_eq!(
            annotated.to_string(),
            "invalid number: at line 3 column 4: >>>1._<<<"
        );
    }
}
