//! Reader front end for the Templisp markup language.
//!
//! Templisp documents are S-expressions; this crate turns their textual
//! form into a typed tree. It owns exactly two operations:
//!
//! - [`lex`]: split a source blob into an EOF-terminated lexeme sequence
//! - [`parse`]: build a [`Node::Root`] tree from source (or from lexemes,
//!   via [`reader::parse_lexemes`])
//!
//! Preprocessing (comment-line stripping, doctype desugaring) and anything
//! downstream of the tree (templating, rendering) live in the consuming
//! layers, not here.

pub mod data;
pub mod reader;

pub use data::Node;
pub use reader::{lex, parse, Lexeme, LexemeType, ReadError, ReadResult};
