//! Building the document tree from a lexeme sequence.
//!
//! The parser keeps an explicit stack of open containers: one frame of
//! children per unclosed list, with the root frame at the bottom. Every
//! `LParen`/`RParen` moves the depth by exactly one, so the stack top is
//! always the current insertion point.

use crate::data::Node;
use crate::reader::token::{Lexeme, LexemeType};
use crate::reader::{ReadError, ReadResult};

fn is_atom(lexeme_type: LexemeType) -> bool {
    matches!(
        lexeme_type,
        LexemeType::Identifier | LexemeType::Number | LexemeType::String
    )
}

/// Convert an atom lexeme to its node. String lexemes lose their two outer
/// quote characters here; everything between them stays verbatim.
fn atom(lexeme: &Lexeme) -> Node {
    match lexeme.lexeme_type {
        LexemeType::Identifier => Node::Identifier(lexeme.value.clone()),
        LexemeType::Number => Node::Number(lexeme.value.clone()),
        LexemeType::String => {
            let body = &lexeme.value[1..lexeme.value.len() - 1];
            Node::String(body.to_owned())
        }
        _ => unreachable!("atom() requires an atom lexeme"),
    }
}

/// The explicit form a reader-sugar marker expands to.
fn special_form(lexeme_type: LexemeType) -> &'static str {
    match lexeme_type {
        LexemeType::SingleQuote => "quote",
        LexemeType::Backtick => "quasiquote",
        LexemeType::Comma => "unquote",
        _ => unreachable!("special_form() requires a modifier lexeme"),
    }
}

/// Build the root node from an EOF-terminated lexeme sequence.
///
/// A sequence without a trailing `EOF` lexeme (e.g. one assembled by hand)
/// is treated as ending at its last lexeme.
pub fn parse_lexemes(lexemes: Vec<Lexeme>) -> ReadResult<Node> {
    let mut lexemes = lexemes.into_iter().peekable();
    // One frame of children per open container; the bottom frame is the
    // root's.
    let mut stack: Vec<Vec<Node>> = vec![Vec::new()];

    while let Some(lexeme) = lexemes.next() {
        match lexeme.lexeme_type {
            LexemeType::EOF => break,
            LexemeType::Identifier | LexemeType::Number | LexemeType::String => {
                let node = atom(&lexeme);
                stack
                    .last_mut()
                    .expect("parse stack holds the root frame")
                    .push(node);
            }
            LexemeType::LParen => stack.push(Vec::new()),
            LexemeType::RParen => {
                if stack.len() == 1 {
                    return Err(ReadError::UnmatchedParen(
                        "encountered ')' without matching '('".to_owned(),
                    ));
                }
                let children = stack.pop().expect("length checked above");
                stack
                    .last_mut()
                    .expect("parse stack holds the root frame")
                    .push(Node::List(children));
            }
            LexemeType::SingleQuote | LexemeType::Backtick | LexemeType::Comma => {
                let form = Node::identifier(special_form(lexeme.lexeme_type));
                // The operand is consumed here, as part of the expansion.
                match lexemes.peek() {
                    Some(next) if is_atom(next.lexeme_type) => {
                        let wrapped = Node::List(vec![form, atom(next)]);
                        stack
                            .last_mut()
                            .expect("parse stack holds the root frame")
                            .push(wrapped);
                        lexemes.next();
                    }
                    Some(next) if next.lexeme_type == LexemeType::LParen => {
                        // The synthesized form becomes the open list:
                        // everything up to the matching ')' lands after the
                        // form name.
                        stack.push(vec![form]);
                        lexemes.next();
                    }
                    _ => {
                        return Err(ReadError::IllegalModifierPosition(format!(
                            "{} at illegal position",
                            lexeme.value
                        )))
                    }
                }
            }
            // Comments and directives do not affect nesting and do not
            // survive into the tree; consumers that want them read the
            // lexeme stream instead.
            LexemeType::Comment | LexemeType::HTMLComment | LexemeType::Directive => (),
        }
    }

    if stack.len() != 1 {
        return Err(ReadError::UnmatchedParen(format!(
            "end of input with {} open list(s)",
            stack.len() - 1
        )));
    }
    let children = stack.pop().expect("length checked above");
    tracing::trace!("parsed {} top-level form(s)", children.len());
    Ok(Node::Root(children))
}
