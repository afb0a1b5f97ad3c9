//! The Templisp document tree.
//!
//! One parse produces one [`Node::Root`]. Containers (`Root`, `List`) own
//! their children in source order; atoms own only their text. The reader
//! never interprets atom contents: a `Number` keeps the exact spelling
//! from the source (sign, radix marker, underscores and all), and a
//! `String` keeps its escapes verbatim with only the two outer quote
//! characters stripped. Downstream templating decides what the text means.
//!
//! The `Display` implementation renders a node as S-expression text that
//! reads back as the same tree.

use std::fmt;

/// A node in the parsed document tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// The top-level container: the unit of one parse.
    Root(Vec<Node>),
    /// A parenthesized form.
    List(Vec<Node>),
    Identifier(String),
    Number(String),
    String(String),
}

impl Node {
    /// The children of a container node; empty for atoms.
    pub fn children(&self) -> &[Node] {
        match self {
            Node::Root(children) | Node::List(children) => children,
            _ => &[],
        }
    }

    /// True for the leaf variants.
    pub fn is_atom(&self) -> bool {
        !matches!(self, Node::Root(_) | Node::List(_))
    }

    pub fn identifier(name: impl Into<String>) -> Node {
        Node::Identifier(name.into())
    }

    pub fn number(text: impl Into<String>) -> Node {
        Node::Number(text.into())
    }

    pub fn string(body: impl Into<String>) -> Node {
        Node::String(body.into())
    }

    /// Greatest nesting depth below this node.
    /// An atom has depth 0; `(a (b))` has depth 2.
    pub fn depth(&self) -> usize {
        self.children()
            .iter()
            .map(|child| child.depth() + 1)
            .max()
            .unwrap_or(0)
    }
}

fn write_children(f: &mut fmt::Formatter<'_>, children: &[Node]) -> fmt::Result {
    for (i, child) in children.iter().enumerate() {
        if i > 0 {
            write!(f, " ")?;
        }
        write!(f, "{child}")?;
    }
    Ok(())
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // A root prints as its children, space-separated: the same
            // shape the input blob had.
            Node::Root(children) => write_children(f, children),
            Node::List(children) => {
                write!(f, "(")?;
                write_children(f, children)?;
                write!(f, ")")
            }
            Node::Identifier(name) => write!(f, "{name}"),
            Node::Number(text) => write!(f, "{text}"),
            Node::String(body) => write!(f, "\"{body}\""),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn children_of_atoms_are_empty() {
        assert!(Node::identifier("x").children().is_empty());
        assert!(Node::number("1").children().is_empty());
        assert!(Node::string("hi").children().is_empty());
        assert!(Node::identifier("x").is_atom());
        assert!(!Node::List(vec![]).is_atom());
    }

    #[test]
    fn depth_counts_nesting() {
        let tree = Node::Root(vec![Node::List(vec![
            Node::identifier("a"),
            Node::List(vec![Node::number("1")]),
        ])]);
        assert_eq!(tree.depth(), 3);
        assert_eq!(Node::Root(vec![]).depth(), 0);
    }

    #[test]
    fn display_renders_sexpr_text() {
        let tree = Node::Root(vec![Node::List(vec![
            Node::identifier("p"),
            Node::string("a\\\"b"),
            Node::List(vec![Node::number("1"), Node::number("#x1F")]),
        ])]);
        assert_eq!(tree.to_string(), r#"(p "a\"b" (1 #x1F))"#);
    }
}
