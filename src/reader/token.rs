//! Module for extracting Templisp lexemes from an input blob.
//!
//! The lexer is a hand-written state machine: a single forward cursor over
//! the blob, a `start` marker for the current lexeme, and one-character
//! pushback (`backup`). Each state function consumes the characters of one
//! lexeme class and returns the next state; `None` stops the machine after
//! the `EOF` lexeme has been emitted.
//!
//! Lexeme values are exact source substrings. In particular a string
//! lexeme keeps its surrounding quotes and its escapes; stripping them is
//! the parser's job.

use crate::reader::{ReadError, ReadResult};

/// A Templisp lexeme.
///
/// Whitespace is the only input the lexer silently discards; comments and
/// the `#env` directive come through as ordinary lexemes so that consumers
/// of the raw stream can see them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexemeType {
    LParen,
    RParen,
    Number,
    String,
    Identifier,
    SingleQuote,
    Backtick,
    Comma,
    Comment,
    HTMLComment,
    Directive,
    EOF,
}

/// A lexeme along with the exact source text it was read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lexeme {
    pub lexeme_type: LexemeType,
    pub value: String,
}

impl Lexeme {
    pub fn new(lexeme_type: LexemeType, value: impl Into<String>) -> Self {
        Lexeme {
            lexeme_type,
            value: value.into(),
        }
    }
}

/// Split the input into its constituent lexemes.
///
/// The result is terminated by exactly one `EOF` lexeme. Any lexical error
/// aborts the whole call; there is no partial output.
pub fn lex(input: &str) -> ReadResult<Vec<Lexeme>> {
    Lexer::new(input).run()
}

/// Character classes as compiled predicates.
///
/// The classes overlap only partially: whitespace is a subset of the
/// separator class, but separators also include parens, brackets, and the
/// comment character. Keeping each class as its own compiled pattern makes
/// that overlap explicit instead of burying it in scattered `matches!`.
mod classes {
    use regex::Regex;
    use std::sync::OnceLock;

    pub(super) fn whitespace() -> &'static Regex {
        static MATCH: OnceLock<Regex> = OnceLock::new();
        MATCH.get_or_init(|| {
            Regex::new(r"\A[ \t\r\n]").expect("could not compile regex for whitespace")
        })
    }

    /// What may legally follow a number or identifier.
    pub(super) fn separator() -> &'static Regex {
        static MATCH: OnceLock<Regex> = OnceLock::new();
        MATCH.get_or_init(|| {
            Regex::new(r"\A[ \t\r\n()\[\];]").expect("could not compile regex for separator")
        })
    }

    /// Characters that terminate an identifier.
    pub(super) fn identifier_illegal() -> &'static Regex {
        static MATCH: OnceLock<Regex> = OnceLock::new();
        MATCH.get_or_init(|| {
            Regex::new(r#"\A[()\[\]"'`,;|\\ \t\r\n]"#)
                .expect("could not compile regex for identifier_illegal")
        })
    }

    /// Characters that may begin a number lexeme.
    pub(super) fn number_start() -> &'static Regex {
        static MATCH: OnceLock<Regex> = OnceLock::new();
        MATCH.get_or_init(|| {
            Regex::new(r"\A[+\-#0-9]").expect("could not compile regex for number_start")
        })
    }

    pub(super) fn sign() -> &'static Regex {
        static MATCH: OnceLock<Regex> = OnceLock::new();
        MATCH.get_or_init(|| Regex::new(r"\A[+-]").expect("could not compile regex for sign"))
    }

    pub(super) fn decimal() -> &'static Regex {
        static MATCH: OnceLock<Regex> = OnceLock::new();
        MATCH.get_or_init(|| Regex::new(r"\A[0-9]").expect("could not compile regex for decimal"))
    }

    pub(super) fn hex() -> &'static Regex {
        static MATCH: OnceLock<Regex> = OnceLock::new();
        MATCH.get_or_init(|| {
            Regex::new(r"\A[0-9a-fA-F]").expect("could not compile regex for hex")
        })
    }

    pub(super) fn binary() -> &'static Regex {
        static MATCH: OnceLock<Regex> = OnceLock::new();
        MATCH.get_or_init(|| Regex::new(r"\A[01]").expect("could not compile regex for binary"))
    }

    /// Test a single character against a class.
    pub(super) fn matches(class: &Regex, ch: char) -> bool {
        let mut buf = [0u8; 4];
        class.is_match(ch.encode_utf8(&mut buf))
    }
}

/// The lexer's states. `Default` dispatches on the current character; the
/// others each consume one lexeme of their class and fall back to
/// `Default`.
enum State {
    Default,
    Number,
    Identifier,
    String,
    Comment,
    Modifier,
}

struct Lexer {
    blob: Vec<char>,
    /// Start of the lexeme currently being read.
    start: usize,
    cursor: usize,
    out: Vec<Lexeme>,
}

impl Lexer {
    fn new(input: &str) -> Lexer {
        Lexer {
            blob: input.chars().collect(),
            start: 0,
            cursor: 0,
            out: Vec::new(),
        }
    }

    fn run(mut self) -> ReadResult<Vec<Lexeme>> {
        let mut state = Some(State::Default);
        while let Some(current) = state {
            state = match current {
                State::Default => self.lex_default()?,
                State::Number => self.lex_number()?,
                State::Identifier => self.lex_identifier()?,
                State::String => self.lex_string()?,
                State::Comment => self.lex_comment()?,
                State::Modifier => self.lex_modifier()?,
            };
        }
        Ok(self.out)
    }

    // --- cursor primitives ---

    fn peek(&self) -> Option<char> {
        self.blob.get(self.cursor).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.cursor += 1;
        Some(ch)
    }

    /// Push the last character back. Retreating past the start of the
    /// current lexeme is a programming error, not an input error.
    fn backup(&mut self) {
        assert!(
            self.cursor > self.start,
            "cannot back up past the start of the current lexeme"
        );
        self.cursor -= 1;
    }

    fn accept(&mut self, class: &regex::Regex) -> bool {
        if self.peek().is_some_and(|c| classes::matches(class, c)) {
            self.cursor += 1;
            return true;
        }
        false
    }

    fn accept_char(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.cursor += 1;
            return true;
        }
        false
    }

    /// Skip the characters consumed so far without emitting anything.
    fn ignore(&mut self) {
        self.start = self.cursor;
    }

    /// The source text of the lexeme being read.
    fn value(&self) -> String {
        self.blob[self.start..self.cursor].iter().collect()
    }

    fn width(&self) -> usize {
        self.cursor - self.start
    }

    fn emit(&mut self, lexeme_type: LexemeType) {
        let lexeme = Lexeme::new(lexeme_type, self.value());
        tracing::trace!("emit {:?}", lexeme);
        self.start = self.cursor;
        self.out.push(lexeme);
    }

    // --- error plumbing ---

    /// Line and column (1-indexed) where the current lexeme starts.
    fn position(&self) -> (usize, usize) {
        let mut line = 0;
        let mut last_line_start = 0;
        for (i, &c) in self.blob[..self.start].iter().enumerate() {
            if c == '\n' {
                line += 1;
                last_line_start = i + 1;
            }
        }
        (line + 1, self.start - last_line_start + 1)
    }

    /// Build a lexical error pointing at the current lexeme's text (or, if
    /// nothing was consumed yet, at the offending character).
    fn error(&self, kind: fn(String) -> ReadError, message: &str) -> ReadError {
        let token = self.value();
        let excerpt = if token.is_empty() {
            self.peek().map(String::from).unwrap_or_default()
        } else {
            token
        };
        let (line, column) = self.position();
        kind(format!("{message} at >>>{}<<<", excerpt.escape_debug()))
            .annotate(format!("at line {line} column {column}"))
    }

    /// For lexemes that must be followed by a separator: the violating
    /// character, if the next one is neither a separator nor end of input.
    fn separator_violation(&self) -> Option<char> {
        self.peek()
            .filter(|&c| !classes::matches(classes::separator(), c))
    }

    // --- states ---

    fn lex_default(&mut self) -> ReadResult<Option<State>> {
        loop {
            let Some(ch) = self.peek() else {
                self.emit(LexemeType::EOF);
                return Ok(None);
            };
            match ch {
                '(' => {
                    self.advance();
                    self.emit(LexemeType::LParen);
                }
                ')' => {
                    self.advance();
                    self.emit(LexemeType::RParen);
                }
                '\'' | '`' | ',' => return Ok(Some(State::Modifier)),
                ';' => return Ok(Some(State::Comment)),
                '"' => return Ok(Some(State::String)),
                c if classes::matches(classes::number_start(), c) => {
                    return Ok(Some(State::Number))
                }
                c if classes::matches(classes::whitespace(), c) => {
                    self.advance();
                    self.ignore();
                }
                _ => return Ok(Some(State::Identifier)),
            }
        }
    }

    /// Numbers are: an optional sign, an optional `#x`/`#b` radix marker,
    /// then digits of the active set with `_` group separators, and at most
    /// one `.` that must be followed by another digit. `#` with neither
    /// radix letter falls through to the directive rule.
    fn lex_number(&mut self) -> ReadResult<Option<State>> {
        let had_sign = self.accept(classes::sign());
        if had_sign {
            let continues = self
                .peek()
                .is_some_and(|c| c == '#' || classes::matches(classes::decimal(), c));
            if !continues {
                // A bare sign starts an identifier, not a number.
                self.backup();
                return Ok(Some(State::Identifier));
            }
        }

        let mut digits = classes::decimal();
        if self.accept_char('#') {
            if self.accept_char('x') {
                digits = classes::hex();
            } else if self.accept_char('b') {
                digits = classes::binary();
            } else if had_sign {
                return Err(self.error(
                    ReadError::InvalidNumber,
                    "expected radix 'x' or 'b' after '#'",
                ));
            } else {
                return self.lex_directive();
            }
        }

        if !self.accept(digits) {
            return Err(self.error(ReadError::InvalidNumber, "expected a digit"));
        }
        self.accept_digit_run(digits);
        if self.accept_char('.') {
            if !self.accept(digits) {
                return Err(self.error(ReadError::InvalidNumber, "expected a digit after '.'"));
            }
            self.accept_digit_run(digits);
        }
        if self.value().ends_with('_') {
            return Err(self.error(
                ReadError::InvalidNumber,
                "no underscores allowed at the end of a number",
            ));
        }

        // A number needs to be followed by an unambiguous separator.
        // Otherwise 12345abcd would lex as a number and an identifier.
        if self.separator_violation().is_some() {
            return Err(self.error(
                ReadError::InvalidNumber,
                "number must be followed by a separator",
            ));
        }
        self.emit(LexemeType::Number);
        Ok(Some(State::Default))
    }

    /// Digits of the active set, with underscores allowed once the first
    /// digit has been read.
    fn accept_digit_run(&mut self, digits: &regex::Regex) {
        while self
            .peek()
            .is_some_and(|c| c == '_' || classes::matches(digits, c))
        {
            self.advance();
        }
    }

    /// A `#` that selects no radix: the only recognized spelling is `#env`.
    fn lex_directive(&mut self) -> ReadResult<Option<State>> {
        while let Some(c) = self.peek() {
            if classes::matches(classes::identifier_illegal(), c) {
                break;
            }
            self.advance();
        }
        if self.value() != "#env" || self.separator_violation().is_some() {
            return Err(self.error(ReadError::MalformedDirective, "unrecognized directive"));
        }
        self.emit(LexemeType::Directive);
        Ok(Some(State::Default))
    }

    fn lex_identifier(&mut self) -> ReadResult<Option<State>> {
        while let Some(c) = self.peek() {
            if classes::matches(classes::identifier_illegal(), c) {
                break;
            }
            self.advance();
        }
        if self.width() == 0 {
            // The very first character is already illegal: nothing can
            // lex here.
            return Err(self.error(ReadError::UnexpectedCharacter, "no lexing rule matches"));
        }
        if self.separator_violation().is_some() {
            return Err(self.error(
                ReadError::UnexpectedCharacter,
                "identifier must be followed by a separator",
            ));
        }
        self.emit(LexemeType::Identifier);
        Ok(Some(State::Default))
    }

    fn lex_string(&mut self) -> ReadResult<Option<State>> {
        let quote = self
            .advance()
            .expect("string state entered at end of input");
        loop {
            let Some(c) = self.advance() else {
                return Err(self.error(ReadError::UnterminatedString, "closing quote never found"));
            };
            if c == '\\' {
                // The escaped character is copied raw, whatever it is.
                if self.advance().is_none() {
                    return Err(
                        self.error(ReadError::UnterminatedString, "closing quote never found")
                    );
                }
            } else if c == quote {
                self.emit(LexemeType::String);
                return Ok(Some(State::Default));
            }
        }
    }

    fn lex_comment(&mut self) -> ReadResult<Option<State>> {
        self.accept_char(';');
        // The second ; turns this into an HTML comment.
        let html = self.accept_char(';');
        while let Some(c) = self.peek() {
            if c == '\n' {
                // The newline is not part of the comment.
                break;
            }
            self.advance();
        }
        if html {
            self.emit(LexemeType::HTMLComment);
        } else {
            self.emit(LexemeType::Comment);
        }
        Ok(Some(State::Default))
    }

    /// Reader sugar binds tightly: the marker must be followed by `(` or by
    /// something that starts an atom.
    fn lex_modifier(&mut self) -> ReadResult<Option<State>> {
        let marker = self
            .advance()
            .expect("modifier state entered at end of input");
        let operand_ok = self.peek().is_some_and(|c| {
            c == '(' || c == '"' || !classes::matches(classes::identifier_illegal(), c)
        });
        if !operand_ok {
            let found = match self.peek() {
                Some(c) => format!("{c:?}"),
                None => "end of input".to_owned(),
            };
            return Err(self.error(
                ReadError::IllegalModifierPosition,
                &format!("{marker} cannot be followed by {found}"),
            ));
        }
        match marker {
            '\'' => self.emit(LexemeType::SingleQuote),
            '`' => self.emit(LexemeType::Backtick),
            ',' => self.emit(LexemeType::Comma),
            _ => unreachable!("modifier state entered on non-modifier character"),
        }
        Ok(Some(State::Default))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_lexemes(input: &str, want: &[(LexemeType, &str)]) {
        let got = lex(input).unwrap_or_else(|e| panic!("lexing {input:?} failed: {e}"));
        assert_eq!(got.len(), want.len(), "lexeme count for {input:?}: {got:?}");
        for ((i, got), (want_type, want_value)) in got.iter().enumerate().zip(want.iter()) {
            assert_eq!(
                got,
                &Lexeme::new(*want_type, *want_value),
                "unexpected lexeme in case {i} for {input:?}"
            );
        }
    }

    #[test]
    fn identifiers() {
        use LexemeType::*;
        assert_lexemes(
            "(ay bee cee)",
            &[
                (LParen, "("),
                (Identifier, "ay"),
                (Identifier, "bee"),
                (Identifier, "cee"),
                (RParen, ")"),
                (EOF, ""),
            ],
        );
    }

    #[test]
    fn numbers() {
        use LexemeType::*;
        assert_lexemes(
            "(1 2352 1235.6 3.0 -5 +3 23_000 #xfF #b101 -#x035a)",
            &[
                (LParen, "("),
                (Number, "1"),
                (Number, "2352"),
                (Number, "1235.6"),
                (Number, "3.0"),
                (Number, "-5"),
                (Number, "+3"),
                (Number, "23_000"),
                (Number, "#xfF"),
                (Number, "#b101"),
                (Number, "-#x035a"),
                (RParen, ")"),
                (EOF, ""),
            ],
        );
    }

    #[test]
    fn bare_operators_are_identifiers() {
        use LexemeType::*;
        assert_lexemes(
            "(+ - * /)",
            &[
                (LParen, "("),
                (Identifier, "+"),
                (Identifier, "-"),
                (Identifier, "*"),
                (Identifier, "/"),
                (RParen, ")"),
                (EOF, ""),
            ],
        );
    }

    #[test]
    fn sign_followed_by_letters_is_an_identifier() {
        use LexemeType::*;
        assert_lexemes(
            "(+foo -bar)",
            &[
                (LParen, "("),
                (Identifier, "+foo"),
                (Identifier, "-bar"),
                (RParen, ")"),
                (EOF, ""),
            ],
        );
    }

    #[test]
    fn strings_keep_quotes_and_escapes() {
        use LexemeType::*;
        assert_lexemes(
            r#"("ay bee cee")"#,
            &[
                (LParen, "("),
                (String, r#""ay bee cee""#),
                (RParen, ")"),
                (EOF, ""),
            ],
        );
        assert_lexemes(
            r#"("ay bee cee\" dee ")"#,
            &[
                (LParen, "("),
                (String, r#""ay bee cee\" dee ""#),
                (RParen, ")"),
                (EOF, ""),
            ],
        );
        // The escape is preserved verbatim in the lexeme value.
        assert_lexemes("\"a\\\"b\"", &[(String, r#""a\"b""#), (EOF, "")]);
    }

    #[test]
    fn comments() {
        use LexemeType::*;
        assert_lexemes(
            "; c\n;; d",
            &[(Comment, "; c"), (HTMLComment, ";; d"), (EOF, "")],
        );
        assert_lexemes(
            "(1 2 3) ; comment",
            &[
                (LParen, "("),
                (Number, "1"),
                (Number, "2"),
                (Number, "3"),
                (RParen, ")"),
                (Comment, "; comment"),
                (EOF, ""),
            ],
        );
    }

    #[test]
    fn modifiers() {
        use LexemeType::*;
        assert_lexemes(
            "(define x 'y)",
            &[
                (LParen, "("),
                (Identifier, "define"),
                (Identifier, "x"),
                (SingleQuote, "'"),
                (Identifier, "y"),
                (RParen, ")"),
                (EOF, ""),
            ],
        );
        assert_lexemes(
            "`(a ,b)",
            &[
                (Backtick, "`"),
                (LParen, "("),
                (Identifier, "a"),
                (Comma, ","),
                (Identifier, "b"),
                (RParen, ")"),
                (EOF, ""),
            ],
        );
        // A string is a valid modifier operand.
        assert_lexemes(
            "'\"s\"",
            &[(SingleQuote, "'"), (String, "\"s\""), (EOF, "")],
        );
    }

    #[test]
    fn missing_space_before_lparen_is_fine() {
        use LexemeType::*;
        assert_lexemes(
            "(define x(+ 1 2))",
            &[
                (LParen, "("),
                (Identifier, "define"),
                (Identifier, "x"),
                (LParen, "("),
                (Identifier, "+"),
                (Number, "1"),
                (Number, "2"),
                (RParen, ")"),
                (RParen, ")"),
                (EOF, ""),
            ],
        );
    }

    #[test]
    fn directive() {
        use LexemeType::*;
        assert_lexemes(
            "#env prod",
            &[(Directive, "#env"), (Identifier, "prod"), (EOF, "")],
        );
        assert!(matches!(
            lex("#denv prod"),
            Err(ReadError::MalformedDirective(_))
        ));
        assert!(matches!(
            lex("#envprod"),
            Err(ReadError::MalformedDirective(_))
        ));
    }

    #[test]
    fn invalid_numbers() {
        for input in [
            "1.2e3",  // no exponent notation; 'e' fails the separator check
            "1.2.3",  // second '.' is not a valid continuation
            "12_",    // trailing underscore
            "1._2",   // '.' must be followed by a digit
            "#x",     // radix marker without digits
            "#b102",  // '2' is not a binary digit
            "123abc", // missing separator
            "+#env",  // sign excludes the directive reading
        ] {
            let got = lex(input);
            assert!(
                matches!(got, Err(ReadError::InvalidNumber(_))),
                "expected InvalidNumber for {input:?}, got {got:?}"
            );
        }
    }

    #[test]
    fn unterminated_strings() {
        assert!(matches!(
            lex("(\"x"),
            Err(ReadError::UnterminatedString(_))
        ));
        // A backslash right before end of input leaves the string open.
        assert!(matches!(
            lex("\"x\\"),
            Err(ReadError::UnterminatedString(_))
        ));
        assert!(matches!(
            lex("\"hello\\\""),
            Err(ReadError::UnterminatedString(_))
        ));
    }

    #[test]
    fn illegal_modifier_positions() {
        for input in ["(''134e6)", "(''sdf)", "' x", "(a ')", "`"] {
            let got = lex(input);
            assert!(
                matches!(got, Err(ReadError::IllegalModifierPosition(_))),
                "expected IllegalModifierPosition for {input:?}, got {got:?}"
            );
        }
    }

    #[test]
    fn unexpected_characters() {
        for input in ["[", "]", "|x", "ab\"cd\"", "a,b"] {
            let got = lex(input);
            assert!(
                matches!(got, Err(ReadError::UnexpectedCharacter(_))),
                "expected UnexpectedCharacter for {input:?}, got {got:?}"
            );
        }
    }

    #[test]
    fn errors_carry_position_and_excerpt() {
        let err = lex("(\n  \"x").expect_err("unterminated string must fail");
        let message = err.to_string();
        assert!(message.contains("line 2"), "missing line info: {message}");
        assert!(message.contains("column 3"), "missing column info: {message}");
        assert!(message.contains(">>>"), "missing excerpt: {message}");
    }

    /// Re-lexing the exact text of any emitted atom or string lexeme must
    /// reproduce a one-lexeme (plus EOF) stream of the same type.
    #[test]
    fn atom_lexemes_relex_to_themselves() {
        let input = r#"(foo "a\"b" 12_3 #xfF 'y -5 #b101 "z w")"#;
        let lexemes = lex(input).expect("input must lex");
        for lexeme in lexemes {
            if !matches!(
                lexeme.lexeme_type,
                LexemeType::Identifier | LexemeType::Number | LexemeType::String
            ) {
                continue;
            }
            let again = lex(&lexeme.value)
                .unwrap_or_else(|e| panic!("re-lexing {:?} failed: {e}", lexeme.value));
            assert_eq!(again.len(), 2, "re-lexing {:?}: {again:?}", lexeme.value);
            assert_eq!(again[0], lexeme);
            assert_eq!(again[1].lexeme_type, LexemeType::EOF);
        }
    }
}
