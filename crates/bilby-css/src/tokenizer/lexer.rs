//! The stylesheet lexer.
//!
//! A pull-based tokenizer: [`Lexer`] implements `Iterator<Item = Lexeme>`, so
//! lexing is lazy and a fresh `Lexer` over the same source restarts the exact
//! same sequence. The final lexeme is always [`LexemeKind::Eof`].

use super::token::{Lexeme, LexemeKind, SourcePosition};

/// Non-functional pseudo-class keywords the lexer recognizes after `:`.
///
/// Structural predicates plus the interaction states the matching engine
/// filters rule sets by. An identifier after `:` that is not in this table is
/// lexed as a plain `Colon` + `Ident` pair and the selector parser decides
/// what it means.
const PSEUDO_CLASSES: &[&str] = &[
    "root",
    "first-child",
    "last-child",
    "first-of-type",
    "last-of-type",
    "only-child",
    "only-of-type",
    "empty",
    "link",
    "visited",
    "hover",
    "active",
    "focus",
    "target",
    "enabled",
    "disabled",
    "checked",
    "indeterminate",
];

/// Functional pseudo-class keywords, recognized when followed by `(`.
const PSEUDO_FUNCTIONS: &[&str] = &[
    "nth-child",
    "nth-last-child",
    "nth-of-type",
    "nth-last-of-type",
    "not",
];

/// Stylesheet lexer producing [`Lexeme`]s on demand.
pub struct Lexer {
    /// The input as code points.
    input: Vec<char>,
    /// Current position in the input.
    position: usize,
    /// 1-indexed line of the next char.
    line: u32,
    /// 1-indexed column of the next char.
    column: u32,
    /// Line/column before the last `consume`, for single-step reconsume.
    before_last: (u32, u32),
    /// Set once the EOF sentinel has been produced.
    finished: bool,
}

impl Iterator for Lexer {
    type Item = Lexeme;

    fn next(&mut self) -> Option<Lexeme> {
        if self.finished {
            return None;
        }
        let lexeme = self.next_lexeme();
        if lexeme.is_eof() {
            self.finished = true;
        }
        Some(lexeme)
    }
}

impl Lexer {
    /// Create a new lexer over the given source text.
    #[must_use]
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
            line: 1,
            column: 1,
            before_last: (1, 1),
            finished: false,
        }
    }

    /// Produce the next lexeme. After the input is exhausted this keeps
    /// returning the EOF sentinel; the `Iterator` impl stops after the first.
    fn next_lexeme(&mut self) -> Lexeme {
        self.skip_comments();

        let start = self.position;
        let position = self.here();

        let Some(c) = self.consume() else {
            return self.emit(LexemeKind::Eof, start, position);
        };

        let kind = match c {
            c if is_whitespace(c) => {
                self.consume_whitespace();
                LexemeKind::Whitespace
            }

            '"' | '\'' => self.consume_string(c),

            '#' => {
                if self.peek().is_some_and(is_ident_char) {
                    let name = self.consume_ident_sequence();
                    if is_hex_color(&name) {
                        LexemeKind::HexColor(name)
                    } else {
                        LexemeKind::Hash(name)
                    }
                } else {
                    LexemeKind::Delim('#')
                }
            }

            '.' => {
                if self.would_start_number() {
                    self.reconsume();
                    self.consume_numeric()
                } else if self.peek().is_some_and(is_ident_start_char) {
                    LexemeKind::Class(self.consume_ident_sequence())
                } else {
                    LexemeKind::Delim('.')
                }
            }

            ':' => self.consume_pseudo(),

            '@' => {
                if self.peek().is_some_and(is_ident_start_char) {
                    LexemeKind::AtKeyword(self.consume_ident_sequence())
                } else {
                    LexemeKind::Delim('@')
                }
            }

            '{' => LexemeKind::LBrace,
            '}' => LexemeKind::RBrace,
            '(' => LexemeKind::LParen,
            ')' => LexemeKind::RParen,
            '[' => LexemeKind::LBracket,
            ']' => LexemeKind::RBracket,
            ';' => LexemeKind::Semicolon,
            ',' => LexemeKind::Comma,
            '>' => LexemeKind::Greater,
            '=' => LexemeKind::Equal,

            // Attribute operators share their first char with combinators
            // and the universal selector, so look one ahead for '='.
            '~' => self.with_equals(LexemeKind::ListContains, LexemeKind::Tilde),
            '|' => self.with_equals(LexemeKind::DashMatch, LexemeKind::Pipe),
            '*' => self.with_equals(LexemeKind::Contains, LexemeKind::Star),
            '^' => self.with_equals(LexemeKind::StartsWith, LexemeKind::Delim('^')),
            '$' => self.with_equals(LexemeKind::EndsWith, LexemeKind::Delim('$')),

            '+' => {
                if self.would_start_number() {
                    self.reconsume();
                    self.consume_numeric()
                } else {
                    LexemeKind::Plus
                }
            }

            '-' => {
                if self.would_start_number() {
                    self.reconsume();
                    self.consume_numeric()
                } else if self.peek().is_some_and(is_ident_start_char) || self.peek() == Some('-') {
                    self.reconsume();
                    LexemeKind::Ident(self.consume_ident_sequence())
                } else {
                    LexemeKind::Delim('-')
                }
            }

            c if c.is_ascii_digit() => {
                self.reconsume();
                self.consume_numeric()
            }

            c if is_ident_start_char(c) => {
                self.reconsume();
                self.consume_ident_like()
            }

            '!' | '/' | '%' => LexemeKind::Delim(c),

            // Anything else cannot start a lexeme. Emit an error lexeme with
            // the position and keep going; the parser decides recovery.
            c => LexemeKind::Error(c),
        };

        self.emit(kind, start, position)
    }

    /// Build a lexeme, capturing the raw text between `start` and the
    /// current position.
    fn emit(&self, kind: LexemeKind, start: usize, position: SourcePosition) -> Lexeme {
        let text: String = self.input[start..self.position].iter().collect();
        Lexeme {
            kind,
            text,
            position,
        }
    }

    /// Current source position (of the next unconsumed char).
    fn here(&self) -> SourcePosition {
        SourcePosition {
            line: self.line,
            column: self.column,
            offset: self.position,
        }
    }

    /// Skip `/* ... */` comments and nothing else. Comments may be adjacent;
    /// an unterminated comment runs to EOF.
    fn skip_comments(&mut self) {
        while self.peek() == Some('/') && self.peek_at(1) == Some('*') {
            let _ = self.consume(); // /
            let _ = self.consume(); // *
            loop {
                match self.consume() {
                    Some('*') if self.peek() == Some('/') => {
                        let _ = self.consume();
                        break;
                    }
                    Some(_) => {}
                    None => break,
                }
            }
        }
    }

    /// Consume as much whitespace as possible.
    fn consume_whitespace(&mut self) {
        while self.peek().is_some_and(is_whitespace) {
            let _ = self.consume();
        }
    }

    /// Consume a string body after its opening quote. The closing quote is
    /// consumed; a newline or EOF ends the string early with the content
    /// collected so far (graceful, never fatal).
    fn consume_string(&mut self, quote: char) -> LexemeKind {
        let mut value = String::new();
        loop {
            match self.consume() {
                Some(c) if c == quote => return LexemeKind::QuotedString(value),
                None => return LexemeKind::QuotedString(value),
                Some('\n') => {
                    self.reconsume();
                    return LexemeKind::QuotedString(value);
                }
                Some('\\') => match self.peek() {
                    None => {}
                    Some('\n') => {
                        let _ = self.consume();
                    }
                    Some(c) => {
                        let _ = self.consume();
                        value.push(c);
                    }
                },
                Some(c) => value.push(c),
            }
        }
    }

    /// Consume `:name`, `:name(` or `::name` after the initial `:`.
    ///
    /// Only names in the pseudo keyword tables collapse into pseudo lexemes;
    /// anything else backs off to a plain `Colon` so declaration values like
    /// `color:red` lex as ident/colon/ident.
    fn consume_pseudo(&mut self) -> LexemeKind {
        if self.peek() == Some(':') {
            let _ = self.consume();
            if self.peek().is_some_and(is_ident_start_char) {
                return LexemeKind::PseudoElement(self.consume_ident_sequence());
            }
            // `::` with no name: report the stray second colon.
            return LexemeKind::Error(':');
        }

        if self.peek().is_some_and(is_ident_start_char) {
            let save = self.position;
            let save_pos = (self.line, self.column);
            let name = self.consume_ident_sequence();
            let lower = name.to_ascii_lowercase();

            if self.peek() == Some('(') && PSEUDO_FUNCTIONS.contains(&lower.as_str()) {
                let _ = self.consume();
                return LexemeKind::PseudoFunction(lower);
            }
            if PSEUDO_CLASSES.contains(&lower.as_str()) {
                return LexemeKind::PseudoClass(lower);
            }

            // Unknown name: rewind so the ident is lexed on its own. The
            // selector parser reads Colon + Ident as a custom state.
            self.position = save;
            (self.line, self.column) = save_pos;
        }

        LexemeKind::Colon
    }

    /// Consume an identifier, or a `url(...)` / function lexeme when the
    /// identifier is immediately followed by `(`.
    fn consume_ident_like(&mut self) -> LexemeKind {
        let name = self.consume_ident_sequence();

        if self.peek() == Some('(') {
            let _ = self.consume();
            if name.eq_ignore_ascii_case("url") {
                // Quoted url bodies stay a function so the string lexeme
                // keeps its own escapes; bare bodies collapse to a Url.
                self.consume_whitespace();
                if matches!(self.peek(), Some('"' | '\'')) {
                    return LexemeKind::Function(name);
                }
                return self.consume_url_body();
            }
            return LexemeKind::Function(name);
        }

        LexemeKind::Ident(name)
    }

    /// Consume the body of an unquoted `url(...)`, including the `)`.
    fn consume_url_body(&mut self) -> LexemeKind {
        let mut value = String::new();
        loop {
            match self.consume() {
                Some(')') | None => return LexemeKind::Url(value.trim_end().to_string()),
                Some(c) => value.push(c),
            }
        }
    }

    /// Consume an identifier sequence (the first char must already be known
    /// to start one).
    fn consume_ident_sequence(&mut self) -> String {
        let mut result = String::new();
        while let Some(c) = self.peek() {
            if is_ident_char(c) {
                result.push(c);
                let _ = self.consume();
            } else {
                break;
            }
        }
        result
    }

    /// Consume a numeric lexeme: number, percentage, or dimension.
    fn consume_numeric(&mut self) -> LexemeKind {
        let mut repr = String::new();
        let mut is_integer = true;

        if matches!(self.peek(), Some('+' | '-')) {
            repr.push(self.consume().unwrap());
        }
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            repr.push(self.consume().unwrap());
        }
        if self.peek() == Some('.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            is_integer = false;
            repr.push(self.consume().unwrap()); // .
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                repr.push(self.consume().unwrap());
            }
        }

        let value: f64 = repr.parse().unwrap_or(0.0);
        let int_value = if is_integer { repr.parse().ok() } else { None };

        if self.peek() == Some('%') {
            let _ = self.consume();
            return LexemeKind::Percentage(value);
        }
        if self.peek().is_some_and(is_ident_start_char) {
            let unit = self.consume_ident_sequence().to_ascii_lowercase();
            return LexemeKind::Dimension {
                value,
                int_value,
                unit,
            };
        }

        LexemeKind::Number { value, int_value }
    }

    /// Would the next chars start a number? (digit, or sign/dot + digit)
    fn would_start_number(&self) -> bool {
        match self.peek() {
            Some(c) if c.is_ascii_digit() => true,
            Some('.') => self.peek_at(1).is_some_and(|c| c.is_ascii_digit()),
            _ => false,
        }
    }

    /// Lookahead helper for two-char attribute operators.
    fn with_equals(&mut self, with: LexemeKind, without: LexemeKind) -> LexemeKind {
        if self.peek() == Some('=') {
            let _ = self.consume();
            with
        } else {
            without
        }
    }

    /// Consume and return the next character, tracking line/column.
    fn consume(&mut self) -> Option<char> {
        let c = *self.input.get(self.position)?;
        self.before_last = (self.line, self.column);
        self.position += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    /// Put back the last consumed character.
    fn reconsume(&mut self) {
        if self.position > 0 {
            self.position -= 1;
            (self.line, self.column) = self.before_last;
        }
    }

    /// Peek at the next character without consuming it.
    fn peek(&self) -> Option<char> {
        self.peek_at(0)
    }

    /// Peek at a character at an offset from the current position.
    fn peek_at(&self, offset: usize) -> Option<char> {
        self.input.get(self.position + offset).copied()
    }
}

/// A newline, tab, form feed, carriage return, or space.
fn is_whitespace(c: char) -> bool {
    matches!(c, '\n' | '\t' | ' ' | '\r' | '\x0C')
}

/// A letter, a non-ASCII code point, or `_`.
fn is_ident_start_char(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || !c.is_ascii()
}

/// An ident-start char, a digit, or `-`.
fn is_ident_char(c: char) -> bool {
    is_ident_start_char(c) || c.is_ascii_digit() || c == '-'
}

/// 3, 4, 6 or 8 hex digits form a hex color.
fn is_hex_color(name: &str) -> bool {
    matches!(name.len(), 3 | 4 | 6 | 8) && name.chars().all(|c| c.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<LexemeKind> {
        Lexer::new(input).map(|lx| lx.kind).collect()
    }

    #[test]
    fn restartable_sequence() {
        let first: Vec<_> = Lexer::new("a { b: 1px; }").collect();
        let second: Vec<_> = Lexer::new("a { b: 1px; }").collect();
        assert_eq!(first, second);
    }

    #[test]
    fn eof_terminates_iteration() {
        let mut lexer = Lexer::new("");
        assert!(lexer.next().is_some_and(|lx| lx.is_eof()));
        assert!(lexer.next().is_none());
    }

    #[test]
    fn pseudo_keyword_vs_declaration_colon() {
        // `:hover` collapses; `color:red` must stay ident/colon/ident.
        assert_eq!(
            kinds(":hover"),
            vec![
                LexemeKind::PseudoClass("hover".to_string()),
                LexemeKind::Eof
            ]
        );
        assert_eq!(
            kinds("color:red"),
            vec![
                LexemeKind::Ident("color".to_string()),
                LexemeKind::Colon,
                LexemeKind::Ident("red".to_string()),
                LexemeKind::Eof
            ]
        );
    }

    #[test]
    fn error_lexeme_carries_position() {
        let all: Vec<_> = Lexer::new("a ? b").collect();
        let err = all
            .iter()
            .find(|lx| matches!(lx.kind, LexemeKind::Error(_)))
            .expect("error lexeme");
        assert_eq!(err.position.line, 1);
        assert_eq!(err.position.column, 3);
    }

    #[test]
    fn nth_argument_shape() {
        // `2n+1` lexes as a dimension with unit "n" followed by a number.
        let all = kinds("2n+1");
        assert_eq!(
            all,
            vec![
                LexemeKind::Dimension {
                    value: 2.0,
                    int_value: Some(2),
                    unit: "n".to_string()
                },
                LexemeKind::Number {
                    value: 1.0,
                    int_value: Some(1)
                },
                LexemeKind::Eof
            ]
        );
    }
}
