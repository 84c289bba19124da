//! Recursive-descent stylesheet parser.
//!
//! The parser is tolerant by construction: problems become [`ParseError`]s
//! accumulated on the [`Stylesheet`] and parsing skips forward to the next
//! rule or declaration boundary, so every rule that parsed cleanly still
//! applies. Nothing here performs I/O — `@import` resolution goes through
//! the [`ImportLoader`] seam the embedder provides.

use std::collections::HashSet;
use std::str::FromStr;

use crate::declaration::{Declaration, SourceLocation};
use crate::selector::{
    AttributeExpression, AttributeOperator, CombinatorKind, CombinatorSelector,
    PseudoClassFunction, PseudoClassFunctionKind, PseudoClassPredicate, Selector, TypeSelector,
};
use crate::stylesheet::{
    FontFace, Keyframe, KeyframeBlock, MediaExpression, MediaFeatureValue, MediaGroup, Origin,
    ParseError, ParseErrorKind, RuleSet, Stylesheet,
};
use crate::tokenizer::{Lexeme, LexemeKind, Lexer, SourcePosition};

/// Resolves `@import` paths to stylesheet source text.
///
/// Implemented by the embedder's (excluded) file/network layer. The parser
/// only tracks the visited-path set for cycle rejection; with no loader
/// installed every `@import` records a diagnostic and is skipped.
pub trait ImportLoader {
    /// Return the source text for an import path, or `None` if it cannot
    /// be resolved.
    fn load(&self, path: &str) -> Option<String>;
}

/// Recursive-descent parser over the lexeme stream of one source text.
pub struct Parser<'loader> {
    lexemes: Vec<Lexeme>,
    position: usize,
    loader: Option<&'loader dyn ImportLoader>,
    visited: HashSet<String>,
    file: Option<String>,
}

impl Stylesheet {
    /// Parse a stylesheet from source text with the given origin.
    ///
    /// This is the `loadStylesheet` operation: one call, one immutable
    /// stylesheet. Lex/parse problems are accumulated on the result, never
    /// raised.
    #[must_use]
    pub fn parse(source: &str, origin: Origin) -> Self {
        let mut sheet = Self::new(origin);
        Parser::new(source).run(&mut sheet);
        sheet
    }

    /// Parse a stylesheet whose `@import`s are resolved through `loader`.
    /// `path` names the source for diagnostics and cycle detection.
    #[must_use]
    pub fn parse_with_loader(
        source: &str,
        origin: Origin,
        loader: &dyn ImportLoader,
        path: &str,
    ) -> Self {
        let mut sheet = Self::new(origin);
        sheet.set_source_path(path);
        let mut visited = HashSet::new();
        let _ = visited.insert(path.to_string());
        Parser::with_context(source, Some(loader), visited, Some(path.to_string()))
            .run(&mut sheet);
        sheet
    }

    /// Parse a bare declaration list (no selector) as a view-origin
    /// stylesheet whose single rule set matches every node. This is how
    /// per-node inline styles enter the cascade.
    #[must_use]
    pub fn parse_inline(css: &str) -> Self {
        let mut sheet = Self::new(Origin::View);
        let mut parser = Parser::new(css);
        let declarations = parser.parse_declaration_list(&mut sheet);
        let index = sheet.allocate_index();
        sheet.add_rule_set(RuleSet::new(
            vec![Selector::Type(TypeSelector::universal())],
            declarations,
            Origin::View,
            index,
        ));
        sheet
    }
}

/// Parse a bare selector string, independent of any stylesheet. Used for
/// ad hoc querying.
///
/// # Errors
/// Returns the first [`ParseError`] when the source is not a single valid
/// selector.
pub fn parse_selector(source: &str) -> Result<Selector, ParseError> {
    let mut parser = Parser::new(source);
    let _ = parser.skip_whitespace();
    let selector = parser.parse_selector_chain(None)?;
    let _ = parser.skip_whitespace();
    if parser.peek_kind() == &LexemeKind::Eof {
        Ok(selector)
    } else {
        Err(parser.error_here(ParseErrorKind::InvalidSelector(source.trim().to_string())))
    }
}

impl<'loader> Parser<'loader> {
    /// Create a parser over `source` with no import loader.
    #[must_use]
    pub fn new(source: &str) -> Self {
        Self::with_context(source, None, HashSet::new(), None)
    }

    /// Create a parser with an import loader, a visited-path set, and a
    /// source name for diagnostics.
    #[must_use]
    pub fn with_context(
        source: &str,
        loader: Option<&'loader dyn ImportLoader>,
        visited: HashSet<String>,
        file: Option<String>,
    ) -> Self {
        Self {
            lexemes: Lexer::new(source).collect(),
            position: 0,
            loader,
            visited,
            file,
        }
    }

    /// Parse the whole source into `sheet`, consuming the parser.
    pub fn run(mut self, sheet: &mut Stylesheet) {
        self.run_loop(sheet);
    }

    // ------------------------------------------------------------------
    // Rule sets
    // ------------------------------------------------------------------

    /// Parse `selector-list '{' declaration* '}'`. On a selector error the
    /// whole rule is skipped (including its block) and `None` is returned.
    fn parse_rule_set(&mut self, sheet: &mut Stylesheet) -> Option<RuleSet> {
        let selectors = match self.parse_selector_group(sheet) {
            Ok(selectors) => selectors,
            Err(error) => {
                sheet.record_error(error);
                self.recover_to_rule_boundary();
                return None;
            }
        };

        let _ = self.skip_whitespace();
        if self.peek_kind() != &LexemeKind::LBrace {
            sheet.record_error(
                self.error_here(ParseErrorKind::UnexpectedToken(format!(
                    "{} (expected '{{')",
                    self.peek()
                ))),
            );
            self.recover_to_rule_boundary();
            return None;
        }
        self.advance(); // {

        let declarations = self.parse_declaration_list(sheet);

        if self.peek_kind() == &LexemeKind::RBrace {
            self.advance();
        } else {
            sheet.record_error(self.error_here(ParseErrorKind::Unterminated("rule set")));
        }

        let index = sheet.allocate_index();
        Some(RuleSet::new(selectors, declarations, sheet.origin(), index))
    }

    /// Parse a comma-separated selector list.
    fn parse_selector_group(
        &mut self,
        sheet: &Stylesheet,
    ) -> Result<Vec<Selector>, ParseError> {
        let mut selectors = Vec::new();
        loop {
            let _ = self.skip_whitespace();
            selectors.push(self.parse_selector_chain(Some(sheet))?);
            let _ = self.skip_whitespace();
            if self.peek_kind() == &LexemeKind::Comma {
                self.advance();
            } else {
                return Ok(selectors);
            }
        }
    }

    /// Parse one complex selector: compounds joined by combinators.
    /// Whitespace between compounds is the descendant combinator.
    fn parse_selector_chain(
        &mut self,
        sheet: Option<&Stylesheet>,
    ) -> Result<Selector, ParseError> {
        let mut current = Selector::Type(self.parse_compound(sheet)?);

        loop {
            let saw_whitespace = self.skip_whitespace();
            let kind = match self.peek_kind() {
                LexemeKind::Greater => Some(CombinatorKind::Child),
                LexemeKind::Plus => Some(CombinatorKind::AdjacentSibling),
                LexemeKind::Tilde => Some(CombinatorKind::GeneralSibling),
                other if saw_whitespace && starts_compound(other) => {
                    Some(CombinatorKind::Descendant)
                }
                _ => break,
            };
            let Some(kind) = kind else { break };

            if kind != CombinatorKind::Descendant {
                self.advance();
                let _ = self.skip_whitespace();
            }
            let right = Selector::Type(self.parse_compound(sheet)?);
            current = Selector::Combinator(CombinatorSelector {
                kind,
                left: Box::new(current),
                right: Box::new(right),
            });
        }

        Ok(current)
    }

    /// Parse one compound: `[ns|]type-or-universal` followed by id, class,
    /// attribute, pseudo-class and pseudo-element attachments.
    fn parse_compound(&mut self, sheet: Option<&Stylesheet>) -> Result<TypeSelector, ParseError> {
        let mut compound = TypeSelector::universal();
        let mut matched = false;

        // Namespaced or plain type head.
        match self.peek_kind().clone() {
            LexemeKind::Ident(name) => {
                self.advance();
                matched = true;
                if self.peek_kind() == &LexemeKind::Pipe {
                    self.advance();
                    compound.namespace = Some(resolve_namespace(sheet, &name));
                    self.parse_type_tail(&mut compound)?;
                } else {
                    compound.name = Some(name);
                }
            }
            LexemeKind::Star => {
                self.advance();
                matched = true;
                if self.peek_kind() == &LexemeKind::Pipe {
                    self.advance();
                    compound.universal_namespace = true;
                    self.parse_type_tail(&mut compound)?;
                }
            }
            LexemeKind::Pipe => {
                // Explicit no-namespace form `|type`.
                self.advance();
                matched = true;
                self.parse_type_tail(&mut compound)?;
            }
            _ => {}
        }

        // Attachments.
        loop {
            match self.peek_kind().clone() {
                LexemeKind::Hash(id) | LexemeKind::HexColor(id) => {
                    self.advance();
                    compound.style_id = Some(id);
                }
                LexemeKind::Class(class) => {
                    self.advance();
                    compound.style_classes.push(class);
                }
                LexemeKind::LBracket => {
                    self.advance();
                    compound
                        .expressions
                        .push(Selector::Attribute(self.parse_attribute()?));
                }
                LexemeKind::PseudoClass(name) => {
                    self.advance();
                    match PseudoClassPredicate::from_str(&name) {
                        Ok(predicate) => compound
                            .expressions
                            .push(Selector::PseudoClassPredicate(predicate)),
                        // Interaction states (`:hover`, `:checked`, …)
                        // qualify the compound instead of matching
                        // structurally.
                        Err(_) => compound.state = Some(name),
                    }
                }
                LexemeKind::PseudoFunction(name) => {
                    self.advance();
                    let expression = if name == "not" {
                        self.parse_not(sheet)?
                    } else {
                        self.parse_nth(&name)?
                    };
                    compound.expressions.push(expression);
                }
                LexemeKind::Colon => {
                    // `:custom-state` for states the lexer does not know.
                    self.advance();
                    match self.peek_kind().clone() {
                        LexemeKind::Ident(name) => {
                            self.advance();
                            compound.state = Some(name);
                        }
                        _ => {
                            return Err(self.error_here(ParseErrorKind::UnexpectedToken(
                                format!("{} (expected pseudo-class name)", self.peek()),
                            )));
                        }
                    }
                }
                LexemeKind::PseudoElement(name) => {
                    self.advance();
                    compound.pseudo_element = Some(name);
                }
                _ => break,
            }
            matched = true;
        }

        if matched {
            Ok(compound)
        } else {
            Err(self.error_here(ParseErrorKind::UnexpectedToken(format!(
                "{} (expected selector)",
                self.peek()
            ))))
        }
    }

    /// The element-type part after a namespace pipe.
    fn parse_type_tail(&mut self, compound: &mut TypeSelector) -> Result<(), ParseError> {
        match self.peek_kind().clone() {
            LexemeKind::Ident(name) => {
                self.advance();
                compound.name = Some(name);
                Ok(())
            }
            LexemeKind::Star => {
                self.advance();
                Ok(())
            }
            _ => Err(self.error_here(ParseErrorKind::UnexpectedToken(format!(
                "{} (expected type after namespace)",
                self.peek()
            )))),
        }
    }

    /// Parse `[name]` / `[name op value]` after the opening bracket.
    fn parse_attribute(&mut self) -> Result<AttributeExpression, ParseError> {
        let _ = self.skip_whitespace();
        let name = match self.peek_kind().clone() {
            LexemeKind::Ident(name) => {
                self.advance();
                name
            }
            _ => {
                return Err(self.error_here(ParseErrorKind::UnexpectedToken(format!(
                    "{} (expected attribute name)",
                    self.peek()
                ))));
            }
        };

        let _ = self.skip_whitespace();
        let operator = match self.peek_kind() {
            LexemeKind::RBracket => {
                self.advance();
                return Ok(AttributeExpression {
                    name,
                    operator: AttributeOperator::Exists,
                    value: None,
                });
            }
            LexemeKind::Equal => AttributeOperator::Equals,
            LexemeKind::ListContains => AttributeOperator::ListContains,
            LexemeKind::DashMatch => AttributeOperator::DashMatch,
            LexemeKind::StartsWith => AttributeOperator::StartsWith,
            LexemeKind::EndsWith => AttributeOperator::EndsWith,
            LexemeKind::Contains => AttributeOperator::Contains,
            _ => {
                return Err(self.error_here(ParseErrorKind::UnexpectedToken(format!(
                    "{} (expected attribute operator)",
                    self.peek()
                ))));
            }
        };
        self.advance();

        let _ = self.skip_whitespace();
        let value = match self.peek_kind().clone() {
            LexemeKind::QuotedString(value) | LexemeKind::Ident(value) => {
                self.advance();
                value
            }
            _ => {
                return Err(self.error_here(ParseErrorKind::UnexpectedToken(format!(
                    "{} (expected attribute value)",
                    self.peek()
                ))));
            }
        };

        let _ = self.skip_whitespace();
        if self.peek_kind() == &LexemeKind::RBracket {
            self.advance();
            Ok(AttributeExpression {
                name,
                operator,
                value: Some(value),
            })
        } else {
            Err(self.error_here(ParseErrorKind::Unterminated("attribute selector")))
        }
    }

    /// Parse the inner selector of `:not(...)`.
    fn parse_not(&mut self, sheet: Option<&Stylesheet>) -> Result<Selector, ParseError> {
        let _ = self.skip_whitespace();
        let inner = self.parse_compound(sheet)?;
        let _ = self.skip_whitespace();
        if self.peek_kind() == &LexemeKind::RParen {
            self.advance();
            Ok(Selector::Not(Box::new(Selector::Type(inner))))
        } else {
            Err(self.error_here(ParseErrorKind::Unterminated(":not()")))
        }
    }

    /// Parse the `an+b` argument of an `nth-*` pseudo-class.
    fn parse_nth(&mut self, name: &str) -> Result<Selector, ParseError> {
        let kind = PseudoClassFunctionKind::from_str(name).map_err(|_| {
            self.error_here(ParseErrorKind::UnexpectedToken(format!(
                "unknown pseudo-class function '{name}'"
            )))
        })?;

        let _ = self.skip_whitespace();
        let (modulus, mut remainder, expects_tail) = match self.peek_kind().clone() {
            LexemeKind::Ident(word) if word.eq_ignore_ascii_case("odd") => {
                self.advance();
                (2, 1, false)
            }
            LexemeKind::Ident(word) if word.eq_ignore_ascii_case("even") => {
                self.advance();
                (2, 0, false)
            }
            LexemeKind::Number { int_value, .. } => {
                self.advance();
                (0, int_value.unwrap_or(0), false)
            }
            // `2n`, `2n+1` (the `+1` lexes as a separate signed number),
            // and the fused `2n-1` (unit "n-1").
            LexemeKind::Dimension { int_value, unit, .. }
                if unit.starts_with('n') || unit.starts_with('N') =>
            {
                self.advance();
                let modulus = int_value.unwrap_or(0);
                match parse_n_suffix(&unit[1..]) {
                    Some(fused) => (modulus, fused, false),
                    None => (modulus, 0, true),
                }
            }
            // `n`, `-n`, `n-3`.
            LexemeKind::Ident(word) if is_n_word(&word) => {
                self.advance();
                let (modulus, suffix) = split_n_word(&word);
                match suffix {
                    Some(fused) => (modulus, fused, false),
                    None => (modulus, 0, true),
                }
            }
            _ => {
                return Err(self.error_here(ParseErrorKind::UnexpectedToken(format!(
                    "{} (expected nth expression)",
                    self.peek()
                ))));
            }
        };

        if expects_tail {
            let _ = self.skip_whitespace();
            match self.peek_kind().clone() {
                LexemeKind::Number { int_value, .. } => {
                    self.advance();
                    remainder = int_value.unwrap_or(0);
                }
                LexemeKind::Plus => {
                    self.advance();
                    let _ = self.skip_whitespace();
                    remainder = self.expect_integer()?;
                }
                LexemeKind::Delim('-') => {
                    self.advance();
                    let _ = self.skip_whitespace();
                    remainder = -self.expect_integer()?;
                }
                _ => {}
            }
        }

        let _ = self.skip_whitespace();
        if self.peek_kind() == &LexemeKind::RParen {
            self.advance();
            Ok(Selector::PseudoClassFunction(PseudoClassFunction {
                kind,
                modulus,
                remainder,
            }))
        } else {
            Err(self.error_here(ParseErrorKind::Unterminated("nth expression")))
        }
    }

    /// Consume an unsigned integer lexeme.
    fn expect_integer(&mut self) -> Result<i64, ParseError> {
        match self.peek_kind().clone() {
            LexemeKind::Number { int_value, .. } => {
                self.advance();
                Ok(int_value.unwrap_or(0))
            }
            _ => Err(self.error_here(ParseErrorKind::UnexpectedToken(format!(
                "{} (expected integer)",
                self.peek()
            )))),
        }
    }

    // ------------------------------------------------------------------
    // Declarations
    // ------------------------------------------------------------------

    /// Parse declarations until `}` or end of input. Bad declarations are
    /// recorded and skipped to the next `;`/`}` boundary.
    pub(crate) fn parse_declaration_list(&mut self, sheet: &mut Stylesheet) -> Vec<Declaration> {
        let mut declarations = Vec::new();
        loop {
            let _ = self.skip_whitespace();
            match self.peek_kind().clone() {
                LexemeKind::Semicolon => self.advance(),
                LexemeKind::Eof | LexemeKind::RBrace => return declarations,
                LexemeKind::Ident(name) => {
                    let position = self.peek().position;
                    self.advance();
                    match self.parse_declaration_body(name, position) {
                        Ok(declaration) => declarations.push(declaration),
                        Err(error) => {
                            sheet.record_error(error);
                            self.recover_to_declaration_boundary();
                        }
                    }
                }
                LexemeKind::Error(c) => {
                    sheet.record_error(self.error_here(ParseErrorKind::UnrecognizedCharacter(c)));
                    self.advance();
                }
                _ => {
                    sheet.record_error(self.error_here(ParseErrorKind::UnexpectedToken(format!(
                        "{} (expected property name)",
                        self.peek()
                    ))));
                    self.recover_to_declaration_boundary();
                }
            }
        }
    }

    /// Parse `: value [!important]` after the property name. The value is
    /// kept as its raw lexeme run; only `!important` is recognized here.
    fn parse_declaration_body(
        &mut self,
        name: String,
        position: SourcePosition,
    ) -> Result<Declaration, ParseError> {
        let _ = self.skip_whitespace();

        // `state: hover` — the lexer fuses `:` + known pseudo keyword, so a
        // pseudo-class lexeme right after a property name is really the
        // colon plus the first value word.
        let mut value: Vec<Lexeme> = Vec::new();
        match self.peek_kind().clone() {
            LexemeKind::Colon => self.advance(),
            LexemeKind::PseudoClass(word) => {
                let lexeme = self.peek().clone();
                self.advance();
                value.push(Lexeme {
                    kind: LexemeKind::Ident(word),
                    text: lexeme.text.trim_start_matches(':').to_string(),
                    position: lexeme.position,
                });
            }
            _ => {
                return Err(self.error_here(ParseErrorKind::UnexpectedToken(format!(
                    "{} (expected ':' after '{name}')",
                    self.peek()
                ))));
            }
        }

        loop {
            match self.peek_kind() {
                LexemeKind::Semicolon | LexemeKind::RBrace | LexemeKind::Eof => break,
                LexemeKind::Error(c) => {
                    let error = self.error_here(ParseErrorKind::UnrecognizedCharacter(*c));
                    self.advance();
                    return Err(error);
                }
                _ => {
                    value.push(self.peek().clone());
                    self.advance();
                }
            }
        }
        if self.peek_kind() == &LexemeKind::Semicolon {
            self.advance();
        }

        trim_whitespace(&mut value);
        let important = take_important(&mut value);

        let mut declaration = Declaration::new(name, value, important);
        declaration.set_location(SourceLocation {
            file: self.file.clone(),
            line: position.line,
        });
        Ok(declaration)
    }

    // ------------------------------------------------------------------
    // At-rules
    // ------------------------------------------------------------------

    /// Dispatch an at-rule; the `@keyword` lexeme is already consumed.
    fn parse_at_rule(&mut self, name: &str, sheet: &mut Stylesheet) {
        match name.to_ascii_lowercase().as_str() {
            "namespace" => self.parse_namespace(sheet),
            "import" => self.parse_import(sheet),
            "media" => self.parse_media(sheet),
            "font-face" => self.parse_font_face(sheet),
            "keyframes" => self.parse_keyframes(sheet),
            other => {
                sheet.record_error(self.error_here(ParseErrorKind::UnexpectedToken(format!(
                    "unsupported at-rule '@{other}'"
                ))));
                self.recover_to_rule_boundary();
            }
        }
    }

    /// `@namespace [prefix] "uri";`
    fn parse_namespace(&mut self, sheet: &mut Stylesheet) {
        let _ = self.skip_whitespace();
        let prefix = match self.peek_kind().clone() {
            LexemeKind::Ident(prefix) => {
                self.advance();
                let _ = self.skip_whitespace();
                prefix
            }
            _ => String::new(),
        };
        match self.peek_kind().clone() {
            LexemeKind::QuotedString(uri) | LexemeKind::Url(uri) => {
                self.advance();
                sheet.set_namespace(prefix, uri);
                let _ = self.skip_whitespace();
                if self.peek_kind() == &LexemeKind::Semicolon {
                    self.advance();
                }
            }
            _ => {
                sheet.record_error(self.error_here(ParseErrorKind::UnexpectedToken(format!(
                    "{} (expected namespace URI)",
                    self.peek()
                ))));
                self.recover_to_rule_boundary();
            }
        }
    }

    /// `@import "path";` — resolved through the loader, with the visited
    /// set rejecting cycles. A cycle or an unresolvable path skips only the
    /// offending import.
    fn parse_import(&mut self, sheet: &mut Stylesheet) {
        let _ = self.skip_whitespace();
        let path = match self.peek_kind().clone() {
            LexemeKind::QuotedString(path) | LexemeKind::Url(path) => {
                self.advance();
                path
            }
            _ => {
                sheet.record_error(self.error_here(ParseErrorKind::UnexpectedToken(format!(
                    "{} (expected import path)",
                    self.peek()
                ))));
                self.recover_to_rule_boundary();
                return;
            }
        };
        let _ = self.skip_whitespace();
        if self.peek_kind() == &LexemeKind::Semicolon {
            self.advance();
        }

        if self.visited.contains(&path) {
            sheet.record_error(self.error_here(ParseErrorKind::ImportCycle(path)));
            return;
        }

        let Some(loader) = self.loader else {
            sheet.record_error(self.error_here(ParseErrorKind::UnresolvedImport(path)));
            return;
        };
        let Some(source) = loader.load(&path) else {
            sheet.record_error(self.error_here(ParseErrorKind::UnresolvedImport(path)));
            return;
        };

        let _ = self.visited.insert(path.clone());
        let visited = std::mem::take(&mut self.visited);
        let sub_parser =
            Parser::with_context(&source, Some(loader), visited, Some(path));
        // The imported rules land on this same stylesheet, keeping one
        // global source order. The visited set comes back so sibling
        // imports still see the whole path.
        self.visited = sub_parser.run_nested(sheet);
    }

    /// Like [`Parser::run`], but returns the visited set for the caller to
    /// reclaim once the nested source is done.
    fn run_nested(mut self, sheet: &mut Stylesheet) -> HashSet<String> {
        self.run_loop(sheet);
        self.visited
    }

    /// The main parse loop, shared by [`Parser::run`] and nested imports.
    fn run_loop(&mut self, sheet: &mut Stylesheet) {
        loop {
            let _ = self.skip_whitespace();
            match self.peek_kind().clone() {
                LexemeKind::Eof => break,
                LexemeKind::AtKeyword(name) => {
                    self.advance();
                    self.parse_at_rule(&name, sheet);
                }
                LexemeKind::Error(c) => {
                    sheet.record_error(self.error_here(ParseErrorKind::UnrecognizedCharacter(c)));
                    self.advance();
                }
                LexemeKind::RBrace => {
                    sheet.record_error(
                        self.error_here(ParseErrorKind::UnexpectedToken("'}'".to_string())),
                    );
                    self.advance();
                }
                _ => {
                    if let Some(rule_set) = self.parse_rule_set(sheet) {
                        sheet.add_rule_set(rule_set);
                    }
                }
            }
        }
    }

    /// `@media <query> { rule-set* }`
    fn parse_media(&mut self, sheet: &mut Stylesheet) {
        let query = match self.parse_media_query() {
            Ok(query) => query,
            Err(error) => {
                sheet.record_error(error);
                self.recover_to_rule_boundary();
                return;
            }
        };

        let _ = self.skip_whitespace();
        if self.peek_kind() != &LexemeKind::LBrace {
            sheet.record_error(self.error_here(ParseErrorKind::UnexpectedToken(format!(
                "{} (expected '{{' after media query)",
                self.peek()
            ))));
            self.recover_to_rule_boundary();
            return;
        }
        self.advance();

        let mut group = MediaGroup::new(query, sheet.origin());
        loop {
            let _ = self.skip_whitespace();
            match self.peek_kind() {
                LexemeKind::RBrace => {
                    self.advance();
                    break;
                }
                LexemeKind::Eof => {
                    sheet.record_error(self.error_here(ParseErrorKind::Unterminated("@media block")));
                    break;
                }
                _ => {
                    if let Some(rule_set) = self.parse_rule_set(sheet) {
                        group.add_rule_set(rule_set);
                    }
                }
            }
        }
        sheet.add_media_group(group);
    }

    /// Parse a media query list: comma = any-of, `and` = all-of.
    fn parse_media_query(&mut self) -> Result<MediaExpression, ParseError> {
        let mut branches = Vec::new();
        loop {
            branches.push(self.parse_media_branch()?);
            let _ = self.skip_whitespace();
            if self.peek_kind() == &LexemeKind::Comma {
                self.advance();
            } else {
                break;
            }
        }
        if branches.len() == 1 {
            Ok(branches.pop().expect("one branch"))
        } else {
            Ok(MediaExpression::AnyOf(branches))
        }
    }

    /// One comma-free media query branch.
    fn parse_media_branch(&mut self) -> Result<MediaExpression, ParseError> {
        let mut terms = Vec::new();
        loop {
            let _ = self.skip_whitespace();
            match self.peek_kind().clone() {
                LexemeKind::Ident(word) if word.eq_ignore_ascii_case("and") => {
                    self.advance();
                }
                LexemeKind::Ident(word) => {
                    self.advance();
                    terms.push(MediaExpression::MediaType(word.to_ascii_lowercase()));
                }
                LexemeKind::LParen => {
                    self.advance();
                    terms.push(self.parse_media_feature()?);
                }
                _ => break,
            }
        }
        if terms.is_empty() {
            return Err(self.error_here(ParseErrorKind::UnexpectedToken(format!(
                "{} (expected media query)",
                self.peek()
            ))));
        }
        if terms.len() == 1 {
            Ok(terms.pop().expect("one term"))
        } else {
            Ok(MediaExpression::AllOf(terms))
        }
    }

    /// `(feature)` or `(feature: value)` after the opening paren.
    fn parse_media_feature(&mut self) -> Result<MediaExpression, ParseError> {
        let _ = self.skip_whitespace();
        let name = match self.peek_kind().clone() {
            LexemeKind::Ident(name) => {
                self.advance();
                name.to_ascii_lowercase()
            }
            _ => {
                return Err(self.error_here(ParseErrorKind::UnexpectedToken(format!(
                    "{} (expected media feature name)",
                    self.peek()
                ))));
            }
        };

        let _ = self.skip_whitespace();
        let value = if self.peek_kind() == &LexemeKind::Colon {
            self.advance();
            let _ = self.skip_whitespace();
            let lexeme = self.peek().clone();
            let value = match &lexeme.kind {
                LexemeKind::Number { value, .. } => MediaFeatureValue::Number(*value),
                LexemeKind::Dimension { value, .. } => match lexeme.unit() {
                    Some(unit) if unit.is_length() => MediaFeatureValue::Length(
                        crate::values::Dimension {
                            value: *value,
                            unit,
                        }
                        .to_px(),
                    ),
                    _ => MediaFeatureValue::Number(*value),
                },
                LexemeKind::Ident(word) => MediaFeatureValue::Ident(word.to_ascii_lowercase()),
                _ => {
                    return Err(self.error_here(ParseErrorKind::UnexpectedToken(format!(
                        "{} (expected media feature value)",
                        self.peek()
                    ))));
                }
            };
            self.advance();
            Some(value)
        } else {
            None
        };

        let _ = self.skip_whitespace();
        if self.peek_kind() == &LexemeKind::RParen {
            self.advance();
            Ok(MediaExpression::Feature { name, value })
        } else {
            Err(self.error_here(ParseErrorKind::Unterminated("media feature")))
        }
    }

    /// `@font-face { declaration* }`
    fn parse_font_face(&mut self, sheet: &mut Stylesheet) {
        let _ = self.skip_whitespace();
        if self.peek_kind() != &LexemeKind::LBrace {
            sheet.record_error(self.error_here(ParseErrorKind::UnexpectedToken(format!(
                "{} (expected '{{' after @font-face)",
                self.peek()
            ))));
            self.recover_to_rule_boundary();
            return;
        }
        self.advance();
        let declarations = self.parse_declaration_list(sheet);
        if self.peek_kind() == &LexemeKind::RBrace {
            self.advance();
        } else {
            sheet.record_error(self.error_here(ParseErrorKind::Unterminated("@font-face block")));
        }
        sheet.add_font_face(FontFace { declarations });
    }

    /// `@keyframes <name> { (<percentage>|from|to)+ { declaration* } * }`
    fn parse_keyframes(&mut self, sheet: &mut Stylesheet) {
        let _ = self.skip_whitespace();
        let name = match self.peek_kind().clone() {
            LexemeKind::Ident(name) | LexemeKind::QuotedString(name) => {
                self.advance();
                name
            }
            _ => {
                sheet.record_error(self.error_here(ParseErrorKind::UnexpectedToken(format!(
                    "{} (expected keyframes name)",
                    self.peek()
                ))));
                self.recover_to_rule_boundary();
                return;
            }
        };

        let _ = self.skip_whitespace();
        if self.peek_kind() != &LexemeKind::LBrace {
            sheet.record_error(self.error_here(ParseErrorKind::UnexpectedToken(format!(
                "{} (expected '{{' after @keyframes name)",
                self.peek()
            ))));
            self.recover_to_rule_boundary();
            return;
        }
        self.advance();

        let mut keyframe = Keyframe::new(name);
        loop {
            let _ = self.skip_whitespace();
            match self.peek_kind() {
                LexemeKind::RBrace => {
                    self.advance();
                    break;
                }
                LexemeKind::Eof => {
                    sheet.record_error(
                        self.error_here(ParseErrorKind::Unterminated("@keyframes block")),
                    );
                    break;
                }
                _ => match self.parse_keyframe_block(sheet) {
                    Some(block) => keyframe.add_block(block),
                    None => self.recover_to_rule_boundary(),
                },
            }
        }
        sheet.add_keyframe(keyframe);
    }

    /// One keyframe block: comma-separated offsets and a declaration block.
    fn parse_keyframe_block(&mut self, sheet: &mut Stylesheet) -> Option<KeyframeBlock> {
        let mut offsets = Vec::new();
        loop {
            let _ = self.skip_whitespace();
            match self.peek_kind().clone() {
                LexemeKind::Percentage(pct) => {
                    self.advance();
                    offsets.push((pct / 100.0).clamp(0.0, 1.0));
                }
                LexemeKind::Ident(word) if word.eq_ignore_ascii_case("from") => {
                    self.advance();
                    offsets.push(0.0);
                }
                LexemeKind::Ident(word) if word.eq_ignore_ascii_case("to") => {
                    self.advance();
                    offsets.push(1.0);
                }
                LexemeKind::Comma => self.advance(),
                LexemeKind::LBrace => break,
                _ => {
                    sheet.record_error(self.error_here(ParseErrorKind::UnexpectedToken(format!(
                        "{} (expected keyframe offset)",
                        self.peek()
                    ))));
                    return None;
                }
            }
        }

        if offsets.is_empty() {
            sheet.record_error(
                self.error_here(ParseErrorKind::UnexpectedToken("empty keyframe offset list".to_string())),
            );
            return None;
        }

        self.advance(); // {
        let declarations = self.parse_declaration_list(sheet);
        if self.peek_kind() == &LexemeKind::RBrace {
            self.advance();
        } else {
            sheet.record_error(self.error_here(ParseErrorKind::Unterminated("keyframe block")));
        }

        Some(KeyframeBlock {
            offsets,
            declarations,
        })
    }

    // ------------------------------------------------------------------
    // Cursor and recovery helpers
    // ------------------------------------------------------------------

    /// Skip whitespace lexemes; true if any were skipped. (Whitespace is
    /// significant only between selector compounds, where the chain parser
    /// looks at the return value.)
    fn skip_whitespace(&mut self) -> bool {
        let mut skipped = false;
        while self.peek().is_whitespace() {
            self.advance();
            skipped = true;
        }
        skipped
    }

    /// Skip forward past the next rule boundary: a `;` at top level or the
    /// end of the current block, whichever comes first.
    fn recover_to_rule_boundary(&mut self) {
        let mut depth: u32 = 0;
        loop {
            match self.peek_kind() {
                LexemeKind::Eof => return,
                LexemeKind::Semicolon if depth == 0 => {
                    self.advance();
                    return;
                }
                LexemeKind::LBrace => {
                    depth += 1;
                    self.advance();
                }
                LexemeKind::RBrace => {
                    self.advance();
                    if depth <= 1 {
                        return;
                    }
                    depth -= 1;
                }
                _ => self.advance(),
            }
        }
    }

    /// Skip to the next `;` (consumed) or `}` (left for the block closer).
    fn recover_to_declaration_boundary(&mut self) {
        loop {
            match self.peek_kind() {
                LexemeKind::Eof | LexemeKind::RBrace => return,
                LexemeKind::Semicolon => {
                    self.advance();
                    return;
                }
                _ => self.advance(),
            }
        }
    }

    /// The current lexeme (EOF once exhausted).
    fn peek(&self) -> &Lexeme {
        self.lexemes
            .get(self.position)
            .unwrap_or_else(|| self.lexemes.last().expect("lexer always emits EOF"))
    }

    /// The current lexeme's kind.
    fn peek_kind(&self) -> &LexemeKind {
        &self.peek().kind
    }

    /// Move past the current lexeme (never past EOF).
    fn advance(&mut self) {
        if self.position + 1 < self.lexemes.len() {
            self.position += 1;
        }
    }

    /// Build a [`ParseError`] at the current lexeme.
    fn error_here(&self, kind: ParseErrorKind) -> ParseError {
        ParseError {
            kind,
            position: self.peek().position,
            file: self.file.clone(),
        }
    }
}

/// Can this lexeme start a selector compound?
fn starts_compound(kind: &LexemeKind) -> bool {
    matches!(
        kind,
        LexemeKind::Ident(_)
            | LexemeKind::Star
            | LexemeKind::Pipe
            | LexemeKind::Hash(_)
            | LexemeKind::HexColor(_)
            | LexemeKind::Class(_)
            | LexemeKind::LBracket
            | LexemeKind::Colon
            | LexemeKind::PseudoClass(_)
            | LexemeKind::PseudoFunction(_)
            | LexemeKind::PseudoElement(_)
    )
}

/// Resolve a namespace prefix against the stylesheet's declarations,
/// falling back to the raw prefix when unknown (ad hoc selector parsing
/// has no stylesheet to resolve against).
fn resolve_namespace(sheet: Option<&Stylesheet>, prefix: &str) -> String {
    sheet
        .and_then(|s| s.namespace_for_prefix(prefix))
        .unwrap_or(prefix)
        .to_string()
}

/// `n`, `-n`, `n-3`, `-n-2`… (already known to start with `n`/`-n`).
fn is_n_word(word: &str) -> bool {
    let body = word.strip_prefix('-').unwrap_or(word);
    let Some(rest) = body.strip_prefix(['n', 'N']) else {
        return false;
    };
    rest.is_empty() || parse_n_suffix(rest).is_some()
}

/// Split an n-word into (modulus, fused remainder).
fn split_n_word(word: &str) -> (i64, Option<i64>) {
    let (modulus, body) = match word.strip_prefix('-') {
        Some(body) => (-1, body),
        None => (1, word),
    };
    let rest = body.strip_prefix(['n', 'N']).unwrap_or("");
    (modulus, parse_n_suffix(rest))
}

/// Parse the `-3` of a fused `n-3` suffix.
fn parse_n_suffix(suffix: &str) -> Option<i64> {
    if suffix.is_empty() {
        return None;
    }
    suffix.parse().ok()
}

/// Drop leading and trailing whitespace lexemes of a declaration value.
fn trim_whitespace(value: &mut Vec<Lexeme>) {
    while value.first().is_some_and(Lexeme::is_whitespace) {
        let _ = value.remove(0);
    }
    while value.last().is_some_and(Lexeme::is_whitespace) {
        let _ = value.pop();
    }
}

/// Detect and strip a trailing `!important`, returning whether it was
/// present.
fn take_important(value: &mut Vec<Lexeme>) -> bool {
    // Walk backwards over: whitespace, "important", whitespace, '!'.
    let mut cursor = value.len();
    while cursor > 0 && value[cursor - 1].is_whitespace() {
        cursor -= 1;
    }
    if cursor == 0 {
        return false;
    }
    match &value[cursor - 1].kind {
        LexemeKind::Ident(word) if word.eq_ignore_ascii_case("important") => cursor -= 1,
        _ => return false,
    }
    while cursor > 0 && value[cursor - 1].is_whitespace() {
        cursor -= 1;
    }
    if cursor == 0 || !matches!(value[cursor - 1].kind, LexemeKind::Delim('!')) {
        return false;
    }
    value.truncate(cursor - 1);
    trim_whitespace(value);
    true
}
