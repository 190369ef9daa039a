//! YANG statement parser.
//!
//! Parses tokenized YANG source into a statement tree: the concrete syntax
//! of YANG is uniformly `keyword [argument] (";" | "{" substatements "}")`,
//! so the tree is generic. The tree-walk listener gives the statements their
//! meaning.
//!
//! Argument strings are fully assembled here: escape decoding and
//! continuation-line indentation stripping for double-quoted strings,
//! verbatim content for single-quoted strings, and `+` concatenation.

mod keyword;

pub use keyword::{lookup_keyword, StmtKind};

use crate::lexer::{Diagnostic, Lexer, LineIndex, Severity, Span, Token, TokenKind};

/// A statement keyword: either a YANG statement or a `prefix:name` extension.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Keyword {
    /// A YANG statement keyword.
    Std(StmtKind),
    /// An extension statement, carried verbatim.
    Extension {
        /// The extension's prefix as written.
        prefix: String,
        /// The extension's local name.
        name: String,
    },
}

impl Keyword {
    /// The keyword text for diagnostics.
    #[must_use]
    pub fn text(&self) -> String {
        match self {
            Self::Std(kind) => kind.text().to_string(),
            Self::Extension { prefix, name } => format!("{prefix}:{name}"),
        }
    }
}

/// An assembled argument string with its source span.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Arg {
    /// The assembled value (quotes stripped, escapes decoded).
    pub value: String,
    /// Span of the raw argument in source.
    pub span: Span,
}

/// A node in the statement tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Statement {
    /// Statement keyword.
    pub keyword: Keyword,
    /// Span of the keyword.
    pub keyword_span: Span,
    /// Optional argument.
    pub arg: Option<Arg>,
    /// Substatements, in source order.
    pub substatements: Vec<Statement>,
    /// Span of the whole statement.
    pub span: Span,
}

impl Statement {
    /// The argument value, or `""` when absent.
    #[must_use]
    pub fn arg_value(&self) -> &str {
        self.arg.as_ref().map_or("", |a| a.value.as_str())
    }

    /// Span of the argument, falling back to the keyword span.
    #[must_use]
    pub fn arg_span(&self) -> Span {
        self.arg.as_ref().map_or(self.keyword_span, |a| a.span)
    }

    /// Find the first substatement of the given kind.
    #[must_use]
    pub fn find(&self, kind: StmtKind) -> Option<&Statement> {
        self.substatements
            .iter()
            .find(|s| s.keyword == Keyword::Std(kind))
    }

    /// Iterate over substatements of the given kind.
    pub fn find_all(&self, kind: StmtKind) -> impl Iterator<Item = &Statement> {
        self.substatements
            .iter()
            .filter(move |s| s.keyword == Keyword::Std(kind))
    }
}

/// Result of parsing one source file.
#[derive(Debug)]
pub struct Parse {
    /// The root `module`/`submodule` statement, if one could be recovered.
    pub root: Option<Statement>,
    /// Lexer and parser diagnostics.
    pub diagnostics: Vec<Diagnostic>,
}

impl Parse {
    /// Check if this parse produced any error diagnostics.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }
}

/// YANG statement parser.
pub struct Parser<'src> {
    /// Source text (for extracting token content).
    source: &'src str,
    /// Line index over the source (for indentation stripping).
    line_index: LineIndex,
    /// Tokens from the lexer.
    tokens: Vec<Token>,
    /// Current position in the token stream.
    pos: usize,
    /// Collected diagnostics (lexer + parser).
    diagnostics: Vec<Diagnostic>,
}

impl<'src> Parser<'src> {
    /// Create a new parser for the given source text.
    #[must_use]
    pub fn new(source: &'src str) -> Self {
        let lexer = Lexer::new(source.as_bytes());
        let (tokens, lexer_diagnostics) = lexer.tokenize();
        Self {
            source,
            line_index: LineIndex::new(source),
            tokens,
            pos: 0,
            diagnostics: lexer_diagnostics,
        }
    }

    /// Parse the source as one `module` or `submodule` statement.
    ///
    /// Any token after the root statement's closing brace is a syntax error.
    #[must_use]
    pub fn parse(mut self) -> Parse {
        if self.is_eof() {
            self.diagnostics.push(self.error("empty input"));
            return Parse {
                root: None,
                diagnostics: self.diagnostics,
            };
        }

        let root = self.parse_statement();

        // Everything after the root statement must be EOF
        if !self.is_eof() {
            let token = self.peek();
            let text = self.text(token.span);
            self.diagnostics.push(self.error_at(
                token.span,
                &format!("mismatched input '{text}' expecting <EOF>"),
            ));
        }

        Parse {
            root,
            diagnostics: self.diagnostics,
        }
    }

    // === Token access ===

    fn eof_token(&self) -> Token {
        let end = self.source.len() as u32;
        Token {
            kind: TokenKind::Eof,
            span: Span::new(end, end),
        }
    }

    fn is_eof(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    fn peek(&self) -> Token {
        self.tokens
            .get(self.pos)
            .copied()
            .unwrap_or_else(|| self.eof_token())
    }

    fn advance(&mut self) -> Token {
        let token = self.peek();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    fn text(&self, span: Span) -> &str {
        self.source
            .get(span.start as usize..span.end as usize)
            .unwrap_or("")
    }

    fn error(&self, message: &str) -> Diagnostic {
        self.error_at(self.peek().span, message)
    }

    fn error_at(&self, span: Span, message: &str) -> Diagnostic {
        Diagnostic {
            severity: Severity::Error,
            span,
            message: message.into(),
        }
    }

    // === Statement parsing ===

    /// Parse one statement. Returns `None` when recovery consumed the
    /// malformed statement without producing a node.
    fn parse_statement(&mut self) -> Option<Statement> {
        let keyword_token = self.peek();
        if keyword_token.kind != TokenKind::Unquoted {
            let text = self.text(keyword_token.span);
            self.diagnostics.push(self.error_at(
                keyword_token.span,
                &format!("expected statement keyword, found '{text}'"),
            ));
            self.recover();
            return None;
        }
        self.advance();

        let keyword_text = self.text(keyword_token.span).to_string();
        let keyword = match keyword_text.split_once(':') {
            Some((prefix, name)) if !prefix.is_empty() && !name.is_empty() => Keyword::Extension {
                prefix: prefix.to_string(),
                name: name.to_string(),
            },
            _ => match lookup_keyword(&keyword_text) {
                Some(kind) => Keyword::Std(kind),
                None => {
                    self.diagnostics.push(self.error_at(
                        keyword_token.span,
                        &format!("unknown statement keyword '{keyword_text}'"),
                    ));
                    self.recover();
                    return None;
                }
            },
        };

        let arg = self.parse_argument();

        let mut substatements = Vec::new();
        let end;
        match self.peek().kind {
            TokenKind::Semicolon => {
                end = self.advance().span;
            }
            TokenKind::LBrace => {
                self.advance();
                loop {
                    match self.peek().kind {
                        TokenKind::RBrace => break,
                        TokenKind::Eof => {
                            self.diagnostics.push(self.error_at(
                                keyword_token.span,
                                &format!("unterminated '{keyword_text}' statement, expected '}}'"),
                            ));
                            break;
                        }
                        _ => {
                            if let Some(stmt) = self.parse_statement() {
                                substatements.push(stmt);
                            }
                        }
                    }
                }
                end = if self.check(TokenKind::RBrace) {
                    self.advance().span
                } else {
                    self.peek().span
                };
            }
            _ => {
                let token = self.peek();
                let text = self.text(token.span);
                self.diagnostics.push(self.error_at(
                    token.span,
                    &format!("expected ';' or '{{' after '{keyword_text}', found '{text}'"),
                ));
                self.recover();
                return None;
            }
        }

        Some(Statement {
            keyword,
            keyword_span: keyword_token.span,
            arg,
            substatements,
            span: keyword_token.span.to(end),
        })
    }

    /// Parse an optional argument: a string token, possibly followed by
    /// `+`-concatenated quoted strings.
    fn parse_argument(&mut self) -> Option<Arg> {
        let first = self.peek();
        let mut value = match first.kind {
            TokenKind::Unquoted => {
                self.advance();
                self.text(first.span).to_string()
            }
            TokenKind::DoubleQuoted => {
                self.advance();
                self.decode_double_quoted(first.span)
            }
            TokenKind::SingleQuoted => {
                self.advance();
                self.decode_single_quoted(first.span)
            }
            _ => return None,
        };

        let mut span = first.span;
        while self.check(TokenKind::Plus) {
            let plus = self.advance();
            let next = self.peek();
            match next.kind {
                TokenKind::DoubleQuoted => {
                    self.advance();
                    value.push_str(&self.decode_double_quoted(next.span));
                    span = span.to(next.span);
                }
                TokenKind::SingleQuoted => {
                    self.advance();
                    value.push_str(&self.decode_single_quoted(next.span));
                    span = span.to(next.span);
                }
                _ => {
                    self.diagnostics
                        .push(self.error_at(plus.span, "expected string after '+'"));
                    break;
                }
            }
        }

        Some(Arg { value, span })
    }

    /// Decode a single-quoted string: content is verbatim.
    fn decode_single_quoted(&self, span: Span) -> String {
        let raw = self.text(span);
        raw.strip_prefix('\'')
            .map(|s| s.strip_suffix('\'').unwrap_or(s))
            .unwrap_or(raw)
            .to_string()
    }

    /// Decode a double-quoted string: strip the quotes, trim continuation
    /// lines relative to the quote column, then decode escapes.
    fn decode_double_quoted(&self, span: Span) -> String {
        let raw = self.text(span);
        let content = raw
            .strip_prefix('"')
            .map(|s| s.strip_suffix('"').unwrap_or(s))
            .unwrap_or(raw);

        // Column (1-based) of the character following the opening quote:
        // subsequent lines are stripped of whitespace up to this column.
        let (_, quote_col) = self.line_index.line_col(span.start);
        let indent = quote_col as usize; // quote col + 1, converted to 0-based

        let mut lines = content.split('\n');
        let mut result = String::with_capacity(content.len());
        if let Some(first) = lines.next() {
            result.push_str(first.trim_end_matches([' ', '\t']));
        }
        for line in lines {
            result.push('\n');
            result.push_str(strip_indent(line, indent).trim_end_matches([' ', '\t']));
        }

        decode_escapes(&result)
    }

    /// Consume tokens until the end of the current malformed statement:
    /// past a `;`, past a balanced `{ ... }`, or up to an enclosing `}`.
    fn recover(&mut self) {
        let mut depth = 0usize;
        loop {
            match self.peek().kind {
                TokenKind::Eof => return,
                TokenKind::Semicolon => {
                    self.advance();
                    if depth == 0 {
                        return;
                    }
                }
                TokenKind::LBrace => {
                    self.advance();
                    depth += 1;
                }
                TokenKind::RBrace => {
                    if depth == 0 {
                        // Leave the brace for the enclosing statement
                        return;
                    }
                    self.advance();
                    depth -= 1;
                    if depth == 0 {
                        return;
                    }
                }
                _ => {
                    self.advance();
                }
            }
        }
    }
}

/// Strip up to `indent` columns of leading whitespace, counting tabs as 8.
fn strip_indent(line: &str, indent: usize) -> &str {
    let mut col = 0usize;
    for (i, c) in line.char_indices() {
        if col >= indent {
            return &line[i..];
        }
        match c {
            ' ' => col += 1,
            '\t' => col += 8,
            _ => return &line[i..],
        }
    }
    ""
}

/// Decode `\n`, `\t`, `\"`, `\\` escape sequences. Unknown escapes were
/// already reported by the lexer; they pass through backslash-stripped.
fn decode_escapes(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => result.push('\n'),
                Some('t') => result.push('\t'),
                Some('"') => result.push('"'),
                Some('\\') => result.push('\\'),
                Some(other) => result.push(other),
                None => result.push('\\'),
            }
        } else {
            result.push(c);
        }
    }
    result
}
