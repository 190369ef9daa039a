//! YANG lexer.
//!
//! Tokenizes YANG source text (RFC 6020/7950 §6) into a token stream.
//! The lexer is lenient: it collects diagnostics rather than failing early,
//! and the driver decides whether any of them are fatal.

// Spans are u32; sources past 4 GiB are not supported
#![allow(clippy::cast_possible_truncation)]

mod token;

pub use token::{ByteOffset, Span, Token, TokenKind};

/// Diagnostic severity level.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    /// Blocks progress; the input may be malformed.
    Error,
    /// Informational; parsing continues.
    Warning,
}

/// A diagnostic message from the lexer or parser.
#[derive(Clone, Debug)]
pub struct Diagnostic {
    /// Severity level.
    pub severity: Severity,
    /// Location in source text.
    pub span: Span,
    /// Human-readable message.
    pub message: String,
}

/// Maps byte offsets to 1-based (line, column) pairs.
///
/// Built once per source file; used when rendering diagnostics and when
/// stripping the indentation of continued double-quoted strings.
#[derive(Clone, Debug)]
pub struct LineIndex {
    /// Byte offset of the start of each line.
    line_starts: Vec<u32>,
}

impl LineIndex {
    /// Build a line index for the given source.
    #[must_use]
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        for (i, b) in source.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(i as u32 + 1);
            }
        }
        Self { line_starts }
    }

    /// Get the 1-based (line, column) of a byte offset.
    #[must_use]
    pub fn line_col(&self, offset: ByteOffset) -> (u32, u32) {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(idx) => idx,
            Err(idx) => idx - 1,
        };
        let col = offset - self.line_starts[line];
        (line as u32 + 1, col + 1)
    }
}

/// YANG lexer.
///
/// Operates on raw bytes so that malformed input never panics; YANG sources
/// are UTF-8 and structural characters are all ASCII.
pub struct Lexer<'src> {
    /// Source text being tokenized.
    source: &'src [u8],
    /// Current byte position.
    pos: usize,
    /// Collected diagnostics.
    diagnostics: Vec<Diagnostic>,
}

impl<'src> Lexer<'src> {
    /// Create a new lexer for the given source bytes.
    #[must_use]
    pub fn new(source: &'src [u8]) -> Self {
        Self {
            source,
            pos: 0,
            diagnostics: Vec::new(),
        }
    }

    /// Tokenize the entire source and return all tokens.
    #[must_use]
    pub fn tokenize(mut self) -> (Vec<Token>, Vec<Diagnostic>) {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        (tokens, self.diagnostics)
    }

    fn is_eof(&self) -> bool {
        self.pos >= self.source.len()
    }

    fn peek(&self) -> Option<u8> {
        self.source.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.source.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<u8> {
        let b = self.source.get(self.pos).copied();
        if b.is_some() {
            self.pos += 1;
        }
        b
    }

    fn error(&mut self, span: Span, message: String) {
        self.diagnostics.push(Diagnostic {
            severity: Severity::Error,
            span,
            message,
        });
    }

    fn span_from(&self, start: usize) -> Span {
        Span::new(start as ByteOffset, self.pos as ByteOffset)
    }

    fn token(&self, kind: TokenKind, start: usize) -> Token {
        Token {
            kind,
            span: self.span_from(start),
        }
    }

    /// Skip whitespace and comments, collecting diagnostics for
    /// unterminated block comments.
    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(b' ' | b'\t' | b'\r' | b'\n') => {
                    self.advance();
                }
                Some(b'/') if self.peek_at(1) == Some(b'/') => {
                    // Line comment runs to end of line
                    while let Some(b) = self.peek() {
                        if b == b'\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                Some(b'/') if self.peek_at(1) == Some(b'*') => {
                    let start = self.pos;
                    self.advance();
                    self.advance();
                    let mut closed = false;
                    while let Some(b) = self.advance() {
                        if b == b'*' && self.peek() == Some(b'/') {
                            self.advance();
                            closed = true;
                            break;
                        }
                    }
                    if !closed {
                        let span = self.span_from(start);
                        self.error(span, "unterminated block comment".into());
                    }
                }
                _ => break,
            }
        }
    }

    /// Get the next token.
    pub fn next_token(&mut self) -> Token {
        self.skip_trivia();

        let start = self.pos;
        let Some(b) = self.peek() else {
            return self.token(TokenKind::Eof, start);
        };

        match b {
            b'{' => {
                self.advance();
                self.token(TokenKind::LBrace, start)
            }
            b'}' => {
                self.advance();
                self.token(TokenKind::RBrace, start)
            }
            b';' => {
                self.advance();
                self.token(TokenKind::Semicolon, start)
            }
            b'+' => {
                self.advance();
                self.token(TokenKind::Plus, start)
            }
            b'"' => self.scan_double_quoted(),
            b'\'' => self.scan_single_quoted(),
            _ => self.scan_unquoted(),
        }
    }

    /// Scan a double-quoted string. Escapes are validated here but decoded
    /// by the parser, which also strips continuation-line indentation.
    fn scan_double_quoted(&mut self) -> Token {
        let start = self.pos;
        self.advance(); // opening quote

        loop {
            match self.advance() {
                None => {
                    let span = self.span_from(start);
                    self.error(span, "unterminated string literal".into());
                    return self.token(TokenKind::DoubleQuoted, start);
                }
                Some(b'"') => {
                    return self.token(TokenKind::DoubleQuoted, start);
                }
                Some(b'\\') => {
                    match self.advance() {
                        Some(b'n' | b't' | b'"' | b'\\') => {}
                        Some(other) => {
                            let span = Span::new(self.pos as u32 - 2, self.pos as u32);
                            self.error(
                                span,
                                format!("unknown escape sequence: \\{}", other as char),
                            );
                        }
                        None => {
                            let span = self.span_from(start);
                            self.error(span, "unterminated string literal".into());
                            return self.token(TokenKind::DoubleQuoted, start);
                        }
                    }
                }
                Some(_) => {}
            }
        }
    }

    /// Scan a single-quoted string (no escapes, verbatim content).
    fn scan_single_quoted(&mut self) -> Token {
        let start = self.pos;
        self.advance(); // opening quote

        loop {
            match self.advance() {
                None => {
                    let span = self.span_from(start);
                    self.error(span, "unterminated string literal".into());
                    return self.token(TokenKind::SingleQuoted, start);
                }
                Some(b'\'') => {
                    return self.token(TokenKind::SingleQuoted, start);
                }
                Some(_) => {}
            }
        }
    }

    /// Scan an unquoted string: runs until whitespace, a structural
    /// character, a quote, or the start of a comment.
    fn scan_unquoted(&mut self) -> Token {
        let start = self.pos;
        while let Some(b) = self.peek() {
            match b {
                b' ' | b'\t' | b'\r' | b'\n' | b'{' | b'}' | b';' | b'"' | b'\'' => break,
                b'/' if matches!(self.peek_at(1), Some(b'/' | b'*')) => break,
                _ => {
                    self.advance();
                }
            }
        }
        self.token(TokenKind::Unquoted, start)
    }
}

/// Iterator implementation for convenient token iteration.
impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        let token = self.next_token();
        if token.kind == TokenKind::Eof {
            None
        } else {
            Some(token)
        }
    }
}
