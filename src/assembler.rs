//! Turns program text into words.
//!
//! ```text
//! ; print "hi" and stop
//! start:
//!     set r0 'h'
//!     out r0
//!     out 'i'
//!     jmp end
//!     noop
//! end:
//!     halt
//! ```
//!
//! Every whitespace separated token becomes one word. Labels (`name:`) take
//! the address of the next word and may be referenced before they are
//! defined.

use std::borrow::Cow;
use std::collections::HashMap;
use std::error;
use std::fmt;
use std::iter::Peekable;
use std::str::CharIndices;

use crate::processor::Opcode;
use crate::word::{reg, Word, MAX_WORD, MEMORY_SIZE, REGISTER_COUNT};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    InvalidLiteral,
    InvalidRegister,
    InvalidCharacter,
    InvalidLabel,
    DuplicateLabel,
    UnknownWord,
    ProgramTooLarge,
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseErrorKind::InvalidLiteral => f.write_str("invalid literal"),
            ParseErrorKind::InvalidRegister => f.write_str("invalid register"),
            ParseErrorKind::InvalidCharacter => f.write_str("invalid character literal"),
            ParseErrorKind::InvalidLabel => f.write_str("invalid label"),
            ParseErrorKind::DuplicateLabel => f.write_str("label defined twice"),
            ParseErrorKind::UnknownWord => f.write_str("unknown label or instruction"),
            ParseErrorKind::ProgramTooLarge => f.write_str("program does not fit into memory"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    kind: ParseErrorKind,
    context: Option<Cow<'static, str>>,
    line_nr: usize,
}

impl ParseError {
    fn new<C, S>(kind: ParseErrorKind, context: C, line_nr: usize) -> Self
    where
        C: Into<Option<S>>,
        S: Into<Cow<'static, str>>,
    {
        Self {
            kind,
            context: context.into().map(|inner| inner.into()),
            line_nr,
        }
    }

    pub fn kind(&self) -> ParseErrorKind {
        self.kind
    }

    /// Line of the offending token, starting at one
    pub fn line_nr(&self) -> usize {
        self.line_nr
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(context) = &self.context {
            write!(
                f,
                "error [ln: {}]: {} - {}",
                self.line_nr, self.kind, context
            )
        } else {
            write!(f, "error [ln: {}]: {}", self.line_nr, self.kind)
        }
    }
}

impl error::Error for ParseError {}

pub type Result<T, E = ParseError> = std::result::Result<T, E>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenKind<'a> {
    /// Literal, register, label reference or mnemonic
    Word(&'a str),
    /// Label definition without the trailing colon
    Label(&'a str),
    /// Code point of a character literal
    Char(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Token<'a> {
    kind: TokenKind<'a>,
    line_nr: usize,
}

/// Value of the character after a backslash
fn unescape(c: char) -> char {
    match c {
        'a' => '\x07',
        'b' => '\x08',
        't' => '\t',
        'n' => '\n',
        'v' => '\x0b',
        'f' => '\x0c',
        'r' => '\r',
        's' => ' ',
        '0' => '\0',
        other => other,
    }
}

fn is_name(text: &str) -> bool {
    !text.is_empty() && text.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

#[derive(Debug, Clone)]
struct Tokenizer<'a> {
    source: &'a str,
    chars: Peekable<CharIndices<'a>>,
    line_nr: usize,
}

impl<'a> Tokenizer<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
            line_nr: 1,
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|&(_, c)| c)
    }

    fn bump(&mut self) -> Option<char> {
        let (_, c) = self.chars.next()?;
        if c == '\n' {
            self.line_nr += 1;
        }
        Some(c)
    }

    fn offset(&mut self) -> usize {
        self.chars
            .peek()
            .map_or(self.source.len(), |&(offset, _)| offset)
    }

    /// Skips to the end of the current token after a malformed literal
    fn recover(&mut self) {
        while matches!(self.peek(), Some(c) if !c.is_whitespace()) {
            self.bump();
        }
    }

    /// Returns the next token, or `None` at the end of the source
    fn next_token(&mut self) -> Option<Result<Token<'a>>> {
        loop {
            match self.peek()? {
                c if c.is_whitespace() => {
                    self.bump();
                }
                ';' => {
                    while matches!(self.peek(), Some(c) if c != '\n') {
                        self.bump();
                    }
                }
                '\'' => return Some(self.read_char()),
                _ => return Some(Ok(self.read_word())),
            }
        }
    }

    /// Reads `'c'` or `'\e'`
    fn read_char(&mut self) -> Result<Token<'a>> {
        let line_nr = self.line_nr;
        let start = self.offset();
        self.bump();

        let value = match self.bump() {
            Some('\\') => self.bump().map(unescape),
            other => other,
        };

        match (value, self.peek()) {
            (Some(value), Some('\'')) => {
                self.bump();
                Ok(Token {
                    kind: TokenKind::Char(value as u32),
                    line_nr,
                })
            }
            _ => {
                self.recover();
                let end = self.offset();
                Err(ParseError::new(
                    ParseErrorKind::InvalidCharacter,
                    format!("unterminated character literal `{}`", &self.source[start..end]),
                    line_nr,
                ))
            }
        }
    }

    fn read_word(&mut self) -> Token<'a> {
        let line_nr = self.line_nr;
        let start = self.offset();
        while matches!(self.peek(), Some(c) if !c.is_whitespace() && c != '\'' && c != ';') {
            self.bump();
        }
        let end = self.offset();
        let source = self.source;
        let word = &source[start..end];

        let kind = match word.strip_suffix(':') {
            Some(name) => TokenKind::Label(name),
            None => TokenKind::Word(word),
        };
        Token { kind, line_nr }
    }
}

/// Two pass assembler: the first pass assigns addresses to labels, the
/// second resolves every token into a word.
#[derive(Debug, Clone)]
pub struct Assembler<'a> {
    tokens: Vec<Token<'a>>,
    labels: HashMap<&'a str, Word>,
    errors: Vec<ParseError>,
}

impl<'a> Assembler<'a> {
    /// Tokenizes `source`
    pub fn new(source: &'a str) -> Self {
        let mut tokenizer = Tokenizer::new(source);
        let mut tokens = Vec::new();
        let mut errors = Vec::new();

        while let Some(res) = tokenizer.next_token() {
            match res {
                Ok(token) => tokens.push(token),
                Err(err) => errors.push(err),
            }
        }

        Self {
            tokens,
            labels: HashMap::new(),
            errors,
        }
    }

    /// Consumes `self` and assembles all tokens into words.
    ///
    /// # Errors
    ///
    /// All errors which may occur are collected and returned at the end.
    pub fn assemble(mut self) -> Result<Vec<Word>, Vec<ParseError>> {
        self.collect_labels();

        let mut words = Vec::new();
        for token in &self.tokens {
            let res = match token.kind {
                TokenKind::Label(_) => continue,
                TokenKind::Word(word) => self.resolve_word(word, token.line_nr),
                TokenKind::Char(value) => Self::resolve_char(value, token.line_nr),
            };
            match res {
                Ok(word) => words.push(word),
                Err(err) => self.errors.push(err),
            }
        }

        if words.len() > MEMORY_SIZE {
            self.errors.push(ParseError::new(
                ParseErrorKind::ProgramTooLarge,
                format!("{} words", words.len()),
                self.tokens.last().map_or(0, |token| token.line_nr),
            ));
        }

        if self.errors.is_empty() {
            log::debug!("assembled {} words", words.len());
            Ok(words)
        } else {
            self.errors.sort_by_key(|err| err.line_nr);
            for err in &self.errors {
                log::error!("{}", err);
            }
            Err(self.errors)
        }
    }

    fn collect_labels(&mut self) {
        let mut address = 0usize;
        for token in &self.tokens {
            let name = match token.kind {
                TokenKind::Label(name) => name,
                _ => {
                    address += 1;
                    continue;
                }
            };

            if !is_name(name) {
                self.errors.push(ParseError::new(
                    ParseErrorKind::InvalidLabel,
                    format!("`{}` is not a valid label name", name),
                    token.line_nr,
                ));
            } else if self.labels.contains_key(name) {
                self.errors.push(ParseError::new(
                    ParseErrorKind::DuplicateLabel,
                    format!("`{}`", name),
                    token.line_nr,
                ));
            } else {
                // Oversized programs are reported once the words are known
                let value = address.min(MEMORY_SIZE - 1) as Word;
                log::debug!("[{}] Found label `{}` at {}", token.line_nr, name, value);
                self.labels.insert(name, value);
            }
        }
    }

    fn resolve_word(&self, word: &str, line_nr: usize) -> Result<Word> {
        if word.bytes().all(|b| b.is_ascii_digit()) {
            return match word.parse::<u32>() {
                Ok(value) if value <= MAX_WORD as u32 => Ok(value as Word),
                _ => Err(ParseError::new(
                    ParseErrorKind::InvalidLiteral,
                    format!("`{}` is larger than {}", word, MAX_WORD),
                    line_nr,
                )),
            };
        }

        if let Some(index) = word.strip_prefix('r') {
            if !index.is_empty() && index.bytes().all(|b| b.is_ascii_digit()) {
                return match index.parse::<usize>() {
                    Ok(index) if index < REGISTER_COUNT => Ok(reg(index)),
                    _ => Err(ParseError::new(
                        ParseErrorKind::InvalidRegister,
                        format!("`{}` does not exist", word),
                        line_nr,
                    )),
                };
            }
        }

        if is_name(word) {
            if let Some(&address) = self.labels.get(word) {
                return Ok(address);
            }
            if let Some(opcode) = Opcode::from_mnemonic(word) {
                return Ok(opcode.into());
            }
        }

        Err(ParseError::new(
            ParseErrorKind::UnknownWord,
            format!("`{}`", word),
            line_nr,
        ))
    }

    fn resolve_char(value: u32, line_nr: usize) -> Result<Word> {
        if value <= MAX_WORD as u32 {
            Ok(value as Word)
        } else {
            Err(ParseError::new(
                ParseErrorKind::InvalidCharacter,
                format!("code point {} does not fit into a word", value),
                line_nr,
            ))
        }
    }
}

/// Assembles `source` into a program image
pub fn assemble(source: &str) -> Result<Vec<Word>, Vec<ParseError>> {
    Assembler::new(source).assemble()
}
