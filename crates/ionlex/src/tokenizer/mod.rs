//! The tokenizer proper: scanner dispatch, queue management, and the
//! lookahead/consume surface the Ion value parser drives.

mod numbers;
mod strings;
mod text;

use alloc::{boxed::Box, format, string::String, vec::Vec};

use crate::{
    char_reader::{CharReader, CharState},
    error::{ErrorKind, LexResult},
    keyword,
    source::ByteSource,
    token::Token,
    token_queue::{TokenQueue, QUEUE_CAPACITY},
    Keyword,
};

/// Streaming tokenizer over a buffer of Ion text.
///
/// Tokens come out as descriptors: a [`Token`] kind plus the half-open
/// byte range the token occupies in the source buffer. The parser peeks
/// with [`lookahead`](Self::lookahead) (up to seven tokens deep), advances
/// with [`consume_token`](Self::consume_token), and decodes a token's text
/// on demand with [`value_as_string`](Self::value_as_string). For
/// ambiguous constructs the complete tokenizer state can be saved and
/// restored around an exploratory parse.
///
/// ```
/// use ionlex::{Token, Tokenizer};
///
/// let mut tokenizer = Tokenizer::new("{ temp: 22d-1 }");
/// assert_eq!(tokenizer.lookahead(0)?, Token::OpenBrace);
/// tokenizer.consume_token()?;
/// assert_eq!(tokenizer.lookahead(0)?, Token::SymbolBasic);
/// assert_eq!(tokenizer.value_as_string()?, "temp");
/// # Ok::<(), ionlex::LexError>(())
/// ```
#[derive(Debug)]
pub struct Tokenizer {
    reader: CharReader,
    queue: TokenQueue,
    /// Scratch the value materializer decodes into.
    saved_symbol: String,
    saved: Option<Box<SavedState>>,
}

/// Complete mutable state captured by [`Tokenizer::save_state`].
#[derive(Debug, Clone)]
struct SavedState {
    chars: CharState,
    queue: TokenQueue,
    position: usize,
    saved_symbol: String,
}

impl Tokenizer {
    /// Builds a tokenizer over UTF-8 bytes of Ion text.
    pub fn new(input: impl Into<Vec<u8>>) -> Self {
        Self {
            reader: CharReader::new(ByteSource::new(input.into())),
            queue: TokenQueue::new(),
            saved_symbol: String::new(),
            saved: None,
        }
    }

    /// Returns to the freshly constructed state.
    pub fn reset(&mut self) {
        self.reader.reset();
        self.queue.clear();
        self.saved_symbol.clear();
    }

    /// Releases the tokenizer and hands back the input buffer.
    pub fn close(self) -> Vec<u8> {
        self.reader.into_source().into_inner()
    }

    /// Current input line, 1-based.
    pub fn line_number(&self) -> usize {
        self.reader.line()
    }

    /// Column within the current line; 0 immediately after a newline.
    pub fn line_offset(&self) -> usize {
        self.reader.offset()
    }

    /// Human-readable position suffix for diagnostics.
    pub fn input_position(&self) -> String {
        format!(" at line {} offset {}", self.reader.line(), self.reader.offset())
    }

    /// Kind of the token `distance` positions ahead, 0 being the next
    /// token. Scans lazily until the queue is deep enough; repeated calls
    /// with the same distance are free. `distance` must stay below the
    /// seven-token lookahead limit.
    pub fn lookahead(&mut self, distance: usize) -> LexResult<Token> {
        if distance >= QUEUE_CAPACITY - 1 {
            return Err(self.reader.error(ErrorKind::QueueOverflow));
        }
        while distance >= self.queue.count() {
            self.fill_queue()?;
        }
        Ok(self.queue.token(distance))
    }

    /// Discards the head token.
    pub fn consume_token(&mut self) -> LexResult<()> {
        self.queue.dequeue().map_err(|kind| self.reader.error(kind))
    }

    /// Decodes the head token's text, then discards the token.
    pub fn consume_token_as_string(&mut self) -> LexResult<String> {
        let value = self.value_as_string()?;
        self.consume_token()?;
        Ok(value)
    }

    /// Kind of the head token. Meaningful only after a successful
    /// [`lookahead`](Self::lookahead).
    pub fn current_token(&self) -> Token {
        self.queue.token(0)
    }

    /// First byte of the head token's range.
    pub fn value_start(&self) -> usize {
        self.queue.start(0)
    }

    /// One past the last byte of the head token's range.
    pub fn value_end(&self) -> usize {
        self.queue.end(0)
    }

    /// Random access into the source buffer, used by the parser for
    /// keyword resolution.
    pub fn get_byte(&self, position: usize) -> Option<u8> {
        self.reader.get_byte(position)
    }

    /// Identifies a reserved word occupying `[start, end)` in the source.
    pub fn keyword(&self, start: usize, end: usize) -> Option<Keyword> {
        self.reader
            .source()
            .as_bytes()
            .get(start..end)
            .and_then(keyword::keyword)
    }

    /// Captures the complete mutable state so the caller can explore an
    /// alternative parse and come back. The slot is reused across saves;
    /// after the first save the scanning path stays allocation-free.
    pub fn save_state(&mut self) {
        let position = self.reader.source().position();
        match &mut self.saved {
            Some(saved) => {
                saved.chars = self.reader.snapshot();
                saved.queue = self.queue;
                saved.position = position;
                saved.saved_symbol.clone_from(&self.saved_symbol);
            }
            None => {
                self.saved = Some(Box::new(SavedState {
                    chars: self.reader.snapshot(),
                    queue: self.queue,
                    position,
                    saved_symbol: self.saved_symbol.clone(),
                }));
            }
        }
    }

    /// Rewinds to the most recent [`save_state`](Self::save_state).
    pub fn restore_state(&mut self) -> LexResult<()> {
        let Some(saved) = &self.saved else {
            return Err(self.reader.error(ErrorKind::QueueUnderflow));
        };
        self.reader.restore(saved.chars);
        self.queue = saved.queue;
        self.saved_symbol.clone_from(&saved.saved_symbol);
        let position = saved.position;
        self.reader.source_mut().set_position(position);
        Ok(())
    }

    /// Skips whitespace and peeks a single character, letting the parser
    /// sniff `{{ "…" }}` against `{{ base64 }}` without committing to a
    /// token.
    pub fn lob_lookahead(&mut self) -> LexResult<Option<char>> {
        let mut c;
        loop {
            c = self.reader.read()?;
            match c {
                Some(w) if w.is_whitespace() => {}
                _ => break,
            }
        }
        self.reader.unread(c);
        Ok(c)
    }

    /// After a [`Token::CloseBrace`] in a lob context: does a second `}`
    /// follow immediately? Consumes the second brace when it does. A `}}`
    /// is never one token from the scanner because it is ambiguous with
    /// two struct closes; the parser opts in here instead.
    pub fn is_really_double_brace(&mut self) -> LexResult<bool> {
        if self.lookahead(0)? != Token::CloseBrace {
            return Ok(false);
        }
        match self.reader.read()? {
            None => Err(self.reader.error(ErrorKind::UnexpectedEof)),
            Some('}') => Ok(true),
            c => {
                self.reader.unread(c);
                Ok(false)
            }
        }
    }

    /// Scans exactly one more token and appends its descriptor.
    fn fill_queue(&mut self) -> LexResult<()> {
        let token = loop {
            let c = self.reader.read()?;
            match c {
                None => {
                    let here = self.reader.next_char_start();
                    self.queue.set_next_start(here);
                    self.queue.set_next_end(here);
                    break Token::Eof;
                }
                Some(' ' | '\t' | '\n') => {}
                Some('/') => match self.reader.read()? {
                    Some('/') => self.read_single_line_comment()?,
                    Some('*') => self.read_block_comment()?,
                    c2 => {
                        self.reader.unread(c2);
                        break self.read_symbol_extended('/')?;
                    }
                },
                Some(':') => {
                    let start = self.reader.current_char_start();
                    let c2 = self.reader.read()?;
                    let token = if c2 == Some(':') {
                        Token::DoubleColon
                    } else {
                        self.reader.unread(c2);
                        Token::Colon
                    };
                    self.queue.set_next_start(start);
                    self.queue.set_next_end(self.reader.next_char_start());
                    break token;
                }
                Some('{') => {
                    let start = self.reader.current_char_start();
                    let c2 = self.reader.read()?;
                    let token = if c2 == Some('{') {
                        Token::OpenDoubleBrace
                    } else {
                        self.reader.unread(c2);
                        Token::OpenBrace
                    };
                    self.queue.set_next_start(start);
                    self.queue.set_next_end(self.reader.next_char_start());
                    break token;
                }
                Some('}') => break self.punctuation(Token::CloseBrace),
                Some('[') => break self.punctuation(Token::OpenSquare),
                Some(']') => break self.punctuation(Token::CloseSquare),
                Some('(') => break self.punctuation(Token::OpenParen),
                Some(')') => break self.punctuation(Token::CloseParen),
                Some(',') => break self.punctuation(Token::Comma),
                Some('.') => break self.punctuation(Token::Dot),
                Some('\'') => break self.read_quoted_symbol()?,
                Some('"') => break self.read_quoted_string()?,
                Some(c) if is_identifier_start(c) => break self.read_symbol()?,
                Some(c) if c.is_ascii_digit() => break self.read_number(c)?,
                Some('-') => {
                    let c2 = self.reader.peek()?;
                    if matches!(c2, Some(d) if d.is_ascii_digit()) {
                        break self.read_number('-')?;
                    }
                    break self.read_symbol_extended('-')?;
                }
                Some(c) if is_operator_start(c) => break self.read_symbol_extended(c)?,
                Some(c) => {
                    return Err(self.reader.error(ErrorKind::BadTokenStart(u32::from(c))))
                }
            }
        };
        self.queue
            .enqueue(token)
            .map_err(|kind| self.reader.error(kind))
    }

    /// Stages the range of a single-character token that was just read.
    fn punctuation(&mut self, token: Token) -> Token {
        self.queue.set_next_start(self.reader.current_char_start());
        self.queue.set_next_end(self.reader.next_char_start());
        token
    }

    fn read_single_line_comment(&mut self) -> LexResult<()> {
        loop {
            match self.reader.read()? {
                Some('\n') | None => return Ok(()),
                Some(_) => {}
            }
        }
    }

    fn read_block_comment(&mut self) -> LexResult<()> {
        loop {
            match self.reader.read()? {
                Some('*') => loop {
                    // Runs of '*' are common at comment borders; chew
                    // through them without an unread per star.
                    match self.reader.read()? {
                        Some('/') => return Ok(()),
                        Some('*') => {}
                        Some(_) => break,
                        None => return Err(self.reader.error(ErrorKind::UnexpectedEof)),
                    }
                },
                Some(_) => {}
                None => return Err(self.reader.error(ErrorKind::UnexpectedEof)),
            }
        }
    }

    /// A `/` terminates a value only when it starts a comment, which costs
    /// a one-character peek.
    fn is_value_terminating(&mut self, c: Option<char>) -> LexResult<bool> {
        if c == Some('/') {
            let c2 = self.reader.peek()?;
            Ok(matches!(c2, Some('/' | '*')))
        } else {
            Ok(is_numeric_stop(c))
        }
    }

    /// Plain symbol; the leading identifier character was just read.
    fn read_symbol(&mut self) -> LexResult<Token> {
        self.queue.set_next_start(self.reader.current_char_start());
        loop {
            let c = self.reader.read()?;
            match c {
                Some(c) if is_identifier_char(c) => {}
                other => {
                    self.reader.unread(other);
                    break;
                }
            }
        }
        // The stopper is unread already; the range ends just before it.
        self.queue.set_next_end(self.reader.next_char_start());
        Ok(Token::SymbolBasic)
    }

    /// Quoted symbol; the opening `'` was just read. An immediate second
    /// quote either promotes to a long string (`'''`) or makes the empty
    /// symbol.
    fn read_quoted_symbol(&mut self) -> LexResult<Token> {
        let mut c = self.reader.read()?;
        if c == Some('\'') {
            c = self.reader.read()?;
            if c == Some('\'') {
                return self.read_quoted_long_string();
            }
            self.reader.unread(c);
            let here = self.reader.next_char_start();
            self.queue.set_next_start(here);
            self.queue.set_next_end(here);
            return Ok(Token::SymbolQuoted);
        }
        self.queue.set_next_start(self.reader.current_char_start());
        loop {
            match c {
                None => return Err(self.reader.error(ErrorKind::UnexpectedEof)),
                Some('\'') => {
                    // On the closing quote; the range stops before it.
                    self.queue.set_next_end(self.reader.current_char_start());
                    break;
                }
                Some('\n') => {
                    return Err(self.reader.error(ErrorKind::BadToken(Some(0x0A))))
                }
                Some('\\') => {
                    let e = self.reader.read()?;
                    self.read_escaped_char(e)?;
                }
                Some(_) => {}
            }
            c = self.reader.read()?;
        }
        Ok(Token::SymbolQuoted)
    }

    /// Operator symbol; `first` was just read. A leading `+` or `-`
    /// probes for `inf` and produces a float when it lands.
    fn read_symbol_extended(&mut self, first: char) -> LexResult<Token> {
        let mut token = Token::SymbolOperator;
        self.queue.set_next_start(self.reader.current_char_start());
        if (first == '+' || first == '-') && self.peek_inf()? {
            token = Token::Float;
        } else {
            loop {
                let c = self.reader.read()?;
                match c {
                    Some(c) if is_operator_char(c) => {}
                    other => {
                        self.reader.unread(other);
                        break;
                    }
                }
            }
        }
        self.queue.set_next_end(self.reader.next_char_start());
        Ok(token)
    }

    /// After a leading `+`/`-`: are the next bytes exactly `inf` followed
    /// by a non-identifier character? Consumes the `inf` when they are,
    /// leaves the stream untouched when they are not.
    fn peek_inf(&mut self) -> LexResult<bool> {
        let c1 = self.reader.read()?;
        if c1 == Some('i') {
            let c2 = self.reader.read()?;
            if c2 == Some('n') {
                let c3 = self.reader.read()?;
                if c3 == Some('f') {
                    let c4 = self.reader.read()?;
                    if !matches!(c4, Some(c) if is_identifier_char(c)) {
                        self.reader.unread(c4);
                        return Ok(true);
                    }
                    self.reader.unread(c4);
                }
                self.reader.unread(c3);
            }
            self.reader.unread(c2);
        }
        self.reader.unread(c1);
        Ok(false)
    }
}

fn is_identifier_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '$' || c == '_'
}

fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '$' || c == '_'
}

fn is_operator_start(c: char) -> bool {
    matches!(
        c,
        '+' | '#' | '<' | '>' | '*' | '=' | '^' | '&' | '|' | '~' | ';' | '!' | '?' | '@' | '%'
            | '`'
    )
}

fn is_operator_char(c: char) -> bool {
    matches!(
        c,
        '.' | '+' | '-' | '/' | '<' | '>' | '*' | '=' | '^' | '&' | '|' | '~' | ';' | '!' | '?'
            | '@' | '%' | '`'
    )
}

/// Characters that may legally follow a scalar literal.
fn is_numeric_stop(c: Option<char>) -> bool {
    match c {
        None => true,
        Some(c) => matches!(
            c,
            '{' | '}' | '[' | ']' | '(' | ')' | ',' | '"' | '\'' | ' ' | '\t' | '\n' | '\r'
        ),
    }
}
