//! Quoted strings, in-token escape resolution, and the base-64 lob body.
//!
//! String scanners do not build text; they find the end of the token and
//! classify it. Classification is the interesting part: a string whose
//! every code point fits in eight bits, written without `\u`/`\U` escapes,
//! is clob-compatible and gets a `*Clob` kind; anything else is `*Utf8`.
//! A `\xHH` escape never promotes, even for values above 0x7F. The
//! downstream clob path depends on that exact rule.

use super::Tokenizer;
use crate::{
    error::{ErrorKind, LexResult},
    escape,
    token::Token,
};

impl Tokenizer {
    /// Short string; the opening `"` was just read.
    pub(super) fn read_quoted_string(&mut self) -> LexResult<Token> {
        self.queue.set_next_start(self.reader.next_char_start());
        let mut has_big_char = false;
        loop {
            let c = self.reader.read()?;
            match c {
                None => return Err(self.reader.error(ErrorKind::UnexpectedEof)),
                Some('"') => break,
                Some('\n') => return Err(self.reader.error(ErrorKind::BadToken(Some(0x0A)))),
                Some('\\') => {
                    let e = self.reader.read()?;
                    if matches!(e, Some('u' | 'U')) {
                        has_big_char = true;
                    }
                    if let Some(value) = self.read_escaped_char(e)? {
                        if value > 0xFF {
                            has_big_char = true;
                        }
                    }
                }
                Some(c) => {
                    if u32::from(c) > 0xFF {
                        has_big_char = true;
                    }
                }
            }
        }
        // On the closing quote; the range stops before it.
        self.queue.set_next_end(self.reader.current_char_start());
        Ok(if has_big_char {
            Token::StringUtf8
        } else {
            Token::StringClob
        })
    }

    /// One `'''…'''` segment; the three opening quotes are consumed. A
    /// single `'` or `''` inside the content is literal, and newlines are
    /// content. Adjacent segments are concatenated by the parser, not
    /// here.
    pub(super) fn read_quoted_long_string(&mut self) -> LexResult<Token> {
        self.queue.set_next_start(self.reader.next_char_start());
        let mut has_big_char = false;
        loop {
            let c = self.reader.read()?;
            match c {
                None => return Err(self.reader.error(ErrorKind::UnexpectedEof)),
                Some('\'') => {
                    // Candidate close: the range ends at this quote iff two
                    // more follow.
                    self.queue.set_next_end(self.reader.current_char_start());
                    let c2 = self.reader.read()?;
                    if c2 != Some('\'') {
                        self.reader.unread(c2);
                        continue;
                    }
                    let c3 = self.reader.read()?;
                    if c3 != Some('\'') {
                        self.reader.unread(c3);
                        continue;
                    }
                    break;
                }
                Some('\\') => {
                    let e = self.reader.read()?;
                    if matches!(e, Some('u' | 'U')) {
                        has_big_char = true;
                    }
                    if let Some(value) = self.read_escaped_char(e)? {
                        if value > 0xFF {
                            has_big_char = true;
                        }
                    }
                }
                Some(c) => {
                    if u32::from(c) > 0xFF {
                        has_big_char = true;
                    }
                }
            }
        }
        Ok(if has_big_char {
            Token::StringUtf8Long
        } else {
            Token::StringClobLong
        })
    }

    /// Resolves an escape while scanning: `e` is the character after the
    /// backslash. Returns the escaped code unit, or `None` for an escaped
    /// newline, which produces nothing. The unit is only ever inspected
    /// for classification; the materializer resolves escapes again when
    /// text is actually wanted.
    pub(super) fn read_escaped_char(&mut self, e: Option<char>) -> LexResult<Option<u32>> {
        let Some(e) = e else {
            return Err(self.reader.error(ErrorKind::UnexpectedEof));
        };
        if e == '\n' {
            return Ok(None);
        }
        if let Some(value) = escape::simple_escape(e) {
            return Ok(Some(value));
        }
        if let Some(digits) = escape::hex_escape_digits(e) {
            return self.read_hex_escape(digits).map(Some);
        }
        Err(self.reader.error(ErrorKind::BadEscape))
    }

    /// `digits` hex digits pulled through the character decoder.
    fn read_hex_escape(&mut self, digits: u32) -> LexResult<u32> {
        let mut value: u32 = 0;
        for _ in 0..digits {
            let digit = self
                .reader
                .read()?
                .filter(char::is_ascii)
                .and_then(|c| escape::hex_digit_value(c as u8));
            let Some(digit) = digit else {
                return Err(self.reader.error(ErrorKind::BadEscape));
            };
            value = value * 16 + digit;
        }
        if value > 0x10_FFFF {
            return Err(self.reader.error(ErrorKind::BadEscape));
        }
        Ok(value)
    }

    /// Scans a base-64 lob body after the parser has consumed `{{` and
    /// sniffed a non-quote with [`lob_lookahead`]. The range is staged for
    /// [`value_start`]/[`value_end`] but no token is enqueued; embedded
    /// whitespace stays inside the range for the base-64 decoder to skip.
    ///
    /// [`lob_lookahead`]: Tokenizer::lob_lookahead
    /// [`value_start`]: Tokenizer::value_start
    /// [`value_end`]: Tokenizer::value_end
    pub fn scan_base64_value(&mut self) -> LexResult<()> {
        self.queue.set_next_start(self.reader.next_char_start());
        let mut len = 0usize;
        let mut c;
        loop {
            c = self.reader.read()?;
            match c {
                None => return Err(self.reader.error(ErrorKind::UnexpectedEof)),
                // Non-ASCII is an error even when it is whitespace.
                Some(b) if !b.is_ascii() => {
                    return Err(self.reader.error(ErrorKind::BadToken(Some(u32::from(b)))))
                }
                Some(w) if w.is_whitespace() => {}
                Some(b) if is_base64_char(b) => len += 1,
                _ => break,
            }
        }
        let mut filler_len = 0usize;
        while c == Some('=') {
            filler_len += 1;
            c = self.reader.read()?;
        }
        if filler_len > 3 {
            return Err(self.reader.error(ErrorKind::BadToken(None)));
        }
        if (filler_len + len) % 4 != 0 {
            return Err(self.reader.error(ErrorKind::BadToken(None)));
        }
        self.queue.set_next_end(self.reader.current_char_start());
        self.reader.unread(c);
        Ok(())
    }
}

fn is_base64_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '+' || c == '/'
}
