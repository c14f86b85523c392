//! On-demand decoding of tokenized byte ranges into strings.
//!
//! Tokens carry only ranges. When the parser wants a token's text it
//! re-reads the raw bytes: line endings normalize to `\n`, escapes
//! resolve, and `\uHHHH` surrogate halves pair back up into scalars. Long
//! strings arrive as several segments, so the pairing state (a pending
//! high surrogate) is surfaced between calls; a half still dangling when
//! the value closes is an error.
//!
//! Decoding works directly against the byte source and restores its
//! cursor afterwards, so materializing never disturbs scanning.

use alloc::string::String;

use super::Tokenizer;
use crate::{
    error::{ErrorKind, LexResult},
    escape,
};

impl Tokenizer {
    /// Decoded text of the head token's byte range.
    pub fn value_as_string(&mut self) -> LexResult<String> {
        let (start, end) = (self.queue.start(0), self.queue.end(0));
        self.value_as_string_in(start, end)
    }

    /// Decoded text of an arbitrary previously tokenized byte range.
    pub fn value_as_string_in(&mut self, start: usize, end: usize) -> LexResult<String> {
        let position = self.start_value_as_string();
        let pending = self.continue_value_as_string(start, end, None)?;
        if pending.is_some() {
            return Err(self.reader.error(ErrorKind::InvalidUtf8));
        }
        Ok(self.close_value_as_string(position))
    }

    /// Begins a possibly multi-segment materialization. Returns the source
    /// cursor to hand back to [`close_value_as_string`].
    ///
    /// [`close_value_as_string`]: Tokenizer::close_value_as_string
    pub fn start_value_as_string(&mut self) -> usize {
        self.saved_symbol.clear();
        self.reader.source().position()
    }

    /// Appends the decoded text of `[start, end)` to the value under
    /// construction. A high surrogate left hanging by the previous segment
    /// comes in as `pending`; one left hanging by this segment is returned
    /// and must either feed the next call or be treated as an error when
    /// the value is complete.
    pub fn continue_value_as_string(
        &mut self,
        start: usize,
        end: usize,
        pending: Option<u16>,
    ) -> LexResult<Option<u16>> {
        let mut pending = pending;
        self.reader.source_mut().set_position(start);
        // One byte of lookahead for `\r\n` folding at the range boundary.
        let mut lookahead: Option<u8> = None;
        loop {
            let byte = match lookahead.take() {
                Some(byte) => byte,
                None => {
                    if self.reader.source().position() >= end {
                        break;
                    }
                    match self.reader.source_mut().read() {
                        Some(byte) => byte,
                        None => break,
                    }
                }
            };
            let unit: u32 = match byte {
                b'\r' => {
                    if self.reader.source().position() < end {
                        match self.reader.source_mut().read() {
                            Some(b'\n') | None => {}
                            Some(other) => lookahead = Some(other),
                        }
                    }
                    0x0A
                }
                b'\\' => match self.escaped_unit()? {
                    Some(value) => value,
                    None => continue, // escaped line terminator: nothing
                },
                byte if byte < 0x80 => u32::from(byte),
                byte => self.raw_scalar(byte)?,
            };
            if let Some(high) = pending {
                if !escape::is_low_surrogate(unit) {
                    return Err(self.reader.error(ErrorKind::InvalidUtf8));
                }
                let scalar = escape::combine_surrogates(high, unit as u16);
                self.push_scalar(scalar)?;
                pending = None;
            } else if escape::is_high_surrogate(unit) {
                pending = Some(unit as u16);
            } else if escape::is_low_surrogate(unit) {
                return Err(self.reader.error(ErrorKind::InvalidUtf8));
            } else {
                self.push_scalar(unit)?;
            }
        }
        Ok(pending)
    }

    /// Finishes the materialization, restoring the source cursor, and
    /// returns the accumulated text.
    pub fn close_value_as_string(&mut self, position: usize) -> String {
        self.reader.source_mut().set_position(position);
        self.saved_symbol.clone()
    }

    /// Escape resolution against raw bytes; `None` means the escape
    /// produced nothing (an escaped line terminator).
    fn escaped_unit(&mut self) -> LexResult<Option<u32>> {
        let Some(byte) = self.reader.source_mut().read() else {
            return Err(self.reader.error(ErrorKind::BadEscape));
        };
        match byte {
            b'\r' => {
                // `\<CR>` and `\<CR><NL>` both vanish.
                let position = self.reader.source().position();
                if self.reader.source_mut().read() != Some(b'\n') {
                    self.reader.source_mut().set_position(position);
                }
                Ok(None)
            }
            b'\n' => Ok(None),
            _ => {
                if let Some(value) = escape::simple_escape(byte as char) {
                    return Ok(Some(value));
                }
                if let Some(digits) = escape::hex_escape_digits(byte as char) {
                    return self.hex_escape_unit(digits).map(Some);
                }
                Err(self.reader.error(ErrorKind::BadEscape))
            }
        }
    }

    fn hex_escape_unit(&mut self, digits: u32) -> LexResult<u32> {
        let mut value: u32 = 0;
        for _ in 0..digits {
            let digit = self
                .reader
                .source_mut()
                .read()
                .and_then(escape::hex_digit_value);
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

    /// Re-decodes a multi-byte UTF-8 sequence from the raw buffer.
    fn raw_scalar(&mut self, b0: u8) -> LexResult<u32> {
        let extra = match b0 {
            0xC2..=0xDF => 1,
            0xE0..=0xEF => 2,
            0xF0..=0xF4 => 3,
            _ => return Err(self.reader.error(ErrorKind::InvalidUtf8)),
        };
        let mut scalar = u32::from(b0 & (0x7F >> (extra + 1)));
        for _ in 0..extra {
            match self.reader.source_mut().read() {
                Some(byte) if byte & 0xC0 == 0x80 => {
                    scalar = (scalar << 6) | u32::from(byte & 0x3F);
                }
                _ => return Err(self.reader.error(ErrorKind::InvalidUtf8)),
            }
        }
        Ok(scalar)
    }

    fn push_scalar(&mut self, scalar: u32) -> LexResult<()> {
        match char::from_u32(scalar) {
            Some(c) => {
                self.saved_symbol.push(c);
                Ok(())
            }
            None => Err(self.reader.error(ErrorKind::InvalidUtf8)),
        }
    }
}
