//! UTF-8 character decoder with line-ending normalization and pushback.
//!
//! Sits between the raw [`ByteSource`] and the scanners. A lone `\r`, a
//! `\r\n` pair, and a lone `\n` all come out as a single `'\n'`, and every
//! character remembers how many source bytes it covered, so the byte
//! offsets reported through [`current_char_start`] and [`next_char_start`]
//! always refer to positions in the raw buffer (a normalized `\r\n` still
//! counts two bytes). Up to five characters can be pushed back; the
//! scanners lean on this for every "read one too far" decision, the
//! deepest being the four-character `±inf` probe.
//!
//! Line and column counters ride along with reads and survive unreads: the
//! column that was live before each of the last few newlines is kept in a
//! small ring so unreading a `'\n'` can restore it.
//!
//! [`current_char_start`]: CharReader::current_char_start
//! [`next_char_start`]: CharReader::next_char_start

use crate::{
    error::{ErrorKind, LexError, LexResult},
    source::ByteSource,
};

const PUSHBACK_CAPACITY: usize = 5;
/// One slot more than the pushback stack so a column survives every unread.
const OFFSET_QUEUE_CAPACITY: usize = PUSHBACK_CAPACITY + 1;

/// Mutable decoder state, split from the byte source so the tokenizer can
/// snapshot and restore it wholesale.
#[derive(Debug, Clone, Copy)]
pub(crate) struct CharState {
    pushback: [char; PUSHBACK_CAPACITY],
    pushback_len: [usize; PUSHBACK_CAPACITY],
    pushback_top: usize,
    /// Byte buffered by `\r` normalization when the next byte was not `\n`.
    peek_ahead: Option<u8>,
    /// Source bytes covered by the character most recently read.
    char_len: usize,
    line: usize,
    offset: usize,
    offset_queue: [usize; OFFSET_QUEUE_CAPACITY],
    offset_queue_head: usize,
    offset_queue_tail: usize,
}

impl CharState {
    fn initial() -> Self {
        Self {
            pushback: ['\0'; PUSHBACK_CAPACITY],
            pushback_len: [0; PUSHBACK_CAPACITY],
            pushback_top: 0,
            peek_ahead: None,
            char_len: 0,
            line: 1,
            offset: 0,
            offset_queue: [0; OFFSET_QUEUE_CAPACITY],
            offset_queue_head: 0,
            offset_queue_tail: 0,
        }
    }
}

#[derive(Debug)]
pub(crate) struct CharReader {
    source: ByteSource,
    state: CharState,
}

impl CharReader {
    pub(crate) fn new(source: ByteSource) -> Self {
        Self {
            source,
            state: CharState::initial(),
        }
    }

    pub(crate) fn source(&self) -> &ByteSource {
        &self.source
    }

    pub(crate) fn source_mut(&mut self) -> &mut ByteSource {
        &mut self.source
    }

    pub(crate) fn into_source(self) -> ByteSource {
        self.source
    }

    pub(crate) fn line(&self) -> usize {
        self.state.line
    }

    pub(crate) fn offset(&self) -> usize {
        self.state.offset
    }

    pub(crate) fn snapshot(&self) -> CharState {
        self.state
    }

    pub(crate) fn restore(&mut self, state: CharState) {
        self.state = state;
    }

    pub(crate) fn reset(&mut self) {
        self.state = CharState::initial();
        self.source.set_position(0);
    }

    /// A lexical error positioned at the current line and column.
    pub(crate) fn error(&self, kind: ErrorKind) -> LexError {
        LexError::new(kind, self.state.line, self.state.offset)
    }

    /// First byte of the character most recently returned by [`read`].
    ///
    /// [`read`]: CharReader::read
    pub(crate) fn current_char_start(&self) -> usize {
        self.next_char_start() - self.state.char_len
    }

    /// First byte of the character the next [`read`] will return,
    /// compensating for the normalization peek-ahead and the pushback
    /// stack.
    ///
    /// [`read`]: CharReader::read
    pub(crate) fn next_char_start(&self) -> usize {
        let mut position = self.source.position();
        if self.state.peek_ahead.is_some() {
            position -= 1;
        }
        for len in &self.state.pushback_len[..self.state.pushback_top] {
            position -= len;
        }
        position
    }

    /// Next character, or `None` at end of input.
    pub(crate) fn read(&mut self) -> LexResult<Option<char>> {
        let c = if self.state.pushback_top > 0 {
            self.state.pushback_top -= 1;
            let top = self.state.pushback_top;
            self.state.char_len = self.state.pushback_len[top];
            Some(self.state.pushback[top])
        } else {
            // Park the previous character's length where an unread of the
            // fetched character will juggle it back out of.
            self.state.pushback_len[self.state.pushback_top] = self.state.char_len;
            self.fetch()?
        };
        if c == Some('\n') {
            self.enqueue_offset(self.state.offset);
            self.state.offset = 0;
            self.state.line += 1;
        } else {
            self.state.offset += 1;
        }
        Ok(c)
    }

    /// Pushes `c` back so the next [`read`](CharReader::read) yields it
    /// again, with its source byte length intact. Unreading the
    /// end-of-input marker only rewinds the column counter; the next read
    /// finds the end of the buffer on its own.
    pub(crate) fn unread(&mut self, c: Option<char>) {
        let Some(c) = c else {
            self.state.offset = self.state.offset.saturating_sub(1);
            return;
        };
        let top = self.state.pushback_top;
        debug_assert!(top < PUSHBACK_CAPACITY, "character pushback overflow");
        let previous_len = self.state.pushback_len[top];
        self.state.pushback_len[top] = self.state.char_len;
        self.state.pushback[top] = c;
        self.state.pushback_top = top + 1;
        self.state.char_len = previous_len;
        if c == '\n' {
            self.state.line -= 1;
            self.state.offset = self.dequeue_offset();
        } else {
            self.state.offset = self.state.offset.saturating_sub(1);
        }
    }

    /// Reads one character and puts it straight back.
    pub(crate) fn peek(&mut self) -> LexResult<Option<char>> {
        let c = self.read()?;
        self.unread(c);
        Ok(c)
    }

    pub(crate) fn get_byte(&self, position: usize) -> Option<u8> {
        self.source.get(position)
    }

    fn enqueue_offset(&mut self, offset: usize) {
        let s = &mut self.state;
        s.offset_queue_head = (s.offset_queue_head + 1) % OFFSET_QUEUE_CAPACITY;
        if s.offset_queue_head == s.offset_queue_tail {
            s.offset_queue_tail = (s.offset_queue_tail + 1) % OFFSET_QUEUE_CAPACITY;
        }
        s.offset_queue[s.offset_queue_head] = offset;
    }

    fn dequeue_offset(&mut self) -> usize {
        let s = &mut self.state;
        let offset = s.offset_queue[s.offset_queue_head];
        s.offset_queue_head = (s.offset_queue_head + OFFSET_QUEUE_CAPACITY - 1) % OFFSET_QUEUE_CAPACITY;
        if s.offset_queue_head == s.offset_queue_tail {
            s.offset_queue_tail =
                (s.offset_queue_tail + OFFSET_QUEUE_CAPACITY - 1) % OFFSET_QUEUE_CAPACITY;
        }
        offset
    }

    /// Decodes one scalar from the source, folding `\r` and `\r\n` into
    /// `'\n'` and recording how many source bytes the result covered.
    fn fetch(&mut self) -> LexResult<Option<char>> {
        self.state.char_len = 0;
        let b0 = match self.state.peek_ahead.take() {
            Some(byte) => byte,
            None => match self.source.read() {
                Some(byte) => byte,
                None => return Ok(None),
            },
        };
        self.state.char_len = 1;
        if b0 < 0x80 {
            if b0 == b'\r' {
                match self.source.read() {
                    Some(b'\n') => self.state.char_len += 1,
                    Some(other) => self.state.peek_ahead = Some(other),
                    None => {}
                }
                return Ok(Some('\n'));
            }
            return Ok(Some(b0 as char));
        }
        let extra = match b0 {
            0xC2..=0xDF => 1,
            0xE0..=0xEF => 2,
            0xF0..=0xF4 => 3,
            _ => return Err(self.error(ErrorKind::InvalidUtf8)),
        };
        let mut scalar = u32::from(b0 & (0x7F >> (extra + 1)));
        for _ in 0..extra {
            let byte = self.continuation_byte()?;
            scalar = (scalar << 6) | u32::from(byte & 0x3F);
        }
        // Rejects encoded surrogate halves along with out-of-range values.
        match char::from_u32(scalar) {
            Some(c) => Ok(Some(c)),
            None => Err(self.error(ErrorKind::InvalidUtf8)),
        }
    }

    fn continuation_byte(&mut self) -> LexResult<u8> {
        match self.source.read() {
            Some(byte) if byte & 0xC0 == 0x80 => {
                self.state.char_len += 1;
                Ok(byte)
            }
            _ => Err(self.error(ErrorKind::InvalidUtf8)),
        }
    }
}
