//! Position-tracking reader over raw input bytes

use crate::error::Pos;

/// Forward-only reader that tracks line and column for diagnostics
#[derive(Clone, Debug)]
pub struct Cursor<'a> {
    bytes: &'a [u8],
    offset: usize,
    line: u32,
    col: u32,
}

impl<'a> Cursor<'a> {
    pub const fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            offset: 0,
            line: 1,
            col: 1,
        }
    }

    pub fn current(&self) -> Option<u8> {
        self.bytes.get(self.offset).copied()
    }

    /// Unconsumed input
    pub fn rest(&self) -> &'a [u8] {
        self.bytes.get(self.offset..).unwrap_or_default()
    }

    pub fn starts_with(&self, prefix: &[u8]) -> bool {
        self.rest().starts_with(prefix)
    }

    pub const fn is_eof(&self) -> bool {
        self.offset >= self.bytes.len()
    }

    pub const fn offset(&self) -> usize {
        self.offset
    }

    pub const fn position(&self) -> Pos {
        Pos::new(self.offset, self.line, self.col)
    }

    /// Move past one byte; columns count characters, not UTF-8 continuation bytes
    pub fn bump(&mut self) {
        let Some(b) = self.current() else {
            return;
        };
        self.offset += 1;
        match b {
            b'\n' => {
                self.line += 1;
                self.col = 1;
            }
            b if b & 0xC0 == 0x80 => {}
            _ => self.col += 1,
        }
    }

    /// Move past `n` bytes, stopping at end of input
    pub fn bump_by(&mut self, n: usize) {
        for _ in 0..n {
            self.bump();
        }
    }

    /// Consume `prefix` if the input continues with it
    pub fn eat(&mut self, prefix: &[u8]) -> bool {
        let matched = self.starts_with(prefix);
        if matched {
            self.bump_by(prefix.len());
        }
        matched
    }

    /// Consume bytes while `pred` holds and return them
    pub fn take_while(&mut self, mut pred: impl FnMut(u8) -> bool) -> &'a [u8] {
        let start = self.offset;
        while self.current().is_some_and(&mut pred) {
            self.bump();
        }
        self.since(start)
    }

    /// Consume through `terminator` and return the bytes before it
    ///
    /// Returns `None` with the cursor at end of input when the terminator
    /// never appears.
    pub fn take_until(&mut self, terminator: &[u8]) -> Option<&'a [u8]> {
        let start = self.offset;
        while !self.is_eof() {
            if self.starts_with(terminator) {
                let taken = self.since(start);
                self.bump_by(terminator.len());
                return Some(taken);
            }
            self.bump();
        }
        None
    }

    /// Skip XML whitespace, reporting whether any was present
    pub fn skip_whitespace(&mut self) -> bool {
        !self
            .take_while(|b| matches!(b, b' ' | b'\t' | b'\n' | b'\r'))
            .is_empty()
    }

    /// Bytes from `start` up to the current offset
    pub fn since(&self, start: usize) -> &'a [u8] {
        self.bytes.get(start..self.offset).unwrap_or_default()
    }
}
