// SPDX-License-Identifier: Apache-2.0

//! Structural index
//!
//! First pass over a JSON document. Records the offset of every structural byte
//! (`{ } [ ] , :` and opening quotes) together with the first byte of every bare
//! scalar (numbers, `true`, `false`, `null`), so the cursor can move from one
//! interesting position to the next without rescanning.
//!
//! The pass also checks what the cursor relies on: strings are terminated, closing
//! brackets match their openers, and nothing follows the root value. Problems are
//! recorded rather than returned, the cursor reports them as its first `ERROR`.
//!
//! String bodies are skipped with `memchr2`, which is vectorized on every target the
//! crate supports.

use memchr::memchr2;

use crate::types::Result;

#[derive(Debug, Default)]
pub struct StructuralIndex {
    positions: Vec<u32>,
    next: usize,
    open_at_end: usize,
    error: Option<String>,
    brackets: Vec<u8>,
}

impl StructuralIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index `data` (the real content only, without padding).
    ///
    /// Only allocation failure is returned as an error; on failure the previous index
    /// is left untouched. Syntax problems are available through [`Self::error`].
    pub fn build(&mut self, data: &[u8]) -> Result<()> {
        let len = data.len();
        // Every byte may be structural ("[[[["), one slot each.
        if self.positions.capacity() < len {
            self.positions
                .try_reserve_exact(len - self.positions.len())?;
        }

        self.positions.clear();
        self.brackets.clear();
        self.next = 0;
        self.open_at_end = 0;
        self.error = None;

        if len > u32::MAX as usize {
            self.error = Some(format!("document of {} bytes exceeds 4GiB", len));
            return Ok(());
        }

        let mut i = 0usize;
        let mut root_done = false;
        while i < len {
            let b = data[i];
            if is_whitespace(b) {
                i += 1;
                continue;
            }
            if root_done && self.brackets.is_empty() {
                return Ok(self.fail(i, "trailing content after root value"));
            }
            self.positions.push(i as u32);
            match b {
                b'"' => match skip_string(data, i + 1) {
                    Some(close) => {
                        i = close + 1;
                        root_done |= self.brackets.is_empty();
                    }
                    None => return Ok(self.fail(i, "unterminated string")),
                },
                b'{' | b'[' => {
                    self.brackets.push(b);
                    i += 1;
                }
                b'}' | b']' => {
                    let open = if b == b'}' { b'{' } else { b'[' };
                    match self.brackets.pop() {
                        Some(o) if o == open => {}
                        Some(_) => return Ok(self.fail(i, "mismatched closing bracket")),
                        None => return Ok(self.fail(i, "unmatched closing bracket")),
                    }
                    root_done |= self.brackets.is_empty();
                    i += 1;
                }
                b',' | b':' => i += 1,
                _ => {
                    i = skip_atom(data, i + 1);
                    root_done |= self.brackets.is_empty();
                }
            }
        }

        self.open_at_end = self.brackets.len();
        Ok(())
    }

    fn fail(&mut self, at: usize, what: &str) {
        self.error = Some(format!("{} at byte {}", what, at));
    }

    /// Next structural position, `None` once the index is exhausted.
    #[inline]
    pub fn advance(&mut self) -> Option<usize> {
        let pos = self.positions.get(self.next).copied()?;
        self.next += 1;
        Some(pos as usize)
    }

    #[inline]
    pub fn peek(&self) -> Option<usize> {
        self.positions.get(self.next).map(|&p| p as usize)
    }

    /// Last structural position of the document.
    #[inline]
    pub fn last(&self) -> Option<usize> {
        self.positions.last().map(|&p| p as usize)
    }

    /// True when every opened bracket was closed.
    #[inline]
    pub fn is_balanced(&self) -> bool {
        self.open_at_end == 0
    }

    #[inline]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Restart consumption from the first position.
    pub fn rewind(&mut self) {
        self.next = 0;
    }
}

#[inline(always)]
pub(crate) fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r')
}

#[inline(always)]
pub(crate) fn is_delimiter(b: u8) -> bool {
    is_whitespace(b) || matches!(b, b'{' | b'}' | b'[' | b']' | b',' | b':' | b'"')
}

/// Returns the offset of the closing quote of a string body starting at `from`.
fn skip_string(data: &[u8], mut from: usize) -> Option<usize> {
    loop {
        let hit = from + memchr2(b'"', b'\\', data.get(from..)?)?;
        if data[hit] == b'"' {
            return Some(hit);
        }
        from = hit + 2;
    }
}

fn skip_atom(data: &[u8], mut i: usize) -> usize {
    while i < data.len() && !is_delimiter(data[i]) {
        i += 1;
    }
    i
}
