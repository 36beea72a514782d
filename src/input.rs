use core::fmt;

use crate::program::Look;
use crate::utf8;
use crate::util::is_word_byte;

/// A cursor over a haystack, feeding the NFA simulation one unit at a time.
///
/// The two implementations differ only in what a "unit" is: [`ByteInput`]
/// yields raw bytes, [`Utf8Input`] yields decoded codepoints. Positions are
/// byte offsets in both, so the offsets recorded in capture slots always
/// index into the haystack directly.
pub trait Input {
    /// The entire haystack.
    fn haystack(&self) -> &[u8];

    /// The current byte offset.
    fn pos(&self) -> usize;

    /// Move the cursor to the given byte offset.
    fn set_pos(&mut self, pos: usize);

    /// Whether `^` and `$` also match around line feeds.
    fn is_multiline(&self) -> bool;

    /// The unit about to be consumed, or `None` at the end of the haystack.
    ///
    /// For byte inputs every byte value maps to the codepoint of the same
    /// value. For UTF-8 inputs an invalid sequence yields U+0000; callers
    /// must tolerate that.
    fn current(&self) -> Option<char>;

    /// Step past the current unit. A no-op at the end of the haystack.
    fn advance(&mut self);

    /// The byte offset of the unit following the one at `at`, without
    /// moving the cursor.
    fn next_pos(&self, at: usize) -> usize;

    /// Whether the whole haystack has been consumed.
    fn is_consumed(&self) -> bool {
        self.pos() >= self.haystack().len()
    }

    /// Whether the byte at the current position is an ASCII word byte.
    fn is_current_word_char(&self) -> bool {
        self.haystack().get(self.pos()).map_or(false, |&b| is_word_byte(b))
    }

    /// Whether the byte just before the current position is an ASCII word
    /// byte.
    fn is_previous_word_char(&self) -> bool {
        self.pos()
            .checked_sub(1)
            .and_then(|i| self.haystack().get(i))
            .map_or(false, |&b| is_word_byte(b))
    }

    /// Evaluate a zero-width assertion at the current position.
    ///
    /// The position "between" units is what is being tested, which is why
    /// the NFA recomputes closures after advancing: `a$` must see the
    /// position after `a` was consumed.
    fn is_empty_match(&self, look: Look) -> bool {
        let (bytes, pos) = (self.haystack(), self.pos());
        match look {
            Look::StartText => pos == 0,
            Look::EndText => pos == bytes.len(),
            Look::StartLine => {
                pos == 0 || (self.is_multiline() && bytes[pos - 1] == b'\n')
            }
            Look::EndLine => {
                pos == bytes.len() || (self.is_multiline() && bytes[pos] == b'\n')
            }
            Look::WordBoundaryAscii => {
                self.is_previous_word_char() != self.is_current_word_char()
            }
            Look::WordBoundaryAsciiNegate => {
                self.is_previous_word_char() == self.is_current_word_char()
            }
        }
    }
}

/// An input that yields one byte per unit.
#[derive(Clone)]
pub struct ByteInput<'h> {
    haystack: &'h [u8],
    pos: usize,
    multiline: bool,
}

impl<'h> ByteInput<'h> {
    /// Create a byte-oriented input over the given haystack.
    pub fn new(haystack: &'h [u8]) -> ByteInput<'h> {
        ByteInput { haystack, pos: 0, multiline: false }
    }

    /// Enable or disable multi-line mode for `^` and `$`.
    pub fn multiline(mut self, yes: bool) -> ByteInput<'h> {
        self.multiline = yes;
        self
    }
}

impl<'h> Input for ByteInput<'h> {
    fn haystack(&self) -> &[u8] {
        self.haystack
    }

    fn pos(&self) -> usize {
        self.pos
    }

    fn set_pos(&mut self, pos: usize) {
        self.pos = pos;
    }

    fn is_multiline(&self) -> bool {
        self.multiline
    }

    fn current(&self) -> Option<char> {
        self.haystack.get(self.pos).map(|&b| b as char)
    }

    fn advance(&mut self) {
        if self.pos < self.haystack.len() {
            self.pos += 1;
        }
    }

    fn next_pos(&self, at: usize) -> usize {
        at + 1
    }
}

impl<'h> fmt::Debug for ByteInput<'h> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ByteInput")
            .field("pos", &self.pos)
            .field("multiline", &self.multiline)
            .finish()
    }
}

/// An input that yields one decoded codepoint per unit.
///
/// Invalid UTF-8 is tolerated: the offending position yields U+0000 and
/// advances by a single byte. Callers wanting hard failure should validate
/// the haystack first (see [`utf8::validate`](crate::utf8::validate)); the
/// execution driver does so in strict mode.
#[derive(Clone)]
pub struct Utf8Input<'h> {
    haystack: &'h [u8],
    pos: usize,
    multiline: bool,
}

impl<'h> Utf8Input<'h> {
    /// Create a codepoint-oriented input over the given haystack.
    pub fn new(haystack: &'h [u8]) -> Utf8Input<'h> {
        Utf8Input { haystack, pos: 0, multiline: false }
    }

    /// Enable or disable multi-line mode for `^` and `$`.
    pub fn multiline(mut self, yes: bool) -> Utf8Input<'h> {
        self.multiline = yes;
        self
    }

    fn decode_len(&self, at: usize) -> usize {
        match utf8::decode(&self.haystack[at..]) {
            Ok((_, len)) => len,
            Err(_) => 1,
        }
    }
}

impl<'h> Input for Utf8Input<'h> {
    fn haystack(&self) -> &[u8] {
        self.haystack
    }

    fn pos(&self) -> usize {
        self.pos
    }

    fn set_pos(&mut self, pos: usize) {
        self.pos = pos;
    }

    fn is_multiline(&self) -> bool {
        self.multiline
    }

    fn current(&self) -> Option<char> {
        if self.pos >= self.haystack.len() {
            return None;
        }
        match utf8::decode(&self.haystack[self.pos..]) {
            Ok((ch, _)) => Some(ch),
            Err(_) => Some('\0'),
        }
    }

    fn advance(&mut self) {
        if self.pos < self.haystack.len() {
            self.pos += self.decode_len(self.pos);
        }
    }

    fn next_pos(&self, at: usize) -> usize {
        if at >= self.haystack.len() {
            at + 1
        } else {
            at + self.decode_len(at)
        }
    }
}

impl<'h> fmt::Debug for Utf8Input<'h> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Utf8Input")
            .field("pos", &self.pos)
            .field("multiline", &self.multiline)
            .finish()
    }
}
