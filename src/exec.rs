/*!
The execution driver: picks an engine, runs it, reports matches.

The division of labor is simple. The lazy DFA answers boolean questions
fast but is blind to captures and zero-width assertions; the NFA simulation
handles everything but is slower per byte. The driver routes each request
to the cheapest engine that can answer it and falls back to the NFA when
the DFA aborts on a pathological pattern.
*/

use crate::error::MatchError;
use crate::hybrid;
use crate::input::{ByteInput, Input, Utf8Input};
use crate::pikevm::{PikeVm, Slot};
use crate::program::Program;
use crate::utf8;

/// How the haystack is presented to the NFA simulation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum InputKind {
    /// One unit per byte.
    Bytes,
    /// One unit per decoded codepoint; invalid sequences yield U+0000 and
    /// advance one byte.
    Utf8,
}

/// Configuration of an execution driver.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    anchored: bool,
    multiline: bool,
    kind: InputKind,
    strict_utf8: bool,
    dfa_cache_capacity: usize,
    dfa_state_limit: usize,
}

impl Config {
    /// A default configuration: unanchored byte-oriented search, lossy
    /// UTF-8 handling, default DFA limits.
    pub fn new() -> Config {
        Config {
            anchored: false,
            multiline: false,
            kind: InputKind::Bytes,
            strict_utf8: false,
            dfa_cache_capacity: 1024,
            dfa_state_limit: 1000,
        }
    }

    /// Restrict searches to matches starting at position 0.
    pub fn anchored(mut self, yes: bool) -> Config {
        self.anchored = yes;
        self
    }

    /// Let `^` and `$` match around line feeds.
    pub fn multiline(mut self, yes: bool) -> Config {
        self.multiline = yes;
        self
    }

    /// Choose how the haystack is decoded.
    pub fn input_kind(mut self, kind: InputKind) -> Config {
        self.kind = kind;
        self
    }

    /// Reject haystacks containing invalid UTF-8 instead of decoding them
    /// lossily. Only meaningful with [`InputKind::Utf8`].
    pub fn strict_utf8(mut self, yes: bool) -> Config {
        self.strict_utf8 = yes;
        self
    }

    /// Lookup-entry capacity handed to the lazy DFA.
    pub fn dfa_cache_capacity(mut self, capacity: usize) -> Config {
        self.dfa_cache_capacity = capacity;
        self
    }

    /// State cap handed to the lazy DFA. When the cap trips, the driver
    /// reruns the search on the NFA and stops using the DFA.
    pub fn dfa_state_limit(mut self, limit: usize) -> Config {
        self.dfa_state_limit = limit;
        self
    }
}

impl Default for Config {
    fn default() -> Config {
        Config::new()
    }
}

/// A search driver over a borrowed program.
///
/// Owns all per-matcher scratch (the NFA's thread sets, the DFA's state
/// slab, the capture slots), so a single `Program` can be shared by one
/// `Exec` per thread.
#[derive(Debug)]
pub struct Exec<'r> {
    prog: &'r Program,
    config: Config,
    pikevm: PikeVm<'r>,
    /// Built on first eligible boolean search.
    dfa: Option<hybrid::Dfa<'r>>,
    /// Set once the DFA has given up; later searches go straight to the
    /// NFA instead of re-tripping the state cap.
    dfa_failed: bool,
    slots: Vec<Slot>,
}

impl<'r> Exec<'r> {
    /// Create a driver with the default configuration.
    pub fn new(prog: &'r Program) -> Exec<'r> {
        Exec::with_config(Config::new(), prog)
    }

    /// Create a driver with the given configuration.
    pub fn with_config(config: Config, prog: &'r Program) -> Exec<'r> {
        Exec {
            prog,
            config,
            pikevm: PikeVm::new(prog),
            dfa: None,
            dfa_failed: false,
            slots: vec![None; prog.slot_count()],
        }
    }

    /// Whether the program matches anywhere in the haystack (or at
    /// position 0 when anchored).
    pub fn is_match(&mut self, haystack: &[u8]) -> Result<bool, MatchError> {
        self.check_haystack(haystack)?;
        if self.dfa_eligible() {
            self.ensure_dfa();
            if let Some(ref mut dfa) = self.dfa {
                trace!("using lazy DFA for boolean search");
                match dfa.execute(haystack) {
                    Ok(end) => return Ok(end.is_some()),
                    Err(MatchError::TooManyStates { .. }) => {
                        debug!("lazy DFA gave up; falling back to the NFA");
                        self.dfa_failed = true;
                    }
                    Err(err) => return Err(err),
                }
            }
        }
        // Single pass through the unanchored prelude (or the anchored
        // entry); only a boolean is needed, so no position scan.
        let start = if self.config.anchored {
            self.prog.start()
        } else {
            self.prog.start_unanchored()
        };
        match self.config.kind {
            InputKind::Bytes => {
                let mut input =
                    ByteInput::new(haystack).multiline(self.config.multiline);
                Ok(self.pikevm.execute(&mut input, start, None))
            }
            InputKind::Utf8 => {
                let mut input =
                    Utf8Input::new(haystack).multiline(self.config.multiline);
                Ok(self.pikevm.execute(&mut input, start, None))
            }
        }
    }

    /// The span `(start, end)` of the leftmost match, if any.
    pub fn find(
        &mut self,
        haystack: &[u8],
    ) -> Result<Option<(usize, usize)>, MatchError> {
        self.check_haystack(haystack)?;
        match self.config.kind {
            InputKind::Bytes => {
                let mut input =
                    ByteInput::new(haystack).multiline(self.config.multiline);
                Ok(self.scan(&mut input, false))
            }
            InputKind::Utf8 => {
                let mut input =
                    Utf8Input::new(haystack).multiline(self.config.multiline);
                Ok(self.scan(&mut input, false))
            }
        }
    }

    /// Like [`Exec::find`], but also records capture positions, readable
    /// through [`Exec::slots`] after a successful return.
    pub fn captures(
        &mut self,
        haystack: &[u8],
    ) -> Result<Option<(usize, usize)>, MatchError> {
        self.check_haystack(haystack)?;
        match self.config.kind {
            InputKind::Bytes => {
                let mut input =
                    ByteInput::new(haystack).multiline(self.config.multiline);
                Ok(self.scan(&mut input, true))
            }
            InputKind::Utf8 => {
                let mut input =
                    Utf8Input::new(haystack).multiline(self.config.multiline);
                Ok(self.scan(&mut input, true))
            }
        }
    }

    /// The capture slots recorded by the most recent successful
    /// [`Exec::captures`] call. Length is `Program::slot_count`.
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// Run anchored attempts at successive unit boundaries until one
    /// matches. This keeps the shared capture-slot vector honest: within a
    /// single anchored attempt every `Save` position belongs to the match
    /// being reported, with no residue from abandoned earlier positions.
    fn scan<I: Input>(
        &mut self,
        input: &mut I,
        with_slots: bool,
    ) -> Option<(usize, usize)> {
        let start = self.prog.start();
        let len = input.haystack().len();
        let mut at = 0;
        loop {
            input.set_pos(at);
            let slots = if with_slots {
                for slot in self.slots.iter_mut() {
                    *slot = None;
                }
                Some(&mut self.slots[..])
            } else {
                None
            };
            if self.pikevm.execute(input, start, slots) {
                if let Some(end) = self.pikevm.match_end() {
                    return Some((at, end));
                }
            }
            if at >= len || self.config.anchored {
                return None;
            }
            at = input.next_pos(at);
        }
    }

    fn dfa_eligible(&self) -> bool {
        !self.dfa_failed
            && !self.prog.has_look()
            && self.config.kind == InputKind::Bytes
    }

    fn ensure_dfa(&mut self) {
        if self.dfa.is_some() {
            return;
        }
        let config = hybrid::Config::new()
            .anchored(self.config.anchored)
            .cache_capacity(self.config.dfa_cache_capacity)
            .state_limit(self.config.dfa_state_limit);
        match hybrid::Dfa::with_config(config, self.prog) {
            Ok(dfa) => self.dfa = Some(dfa),
            Err(_) => {
                debug!("lazy DFA construction failed; using the NFA");
                self.dfa_failed = true;
            }
        }
    }

    fn check_haystack(&self, haystack: &[u8]) -> Result<(), MatchError> {
        if self.config.strict_utf8 && self.config.kind == InputKind::Utf8 {
            if let Err(err) = utf8::validate(haystack) {
                return Err(MatchError::InvalidUtf8 { offset: err.offset() });
            }
        }
        Ok(())
    }
}
