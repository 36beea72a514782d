use core::fmt;
use core::mem;
use core::ops::Deref;
use core::slice;

use crate::error::BuildError;
use crate::util::alphabet::ByteClassSet;
use crate::util::DebugByte;

/// `InstPtr` is the index of an instruction in a program.
pub type InstPtr = usize;

/// A single compiled instruction.
///
/// A program is a flat array of these; control flow is expressed with plain
/// indices, so cycles (from repetitions like `a*`) are just back-edges and
/// carry no ownership. The consuming variants (`Byte`, `Ranges`, `Dot`)
/// advance the input by one unit; everything else is zero-width.
#[derive(Clone, Debug)]
pub enum Inst {
    /// The program has reached a match state. Terminal: nothing follows.
    Match,
    /// Match one specific byte.
    Byte(InstByte),
    /// Match any byte in a set of ranges.
    Ranges(InstRanges),
    /// Match any byte except line feed (`0x0A`).
    Dot(InstDot),
    /// A zero-width assertion about the current position.
    Look(InstLook),
    /// Record the current position in a capture slot.
    Save(InstSave),
    /// Unconditional transfer.
    Jump(InstPtr),
    /// Two-way branch. `goto1` is the preferred path.
    Split(InstSplit),
}

impl Inst {
    /// Whether this instruction is a match state.
    pub fn is_match(&self) -> bool {
        matches!(*self, Inst::Match)
    }

    /// Whether this instruction consumes one unit of input when it matches.
    pub fn is_consuming(&self) -> bool {
        matches!(*self, Inst::Byte(_) | Inst::Ranges(_) | Inst::Dot(_))
    }
}

/// Representation of the `Byte` instruction.
#[derive(Clone, Debug)]
pub struct InstByte {
    /// Where to continue when the byte matches.
    pub goto: InstPtr,
    /// The byte to test against.
    pub byte: u8,
}

/// Representation of the `Ranges` instruction.
#[derive(Clone, Debug)]
pub struct InstRanges {
    /// Where to continue when a range matches.
    pub goto: InstPtr,
    /// The set of byte ranges to test against.
    pub ranges: ByteRanges,
}

/// Representation of the `Dot` instruction.
#[derive(Clone, Debug)]
pub struct InstDot {
    /// Where to continue after consuming a non-linefeed unit.
    pub goto: InstPtr,
}

/// Representation of the `Look` instruction.
#[derive(Clone, Debug)]
pub struct InstLook {
    /// Where to continue when the assertion holds.
    pub goto: InstPtr,
    /// The assertion to check.
    pub look: Look,
}

/// Representation of the `Save` instruction.
#[derive(Clone, Debug)]
pub struct InstSave {
    /// Where to continue after recording the position.
    pub goto: InstPtr,
    /// The capture slot to write. Slots `2k` and `2k+1` hold the open and
    /// close positions of capture group `k`.
    pub slot: usize,
}

/// Representation of the `Split` instruction.
#[derive(Clone, Debug)]
pub struct InstSplit {
    /// The preferred branch. A match found through `goto1` wins over one
    /// found through `goto2`.
    pub goto1: InstPtr,
    /// The secondary branch.
    pub goto2: InstPtr,
}

/// A zero-width assertion evaluated against the current input position.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Look {
    /// `^`: at the start of the haystack, or right after a line feed in
    /// multi-line mode.
    StartLine,
    /// `$`: at the end of the haystack, or right before a line feed in
    /// multi-line mode.
    EndLine,
    /// `\A`: at the start of the haystack.
    StartText,
    /// `\z`: at the end of the haystack.
    EndText,
    /// `\b`: exactly one side of the position is an ASCII word byte.
    WordBoundaryAscii,
    /// `\B`: the negation of `WordBoundaryAscii`.
    WordBoundaryAsciiNegate,
}

/// A sorted set of disjoint, inclusive byte ranges.
#[derive(Clone)]
pub struct ByteRanges {
    ranges: Box<[(u8, u8)]>,
}

impl ByteRanges {
    /// Build a range set from arbitrary `(lo, hi)` pairs.
    ///
    /// Pairs are sorted and coalesced, so overlapping or adjacent input
    /// ranges are fine. A pair with `lo > hi` is an error.
    pub fn new(mut ranges: Vec<(u8, u8)>) -> Result<ByteRanges, BuildError> {
        if ranges.iter().any(|&(lo, hi)| lo > hi) {
            return Err(BuildError::invalid(0, "byte range with lo > hi"));
        }
        ranges.sort_unstable();
        let mut merged: Vec<(u8, u8)> = Vec::with_capacity(ranges.len());
        for (lo, hi) in ranges {
            match merged.last_mut() {
                Some(last) if u16::from(lo) <= u16::from(last.1) + 1 => {
                    last.1 = last.1.max(hi);
                }
                _ => merged.push((lo, hi)),
            }
        }
        Ok(ByteRanges { ranges: merged.into_boxed_slice() })
    }

    /// Whether `b` falls in any range.
    pub fn contains(&self, b: u8) -> bool {
        self.ranges
            .binary_search_by(|&(lo, hi)| {
                if b < lo {
                    core::cmp::Ordering::Greater
                } else if b > hi {
                    core::cmp::Ordering::Less
                } else {
                    core::cmp::Ordering::Equal
                }
            })
            .is_ok()
    }

    /// The normalized ranges, sorted and disjoint.
    pub fn ranges(&self) -> &[(u8, u8)] {
        &self.ranges
    }
}

impl fmt::Debug for ByteRanges {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut set = f.debug_list();
        for &(lo, hi) in self.ranges.iter() {
            if lo == hi {
                set.entry(&DebugByte(lo));
            } else {
                set.entry(&format_args!("{:?}-{:?}", DebugByte(lo), DebugByte(hi)));
            }
        }
        set.finish()
    }
}

/// An immutable compiled program: the instruction array and the facts the
/// matching engines need about it.
///
/// A program is produced by a compiler outside this crate and never mutated
/// here. It owns its instruction storage (including the range tables inside
/// `Ranges` instructions); matchers borrow it for their lifetime, and since
/// it is `Send + Sync` a single program can back matchers on many threads.
#[derive(Clone)]
pub struct Program {
    insts: Box<[Inst]>,
    start: InstPtr,
    start_unanchored: InstPtr,
    slot_count: usize,
    has_look: bool,
    byte_classes: ByteClassSet,
}

impl Program {
    /// Build a program from its instruction array and entry points.
    ///
    /// `start` is the anchored entry; `start_unanchored` points at the
    /// `.*?`-style prelude the compiler emits for unanchored searches (or at
    /// `start` again when there is none). `slot_count` is the total number
    /// of capture slots and must be even.
    ///
    /// Every branch target and capture slot is validated here, so the
    /// engines can index instructions without bounds anxiety.
    pub fn new(
        insts: Vec<Inst>,
        start: InstPtr,
        start_unanchored: InstPtr,
        slot_count: usize,
    ) -> Result<Program, BuildError> {
        let len = insts.len();
        let check = |pc: InstPtr, target: InstPtr, what: &'static str| {
            if target >= len {
                Err(BuildError::invalid(pc, what))
            } else {
                Ok(())
            }
        };
        if start >= len {
            return Err(BuildError::invalid(len, "start out of range"));
        }
        if start_unanchored >= len {
            return Err(BuildError::invalid(len, "unanchored start out of range"));
        }
        if slot_count % 2 != 0 {
            return Err(BuildError::invalid(len, "odd capture slot count"));
        }
        let mut has_look = false;
        let mut byte_classes = ByteClassSet::new();
        for (pc, inst) in insts.iter().enumerate() {
            match *inst {
                Inst::Match => {}
                Inst::Byte(ref i) => {
                    check(pc, i.goto, "byte target out of range")?;
                    byte_classes.set_range(i.byte, i.byte);
                }
                Inst::Ranges(ref i) => {
                    check(pc, i.goto, "ranges target out of range")?;
                    for &(lo, hi) in i.ranges.ranges() {
                        byte_classes.set_range(lo, hi);
                    }
                }
                Inst::Dot(ref i) => {
                    check(pc, i.goto, "dot target out of range")?;
                    // `.` discriminates exactly one byte: line feed.
                    byte_classes.set_range(b'\n', b'\n');
                }
                Inst::Look(ref i) => {
                    check(pc, i.goto, "look target out of range")?;
                    has_look = true;
                }
                Inst::Save(ref i) => {
                    check(pc, i.goto, "save target out of range")?;
                    if i.slot >= slot_count {
                        return Err(BuildError::invalid(
                            pc,
                            "capture slot out of range",
                        ));
                    }
                }
                Inst::Jump(goto) => {
                    check(pc, goto, "jump target out of range")?;
                }
                Inst::Split(ref i) => {
                    check(pc, i.goto1, "split target out of range")?;
                    check(pc, i.goto2, "split target out of range")?;
                }
            }
        }
        Ok(Program {
            insts: insts.into_boxed_slice(),
            start,
            start_unanchored,
            slot_count,
            has_look,
            byte_classes,
        })
    }

    /// The anchored entry point.
    pub fn start(&self) -> InstPtr {
        self.start
    }

    /// The unanchored entry point (the `.*?` prelude).
    pub fn start_unanchored(&self) -> InstPtr {
        self.start_unanchored
    }

    /// Total number of capture slots. Always even.
    pub fn slot_count(&self) -> usize {
        self.slot_count
    }

    /// Whether any instruction is a zero-width assertion. Such programs can
    /// only run on the NFA simulation.
    pub fn has_look(&self) -> bool {
        self.has_look
    }

    /// The byte discriminations made by this program, from which the lazy
    /// DFA derives its equivalence classes.
    pub(crate) fn byte_class_set(&self) -> &ByteClassSet {
        &self.byte_classes
    }

    /// Return the approximate heap usage of this program in bytes.
    ///
    /// Only the instruction array and the range tables inside `Ranges`
    /// instructions use heap space, so this is exact up to allocator
    /// rounding.
    pub fn approximate_size(&self) -> usize {
        let ranges: usize = self
            .iter()
            .map(|inst| match *inst {
                Inst::Ranges(ref i) => {
                    i.ranges.ranges().len() * mem::size_of::<(u8, u8)>()
                }
                _ => 0,
            })
            .sum();
        self.len() * mem::size_of::<Inst>() + ranges
    }
}

impl Deref for Program {
    type Target = [Inst];

    fn deref(&self) -> &[Inst] {
        &self.insts
    }
}

impl<'a> IntoIterator for &'a Program {
    type Item = &'a Inst;
    type IntoIter = slice::Iter<'a, Inst>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Debug for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn with_goto(cur: usize, goto: usize, fmtd: String) -> String {
            if goto == cur + 1 {
                fmtd
            } else {
                format!("{} (goto: {})", fmtd, goto)
            }
        }

        for (pc, inst) in self.iter().enumerate() {
            match *inst {
                Inst::Match => write!(f, "{:04} Match", pc)?,
                Inst::Byte(ref i) => {
                    let s = format!("Byte({:?})", DebugByte(i.byte));
                    write!(f, "{:04} {}", pc, with_goto(pc, i.goto, s))?;
                }
                Inst::Ranges(ref i) => {
                    let s = format!("Ranges({:?})", i.ranges);
                    write!(f, "{:04} {}", pc, with_goto(pc, i.goto, s))?;
                }
                Inst::Dot(ref i) => {
                    write!(f, "{:04} {}", pc, with_goto(pc, i.goto, "Dot".to_string()))?;
                }
                Inst::Look(ref i) => {
                    let s = format!("{:?}", i.look);
                    write!(f, "{:04} {}", pc, with_goto(pc, i.goto, s))?;
                }
                Inst::Save(ref i) => {
                    let s = format!("Save({})", i.slot);
                    write!(f, "{:04} {}", pc, with_goto(pc, i.goto, s))?;
                }
                Inst::Jump(goto) => {
                    write!(f, "{:04} Jump (goto: {})", pc, goto)?;
                }
                Inst::Split(ref i) => {
                    write!(f, "{:04} Split({}, {})", pc, i.goto1, i.goto2)?;
                }
            }
            if pc == self.start {
                write!(f, " (start)")?;
            }
            if pc == self.start_unanchored && self.start_unanchored != self.start {
                write!(f, " (unanchored start)")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
