/*!
The matching core of a regular expression engine.

This crate contains the machinery that *runs* compiled regular expressions:
an instruction model ([`Program`]), a Thompson NFA simulation with capture
slots ([`PikeVm`]), a lazy DFA ([`hybrid::Dfa`]) and an execution driver
([`exec::Exec`]) that picks between them. It deliberately contains no
parser and no compiler: programs arrive as instruction arrays built
elsewhere, and this crate promises only to execute them faithfully.

# Example

Hand-assembling the program for `a|b` and searching with the driver:

```
use regex_machine::{
    exec::Exec,
    Inst, InstByte, InstSplit, Program,
};

// 0: Split(1, 2); 1: Byte(a) -> 3; 2: Byte(b) -> 3; 3: Match
let prog = Program::new(
    vec![
        Inst::Split(InstSplit { goto1: 1, goto2: 2 }),
        Inst::Byte(InstByte { goto: 3, byte: b'a' }),
        Inst::Byte(InstByte { goto: 3, byte: b'b' }),
        Inst::Match,
    ],
    0, // anchored entry
    0, // unanchored entry (no prelude in this program)
    0, // no capture slots
)?;

let mut exec = Exec::new(&prog);
assert!(exec.is_match(b"b")?);
assert!(!exec.is_match(b"c")?);
# Ok::<(), Box<dyn std::error::Error>>(())
```

# Engines

The NFA simulation is the engine of record: it supports every instruction,
evaluates zero-width assertions against real input positions, and records
capture slots. The lazy DFA handles boolean searches over assertion-free
programs at much higher throughput by memoizing pc-set states; it is
bounded by a state cap and falls back to the NFA when a pattern blows past
it. Both engines agree on whether an input matches and where the match
ends, which the test suite checks.
*/

#[cfg(feature = "logging")]
macro_rules! debug {
    ($($tt:tt)*) => { log::debug!($($tt)*) }
}
#[cfg(not(feature = "logging"))]
macro_rules! debug {
    ($($tt:tt)*) => {};
}

#[cfg(feature = "logging")]
macro_rules! trace {
    ($($tt:tt)*) => { log::trace!($($tt)*) }
}
#[cfg(not(feature = "logging"))]
macro_rules! trace {
    ($($tt:tt)*) => {};
}

mod error;
pub mod exec;
pub mod hybrid;
pub mod input;
pub mod pikevm;
pub mod program;
pub mod utf8;
mod util;

pub use crate::{
    error::{BuildError, MatchError},
    input::{ByteInput, Input, Utf8Input},
    pikevm::{PikeVm, Slot},
    program::{
        ByteRanges, Inst, InstByte, InstDot, InstLook, InstPtr, InstRanges,
        InstSave, InstSplit, Look, Program,
    },
};
