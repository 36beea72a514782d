/*!
A Thompson NFA simulation with capture slots.

This is the engine of last resort and the engine of record: it handles every
program shape (including zero-width assertions the lazy DFA refuses), and it
is the only engine that produces capture positions. It runs all live
"threads" of the NFA in lock step over the input, so its running time is
`O(len * program)` with no backtracking blowups.

The simulation keeps the live threads as a dense pc-set and visits them in
ascending pc order. Epsilon closures are recomputed after every advance
rather than while queueing successors, which is what makes end-anchors work:
`a$` must evaluate `$` at the position *after* `a` was consumed.
*/

use crate::input::Input;
use crate::program::{Inst, InstPtr, Program};
use crate::util::bitset::{BitSet, ThreadSet};

/// A capture slot: a recorded byte offset, or `None` if never written.
pub type Slot = Option<usize>;

/// The NFA simulation. One per search thread; the program is shared.
#[derive(Debug)]
pub struct PikeVm<'r> {
    prog: &'r Program,
    threads: ThreadSet,
    /// Guards the closure DFS. Cleared per closure, allocated once.
    visited: BitSet,
    /// Explicit DFS stack, so deep programs cannot blow the call stack.
    stack: Vec<InstPtr>,
    match_start: Option<usize>,
    match_end: Option<usize>,
}

impl<'r> PikeVm<'r> {
    /// Create a simulation for the given program, allocating all scratch
    /// buffers up front.
    pub fn new(prog: &'r Program) -> PikeVm<'r> {
        let len = prog.len();
        PikeVm {
            prog,
            threads: ThreadSet::new(len),
            visited: BitSet::new(len),
            stack: Vec::with_capacity(len.min(64)),
            match_start: None,
            match_end: None,
        }
    }

    /// The position at which execution was seeded, if any thread was live
    /// at the start. With an unanchored prelude this is where the *scan*
    /// began, not where the match begins; capture slots 0 and 1 carry the
    /// match span for programs that record it.
    pub fn match_start(&self) -> Option<usize> {
        self.match_start
    }

    /// The position just past the last match found, if any.
    pub fn match_end(&self) -> Option<usize> {
        self.match_end
    }

    /// Run the simulation from `start` over the remainder of `input`.
    ///
    /// Returns true if a match state was reached. When `slots` is given,
    /// `Save` instructions record positions into it as they are traversed;
    /// the caller is responsible for sizing it (`Program::slot_count`) and
    /// clearing it beforehand.
    pub fn execute<I: Input>(
        &mut self,
        input: &mut I,
        start: InstPtr,
        mut slots: Option<&mut [Slot]>,
    ) -> bool {
        self.reset();
        self.add_closure_from(start, input, &mut slots);
        if !self.threads.current.is_empty() {
            self.match_start = Some(input.pos());
        }
        while !input.is_consumed() && !self.threads.current.is_empty() {
            self.step(input, &mut slots);
        }
        // One more closure pass so end-of-input assertions fire even when
        // the loop exited without stepping (empty haystack, or a dead set).
        if !self.threads.current.is_empty() {
            self.recompute_closure(input, &mut slots);
        }
        self.match_end.is_some()
    }

    fn reset(&mut self) {
        self.threads.clear();
        self.match_start = None;
        self.match_end = None;
    }

    /// Advance every live thread by one unit of input. Returns false when
    /// there was nothing to do.
    fn step<I: Input>(
        &mut self,
        input: &mut I,
        slots: &mut Option<&mut [Slot]>,
    ) -> bool {
        let prog = self.prog;
        if self.threads.current.is_empty() {
            return false;
        }
        self.threads.next.clear();
        let ch = match input.current() {
            None => {
                self.threads.swap();
                return false;
            }
            Some(ch) => ch,
        };
        // Visit threads in ascending pc order. Only the consuming
        // instructions act here; zero-width pcs in the set are frontier
        // residue from the closure and are skipped.
        let mut at = self.threads.current.first();
        while let Some(pc) = at {
            match prog[pc] {
                Inst::Byte(ref i) => {
                    if ch as u32 == u32::from(i.byte) {
                        self.threads.next.insert(i.goto);
                    }
                }
                Inst::Ranges(ref i) => {
                    if (ch as u32) <= 0xFF && i.ranges.contains(ch as u32 as u8) {
                        self.threads.next.insert(i.goto);
                    }
                }
                Inst::Dot(ref i) => {
                    if ch != '\n' {
                        self.threads.next.insert(i.goto);
                    }
                }
                _ => {}
            }
            at = self.threads.current.next_after(pc);
        }
        self.threads.swap();
        input.advance();
        self.recompute_closure(input, slots);
        true
    }

    /// Replace `current` with its epsilon closure at the input's current
    /// position. Idempotent: closing a closed set changes nothing.
    fn recompute_closure<I: Input>(
        &mut self,
        input: &I,
        slots: &mut Option<&mut [Slot]>,
    ) {
        self.threads.temp.copy_from(&self.threads.current);
        self.threads.current.clear();
        let mut at = self.threads.temp.first();
        while let Some(pc) = at {
            self.add_closure_from(pc, input, slots);
            at = self.threads.temp.next_after(pc);
        }
    }

    /// Depth-first walk of the zero-width instructions reachable from
    /// `start`, OR-ing everything visited into `current`.
    ///
    /// `Save` writes the current position while being traversed (Thompson's
    /// discipline; deferring the write to the consuming step would record
    /// positions one unit late for saves at the head of the program). A
    /// `Split` pushes its preferred branch first so that branch's slot
    /// writes land last and win. `Match` records the match and terminates
    /// its thread.
    fn add_closure_from<I: Input>(
        &mut self,
        start: InstPtr,
        input: &I,
        slots: &mut Option<&mut [Slot]>,
    ) {
        let prog = self.prog;
        self.visited.clear();
        self.stack.clear();
        self.stack.push(start);
        while let Some(pc) = self.stack.pop() {
            if self.visited.contains(pc) {
                continue;
            }
            self.visited.insert(pc);
            match prog[pc] {
                Inst::Split(ref i) => {
                    self.stack.push(i.goto1);
                    self.stack.push(i.goto2);
                }
                Inst::Jump(goto) => {
                    self.stack.push(goto);
                }
                Inst::Save(ref i) => {
                    if let Some(slots) = slots.as_mut() {
                        if i.slot < slots.len() {
                            slots[i.slot] = Some(input.pos());
                        }
                    }
                    self.stack.push(i.goto);
                }
                Inst::Look(ref i) => {
                    if input.is_empty_match(i.look) {
                        self.stack.push(i.goto);
                    }
                }
                Inst::Match => {
                    self.match_end = Some(input.pos());
                }
                // Consuming instructions are the closure's frontier.
                Inst::Byte(_) | Inst::Ranges(_) | Inst::Dot(_) => {}
            }
        }
        self.threads.current.union_with(&self.visited);
    }
}
