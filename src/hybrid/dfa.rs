use core::fmt;
use core::mem::size_of;
use core::num::NonZeroUsize;

use lru::LruCache;

use crate::error::{BuildError, MatchError};
use crate::hybrid::search;
use crate::program::{Inst, InstPtr, Program};
use crate::util::alphabet::ByteClasses;
use crate::util::bitset::BitSet;

/// Identifier of a DFA state: an index into the state slab.
pub(crate) type StateID = u32;

/// Sentinel for a transition that has not been computed yet.
pub(crate) const UNKNOWN: StateID = StateID::MAX;
/// Sentinel for a transition into the dead state (an empty pc-set). Once
/// dead, a search can never leave, so no actual state is materialized.
pub(crate) const DEAD: StateID = StateID::MAX - 1;

/// The configuration of a lazy DFA.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    anchored: bool,
    byte_classes: bool,
    cache_capacity: usize,
    state_limit: usize,
}

impl Config {
    /// A default configuration: unanchored, byte classes enabled, a cache
    /// of 1024 lookup entries and a limit of 1000 states.
    pub fn new() -> Config {
        Config {
            anchored: false,
            byte_classes: true,
            cache_capacity: 1024,
            state_limit: 1000,
        }
    }

    /// Whether searches start at the program's anchored entry point
    /// instead of the unanchored prelude.
    pub fn anchored(mut self, yes: bool) -> Config {
        self.anchored = yes;
        self
    }

    /// Whether to key transitions by byte equivalence class. Disabling
    /// this gives every byte its own class, which makes transition tables
    /// much bigger but far easier to read when debugging.
    pub fn byte_classes(mut self, yes: bool) -> Config {
        self.byte_classes = yes;
        self
    }

    /// Maximum number of pc-set → state lookup entries kept alive. The
    /// least recently used entry is evicted first.
    pub fn cache_capacity(mut self, capacity: usize) -> Config {
        self.cache_capacity = capacity;
        self
    }

    /// Hard cap on the number of states materialized during searches.
    /// Exceeding it aborts the search with
    /// [`MatchError::TooManyStates`](crate::MatchError::TooManyStates).
    pub fn state_limit(mut self, limit: usize) -> Config {
        self.state_limit = limit;
        self
    }
}

impl Default for Config {
    fn default() -> Config {
        Config::new()
    }
}

/// Counters describing the work a lazy DFA has done so far.
#[derive(Clone, Copy, Debug, Default)]
pub struct Stats {
    /// States materialized in the slab, including the start state and any
    /// duplicates re-created after their lookup entry was evicted.
    pub states_created: usize,
    /// Transition computations that found their pc-set already cached.
    pub cache_hits: usize,
    /// States created because no cached equivalent existed. The start
    /// state counts as a miss.
    pub cache_misses: usize,
    /// Calls into the full transition construction (frontier + closure),
    /// i.e. transitions that were not already in a state's row.
    pub transitions_computed: usize,
}

/// A single materialized DFA state.
struct State {
    /// The epsilon-closed set of NFA pcs this state stands for.
    nfa_pcs: BitSet,
    is_match: bool,
    /// One slot per byte class, `UNKNOWN` until computed.
    trans: Box<[StateID]>,
}

/// A lazy DFA over a borrowed program.
///
/// The state slab only ever grows during searches (or is emptied wholesale
/// by [`Dfa::reset`]); the LRU cache holds the pc-set → state mapping and
/// sheds entries when full. An evicted entry does *not* remove its state
/// from the slab, since ids already written into transition rows must stay
/// valid. The cost is that a re-encountered pc-set may be materialized a
/// second time; the state limit bounds the damage.
pub struct Dfa<'r> {
    prog: &'r Program,
    config: Config,
    classes: ByteClasses,
    states: Vec<State>,
    cache: LruCache<Box<[u64]>, StateID>,
    start: StateID,
    /// Frontier of the transition being computed: successors of consuming
    /// instructions that accept the input byte.
    scratch: BitSet,
    /// The frontier's epsilon closure, i.e. the next state's pc-set.
    merge: BitSet,
    /// Guards the closure DFS.
    visited: BitSet,
    stack: Vec<InstPtr>,
    stats: Stats,
}

impl<'r> Dfa<'r> {
    /// Build a lazy DFA with the default configuration.
    pub fn new(prog: &'r Program) -> Result<Dfa<'r>, BuildError> {
        Dfa::with_config(Config::new(), prog)
    }

    /// Build a lazy DFA with the given configuration.
    ///
    /// Fails if the program contains zero-width assertions; those need the
    /// NFA simulation's position-aware closure.
    pub fn with_config(
        config: Config,
        prog: &'r Program,
    ) -> Result<Dfa<'r>, BuildError> {
        if prog.has_look() {
            return Err(BuildError::unsupported(
                "programs with zero-width assertions must run on the NFA",
            ));
        }
        let classes = if config.byte_classes {
            prog.byte_class_set().byte_classes()
        } else {
            ByteClasses::singletons()
        };
        let capacity = NonZeroUsize::new(config.cache_capacity)
            .unwrap_or(NonZeroUsize::MIN);
        let len = prog.len();
        let mut dfa = Dfa {
            prog,
            config,
            classes,
            states: Vec::new(),
            cache: LruCache::new(capacity),
            start: 0,
            scratch: BitSet::new(len),
            merge: BitSet::new(len),
            visited: BitSet::new(len),
            stack: Vec::with_capacity(len.min(64)),
            stats: Stats::default(),
        };
        dfa.init_start();
        Ok(dfa)
    }

    /// Search the haystack, returning the position just past the last
    /// match-state visit, i.e. the end of the match the NFA would report.
    pub fn execute(&mut self, haystack: &[u8]) -> Result<Option<usize>, MatchError> {
        search::find(self, haystack)
    }

    /// The work counters accumulated so far.
    pub fn stats(&self) -> Stats {
        self.stats
    }

    /// Approximate heap usage of the state slab, the transition rows and
    /// the lookup cache, in bytes. Grows as searches materialize states;
    /// [`Dfa::reset`] releases it.
    pub fn memory_usage(&self) -> usize {
        let pc_set_bytes = self.merge.words().len() * size_of::<u64>();
        let per_state = size_of::<State>()
            + pc_set_bytes
            + self.classes.alphabet_len() * size_of::<StateID>();
        let per_entry = pc_set_bytes + size_of::<StateID>();
        self.states.len() * per_state + self.cache.len() * per_entry
    }

    /// Throw away every state, lookup entry and counter, then rebuild the
    /// start state. The DFA behaves as if freshly constructed.
    pub fn reset(&mut self) {
        self.states.clear();
        self.cache.clear();
        self.stats = Stats::default();
        self.init_start();
    }

    pub(crate) fn start_id(&self) -> StateID {
        self.start
    }

    pub(crate) fn is_match_state(&self, sid: StateID) -> bool {
        self.states[sid as usize].is_match
    }

    /// Follow the transition out of `sid` on byte `b`, computing and
    /// caching it on first use. `None` means the dead state: no thread
    /// survives this byte and the search can stop.
    pub(crate) fn next_state(
        &mut self,
        sid: StateID,
        b: u8,
    ) -> Result<Option<StateID>, MatchError> {
        let class = usize::from(self.classes.get(b));
        match self.states[sid as usize].trans[class] {
            UNKNOWN => self.compute_transition(sid, b),
            DEAD => Ok(None),
            next => Ok(Some(next)),
        }
    }

    /// Build the transition out of `sid` on byte `b`: collect the
    /// successors of every consuming pc that accepts `b`, epsilon-close
    /// them, then find or materialize the state for the resulting pc-set.
    ///
    /// All bytes in an equivalence class take the same transition, so the
    /// result is recorded under `b`'s class and this runs once per class.
    fn compute_transition(
        &mut self,
        sid: StateID,
        b: u8,
    ) -> Result<Option<StateID>, MatchError> {
        self.stats.transitions_computed += 1;
        let class = usize::from(self.classes.get(b));
        let prog = self.prog;

        self.scratch.clear();
        let state = &self.states[sid as usize];
        let mut at = state.nfa_pcs.first();
        while let Some(pc) = at {
            match prog[pc] {
                Inst::Byte(ref i) if i.byte == b => {
                    self.scratch.insert(i.goto);
                }
                Inst::Ranges(ref i) if i.ranges.contains(b) => {
                    self.scratch.insert(i.goto);
                }
                Inst::Dot(ref i) if b != b'\n' => {
                    self.scratch.insert(i.goto);
                }
                _ => {}
            }
            at = state.nfa_pcs.next_after(pc);
        }

        self.merge.clear();
        let mut at = self.scratch.first();
        while let Some(pc) = at {
            self.close_into_merge(pc);
            at = self.scratch.next_after(pc);
        }

        if self.merge.is_empty() {
            self.set_transition(sid, class, DEAD);
            return Ok(None);
        }
        if let Some(&existing) = self.cache.get(self.merge.words()) {
            self.stats.cache_hits += 1;
            self.set_transition(sid, class, existing);
            return Ok(Some(existing));
        }
        let next = self.add_state();
        if self.states.len() > self.config.state_limit {
            return Err(MatchError::TooManyStates {
                limit: self.config.state_limit,
            });
        }
        self.set_transition(sid, class, next);
        Ok(Some(next))
    }

    /// Depth-first walk of the zero-width instructions reachable from
    /// `start`, OR-ing everything visited into `merge`. `Save` is inert
    /// here (the DFA tracks no captures) and `Look` cannot occur because
    /// such programs are rejected at construction.
    fn close_into_merge(&mut self, start: InstPtr) {
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
                    self.stack.push(i.goto);
                }
                Inst::Match
                | Inst::Byte(_)
                | Inst::Ranges(_)
                | Inst::Dot(_)
                | Inst::Look(_) => {}
            }
        }
        self.merge.union_with(&self.visited);
    }

    /// Materialize a state for the pc-set currently in `merge` and insert
    /// its lookup entry, possibly evicting the least recently used one.
    /// Eviction only drops the lookup entry; the slab keeps the state.
    fn add_state(&mut self) -> StateID {
        let prog = self.prog;
        let id = self.states.len() as StateID;
        debug_assert!(id < DEAD);
        let is_match = self.merge.iter().any(|pc| prog[pc].is_match());
        let trans = vec![UNKNOWN; self.classes.alphabet_len()].into_boxed_slice();
        self.states.push(State {
            nfa_pcs: self.merge.clone(),
            is_match,
            trans,
        });
        self.stats.states_created += 1;
        self.stats.cache_misses += 1;
        let key = self.merge.words().to_vec().into_boxed_slice();
        self.cache.put(key, id);
        trace!(
            "lazy DFA state {} materialized ({} states live, {} lookup entries)",
            id,
            self.states.len(),
            self.cache.len(),
        );
        id
    }

    fn set_transition(&mut self, sid: StateID, class: usize, to: StateID) {
        self.states[sid as usize].trans[class] = to;
    }

    /// The start state always exists and is exempt from the state limit.
    fn init_start(&mut self) {
        let start_pc = if self.config.anchored {
            self.prog.start()
        } else {
            self.prog.start_unanchored()
        };
        self.merge.clear();
        self.close_into_merge(start_pc);
        self.start = self.add_state();
    }
}

impl<'r> fmt::Debug for Dfa<'r> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dfa")
            .field("states", &self.states.len())
            .field("classes", &self.classes.alphabet_len())
            .field("stats", &self.stats)
            .finish()
    }
}
