/*!
A lazy DFA, also known as a hybrid NFA/DFA.

Instead of determinizing the whole program up front, states are built on
demand during a search: each DFA state is the epsilon-closed set of NFA pcs
the simulation would be in, and each transition is computed the first time
its (state, byte class) pair is seen, then remembered. On cache-friendly
patterns this gives DFA throughput while paying construction cost
proportional only to the states actually visited.

Two guards keep pathological patterns from exploding memory: transitions are
keyed by byte equivalence class rather than by byte, and the number of
states is capped. Hitting the cap aborts the search with
[`MatchError::TooManyStates`](crate::MatchError::TooManyStates), which the
execution driver treats as "rerun on the NFA".

This engine answers "did it match, and where did the match end". It knows
nothing of captures, and it refuses programs with zero-width assertions;
both are the NFA simulation's job.
*/

pub use self::dfa::{Config, Dfa, Stats};

mod dfa;
mod search;
