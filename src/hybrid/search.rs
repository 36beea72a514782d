use crate::error::MatchError;
use crate::hybrid::dfa::Dfa;

/// Byte-at-a-time search loop.
///
/// Tracks the position just past the most recent visit to a match state,
/// which is exactly the match end the NFA simulation reports: the NFA
/// re-records its match every time a closure reaches `Match`, so its final
/// answer is also the *last* match position. Keeping the two engines in
/// agreement is what lets the driver pick either one.
///
/// A dead transition means no NFA thread survives the byte, so the search
/// stops early with whatever match was already seen.
pub(crate) fn find(
    dfa: &mut Dfa<'_>,
    haystack: &[u8],
) -> Result<Option<usize>, MatchError> {
    let mut sid = dfa.start_id();
    // An empty pattern (or a program whose entry closure reaches `Match`
    // by zero-width steps alone) matches before any byte is read.
    let mut last_match = if dfa.is_match_state(sid) { Some(0) } else { None };
    for (at, &b) in haystack.iter().enumerate() {
        sid = match dfa.next_state(sid, b)? {
            None => return Ok(last_match),
            Some(next) => next,
        };
        if dfa.is_match_state(sid) {
            last_match = Some(at + 1);
        }
    }
    Ok(last_match)
}
