use regex_machine::{
    exec::{Config, Exec, InputKind},
    Inst, MatchError, Program,
};

use crate::{byte, dot, look, prog, save, split, literal_prog};
use regex_machine::Look;

#[test]
fn is_match_unanchored() {
    crate::setup();
    let prog = literal_prog(b"abc");
    let mut exec = Exec::new(&prog);
    assert_eq!(exec.is_match(b"abc"), Ok(true));
    assert_eq!(exec.is_match(b"zzabczz"), Ok(true));
    assert_eq!(exec.is_match(b"ab"), Ok(false));
    assert_eq!(exec.is_match(b""), Ok(false));
}

#[test]
fn is_match_anchored() {
    let prog = literal_prog(b"a");
    let mut exec = Exec::with_config(Config::new().anchored(true), &prog);
    assert_eq!(exec.is_match(b"ab"), Ok(true));
    assert_eq!(exec.is_match(b"ba"), Ok(false));
}

#[test]
fn find_reports_the_leftmost_span() {
    let prog = literal_prog(b"ab");
    let mut exec = Exec::new(&prog);
    assert_eq!(exec.find(b"ab"), Ok(Some((0, 2))));
    assert_eq!(exec.find(b"zzab"), Ok(Some((2, 4))));
    assert_eq!(exec.find(b"abab"), Ok(Some((0, 2))));
    assert_eq!(exec.find(b"zz"), Ok(None));
}

#[test]
fn find_with_multiline_anchor() {
    // ^a in multi-line mode, searched unanchored over "b\na".
    let prog = prog(vec![
        look(1, Look::StartLine),
        byte(2, b'a'),
        Inst::Match,
    ]);
    let mut exec = Exec::with_config(Config::new().multiline(true), &prog);
    assert_eq!(exec.find(b"b\na"), Ok(Some((2, 3))));

    let mut plain = Exec::new(&prog);
    assert_eq!(plain.find(b"b\na"), Ok(None));
}

#[test]
fn find_empty_match_at_end_of_haystack() {
    // a* matches the empty string, in particular at the very end.
    let prog = prog(vec![split(1, 2), byte(0, b'a'), Inst::Match]);
    let mut exec = Exec::new(&prog);
    assert_eq!(exec.find(b""), Ok(Some((0, 0))));
    assert_eq!(exec.find(b"ba"), Ok(Some((0, 0))));
    assert_eq!(exec.find(b"ab"), Ok(Some((0, 1))));
}

#[test]
fn captures_record_group_spans() {
    // (a+)b with group 0 = whole match, group 1 = the a-run.
    let prog = Program::new(
        vec![
            save(1, 0),
            save(2, 2),
            byte(3, b'a'),
            split(2, 4),
            save(5, 3),
            byte(6, b'b'),
            save(7, 1),
            Inst::Match,
        ],
        0,
        0,
        4,
    )
    .unwrap();
    let mut exec = Exec::new(&prog);
    assert_eq!(exec.captures(b"aab"), Ok(Some((0, 3))));
    assert_eq!(
        exec.slots(),
        &[Some(0), Some(3), Some(0), Some(2)][..]
    );

    // Unanchored: the scan finds the match starting at 2 and the slots
    // are relative to the haystack, not the attempt.
    assert_eq!(exec.captures(b"xxab"), Ok(Some((2, 4))));
    assert_eq!(
        exec.slots(),
        &[Some(2), Some(4), Some(2), Some(3)][..]
    );
}

#[test]
fn captures_misses_leave_no_match() {
    let prog = Program::new(
        vec![save(1, 0), byte(2, b'q'), save(3, 1), Inst::Match],
        0,
        0,
        2,
    )
    .unwrap();
    let mut exec = Exec::new(&prog);
    assert_eq!(exec.captures(b"zz"), Ok(None));
}

#[test]
fn looks_route_to_the_nfa() {
    // a$ must not match "ab"; only the NFA can evaluate the anchor, and
    // the driver must notice that on its own.
    let prog = prog(vec![
        byte(1, b'a'),
        look(2, Look::EndLine),
        Inst::Match,
    ]);
    let mut exec = Exec::with_config(Config::new().anchored(true), &prog);
    assert_eq!(exec.is_match(b"a"), Ok(true));
    assert_eq!(exec.is_match(b"ab"), Ok(false));
}

#[test]
fn dfa_fallback_after_too_many_states() {
    let prog = literal_prog(b"abcdef");
    let mut exec =
        Exec::with_config(Config::new().dfa_state_limit(2), &prog);
    // The DFA trips its cap mid-search; the driver must still answer, and
    // must keep answering on subsequent searches.
    assert_eq!(exec.is_match(b"abcdef"), Ok(true));
    assert_eq!(exec.is_match(b"xxabcdefxx"), Ok(true));
    assert_eq!(exec.is_match(b"abcdx"), Ok(false));
}

#[test]
fn strict_utf8_rejects_bad_haystacks() {
    let prog = prog(vec![dot(1), Inst::Match]);
    let mut strict = Exec::with_config(
        Config::new().input_kind(InputKind::Utf8).strict_utf8(true),
        &prog,
    );
    assert_eq!(
        strict.is_match(b"ab\xFF"),
        Err(MatchError::InvalidUtf8 { offset: 2 })
    );
    assert_eq!(strict.is_match("héllo".as_bytes()), Ok(true));

    // Without strict mode the same haystack is decoded lossily.
    let mut lossy = Exec::with_config(
        Config::new().input_kind(InputKind::Utf8),
        &prog,
    );
    assert_eq!(lossy.is_match(b"ab\xFF"), Ok(true));
}

#[test]
fn utf8_kind_finds_codepoint_spans() {
    // A single dot over "☃a" must cover the snowman's three bytes.
    let prog = prog(vec![dot(1), Inst::Match]);
    let mut exec = Exec::with_config(
        Config::new().input_kind(InputKind::Utf8).anchored(true),
        &prog,
    );
    assert_eq!(exec.find("☃a".as_bytes()), Ok(Some((0, 3))));
}

#[test]
fn utf8_scan_restarts_on_codepoint_boundaries() {
    // Searching for 'a' after a multi-byte codepoint: the scan must not
    // attempt a start position inside the snowman.
    let prog = literal_prog(b"a");
    let mut exec =
        Exec::with_config(Config::new().input_kind(InputKind::Utf8), &prog);
    assert_eq!(exec.find("☃a".as_bytes()), Ok(Some((3, 4))));
}

#[test]
fn drivers_share_one_program() {
    let prog = literal_prog(b"ping");
    let handle = std::thread::scope(|scope| {
        let a = scope.spawn(|| {
            let mut exec = Exec::new(&prog);
            exec.is_match(b"ping pong")
        });
        let b = scope.spawn(|| {
            let mut exec = Exec::new(&prog);
            exec.is_match(b"pong pong")
        });
        (a.join().unwrap(), b.join().unwrap())
    });
    assert_eq!(handle, (Ok(true), Ok(false)));
}
