use proptest::prelude::*;

use regex_machine::{
    hybrid::{Config, Dfa},
    utf8, ByteInput, Input, Inst, Look, PikeVm, Program, Utf8Input,
};

use crate::{byte, split};

proptest! {
    /// Encoding any scalar value and decoding it again is the identity,
    /// and the reported length is the encoded length.
    #[test]
    fn utf8_round_trip(ch in any::<char>()) {
        let mut buf = [0u8; 4];
        let enc = ch.encode_utf8(&mut buf);
        prop_assert_eq!(utf8::decode(enc.as_bytes()), Ok((ch, enc.len())));
    }

    /// Walking arbitrary bytes: decoding errors advance exactly one byte,
    /// successes advance by the decoded length, and the walk always makes
    /// progress until the end.
    #[test]
    fn utf8_walk_advances_errors_by_one(bytes in proptest::collection::vec(any::<u8>(), 0..64)) {
        let mut input = Utf8Input::new(&bytes);
        while !input.is_consumed() {
            let at = input.pos();
            let expected = match utf8::decode(&bytes[at..]) {
                Ok((_, len)) => len,
                Err(_) => 1,
            };
            input.advance();
            prop_assert_eq!(input.pos(), at + expected);
        }
        prop_assert_eq!(input.pos(), bytes.len());
    }

    /// `$` holds exactly at the end of the haystack, or just before a
    /// line feed in multi-line mode.
    #[test]
    fn end_line_definition(
        bytes in proptest::collection::vec(prop_oneof![Just(b'a'), Just(b'\n'), any::<u8>()], 0..32),
        multiline in any::<bool>(),
    ) {
        let mut input = ByteInput::new(&bytes).multiline(multiline);
        for pos in 0..=bytes.len() {
            input.set_pos(pos);
            let expected = pos == bytes.len()
                || (multiline && bytes[pos] == b'\n');
            prop_assert_eq!(input.is_empty_match(Look::EndLine), expected);
        }
    }

    /// `^` holds at position zero, or just after a line feed in
    /// multi-line mode.
    #[test]
    fn start_line_definition(
        bytes in proptest::collection::vec(prop_oneof![Just(b'a'), Just(b'\n'), any::<u8>()], 0..32),
        multiline in any::<bool>(),
    ) {
        let mut input = ByteInput::new(&bytes).multiline(multiline);
        for pos in 0..=bytes.len() {
            input.set_pos(pos);
            let expected = pos == 0
                || (multiline && bytes[pos - 1] == b'\n');
            prop_assert_eq!(input.is_empty_match(Look::StartLine), expected);
        }
    }

    /// At every position, exactly one of `\b` and `\B` holds.
    #[test]
    fn word_boundary_duality(bytes in proptest::collection::vec(any::<u8>(), 0..32)) {
        let mut input = ByteInput::new(&bytes);
        for pos in 0..=bytes.len() {
            input.set_pos(pos);
            let b = input.is_empty_match(Look::WordBoundaryAscii);
            let nb = input.is_empty_match(Look::WordBoundaryAsciiNegate);
            prop_assert!(b ^ nb);
        }
    }

    /// The NFA and the lazy DFA agree on "matched" and on the match end
    /// for alternations of random literals over a tiny alphabet.
    #[test]
    fn engines_agree_on_random_alternations(
        lit1 in proptest::collection::vec(prop_oneof![Just(b'a'), Just(b'b')], 1..5),
        lit2 in proptest::collection::vec(prop_oneof![Just(b'a'), Just(b'b')], 1..5),
        haystack in proptest::collection::vec(prop_oneof![Just(b'a'), Just(b'b'), Just(b'c')], 0..12),
    ) {
        let prog = alternation(&lit1, &lit2);
        let mut vm = PikeVm::new(&prog);
        let mut dfa = Dfa::with_config(Config::new().anchored(true), &prog).unwrap();

        let mut input = ByteInput::new(&haystack);
        let nfa_matched = vm.execute(&mut input, prog.start(), None);
        let dfa_end = dfa.execute(&haystack).unwrap();
        prop_assert_eq!(nfa_matched, dfa_end.is_some());
        prop_assert_eq!(vm.match_end(), dfa_end);
    }
}

/// Compile `lit1|lit2` by hand: a split into two byte chains.
fn alternation(lit1: &[u8], lit2: &[u8]) -> Program {
    let mut insts = vec![split(1, 1 + lit1.len() + 1)];
    // First branch: bytes then a jump over the second branch.
    for (i, &b) in lit1.iter().enumerate() {
        insts.push(byte(1 + i + 1, b));
    }
    let second_start = insts.len() + 1;
    insts.push(crate::jump(second_start + lit2.len()));
    for (i, &b) in lit2.iter().enumerate() {
        insts.push(byte(second_start + i + 1, b));
    }
    insts.push(Inst::Match);
    Program::new(insts, 0, 0, 0).unwrap()
}
