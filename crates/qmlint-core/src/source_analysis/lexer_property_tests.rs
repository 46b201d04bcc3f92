// Copyright 2026 The qmlint Authors
// SPDX-License-Identifier: Apache-2.0

//! Property-based tests for the lexer.
//!
//! The lexer must terminate and never panic on arbitrary input, and the
//! positions it reports must be non-decreasing in source order.

use proptest::prelude::*;

use super::{lex_with_eof, Position};

proptest! {
    #[test]
    fn lexer_never_panics(source in "\\PC*") {
        let _ = lex_with_eof(&source);
    }

    #[test]
    fn lexer_terminates_with_eof(source in "\\PC{0,200}") {
        let tokens = lex_with_eof(&source);
        prop_assert!(tokens.last().is_some_and(|t| t.kind().is_eof()));
    }

    #[test]
    fn token_positions_are_non_decreasing(source in "[ -~\\n]{0,200}") {
        let tokens = lex_with_eof(&source);
        let mut previous = Position::new(0, 0);
        for token in &tokens {
            prop_assert!(token.position() >= previous,
                "position went backwards: {} after {}", token.position(), previous);
            previous = token.position();
        }
    }

    #[test]
    fn latin1_input_round_trips_through_lexer(bytes in proptest::collection::vec(any::<u8>(), 0..200)) {
        // The analyzer decodes input as Latin-1; every byte maps to a char.
        let source: String = bytes.iter().map(|&b| b as char).collect();
        let _ = lex_with_eof(&source);
    }
}
