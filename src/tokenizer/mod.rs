//! Tokenizer: character stream to positioned [`token::Token`]s.
//!
//! - [`lexer`] — the main scanning loop (spec.md §4.1).
//! - [`token`] — token kinds and source positions.

pub mod lexer;
pub mod token;

pub use lexer::tokenize;
pub use token::{Position, Token, TokenKind};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_concatenation() {
        let inputs = [
            "hello \\emph{world}",
            "100% sure\\\\\nnext line",
            "\\def\\x#1{#1}",
            "a^^41b",
        ];
        for input in inputs {
            let normalized = input.replace("\r\n", "\n");
            let tokens = tokenize(input);
            let rebuilt: String = tokens.iter().map(|t| t.raw.as_str()).collect();
            assert_eq!(rebuilt, normalized, "round trip failed for {:?}", input);
        }
    }

    #[test]
    fn positions_strictly_increase_or_hold_for_empty() {
        let tokens = tokenize("ab\ncd");
        let mut last = (0usize, 0usize);
        for t in &tokens {
            let cur = (t.pos.line, t.pos.col);
            assert!(cur >= last);
            last = cur;
        }
    }

    #[test]
    fn word_and_spaces() {
        let tokens = tokenize("hello world");
        assert!(matches!(&tokens[0].kind, TokenKind::Word(w) if w == "hello"));
        assert!(tokens[1].is_spaces());
        assert!(matches!(&tokens[2].kind, TokenKind::Word(w) if w == "world"));
    }

    #[test]
    fn control_seq_with_trailing_spaces() {
        let tokens = tokenize("\\emph   {x}");
        assert!(tokens[0].is_control_seq("emph"));
        assert_eq!(tokens[0].raw, "\\emph   ");
    }

    #[test]
    fn single_char_control_seq() {
        let tokens = tokenize("\\%ok");
        assert!(tokens[0].is_control_seq("%"));
    }

    #[test]
    fn comment_excludes_newline() {
        let tokens = tokenize("x %comment\ny");
        assert!(matches!(&tokens[1].kind, TokenKind::Comment(c) if c == "%comment"));
        assert!(tokens[2].is_newline());
    }

    #[test]
    fn arg_placeholder() {
        let tokens = tokenize("#1#23");
        assert!(matches!(tokens[0].kind, TokenKind::Arg(1)));
        assert!(matches!(tokens[1].kind, TokenKind::Arg(23)));
    }

    #[test]
    fn dollar_dollar_is_one_word_token() {
        let tokens = tokenize("$$x$$");
        assert!(matches!(&tokens[0].kind, TokenKind::Word(w) if w == "$$"));
    }

    #[test]
    fn esc_sequences_decode() {
        let tokens = tokenize("^^41");
        assert_eq!(tokens[0].decode_escape(), Some('A'));
        let tokens2 = tokenize("^^\u{01}");
        // '^^' + char below 0x80 not lowerhex -> Esc1
        assert!(matches!(tokens2[0].kind, TokenKind::Esc1(_)));
    }
}
