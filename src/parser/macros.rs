//! The macro engine (spec.md §4.3): inline expansion of user-defined macros
//! during tokenized parsing, plus the `\newcommand`/`\newenvironment`/`\def`
//! family that populates the macro table.

use crate::diagnostics::LogMessage;
use crate::options::Extension;
use crate::parser::primitives::TokenStream;
use crate::parser::state::{ArgSpec, Macro, ParserState, MAX_MACRO_EXPANSION_DEPTH};
use crate::tokenizer::{Position, Token, TokenKind};

fn is_hspace_token(t: &Token) -> bool {
    t.is_spaces()
}

fn skip_hspace_raw(stream: &mut TokenStream) {
    while matches!(stream.peek(), Some(t) if is_hspace_token(t)) {
        stream.pop();
    }
}

fn lookup_name(stream: &TokenStream) -> Option<(String, usize)> {
    // `\begin{name}` / `\end{name}` consume three tokens: ControlSeq("begin"
    // or "end"), `{`, Word(name), `}`. `\name` consumes one.
    match stream.peek()?.kind.clone() {
        TokenKind::ControlSeq(cs) if cs == "begin" || cs == "end" => {
            if !matches!(stream.peek_at(1), Some(t) if t.is_symbol('{')) {
                return None;
            }
            let name_tok = stream.peek_at(2)?;
            let name = match &name_tok.kind {
                TokenKind::Word(w) => w.clone(),
                _ => return None,
            };
            if !matches!(stream.peek_at(3), Some(t) if t.is_symbol('}')) {
                return None;
            }
            let key = if cs == "end" {
                format!("end{}", name)
            } else {
                name
            };
            Some((key, 4))
        }
        TokenKind::ControlSeq(cs) => Some((cs, 1)),
        _ => None,
    }
}

/// Raw (non-macro-expanding) token pop, used internally by the engine where
/// recursive expansion must not happen mid-consumption.
fn raw_pop(stream: &mut TokenStream) -> Option<Token> {
    stream.pop()
}

/// Attempt macro expansion at the head of `stream`, re-running expansion on
/// the freshly substituted head until it is no longer a macro invocation
/// (spec.md §4.3: "Prepend result to input stream and re-run expansion").
/// Bounded by [`MAX_MACRO_EXPANSION_DEPTH`] *per call* — this bounds a
/// single runaway expansion chain (e.g. `\newcommand{\a}{\a}`) without
/// penalizing documents that simply invoke many unrelated macros over their
/// lifetime. Returns true if at least one expansion happened.
pub fn try_expand_head(stream: &mut TokenStream, state: &mut ParserState) -> bool {
    if state.verbatim || state.macro_loop.is_some() {
        return false;
    }
    if !state.options.extensions.enabled(Extension::LatexMacros) {
        return false;
    }
    let mut depth = 0u32;
    let mut expanded_any = false;
    loop {
        let Some((key, consume)) = lookup_name(stream) else {
            break;
        };
        let Some(mac) = state.macros.get(&key).cloned() else {
            break;
        };
        let pos = stream.peek().map(|t| t.pos).unwrap_or(Position::start());

        depth += 1;
        if depth > MAX_MACRO_EXPANSION_DEPTH {
            state.macro_loop = Some((key, pos));
            break;
        }

        for _ in 0..consume {
            raw_pop(stream);
        }

        let replacement = match mac {
            Macro::FixedArity {
                arity,
                default,
                body,
            } => expand_fixed_arity(stream, state, arity, default, &body),
            Macro::Pattern { specs, body } => expand_pattern(stream, state, &specs, &body),
        };

        let rebased: Vec<Token> = replacement.into_iter().map(|t| t.rebased(pos)).collect();
        stream.push_front_many(rebased);
        expanded_any = true;
    }
    expanded_any
}

fn consume_braced_or_single(stream: &mut TokenStream, state: &mut ParserState) -> Vec<Token> {
    skip_hspace_raw(stream);
    if matches!(stream.peek(), Some(t) if t.is_symbol('{')) {
        crate::parser::primitives::braced(stream, state).unwrap_or_default()
    } else if let Some(t) = raw_pop(stream) {
        vec![t]
    } else {
        Vec::new()
    }
}

fn expand_fixed_arity(
    stream: &mut TokenStream,
    state: &mut ParserState,
    arity: u32,
    default: Option<Vec<Token>>,
    body: &[Token],
) -> Vec<Token> {
    let mut args: Vec<Vec<Token>> = Vec::new();
    let mut remaining = arity;
    if let Some(default) = default {
        skip_hspace_raw(stream);
        let first = crate::parser::primitives::bracketed(stream, state).unwrap_or(default);
        args.push(first);
        remaining = remaining.saturating_sub(1);
    }
    for _ in 0..remaining {
        args.push(consume_braced_or_single(stream, state));
    }
    substitute_args(body, &args)
}

fn expand_pattern(
    stream: &mut TokenStream,
    state: &mut ParserState,
    specs: &[ArgSpec],
    body: &[Token],
) -> Vec<Token> {
    let mut args: Vec<Vec<Token>> = Vec::new();
    for spec in specs {
        let arg = match spec {
            ArgSpec::Naked => consume_braced_or_single(stream, state),
            ArgSpec::Braced => consume_braced_or_single(stream, state),
            ArgSpec::Bracketed => {
                skip_hspace_raw(stream);
                crate::parser::primitives::bracketed(stream, state).unwrap_or_default()
            }
            ArgSpec::SymbolSuffixed(c) => {
                let mut collected = Vec::new();
                while let Some(t) = stream.peek() {
                    if t.is_symbol(*c) {
                        raw_pop(stream);
                        break;
                    }
                    collected.push(raw_pop(stream).unwrap());
                }
                collected
            }
            ArgSpec::CtrlSeqSuffixed(name) => {
                let mut collected = Vec::new();
                while let Some(t) = stream.peek() {
                    if t.is_control_seq(name) {
                        raw_pop(stream);
                        break;
                    }
                    collected.push(raw_pop(stream).unwrap());
                }
                collected
            }
        };
        args.push(arg);
    }
    substitute_args(body, &args)
}

fn substitute_args(body: &[Token], args: &[Vec<Token>]) -> Vec<Token> {
    let mut out = Vec::with_capacity(body.len());
    for t in body {
        if let TokenKind::Arg(n) = t.kind {
            if let Some(arg) = args.get((n as usize).wrapping_sub(1)) {
                out.extend(arg.iter().cloned());
                continue;
            }
        }
        out.push(t.clone());
    }
    out
}

// ---------------------------------------------------------------------
// Definitions: \newcommand family, \newenvironment family, \def.
// ---------------------------------------------------------------------

/// True if the head of `stream` is a macro-definition command this engine
/// handles; used by the block engine to route to [`parse_definition`].
pub fn is_definition_command(stream: &TokenStream) -> bool {
    const NAMES: &[&str] = &[
        "newcommand",
        "renewcommand",
        "providecommand",
        "newenvironment",
        "renewenvironment",
        "provideenvironment",
        "def",
    ];
    matches!(stream.peek(), Some(t) if matches!(&t.kind, TokenKind::ControlSeq(cs) if NAMES.contains(&cs.as_str())))
}

fn read_command_name(stream: &mut TokenStream, state: &mut ParserState) -> Option<String> {
    skip_hspace_raw(stream);
    if matches!(stream.peek(), Some(t) if t.is_symbol('{')) {
        let inner = crate::parser::primitives::braced(stream, state)?;
        name_from_tokens(&inner)
    } else {
        match raw_pop(stream)?.kind {
            TokenKind::ControlSeq(name) => Some(name),
            TokenKind::Word(w) => Some(w),
            _ => None,
        }
    }
}

fn name_from_tokens(tokens: &[Token]) -> Option<String> {
    for t in tokens {
        match &t.kind {
            TokenKind::ControlSeq(name) => return Some(name.clone()),
            TokenKind::Word(w) => return Some(w.clone()),
            _ => continue,
        }
    }
    None
}

fn read_arity(stream: &mut TokenStream, state: &mut ParserState) -> u32 {
    skip_hspace_raw(stream);
    match crate::parser::primitives::bracketed(stream, state) {
        Some(toks) => {
            let digits: String = toks
                .iter()
                .filter_map(|t| match &t.kind {
                    TokenKind::Word(w) => Some(w.clone()),
                    _ => None,
                })
                .collect();
            digits.parse().unwrap_or(0)
        }
        None => 0,
    }
}

/// Parse and, if `latex_macros` is enabled, install a macro or environment
/// definition at the head of `stream`. Always consumes the definition's
/// tokens regardless of whether the extension is enabled (spec.md §4.3:
/// "definitions are still parsed but not installed").
pub fn parse_definition(stream: &mut TokenStream, state: &mut ParserState) {
    let Some(t) = stream.peek().cloned() else {
        return;
    };
    let TokenKind::ControlSeq(cs) = t.kind.clone() else {
        return;
    };
    raw_pop(stream);

    match cs.as_str() {
        "newcommand" | "renewcommand" | "providecommand" => {
            // Optional `*`.
            if matches!(stream.peek(), Some(t) if t.is_symbol('*')) {
                raw_pop(stream);
            }
            let Some(name) = read_command_name(stream, state) else {
                return;
            };
            let arity = read_arity(stream, state);
            skip_hspace_raw(stream);
            let default = crate::parser::primitives::bracketed(stream, state);
            let body = consume_braced_or_single(stream, state);
            install_fixed_arity(state, &cs, name, arity, default, body, t.pos);
        }
        "newenvironment" | "renewenvironment" | "provideenvironment" => {
            let Some(name) = read_command_name(stream, state) else {
                return;
            };
            let arity = read_arity(stream, state);
            skip_hspace_raw(stream);
            let default = crate::parser::primitives::bracketed(stream, state);
            let begin_body = consume_braced_or_single(stream, state);
            skip_hspace_raw(stream);
            let end_body = if matches!(stream.peek(), Some(t) if t.is_symbol('{')) {
                consume_braced_or_single(stream, state)
            } else {
                Vec::new()
            };
            install_fixed_arity(
                state,
                &cs,
                name.clone(),
                arity,
                default,
                begin_body,
                t.pos,
            );
            install_fixed_arity(state, &cs, format!("end{}", name), 0, None, end_body, t.pos);
        }
        "def" => {
            let Some(name) = read_command_name(stream, state) else {
                return;
            };
            let specs = read_def_argspecs(stream);
            let body = consume_braced_or_single(stream, state);
            if state.options.extensions.enabled(Extension::LatexMacros) {
                state
                    .macros
                    .insert(name, Macro::Pattern { specs, body });
            }
        }
        _ => {}
    }
}

fn install_fixed_arity(
    state: &mut ParserState,
    defining_command: &str,
    name: String,
    arity: u32,
    default: Option<Vec<Token>>,
    body: Vec<Token>,
    pos: Position,
) {
    if !state.options.extensions.enabled(Extension::LatexMacros) {
        return;
    }
    if defining_command == "newcommand" && state.macros.contains_key(&name) {
        state.log(LogMessage::MacroAlreadyDefined {
            name: name.clone(),
            pos,
        });
    }
    if defining_command.starts_with("provide") && state.macros.contains_key(&name) {
        return;
    }
    state.macros.insert(
        name,
        Macro::FixedArity {
            arity,
            default,
            body,
        },
    );
}

/// Read `\def`'s argument-spec pattern between the name and the replacement
/// body: a run of `#n` placeholders interleaved with literal delimiter
/// tokens (each literal run before a `#n` becomes a `SymbolSuffixed`/
/// `CtrlSeqSuffixed` spec on the *previous* argument; a bare `#n` directly
/// followed by another `#n` or the body is `Naked`).
fn read_def_argspecs(stream: &mut TokenStream) -> Vec<ArgSpec> {
    let mut specs = Vec::new();
    loop {
        match stream.peek() {
            Some(t) if t.is_symbol('{') => break,
            Some(t) if matches!(t.kind, TokenKind::Arg(_)) => {
                raw_pop(stream);
                // Look ahead: is the argument immediately delimited by a
                // literal symbol or control sequence before the next `#`/`{`?
                let mut delim: Option<Token> = None;
                if let Some(next) = stream.peek() {
                    if !next.is_symbol('{') && !matches!(next.kind, TokenKind::Arg(_)) {
                        delim = Some(next.clone());
                    }
                }
                match delim {
                    Some(t) if t.is_symbol('{') => unreachable!(),
                    Some(t) => {
                        raw_pop(stream);
                        match t.kind {
                            TokenKind::ControlSeq(name) => {
                                specs.push(ArgSpec::CtrlSeqSuffixed(name))
                            }
                            TokenKind::Symbol(c) => specs.push(ArgSpec::SymbolSuffixed(c)),
                            _ => specs.push(ArgSpec::Naked),
                        }
                    }
                    None => specs.push(ArgSpec::Naked),
                }
            }
            Some(_) => {
                // Leading literal token before any `#n` is consumed and
                // ignored here (rare in practice); advance to avoid looping.
                raw_pop(stream);
            }
            None => break,
        }
    }
    specs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::ReaderOptions;
    use crate::tokenizer::tokenize;

    fn new_state() -> ParserState {
        ParserState::new(ReaderOptions::default())
    }

    fn raw_of(stream: &TokenStream) -> String {
        stream.peek().map(|t| t.raw.clone()).unwrap_or_default()
    }

    #[test]
    fn empty_macro_table_is_a_no_op() {
        let mut state = new_state();
        let mut stream = TokenStream::new(tokenize("hello \\emph{world}"));
        let before = raw_of(&stream);
        assert!(!try_expand_head(&mut stream, &mut state));
        assert_eq!(raw_of(&stream), before);
    }

    #[test]
    fn newcommand_fixed_arity_expands() {
        let mut state = new_state();
        let mut stream = TokenStream::new(tokenize("\\newcommand{\\x}[1]{**#1**}\\x{hi}"));
        parse_definition(&mut stream, &mut state);
        assert!(try_expand_head(&mut stream, &mut state));
        let rebuilt: String = std::iter::from_fn(|| stream.pop()).map(|t| t.raw).collect();
        assert_eq!(rebuilt, "**hi**");
    }

    #[test]
    fn def_with_naked_argument_expands() {
        let mut state = new_state();
        let mut stream = TokenStream::new(tokenize("\\def\\greet#1{Hi #1!}\\greet{world}"));
        parse_definition(&mut stream, &mut state);
        assert!(try_expand_head(&mut stream, &mut state));
        let rebuilt: String = std::iter::from_fn(|| stream.pop()).map(|t| t.raw).collect();
        assert_eq!(rebuilt, "Hi world!");
    }

    #[test]
    fn self_referential_macro_sets_macro_loop() {
        let mut state = new_state();
        let mut stream = TokenStream::new(tokenize("\\newcommand{\\a}{\\a}\\a"));
        parse_definition(&mut stream, &mut state);
        try_expand_head(&mut stream, &mut state);
        assert!(state.macro_loop.is_some());
    }
}
