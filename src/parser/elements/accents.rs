//! Accent commands (spec.md §4.4): `` ` '' ^ ~ " . = c v u H `` applied to the
//! first character of the following text.
//!
//! Open question carried from spec.md §9: single-letter accents with a
//! missing argument fall back to the literal accent character rather than
//! failing.

use crate::ast::Inline;

/// Look up the accented form of `base` for the given accent command name.
/// Returns `None` if this accent/base combination has no mapping (the
/// caller then leaves the character untouched).
fn accented_char(accent: &str, base: char) -> Option<char> {
    let table: &[(&str, char, char)] = &[
        ("`", 'a', 'à'), ("`", 'e', 'è'), ("`", 'i', 'ì'), ("`", 'o', 'ò'), ("`", 'u', 'ù'),
        ("'", 'a', 'á'), ("'", 'e', 'é'), ("'", 'i', 'í'), ("'", 'o', 'ó'), ("'", 'u', 'ú'),
        ("'", 'y', 'ý'), ("'", 'n', 'ń'), ("'", 'c', 'ć'), ("'", 's', 'ś'), ("'", 'z', 'ź'),
        ("^", 'a', 'â'), ("^", 'e', 'ê'), ("^", 'i', 'î'), ("^", 'o', 'ô'), ("^", 'u', 'û'),
        ("~", 'a', 'ã'), ("~", 'n', 'ñ'), ("~", 'o', 'õ'),
        ("\"", 'a', 'ä'), ("\"", 'e', 'ë'), ("\"", 'i', 'ï'), ("\"", 'o', 'ö'), ("\"", 'u', 'ü'),
        (".", 'z', 'ż'), (".", 'a', 'ȧ'),
        ("=", 'a', 'ā'), ("=", 'e', 'ē'), ("=", 'i', 'ī'), ("=", 'o', 'ō'), ("=", 'u', 'ū'),
        ("c", 'c', 'ç'), ("c", 's', 'ş'),
        ("v", 'c', 'č'), ("v", 's', 'š'), ("v", 'z', 'ž'), ("v", 'e', 'ě'),
        ("u", 'a', 'ă'), ("u", 'g', 'ğ'),
        ("H", 'o', 'ő'), ("H", 'u', 'ű'),
    ];
    table
        .iter()
        .find(|(a, b, _)| *a == accent && *b == base)
        .map(|(_, _, acc)| *acc)
}

pub const ACCENT_COMMANDS: &[&str] =
    &["`", "'", "^", "~", "\"", ".", "=", "c", "v", "u", "H"];

/// Apply an accent to `target`: if it's a `Str` whose first character has a
/// mapping, replace that character; otherwise return it unchanged.
pub fn apply_accent(accent: &str, target: Inline) -> Inline {
    match target {
        Inline::Str(s) => {
            let mut chars = s.chars();
            match chars.next() {
                Some(first) => match accented_char(accent, first) {
                    Some(replaced) => {
                        let mut out = String::new();
                        out.push(replaced);
                        out.push_str(chars.as_str());
                        Inline::Str(out)
                    }
                    None => Inline::Str(s),
                },
                None => Inline::Str(s),
            }
        }
        other => other,
    }
}

/// When the accent command's argument is missing (end of group/input), the
/// literal accent character is emitted instead (spec.md §9 open question).
pub fn literal_fallback(accent: &str) -> Inline {
    Inline::Str(accent.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acute_e_becomes_e_acute() {
        let result = apply_accent("'", Inline::Str("elan".to_string()));
        assert_eq!(result, Inline::Str("élan".to_string()));
    }

    #[test]
    fn unmapped_combo_is_unchanged() {
        let result = apply_accent("'", Inline::Str("xyz".to_string()));
        assert_eq!(result, Inline::Str("xyz".to_string()));
    }

    #[test]
    fn non_str_target_is_unchanged() {
        let result = apply_accent("'", Inline::Space);
        assert_eq!(result, Inline::Space);
    }
}
