//! Best-effort translation of ECMA 262 regular expressions into the Rust
//! `regex` syntax.
//!
//! The differences that matter for JSON Schema patterns:
//!   - `\d`, `\w` and their negations are ASCII-only in ECMA 262 but match
//!     Unicode in the `regex` crate;
//!   - `\cX` control escapes are not recognized by the `regex` crate;
//!   - `\b` inside a character class means backspace;
//!   - look-arounds and backreferences are unsupported by the `regex` crate
//!     and are routed to `fancy-regex` instead.
use std::fmt;

/// A compiled pattern with ECMA 262 semantics.
#[derive(Debug)]
pub(crate) enum EcmaRegex {
    Standard(regex::Regex),
    Fancy(fancy_regex::Regex),
}

impl EcmaRegex {
    pub(crate) fn new(pattern: &str) -> Result<EcmaRegex, ()> {
        let (translated, needs_fancy) = translate(pattern)?;
        if needs_fancy {
            return fancy_regex::Regex::new(&translated)
                .map(EcmaRegex::Fancy)
                .map_err(|_| ());
        }
        match regex::Regex::new(&translated) {
            Ok(regex) => Ok(EcmaRegex::Standard(regex)),
            // The backtracking engine accepts a superset of the syntax
            Err(_) => fancy_regex::Regex::new(&translated)
                .map(EcmaRegex::Fancy)
                .map_err(|_| ()),
        }
    }

    pub(crate) fn is_match(&self, text: &str) -> bool {
        match self {
            EcmaRegex::Standard(regex) => regex.is_match(text),
            // A backtracking overflow means the match cannot be established
            EcmaRegex::Fancy(regex) => regex.is_match(text).unwrap_or(false),
        }
    }
}

impl fmt::Display for EcmaRegex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EcmaRegex::Standard(regex) => f.write_str(regex.as_str()),
            EcmaRegex::Fancy(regex) => f.write_str(regex.as_str()),
        }
    }
}

/// Rewrite `pattern` into `regex` syntax, reporting whether the result needs
/// the backtracking engine.
fn translate(pattern: &str) -> Result<(String, bool), ()> {
    let mut output = String::with_capacity(pattern.len());
    let mut needs_fancy = false;
    let mut in_class = false;
    let mut chars = pattern.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => {
                let escaped = chars.next().ok_or(())?;
                match escaped {
                    'd' => output.push_str(if in_class { "0-9" } else { "[0-9]" }),
                    'D' if !in_class => output.push_str("[^0-9]"),
                    'w' => output.push_str(if in_class { "A-Za-z0-9_" } else { "[A-Za-z0-9_]" }),
                    'W' if !in_class => output.push_str("[^A-Za-z0-9_]"),
                    'b' if in_class => output.push_str("\\x08"),
                    'c' => {
                        let letter = chars.next().ok_or(())?;
                        if !letter.is_ascii_alphabetic() {
                            return Err(());
                        }
                        output.push_str(&format!("\\x{:02x}", (letter as u8) % 32));
                    }
                    '1'..='9' => {
                        needs_fancy = true;
                        output.push('\\');
                        output.push(escaped);
                    }
                    _ => {
                        output.push('\\');
                        output.push(escaped);
                    }
                }
            }
            '[' if !in_class => {
                in_class = true;
                output.push(ch);
            }
            ']' if in_class => {
                in_class = false;
                output.push(ch);
            }
            '(' if !in_class => {
                output.push(ch);
                // Look-arounds: (?=, (?!, (?<=, (?<!
                if chars.peek() == Some(&'?') {
                    let mut lookahead = chars.clone();
                    lookahead.next();
                    match lookahead.next() {
                        Some('=' | '!') => needs_fancy = true,
                        Some('<') => {
                            if matches!(lookahead.next(), Some('=' | '!')) {
                                needs_fancy = true;
                            }
                        }
                        _ => {}
                    }
                }
            }
            _ => output.push(ch),
        }
    }
    if in_class {
        return Err(());
    }
    Ok((output, needs_fancy))
}

#[cfg(test)]
mod tests {
    use super::{translate, EcmaRegex};
    use test_case::test_case;

    #[test_case(r"\d+", "[0-9]+"; "digit class plus")]
    #[test_case(r"[\d]", "[0-9]"; "digit class in brackets")]
    #[test_case(r"[a\d]", "[a0-9]"; "digit class alongside literal")]
    #[test_case(r"\w*", "[A-Za-z0-9_]*"; "word class star")]
    #[test_case(r"\D", "[^0-9]"; "negated digit class")]
    #[test_case(r"[\b]", r"[\x08]"; "backspace escape")]
    #[test_case(r"\cJ", r"\x0a"; "control escape")]
    #[test_case(r"^a*$", "^a*$"; "anchors unchanged")]
    fn translation(pattern: &str, expected: &str) {
        let (translated, _) = translate(pattern).expect("Valid pattern");
        assert_eq!(translated, expected);
    }

    #[test_case(r"(?=a)b"; "lookahead")]
    #[test_case(r"(?<!a)b"; "negative lookbehind")]
    #[test_case(r"(a)\1"; "backreference")]
    fn routed_to_fancy(pattern: &str) {
        let (_, needs_fancy) = translate(pattern).expect("Valid pattern");
        assert!(needs_fancy);
        assert!(matches!(
            EcmaRegex::new(pattern).expect("Valid pattern"),
            EcmaRegex::Fancy(_)
        ));
    }

    #[test]
    fn ascii_digit_semantics() {
        let regex = EcmaRegex::new(r"^\d$").expect("Valid pattern");
        assert!(regex.is_match("7"));
        // An Arabic-Indic digit is not an ECMA `\d`
        assert!(!regex.is_match("٣"));
    }

    #[test_case(r"[a"; "unterminated class")]
    #[test_case(r"a\"; "trailing backslash")]
    #[test_case(r"\c1"; "invalid control escape")]
    fn invalid(pattern: &str) {
        assert!(EcmaRegex::new(pattern).is_err());
    }

    #[test]
    fn lookaround_matching() {
        let regex = EcmaRegex::new(r"^(?!forbidden)\w+$").expect("Valid pattern");
        assert!(regex.is_match("allowed"));
        assert!(!regex.is_match("forbidden"));
    }
}
