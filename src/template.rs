//! `${name}` placeholder substitution in script strings
//!
//! Tokens are resolved against the original string in a single
//! left-to-right scan, so a replacement can never shift a later match.
//! A token whose option was not supplied is removed along with exactly
//! one preceding space, keeping scripts like `echo hi ${name}` tidy when
//! `name` is absent.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;

use crate::registrar::OptionValue;

/// Matches `${identifier}` with at least one word character; `${}` is
/// deliberately not a token.
fn token_pattern() -> &'static Regex {
    static TOKEN: OnceLock<Regex> = OnceLock::new();
    TOKEN.get_or_init(|| Regex::new(r"\$\{(\w+)\}").expect("static pattern compiles"))
}

/// Fill `${name}` tokens in `script` with the supplied option values.
#[must_use]
pub fn fill(script: &str, values: &HashMap<String, OptionValue>) -> String {
    let mut out = String::with_capacity(script.len());
    let mut last = 0;

    for token in token_pattern().find_iter(script) {
        let name = &script[token.start() + 2..token.end() - 1];
        match values.get(name) {
            Some(value) => {
                out.push_str(&script[last..token.start()]);
                out.push_str(&value.to_string());
            }
            None => {
                // Drop the token and one leading space, if any
                let mut head_end = token.start();
                if script[last..token.start()].ends_with(' ') {
                    head_end -= 1;
                }
                out.push_str(&script[last..head_end]);
            }
        }
        last = token.end();
    }

    out.push_str(&script[last..]);
    out
}
