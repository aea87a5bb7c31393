//! Token rewriting ahead of the short-option grammar
//!
//! Two passes: [`rewrite_long`] classifies every token and maps long options
//! to their short form, then [`tag_operands`] binds values to the flags that
//! consume them and marks bare opacities with an explicit `-o`.

use super::ArgsError;
use crate::core::request::is_opacity_token;

/// Long option name, short equivalent, whether it takes a value
const LONG_OPTIONS: &[(&str, char, bool)] = &[
    ("help", 'h', false),
    ("opacity", 'o', true),
    ("get", 'g', false),
    ("delete", 'd', false),
    ("toggle", 't', false),
    ("reset", 'r', false),
    ("select", 's', false),
    ("current", 'c', false),
    ("name", 'n', true),
    ("window", 'w', true),
];

/// Short flags that consume the following token
const VALUE_FLAGS: [char; 3] = ['o', 'w', 'n'];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Short flag or bundle, e.g. `-c` or `-cw`
    Flag(String),
    /// Already bound to the option before it
    Value(String),
    /// Anything else, including signed numbers like `-5`
    Word(String),
}

impl Token {
    fn into_text(self) -> String {
        match self {
            Token::Flag(s) | Token::Value(s) | Token::Word(s) => s,
        }
    }
}

/// First pass: classify tokens and rewrite `--long[=VALUE]` to `-x [VALUE]`
pub fn rewrite_long(tokens: &[String]) -> Result<Vec<Token>, ArgsError> {
    let mut out = Vec::with_capacity(tokens.len());
    let mut iter = tokens.iter();

    while let Some(token) = iter.next() {
        if let Some(long) = token.strip_prefix("--") {
            let (name, inline) = match long.split_once('=') {
                Some((name, value)) => (name, Some(value)),
                None => (long, None),
            };

            let Some(&(_, short, takes_value)) = LONG_OPTIONS.iter().find(|(n, ..)| *n == name) else {
                return Err(ArgsError::IllegalOption {
                    option: token.clone(),
                });
            };

            out.push(Token::Flag(format!("-{short}")));
            match (takes_value, inline) {
                (true, Some(value)) => out.push(Token::Value(value.to_string())),
                (true, None) => {
                    let value = iter.next().ok_or_else(|| ArgsError::MissingValue {
                        option: format!("--{name}"),
                    })?;
                    out.push(Token::Value(value.clone()));
                }
                (false, Some(_)) => {
                    return Err(ArgsError::UnexpectedValue {
                        option: format!("--{name}"),
                    });
                }
                (false, None) => {}
            }
        } else if token.len() > 1 && token.starts_with('-') && !is_opacity_token(token) {
            out.push(Token::Flag(token.clone()));
        } else {
            out.push(Token::Word(token.clone()));
        }
    }

    Ok(out)
}

/// Whether a short flag bundle ends in a flag that consumes the next token
///
/// `-cw` does, `-wfoo` does not (its value is attached).
fn bundle_wants_value(flag: &str) -> bool {
    let body = &flag[1..];
    match body.char_indices().find(|(_, c)| VALUE_FLAGS.contains(c)) {
        Some((i, c)) => i + c.len_utf8() == body.len(),
        None => false,
    }
}

/// Whether help was asked for anywhere, standalone or inside a bundle
///
/// Values of value-taking options are skipped, so `-n -h` names a window
/// `-h`. Runs before any other validation.
pub fn requests_help(tokens: &[String]) -> bool {
    let mut iter = tokens.iter();

    while let Some(token) = iter.next() {
        if let Some(long) = token.strip_prefix("--") {
            if long == "help" {
                return true;
            }
            let takes_value = LONG_OPTIONS
                .iter()
                .any(|&(name, _, takes_value)| takes_value && name == long);
            if takes_value {
                iter.next();
            }
        } else if token.len() > 1 && token.starts_with('-') && !is_opacity_token(token) {
            for c in token[1..].chars() {
                if c == 'h' {
                    return true;
                }
                if VALUE_FLAGS.contains(&c) {
                    break;
                }
            }
            if bundle_wants_value(token) {
                iter.next();
            }
        }
    }

    false
}

/// Second pass: produce the argv handed to the short-option grammar
pub fn tag_operands(tokens: Vec<Token>) -> Vec<String> {
    let mut out = Vec::with_capacity(tokens.len() + 1);
    let mut awaiting_value = false;

    for token in tokens {
        if awaiting_value {
            awaiting_value = false;
            out.push(token.into_text());
            continue;
        }

        match token {
            Token::Flag(flag) => {
                awaiting_value = bundle_wants_value(&flag);
                out.push(flag);
            }
            Token::Word(word) if is_opacity_token(&word) => {
                out.push("-o".to_string());
                out.push(word);
            }
            other => out.push(other.into_text()),
        }
    }

    out
}
