//! Argument normalizer
//!
//! Reduces a free-form mix of long options, short options and a bare opacity
//! into one [`CanonicalRequest`]. Long options are rewritten to their short
//! form, bare opacities get an explicit `-o`, and the result is parsed by a
//! fixed short-option grammar.

mod grammar;
mod tokens;

use crate::core::request::{
    Action, CanonicalRequest, InvalidOperand, OpacityOperand, SelectionMode, is_opacity_token,
};

pub use grammar::BIN_NAME;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArgsError {
    #[error("illegal option '{option}'")]
    IllegalOption { option: String },

    #[error("option '{option}' requires a value")]
    MissingValue { option: String },

    #[error("option '{option}' does not take a value")]
    UnexpectedValue { option: String },

    #[error(transparent)]
    InvalidOpacity(#[from] InvalidOperand),

    #[error("{message}")]
    Grammar { message: String },

    #[error("option '{flag}' is recognised but not handled")]
    Unhandled { flag: String },
}

impl ArgsError {
    pub fn error_code(&self) -> &'static str {
        match self {
            ArgsError::IllegalOption { .. } => "ILLEGAL_OPTION",
            ArgsError::MissingValue { .. } => "MISSING_VALUE",
            ArgsError::UnexpectedValue { .. } => "UNEXPECTED_VALUE",
            ArgsError::InvalidOpacity(_) => "INVALID_OPACITY",
            ArgsError::Grammar { .. } => "PARSE_ERROR",
            ArgsError::Unhandled { .. } => "UNHANDLED_OPTION",
        }
    }
}

/// Outcome of normalization
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Parsed {
    /// `-h`/`--help` was given; nothing else is looked at
    Help,
    Request(CanonicalRequest),
}

/// Rendered `--help` text
pub fn help() -> String {
    grammar::command().render_help().to_string()
}

/// Normalize the invocation (program name excluded)
pub fn normalize<I, S>(tokens: I) -> Result<Parsed, ArgsError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let tokens: Vec<String> = tokens.into_iter().map(Into::into).collect();

    if tokens::requests_help(&tokens) {
        return Ok(Parsed::Help);
    }

    // `opacityctl 75`: set the opacity of the window the user clicks
    if let [only] = tokens.as_slice() {
        if is_opacity_token(only) {
            return Ok(Parsed::Request(CanonicalRequest {
                action: Action::Set,
                selection: SelectionMode::Interactive,
                opacity: Some(only.parse::<OpacityOperand>()?),
            }));
        }
    }

    let argv = tokens::tag_operands(tokens::rewrite_long(&tokens)?);
    tracing::debug!(?argv, "Rewritten arguments");

    let parsed = grammar::parse(argv)?;
    tracing::debug!(?parsed, "Normalized invocation");
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::request::Sign;

    fn request(args: &[&str]) -> CanonicalRequest {
        match normalize(args.iter().copied()).unwrap() {
            Parsed::Request(request) => request,
            Parsed::Help => panic!("unexpected help for {args:?}"),
        }
    }

    #[test]
    fn test_single_bare_opacity() {
        let req = request(&["75"]);
        assert_eq!(req.action, Action::Set);
        assert_eq!(req.selection, SelectionMode::Interactive);
        assert_eq!(req.opacity, Some(OpacityOperand::absolute(75)));
    }

    #[test]
    fn test_single_negative_bare_opacity_is_not_a_flag() {
        let req = request(&["-20"]);
        let opacity = req.opacity.unwrap();
        assert_eq!(opacity.sign, Some(Sign::Minus));
        assert_eq!(opacity.magnitude, 20);
    }

    #[test]
    fn test_implicit_and_explicit_opacity_agree() {
        assert_eq!(request(&["-c", "+5"]), request(&["-c", "-o", "+5"]));
        assert_eq!(request(&["--current", "+5"]), request(&["-c", "+5"]));
    }

    #[test]
    fn test_window_value_is_not_an_opacity() {
        let req = request(&["-w", "75", "-o", "90"]);
        assert_eq!(req.selection, SelectionMode::ById("75".to_string()));
        assert_eq!(req.opacity, Some(OpacityOperand::absolute(90)));
    }

    #[test]
    fn test_opacity_may_precede_options() {
        let req = request(&["50%", "--name=term"]);
        assert_eq!(req.selection, SelectionMode::ByName("term".to_string()));
        assert_eq!(req.opacity.unwrap().magnitude, 50);
    }

    #[test]
    fn test_help_takes_priority() {
        assert_eq!(normalize(["--bogus", "--help"]).unwrap(), Parsed::Help);
        assert_eq!(normalize(["-r", "-h", "50"]).unwrap(), Parsed::Help);
    }

    #[test]
    fn test_bundled_help_takes_priority() {
        assert_eq!(normalize(["--bogus", "-ch"]).unwrap(), Parsed::Help);
        assert_eq!(normalize(["-x", "-ch"]).unwrap(), Parsed::Help);
    }

    #[test]
    fn test_double_dash_is_rejected() {
        assert_eq!(
            normalize(["--"]).unwrap_err(),
            ArgsError::IllegalOption {
                option: "--".to_string()
            }
        );
    }

    #[test]
    fn test_stray_word_is_rejected() {
        assert!(matches!(
            normalize(["-c", "seventy"]),
            Err(ArgsError::Grammar { .. })
        ));
    }

    #[test]
    fn test_reset_keeps_parsing_selection() {
        let req = request(&["--reset", "-c"]);
        assert_eq!(req.action, Action::Reset);
        assert_eq!(req.selection, SelectionMode::Current);
    }

    #[test]
    fn test_empty_invocation_sets_nothing() {
        assert_eq!(request(&[]), CanonicalRequest::default());
    }

    #[test]
    fn test_help_text_lists_options() {
        let text = help();
        assert!(text.contains("--opacity"));
        assert!(text.contains("--window"));
    }
}
