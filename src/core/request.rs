//! Canonical Request - the unambiguous form every invocation is reduced to
//!
//! The normalizer builds exactly one [`CanonicalRequest`] per invocation; the
//! resolver and controller only ever read it.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

/// X11 window identifier
pub type WindowId = u32;

/// Optional sign, one or more digits, optional trailing percent sign
static OPACITY_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([+-])?([0-9]+)(%)?$").expect("opacity pattern is valid"));

/// Whether `token` lexically looks like an opacity operand (`75`, `+5`, `-10%`)
pub fn is_opacity_token(token: &str) -> bool {
    OPACITY_TOKEN.is_match(token)
}

/// What to do with the target window's opacity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Action {
    #[default]
    Set,
    Get,
    Delete,
    Toggle,
    /// Clears opacity on every window; ignores the selection mode
    Reset,
}

/// How the target window is chosen
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SelectionMode {
    /// Pointer-driven pick
    #[default]
    Interactive,
    /// The window manager's focused window
    Current,
    /// First window whose name contains the pattern
    ByName(String),
    /// Raw identifier as typed by the user, validated by the resolver
    ById(String),
}

/// Direction of a relative adjustment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sign {
    Plus,
    Minus,
}

/// Opacity as written on the command line
///
/// A present `sign` makes the operand a delta against the current opacity;
/// without it the operand is an absolute percentage. Magnitudes that do not
/// fit in a `u64` saturate, since the result is clamped to `[0, 100]` anyway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpacityOperand {
    pub sign: Option<Sign>,
    pub magnitude: u64,
    pub percent: bool,
}

impl OpacityOperand {
    pub fn absolute(magnitude: u64) -> Self {
        Self {
            sign: None,
            magnitude,
            percent: false,
        }
    }

    pub fn is_relative(&self) -> bool {
        self.sign.is_some()
    }
}

/// Returned when a string does not match the opacity pattern
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{0}' is not an opacity (expected [+|-]NUMBER[%])")]
pub struct InvalidOperand(pub String);

impl FromStr for OpacityOperand {
    type Err = InvalidOperand;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = OPACITY_TOKEN
            .captures(s)
            .ok_or_else(|| InvalidOperand(s.to_string()))?;

        let sign = caps.get(1).map(|m| match m.as_str() {
            "-" => Sign::Minus,
            _ => Sign::Plus,
        });
        // Only digits can reach here, so overflow is the sole parse failure
        let magnitude = caps[2].parse::<u64>().unwrap_or(u64::MAX);

        Ok(Self {
            sign,
            magnitude,
            percent: caps.get(3).is_some(),
        })
    }
}

impl fmt::Display for OpacityOperand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.sign {
            Some(Sign::Plus) => write!(f, "+")?,
            Some(Sign::Minus) => write!(f, "-")?,
            None => {}
        }
        write!(f, "{}", self.magnitude)?;
        if self.percent {
            write!(f, "%")?;
        }
        Ok(())
    }
}

/// Fully normalized invocation
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CanonicalRequest {
    pub action: Action,
    pub selection: SelectionMode,
    pub opacity: Option<OpacityOperand>,
}
