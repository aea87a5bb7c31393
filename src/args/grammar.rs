//! Fixed short-option grammar, applied after token rewriting

use clap::parser::ValueSource;
use clap::{Arg, ArgAction, ArgMatches, Command, error::ErrorKind};

use super::{ArgsError, Parsed};
use crate::core::request::{Action, CanonicalRequest, OpacityOperand, SelectionMode};

pub const BIN_NAME: &str = "opacityctl";

const ACTION_FLAGS: &[&str] = &["get", "delete", "toggle", "reset"];
const SELECTION_FLAGS: &[&str] = &["select", "current", "name", "window"];

fn flag(id: &'static str, short: char, help: &'static str) -> Arg {
    Arg::new(id)
        .short(short)
        .long(id)
        .action(ArgAction::SetTrue)
        .help(help)
}

fn valued(id: &'static str, short: char, value_name: &'static str, help: &'static str) -> Arg {
    Arg::new(id)
        .short(short)
        .long(id)
        .value_name(value_name)
        .allow_hyphen_values(true)
        .help(help)
}

/// The grammar, also used to render `--help`
pub fn command() -> Command {
    Command::new(BIN_NAME)
        .about("Query or change the opacity of X11 windows")
        .override_usage(format!("{BIN_NAME} [OPTIONS] [OPACITY]"))
        .after_help(
            "OPACITY is a percentage from 0 to 100, optionally followed by '%'.\n\
             A leading '+' or '-' adjusts the current opacity instead.\n\
             Without a selection option, click the window to change.",
        )
        .disable_version_flag(true)
        .args_override_self(true)
        .arg(valued("opacity", 'o', "OPACITY", "Opacity to set, absolute or +/- relative"))
        .arg(flag("get", 'g', "Print the current opacity"))
        .arg(flag("delete", 'd', "Remove the opacity property"))
        .arg(flag("toggle", 't', "Set the opacity if unset, remove it otherwise"))
        .arg(flag("reset", 'r', "Remove the opacity property from every window"))
        .arg(flag("select", 's', "Click the target window (default)"))
        .arg(flag("current", 'c', "Target the focused window"))
        .arg(valued("name", 'n', "NAME", "Target the first window whose name contains NAME"))
        .arg(valued("window", 'w', "ID", "Target a window id, decimal or 0x-prefixed hex"))
}

/// Of the given options, the one that appeared last on the command line
fn last_given<'a>(matches: &ArgMatches, ids: &[&'a str]) -> Option<&'a str> {
    ids.iter()
        .copied()
        .filter(|id| matches.value_source(id) == Some(ValueSource::CommandLine))
        .filter_map(|id| matches.indices_of(id).and_then(|i| i.max()).map(|pos| (pos, id)))
        .max_by_key(|(pos, _)| *pos)
        .map(|(_, id)| id)
}

fn value_of(matches: &ArgMatches, id: &str) -> String {
    matches.get_one::<String>(id).cloned().unwrap_or_default()
}

/// First line of a clap error, without its `error: ` prefix
fn clap_message(err: &clap::Error) -> String {
    let rendered = err.to_string();
    let first = rendered.lines().next().unwrap_or_default();
    first.strip_prefix("error: ").unwrap_or(first).to_string()
}

/// Parse a rewritten argv (without the program name)
pub fn parse(argv: Vec<String>) -> Result<Parsed, ArgsError> {
    let matches = match command().try_get_matches_from(std::iter::once(BIN_NAME.to_string()).chain(argv)) {
        Ok(matches) => matches,
        Err(e) if e.kind() == ErrorKind::DisplayHelp => return Ok(Parsed::Help),
        Err(e) => {
            return Err(ArgsError::Grammar {
                message: clap_message(&e),
            });
        }
    };

    let action = match last_given(&matches, ACTION_FLAGS) {
        None => Action::Set,
        Some("get") => Action::Get,
        Some("delete") => Action::Delete,
        Some("toggle") => Action::Toggle,
        Some("reset") => Action::Reset,
        Some(other) => {
            return Err(ArgsError::Unhandled {
                flag: other.to_string(),
            });
        }
    };

    let selection = match last_given(&matches, SELECTION_FLAGS) {
        None | Some("select") => SelectionMode::Interactive,
        Some("current") => SelectionMode::Current,
        Some("name") => SelectionMode::ByName(value_of(&matches, "name")),
        Some("window") => SelectionMode::ById(value_of(&matches, "window")),
        Some(other) => {
            return Err(ArgsError::Unhandled {
                flag: other.to_string(),
            });
        }
    };

    let opacity = matches
        .get_one::<String>("opacity")
        .map(|value| value.parse::<OpacityOperand>())
        .transpose()?;

    Ok(Parsed::Request(CanonicalRequest {
        action,
        selection,
        opacity,
    }))
}
