//! Terminal output: colored diagnostics on stderr.
//!
//! Respects NO_COLOR and FORCE_COLOR. Colors are dropped automatically when
//! stderr is not a terminal.

use std::{error::Error, fmt};

use colored::{ColoredString, Colorize};

/// Call once at startup.
pub fn init()
{
    if std::env::var("NO_COLOR").is_ok() {
        colored::control::set_override(false);
    } else if std::env::var("FORCE_COLOR").is_ok() {
        colored::control::set_override(true);
    }
}

pub fn error_label() -> ColoredString { "error".red().bold() }

pub fn warning_label() -> ColoredString { "warning".yellow().bold() }

/// Fatal diagnostic on a single line, with the chain of causes appended.
pub fn error(err: &dyn Error)
{
    let mut line = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        line.push_str(": ");
        line.push_str(&cause.to_string());
        source = cause.source();
    }
    eprintln!("{}: {}", error_label(), line);
}

/// Secondary failure met while already shutting down.
pub fn warning(err: &dyn fmt::Display) { eprintln!("{}: {}", warning_label(), err); }

pub fn policy_note(policy: &dyn fmt::Display) -> String
{
    format!("{} {}", "policy:".dimmed(), policy.to_string().cyan())
}
