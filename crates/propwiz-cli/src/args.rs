use std::path::PathBuf;

use clap::{Parser, Subcommand};
use propwiz_core::{SectionKind, STEP_COUNT};
use serde_json::Value;

/// Command-line driver for the property listing wizard
///
/// Walks a property listing through its eight steps against the listings
/// API. The unfinished draft is remembered between runs, so each command
/// picks up where the last one left off.
#[derive(Parser)]
#[command(version, about, name = "propwiz")]
pub struct Args {
    /// Root URL of the listings API
    #[arg(long, global = true, env = "PROPWIZ_API_URL")]
    pub api_url: Option<String>,

    /// Bearer token for the listings API
    #[arg(long, global = true, env = "PROPWIZ_API_TOKEN", hide_env_values = true)]
    pub api_token: Option<String>,

    /// Path to the session database. Defaults to
    /// $XDG_DATA_HOME/propwiz/session.db
    #[arg(long, global = true)]
    pub session_file: Option<PathBuf>,

    /// Disable colored output and use plain text
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show progress through the eight steps
    Status,
    /// Show one section's data and errors
    Show {
        /// Section slug, e.g. general, business, location
        section: SectionKind,
    },
    /// Edit and save a section
    Save(SaveArgs),
    /// Move on from the current step once it is saved
    Next,
    /// Jump to a step
    Goto {
        /// Step number (1-8) or section slug
        #[arg(value_parser = parse_step)]
        step: usize,
    },
    /// Inspect or change the remembered draft
    Session {
        #[command(subcommand)]
        command: SessionCommands,
    },
    /// Walk through a sample listing against an in-memory API
    Demo,
}

#[derive(clap::Args)]
pub struct SaveArgs {
    /// Section slug, e.g. general, business, location
    pub section: SectionKind,

    /// JSON file holding the whole section payload
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// Set one field, e.g. --set building_name="Unit 4" or
    /// --set sale_types[0].price_value=250000
    #[arg(long = "set", value_name = "PATH=VALUE", value_parser = parse_assignment)]
    pub assignments: Vec<(String, Value)>,
}

#[derive(Subcommand)]
pub enum SessionCommands {
    /// Show the remembered draft
    Show,
    /// Forget the remembered draft
    Clear,
    /// Continue an existing draft by id
    Resume { draft_id: String },
}

/// `3` and `property` both mean the third step.
fn parse_step(raw: &str) -> Result<usize, String> {
    match raw.parse::<usize>() {
        Ok(number) if (1..=STEP_COUNT).contains(&number) => Ok(number - 1),
        Ok(number) => Err(format!("Step must be between 1 and {STEP_COUNT}, got {number}")),
        Err(_) => raw.parse::<SectionKind>().map(SectionKind::index),
    }
}

/// Values that parse as JSON are taken as JSON, anything else as a string.
fn parse_assignment(raw: &str) -> Result<(String, Value), String> {
    let (path, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("Expected PATH=VALUE, got '{raw}'"))?;
    let path = path.trim();
    if path.is_empty() {
        return Err(format!("Missing field path in '{raw}'"));
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((path.to_string(), value))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_step_numbers_are_one_based() {
        assert_eq!(parse_step("1"), Ok(0));
        assert_eq!(parse_step("8"), Ok(7));
        assert!(parse_step("0").is_err());
        assert!(parse_step("9").is_err());
        assert_eq!(parse_step("location"), Ok(3));
        assert!(parse_step("garden").is_err());
    }

    #[test]
    fn test_assignments_prefer_json() {
        assert_eq!(
            parse_assignment("size_sq_ft=1200"),
            Ok(("size_sq_ft".to_string(), json!(1200)))
        );
        assert_eq!(
            parse_assignment("building_name=Unit 4"),
            Ok(("building_name".to_string(), json!("Unit 4")))
        );
        assert_eq!(
            parse_assignment("features=[\"Parking\"]"),
            Ok(("features".to_string(), json!(["Parking"])))
        );
        assert!(parse_assignment("no-equals").is_err());
        assert!(parse_assignment("=5").is_err());
    }

    #[test]
    fn test_args_parse() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }
}
