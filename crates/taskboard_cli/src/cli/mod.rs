use clap::{Parser, Subcommand};
use std::path::PathBuf;
use taskboard_core::config::ConfigOverrides;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Output JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Override configuration values (format KEY=VALUE)
    #[arg(long = "config-override", value_name = "KEY=VALUE", global = true)]
    pub config_override: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Add a new task, prompting for the title when omitted
    ///
    /// Example: taskboard add "Write report" --points 10
    Add {
        title: Option<String>,
        #[arg(short, long, default_value_t = 0)]
        points: i64,
    },
    /// List all tasks with their elapsed time
    List,
    /// List completed tasks
    Completed,
    /// Start the timer of a task
    ///
    /// Example: taskboard start 1700000000000
    Start { id: String },
    /// Pause the timer of a task
    Pause { id: String },
    /// Reset the elapsed time of a task
    Reset { id: String },
    /// Mark a task completed, or reopen a completed task
    ///
    /// Reopening discards the recorded time.
    Toggle { id: String },
    /// Delete a task
    Delete { id: String },
    /// Delete a completed task
    DeleteCompleted { id: String },
    /// Remove every completed task
    ClearCompleted,
    /// Append today's completed tasks to the daily note
    Summary,
    /// Set the user completions are attributed to
    ///
    /// Example: taskboard user alice
    User { id: String },
    /// Show live elapsed time for running timers
    ///
    /// Example: taskboard watch --ticks 10
    Watch {
        /// Stop after this many seconds
        #[arg(long)]
        ticks: Option<u32>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOverrideTarget {
    Theme,
    JournalDir,
    JournalFolder,
    JournalFormat,
    JournalEnabled,
    DesktopNotices,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedConfigOverride {
    pub target: ConfigOverrideTarget,
    pub value: String,
}

/// Parse a raw `KEY=VALUE` override string into a structured target.
pub fn parse_config_override(raw: &str) -> Result<ParsedConfigOverride, String> {
    let trimmed = raw.trim();
    let (key_raw, value_raw) = trimmed
        .split_once('=')
        .ok_or_else(|| "override must be in KEY=VALUE format".to_string())?;

    let value = value_raw.trim().to_string();
    let (field, remainder) = key_raw
        .split_once('.')
        .map(|(field, rest)| (field.trim(), Some(rest.trim())))
        .unwrap_or((key_raw.trim(), None));

    let canonical_field =
        canonicalize_flag_name(field).ok_or_else(|| "override key cannot be empty".to_string())?;
    let canonical_sub = remainder.and_then(canonicalize_flag_name);

    let target = match (canonical_field.as_str(), canonical_sub.as_deref()) {
        ("theme", None) => ConfigOverrideTarget::Theme,
        ("desktop_notices", None) => ConfigOverrideTarget::DesktopNotices,
        ("journal", Some("dir")) => ConfigOverrideTarget::JournalDir,
        ("journal", Some("folder")) => ConfigOverrideTarget::JournalFolder,
        ("journal", Some("format")) => ConfigOverrideTarget::JournalFormat,
        ("journal", Some("enabled")) => ConfigOverrideTarget::JournalEnabled,
        ("journal", None) => return Err("journal override requires a field name".to_string()),
        ("journal", Some(other)) => return Err(format!("unknown journal field '{other}'")),
        ("theme" | "desktop_notices", Some(_)) => {
            return Err(format!("{canonical_field} override cannot have subfields"));
        }
        (other, _) => return Err(format!("unknown config field '{other}'")),
    };

    Ok(ParsedConfigOverride { target, value })
}

pub fn parse_bool(raw: &str) -> Result<bool, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        other => Err(format!("expected a boolean, got '{other}'")),
    }
}

/// Folds every `--config-override` argument into a single override set.
pub fn build_overrides(raw: &[String]) -> Result<ConfigOverrides, String> {
    let mut overrides = ConfigOverrides::default();

    for entry in raw {
        let parsed = parse_config_override(entry)?;
        match parsed.target {
            ConfigOverrideTarget::Theme => overrides.theme = Some(parsed.value),
            ConfigOverrideTarget::JournalDir => {
                overrides.journal_dir = Some(PathBuf::from(parsed.value))
            }
            ConfigOverrideTarget::JournalFolder => overrides.journal_folder = Some(parsed.value),
            ConfigOverrideTarget::JournalFormat => overrides.journal_format = Some(parsed.value),
            ConfigOverrideTarget::JournalEnabled => {
                overrides.journal_enabled = Some(parse_bool(&parsed.value)?)
            }
            ConfigOverrideTarget::DesktopNotices => {
                overrides.desktop_notices = Some(parse_bool(&parsed.value)?)
            }
        }
    }

    Ok(overrides)
}

fn canonicalize_flag_name(name: &str) -> Option<String> {
    let mut cleaned = String::new();
    let mut previous_underscore = false;

    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            cleaned.push(ch.to_ascii_lowercase());
            previous_underscore = false;
        } else if !previous_underscore && !cleaned.is_empty() {
            cleaned.push('_');
            previous_underscore = true;
        }
    }

    let trimmed = cleaned.trim_matches('_');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
