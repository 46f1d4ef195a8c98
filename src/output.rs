//! # Terminal Output
//!
//! Helpers for the human-facing summaries printed by the CLI. Logs go to
//! stderr through `log`; these helpers only shape what goes to stdout.
//!
//! Colors and emojis follow the `--color=always|never|auto` flag. In auto
//! mode they are disabled by:
//! - `NO_COLOR` (any value, per https://no-color.org/)
//! - `CLICOLOR=0`
//! - `TERM=dumb`
//! - stdout not being a TTY, unless `CLICOLOR_FORCE` is set
//!
//! ```rust,ignore
//! use apps_catalog::output::{emoji, OutputConfig};
//!
//! let out = OutputConfig::from_env_and_flag("auto");
//! println!("{} Building catalog...", emoji(&out, "📦", "[BUILD]"));
//! ```

use std::env;

use console::style;

/// Whether colors and emojis are used.
#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub use_color: bool,
}

impl OutputConfig {
    /// Resolves the `--color` flag value against the environment.
    pub fn from_env_and_flag(color_flag: &str) -> Self {
        let use_color = match color_flag.to_lowercase().as_str() {
            "always" => true,
            "never" => false,
            _ => Self::detect_color_support(),
        };
        Self { use_color }
    }

    fn detect_color_support() -> bool {
        if env::var_os("NO_COLOR").is_some() {
            return false;
        }
        if env::var("CLICOLOR").is_ok_and(|v| v == "0") {
            return false;
        }
        if env::var("CLICOLOR_FORCE").is_ok_and(|v| v != "0" && !v.is_empty()) {
            return true;
        }
        if env::var("TERM").is_ok_and(|v| v == "dumb") {
            return false;
        }
        console::Term::stdout().features().colors_supported()
    }

    #[cfg(test)]
    pub fn with_color() -> Self {
        Self { use_color: true }
    }

    #[cfg(test)]
    pub fn without_color() -> Self {
        Self { use_color: false }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self::from_env_and_flag("auto")
    }
}

/// The emoji when colors are enabled, the plain marker otherwise.
pub fn emoji<'a>(config: &OutputConfig, emoji_str: &'a str, plain: &'a str) -> &'a str {
    if config.use_color {
        emoji_str
    } else {
        plain
    }
}

/// A count rendered green when non-zero.
pub fn good_count(config: &OutputConfig, count: usize) -> String {
    if config.use_color && count > 0 {
        style(count).green().bold().force_styling(true).to_string()
    } else {
        count.to_string()
    }
}

/// A count rendered red when non-zero.
pub fn bad_count(config: &OutputConfig, count: usize) -> String {
    if config.use_color && count > 0 {
        style(count).red().bold().force_styling(true).to_string()
    } else {
        count.to_string()
    }
}

/// Dimmed secondary text, such as paths.
pub fn dim(config: &OutputConfig, text: &str) -> String {
    if config.use_color {
        style(text).dim().force_styling(true).to_string()
    } else {
        text.to_string()
    }
}
