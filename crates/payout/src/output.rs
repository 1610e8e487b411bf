//! Operator-facing terminal output
//!
//! The payout run prints a running transcript: a banner, one progress line
//! per step finished by `Ok` or a value, and a footer. Fatal errors carry the
//! `*** Error:` marker so they stand out in a scrollback.

use std::io::{self, Write};

use colored::Colorize;

const INDENT: &str = "   ";

/// Output handler for terminal display
#[derive(Debug, Clone)]
pub struct OutputHandler {
    pool_name: String,
}

impl OutputHandler {
    pub fn new(pool_name: &str) -> Self {
        Self {
            pool_name: pool_name.to_string(),
        }
    }

    /// Print the tool banner
    pub fn print_banner(&self) {
        println!();
        println!(
            "{}",
            format!("#############  {} Payout Request Script  #############", self.pool_name)
                .bright_cyan()
        );
        println!("## Started: {}", timestamp().dimmed());
        println!("##");
    }

    /// Print the summary footer
    pub fn print_footer(&self) {
        println!("##");
        println!("## Complete: {}", timestamp().dimmed());
        println!(
            "{}",
            format!("############# {} Payout Request Complete #############", self.pool_name)
                .bright_cyan()
        );
        println!();
    }

    /// Start a progress line; finish it with [`Self::print_success`]
    pub fn print_progress(&self, step: &str) {
        print!("{}... {}:  ", INDENT, step);
        let _ = io::stdout().flush();
    }

    /// Finish a progress line with `Ok` or a value
    pub fn print_success(&self, value: Option<&str>) {
        match value {
            Some(v) => println!("{}", v.bright_white()),
            None => println!("{}", "Ok".bright_green()),
        }
    }

    /// Print a fatal or retryable error with the error marker
    pub fn print_error(&self, text: &str) {
        println!();
        println!();
        println!("{}{} {}", INDENT, "*** Error:".bright_red().bold(), text.bright_red());
    }

    pub fn print_warning(&self, text: &str) {
        println!("{}{} {}", INDENT, "⚠".bright_yellow(), text.yellow());
    }

    /// Print an indented line of text
    pub fn print_indent(&self, text: &str) {
        println!("{}{}", INDENT, text);
    }

    pub fn print_blank(&self) {
        println!();
    }

    pub fn indent(&self) -> &'static str {
        INDENT
    }
}

fn timestamp() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M").to_string()
}
