use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    version = env!("CARGO_PKG_VERSION"),
    about = "cmdbar - a shell command snippet manager",
    long_about = "cmdbar stores named groups of shell commands, builds new ones \
from templates, and runs them with captured output or in your terminal emulator."
)]
pub struct Cmdbar {
    #[clap(subcommand)]
    pub commands: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Add a new snippet
    Add {
        #[clap(help = "Name of the snippet")]
        name: String,

        #[clap(long, short = 'c', required = true, help = "Command line (repeatable, run in order)")]
        command: Vec<String>,

        #[clap(long, default_value = "general", help = "Category for the snippet")]
        category: String,

        #[clap(long, short = 'd', default_value = "", help = "Free-text description")]
        description: String,

        #[clap(long, short = 't', help = "Tag (repeatable)")]
        tag: Vec<String>,
    },
    /// Build a snippet from a built-in template
    New {
        #[clap(long, short = 'T', help = "Template id (see `cmdbar templates`)")]
        template: String,

        #[clap(long = "var", short = 'v', value_parser = parse_key_val, help = "Template variable as name=value (repeatable)")]
        vars: Vec<(String, String)>,

        #[clap(long, short = 'n', help = "Name of the snippet (defaults to the template label)")]
        name: Option<String>,

        #[clap(long, default_value = "general", help = "Category for the snippet")]
        category: String,

        #[clap(long, short = 'd', default_value = "", help = "Free-text description")]
        description: String,
    },
    /// List the built-in templates and their variables
    Templates,
    /// List snippets, optionally filtered
    List {
        #[clap(help = "Substring filter over all snippet fields")]
        query: Option<String>,

        #[clap(long, help = "Only snippets in this category")]
        category: Option<String>,
    },
    /// Show one snippet in full
    Show {
        #[clap(help = "Snippet name or id prefix")]
        target: String,
    },
    /// Delete a snippet
    Delete {
        #[clap(help = "Snippet name or id prefix")]
        target: String,
    },
    /// Run a snippet's commands with captured output
    Run {
        #[clap(help = "Snippet name or id prefix")]
        target: String,

        #[clap(long, help = "Hand the commands to an external terminal instead")]
        terminal: bool,

        #[clap(long, help = "Run only the Nth command line (1-based)")]
        line: Option<usize>,
    },
}

/// Parse a `name=value` template variable argument
fn parse_key_val(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok((name.to_string(), value.to_string())),
        _ => Err(format!("'{}' is not of the form name=value", s)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_val_splits_on_first_equals() {
        assert_eq!(
            parse_key_val("tag=v1.2=rc").unwrap(),
            ("tag".to_string(), "v1.2=rc".to_string())
        );
    }

    #[test]
    fn key_val_rejects_missing_name_or_equals() {
        assert!(parse_key_val("=value").is_err());
        assert!(parse_key_val("novalue").is_err());
    }
}
