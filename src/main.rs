//! LaTeX Studio - A Markdown + LaTeX editor shell
//!
//! Entry point for the application. Handles CLI argument parsing,
//! logging initialization, and application bootstrap.

mod app;
mod backend;
mod config;
mod error;
mod host;
mod markdown;
mod message;
mod state;
mod utils;

// Command words and the save shortcut
mod menu;

use app::Flags;
use error::{ConfigError, ConfigResult};
use std::path::PathBuf;

/// Application name for logging
const BIN_NAME: &str = "latex-studio";

fn main() -> anyhow::Result<()> {
    // Initialize logging
    init_logging();

    log::info!("Starting {}", config::APP_NAME);

    // Parse command line arguments
    let flags = match parse_args(std::env::args().skip(1)) {
        Ok(flags) => flags,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("Use --help for usage information");
            std::process::exit(1);
        }
    };

    // Everything shares one thread; the document lives in Rc/RefCell
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let local = tokio::task::LocalSet::new();
    let result = local.block_on(&runtime, app::run(flags));

    // Don't wait on the blocking stdin reader
    runtime.shutdown_background();
    Ok(result?)
}

/// Initialize the logging system
fn init_logging() {
    // Set default log level if not specified
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info,latex_studio=debug");
    }

    env_logger::Builder::from_default_env()
        .format_timestamp_millis()
        .init();
}

/// Parse command line arguments
fn parse_args(args: impl IntoIterator<Item = String>) -> ConfigResult<Flags> {
    let mut flags = Flags::default();
    let mut files = Vec::new();

    for arg in args {
        match arg.as_str() {
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            "-v" | "--version" => {
                print_version();
                std::process::exit(0);
            }
            "--browser-only" => flags.config.force_browser_only = true,
            option if option.starts_with('-') => {
                return Err(ConfigError::UnknownOption(option.to_string()));
            }
            // Treat as a file path
            _ => files.push(PathBuf::from(&arg)),
        }
    }

    if files.len() > 1 {
        return Err(ConfigError::TooManyFiles(files.len()));
    }
    flags.file = files.pop();

    Ok(flags)
}

/// Print help message
fn print_help() {
    println!(
        r#"LaTeX Studio - A Markdown + LaTeX editor

USAGE:
    {bin} [OPTIONS] [FILE]

OPTIONS:
    -h, --help          Show this help message
    -v, --version       Show version information
    --browser-only      Use downloads instead of native file dialogs

EXAMPLES:
    {bin}                       Start with the welcome document
    {bin} notes.md              Open a specific file
    {bin} --browser-only        Pick files with :pick, save as downloads

COMMANDS:
{commands}"#,
        bin = BIN_NAME,
        commands = menu::help_text()
    );
}

/// Print version information
fn print_version() {
    println!("{} {}", BIN_NAME, env!("CARGO_PKG_VERSION"));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_args() {
        let flags = parse_args(args(&["--browser-only", "notes.md"])).unwrap();
        assert!(flags.config.force_browser_only);
        assert_eq!(flags.file, Some(PathBuf::from("notes.md")));

        let flags = parse_args(args(&[])).unwrap();
        assert!(!flags.config.force_browser_only);
        assert_eq!(flags.file, None);
    }

    #[test]
    fn test_parse_args_rejects() {
        assert!(matches!(
            parse_args(args(&["--frobnicate"])),
            Err(ConfigError::UnknownOption(_))
        ));
        assert!(matches!(
            parse_args(args(&["a.md", "b.md"])),
            Err(ConfigError::TooManyFiles(2))
        ));
    }
}
