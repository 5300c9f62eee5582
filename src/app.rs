//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - loads and filters the uploaded CSV
//! - prints previews/charts for the one-shot commands
//! - dispatches pushes to the warehouse
//! - launches the interactive TUI

use clap::Parser;

use crate::cli::{Command, PreviewArgs, PushArgs, TuiArgs, picker};
use crate::domain::{Credentials, PushConfig};
use crate::error::AppError;
use crate::io::creds::DEFAULT_CREDS_PATH;

pub mod pipeline;

/// Entry point for the `csvlift` binary.
pub fn run() -> Result<(), AppError> {
    // We want bare `csvlift` (and `csvlift -f data.csv`) to behave like
    // `csvlift tui ...`.
    //
    // Clap requires a subcommand name, so we do a small, explicit rewrite of
    // the argv list before parsing. This preserves a clean clap structure
    // while retaining the requested UX.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Preview(args) => handle_preview(args),
        Command::Push(args) => handle_push(args),
        Command::Tui(args) => handle_tui(args),
    }
}

fn handle_preview(args: PreviewArgs) -> Result<(), AppError> {
    let path = match args.input.file {
        Some(path) => picker::validate_csv_path(&path)?,
        None => picker::prompt_for_csv_path()?,
    };

    let loaded = pipeline::run_load(&path, args.input.start, args.input.end)?;

    print!("{}", crate::report::format_load_summary(&loaded.frame, &path.display().to_string()));
    println!();
    print!("{}", crate::report::format_preview(&loaded.filtered, crate::report::PREVIEW_ROWS));

    if !args.no_charts {
        let price = crate::plot::render_price_chart(&loaded.filtered, args.width, args.height);
        let volume = crate::plot::render_volume_chart(&loaded.filtered, args.width, args.height);
        if !price.is_empty() {
            println!();
            print!("{price}");
        }
        if !volume.is_empty() {
            println!();
            print!("{volume}");
        }
    }

    Ok(())
}

fn handle_push(args: PushArgs) -> Result<(), AppError> {
    let path = match &args.input.file {
        Some(path) => picker::validate_csv_path(path)?,
        None => picker::prompt_for_csv_path()?,
    };

    let config = push_config_from_args(path, &args);
    let out = pipeline::run_push(&config)?;

    println!(
        "Wrote {} rows to {}",
        out.rows_written,
        crate::warehouse::qualified_name(&out.target)
    );
    Ok(())
}

fn handle_tui(args: TuiArgs) -> Result<(), AppError> {
    crate::tui::run(args)
}

fn push_config_from_args(path: std::path::PathBuf, args: &PushArgs) -> PushConfig {
    // Manual flags switch the resolver to manual mode; otherwise credentials
    // come from the given file (or the default file next to the data).
    let (creds_path, manual_creds) = if args.manual_mode() {
        (
            None,
            Credentials {
                account: args.account.clone(),
                user: args.user.clone(),
                password: args.password.clone(),
                database: args.database.clone(),
                schema: args.schema.clone(),
            },
        )
    } else {
        (
            Some(args.creds.clone().unwrap_or_else(|| DEFAULT_CREDS_PATH.into())),
            Credentials::default(),
        )
    };

    PushConfig {
        csv_path: path,
        creds_path,
        manual_creds,
        start: args.input.start,
        end: args.input.end,
        table_name: args.table.clone(),
    }
}

/// Rewrite argv so `csvlift` defaults to `csvlift tui`.
///
/// Rules:
/// - `csvlift`                     -> `csvlift tui`
/// - `csvlift -f data.csv ...`     -> `csvlift tui -f data.csv ...`
/// - `csvlift --help/--version`    -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("tui".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "preview" | "push" | "tui");
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "tui flags".
    if arg1.starts_with('-') {
        argv.insert(1, "tui".to_string());
        return argv;
    }

    // Otherwise, leave as-is.
    argv
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bare_invocation_defaults_to_tui() {
        assert_eq!(rewrite_args(args(&["csvlift"])), args(&["csvlift", "tui"]));
        assert_eq!(
            rewrite_args(args(&["csvlift", "-f", "a.csv"])),
            args(&["csvlift", "tui", "-f", "a.csv"])
        );
    }

    #[test]
    fn subcommands_and_help_pass_through() {
        assert_eq!(
            rewrite_args(args(&["csvlift", "push", "-f", "a.csv"])),
            args(&["csvlift", "push", "-f", "a.csv"])
        );
        assert_eq!(rewrite_args(args(&["csvlift", "--help"])), args(&["csvlift", "--help"]));
    }
}
