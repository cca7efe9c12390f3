mod cli;
mod commands;
mod config;
mod progress;
mod render;
mod sudo;
mod ui;

use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command};
use declarative::{EXIT_FATAL, EXIT_OK};
use std::io;
use std::process::ExitCode;

/// Global context for the application
pub struct Context {
    pub verbose: u8,
    pub quiet: bool,
    pub config: Option<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    let ctx = Context {
        verbose: cli.verbose,
        quiet: cli.quiet,
        config: cli.config,
    };

    let result = match cli.command {
        Command::Apply(args) => commands::apply::run(&ctx, args),
        Command::Plan(args) => commands::plan::run(&ctx, args),
        Command::Status(args) => commands::status::run(&ctx, args),
        Command::Validate { manifest } => commands::validate::run(&ctx, &manifest),
        Command::Import(args) => commands::import::run(&ctx, &args),
        Command::Config(cmd) => commands::config::run(&ctx, &cmd),
        Command::Completions { shell } => {
            generate(shell, &mut Cli::command(), "pantry", &mut io::stdout());
            Ok(EXIT_OK)
        }
    };

    if let Err(e) = &result {
        ui::error(&format!("{e:#}"));
    }
    ExitCode::from(exit_status(&result))
}

/// Process status for a command result; any error is fatal
fn exit_status(result: &anyhow::Result<i32>) -> u8 {
    match result {
        Ok(code) => u8::try_from(*code).unwrap_or(1),
        Err(_) => EXIT_FATAL as u8,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use declarative::{
        EXIT_CANCELLED, EXIT_HALTED, LoadedRun, ManifestRecord, PackageManager, ProbeError,
    };
    use std::path::Path;

    struct NoDatabase;

    impl PackageManager for NoDatabase {
        fn name(&self) -> &str {
            "apt"
        }

        fn query(&self, _: &str) -> Result<declarative::CurrentState, ProbeError> {
            Err(ProbeError::Unavailable("dpkg-query not found".into()))
        }

        fn install(
            &self,
            _: &str,
            _: Option<&str>,
            _: &declarative::ApplyContext,
        ) -> Result<(), declarative::ExecutionError> {
            unreachable!()
        }

        fn remove(
            &self,
            _: &str,
            _: &declarative::ApplyContext,
        ) -> Result<(), declarative::ExecutionError> {
            unreachable!()
        }
    }

    #[test]
    fn test_invalid_manifest_is_fatal() {
        let err = LoadedRun::from_records(vec![
            ManifestRecord::new("libssl-dev", "installed"),
            ManifestRecord::new("libssl-dev", "removed"),
        ])
        .unwrap_err();
        assert_eq!(exit_status(&Err(err.into())), 3);
    }

    #[test]
    fn test_missing_manifest_is_fatal() {
        let result = commands::load_manifest(Path::new("/nonexistent/pantry.toml")).map(|_| 0);
        assert_eq!(exit_status(&result), 3);
    }

    #[test]
    fn test_probe_failure_is_fatal() {
        let run = LoadedRun::from_records(vec![ManifestRecord::new("make", "installed")]).unwrap();
        let err = run.probe(&NoDatabase).unwrap_err();
        assert_eq!(exit_status(&Err(err.into())), 3);
    }

    #[test]
    fn test_run_codes_pass_through() {
        assert_eq!(exit_status(&Ok(EXIT_OK)), 0);
        assert_eq!(exit_status(&Ok(EXIT_HALTED)), 2);
        assert_eq!(exit_status(&Ok(EXIT_CANCELLED)), 130);
    }
}
