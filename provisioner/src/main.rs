//! devprov - Entry Point
//!
//! Provisions Dev Center environments and reports deployment progress while
//! the remote side works.

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use colored::Colorize;
use devprov::app::options::AppOptions;
use devprov::app::run::{run, Command};
use devprov::errors::ProvisionError;
use devprov::filesys::file::File;
use devprov::logs::{init_logging, LogOptions};
use devprov::storage::layout::StorageLayout;
use devprov::storage::settings::Settings;
use devprov::utils::version_info;

use tracing::{debug, error, info, warn};

const USAGE: &str =
    "usage: devprov [--settings=<path>] [--env=<name>] <--deploy|--destroy [--force]|--state|--version>";

const DEFAULT_ENV_NAME: &str = "dev";

/// Collect `--key=value` pairs and bare `--flag`s. Bare flags map to "true".
fn parse_flags(args: impl Iterator<Item = String>) -> HashMap<String, String> {
    args.filter(|arg| arg.starts_with('-'))
        .map(|arg| {
            let arg = arg.trim_start_matches('-');
            match arg.split_once('=') {
                Some((key, value)) => (key.to_owned(), value.to_owned()),
                None => (arg.to_owned(), "true".to_owned()),
            }
        })
        .collect()
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli_args = parse_flags(env::args().skip(1));

    // Print version and exit
    if cli_args.contains_key("version") {
        match serde_json::to_string_pretty(&version_info()) {
            Ok(version) => println!("{}", version),
            Err(e) => eprintln!("Unable to render version: {}", e),
        }
        return ExitCode::SUCCESS;
    }

    let command = if cli_args.contains_key("deploy") {
        Command::Deploy
    } else if cli_args.contains_key("destroy") {
        Command::Destroy {
            force: cli_args.contains_key("force"),
        }
    } else if cli_args.contains_key("state") {
        Command::State
    } else {
        eprintln!("{}", USAGE);
        return ExitCode::FAILURE;
    };

    // Retrieve the settings file
    let project_dir = PathBuf::from(".");
    let layout = StorageLayout::for_project(&project_dir);
    let settings_file = match cli_args.get("settings") {
        Some(path) => File::new(path),
        None => layout.settings_file(),
    };
    let mut settings = match settings_file.read_json_opt::<Settings>().await {
        Ok(Some(settings)) => settings,
        Ok(None) => Settings::default(),
        Err(e) => {
            eprintln!("Unable to read settings file {}: {}", settings_file.path().display(), e);
            return ExitCode::FAILURE;
        }
    };
    settings.apply_env_overrides();

    // Initialize logging
    let log_options = LogOptions {
        log_level: settings.log_level,
        json_format: settings.json_logs,
        log_dir: settings
            .log_to_file
            .then(|| layout.logs_dir().path().to_path_buf()),
        ..Default::default()
    };
    let _log_guard = match init_logging(log_options) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            None
        }
    };

    let env_name = cli_args
        .get("env")
        .cloned()
        .unwrap_or_else(|| DEFAULT_ENV_NAME.to_string());
    let options = AppOptions::from_settings(&settings, project_dir, env_name);
    debug!("Running devprov with options: {:?}", options.provider);

    match run(options, command, await_shutdown_signal()).await {
        Ok(result) => {
            match serde_json::to_string_pretty(&result) {
                Ok(result) => println!("{}", result),
                Err(e) => warn!("Unable to render result: {}", e),
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Command failed: {}", e);
            eprintln!("{} {}", "ERROR:".red(), e);
            ExitCode::from(exit_code(&e))
        }
    }
}

fn exit_code(e: &ProvisionError) -> u8 {
    match e.root() {
        ProvisionError::DestroyCancelled => 2,
        ProvisionError::DestroyInterrupted(_) => 3,
        _ => 1,
    }
}

async fn await_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = match signal(SignalKind::terminate()) {
            Ok(sigterm) => sigterm,
            Err(e) => {
                warn!("Unable to listen for SIGTERM: {}", e);
                if tokio::signal::ctrl_c().await.is_ok() {
                    info!("Ctrl+C received, cancelling...");
                }
                return;
            }
        };

        tokio::select! {
            _ = sigterm.recv() => {
                info!("SIGTERM received, cancelling...");
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl+C received, cancelling...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Ctrl+C received, cancelling..."),
            Err(e) => {
                warn!("Unable to listen for Ctrl+C: {}", e);
                std::future::pending::<()>().await;
            }
        }
    }
}
