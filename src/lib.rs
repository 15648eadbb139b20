// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod session;
pub mod types;
pub mod watch;

use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::cli::CliArgs;
use crate::config::{WatchRunConfig, load_optional};
use crate::engine::spawn_signal_listener;
use crate::errors::Result;
use crate::exec::StdioSink;
use crate::fs::RealFileSystem;
use crate::session::Session;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading (optional file, then CLI overrides, then validation)
/// - file watcher, runtime and executor (via [`Session`])
/// - Ctrl-C / SIGTERM handling
///
/// Returns the process exit code.
pub async fn run(args: CliArgs) -> Result<i32> {
    let root = std::env::current_dir()?;

    let raw = load_optional(args.config.as_deref(), &root)?;
    let cfg = WatchRunConfig::try_from(raw.with_overrides(args.overrides()))?;

    if args.dry_run {
        print_dry_run(&cfg, &root);
        return Ok(0);
    }

    let sink = Arc::new(StdioSink::with_root(&root));
    let session = Session::start(cfg, &root, sink)?;
    spawn_signal_listener(session.stop_handle());

    let report = session.wait().await?;
    debug!(?report, "watch-run finished");
    Ok(report.exit_code())
}

/// Print the resolved configuration without running anything.
fn print_dry_run(cfg: &WatchRunConfig, root: &Path) {
    println!("watch-run dry-run");
    println!("  command: {}", cfg.command);
    if let Some(cwd) = cfg.command.cwd() {
        println!("  cwd: {}", cwd.display());
    }
    println!("  debounce: {:?}", cfg.runtime.debounce);
    println!("  initial_run: {}", cfg.runtime.initial_run);
    println!("  once: {}", cfg.runtime.exit_when_idle);
    println!("  kill_timeout: {:?}", cfg.supervisor.kill_timeout);
    println!("  terminated_output: {:?}", cfg.supervisor.terminated_output);
    println!();

    if cfg.runtime.exit_when_idle {
        println!("watch: (disabled by --once)");
    } else {
        match cfg.watch.resolve(&RealFileSystem, root) {
            Ok(matcher) => {
                println!("watch ({}):", matcher.targets().len());
                for target in matcher.targets() {
                    match &target.file {
                        Some(file) => println!("  - {} (file)", file.display()),
                        None => println!("  - {} (recursive)", target.path.display()),
                    }
                }
            }
            Err(err) => println!("watch: {err}"),
        }
    }

    if !cfg.watch.exclude().is_empty() {
        println!("exclude: {:?}", cfg.watch.exclude());
    }

    debug!("dry-run complete (no execution)");
}
