// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `taskforge`: binary entry point. Loads a task file, installs logging,
//! wires the console UI and structured log writer into
//! `taskforge-engine::run`, and translates the final `TaskExitStatus` into
//! a process exit code.

mod cli;
mod config;
mod ui;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use taskforge_core::{TaskEvent, TaskExitStatus, TaskFailureReason};
use taskforge_driver::docker::BollardDriver;
use taskforge_engine::{JsonLinesWriter, StructuredLogWriter};

use crate::cli::{Cli, Command, RunArgs};
use crate::ui::ConsoleUiLogger;

fn install_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry().with(filter).with(fmt::layer().with_writer(std::io::stderr)).init();
}

#[tokio::main]
async fn main() {
    install_tracing();

    let cli = Cli::parse();
    let code = match cli.command {
        Command::Run(args) => match run(args).await {
            Ok(code) => code,
            Err(e) => {
                eprintln!("error: {e:#}");
                2
            }
        },
    };
    std::process::exit(code);
}

async fn run(args: RunArgs) -> Result<i32> {
    let task = config::load_task(&args.task_file)
        .with_context(|| format!("loading task file {:?}", args.task_file))?;

    if args.dry_run {
        print_dry_run(&task);
        return Ok(0);
    }

    let log: Arc<dyn StructuredLogWriter> = match &args.log_file {
        Some(path) => {
            Arc::new(JsonLinesWriter::open(path).with_context(|| format!("opening log file {path:?}"))?)
        }
        None => Arc::new(NullStructuredLog),
    };

    let driver =
        Arc::new(BollardDriver::connect().context("connecting to the container engine")?);
    let network_name = args.network_name.clone().unwrap_or_else(|| format!("taskforge-{}", task.name));
    let ui = Arc::new(ConsoleUiLogger::new(args.quiet));
    let run_options = args.run_options().task_name(task.name.clone());
    let manager = taskforge_engine::run::build(task, run_options, driver, ui, log, network_name);

    let interruptible = Arc::clone(&manager);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            interruptible.post_event(TaskEvent::UserInterruptedExecution).await;
        }
    });

    let status = manager.run().await;
    Ok(exit_code_for(&status))
}

fn print_dry_run(task: &taskforge_core::Task) {
    let rules = taskforge_core::running_rules();
    let log = Vec::new();
    println!("task {:?} would start with:", task.name);
    for step in rules.enabled_steps(task, &log) {
        println!("  {step}");
    }
}

fn exit_code_for(status: &TaskExitStatus) -> i32 {
    match status {
        TaskExitStatus::Success => 0,
        TaskExitStatus::Failed(TaskFailureReason::MainContainerFailed { exit_code }) => {
            if *exit_code == 0 {
                1
            } else {
                *exit_code
            }
        }
        TaskExitStatus::Failed(TaskFailureReason::Interrupted) => 130,
        TaskExitStatus::Failed(_) => 1,
    }
}

/// Discards every structured log line; used when `--log-file` is not given.
struct NullStructuredLog;

impl StructuredLogWriter for NullStructuredLog {
    fn write(&self, _severity: taskforge_engine::Severity, _message: &str, _extra: &[(&str, serde_json::Value)]) {}
}
