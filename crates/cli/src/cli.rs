// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `clap` argument parsing: one subcommand, `run`, which loads a task file
//! and drives it through `taskforge-engine::run`.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use taskforge_core::{BehaviourAfterFailure, RunOptions};

#[derive(Parser)]
#[command(name = "taskforge", version, about = "Run a container task to completion.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Build/pull, network, start, health-check, run, and clean up a task.
    Run(RunArgs),
}

#[derive(clap::Args)]
pub struct RunArgs {
    /// Path to the task file (TOML).
    pub task_file: PathBuf,

    /// Maximum number of steps in flight at once.
    #[arg(short = 'p', long, default_value_t = 1)]
    pub parallelism: usize,

    /// Leave containers and the task network running instead of cleaning
    /// up, even if the main container fails.
    #[arg(long)]
    pub no_cleanup: bool,

    /// Suppress `*Progress` lines (build/pull/run streaming output) on the
    /// console; still written to the structured log if `--log-file` is set.
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Write JSON-lines diagnostics to this path in addition to the
    /// console.
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Print the steps the stage planner would start with and exit,
    /// without touching the container engine.
    #[arg(long)]
    pub dry_run: bool,

    /// Override the network name the task's containers join (defaults to
    /// `taskforge-<task name>`).
    #[arg(long)]
    pub network_name: Option<String>,

    /// Ignore Ctrl-C while the task is running instead of moving straight
    /// to cleanup.
    #[arg(long)]
    pub no_interrupt: bool,

    /// Extra arguments appended to the main container's command.
    #[arg(last = true)]
    pub additional_args: Vec<String>,
}

impl RunArgs {
    pub fn run_options(&self) -> RunOptions {
        RunOptions::new(self.parallelism)
            .behaviour_after_failure(if self.no_cleanup {
                BehaviourAfterFailure::DontCleanUp
            } else {
                BehaviourAfterFailure::CleanUp
            })
            .is_interruptible(!self.no_interrupt)
            .additional_command_args(self.additional_args.clone())
            .quiet_output(self.quiet)
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_command_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_run_with_defaults() {
        let cli = Cli::parse_from(["taskforge", "run", "task.toml"]);
        let Command::Run(args) = cli.command;
        assert_eq!(args.task_file, PathBuf::from("task.toml"));
        assert_eq!(args.parallelism, 1);
        assert!(!args.no_cleanup);
        assert!(!args.dry_run);
    }

    #[test]
    fn run_options_reflect_no_cleanup_flag() {
        let cli = Cli::parse_from(["taskforge", "run", "task.toml", "--no-cleanup", "-p", "4"]);
        let Command::Run(args) = cli.command;
        let opts = args.run_options();
        assert_eq!(opts.level_of_parallelism, 4);
        assert_eq!(opts.behaviour_after_failure, BehaviourAfterFailure::DontCleanUp);
    }

    #[test]
    fn trailing_args_after_double_dash_become_additional_command_args() {
        let cli = Cli::parse_from(["taskforge", "run", "task.toml", "--", "--flag", "value"]);
        let Command::Run(args) = cli.command;
        assert_eq!(args.additional_args, vec!["--flag".to_string(), "value".to_string()]);
        assert_eq!(args.run_options().additional_command_args, vec!["--flag".to_string(), "value".to_string()]);
    }

    #[test]
    fn no_interrupt_flag_disables_interruptibility() {
        let cli = Cli::parse_from(["taskforge", "run", "task.toml", "--no-interrupt"]);
        let Command::Run(args) = cli.command;
        assert!(!args.run_options().is_interruptible);
    }
}
