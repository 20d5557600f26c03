//! CLI interface for Flex Creek.
//!
//! Each subcommand is non-interactive: arguments in, output out. Records
//! that are created print their ID; `show` prints the stored record as JSON;
//! `list` prints one line per record.

mod format;
mod movement;
mod user;
mod workout;

use clap::{Parser, Subcommand};
use flexcreek::Storage;

use movement::MovementCommand;
use user::UserCommand;
use workout::WorkoutCommand;

/// Flex Creek: log your training.
#[derive(Debug, Parser)]
#[command(name = "flexcreek", after_long_help = WORKFLOW_HELP)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

const WORKFLOW_HELP: &str = r#"Workflow: logging a session
  1. flexcreek user new --email me@example.com --first Sam --last Lee
     → prints a user ID (e.g. 1)
  2. flexcreek movement new Squat --type strength
  3. flexcreek workout new --file session.json
  4. flexcreek workout list --user 1 --from 2024-06-01 --to 2024-06-30

A workout file holds the full workout, instances included:
  {"userId": 1, "date": "2024-06-03", "duration": "PT1H",
   "movementInstances": [
     {"movementId": 1, "rpe": 8,
      "log": {"kind": "strength", "sets": [{"reps": 5, "weight": 225.0}]}}]}"#;

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage movements: the exercises instances refer to.
    Movement {
        #[command(subcommand)]
        command: MovementCommand,
    },

    /// Manage users.
    User {
        #[command(subcommand)]
        command: UserCommand,
    },

    /// Record, inspect, and remove workouts.
    Workout {
        #[command(subcommand)]
        command: WorkoutCommand,
    },
}

/// Run the CLI, returning an error message on failure.
pub fn run(storage: &Storage) -> Result<(), String> {
    let cli = Cli::parse();

    match cli.command {
        Command::Movement { command } => movement::run(storage, command),
        Command::User { command } => user::run(storage, command),
        Command::Workout { command } => workout::run(storage, command),
    }
}
