//! Workout commands: new, show, list, delete.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Subcommand;
use flexcreek::{Storage, model::NewWorkout};
use jiff::civil::Date;

use super::format::format_workout_line;

#[derive(Debug, Subcommand)]
pub enum WorkoutCommand {
    /// Create a workout from a JSON file. Prints the workout ID.
    New {
        /// Path to the workout JSON.
        #[arg(long)]
        file: PathBuf,
    },

    /// Replace a workout, instances included, with the contents of a JSON file.
    Replace {
        id: i64,

        #[arg(long)]
        file: PathBuf,
    },

    /// Print a workout as JSON.
    Show { id: i64 },

    /// List a user's workouts, optionally limited to a day or a date range.
    List {
        #[arg(long)]
        user: i64,

        /// A single day (YYYY-MM-DD).
        #[arg(long, conflicts_with_all = ["from", "to"])]
        date: Option<Date>,

        /// First day of the range, inclusive.
        #[arg(long, requires = "to")]
        from: Option<Date>,

        /// Last day of the range, inclusive.
        #[arg(long, requires = "from")]
        to: Option<Date>,
    },

    /// Delete a workout and its instances.
    Delete { id: i64 },
}

pub(super) fn run(storage: &Storage, command: WorkoutCommand) -> Result<(), String> {
    match command {
        WorkoutCommand::New { file } => {
            let workout = read_workout(&file)?;
            let id = storage
                .create_workout(&workout)
                .map_err(|e| format!("failed to create workout: {e}"))?;
            println!("{id}");
            Ok(())
        }
        WorkoutCommand::Replace { id, file } => {
            let workout = read_workout(&file)?;
            storage
                .update_workout(id, &workout)
                .map_err(|e| format!("failed to update workout: {e}"))?;
            eprintln!(
                "Workout {id} replaced ({} instances)",
                workout.movement_instances.len()
            );
            Ok(())
        }
        WorkoutCommand::Show { id } => {
            let workout = storage
                .get_workout(id)
                .map_err(|e| format!("failed to load workout: {e}"))?;
            let json = serde_json::to_string_pretty(&workout)
                .map_err(|e| format!("failed to serialize workout: {e}"))?;
            println!("{json}");
            Ok(())
        }
        WorkoutCommand::List {
            user,
            date,
            from,
            to,
        } => {
            let workouts = match (date, from, to) {
                (Some(day), _, _) => storage.list_workouts_by_date(user, day),
                (None, Some(from), Some(to)) => storage.list_workouts_by_date_range(user, from, to),
                _ => storage.list_workouts_by_user(user),
            }
            .map_err(|e| format!("failed to list workouts: {e}"))?;

            if workouts.is_empty() {
                println!("No workouts");
            }
            for w in &workouts {
                println!("{}", format_workout_line(w));
            }
            Ok(())
        }
        WorkoutCommand::Delete { id } => {
            storage
                .delete_workout(id)
                .map_err(|e| format!("failed to delete workout: {e}"))?;
            eprintln!("Workout {id} deleted");
            Ok(())
        }
    }
}

fn read_workout(path: &Path) -> Result<NewWorkout, String> {
    let json = fs::read_to_string(path)
        .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
    serde_json::from_str(&json).map_err(|e| format!("invalid workout in {}: {e}", path.display()))
}
