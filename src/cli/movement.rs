//! Movement commands: new, list.

use clap::Subcommand;
use flexcreek::{
    Storage,
    model::{MovementType, NewMovement},
};

#[derive(Debug, Subcommand)]
pub enum MovementCommand {
    /// Create a movement. Prints the movement ID.
    New {
        /// Unique name, e.g. "Back Squat".
        name: String,

        /// How it is measured: strength, cardio, amrap, or emom.
        #[arg(long = "type")]
        movement_type: String,

        #[arg(long)]
        description: Option<String>,

        /// A muscle the movement works. Repeat for several.
        #[arg(long = "muscle")]
        muscles: Vec<String>,
    },

    /// List movements.
    List,
}

pub(super) fn run(storage: &Storage, command: MovementCommand) -> Result<(), String> {
    match command {
        MovementCommand::New {
            name,
            movement_type,
            description,
            muscles,
        } => cmd_new(storage, name, &movement_type, description, muscles),
        MovementCommand::List => cmd_list(storage),
    }
}

fn cmd_new(
    storage: &Storage,
    name: String,
    movement_type: &str,
    description: Option<String>,
    muscles: Vec<String>,
) -> Result<(), String> {
    let movement_type = MovementType::from(movement_type);
    if let MovementType::Other(t) = &movement_type {
        eprintln!("Warning: unknown movement type {t:?}; logs for it will not be decoded");
    }

    let id = storage
        .create_movement(&NewMovement {
            name,
            movement_type,
            description,
            muscles,
        })
        .map_err(|e| format!("failed to create movement: {e}"))?;

    println!("{id}");
    Ok(())
}

fn cmd_list(storage: &Storage) -> Result<(), String> {
    let movements = storage
        .list_movements()
        .map_err(|e| format!("failed to list movements: {e}"))?;

    if movements.is_empty() {
        println!("No movements");
        return Ok(());
    }

    for m in &movements {
        if m.muscles.is_empty() {
            println!("{:>4}  [{}]  {}", m.id, m.movement_type, m.name);
        } else {
            println!(
                "{:>4}  [{}]  {}  ({})",
                m.id,
                m.movement_type,
                m.name,
                m.muscles.join(", ")
            );
        }
    }

    Ok(())
}
