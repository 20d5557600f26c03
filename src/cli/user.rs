//! User commands: new, list.

use clap::Subcommand;
use flexcreek::{Storage, model::NewUser};

#[derive(Debug, Subcommand)]
pub enum UserCommand {
    /// Create a user. Prints the user ID.
    New {
        #[arg(long)]
        email: String,

        #[arg(long)]
        first: String,

        #[arg(long)]
        last: String,
    },

    /// List users.
    List,
}

pub(super) fn run(storage: &Storage, command: UserCommand) -> Result<(), String> {
    match command {
        UserCommand::New { email, first, last } => {
            let id = storage
                .create_user(&NewUser {
                    first_name: first,
                    last_name: last,
                    email,
                    hashed_password: String::new(),
                })
                .map_err(|e| format!("failed to create user: {e}"))?;
            println!("{id}");
            Ok(())
        }
        UserCommand::List => {
            let users = storage
                .list_users()
                .map_err(|e| format!("failed to list users: {e}"))?;
            if users.is_empty() {
                println!("No users");
            }
            for u in &users {
                println!("{:>4}  {} {}  <{}>", u.id, u.first_name, u.last_name, u.email);
            }
            Ok(())
        }
    }
}
