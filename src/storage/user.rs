//! User storage: create, load, update, list, and delete users.
//!
//! Passwords arrive here already hashed; the hash is stored as given.

use jiff::Timestamp;
use rusqlite::{OptionalExtension, Row, params};

use crate::model::{NewUser, User};

use super::{Context, Result, Storage, StorageError, parse_timestamp, timestamp_text};

const SELECT_USER: &str = "SELECT id, first_name, last_name, email, hashed_password, created_at, updated_at
     FROM users";

/// Raw user columns, before parsing.
struct UserRow {
    id: i64,
    first_name: String,
    last_name: String,
    email: String,
    hashed_password: String,
    created_at: String,
    updated_at: String,
}

impl UserRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            first_name: row.get(1)?,
            last_name: row.get(2)?,
            email: row.get(3)?,
            hashed_password: row.get(4)?,
            created_at: row.get(5)?,
            updated_at: row.get(6)?,
        })
    }

    fn into_user(self) -> Result<User> {
        Ok(User {
            id: self.id,
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            hashed_password: self.hashed_password,
            created_at: parse_timestamp(&self.created_at, "user created_at")?,
            updated_at: parse_timestamp(&self.updated_at, "user updated_at")?,
        })
    }
}

impl Storage {
    /// Creates a user. Emails are unique.
    pub fn create_user(&self, user: &NewUser) -> Result<i64> {
        validate(user)?;
        let conn = self.open()?;
        conn.execute(
            "INSERT INTO users (first_name, last_name, email, hashed_password, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
            params![
                &user.first_name,
                &user.last_name,
                &user.email,
                &user.hashed_password,
                timestamp_text(Timestamp::now()),
            ],
        )
        .op("create user")?;
        let id = conn.last_insert_rowid();
        tracing::debug!(id, "Created user");
        Ok(id)
    }

    pub fn get_user(&self, id: i64) -> Result<User> {
        let conn = self.open()?;
        conn.query_row(&format!("{SELECT_USER} WHERE id = ?1"), [id], UserRow::read)
            .optional()
            .op("get user")?
            .ok_or_else(|| StorageError::not_found("user", id))?
            .into_user()
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<User> {
        let conn = self.open()?;
        conn.query_row(
            &format!("{SELECT_USER} WHERE email = ?1"),
            [email],
            UserRow::read,
        )
        .optional()
        .op("get user by email")?
        .ok_or_else(|| StorageError::not_found("user", email))?
        .into_user()
    }

    pub fn list_users(&self) -> Result<Vec<User>> {
        let conn = self.open()?;
        let mut stmt = conn
            .prepare(&format!("{SELECT_USER} ORDER BY id"))
            .op("list users")?;
        let rows = stmt.query_map([], UserRow::read).op("list users")?;
        let mut users = Vec::new();
        for row in rows {
            users.push(row.op("list users")?.into_user()?);
        }
        Ok(users)
    }

    pub fn update_user(&self, id: i64, user: &NewUser) -> Result<()> {
        validate(user)?;
        let conn = self.open()?;
        let rows = conn
            .execute(
                "UPDATE users
                 SET first_name = ?1, last_name = ?2, email = ?3, hashed_password = ?4,
                     updated_at = ?5
                 WHERE id = ?6",
                params![
                    &user.first_name,
                    &user.last_name,
                    &user.email,
                    &user.hashed_password,
                    timestamp_text(Timestamp::now()),
                    id,
                ],
            )
            .op("update user")?;
        if rows == 0 {
            return Err(StorageError::not_found("user", id));
        }
        tracing::debug!(id, "Updated user");
        Ok(())
    }

    /// Deletes a user along with their workouts and instances.
    pub fn delete_user(&self, id: i64) -> Result<()> {
        let conn = self.open()?;
        let rows = conn
            .execute("DELETE FROM users WHERE id = ?1", [id])
            .op("delete user")?;
        if rows == 0 {
            return Err(StorageError::not_found("user", id));
        }
        tracing::debug!(id, "Deleted user");
        Ok(())
    }
}

fn validate(user: &NewUser) -> Result<()> {
    if user.email.trim().is_empty() {
        return Err(StorageError::Validation("user email is empty".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use jiff::{SignedDuration, civil::date};
    use tempfile::TempDir;

    use crate::model::{MovementType, NewMovement, NewMovementInstance, NewWorkout};

    fn test_storage() -> (TempDir, Storage) {
        let dir = TempDir::new().unwrap();
        let storage = Storage::new(dir.path().join("flexcreek.sqlite")).unwrap();
        (dir, storage)
    }

    fn sample_user() -> NewUser {
        NewUser {
            first_name: "Grace".into(),
            last_name: "Hopper".into(),
            email: "grace@example.com".into(),
            hashed_password: "$2b$10$opaque".into(),
        }
    }

    #[test]
    fn create_and_get_user() {
        let (_dir, storage) = test_storage();

        let id = storage.create_user(&sample_user()).unwrap();
        let loaded = storage.get_user(id).unwrap();

        assert_eq!(loaded.id, id);
        assert_eq!(loaded.first_name, "Grace");
        assert_eq!(loaded.last_name, "Hopper");
        assert_eq!(loaded.email, "grace@example.com");
        assert_eq!(loaded.hashed_password, "$2b$10$opaque");
    }

    #[test]
    fn get_user_by_email() {
        let (_dir, storage) = test_storage();
        let id = storage.create_user(&sample_user()).unwrap();

        assert_eq!(storage.get_user_by_email("grace@example.com").unwrap().id, id);

        let err = storage.get_user_by_email("nobody@example.com").unwrap_err();
        assert!(matches!(err, StorageError::NotFound { entity: "user", .. }));
    }

    #[test]
    fn duplicate_email_is_constraint_violation() {
        let (_dir, storage) = test_storage();
        storage.create_user(&sample_user()).unwrap();

        let err = storage.create_user(&sample_user()).unwrap_err();
        assert!(matches!(err, StorageError::ConstraintViolation { .. }));
    }

    #[test]
    fn empty_email_is_rejected() {
        let (_dir, storage) = test_storage();
        let mut user = sample_user();
        user.email = String::new();

        let err = storage.create_user(&user).unwrap_err();
        assert!(matches!(err, StorageError::Validation(_)));
    }

    #[test]
    fn list_users_in_id_order() {
        let (_dir, storage) = test_storage();
        assert!(storage.list_users().unwrap().is_empty());

        let first = storage.create_user(&sample_user()).unwrap();
        let mut other = sample_user();
        other.email = "other@example.com".into();
        let second = storage.create_user(&other).unwrap();

        let ids: Vec<i64> = storage.list_users().unwrap().iter().map(|u| u.id).collect();
        assert_eq!(ids, [first, second]);
    }

    #[test]
    fn update_user() {
        let (_dir, storage) = test_storage();
        let id = storage.create_user(&sample_user()).unwrap();

        let mut changed = sample_user();
        changed.last_name = "Murray Hopper".into();
        storage.update_user(id, &changed).unwrap();

        let loaded = storage.get_user(id).unwrap();
        assert_eq!(loaded.last_name, "Murray Hopper");
        assert!(loaded.updated_at >= loaded.created_at);

        let err = storage.update_user(999, &changed).unwrap_err();
        assert!(matches!(err, StorageError::NotFound { .. }));
    }

    #[test]
    fn delete_user_cascades_to_workouts() {
        let (_dir, storage) = test_storage();
        let user_id = storage.create_user(&sample_user()).unwrap();
        let movement_id = storage
            .create_movement(&NewMovement {
                name: "Deadlift".into(),
                movement_type: MovementType::Strength,
                description: None,
                muscles: Vec::new(),
            })
            .unwrap();
        let workout_id = storage
            .create_workout(&NewWorkout {
                user_id,
                date: date(2024, 2, 2),
                notes: String::new(),
                duration: SignedDuration::ZERO,
                movement_instances: vec![NewMovementInstance {
                    movement_id,
                    ..Default::default()
                }],
            })
            .unwrap();

        storage.delete_user(user_id).unwrap();

        assert!(matches!(
            storage.get_user(user_id).unwrap_err(),
            StorageError::NotFound { .. }
        ));
        assert!(matches!(
            storage.get_workout(workout_id).unwrap_err(),
            StorageError::NotFound { .. }
        ));
        assert!(
            storage
                .list_movement_instances_by_workout(workout_id)
                .unwrap()
                .is_empty()
        );

        let err = storage.delete_user(user_id).unwrap_err();
        assert!(matches!(err, StorageError::NotFound { .. }));
    }
}
