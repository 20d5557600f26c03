//! Movement storage: create, load, update, list, and delete movements.

use jiff::Timestamp;
use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::model::{Movement, MovementType, NewMovement};

use super::{Context, Result, Storage, StorageError, parse_timestamp, timestamp_text};

/// Movement columns, muscle names last as a JSON array.
///
/// Shared with the joined instance and workout queries, which select these
/// after their own columns with the movements table aliased as `m`.
pub(super) const MOVEMENT_COLUMNS: &str =
    "m.id, m.name, m.movement_type, m.description, m.created_at, m.updated_at,
     (SELECT json_group_array(mu.name)
      FROM movement_muscles mm JOIN muscles mu ON mu.id = mm.muscle_id
      WHERE mm.movement_id = m.id)";

/// Raw movement columns, read starting at some offset within a row.
#[derive(Debug)]
pub(super) struct MovementRow {
    id: i64,
    name: String,
    movement_type: String,
    description: Option<String>,
    created_at: String,
    updated_at: String,
    muscles: String,
}

impl MovementRow {
    pub(super) fn read(row: &Row<'_>, offset: usize) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(offset)?,
            name: row.get(offset + 1)?,
            movement_type: row.get(offset + 2)?,
            description: row.get(offset + 3)?,
            created_at: row.get(offset + 4)?,
            updated_at: row.get(offset + 5)?,
            muscles: row.get(offset + 6)?,
        })
    }

    pub(super) fn into_movement(self) -> Result<Movement> {
        let mut muscles: Vec<String> = serde_json::from_str(&self.muscles)
            .map_err(|e| StorageError::Corrupt(format!("invalid movement muscles: {e}")))?;
        muscles.sort();
        Ok(Movement {
            id: self.id,
            name: self.name,
            movement_type: MovementType::from(self.movement_type),
            description: self.description,
            muscles,
            created_at: parse_timestamp(&self.created_at, "movement created_at")?,
            updated_at: parse_timestamp(&self.updated_at, "movement updated_at")?,
        })
    }
}

impl Storage {
    /// Creates a movement tagged with its muscles. Names are unique.
    pub fn create_movement(&self, movement: &NewMovement) -> Result<i64> {
        validate(movement)?;
        let mut conn = self.open()?;
        let tx = conn.transaction().op("begin movement create")?;

        tx.execute(
            "INSERT INTO movements (name, movement_type, description, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)",
            params![
                &movement.name,
                movement.movement_type.as_str(),
                &movement.description,
                timestamp_text(Timestamp::now()),
            ],
        )
        .op("create movement")?;
        let id = tx.last_insert_rowid();
        tag_muscles(&tx, id, &movement.muscles)?;
        tx.commit().op("commit movement create")?;

        tracing::debug!(id, name = %movement.name, "Created movement");
        Ok(id)
    }

    pub fn get_movement(&self, id: i64) -> Result<Movement> {
        let conn = self.open()?;
        conn.query_row(
            &format!("SELECT {MOVEMENT_COLUMNS} FROM movements m WHERE m.id = ?1"),
            [id],
            |row| MovementRow::read(row, 0),
        )
        .optional()
        .op("get movement")?
        .ok_or_else(|| StorageError::not_found("movement", id))?
        .into_movement()
    }

    pub fn get_movement_by_name(&self, name: &str) -> Result<Movement> {
        let conn = self.open()?;
        conn.query_row(
            &format!("SELECT {MOVEMENT_COLUMNS} FROM movements m WHERE m.name = ?1"),
            [name],
            |row| MovementRow::read(row, 0),
        )
        .optional()
        .op("get movement by name")?
        .ok_or_else(|| StorageError::not_found("movement", name))?
        .into_movement()
    }

    /// Lists all movements, ordered by name.
    pub fn list_movements(&self) -> Result<Vec<Movement>> {
        let conn = self.open()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {MOVEMENT_COLUMNS} FROM movements m ORDER BY m.name"
            ))
            .op("list movements")?;
        let rows = stmt
            .query_map([], |row| MovementRow::read(row, 0))
            .op("list movements")?;
        let mut movements = Vec::new();
        for row in rows {
            movements.push(row.op("list movements")?.into_movement()?);
        }
        Ok(movements)
    }

    /// Replaces a movement's name, type, description, and muscles.
    ///
    /// The type is fixed once any instance references the movement, since
    /// stored logs are decoded by it.
    pub fn update_movement(&self, id: i64, movement: &NewMovement) -> Result<()> {
        validate(movement)?;
        let mut conn = self.open()?;
        let tx = conn.transaction().op("begin movement update")?;

        let current: String = tx
            .query_row(
                "SELECT movement_type FROM movements WHERE id = ?1",
                [id],
                |row| row.get(0),
            )
            .optional()
            .op("look up movement type")?
            .ok_or_else(|| StorageError::not_found("movement", id))?;

        if current != movement.movement_type.as_str() {
            let instances: i64 = tx
                .query_row(
                    "SELECT count(*) FROM movement_instances WHERE movement_id = ?1",
                    [id],
                    |row| row.get(0),
                )
                .op("count movement instances")?;
            if instances > 0 {
                return Err(StorageError::Validation(format!(
                    "movement {id} is {current} and has {instances} recorded instances; \
                     its type cannot change to {}",
                    movement.movement_type
                )));
            }
        }

        tx.execute(
            "UPDATE movements
             SET name = ?1, movement_type = ?2, description = ?3, updated_at = ?4
             WHERE id = ?5",
            params![
                &movement.name,
                movement.movement_type.as_str(),
                &movement.description,
                timestamp_text(Timestamp::now()),
                id,
            ],
        )
        .op("update movement")?;
        tx.execute("DELETE FROM movement_muscles WHERE movement_id = ?1", [id])
            .op("clear movement muscles")?;
        tag_muscles(&tx, id, &movement.muscles)?;
        tx.commit().op("commit movement update")?;

        tracing::debug!(id, "Updated movement");
        Ok(())
    }

    /// Deletes a movement and its muscle tags.
    ///
    /// Fails with a constraint violation while any instance references it.
    pub fn delete_movement(&self, id: i64) -> Result<()> {
        let conn = self.open()?;
        let rows = conn
            .execute("DELETE FROM movements WHERE id = ?1", [id])
            .op("delete movement")?;
        if rows == 0 {
            return Err(StorageError::not_found("movement", id));
        }
        tracing::debug!(id, "Deleted movement");
        Ok(())
    }
}

fn validate(movement: &NewMovement) -> Result<()> {
    if movement.name.trim().is_empty() {
        return Err(StorageError::Validation("movement name is empty".into()));
    }
    Ok(())
}

/// Links a movement to each named muscle. Repeated names are linked once.
fn tag_muscles(conn: &Connection, movement_id: i64, muscles: &[String]) -> Result<()> {
    for name in muscles {
        let muscle_id: i64 = conn
            .query_row("SELECT id FROM muscles WHERE name = ?1", [name], |row| {
                row.get(0)
            })
            .optional()
            .op("look up muscle")?
            .ok_or_else(|| StorageError::Validation(format!("unknown muscle {name:?}")))?;
        conn.execute(
            "INSERT OR IGNORE INTO movement_muscles (movement_id, muscle_id) VALUES (?1, ?2)",
            [movement_id, muscle_id],
        )
        .op("tag movement muscle")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::TempDir;

    use crate::model::{
        NewMovementInstance, NewMuscle, NewUser, NewWorkout, PerformanceLog, Set, StrengthLog,
    };

    fn test_storage() -> (TempDir, Storage) {
        let dir = TempDir::new().unwrap();
        let storage = Storage::new(dir.path().join("flexcreek.sqlite")).unwrap();
        (dir, storage)
    }

    fn squat() -> NewMovement {
        NewMovement {
            name: "Squat".into(),
            movement_type: MovementType::Strength,
            description: Some("Back squat, high bar".into()),
            muscles: Vec::new(),
        }
    }

    #[test]
    fn create_and_get_movement() {
        let (_dir, storage) = test_storage();

        let id = storage.create_movement(&squat()).unwrap();
        let loaded = storage.get_movement(id).unwrap();

        assert_eq!(loaded.id, id);
        assert_eq!(loaded.name, "Squat");
        assert_eq!(loaded.movement_type, MovementType::Strength);
        assert_eq!(loaded.description.as_deref(), Some("Back squat, high bar"));
        assert_eq!(loaded.created_at, loaded.updated_at);
    }

    #[test]
    fn get_movement_by_name() {
        let (_dir, storage) = test_storage();
        let id = storage.create_movement(&squat()).unwrap();

        let loaded = storage.get_movement_by_name("Squat").unwrap();
        assert_eq!(loaded.id, id);

        let err = storage.get_movement_by_name("Deadlift").unwrap_err();
        assert!(matches!(err, StorageError::NotFound { entity: "movement", .. }));
    }

    #[test]
    fn duplicate_name_is_constraint_violation() {
        let (_dir, storage) = test_storage();
        storage.create_movement(&squat()).unwrap();

        let err = storage.create_movement(&squat()).unwrap_err();
        assert!(matches!(err, StorageError::ConstraintViolation { .. }));
    }

    #[test]
    fn empty_name_is_rejected() {
        let (_dir, storage) = test_storage();
        let mut movement = squat();
        movement.name = "  ".into();

        let err = storage.create_movement(&movement).unwrap_err();
        assert!(matches!(err, StorageError::Validation(_)));
    }

    #[test]
    fn unknown_type_survives_storage() {
        let (_dir, storage) = test_storage();
        let id = storage
            .create_movement(&NewMovement {
                name: "Tabata Row".into(),
                movement_type: MovementType::Other("tabata".into()),
                description: None,
                muscles: Vec::new(),
            })
            .unwrap();

        let loaded = storage.get_movement(id).unwrap();
        assert_eq!(loaded.movement_type, MovementType::Other("tabata".into()));
    }

    #[test]
    fn list_movements_sorted_by_name() {
        let (_dir, storage) = test_storage();
        storage.create_movement(&squat()).unwrap();
        storage
            .create_movement(&NewMovement {
                name: "Bench Press".into(),
                movement_type: MovementType::Strength,
                description: None,
                muscles: Vec::new(),
            })
            .unwrap();

        let names: Vec<_> = storage
            .list_movements()
            .unwrap()
            .into_iter()
            .map(|m| m.name)
            .collect();
        assert_eq!(names, ["Bench Press", "Squat"]);
    }

    #[test]
    fn list_movements_empty() {
        let (_dir, storage) = test_storage();
        assert!(storage.list_movements().unwrap().is_empty());
    }

    #[test]
    fn update_movement() {
        let (_dir, storage) = test_storage();
        let id = storage.create_movement(&squat()).unwrap();

        let mut changed = squat();
        changed.name = "Front Squat".into();
        changed.description = None;
        storage.update_movement(id, &changed).unwrap();

        let loaded = storage.get_movement(id).unwrap();
        assert_eq!(loaded.name, "Front Squat");
        assert_eq!(loaded.description, None);
        assert!(loaded.updated_at >= loaded.created_at);
    }

    #[test]
    fn update_nonexistent_movement_fails() {
        let (_dir, storage) = test_storage();
        let err = storage.update_movement(42, &squat()).unwrap_err();
        assert!(matches!(err, StorageError::NotFound { .. }));
    }

    #[test]
    fn delete_movement() {
        let (_dir, storage) = test_storage();
        let id = storage.create_movement(&squat()).unwrap();

        storage.delete_movement(id).unwrap();
        let err = storage.get_movement(id).unwrap_err();
        assert!(matches!(err, StorageError::NotFound { .. }));

        let err = storage.delete_movement(id).unwrap_err();
        assert!(matches!(err, StorageError::NotFound { .. }));
    }

    #[test]
    fn delete_referenced_movement_is_constraint_violation() {
        let (_dir, storage) = test_storage();
        let movement_id = storage.create_movement(&squat()).unwrap();
        let user_id = storage
            .create_user(&NewUser {
                first_name: "Ada".into(),
                last_name: "Lovelace".into(),
                email: "ada@example.com".into(),
                hashed_password: String::new(),
            })
            .unwrap();
        storage
            .create_workout(&NewWorkout {
                user_id,
                date: jiff::civil::date(2024, 3, 1),
                notes: String::new(),
                duration: jiff::SignedDuration::ZERO,
                movement_instances: vec![NewMovementInstance {
                    movement_id,
                    ..Default::default()
                }],
            })
            .unwrap();

        let err = storage.delete_movement(movement_id).unwrap_err();
        assert!(matches!(err, StorageError::ConstraintViolation { .. }));
    }

    /// Records one workout with a single 5x225 instance of the movement.
    fn record_sets(storage: &Storage, movement_id: i64) -> i64 {
        let user_id = storage
            .create_user(&NewUser {
                email: "lifter@example.com".into(),
                ..Default::default()
            })
            .unwrap();
        storage
            .create_workout(&NewWorkout {
                user_id,
                date: jiff::civil::date(2024, 3, 4),
                notes: String::new(),
                duration: jiff::SignedDuration::ZERO,
                movement_instances: vec![NewMovementInstance {
                    movement_id,
                    log: Some(PerformanceLog::Strength(StrengthLog {
                        sets: vec![Set {
                            reps: 5,
                            weight: 225.0,
                        }],
                    })),
                    ..Default::default()
                }],
            })
            .unwrap()
    }

    #[test]
    fn type_change_rejected_once_instances_exist() {
        let (_dir, storage) = test_storage();
        let movement_id = storage.create_movement(&squat()).unwrap();
        let workout_id = record_sets(&storage, movement_id);

        for movement_type in [MovementType::Amrap, MovementType::Cardio] {
            let mut changed = squat();
            changed.movement_type = movement_type;
            let err = storage.update_movement(movement_id, &changed).unwrap_err();
            assert!(matches!(err, StorageError::Validation(_)));
        }

        assert_eq!(
            storage.get_movement(movement_id).unwrap().movement_type,
            MovementType::Strength
        );
        let workout = storage.get_workout(workout_id).unwrap();
        assert!(matches!(
            &workout.movement_instances[0].log,
            Some(PerformanceLog::Strength(log)) if log.sets[0].weight == 225.0
        ));
        assert_eq!(
            storage
                .list_workouts_by_user(workout.user_id)
                .unwrap()
                .len(),
            1
        );
    }

    #[test]
    fn same_type_update_allowed_with_instances() {
        let (_dir, storage) = test_storage();
        let movement_id = storage.create_movement(&squat()).unwrap();
        record_sets(&storage, movement_id);

        let mut changed = squat();
        changed.name = "Low Bar Squat".into();
        storage.update_movement(movement_id, &changed).unwrap();

        assert_eq!(storage.get_movement(movement_id).unwrap().name, "Low Bar Squat");
    }

    #[test]
    fn type_change_allowed_without_instances() {
        let (_dir, storage) = test_storage();
        let id = storage.create_movement(&squat()).unwrap();

        let mut changed = squat();
        changed.movement_type = MovementType::Emom;
        storage.update_movement(id, &changed).unwrap();

        assert_eq!(
            storage.get_movement(id).unwrap().movement_type,
            MovementType::Emom
        );
    }

    #[test]
    fn muscles_are_tagged_and_loaded() {
        let (_dir, storage) = test_storage();
        for name in ["Quadriceps", "Glutes", "Hamstrings"] {
            storage.create_muscle(&NewMuscle { name: name.into() }).unwrap();
        }

        let mut movement = squat();
        movement.muscles = vec!["Quadriceps".into(), "Glutes".into(), "Glutes".into()];
        let id = storage.create_movement(&movement).unwrap();

        assert_eq!(storage.get_movement(id).unwrap().muscles, ["Glutes", "Quadriceps"]);
        assert_eq!(
            storage.get_movement_by_name("Squat").unwrap().muscles,
            ["Glutes", "Quadriceps"]
        );
        assert_eq!(
            storage.list_movements().unwrap()[0].muscles,
            ["Glutes", "Quadriceps"]
        );

        movement.muscles = vec!["Hamstrings".into()];
        storage.update_movement(id, &movement).unwrap();
        assert_eq!(storage.get_movement(id).unwrap().muscles, ["Hamstrings"]);
    }

    #[test]
    fn muscles_resolve_through_workout_reads() {
        let (_dir, storage) = test_storage();
        storage
            .create_muscle(&NewMuscle {
                name: "Quadriceps".into(),
            })
            .unwrap();
        let mut movement = squat();
        movement.muscles = vec!["Quadriceps".into()];
        let movement_id = storage.create_movement(&movement).unwrap();

        let workout_id = record_sets(&storage, movement_id);

        let workout = storage.get_workout(workout_id).unwrap();
        assert_eq!(workout.movement_instances[0].movement.muscles, ["Quadriceps"]);
    }

    #[test]
    fn unknown_muscle_rejects_whole_movement() {
        let (_dir, storage) = test_storage();
        let mut movement = squat();
        movement.muscles = vec!["Quadriceps".into()];

        let err = storage.create_movement(&movement).unwrap_err();
        assert!(matches!(err, StorageError::Validation(_)));
        assert!(storage.list_movements().unwrap().is_empty());
    }

    #[test]
    fn deleting_muscle_drops_tag() {
        let (_dir, storage) = test_storage();
        let muscle_id = storage
            .create_muscle(&NewMuscle {
                name: "Glutes".into(),
            })
            .unwrap();
        let mut movement = squat();
        movement.muscles = vec!["Glutes".into()];
        let id = storage.create_movement(&movement).unwrap();

        storage.delete_muscle(muscle_id).unwrap();

        assert!(storage.get_movement(id).unwrap().muscles.is_empty());
    }
}
