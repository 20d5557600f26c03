//! Muscle storage.

use jiff::Timestamp;
use rusqlite::{OptionalExtension, Row};

use crate::model::{Muscle, NewMuscle};

use super::{Context, Result, Storage, StorageError, parse_timestamp, timestamp_text};

const SELECT_MUSCLE: &str = "SELECT id, name, created_at, updated_at FROM muscles";

fn read_muscle(row: &Row<'_>) -> rusqlite::Result<(i64, String, String, String)> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
}

fn into_muscle((id, name, created_at, updated_at): (i64, String, String, String)) -> Result<Muscle> {
    Ok(Muscle {
        id,
        name,
        created_at: parse_timestamp(&created_at, "muscle created_at")?,
        updated_at: parse_timestamp(&updated_at, "muscle updated_at")?,
    })
}

impl Storage {
    pub fn create_muscle(&self, muscle: &NewMuscle) -> Result<i64> {
        if muscle.name.trim().is_empty() {
            return Err(StorageError::Validation("muscle name is empty".into()));
        }
        let conn = self.open()?;
        conn.execute(
            "INSERT INTO muscles (name, created_at, updated_at) VALUES (?1, ?2, ?2)",
            (&muscle.name, timestamp_text(Timestamp::now())),
        )
        .op("create muscle")?;
        let id = conn.last_insert_rowid();
        tracing::debug!(id, name = %muscle.name, "Created muscle");
        Ok(id)
    }

    pub fn get_muscle(&self, id: i64) -> Result<Muscle> {
        let conn = self.open()?;
        let raw = conn
            .query_row(&format!("{SELECT_MUSCLE} WHERE id = ?1"), [id], read_muscle)
            .optional()
            .op("get muscle")?
            .ok_or_else(|| StorageError::not_found("muscle", id))?;
        into_muscle(raw)
    }

    pub fn get_muscle_by_name(&self, name: &str) -> Result<Muscle> {
        let conn = self.open()?;
        let raw = conn
            .query_row(
                &format!("{SELECT_MUSCLE} WHERE name = ?1"),
                [name],
                read_muscle,
            )
            .optional()
            .op("get muscle by name")?
            .ok_or_else(|| StorageError::not_found("muscle", name))?;
        into_muscle(raw)
    }

    /// Lists all muscles, ordered by name.
    pub fn list_muscles(&self) -> Result<Vec<Muscle>> {
        let conn = self.open()?;
        let mut stmt = conn
            .prepare(&format!("{SELECT_MUSCLE} ORDER BY name"))
            .op("list muscles")?;
        let rows = stmt.query_map([], read_muscle).op("list muscles")?;
        let mut muscles = Vec::new();
        for row in rows {
            muscles.push(into_muscle(row.op("list muscles")?)?);
        }
        Ok(muscles)
    }

    pub fn delete_muscle(&self, id: i64) -> Result<()> {
        let conn = self.open()?;
        let rows = conn
            .execute("DELETE FROM muscles WHERE id = ?1", [id])
            .op("delete muscle")?;
        if rows == 0 {
            return Err(StorageError::not_found("muscle", id));
        }
        tracing::debug!(id, "Deleted muscle");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::TempDir;

    fn test_storage() -> (TempDir, Storage) {
        let dir = TempDir::new().unwrap();
        let storage = Storage::new(dir.path().join("flexcreek.sqlite")).unwrap();
        (dir, storage)
    }

    fn muscle(name: &str) -> NewMuscle {
        NewMuscle { name: name.into() }
    }

    #[test]
    fn create_and_get_muscle() {
        let (_dir, storage) = test_storage();

        let id = storage.create_muscle(&muscle("Quadriceps")).unwrap();

        assert_eq!(storage.get_muscle(id).unwrap().name, "Quadriceps");
        assert_eq!(storage.get_muscle_by_name("Quadriceps").unwrap().id, id);
    }

    #[test]
    fn duplicate_muscle_is_constraint_violation() {
        let (_dir, storage) = test_storage();
        storage.create_muscle(&muscle("Glutes")).unwrap();

        let err = storage.create_muscle(&muscle("Glutes")).unwrap_err();
        assert!(matches!(err, StorageError::ConstraintViolation { .. }));
    }

    #[test]
    fn list_muscles_sorted_by_name() {
        let (_dir, storage) = test_storage();
        storage.create_muscle(&muscle("Triceps")).unwrap();
        storage.create_muscle(&muscle("Biceps")).unwrap();

        let names: Vec<String> = storage
            .list_muscles()
            .unwrap()
            .into_iter()
            .map(|m| m.name)
            .collect();
        assert_eq!(names, ["Biceps", "Triceps"]);
    }

    #[test]
    fn delete_muscle() {
        let (_dir, storage) = test_storage();
        let id = storage.create_muscle(&muscle("Lats")).unwrap();

        storage.delete_muscle(id).unwrap();

        assert!(matches!(
            storage.get_muscle(id).unwrap_err(),
            StorageError::NotFound { entity: "muscle", .. }
        ));
        assert!(matches!(
            storage.delete_muscle(id).unwrap_err(),
            StorageError::NotFound { .. }
        ));
    }
}
