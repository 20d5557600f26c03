//! Movement instance storage.
//!
//! [`InstanceStore`] borrows a connection instead of opening its own, so the
//! workout store can run it inside a transaction it owns. A
//! `rusqlite::Transaction` derefs to a `Connection`, which gives both the
//! same execute/query surface.

use jiff::Timestamp;
use rusqlite::{Connection, OptionalExtension, Params, Row, params};

use crate::model::{MovementInstance, MovementType, NewMovementInstance};

use super::{
    Context, Result, Storage, StorageError, log_codec,
    movement::{MOVEMENT_COLUMNS, MovementRow},
    parse_timestamp, timestamp_text,
};

/// Instance columns. Queries follow them with [`MOVEMENT_COLUMNS`] for the
/// referenced movement.
pub(super) const INSTANCE_COLUMNS: &str =
    "mi.id, mi.workout_id, mi.notes, mi.rpe, mi.log_data, mi.created_at, mi.updated_at";

/// Raw instance columns plus the joined movement, before parsing.
#[derive(Debug)]
pub(super) struct InstanceRow {
    id: i64,
    workout_id: i64,
    notes: String,
    rpe: Option<u8>,
    log_data: Option<String>,
    created_at: String,
    updated_at: String,
    movement: MovementRow,
}

impl InstanceRow {
    /// Reads [`INSTANCE_COLUMNS`] then [`MOVEMENT_COLUMNS`], starting at `offset`.
    pub(super) fn read(row: &Row<'_>, offset: usize) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(offset)?,
            workout_id: row.get(offset + 1)?,
            notes: row.get(offset + 2)?,
            rpe: row.get(offset + 3)?,
            log_data: row.get(offset + 4)?,
            created_at: row.get(offset + 5)?,
            updated_at: row.get(offset + 6)?,
            movement: MovementRow::read(row, offset + 7)?,
        })
    }

    /// Parses the row, decoding the log under the movement's type.
    pub(super) fn into_instance(self) -> Result<MovementInstance> {
        let movement = self.movement.into_movement()?;
        let log = log_codec::decode(self.log_data.as_deref(), &movement.movement_type)?;
        Ok(MovementInstance {
            id: self.id,
            workout_id: self.workout_id,
            movement,
            notes: self.notes,
            rpe: self.rpe,
            log,
            created_at: parse_timestamp(&self.created_at, "instance created_at")?,
            updated_at: parse_timestamp(&self.updated_at, "instance updated_at")?,
        })
    }
}

/// Movement instance operations over a borrowed connection or transaction.
pub struct InstanceStore<'c> {
    conn: &'c Connection,
}

impl<'c> InstanceStore<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    /// Inserts an instance and returns its ID.
    ///
    /// The instance must reference a movement, and a log, if present, must
    /// match that movement's type.
    pub fn create(&self, instance: &NewMovementInstance) -> Result<i64> {
        self.insert(instance.workout_id, instance)
    }

    /// Inserts an instance under `workout_id`, ignoring the draft's own.
    pub(super) fn insert(&self, workout_id: i64, instance: &NewMovementInstance) -> Result<i64> {
        self.validate(instance)?;
        let log_data = log_codec::encode(instance.log.as_ref())?;
        self.conn
            .execute(
                "INSERT INTO movement_instances
                     (workout_id, movement_id, notes, rpe, log_data, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
                params![
                    workout_id,
                    instance.movement_id,
                    &instance.notes,
                    instance.rpe,
                    log_data,
                    timestamp_text(Timestamp::now()),
                ],
            )
            .op("create movement instance")?;
        let id = self.conn.last_insert_rowid();
        tracing::debug!(
            id,
            workout_id,
            movement_id = instance.movement_id,
            "Created movement instance"
        );
        Ok(id)
    }

    /// Loads one instance with its movement resolved.
    pub fn get(&self, id: i64) -> Result<MovementInstance> {
        self.conn
            .query_row(
                &format!(
                    "SELECT {INSTANCE_COLUMNS}, {MOVEMENT_COLUMNS}
                     FROM movement_instances mi
                     JOIN movements m ON m.id = mi.movement_id
                     WHERE mi.id = ?1"
                ),
                [id],
                |row| InstanceRow::read(row, 0),
            )
            .optional()
            .op("get movement instance")?
            .ok_or_else(|| StorageError::not_found("movement instance", id))?
            .into_instance()
    }

    /// Instances belonging to a workout, in insertion order.
    pub fn list_by_workout(&self, workout_id: i64) -> Result<Vec<MovementInstance>> {
        self.query(
            "list instances by workout",
            &format!(
                "SELECT {INSTANCE_COLUMNS}, {MOVEMENT_COLUMNS}
                 FROM movement_instances mi
                 JOIN movements m ON m.id = mi.movement_id
                 WHERE mi.workout_id = ?1
                 ORDER BY mi.id"
            ),
            [workout_id],
        )
    }

    /// A user's history for one movement, newest first.
    pub fn list_by_movement_for_user(
        &self,
        user_id: i64,
        movement_id: i64,
    ) -> Result<Vec<MovementInstance>> {
        self.query(
            "list instances by movement",
            &format!(
                "SELECT {INSTANCE_COLUMNS}, {MOVEMENT_COLUMNS}
                 FROM movement_instances mi
                 JOIN workouts w ON w.id = mi.workout_id
                 JOIN movements m ON m.id = mi.movement_id
                 WHERE w.user_id = ?1 AND m.id = ?2
                 ORDER BY mi.created_at DESC, mi.id DESC"
            ),
            [user_id, movement_id],
        )
    }

    /// Every instance across a user's workouts, in insertion order.
    pub fn list_by_user(&self, user_id: i64) -> Result<Vec<MovementInstance>> {
        self.query(
            "list instances by user",
            &format!(
                "SELECT {INSTANCE_COLUMNS}, {MOVEMENT_COLUMNS}
                 FROM movement_instances mi
                 JOIN workouts w ON w.id = mi.workout_id
                 JOIN movements m ON m.id = mi.movement_id
                 WHERE w.user_id = ?1
                 ORDER BY mi.id"
            ),
            [user_id],
        )
    }

    /// Replaces every mutable column of an instance.
    ///
    /// The owning workout's `updated_at` is left alone.
    pub fn update(&self, id: i64, instance: &NewMovementInstance) -> Result<()> {
        self.validate(instance)?;
        let log_data = log_codec::encode(instance.log.as_ref())?;
        let rows = self
            .conn
            .execute(
                "UPDATE movement_instances
                 SET workout_id = ?1, movement_id = ?2, notes = ?3, rpe = ?4, log_data = ?5,
                     updated_at = ?6
                 WHERE id = ?7",
                params![
                    instance.workout_id,
                    instance.movement_id,
                    &instance.notes,
                    instance.rpe,
                    log_data,
                    timestamp_text(Timestamp::now()),
                    id,
                ],
            )
            .op("update movement instance")?;
        if rows == 0 {
            return Err(StorageError::not_found("movement instance", id));
        }
        tracing::debug!(id, "Updated movement instance");
        Ok(())
    }

    pub fn delete(&self, id: i64) -> Result<()> {
        let rows = self
            .conn
            .execute("DELETE FROM movement_instances WHERE id = ?1", [id])
            .op("delete movement instance")?;
        if rows == 0 {
            return Err(StorageError::not_found("movement instance", id));
        }
        tracing::debug!(id, "Deleted movement instance");
        Ok(())
    }

    /// Deletes every instance of a workout, returning how many went.
    pub(super) fn delete_by_workout(&self, workout_id: i64) -> Result<usize> {
        self.conn
            .execute(
                "DELETE FROM movement_instances WHERE workout_id = ?1",
                [workout_id],
            )
            .op("delete workout instances")
    }

    fn query(
        &self,
        op: &'static str,
        sql: &str,
        params: impl Params,
    ) -> Result<Vec<MovementInstance>> {
        let mut stmt = self.conn.prepare(sql).op(op)?;
        let rows = stmt
            .query_map(params, |row| InstanceRow::read(row, 0))
            .op(op)?;
        let mut instances = Vec::new();
        for row in rows {
            instances.push(row.op(op)?.into_instance()?);
        }
        Ok(instances)
    }

    fn validate(&self, instance: &NewMovementInstance) -> Result<()> {
        if instance.movement_id <= 0 {
            return Err(StorageError::Validation(
                "a movement instance requires a movement id".into(),
            ));
        }
        if let Some(rpe) = instance.rpe
            && !(1..=10).contains(&rpe)
        {
            return Err(StorageError::Validation(format!(
                "rpe must be between 1 and 10, got {rpe}"
            )));
        }
        let Some(log) = &instance.log else {
            return Ok(());
        };

        let movement_type: MovementType = self
            .conn
            .query_row(
                "SELECT movement_type FROM movements WHERE id = ?1",
                [instance.movement_id],
                |row| row.get::<_, String>(0),
            )
            .optional()
            .op("look up movement type")?
            .ok_or_else(|| {
                StorageError::Validation(format!(
                    "movement {} does not exist",
                    instance.movement_id
                ))
            })?
            .into();

        let expected = log.movement_type();
        if !matches!(movement_type, MovementType::Other(_)) && movement_type != expected {
            return Err(StorageError::Validation(format!(
                "a {expected} log cannot be recorded for {movement_type} movement {}",
                instance.movement_id
            )));
        }
        Ok(())
    }
}

impl Storage {
    pub fn create_movement_instance(&self, instance: &NewMovementInstance) -> Result<i64> {
        let conn = self.open()?;
        InstanceStore::new(&conn).create(instance)
    }

    pub fn get_movement_instance(&self, id: i64) -> Result<MovementInstance> {
        let conn = self.open()?;
        InstanceStore::new(&conn).get(id)
    }

    pub fn list_movement_instances_by_workout(
        &self,
        workout_id: i64,
    ) -> Result<Vec<MovementInstance>> {
        let conn = self.open()?;
        InstanceStore::new(&conn).list_by_workout(workout_id)
    }

    pub fn list_movement_instances_for_movement(
        &self,
        user_id: i64,
        movement_id: i64,
    ) -> Result<Vec<MovementInstance>> {
        let conn = self.open()?;
        InstanceStore::new(&conn).list_by_movement_for_user(user_id, movement_id)
    }

    pub fn list_movement_instances_by_user(&self, user_id: i64) -> Result<Vec<MovementInstance>> {
        let conn = self.open()?;
        InstanceStore::new(&conn).list_by_user(user_id)
    }

    pub fn update_movement_instance(&self, id: i64, instance: &NewMovementInstance) -> Result<()> {
        let conn = self.open()?;
        InstanceStore::new(&conn).update(id, instance)
    }

    pub fn delete_movement_instance(&self, id: i64) -> Result<()> {
        let conn = self.open()?;
        InstanceStore::new(&conn).delete(id)
    }
}
