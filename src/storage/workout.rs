//! Workout storage: a workout and its movement instances as one unit.
//!
//! Writes run in a single transaction and delegate instance rows to an
//! [`InstanceStore`] bound to that transaction. If any statement fails the
//! transaction is dropped uncommitted and rolls back, so a partial workout
//! is never visible.
//!
//! Reads issue one left join across workouts, instances, and movements and
//! fold the flattened rows back into workouts. A workout without instances
//! comes back as a single row whose instance columns are all null.
//!
//! Deletion removes a workout's instances explicitly, inside the same
//! transaction, rather than relying on the schema's `ON DELETE CASCADE`.

use std::collections::{HashMap, hash_map::Entry};

use jiff::{SignedDuration, Timestamp, civil::Date};
use rusqlite::{Connection, Params, Row, params};

use crate::model::{NewMovementInstance, NewWorkout, Workout};

use super::{
    Context, InstanceStore, Result, Storage, StorageError,
    movement::MOVEMENT_COLUMNS,
    movement_instance::{INSTANCE_COLUMNS, InstanceRow},
    parse_date, parse_timestamp, timestamp_text,
};

const SELECT_WORKOUT: &str = "SELECT w.id, w.user_id, w.workout_date, w.notes, w.duration_seconds,
        w.created_at, w.updated_at";

const WORKOUT_JOIN: &str = "FROM workouts w
     LEFT JOIN movement_instances mi ON mi.workout_id = w.id
     LEFT JOIN movements m ON m.id = mi.movement_id";

/// Number of workout columns ahead of the instance columns.
const WORKOUT_COLUMNS: usize = 7;

/// Raw workout columns, before parsing.
#[derive(Debug)]
struct WorkoutRow {
    id: i64,
    user_id: i64,
    date: String,
    notes: String,
    duration_seconds: i64,
    created_at: String,
    updated_at: String,
}

impl WorkoutRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            date: row.get(2)?,
            notes: row.get(3)?,
            duration_seconds: row.get(4)?,
            created_at: row.get(5)?,
            updated_at: row.get(6)?,
        })
    }

    fn into_workout(self) -> Result<Workout> {
        Ok(Workout {
            id: self.id,
            user_id: self.user_id,
            date: parse_date(&self.date)?,
            notes: self.notes,
            duration: SignedDuration::from_secs(self.duration_seconds),
            movement_instances: Vec::new(),
            created_at: parse_timestamp(&self.created_at, "workout created_at")?,
            updated_at: parse_timestamp(&self.updated_at, "workout updated_at")?,
        })
    }
}

/// One row of the workout join: the parent plus at most one instance.
struct JoinedRow {
    workout: WorkoutRow,
    instance: Option<InstanceRow>,
}

impl JoinedRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        let workout = WorkoutRow::read(row)?;
        // A null instance id means the left join found nothing for this workout.
        let instance = match row.get::<_, Option<i64>>(WORKOUT_COLUMNS)? {
            Some(_) => Some(InstanceRow::read(row, WORKOUT_COLUMNS)?),
            None => None,
        };
        Ok(Self { workout, instance })
    }
}

impl Storage {
    /// Creates a workout and all of its instances atomically.
    ///
    /// Each instance is assigned the new workout's ID. Returns the workout ID.
    pub fn create_workout(&self, workout: &NewWorkout) -> Result<i64> {
        validate(workout)?;
        let mut conn = self.open()?;
        let tx = conn.transaction().op("begin workout create")?;

        tx.execute(
            "INSERT INTO workouts
                 (user_id, workout_date, notes, duration_seconds, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
            params![
                workout.user_id,
                workout.date.to_string(),
                &workout.notes,
                workout.duration.as_secs(),
                timestamp_text(Timestamp::now()),
            ],
        )
        .op("create workout")?;
        let id = tx.last_insert_rowid();

        insert_instances(&tx, id, &workout.movement_instances)?;
        tx.commit().op("commit workout create")?;

        tracing::debug!(
            id,
            user_id = workout.user_id,
            instances = workout.movement_instances.len(),
            "Created workout"
        );
        Ok(id)
    }

    /// Loads a workout with its instances in insertion order.
    pub fn get_workout(&self, id: i64) -> Result<Workout> {
        let conn = self.open()?;
        collect_workouts(
            &conn,
            "get workout",
            &format!(
                "{SELECT_WORKOUT}, {INSTANCE_COLUMNS}, {MOVEMENT_COLUMNS} {WORKOUT_JOIN}
                 WHERE w.id = ?1
                 ORDER BY mi.id"
            ),
            [id],
        )?
        .into_iter()
        .next()
        .ok_or_else(|| StorageError::not_found("workout", id))
    }

    /// All of a user's workouts, oldest date first.
    pub fn list_workouts_by_user(&self, user_id: i64) -> Result<Vec<Workout>> {
        let conn = self.open()?;
        collect_workouts(
            &conn,
            "list workouts by user",
            &format!(
                "{SELECT_WORKOUT}, {INSTANCE_COLUMNS}, {MOVEMENT_COLUMNS} {WORKOUT_JOIN}
                 WHERE w.user_id = ?1
                 ORDER BY w.workout_date, w.id, mi.id"
            ),
            [user_id],
        )
    }

    /// A user's workouts on one calendar day.
    pub fn list_workouts_by_date(&self, user_id: i64, date: Date) -> Result<Vec<Workout>> {
        check_date(date)?;
        let conn = self.open()?;
        collect_workouts(
            &conn,
            "list workouts by date",
            &format!(
                "{SELECT_WORKOUT}, {INSTANCE_COLUMNS}, {MOVEMENT_COLUMNS} {WORKOUT_JOIN}
                 WHERE w.user_id = ?1 AND w.workout_date = ?2
                 ORDER BY w.id, mi.id"
            ),
            params![user_id, date.to_string()],
        )
    }

    /// A user's workouts between two calendar days, both inclusive.
    pub fn list_workouts_by_date_range(
        &self,
        user_id: i64,
        start: Date,
        end: Date,
    ) -> Result<Vec<Workout>> {
        if start > end {
            return Err(StorageError::Validation(format!(
                "date range starts after it ends: {start} > {end}"
            )));
        }
        check_date(start)?;
        check_date(end)?;
        let conn = self.open()?;
        collect_workouts(
            &conn,
            "list workouts by date range",
            &format!(
                "{SELECT_WORKOUT}, {INSTANCE_COLUMNS}, {MOVEMENT_COLUMNS} {WORKOUT_JOIN}
                 WHERE w.user_id = ?1 AND w.workout_date BETWEEN ?2 AND ?3
                 ORDER BY w.workout_date, w.id, mi.id"
            ),
            params![user_id, start.to_string(), end.to_string()],
        )
    }

    /// Replaces a workout and its entire instance collection.
    ///
    /// Existing instances are deleted and the supplied ones inserted with
    /// fresh IDs. Anything not resent is gone.
    pub fn update_workout(&self, id: i64, workout: &NewWorkout) -> Result<()> {
        validate(workout)?;
        let mut conn = self.open()?;
        let tx = conn.transaction().op("begin workout update")?;

        let rows = tx
            .execute(
                "UPDATE workouts
                 SET user_id = ?1, workout_date = ?2, notes = ?3, duration_seconds = ?4,
                     updated_at = ?5
                 WHERE id = ?6",
                params![
                    workout.user_id,
                    workout.date.to_string(),
                    &workout.notes,
                    workout.duration.as_secs(),
                    timestamp_text(Timestamp::now()),
                    id,
                ],
            )
            .op("update workout")?;
        if rows == 0 {
            return Err(StorageError::not_found("workout", id));
        }

        let removed = InstanceStore::new(&tx).delete_by_workout(id)?;
        insert_instances(&tx, id, &workout.movement_instances)?;
        tx.commit().op("commit workout update")?;

        tracing::debug!(
            id,
            removed,
            inserted = workout.movement_instances.len(),
            "Updated workout"
        );
        Ok(())
    }

    /// Deletes a workout and its instances atomically.
    pub fn delete_workout(&self, id: i64) -> Result<()> {
        let mut conn = self.open()?;
        let tx = conn.transaction().op("begin workout delete")?;

        let removed = InstanceStore::new(&tx).delete_by_workout(id)?;
        let rows = tx
            .execute("DELETE FROM workouts WHERE id = ?1", [id])
            .op("delete workout")?;
        if rows == 0 {
            return Err(StorageError::not_found("workout", id));
        }
        tx.commit().op("commit workout delete")?;

        tracing::debug!(id, removed, "Deleted workout");
        Ok(())
    }
}

fn validate(workout: &NewWorkout) -> Result<()> {
    if workout.user_id <= 0 {
        return Err(StorageError::Validation(
            "a workout requires a user id".into(),
        ));
    }
    if workout.duration.subsec_nanos() != 0 {
        return Err(StorageError::Validation(format!(
            "workout duration must be whole seconds, got {}",
            workout.duration
        )));
    }
    check_date(workout.date)
}

/// Dates are stored as `YYYY-MM-DD` text, which only sorts by time for
/// four-digit years.
fn check_date(date: Date) -> Result<()> {
    if !(1..=9999).contains(&date.year()) {
        return Err(StorageError::Validation(format!(
            "workout date {date} is outside years 1 to 9999"
        )));
    }
    Ok(())
}

/// Inserts instances for a workout, in order, on the caller's transaction.
fn insert_instances(
    conn: &Connection,
    workout_id: i64,
    instances: &[NewMovementInstance],
) -> Result<()> {
    let store = InstanceStore::new(conn);
    for (position, instance) in instances.iter().enumerate() {
        if let Err(e) = store.insert(workout_id, instance) {
            tracing::warn!(
                workout_id,
                position,
                error = %e,
                "Movement instance insert failed; rolling back workout"
            );
            return Err(e);
        }
    }
    Ok(())
}

/// Runs a workout join and folds its rows back into workouts.
///
/// Workouts come out in the order they first appear in the row stream; the
/// index map only finds the slot for rows that repeat a parent.
fn collect_workouts(
    conn: &Connection,
    op: &'static str,
    sql: &str,
    params: impl Params,
) -> Result<Vec<Workout>> {
    let mut stmt = conn.prepare(sql).op(op)?;
    let rows = stmt.query_map(params, JoinedRow::read).op(op)?;

    let mut workouts: Vec<Workout> = Vec::new();
    let mut slots: HashMap<i64, usize> = HashMap::new();
    for row in rows {
        let JoinedRow { workout, instance } = row.op(op)?;
        let slot = match slots.entry(workout.id) {
            Entry::Occupied(e) => *e.get(),
            Entry::Vacant(e) => {
                workouts.push(workout.into_workout()?);
                *e.insert(workouts.len() - 1)
            }
        };
        if let Some(instance) = instance {
            workouts[slot]
                .movement_instances
                .push(instance.into_instance()?);
        }
    }
    Ok(workouts)
}
