//! Output formatting for CLI display.

use flexcreek::model::{PerformanceLog, Workout};

/// One line per workout: id, date, duration, and what was done.
pub(super) fn format_workout_line(workout: &Workout) -> String {
    let minutes = workout.duration.as_secs() / 60;
    let movements = if workout.movement_instances.is_empty() {
        "no movements".to_string()
    } else {
        workout
            .movement_instances
            .iter()
            .map(|mi| match &mi.log {
                Some(log) => format!("{} ({})", mi.movement.name, format_log(log)),
                None => mi.movement.name.clone(),
            })
            .collect::<Vec<_>>()
            .join(", ")
    };
    format!("{:>4}  {}  {minutes:>3}m  {movements}", workout.id, workout.date)
}

/// A compact summary of a performance log.
pub(super) fn format_log(log: &PerformanceLog) -> String {
    match log {
        PerformanceLog::Strength(s) => s
            .sets
            .iter()
            .map(|set| format!("{}x{}", set.reps, set.weight))
            .collect::<Vec<_>>()
            .join(" "),
        PerformanceLog::Cardio(c) => match (c.distance, c.duration) {
            (Some(d), Some(t)) => format!("{d} in {t}"),
            (Some(d), None) => format!("{d}"),
            (None, Some(t)) => format!("{t}"),
            (None, None) => "-".to_string(),
        },
        PerformanceLog::Amrap(a) => {
            format!("{} rounds + {} in {}", a.rounds, a.extra_reps, a.duration)
        }
        PerformanceLog::Emom(e) => format!("{} for {}", e.work, e.duration),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use flexcreek::model::{Set, StrengthLog};

    #[test]
    fn strength_sets_are_compact() {
        let log = PerformanceLog::Strength(StrengthLog {
            sets: vec![
                Set {
                    reps: 5,
                    weight: 225.0,
                },
                Set {
                    reps: 3,
                    weight: 245.5,
                },
            ],
        });
        assert_eq!(format_log(&log), "5x225 3x245.5");
    }
}
