//! The timetable produced by a solver run.

use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};

use crate::lesson::Lesson;

/// A finished (or partial) schedule handed back to the caller.
///
/// An unordered collection of class-id → lesson pairs with the derived
/// total cost; how it is rendered, exported or persisted is out of scope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Timetable {
    /// Name of the problem this timetable solves.
    pub name: String,
    /// Wall-clock creation time.
    pub created_at: SystemTime,
    /// Solver runtime that produced it.
    pub runtime: Duration,
    /// Scheduled lessons, keyed by external class id.
    pub lessons: Vec<(String, Lesson)>,
    /// Total weighted cost of the schedule.
    pub total_cost: f64,
}

impl Timetable {
    pub fn new(name: &str, runtime: Duration, lessons: Vec<(String, Lesson)>, total_cost: f64) -> Self {
        Self {
            name: name.to_string(),
            created_at: SystemTime::now(),
            runtime,
            lessons,
            total_cost,
        }
    }

    /// Looks up the lesson scheduled for a class id.
    pub fn lesson(&self, class_id: &str) -> Option<&Lesson> {
        self.lessons
            .iter()
            .find(|(id, _)| id == class_id)
            .map(|(_, lesson)| lesson)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::ProblemConfig;
    use crate::time::TimeBlock;
    use smallvec::SmallVec;

    #[test]
    fn round_trips_through_json() {
        let config = ProblemConfig::default();
        let lesson = Lesson {
            class: 0,
            variant: 2,
            room: Some(1),
            time: TimeBlock::parse("1000100", "1111", 8, 4, &config).unwrap(),
            room_penalty: 1,
            time_penalty: 0,
            teachers: SmallVec::from_slice(&[0]),
        };
        let timetable = Timetable::new(
            "demo",
            Duration::from_secs(3),
            vec![("C1".into(), lesson)],
            1.0,
        );
        let json = serde_json::to_string(&timetable).unwrap();
        let back: Timetable = serde_json::from_str(&json).unwrap();
        assert_eq!(back.name, "demo");
        assert_eq!(back.total_cost, 1.0);
        assert_eq!(back.lesson("C1").unwrap().variant, 2);
        assert!(back.lesson("C2").is_none());
    }
}
