//! Lazy enumeration of the candidate values of a class-unit.

use tabula_model::{Lesson, ProblemRepository};

/// Iterator over the admissible (room, time) combinations of one class,
/// filtered to lessons whose block avoids every room and teacher blackout.
///
/// Stateless with respect to the search: re-creating the iterator replays
/// the same finite sequence, and the `variant` ordinal of each lesson is
/// stable across iterations (it indexes the unfiltered cross product).
pub struct CandidateLessons<'p> {
    repo: &'p ProblemRepository,
    class: usize,
    room_choice: usize,
    time_choice: usize,
}

/// Enumerates the candidate lessons of `class`.
///
/// Room-less classes (an empty admissible-room set) yield one candidate
/// per admissible time block.
pub fn candidate_lessons(repo: &ProblemRepository, class: usize) -> CandidateLessons<'_> {
    CandidateLessons {
        repo,
        class,
        room_choice: 0,
        time_choice: 0,
    }
}

impl Iterator for CandidateLessons<'_> {
    type Item = Lesson;

    fn next(&mut self) -> Option<Lesson> {
        let unit = self.repo.class(self.class);
        let room_choices = unit.rooms.len().max(1);
        loop {
            if self.time_choice >= unit.times.len() {
                self.room_choice += 1;
                self.time_choice = 0;
            }
            if self.room_choice >= room_choices || unit.times.is_empty() {
                return None;
            }
            let time = &unit.times[self.time_choice];
            let variant = (self.room_choice * unit.times.len() + self.time_choice) as u32;
            self.time_choice += 1;

            let (room, room_penalty) = match unit.rooms.get(self.room_choice) {
                Some(choice) => (Some(choice.room), choice.penalty),
                None => (None, 0),
            };
            let lesson = Lesson {
                class: self.class,
                variant,
                room,
                time: time.block,
                room_penalty,
                time_penalty: time.penalty,
                teachers: unit.teachers.clone(),
            };
            if lesson.is_available(self.repo) {
                return Some(lesson);
            }
        }
    }
}
