//! Shared fixtures for solver tests.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tabula_model::{ConstraintKind, ProblemBuilder, ProblemConfig, ProblemRepository};

pub(crate) fn seeded_rng(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

/// Two rooms, one teacher, three classes (one room-less), one soft
/// constraint. Both lectures share T1 and both admit Tuesday, so some
/// combinations clash, but a conflict-free assignment always exists.
pub(crate) fn small_repo() -> ProblemRepository {
    let mut builder = ProblemBuilder::new("small", ProblemConfig::default());
    builder.add_room("R1", vec![]).unwrap();
    builder.add_room("R2", vec![]).unwrap();
    builder.add_teacher("T1", "Prof. Horak", vec![]).unwrap();
    let monday = builder.time_block("1000000", "1111", 8, 4).unwrap();
    let tuesday = builder.time_block("0100000", "1111", 8, 4).unwrap();
    let wednesday = builder.time_block("0010000", "1111", 8, 4).unwrap();
    builder
        .add_class(
            "LEC-1",
            None,
            vec![("R1".into(), 0), ("R2".into(), 1)],
            vec![(monday, 0), (tuesday, 1)],
            vec!["T1".into()],
        )
        .unwrap();
    builder
        .add_class(
            "LEC-2",
            None,
            vec![("R1".into(), 0), ("R2".into(), 0)],
            vec![(tuesday, 0), (wednesday, 1)],
            vec!["T1".into()],
        )
        .unwrap();
    builder
        .add_class("SEM-1", None, vec![], vec![(monday, 0), (wednesday, 0)], vec![])
        .unwrap();
    builder
        .add_constraint(
            "soft-not-overlap",
            ConstraintKind::NotOverlap,
            false,
            3,
            vec!["LEC-1".into(), "LEC-2".into()],
        )
        .unwrap();
    builder.build()
}

/// One room, two classes that clash when both take the first time slot;
/// each has a second, conflict-free time.
pub(crate) fn overlap_pair_repo() -> ProblemRepository {
    let mut builder = ProblemBuilder::new("overlap-pair", ProblemConfig::default());
    builder.add_room("R1", vec![]).unwrap();
    let morning = builder.time_block("1000000", "1111", 8, 4).unwrap();
    let afternoon = builder.time_block("1000000", "1111", 20, 4).unwrap();
    for id in ["C1", "C2"] {
        builder
            .add_class(
                id,
                None,
                vec![("R1".into(), 0)],
                vec![(morning, 0), (afternoon, 1)],
                vec![],
            )
            .unwrap();
    }
    builder.build()
}

/// Two classes admissible only for room R1 at one overlapping time, tied
/// by a required DifferentRoom constraint: at most one of them can hold
/// the room.
pub(crate) fn different_room_repo() -> ProblemRepository {
    let mut builder = ProblemBuilder::new("different-room", ProblemConfig::default());
    builder.add_room("R1", vec![]).unwrap();
    let morning = builder.time_block("1000000", "1111", 8, 4).unwrap();
    for id in ["C1", "C2"] {
        builder
            .add_class(id, None, vec![("R1".into(), 0)], vec![(morning, 0)], vec![])
            .unwrap();
    }
    builder
        .add_constraint(
            "diff-room",
            ConstraintKind::DifferentRoom,
            true,
            0,
            vec!["C1".into(), "C2".into()],
        )
        .unwrap();
    builder.build()
}

/// One room with a blackout window covering the class's first admissible
/// time; the second time stays clear.
pub(crate) fn blackout_repo() -> ProblemRepository {
    let mut builder = ProblemBuilder::new("blackout", ProblemConfig::default());
    let blocked = builder.time_block("1000000", "1111", 8, 4).unwrap();
    let clear = builder.time_block("1000000", "1111", 20, 4).unwrap();
    builder.add_room("R1", vec![blocked]).unwrap();
    builder
        .add_class(
            "C1",
            None,
            vec![("R1".into(), 0)],
            vec![(blocked, 0), (clear, 0)],
            vec![],
        )
        .unwrap();
    builder.build()
}

/// A single class with a single admissible value.
pub(crate) fn trivial_repo() -> ProblemRepository {
    let mut builder = ProblemBuilder::new("trivial", ProblemConfig::default());
    builder.add_room("R1", vec![]).unwrap();
    builder.add_teacher("T1", "Prof. Svoboda", vec![]).unwrap();
    let morning = builder.time_block("1000000", "1111", 8, 4).unwrap();
    builder
        .add_class(
            "C1",
            None,
            vec![("R1".into(), 0)],
            vec![(morning, 2)],
            vec!["T1".into()],
        )
        .unwrap();
    builder.build()
}
