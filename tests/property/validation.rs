//! Property-based tests for request validation.
//!
//! Uses proptest to verify:
//! 1. Every in-range position is accepted and every out-of-range one rejected.
//! 2. A reorder batch with a repeated id is rejected whatever the positions.
//! 3. Name checks depend only on the trimmed length.

use proptest::prelude::*;
use taskboard_proto::api::{
    BulkUpdateRequest, CreateWorkspaceRequest, MAX_NAME_LENGTH, TaskPositionUpdate,
    ValidationError, check_position,
};
use taskboard_proto::model::{MAX_POSITION, MIN_POSITION, TaskStatus};

// --- Strategies ---

fn arb_status() -> impl Strategy<Value = TaskStatus> {
    prop::sample::select(TaskStatus::ALL.to_vec())
}

fn arb_valid_position() -> impl Strategy<Value = i64> {
    MIN_POSITION..=MAX_POSITION
}

fn arb_invalid_position() -> impl Strategy<Value = i64> {
    prop_oneof![i64::MIN..MIN_POSITION, (MAX_POSITION + 1)..=i64::MAX]
}

/// A batch of updates with distinct ids and valid positions.
fn arb_batch() -> impl Strategy<Value = Vec<TaskPositionUpdate>> {
    prop::collection::vec((arb_status(), arb_valid_position()), 1..32).prop_map(|items| {
        items
            .into_iter()
            .enumerate()
            .map(|(i, (status, position))| TaskPositionUpdate {
                id: format!("t{i}"),
                status,
                position,
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn in_range_positions_are_accepted(position in arb_valid_position()) {
        prop_assert!(check_position(position).is_ok());
    }

    #[test]
    fn out_of_range_positions_are_rejected(position in arb_invalid_position()) {
        prop_assert_eq!(
            check_position(position),
            Err(ValidationError::PositionOutOfRange(position))
        );
    }

    #[test]
    fn distinct_valid_batches_pass(tasks in arb_batch()) {
        let request = BulkUpdateRequest { tasks };
        prop_assert!(request.validate().is_ok());
    }

    #[test]
    fn one_bad_position_fails_the_batch(
        mut tasks in arb_batch(),
        index in any::<prop::sample::Index>(),
        bad in arb_invalid_position(),
    ) {
        let i = index.index(tasks.len());
        tasks[i].position = bad;
        prop_assert_eq!(
            BulkUpdateRequest { tasks }.validate(),
            Err(ValidationError::PositionOutOfRange(bad))
        );
    }

    #[test]
    fn repeated_ids_are_rejected(
        mut tasks in arb_batch(),
        index in any::<prop::sample::Index>(),
        status in arb_status(),
        position in arb_valid_position(),
    ) {
        let duplicate = tasks[index.index(tasks.len())].id.clone();
        tasks.push(TaskPositionUpdate { id: duplicate.clone(), status, position });
        prop_assert_eq!(
            BulkUpdateRequest { tasks }.validate(),
            Err(ValidationError::DuplicateTask(duplicate))
        );
    }

    #[test]
    fn names_are_checked_after_trimming(
        name in "[a-z]{1,300}",
        pad in " {0,8}",
    ) {
        let request = CreateWorkspaceRequest {
            name: format!("{pad}{name}{pad}"),
            image: None,
        };
        prop_assert_eq!(request.validate().is_ok(), name.len() <= MAX_NAME_LENGTH);
    }
}

#[test]
fn empty_batch_is_rejected() {
    let request = BulkUpdateRequest { tasks: Vec::new() };
    assert_eq!(request.validate(), Err(ValidationError::EmptyBatch));
}

#[test]
fn blank_name_is_required() {
    let request = CreateWorkspaceRequest {
        name: "   ".to_string(),
        image: None,
    };
    assert_eq!(request.validate(), Err(ValidationError::Required("name")));
}
