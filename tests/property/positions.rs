//! Property-based tests for lane positions and bulk reordering.
//!
//! Uses proptest to verify:
//! 1. A new task always lands one gap after the highest position of its lane,
//!    whatever order the lane was filled in.
//! 2. Other lanes never influence the allocated position.
//! 3. A reorder batch spanning two workspaces is rejected and writes nothing.

use proptest::prelude::*;
use serde_json::json;
use taskboard_proto::api::{BulkUpdateRequest, TaskPositionUpdate};
use taskboard_proto::model::{MAX_POSITION, MIN_POSITION, POSITION_GAP, Task, TaskStatus};
use taskboard_server::bulk::bulk_update;
use taskboard_server::error::BoardError;
use taskboard_server::position::next_position;
use taskboard_server::store::memory::MemoryStore;
use taskboard_server::store::record::{self, to_fields};
use taskboard_server::store::{Collection, DocumentStore};

fn block_on<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
        .block_on(future)
}

async fn put_task(
    store: &MemoryStore,
    id: &str,
    workspace: &str,
    status: TaskStatus,
    position: i64,
) {
    store
        .create(
            Collection::Tasks,
            id,
            to_fields(&json!({
                "name": id,
                "status": status,
                "priority": "LOW",
                "workspaceId": workspace,
                "projectId": "p1",
                "assigneeId": "m1",
                "position": position,
                "dueDate": "2030-01-01T00:00:00Z",
            }))
            .unwrap(),
        )
        .await
        .unwrap();
}

fn arb_status() -> impl Strategy<Value = TaskStatus> {
    prop::sample::select(TaskStatus::ALL.to_vec())
}

proptest! {
    #[test]
    fn next_position_follows_the_highest(
        positions in prop::collection::vec(MIN_POSITION..=MAX_POSITION, 0..24),
        status in arb_status(),
    ) {
        let expected = positions
            .iter()
            .max()
            .map_or(MIN_POSITION, |highest| highest + POSITION_GAP);

        let allocated = block_on(async {
            let store = MemoryStore::new();
            for (i, position) in positions.iter().enumerate() {
                put_task(&store, &format!("t{i}"), "w1", status, *position).await;
            }
            next_position(&store, "w1", status).await.unwrap()
        });

        prop_assert_eq!(allocated, expected);
    }

    #[test]
    fn other_lanes_do_not_matter(
        noise in prop::collection::vec((arb_status(), MIN_POSITION..=MAX_POSITION), 0..24),
        status in arb_status(),
    ) {
        let allocated = block_on(async {
            let store = MemoryStore::new();
            for (i, (other_status, position)) in noise.iter().enumerate() {
                put_task(&store, &format!("other-ws-{i}"), "w2", *other_status, *position).await;
                if *other_status != status {
                    let id = format!("other-lane-{i}");
                    put_task(&store, &id, "w1", *other_status, *position).await;
                }
            }
            next_position(&store, "w1", status).await.unwrap()
        });

        prop_assert_eq!(allocated, MIN_POSITION);
    }

    #[test]
    fn cross_workspace_batches_write_nothing(
        first in prop::collection::vec(MIN_POSITION..=MAX_POSITION, 1..8),
        second in prop::collection::vec(MIN_POSITION..=MAX_POSITION, 1..8),
        target in arb_status(),
    ) {
        let (result, untouched) = block_on(async {
            let store = MemoryStore::new();
            let mut updates = Vec::new();
            for (workspace, positions) in [("w1", &first), ("w2", &second)] {
                let _: taskboard_proto::model::Member = record::insert(
                    &store,
                    &json!({ "workspaceId": workspace, "userId": "u1", "role": "MEMBER" }),
                )
                .await
                .unwrap();
                for (i, position) in positions.iter().enumerate() {
                    let id = format!("{workspace}-{i}");
                    put_task(&store, &id, workspace, TaskStatus::Backlog, *position).await;
                    updates.push(TaskPositionUpdate {
                        id,
                        status: target,
                        position: MIN_POSITION,
                    });
                }
            }

            let result = bulk_update(&store, "u1", &BulkUpdateRequest { tasks: updates }).await;

            let mut untouched = true;
            for (workspace, positions) in [("w1", &first), ("w2", &second)] {
                for (i, position) in positions.iter().enumerate() {
                    let task: Task =
                        record::fetch(&store, &format!("{workspace}-{i}")).await.unwrap();
                    untouched &= task.status == TaskStatus::Backlog && task.position == *position;
                }
            }
            (result, untouched)
        });

        prop_assert!(matches!(
            result,
            Err(BoardError::Validation(ref message))
                if message == "All tasks must belong to the same workspace"
        ));
        prop_assert!(untouched);
    }
}
