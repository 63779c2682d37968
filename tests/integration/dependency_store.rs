//! Dependency editing through the store.

use pert::core::TaskId;
use pert::Error;

use crate::fixtures::{diamond, id, loaded_store, task, Call};

fn ids(tasks: &[pert::Task]) -> Vec<TaskId> {
    tasks.iter().map(|t| t.id).collect()
}

#[tokio::test]
async fn test_reverse_edge_rejected_locally() {
    let (store, mock) = loaded_store(vec![task(1, "a", 1, &[]), task(2, "b", 1, &[])]).await;

    let updated = store.add_dependency(&id(2), &id(1)).await.unwrap();
    assert_eq!(updated.depends_on_ids, vec![id(1)]);

    let err = store.add_dependency(&id(1), &id(2)).await.unwrap_err();
    assert!(
        matches!(err, Error::Cycle { task, prerequisite } if task == id(1) && prerequisite == id(2)),
        "expected cycle error, got {:?}",
        err
    );

    // Only the first edge exists, locally and on the server.
    let snapshot = store.snapshot();
    assert_eq!(snapshot.graph().edges(), vec![(id(1), id(2))]);
    assert!(!mock.calls().contains(&Call::Add(id(1), id(2))));
}

#[tokio::test]
async fn test_self_dependency_is_validation_error() {
    let (store, mock) = loaded_store(diamond()).await;
    let err = store.add_dependency(&id(1), &id(1)).await.unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
    assert_eq!(mock.calls(), vec![Call::Tasks]);
}

#[tokio::test]
async fn test_unknown_task_is_not_found() {
    let (store, _mock) = loaded_store(diamond()).await;
    assert!(matches!(
        store.add_dependency(&id(99), &id(1)).await,
        Err(Error::NotFound(_))
    ));
    assert!(matches!(
        store.list_dependencies(&id(99)),
        Err(Error::NotFound(_))
    ));
}

#[tokio::test]
async fn test_existing_edge_is_noop() {
    let (store, mock) = loaded_store(diamond()).await;
    let task = store.add_dependency(&id(2), &id(1)).await.unwrap();
    assert_eq!(task.depends_on_ids, vec![id(1)]);
    assert_eq!(mock.calls(), vec![Call::Tasks]);
}

#[tokio::test]
async fn test_remove_then_readd() {
    let (store, _mock) = loaded_store(diamond()).await;

    let removed = store.remove_dependency(&id(4), &id(3)).await.unwrap();
    assert_eq!(removed.depends_on_ids, vec![id(2)]);
    assert_eq!(ids(&store.list_dependents(&id(3)).unwrap()), Vec::<TaskId>::new());

    let added = store.add_dependency(&id(4), &id(3)).await.unwrap();
    assert_eq!(added.depends_on_ids, vec![id(2), id(3)]);
    assert_eq!(ids(&store.list_dependents(&id(3)).unwrap()), vec![id(4)]);
}

#[tokio::test]
async fn test_remove_missing_edge_is_not_an_error() {
    let (store, mock) = loaded_store(diamond()).await;
    let task = store.remove_dependency(&id(2), &id(3)).await.unwrap();
    assert_eq!(task.depends_on_ids, vec![id(1)]);
    assert_eq!(mock.calls(), vec![Call::Tasks]);
}

#[tokio::test]
async fn test_remove_treats_server_404_as_success() {
    let (store, mock) = loaded_store(diamond()).await;
    mock.reject_with(404);

    let task = store.remove_dependency(&id(4), &id(3)).await.unwrap();
    assert_eq!(task.depends_on_ids, vec![id(2)]);
    assert!(mock.calls().contains(&Call::Remove(id(4), id(3))));

    let snapshot = store.snapshot();
    assert!(!snapshot.graph().has_dependency(&id(4), &id(3)));
    assert_eq!(snapshot.get(&id(4)).unwrap().depends_on_ids, vec![id(2)]);
}

#[tokio::test]
async fn test_server_rejection_leaves_snapshot_untouched() {
    let (store, mock) = loaded_store(vec![task(1, "a", 1, &[]), task(2, "b", 1, &[])]).await;
    mock.reject_with(409);

    let err = store.add_dependency(&id(2), &id(1)).await.unwrap_err();
    assert!(matches!(err, Error::Status { status: 409, .. }));
    assert!(store.snapshot().graph().edges().is_empty());
}

#[tokio::test]
async fn test_unauthorized_propagates() {
    let (store, mock) = loaded_store(diamond()).await;
    mock.reject_with(401);
    assert!(matches!(store.refresh().await, Err(Error::Unauthorized)));
    // The previous snapshot is still served.
    assert_eq!(store.snapshot().len(), 4);
}

#[tokio::test]
async fn test_candidates_exclude_downstream_and_direct() {
    let (store, _mock) = loaded_store(vec![
        task(1, "A", 1, &[]),
        task(2, "B", 1, &[1]),
        task(3, "C", 1, &[2]),
        task(4, "D", 1, &[]),
        task(5, "E", 1, &[]),
    ])
    .await;

    // B: not itself, not its prerequisite A, not C which depends on it.
    assert_eq!(
        ids(&store.available_candidates(&id(2)).unwrap()),
        vec![id(4), id(5)]
    );
    // A: everything downstream (B, C) excluded.
    assert_eq!(
        ids(&store.available_candidates(&id(1)).unwrap()),
        vec![id(4), id(5)]
    );
}

#[tokio::test]
async fn test_candidates_never_close_a_cycle() {
    let (store, _mock) = loaded_store(diamond()).await;
    for task in store.snapshot().iter() {
        for candidate in store.available_candidates(&task.id).unwrap() {
            assert!(
                !store
                    .snapshot()
                    .graph()
                    .would_create_cycle(&task.id, &candidate.id)
                    .unwrap(),
                "{} offered as prerequisite of {}",
                candidate.id,
                task.id
            );
        }
    }
}

#[tokio::test]
async fn test_refresh_adopts_server_edits() {
    let (store, mock) = loaded_store(diamond()).await;
    mock.server_edit(|tasks| tasks.push(task(5, "E", 2, &[4])));

    let snapshot = store.refresh().await.unwrap();
    assert_eq!(snapshot.len(), 5);
    assert_eq!(ids(&store.list_dependents(&id(4)).unwrap()), vec![id(5)]);
}

#[tokio::test]
async fn test_critical_overlay_fetches_both_endpoints() {
    let (store, mock) = loaded_store(diamond()).await;
    let tasks = diamond();
    mock.set_critical(&[1, 2, 4], vec![tasks[0].clone(), tasks[1].clone(), tasks[3].clone()]);

    let overlay = store.critical_overlay().await.unwrap();
    assert_eq!(overlay.path(), &[id(1), id(2), id(4)]);
    assert_eq!(overlay.total_duration(), 9);

    let calls = mock.calls();
    assert!(calls.contains(&Call::CriticalPath));
    assert!(calls.contains(&Call::CriticalTasks));
}
