//! REST client against a local mock server.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use pert::api::{Collaborator, HttpCollaborator, ProjectId};
use pert::session::{Session, SessionContext};
use pert::Error;

use crate::fixtures::id;

fn client(server: &MockServer, session: SessionContext) -> HttpCollaborator {
    HttpCollaborator::new(&server.uri(), session, Duration::from_secs(5)).unwrap()
}

fn authed() -> SessionContext {
    SessionContext::new(Session::with_token("secret"))
}

#[tokio::test]
async fn test_fetch_tasks_sends_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tasks/project/7"))
        .and(header("authorization", "Bearer secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "title": "Design", "status": "COMPLETED", "estimatedDuration": 3},
            {"id": 2, "title": "Build", "dependsOnIds": [1]}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let tasks = client(&server, authed())
        .tasks_for_project(&ProjectId::new("7"))
        .await
        .unwrap();

    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[0].estimated_duration, Some(3));
    assert_eq!(tasks[1].depends_on_ids, vec![id(1)]);
}

#[tokio::test]
async fn test_critical_endpoints() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tasks/project/7/critical-path"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([1, 2, 4])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/tasks/project/7/critical-tasks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "title": "A", "estimatedDuration": 2, "earlyStart": 0, "earlyFinish": 2,
             "lateStart": 0, "lateFinish": 2, "slack": 0}
        ])))
        .mount(&server)
        .await;

    let client = client(&server, authed());
    let project = ProjectId::new("7");
    assert_eq!(
        client.critical_path(&project).await.unwrap(),
        vec![id(1), id(2), id(4)]
    );
    let critical = client.critical_tasks(&project).await.unwrap();
    assert_eq!(critical[0].cpm.early_finish, Some(2));
    assert_eq!(critical[0].cpm.slack, Some(0));
}

#[tokio::test]
async fn test_add_and_remove_dependency_urls() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/tasks/2/dependencies/1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"id": 2, "title": "B", "dependsOnIds": [1]})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/tasks/2/dependencies/1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"id": 2, "title": "B", "dependsOnIds": []})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server, authed());
    let added = client.add_dependency(&id(2), &id(1)).await.unwrap();
    assert_eq!(added.depends_on_ids, vec![id(1)]);
    let removed = client.remove_dependency(&id(2), &id(1)).await.unwrap();
    assert!(removed.depends_on_ids.is_empty());
}

#[tokio::test]
async fn test_unauthorized_maps_to_session_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = client(&server, SessionContext::default())
        .tasks_for_project(&ProjectId::new("7"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Unauthorized));
}

#[tokio::test]
async fn test_not_found_maps_to_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = client(&server, authed())
        .remove_dependency(&id(2), &id(1))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn test_server_message_is_surfaced() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({"message": "Circular dependency detected"})),
        )
        .mount(&server)
        .await;

    let err = client(&server, authed())
        .add_dependency(&id(1), &id(2))
        .await
        .unwrap_err();
    match err {
        Error::Status { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(message, "Circular dependency detected");
        }
        other => panic!("expected status error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_plain_text_error_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500).set_body_string("database down"))
        .mount(&server)
        .await;

    let err = client(&server, authed())
        .critical_path(&ProjectId::new("7"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Status { status: 500, ref message } if message == "database down"));
    assert!(err.is_network());
}

#[tokio::test]
async fn test_connection_refused_is_network_error() {
    let server = MockServer::start().await;
    let uri = server.uri();
    drop(server);

    let client = HttpCollaborator::new(&uri, authed(), Duration::from_secs(2)).unwrap();
    let err = client
        .tasks_for_project(&ProjectId::new("7"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Network(_)));
}
