mod common;

use common::*;
use reqwest::Method;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use task_manager_client::api::PageRequest;
use task_manager_client::auth::service::{INVALID_CREDENTIALS_MESSAGE, WRONG_PASSWORD_MESSAGE};
use task_manager_client::errors::{FORBIDDEN_MESSAGE, NETWORK_ERROR_MESSAGE, SERVER_ERROR_MESSAGE};
use task_manager_client::models::TaskStatus;
use task_manager_client::services::{
    AssistantService, NotificationService, TagService, TaskService,
};
use task_manager_client::session::storage::{APP_DATA_KEYS, AUTH_TOKEN_KEY, USER_INFO_KEY};
use task_manager_client::{
    ApiError, ApiResult, AuthService, MemoryStorage, Session, SessionStore, Storage,
};

/// Storage whose disk is full for one key.
struct FullDiskStorage {
    inner: MemoryStorage,
    rejected_key: &'static str,
}

impl Storage for FullDiskStorage {
    fn get(&self, key: &str) -> ApiResult<Option<String>> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> ApiResult<()> {
        if key == self.rejected_key {
            return Err(ApiError::storage("disk full"));
        }
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> ApiResult<()> {
        self.inner.remove(key)
    }
}

fn wrong_password_backend() -> MockTransport {
    MockTransport::new(|request| {
        if request.url == REFRESH_URL {
            respond(200, json!({"success": true, "data": {"token": "t2"}}))
        } else {
            respond(401, json!({"message": "Bad credentials"}))
        }
    })
}

fn seed_session(h: &Harness, refresh_token: Option<&str>) {
    h.session
        .set_session(Session {
            access_token: Some("t1".to_string()),
            refresh_token: refresh_token.map(str::to_string),
            user: None,
        })
        .unwrap();
}

#[tokio::test]
async fn test_login_then_refresh_retries_with_new_token() {
    let h = harness(MockTransport::new(|request| {
        if request.url == "http://backend.test/api/auth/login" {
            respond(200, json!({"token": "t1", "user": {"username": "alice"}}))
        } else if request.url == REFRESH_URL {
            respond(200, json!({"success": true, "data": {"token": "t2"}}))
        } else if request.bearer.as_deref() == Some("t2") {
            respond(200, json!([]))
        } else {
            unauthorized()
        }
    }));
    let auth = AuthService::new(h.client.clone());

    let login = auth.login("alice", "secret").await.unwrap();
    assert_eq!(login.token, "t1");
    assert_eq!(login.user.username, "alice");
    assert_eq!(h.session.access_token(), Some("t1".to_string()));

    h.session.update_tokens("t1", Some("r1")).unwrap();
    let tasks = TaskService::new(h.client.clone());
    let page = tasks.get_all_tasks().await;
    assert!(page.is_empty());

    let refresh = &h.transport.refresh_calls()[0];
    assert_eq!(refresh.body, Some(json!({"refreshToken": "r1"})));

    let task_calls = h.transport.calls_to("http://backend.test/api/tasks");
    assert_eq!(task_calls.len(), 2);
    assert_eq!(task_calls[0].bearer.as_deref(), Some("t1"));
    assert_eq!(task_calls[1].bearer.as_deref(), Some("t2"));
    assert_eq!(h.session.access_token(), Some("t2".to_string()));
    assert_eq!(h.session.refresh_token(), Some("r1".to_string()));
}

#[tokio::test]
async fn test_login_logout_rehydrates_unauthenticated() {
    let token = jwt("alice", 3600);
    let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
    let session = Arc::new(SessionStore::new(storage.clone()));
    let h = harness_with_session(
        MockTransport::new(move |_| {
            respond(
                200,
                json!({
                    "success": true,
                    "message": "Login successful",
                    "data": {"token": token.clone(), "refreshToken": "r1", "id": 1, "username": "alice", "roles": ["ROLE_USER"]}
                }),
            )
        }),
        session,
    );
    let auth = AuthService::new(h.client.clone());

    auth.login("alice", "secret").await.unwrap();
    assert!(auth.is_authenticated());
    assert!(auth.has_permission("ROLE_USER"));
    assert!(!auth.has_permission("ROLE_ADMIN"));
    assert!(SessionStore::new(storage.clone()).is_authenticated());

    storage.set("tasks", "[]").unwrap();
    auth.logout().unwrap();

    let rehydrated = SessionStore::new(storage.clone());
    assert!(!rehydrated.is_authenticated());
    assert_eq!(rehydrated.user(), None);
    for key in APP_DATA_KEYS {
        assert_eq!(storage.get(key).unwrap(), None);
    }
    assert_eq!(h.notifier.redirects(), vec![Duration::ZERO]);
}

#[tokio::test]
async fn test_login_rejection_does_not_start_refresh() {
    let h = harness(MockTransport::new(|_| {
        respond(401, json!({"message": "Bad credentials"}))
    }));
    let auth = AuthService::new(h.client.clone());

    let error = auth.login("alice", "wrong").await.unwrap_err();

    assert_eq!(error, ApiError::unauthorized(INVALID_CREDENTIALS_MESSAGE));
    assert!(h.transport.refresh_calls().is_empty());
    assert_eq!(h.transport.requests()[0].bearer, None);
    assert!(h.notifier.redirects().is_empty());
}

#[tokio::test]
async fn test_login_without_token_is_invalid_response() {
    let h = harness(MockTransport::new(|_| {
        respond(200, json!({"success": true, "message": "OK", "data": {"username": "alice"}}))
    }));
    let auth = AuthService::new(h.client.clone());

    let error = auth.login("alice", "secret").await.unwrap_err();

    assert!(matches!(error, ApiError::InvalidResponse { .. }));
    assert_eq!(h.session.access_token(), None);
}

#[tokio::test]
async fn test_login_validates_before_sending() {
    let h = harness(MockTransport::new(|_| unauthorized()));
    let auth = AuthService::new(h.client.clone());

    let error = auth.login("", "secret").await.unwrap_err();

    assert!(matches!(error, ApiError::Validation { .. }));
    assert!(h.transport.requests().is_empty());
}

#[tokio::test]
async fn test_change_password_requires_session() {
    let h = harness(MockTransport::new(|_| respond(200, json!({"success": true}))));
    let auth = AuthService::new(h.client.clone());

    let error = auth.change_password("old", "new-password").await.unwrap_err();

    assert!(matches!(error, ApiError::Unauthorized { .. }));
    assert!(h.transport.requests().is_empty());
}

#[tokio::test]
async fn test_wrong_current_password_does_not_refresh() {
    let h = harness(wrong_password_backend());
    seed_session(&h, Some("r1"));
    let auth = AuthService::new(h.client.clone());

    let error = auth.change_password("typo", "new-password").await.unwrap_err();

    assert_eq!(error, ApiError::unauthorized(WRONG_PASSWORD_MESSAGE));
    assert!(h.transport.refresh_calls().is_empty());
    let requests = h.transport.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].bearer.as_deref(), Some("t1"));
    assert_eq!(h.session.access_token(), Some("t1".to_string()));
    assert_eq!(h.notifier.errors(), vec![WRONG_PASSWORD_MESSAGE.to_string()]);
}

#[tokio::test]
async fn test_wrong_current_password_keeps_session_without_refresh_token() {
    let h = harness(wrong_password_backend());
    seed_session(&h, None);
    let auth = AuthService::new(h.client.clone());

    let error = auth.change_password("typo", "new-password").await.unwrap_err();

    assert_eq!(error, ApiError::unauthorized(WRONG_PASSWORD_MESSAGE));
    assert_eq!(h.session.access_token(), Some("t1".to_string()));
    assert!(h.notifier.redirects().is_empty());
}

#[tokio::test]
async fn test_login_with_failing_storage_stays_logged_out() {
    let storage = Arc::new(FullDiskStorage {
        inner: MemoryStorage::new(),
        rejected_key: USER_INFO_KEY,
    });
    let session = Arc::new(SessionStore::new(storage.clone()));
    let h = harness_with_session(
        MockTransport::new(|_| {
            respond(200, json!({"token": "t1", "user": {"username": "alice"}}))
        }),
        session,
    );
    let auth = AuthService::new(h.client.clone());

    let error = auth.login("alice", "secret").await.unwrap_err();

    assert_eq!(error, ApiError::storage("disk full"));
    assert_eq!(h.session.access_token(), None);
    assert_eq!(storage.get(AUTH_TOKEN_KEY).unwrap(), None);
}

#[tokio::test]
async fn test_bare_payload_reaches_service_as_envelope() {
    let h = harness(MockTransport::new(|_| respond(200, json!({"id": 1, "name": "x"}))));

    let response = h.client.get::<Value>("/projects/1").await.unwrap();

    assert!(response.success);
    assert_eq!(response.message, "OK");
    assert_eq!(response.data, Some(json!({"id": 1, "name": "x"})));
}

#[tokio::test]
async fn test_business_rejection_is_returned_not_notified() {
    let h = harness(MockTransport::new(|_| {
        respond(
            200,
            json!({"success": false, "message": "Project name taken", "errorCode": "DUPLICATE"}),
        )
    }));

    let error = h.client.get::<Value>("/projects").await.unwrap_err();

    assert_eq!(
        error,
        ApiError::business("Project name taken", Some("DUPLICATE".to_string()))
    );
    assert!(h.notifier.errors().is_empty());
}

#[tokio::test]
async fn test_delete_task_outcomes() {
    let accepting = harness(MockTransport::new(|_| respond(200, json!({"success": true}))));
    assert_eq!(
        TaskService::new(accepting.client.clone()).delete_task(42).await,
        Ok(true)
    );
    assert_eq!(accepting.transport.requests()[0].method, Method::DELETE);
    assert_eq!(
        accepting.transport.requests()[0].url,
        "http://backend.test/api/tasks/42"
    );

    let refusing = harness(MockTransport::new(|_| {
        respond(200, json!({"success": false, "message": "Task is locked"}))
    }));
    assert_eq!(
        TaskService::new(refusing.client.clone()).delete_task(42).await,
        Ok(false)
    );

    let offline = harness(MockTransport::new(|_| Err(ApiError::network("connection refused"))));
    let error = TaskService::new(offline.client.clone())
        .delete_task(42)
        .await
        .unwrap_err();
    assert!(matches!(error, ApiError::Network { .. }));
    assert_eq!(offline.notifier.errors(), vec![NETWORK_ERROR_MESSAGE.to_string()]);
}

#[tokio::test]
async fn test_list_reads_degrade_to_empty() {
    let h = harness(MockTransport::new(|_| {
        respond(500, json!({"message": "NullPointerException"}))
    }));

    assert!(TagService::new(h.client.clone()).get_tags().await.is_empty());
    assert_eq!(
        NotificationService::new(h.client.clone())
            .get_unread_count()
            .await,
        0
    );

    let page = TaskService::new(h.client.clone())
        .get_tasks_paged(&PageRequest::new(2, 20))
        .await;
    assert!(page.content.is_empty());
    assert_eq!((page.number, page.size, page.total_pages), (2, 20, 0));

    let plan = AssistantService::new(h.client.clone())
        .get_optimized_task_order()
        .await;
    assert!(plan.optimized_tasks.is_empty());
    assert!(!plan.explanation.is_empty());

    assert!(h.notifier.errors().iter().all(|m| m == SERVER_ERROR_MESSAGE));
}

#[tokio::test]
async fn test_forbidden_is_terminal() {
    let h = harness(MockTransport::new(|_| respond(403, json!({}))));

    let error = TaskService::new(h.client.clone())
        .update_task_status(3, TaskStatus::Completed)
        .await
        .unwrap_err();

    assert!(matches!(error, ApiError::Forbidden { .. }));
    assert_eq!(h.transport.requests().len(), 1);
    assert_eq!(
        h.transport.requests()[0].body,
        Some(json!({"status": "COMPLETED"}))
    );
    assert_eq!(h.notifier.errors(), vec![FORBIDDEN_MESSAGE.to_string()]);
}

#[tokio::test]
async fn test_progress_is_validated_locally() {
    let h = harness(MockTransport::new(|_| respond(200, json!({"success": true}))));

    let error = TaskService::new(h.client.clone())
        .update_task_progress(1, 101)
        .await
        .unwrap_err();

    assert!(matches!(error, ApiError::Validation { .. }));
    assert!(h.transport.requests().is_empty());
}

#[tokio::test]
async fn test_validation_errors_are_surfaced_verbatim() {
    let h = harness(MockTransport::new(|_| {
        respond(
            400,
            json!({"message": "Validation failed", "validationErrors": {"title": "must not be blank"}}),
        )
    }));

    let error = h
        .client
        .post::<Value, _>("/tasks", &json!({"title": ""}))
        .await
        .unwrap_err();

    match error {
        ApiError::Validation { field_errors, .. } => {
            assert_eq!(field_errors.get("title").map(String::as_str), Some("must not be blank"));
        }
        other => panic!("unexpected error {:?}", other),
    }
    assert_eq!(
        h.notifier.errors(),
        vec!["Validation failed (title: must not be blank)".to_string()]
    );
}
