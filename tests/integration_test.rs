use audio_qa_client::clients::{AuthService, HistoryService, JobService};
use audio_qa_client::config::Config;
use audio_qa_client::models::{AudioFile, JobStatus, UserId};
use audio_qa_client::orchestrator::{UploadOrchestrator, UploadState};
use audio_qa_client::services::{HistorySync, SessionHolder};
use audio_qa_client::{BackendClient, JobId};
use mockito::{Matcher, Server};
use std::sync::Arc;
use tokio_test::assert_ok;

fn client_for(server: &Server) -> BackendClient {
    let config = Config {
        api_base_url: server.url(),
        poll_interval_ms: 10,
        max_poll_attempts: 5,
        request_timeout_secs: 5,
        ..Config::default()
    };
    BackendClient::new(&config).expect("创建客户端失败")
}

fn credentials(username: &str, password: &str) -> Matcher {
    Matcher::AllOf(vec![
        Matcher::UrlEncoded("username".into(), username.into()),
        Matcher::UrlEncoded("password".into(), password.into()),
    ])
}

#[tokio::test]
async fn test_login_returns_user_id() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/api/login/")
        .match_query(credentials("alice", "secret"))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"message": "Login successful", "user_id": 7}"#)
        .create_async()
        .await;

    let mut session = SessionHolder::new(Arc::new(client_for(&server)));
    let user = assert_ok!(session.login("alice", "secret").await);

    assert_eq!(user, UserId::new("7"));
    assert!(session.is_logged_in());
    mock.assert_async().await;
}

#[tokio::test]
async fn test_login_rejected_shows_remote_detail() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/api/login/")
        .match_query(Matcher::Any)
        .with_status(401)
        .with_header("content-type", "application/json")
        .with_body(r#"{"detail": "Invalid credentials"}"#)
        .create_async()
        .await;

    let mut session = SessionHolder::new(Arc::new(client_for(&server)));
    let err = session.login("alice", "wrong").await.unwrap_err();

    assert_eq!(err.user_message(), "Invalid credentials");
    assert!(!session.is_logged_in());
    assert_eq!(session.last_error(), Some("Invalid credentials"));
}

#[tokio::test]
async fn test_register_conflict_detail() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/api/register/")
        .match_query(credentials("alice", "secret"))
        .with_status(400)
        .with_header("content-type", "application/json")
        .with_body(r#"{"detail": "Username already exists"}"#)
        .create_async()
        .await;

    let client = client_for(&server);
    let err = client.register("alice", "secret").await.unwrap_err();
    assert_eq!(err.user_message(), "Username already exists");
}

#[tokio::test]
async fn test_validation_error_list_is_joined() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/api/login/")
        .match_query(Matcher::Any)
        .with_status(422)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"detail": [
                {"loc": ["query", "username"], "msg": "field required", "type": "missing"},
                {"loc": ["query", "password"], "msg": "field required", "type": "missing"}
            ]}"#,
        )
        .create_async()
        .await;

    let client = client_for(&server);
    let err = client.login("", "").await.unwrap_err();
    assert_eq!(err.user_message(), "field required; field required");
}

#[tokio::test]
async fn test_upload_then_poll_until_done() {
    let mut server = Server::new_async().await;
    let upload = server
        .mock("POST", "/api/upload-audio/")
        .match_query(Matcher::UrlEncoded("user_id".into(), "7".into()))
        .match_header(
            "content-type",
            Matcher::Regex("multipart/form-data".to_string()),
        )
        .match_body(Matcher::Regex("lecture.wav".to_string()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"job_id": "job-42", "message": "File uploaded"}"#)
        .create_async()
        .await;
    server
        .mock("GET", "/api/result/job-42")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{
                "status": "done",
                "transcript": "今天讲光合作用",
                "questions": [{"id": 1, "question": "光合作用发生在哪里？"}, {"id": 2, "question": "需要什么条件？"}],
                "answers": [{"qid": 1, "answer": "叶绿体"}]
            }"#,
        )
        .create_async()
        .await;

    let settings = Config {
        poll_interval_ms: 10,
        ..Config::default()
    }
    .poll_settings();
    let mut uploads = UploadOrchestrator::new(Arc::new(client_for(&server)), settings);

    let file = AudioFile::new("lecture.wav", b"RIFF....WAVE".to_vec());
    assert_ok!(uploads.submit(Some(file), &UserId::new("7")));

    match uploads.wait_until_settled().await {
        UploadState::Done { job, result } => {
            assert_eq!(job.job_id.as_str(), "job-42");
            assert_eq!(job.status, JobStatus::Done);
            assert_eq!(result.transcript, "今天讲光合作用");
            assert_eq!(result.pairs.len(), 2);
            assert_eq!(
                result.pairs[0].answer.as_ref().map(|a| a.text.as_str()),
                Some("叶绿体")
            );
            assert!(result.pairs[1].answer.is_none());
        }
        other => panic!("意外状态: {:?}", other),
    }
    upload.assert_async().await;
}

#[tokio::test]
async fn test_unknown_job_is_absorbed_as_transport_failure() {
    let mut server = Server::new_async().await;
    let missing = server
        .mock("GET", "/api/result/job-9")
        .with_status(404)
        .with_header("content-type", "application/json")
        .with_body(r#"{"detail": "Job not found"}"#)
        .create_async()
        .await;

    let client = client_for(&server);
    let err = client.job_status(&JobId::new("job-9")).await.unwrap_err();

    assert!(err.is_transport());
    missing.assert_async().await;
}

#[tokio::test]
async fn test_history_refresh_replaces_list() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/api/history/")
        .match_query(Matcher::UrlEncoded("user_id".into(), "7".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"[
                {"job_id": "a1", "filename": "one.wav", "status": "done",
                 "created_at": "2024-05-01T10:00:00", "completed_at": "2024-05-01T10:01:30"},
                {"job_id": "b2", "filename": "two.mp3", "status": "processing",
                 "created_at": "2024-05-02 09:00:00", "completed_at": null}
            ]"#,
        )
        .create_async()
        .await;

    let mut history = HistorySync::new(Arc::new(client_for(&server)));
    let jobs = assert_ok!(history.refresh(&UserId::new("7")).await).to_vec();

    assert_eq!(jobs.len(), 2);
    assert_eq!(jobs[0].status, JobStatus::Done);
    assert!(jobs[0].completed_at.is_some());
    assert_eq!(jobs[1].filename, "two.mp3");
    assert!(jobs[1].completed_at.is_none());
    assert!(!history.is_stale());
}

#[tokio::test]
async fn test_history_failure_marks_stale() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/api/history/")
        .match_query(Matcher::Any)
        .with_status(500)
        .with_body("Internal Server Error")
        .create_async()
        .await;

    let client = client_for(&server);
    assert!(client.list_jobs(&UserId::new("7")).await.is_err());

    let mut history = HistorySync::new(Arc::new(client));
    assert!(history.refresh(&UserId::new("7")).await.is_err());
    assert!(history.is_stale());
    assert!(history.jobs().is_empty());
}
