//! Integration tests for the backend client against an in-process stub.
//!
//! Verifies the wire details of the three-call contract: endpoint paths,
//! the multipart field name per upload contract, the select request body,
//! and the download query parameter.

mod common;

use std::time::Duration;

use audiencer::backend::{BackendClient, BackendError, SelectionRequest, UploadContract};
use common::{Behavior, StepBehavior, StubBackend, FILE_ID, ZIP_FILENAME};

fn client(url: &str, contract: UploadContract) -> BackendClient {
    BackendClient::new(url, contract, "audiencer-tests/0", Duration::from_secs(5))
}

#[tokio::test]
async fn upload_uses_uid_contract_field_and_path() {
    let stub = StubBackend::spawn().await;
    let dir = tempfile::tempdir().unwrap();
    let path = common::identifiers_file(dir.path(), "list.csv");

    let client = client(&stub.url, UploadContract::UidFile);
    let receipt = client.upload_identifiers(&path).await.unwrap();
    assert_eq!(receipt.file_id, FILE_ID);

    stub.with_seen(|seen| {
        assert_eq!(seen.upload_paths, vec!["/upload_uid_file"]);
        assert_eq!(seen.upload_fields, vec!["uid_file"]);
        assert_eq!(seen.upload_filenames, vec!["list.csv"]);
        assert_eq!(seen.upload_bodies[0], b"Uid\n1001\n1002\n1003\n");
    });
}

#[tokio::test]
async fn upload_uses_cpid_contract_field_and_path() {
    let stub = StubBackend::spawn().await;
    let dir = tempfile::tempdir().unwrap();
    let path = common::identifiers_file(dir.path(), "list.json");

    let client = client(&stub.url, UploadContract::CpidFile);
    client.upload_identifiers(&path).await.unwrap();

    stub.with_seen(|seen| {
        assert_eq!(seen.upload_paths, vec!["/upload_cpid_file"]);
        assert_eq!(seen.upload_fields, vec!["cpid_file"]);
    });
}

#[tokio::test]
async fn upload_server_error_is_api_error() {
    let stub = StubBackend::spawn_with(Behavior {
        upload: StepBehavior::ServerError,
        ..Behavior::default()
    })
    .await;
    let dir = tempfile::tempdir().unwrap();
    let path = common::identifiers_file(dir.path(), "list.csv");

    let err = client(&stub.url, UploadContract::UidFile)
        .upload_identifiers(&path)
        .await
        .unwrap_err();
    match err {
        BackendError::Api { status, body } => {
            assert_eq!(status, 500);
            assert!(body.contains("upload exploded"));
        }
        other => panic!("expected Api error, got {:?}", other),
    }
}

#[tokio::test]
async fn upload_empty_file_id_is_rejected() {
    let stub = StubBackend::spawn_with(Behavior {
        upload: StepBehavior::Malformed,
        ..Behavior::default()
    })
    .await;
    let dir = tempfile::tempdir().unwrap();
    let path = common::identifiers_file(dir.path(), "list.csv");

    let err = client(&stub.url, UploadContract::UidFile)
        .upload_identifiers(&path)
        .await
        .unwrap_err();
    assert!(matches!(err, BackendError::EmptyFileId));
}

#[tokio::test]
async fn upload_missing_local_file_is_file_read_error() {
    let stub = StubBackend::spawn().await;
    let err = client(&stub.url, UploadContract::UidFile)
        .upload_identifiers(std::path::Path::new("/nonexistent/list.csv"))
        .await
        .unwrap_err();
    assert!(matches!(err, BackendError::FileRead { .. }));
    // nothing reached the backend
    assert_eq!(stub.upload_count(), 0);
}

#[tokio::test]
async fn select_sends_contract_body_and_parses_outcome() {
    let stub = StubBackend::spawn().await;
    let client = client(&stub.url, UploadContract::UidFile);

    let request = SelectionRequest {
        category: "Webinar".to_string(),
        open_rate: 69,
        newsletter_content: "Hello".to_string(),
        file_id: FILE_ID.to_string(),
    };
    let outcome = client.select_users(&request).await.unwrap();

    assert_eq!(outcome.stats.total_users, 100);
    assert_eq!(outcome.stats.expected_open_rate, 69);
    assert_eq!(outcome.stats.mail_group, 60);
    assert_eq!(outcome.stats.whatsapp_group, 30);
    assert_eq!(outcome.stats.ignored_group, 10);
    assert_eq!(outcome.zip_filename, ZIP_FILENAME);

    stub.with_seen(|seen| {
        let body = &seen.select_requests[0];
        assert_eq!(body["category"], "Webinar");
        assert_eq!(body["open_rate"], 69);
        assert_eq!(body["newsletter_content"], "Hello");
        assert_eq!(body["file_id"], FILE_ID);
    });
}

#[tokio::test]
async fn select_malformed_response_is_parse_error() {
    let stub = StubBackend::spawn_with(Behavior {
        select: StepBehavior::Malformed,
        ..Behavior::default()
    })
    .await;
    let request = SelectionRequest {
        category: "Ads".to_string(),
        open_rate: 50,
        newsletter_content: String::new(),
        file_id: FILE_ID.to_string(),
    };

    let err = client(&stub.url, UploadContract::UidFile)
        .select_users(&request)
        .await
        .unwrap_err();
    assert!(matches!(err, BackendError::Parse(_)));
}

#[tokio::test]
async fn download_passes_filename_and_returns_bytes() {
    let stub = StubBackend::spawn().await;
    let bytes = client(&stub.url, UploadContract::UidFile)
        .download_groups(ZIP_FILENAME)
        .await
        .unwrap();

    assert_eq!(bytes, common::groups_zip());
    stub.with_seen(|seen| {
        assert_eq!(
            seen.download_filenames,
            vec![Some(ZIP_FILENAME.to_string())]
        );
    });
}

#[tokio::test]
async fn download_missing_archive_is_api_error() {
    let stub = StubBackend::spawn_with(Behavior {
        download: StepBehavior::ServerError,
        ..Behavior::default()
    })
    .await;

    let err = client(&stub.url, UploadContract::UidFile)
        .download_groups(ZIP_FILENAME)
        .await
        .unwrap_err();
    assert!(matches!(err, BackendError::Api { status: 404, .. }));
}

#[tokio::test]
async fn unreachable_backend_is_connection_error() {
    // Bind then drop a listener so the port is free but nothing answers.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let dir = tempfile::tempdir().unwrap();
    let path = common::identifiers_file(dir.path(), "list.csv");
    let err = client(&url, UploadContract::UidFile)
        .upload_identifiers(&path)
        .await
        .unwrap_err();
    assert!(matches!(err, BackendError::Connection(_)));
}
