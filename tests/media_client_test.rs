mod common;

use common::MockBackend;
use serde_json::json;
use std::path::PathBuf;
use tempfile::TempDir;
use visalive::{
    errors::ClientError,
    models::media::{MediaKind, MediaPatch, MediaRef},
    services::{gallery::Gallery, media_client::MediaClient, session::Session},
};

fn client(mock: &MockBackend) -> MediaClient {
    MediaClient::new(reqwest::Client::new(), &mock.base_url, Some(mock.session()))
}

fn write_file(dir: &TempDir, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}

#[tokio::test]
async fn listing_normalizes_loose_backend_shapes() {
    let mock = MockBackend::start().await;
    mock.seed(json!({
        "id": 1,
        "created_at": 1_700_000_000_000i64,
        "Name": "bare url",
        "Image": "https://cdn.test/a.png",
        "video": null
    }));
    mock.seed(json!({
        "id": "2",
        "created_at": "2024-01-02T03:04:05Z",
        "Name": "object refs",
        "Image": {"url": "https://cdn.test/b.png", "size": "2048", "mime": "image/png"},
        "video": {"url": ""}
    }));

    let records = client(&mock).list_mine().await.unwrap();
    assert_eq!(records.len(), 2);

    let first = &records[0];
    assert_eq!(first.id, "1");
    assert_eq!(first.image_url(), Some("https://cdn.test/a.png"));
    assert!(first.video.is_none());

    let second = &records[1];
    assert_eq!(second.id, "2");
    assert_eq!(second.image.as_ref().and_then(|r| r.size), Some(2048));
    assert!(second.video.is_none(), "empty url is treated as absent");
}

#[tokio::test]
async fn missing_or_rejected_token_is_an_auth_error() {
    let mock = MockBackend::start().await;

    let anonymous = MediaClient::new(reqwest::Client::new(), &mock.base_url, None);
    assert!(anonymous.list_mine().await.unwrap_err().is_auth());

    let stale = MediaClient::new(
        reqwest::Client::new(),
        &mock.base_url,
        Some(Session::new("expired")),
    );
    assert!(matches!(stale.list_mine().await, Err(ClientError::Auth(_))));
}

#[tokio::test]
async fn upload_sends_content_field_and_returns_reference() {
    let mock = MockBackend::start().await;
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "shot.png", &common::png(8, 8));

    let uploaded = client(&mock)
        .upload_file(&path, MediaKind::Image)
        .await
        .unwrap();

    assert_eq!(uploaded.url, format!("{}/files/shot.png", mock.base_url));
    assert_eq!(uploaded.name.as_deref(), Some("shot.png"));
    assert_eq!(uploaded.mime.as_deref(), Some("image/png"));
    assert!(uploaded.extra.contains_key("meta"));
    mock.with(|inner| assert_eq!(inner.upload_fields, ["content"]));
}

#[tokio::test]
async fn failed_upload_reports_kind_and_status() {
    let mock = MockBackend::start().await;
    mock.with(|inner| inner.fail_video_upload = true);
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "clip.mp4", b"not really a video");

    let err = client(&mock)
        .upload_file(&path, MediaKind::Video)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ClientError::Upload {
            kind: MediaKind::Video,
            status: 500
        }
    ));
}

#[tokio::test]
async fn create_then_list_round_trips_one_record() {
    let mock = MockBackend::start().await;
    let client = client(&mock);
    let image = MediaRef::from_url("https://cdn.test/new.png");

    let created = client
        .create_record("poster", Some(&image), None)
        .await
        .unwrap();
    assert_eq!(created.name, "poster");

    let listed = client.list_mine().await.unwrap();
    let matching: Vec<_> = listed.iter().filter(|r| r.id == created.id).collect();
    assert_eq!(matching.len(), 1);
    assert_eq!(matching[0].image_url(), Some("https://cdn.test/new.png"));

    // absent video is omitted, never sent as null
    mock.with(|inner| {
        let body = inner.created_bodies[0].as_object().unwrap();
        assert_eq!(body["Name"], "poster");
        assert!(body.contains_key("Image"));
        assert!(!body.contains_key("video"));
    });
}

#[tokio::test]
async fn save_failure_maps_to_save_error() {
    let mock = MockBackend::start().await;
    mock.with(|inner| inner.fail_save = true);

    let err = client(&mock)
        .create_record("x", None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Save { status: 500 }));
}

#[tokio::test]
async fn update_changes_only_given_fields() {
    let mock = MockBackend::start().await;
    mock.seed(json!({
        "id": 5,
        "created_at": 1,
        "Name": "old",
        "Image": {"url": "https://cdn.test/keep.png"}
    }));

    let patch = MediaPatch {
        name: Some("new".into()),
        ..Default::default()
    };
    let updated = client(&mock).update_record("5", &patch).await.unwrap();
    assert_eq!(updated.name, "new");
    assert_eq!(updated.image_url(), Some("https://cdn.test/keep.png"));
}

#[tokio::test]
async fn delete_is_idempotent() {
    let mock = MockBackend::start().await;
    mock.seed(json!({"id": 9, "created_at": 1, "Name": "gone soon"}));
    let client = client(&mock);

    client.delete_record("9").await.unwrap();
    client.delete_record("9").await.unwrap();

    let mut gallery = Gallery::new(client.list_mine().await.unwrap());
    assert!(gallery.is_empty());
    assert!(!gallery.remove("9"));
}

#[tokio::test]
async fn fetch_record_works_without_session() {
    let mock = MockBackend::start().await;
    mock.seed(json!({"id": 3, "created_at": 1, "Name": "public", "video": "https://cdn.test/v.mp4"}));

    let anonymous = MediaClient::new(reqwest::Client::new(), &mock.base_url, None);
    let record = anonymous.fetch_record("3").await.unwrap();
    assert_eq!(record.video_url(), Some("https://cdn.test/v.mp4"));
    assert!(record.image_url().is_none());

    let missing = anonymous.fetch_record("404").await.unwrap_err();
    assert!(matches!(missing, ClientError::Status { status: 404, .. }));
}

#[tokio::test]
async fn delete_surfaces_server_errors() {
    let mock = MockBackend::start().await;
    mock.seed(json!({"id": 9, "created_at": 1, "Name": "stuck"}));
    mock.with(|inner| inner.fail_delete = true);

    let err = client(&mock).delete_record("9").await.unwrap_err();
    assert!(matches!(
        err,
        ClientError::Status {
            operation: "delete media",
            status: 500
        }
    ));
    mock.with(|inner| assert_eq!(inner.records.len(), 1));
}

#[tokio::test]
async fn unreachable_backend_is_a_network_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = MediaClient::new(
        reqwest::Client::new(),
        &format!("http://{}", addr),
        Some(Session::new(common::TOKEN)),
    );
    assert!(matches!(client.list_mine().await, Err(ClientError::Network(_))));
    assert!(matches!(
        client.delete_record("1").await,
        Err(ClientError::Network(_))
    ));
}
