//! In-process mock of the media backend, bound to an ephemeral port.

#![allow(dead_code)]

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Multipart, Path, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use image::{DynamicImage, Rgba, RgbaImage};
use serde_json::{Map, Value, json};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use visalive::services::{composer::encode_png, session::Session};

pub const TOKEN: &str = "test-token";

#[derive(Default)]
pub struct Inner {
    pub base_url: String,
    pub records: Vec<Value>,
    pub next_id: u64,
    pub created_bodies: Vec<Value>,
    pub upload_fields: Vec<String>,
    pub uploaded_names: Vec<String>,
    pub fail_video_upload: bool,
    pub fail_save: bool,
    pub fail_delete: bool,
    pub fail_profile: bool,
    pub user: Value,
    pub asset: Vec<u8>,
}

#[derive(Clone)]
pub struct MockBackend {
    pub base_url: String,
    pub state: Arc<Mutex<Inner>>,
}

impl MockBackend {
    pub async fn start() -> Self {
        let state = Arc::new(Mutex::new(Inner {
            next_id: 100,
            user: json!({
                "id": 7,
                "name": "Ada Lovelace",
                "email": "ada@example.com",
                "bio": "",
                "address": "",
                "subscription_type": "free",
                "profile_picture": null,
                "created_at": 1_700_000_000_000i64
            }),
            asset: png(640, 480),
            ..Default::default()
        }));

        let app = Router::new()
            .route("/my", get(list_mine))
            .route("/media1", post(create_media))
            .route(
                "/media1/{id}",
                get(get_media).patch(patch_media).delete(delete_media),
            )
            .route("/upload/image", post(upload_image))
            .route("/upload/video", post(upload_video))
            .route("/auth/login", post(login))
            .route("/auth/me", get(me).patch(update_me))
            .route("/publicurl", get(public_url))
            .route("/files/{name}", get(file))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let base_url = format!("http://{}", addr);
        state.lock().unwrap().base_url = base_url.clone();
        Self { base_url, state }
    }

    pub fn session(&self) -> Session {
        Session::new(TOKEN)
    }

    /// Insert a record as raw backend JSON.
    pub fn seed(&self, record: Value) {
        self.state.lock().unwrap().records.push(record);
    }

    pub fn with<R>(&self, f: impl FnOnce(&mut Inner) -> R) -> R {
        f(&mut self.state.lock().unwrap())
    }

    pub fn asset_url(&self) -> String {
        format!("{}/files/photo.png", self.base_url)
    }
}

pub fn png(width: u32, height: u32) -> Vec<u8> {
    let image = RgbaImage::from_pixel(width, height, Rgba([200, 30, 30, 255]));
    encode_png(&DynamicImage::ImageRgba8(image)).unwrap().to_vec()
}

type Shared = State<Arc<Mutex<Inner>>>;

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {}", TOKEN))
}

fn unauthorized() -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({"message": "Unauthorized"}))).into_response()
}

async fn list_mine(State(state): Shared, headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    Json(Value::Array(state.lock().unwrap().records.clone())).into_response()
}

fn find(records: &[Value], id: &str) -> Option<usize> {
    records.iter().position(|r| match &r["id"] {
        Value::Number(n) => n.to_string() == id,
        Value::String(s) => s == id,
        _ => false,
    })
}

async fn get_media(State(state): Shared, Path(id): Path<String>) -> Response {
    let inner = state.lock().unwrap();
    match find(&inner.records, &id) {
        Some(i) => Json(inner.records[i].clone()).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn create_media(State(state): Shared, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let mut inner = state.lock().unwrap();
    inner.created_bodies.push(body.clone());
    if inner.fail_save {
        return (StatusCode::INTERNAL_SERVER_ERROR, "save failed").into_response();
    }
    inner.next_id += 1;
    let mut record = body.as_object().cloned().unwrap_or_default();
    record.insert("id".into(), json!(inner.next_id));
    record.insert(
        "created_at".into(),
        json!(chrono::Utc::now().timestamp_millis()),
    );
    let record = Value::Object(record);
    inner.records.push(record.clone());
    Json(record).into_response()
}

async fn patch_media(
    State(state): Shared,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Map<String, Value>>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let mut inner = state.lock().unwrap();
    if inner.fail_save {
        return (StatusCode::INTERNAL_SERVER_ERROR, "save failed").into_response();
    }
    let Some(i) = find(&inner.records, &id) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    if let Some(record) = inner.records[i].as_object_mut() {
        for (key, value) in body {
            record.insert(key, value);
        }
    }
    Json(inner.records[i].clone()).into_response()
}

async fn delete_media(State(state): Shared, headers: HeaderMap, Path(id): Path<String>) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let mut inner = state.lock().unwrap();
    if inner.fail_delete {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    match find(&inner.records, &id) {
        Some(i) => {
            inner.records.remove(i);
            Json(json!(null)).into_response()
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn upload(state: Arc<Mutex<Inner>>, headers: HeaderMap, kind: &str, mut multipart: Multipart) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let mut stored = None;
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().unwrap_or("blob").to_string();
        let mime = field.content_type().unwrap_or("application/octet-stream").to_string();
        let size = field.bytes().await.map(|b| b.len()).unwrap_or(0);
        state.lock().unwrap().upload_fields.push(name);
        stored = Some((file_name, mime, size));
    }

    let mut inner = state.lock().unwrap();
    if kind == "video" && inner.fail_video_upload {
        return (StatusCode::INTERNAL_SERVER_ERROR, "storage full").into_response();
    }
    let Some((file_name, mime, size)) = stored else {
        return StatusCode::BAD_REQUEST.into_response();
    };
    inner.uploaded_names.push(file_name.clone());
    Json(json!({
        "path": format!("/vault/{}", file_name),
        "name": file_name,
        "type": kind,
        "size": size,
        "mime": mime,
        "meta": {"width": 640},
        "url": format!("{}/files/{}", inner.base_url, file_name),
    }))
    .into_response()
}

async fn upload_image(State(state): Shared, headers: HeaderMap, multipart: Multipart) -> Response {
    upload(state, headers, "image", multipart).await
}

async fn upload_video(State(state): Shared, headers: HeaderMap, multipart: Multipart) -> Response {
    upload(state, headers, "video", multipart).await
}

async fn login(Json(body): Json<Value>) -> Response {
    if body["email"] == "ada@example.com" && body["password"] == "secret" {
        Json(json!({"authToken": TOKEN})).into_response()
    } else {
        (StatusCode::FORBIDDEN, Json(json!({"message": "Invalid Credentials."}))).into_response()
    }
}

async fn me(State(state): Shared, headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    Json(state.lock().unwrap().user.clone()).into_response()
}

async fn update_me(
    State(state): Shared,
    headers: HeaderMap,
    Json(body): Json<Map<String, Value>>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let mut inner = state.lock().unwrap();
    if inner.fail_profile {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    if let Some(user) = inner.user.as_object_mut() {
        for (key, value) in body {
            user.insert(key, value);
        }
    }
    Json(inner.user.clone()).into_response()
}

async fn public_url() -> Response {
    Json(json!([{"id": 1, "video": {"url": "https://cdn.test/showcase.mp4"}}])).into_response()
}

async fn file(State(state): Shared, Path(name): Path<String>) -> Response {
    if name.ends_with(".png") {
        let bytes = Bytes::from(state.lock().unwrap().asset.clone());
        ([(header::CONTENT_TYPE, "image/png")], bytes).into_response()
    } else {
        StatusCode::NOT_FOUND.into_response()
    }
}
