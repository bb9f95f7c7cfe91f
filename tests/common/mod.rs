//! 集成测试用的模拟后端
#![allow(dead_code)]

use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use frame_extractor_client::{ApiClient, Logger, MemoryClipboard, Session, View, VideoProcessor};

/// 后端收到的一次请求
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub endpoint: String,
    /// 表单字段（文件字段记录文件名）
    pub fields: HashMap<String, String>,
    /// 各部分的 Content-Type
    pub content_types: HashMap<String, String>,
    pub file_size: usize,
}

#[derive(Clone, Default)]
pub struct MockBackend {
    responses: Arc<Mutex<HashMap<String, (StatusCode, Value)>>>,
    requests: Arc<Mutex<Vec<Recorded>>>,
    delay: Arc<Mutex<Duration>>,
}

impl MockBackend {
    /// 设置某个接口（如 `extract-frames`）的响应
    pub fn respond(&self, endpoint: &str, status: StatusCode, body: Value) {
        self.responses.lock().unwrap().insert(endpoint.to_string(), (status, body));
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = delay;
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    fn reply(&self, endpoint: &str) -> (StatusCode, Json<Value>) {
        let (status, body) = self
            .responses
            .lock()
            .unwrap()
            .get(endpoint)
            .cloned()
            .unwrap_or((StatusCode::NOT_FOUND, serde_json::json!({"success": false, "message": "not found"})));
        (status, Json(body))
    }

    async fn wait(&self) {
        let delay = *self.delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

async fn handle_get(State(backend): State<MockBackend>, Path(endpoint): Path<String>) -> (StatusCode, Json<Value>) {
    backend.requests.lock().unwrap().push(Recorded {
        method: "GET".to_string(),
        endpoint: endpoint.clone(),
        fields: HashMap::new(),
        content_types: HashMap::new(),
        file_size: 0,
    });
    backend.wait().await;
    backend.reply(&endpoint)
}

async fn handle_post(
    State(backend): State<MockBackend>,
    Path(endpoint): Path<String>,
    mut multipart: Multipart,
) -> (StatusCode, Json<Value>) {
    let mut fields = HashMap::new();
    let mut content_types = HashMap::new();
    let mut file_size = 0;

    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        if let Some(content_type) = field.content_type() {
            content_types.insert(name.clone(), content_type.to_string());
        }
        match field.file_name().map(str::to_string) {
            Some(file_name) => {
                file_size = field.bytes().await.unwrap().len();
                fields.insert(name, file_name);
            }
            None => {
                fields.insert(name, field.text().await.unwrap());
            }
        }
    }

    backend.requests.lock().unwrap().push(Recorded {
        method: "POST".to_string(),
        endpoint: endpoint.clone(),
        fields,
        content_types,
        file_size,
    });
    backend.wait().await;
    backend.reply(&endpoint)
}

/// 启动模拟后端，返回 base URL（含 `/api` 前缀）
pub async fn start(backend: MockBackend) -> String {
    let app = Router::new()
        .route("/api/video/:endpoint", get(handle_get).post(handle_post))
        .layer(DefaultBodyLimit::disable())
        .with_state(backend);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}/api", addr)
}

pub struct Harness {
    pub backend: MockBackend,
    pub session: Arc<Session>,
    pub processor: VideoProcessor,
    pub clipboard: Arc<MemoryClipboard>,
    pub dir: tempfile::TempDir,
}

impl Harness {
    pub async fn new() -> Self {
        let backend = MockBackend::default();
        let base_url = start(backend.clone()).await;

        let logger = Logger::new();
        let api = ApiClient::new(base_url, logger.clone(), Some(Duration::from_secs(30))).unwrap();
        let clipboard = Arc::new(MemoryClipboard::new());
        let processor = VideoProcessor::new(api, View::shared(), logger, clipboard.clone());
        let session = Session::new(processor.clone());

        Self {
            backend,
            session,
            processor,
            clipboard,
            dir: tempfile::tempdir().unwrap(),
        }
    }

    /// 在临时目录中创建指定大小的视频文件
    pub fn video_file(&self, name: &str, size: usize) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, vec![0u8; size]).unwrap();
        path
    }

    pub fn view(&self) -> View {
        self.processor.snapshot()
    }
}
