use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

// 后端响应结构仅从调用方式推断，所有字段都给默认值，只有 `success` 决定是否渲染。
// 后端会显式返回 `null`（如未请求 Base64 时的 `base64Data`），可能为 null 的字段用 Option 或 `null_as_default`。

/// 把 `null` 当作缺省值
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// 健康检查响应
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthStatus {
    pub status: Option<String>,
    pub service: Option<String>,
    pub timestamp: Option<i64>,
}

/// 支持的格式
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SupportedFormats {
    #[serde(deserialize_with = "null_as_default")]
    pub video_formats: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub image_formats: Vec<String>,
}

/// 视频信息
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VideoInfo {
    pub file_name: Option<String>,
    /// 时长（毫秒）
    pub duration: u64,
    pub frame_rate: f64,
    pub width: u32,
    pub height: u32,
    /// 文件大小（字节）
    pub file_size: u64,
    pub format: Option<String>,
    pub total_frames: u64,
}

/// 单帧数据
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Frame {
    pub frame_number: u64,
    pub timestamp_seconds: f64,
    pub width: u32,
    pub height: u32,
    /// 仅在请求了 `returnBase64` 时有值
    pub base64_data: Option<String>,
    pub file_name: Option<String>,
}

/// `{success, data}` 形式的响应
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DataResponse<T> {
    pub message: Option<String>,
    pub data: T,
}

/// 帧提取结果（extract-frames / extract-frames-json）
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExtractionResult {
    pub message: Option<String>,
    pub total_frames_extracted: u64,
    pub processing_time_ms: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub frames: Vec<Frame>,
    pub video_info: Option<VideoInfo>,
}

/// 仅 Base64 的帧提取结果
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Base64ExtractionResult {
    pub message: Option<String>,
    pub total_frames_extracted: u64,
    pub processing_time_ms: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub base64_frames: Vec<String>,
}

/// JSON 格式生成结果
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct JsonFormatResult {
    pub message: Option<String>,
    pub total_frames_extracted: u64,
    pub processing_time_ms: u64,
    pub json_format: Value,
}

/// 响应是否标记为成功（缺失视为失败）
pub fn is_success(response: &Value) -> bool {
    response.get("success").and_then(Value::as_bool).unwrap_or(false)
}

/// 服务端返回的错误消息
pub fn server_message(response: &Value) -> String {
    response
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or("服务端未返回错误信息")
        .to_string()
}
