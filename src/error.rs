/// 请求层错误（传输错误与协议错误）
///
/// 非 2xx 状态码与网络错误走同一条路径：记录日志后返回给调用方，
/// 由 `VideoProcessor` 在方法边界统一渲染为错误消息。
#[derive(thiserror::Error, Debug)]
pub enum ClientError {
    /// 服务端返回非 2xx 状态码
    #[error("HTTP {status}: {status_text}")]
    Status { status: u16, status_text: String },

    /// 网络错误（连接失败、请求构建失败等）
    #[error("{0}")]
    Network(#[from] reqwest::Error),

    /// 响应体不是合法 JSON，或不符合预期结构
    #[error("响应解析失败: {0}")]
    Decode(String),

    /// 读取待上传文件失败
    #[error("读取文件失败: {0}")]
    Io(#[from] std::io::Error),
}

pub type ClientResult<T> = Result<T, ClientError>;

impl ClientError {
    /// 状态码（仅协议错误有）
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
