pub mod api_client;
pub mod clipboard;
pub mod config;
pub mod error;
pub mod gallery;
pub mod logger;
pub mod models;
pub mod options;
pub mod processor;
pub mod session;
pub mod shell;
pub mod ui;
pub mod view;

pub use api_client::{ApiClient, DEFAULT_API_BASE_URL};
pub use clipboard::{Clipboard, MemoryClipboard, SystemClipboard};
pub use config::{ClientConfig, ConfigLoader, ConfigOverrides};
pub use error::{ClientError, ClientResult};
pub use gallery::{FrameItem, Gallery};
pub use logger::{LogEntry, LogKind, Logger};
pub use models::{Frame, VideoInfo};
pub use options::ExtractionOptions;
pub use processor::{Outcome, VideoProcessor};
pub use session::{Action, ActionKey, Session};
pub use view::{SelectedFile, SharedView, View};
