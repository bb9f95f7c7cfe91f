use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD as base64_engine;
use base64::Engine;
use image::ImageFormat;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

fn extension_for(format: ImageFormat) -> &'static str {
    match format {
        ImageFormat::Png => "png",
        ImageFormat::Gif => "gif",
        ImageFormat::WebP => "webp",
        ImageFormat::Bmp => "bmp",
        _ => "jpg",
    }
}

/// 画廊中的一帧
#[derive(Debug, Clone)]
pub struct FrameItem {
    /// 图片的 Base64 数据（JPEG），未请求 Base64 时为 None
    pub base64_data: Option<String>,
    pub alt: String,
    /// 帧信息（每行一条）
    pub info: Vec<String>,
    /// “复制Base64”按钮对应的内容，仅 Base64 画廊有
    pub copy_payload: Option<String>,
}

impl FrameItem {
    /// `<img src>` 使用的 data URI
    pub fn data_uri(&self) -> Option<String> {
        self.base64_data
            .as_ref()
            .map(|data| format!("data:image/jpeg;base64,{}", data))
    }

    /// 解码图片数据，没有数据或非法 Base64 返回 None
    pub fn decode(&self) -> Option<Vec<u8>> {
        let data = self.base64_data.as_deref()?;
        base64_engine.decode(data.trim()).ok()
    }
}

/// 帧画廊容器
#[derive(Debug, Clone, Default)]
pub struct Gallery {
    items: Vec<FrameItem>,
    placeholder: Option<String>,
}

impl Gallery {
    pub fn clear(&mut self) {
        self.items.clear();
        self.placeholder = None;
    }

    /// 清空画廊并显示占位提示
    pub fn show_placeholder(&mut self, message: impl Into<String>) {
        self.items.clear();
        self.placeholder = Some(message.into());
    }

    pub fn push(&mut self, item: FrameItem) {
        self.items.push(item);
    }

    pub fn items(&self) -> &[FrameItem] {
        &self.items
    }

    pub fn placeholder(&self) -> Option<&str> {
        self.placeholder.as_deref()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// 将画廊中的帧写入目录，扩展名按图片实际格式确定
    ///
    /// 无法解码的帧会被跳过，返回写入的文件列表
    pub fn save_to(&self, dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)
            .with_context(|| format!("创建帧输出目录失败: {}", dir.display()))?;

        let mut saved = Vec::new();
        for (i, item) in self.items.iter().enumerate() {
            let Some(bytes) = item.decode() else {
                warn!("跳过没有图片数据或无法解码的帧: {}", item.alt);
                continue;
            };

            let extension = image::guess_format(&bytes)
                .map(extension_for)
                .unwrap_or("jpg");
            let path = dir.join(format!("frame_{:04}.{}", i + 1, extension));

            std::fs::write(&path, &bytes)
                .with_context(|| format!("写入帧文件失败: {}", path.display()))?;
            debug!("已保存帧: {}", path.display());
            saved.push(path);
        }

        Ok(saved)
    }
}

impl fmt::Display for Gallery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(placeholder) = &self.placeholder {
            return writeln!(f, "{}", placeholder);
        }
        for item in &self.items {
            match &item.base64_data {
                Some(data) => writeln!(f, "🖼  {} ({} 字节)", item.alt, data.len())?,
                None => writeln!(f, "🖼  {} (无图片数据)", item.alt)?,
            }
            for line in &item.info {
                writeln!(f, "    {}", line)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, ImageOutputFormat, Rgb};
    use std::io::Cursor;

    fn png_base64() -> String {
        let img = ImageBuffer::from_fn(4, 4, |_, _| Rgb([200u8, 10, 10]));
        let mut bytes = Cursor::new(Vec::new());
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut bytes, ImageOutputFormat::Png)
            .unwrap();
        base64_engine.encode(bytes.into_inner())
    }

    fn item(data: String) -> FrameItem {
        FrameItem {
            base64_data: Some(data),
            alt: "Frame 1".to_string(),
            info: vec![],
            copy_payload: None,
        }
    }

    #[test]
    fn test_placeholder_replaces_items() {
        let mut gallery = Gallery::default();
        gallery.push(item("AAAA".to_string()));
        gallery.show_placeholder("没有提取到帧数据");
        assert!(gallery.is_empty());
        assert_eq!(gallery.placeholder(), Some("没有提取到帧数据"));

        gallery.clear();
        assert_eq!(gallery.placeholder(), None);
    }

    #[test]
    fn test_save_to_uses_detected_format() {
        let dir = tempfile::tempdir().unwrap();
        let mut gallery = Gallery::default();
        gallery.push(item(png_base64()));
        gallery.push(item("不是base64!".to_string()));
        gallery.push(FrameItem {
            base64_data: None,
            ..item(String::new())
        });

        let saved = gallery.save_to(dir.path().join("frames")).unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].file_name().unwrap(), "frame_0001.png");
        assert!(saved[0].exists());
    }

    #[test]
    fn test_data_uri() {
        assert_eq!(
            item("QUJD".to_string()).data_uri().as_deref(),
            Some("data:image/jpeg;base64,QUJD")
        );

        let missing = FrameItem {
            base64_data: None,
            ..item(String::new())
        };
        assert_eq!(missing.data_uri(), None);
        assert_eq!(missing.decode(), None);

        let mut gallery = Gallery::default();
        gallery.push(missing);
        assert!(gallery.to_string().contains("Frame 1 (无图片数据)"));
    }
}
