use serde::{Deserialize, Serialize};

/// 帧提取参数
///
/// 所有字段均可选，未设置（或为空字符串）的字段不会出现在请求中。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionOptions {
    /// 提取间隔（秒），未设置时由服务端按原帧率提取
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval_seconds: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time_seconds: Option<u32>,
    /// 结束时间（秒），未设置时提取到视频结束
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time_seconds: Option<u32>,
    /// 输出格式，如 jpg / png
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_format: Option<String>,
    /// 图片质量（1-100）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_quality: Option<u8>,
    /// 仅 extract-frames 接口使用
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_base64: Option<bool>,
}

impl ExtractionOptions {
    /// 逐字段合并：自身已设置的字段优先，其余取 `fallback`
    pub fn or(self, fallback: &ExtractionOptions) -> Self {
        Self {
            interval_seconds: self.interval_seconds.or(fallback.interval_seconds),
            start_time_seconds: self.start_time_seconds.or(fallback.start_time_seconds),
            end_time_seconds: self.end_time_seconds.or(fallback.end_time_seconds),
            output_format: self
                .output_format
                .filter(|f| !f.is_empty())
                .or_else(|| fallback.output_format.clone()),
            image_quality: self.image_quality.or(fallback.image_quality),
            return_base64: self.return_base64.or(fallback.return_base64),
        }
    }

    pub fn without_return_base64(mut self) -> Self {
        self.return_base64 = None;
        self
    }

    /// 生成 multipart 表单字段，跳过空值
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = Vec::new();
        if let Some(v) = self.interval_seconds {
            fields.push(("intervalSeconds", v.to_string()));
        }
        if let Some(v) = self.start_time_seconds {
            fields.push(("startTimeSeconds", v.to_string()));
        }
        if let Some(v) = self.end_time_seconds {
            fields.push(("endTimeSeconds", v.to_string()));
        }
        if let Some(v) = self.output_format.as_deref().filter(|v| !v.is_empty()) {
            fields.push(("outputFormat", v.to_string()));
        }
        if let Some(v) = self.image_quality {
            fields.push(("imageQuality", v.to_string()));
        }
        if let Some(v) = self.return_base64 {
            fields.push(("returnBase64", v.to_string()));
        }
        fields
    }

    /// 快速测试1：每5秒提取一帧
    pub fn every_five_seconds() -> Self {
        Self {
            interval_seconds: Some(5),
            start_time_seconds: Some(0),
            ..Self::jpg_defaults()
        }
    }

    /// 快速测试2：前30秒每2秒一帧
    pub fn first_thirty_seconds() -> Self {
        Self {
            interval_seconds: Some(2),
            start_time_seconds: Some(0),
            end_time_seconds: Some(30),
            ..Self::jpg_defaults()
        }
    }

    /// 快速测试3：提取所有帧
    pub fn all_frames() -> Self {
        Self::jpg_defaults()
    }

    fn jpg_defaults() -> Self {
        Self {
            output_format: Some("jpg".to_string()),
            image_quality: Some(85),
            return_base64: Some(true),
            ..Self::default()
        }
    }
}

/// 发往 `/video/extract-frames-json` 的 `request` 部分
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionRequest {
    pub video_file_name: String,
    #[serde(flatten)]
    pub options: ExtractionOptions,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> ExtractionOptions {
        ExtractionOptions {
            interval_seconds: Some(10),
            start_time_seconds: Some(3),
            end_time_seconds: None,
            output_format: Some("png".to_string()),
            image_quality: Some(70),
            return_base64: Some(false),
        }
    }

    #[test]
    fn test_custom_takes_precedence() {
        let resolved = ExtractionOptions::every_five_seconds().or(&form());
        assert_eq!(resolved.interval_seconds, Some(5));
        assert_eq!(resolved.start_time_seconds, Some(0));
        assert_eq!(resolved.output_format.as_deref(), Some("jpg"));
        assert_eq!(resolved.image_quality, Some(85));
        assert_eq!(resolved.return_base64, Some(true));
    }

    #[test]
    fn test_unset_custom_falls_back_to_form() {
        let resolved = ExtractionOptions::default().or(&form());
        assert_eq!(resolved, form());
    }

    #[test]
    fn test_unset_end_time_is_omitted() {
        let fields = form().form_fields();
        assert!(fields.iter().all(|(k, _)| *k != "endTimeSeconds"));
        assert!(fields.contains(&("returnBase64", "false".to_string())));

        let json = serde_json::to_value(&form()).unwrap();
        assert!(json.get("endTimeSeconds").is_none());
    }

    #[test]
    fn test_empty_output_format_is_omitted() {
        let options = ExtractionOptions {
            output_format: Some(String::new()),
            ..ExtractionOptions::default()
        };
        assert!(options.form_fields().is_empty());
        assert_eq!(options.or(&ExtractionOptions::default()).output_format, None);
    }

    #[test]
    fn test_request_part_flattens_options() {
        let request = ExtractionRequest {
            video_file_name: "clip.mp4".to_string(),
            options: ExtractionOptions::first_thirty_seconds(),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["videoFileName"], "clip.mp4");
        assert_eq!(json["endTimeSeconds"], 30);
        assert_eq!(json["imageQuality"], 85);
    }
}
