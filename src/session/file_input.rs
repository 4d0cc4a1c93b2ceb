use std::path::Path;
use thiserror::Error;

use crate::error::ValidationError;
use crate::utils::data_uri::DataUri;

/// 允许上传的文件类型
pub const ALLOWED_MIME_TYPES: [&str; 4] = [
    "application/pdf",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "text/plain",
];

const FALLBACK_MIME_TYPE: &str = "application/octet-stream";

/// 已选择的本地文件，内容以data URI形式保存
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSelection {
    pub name: String,
    pub data_uri: String,
}

#[derive(Debug, Error)]
pub enum FileSelectionError {
    #[error(transparent)]
    Rejected(#[from] ValidationError),

    #[error("Could not read the selected file {name}: {source}")]
    Unreadable {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

impl FileSelectionError {
    /// 通知标题
    pub fn title(&self) -> &'static str {
        match self {
            FileSelectionError::Rejected(e) => e.title(),
            FileSelectionError::Unreadable { .. } => "File Read Error",
        }
    }
}

impl FileSelection {
    /// 按声明的MIME类型校验并编码文件内容；空文件无法编码为合法的data URI，直接拒绝
    pub fn from_bytes(name: &str, mime_type: &str, bytes: &[u8]) -> Result<Self, ValidationError> {
        let mime_type = mime_type.trim().to_ascii_lowercase();
        if !ALLOWED_MIME_TYPES.contains(&mime_type.as_str()) {
            return Err(ValidationError::UnsupportedFileType {
                name: name.to_string(),
                mime: mime_type,
            });
        }
        if bytes.is_empty() {
            return Err(ValidationError::EmptyFile(name.to_string()));
        }

        Ok(Self {
            name: name.to_string(),
            data_uri: DataUri::encode(&mime_type, bytes).to_string(),
        })
    }

    /// 读取本地文件；MIME类型由扩展名推断，类型不允许时不读取内容
    pub async fn from_path(path: &Path) -> Result<Self, FileSelectionError> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        let mime_type = mime_for_path(path).unwrap_or(FALLBACK_MIME_TYPE);

        if !ALLOWED_MIME_TYPES.contains(&mime_type) {
            return Err(ValidationError::UnsupportedFileType {
                name,
                mime: mime_type.to_string(),
            }
            .into());
        }

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| FileSelectionError::Unreadable {
                name: name.clone(),
                source,
            })?;

        Ok(Self::from_bytes(&name, mime_type, &bytes)?)
    }

    pub fn mime_type(&self) -> Option<String> {
        DataUri::parse(&self.data_uri).ok().map(|d| d.mime_type)
    }
}

/// 扩展名到MIME类型
pub fn mime_for_path(path: &Path) -> Option<&'static str> {
    let extension = path.extension()?.to_string_lossy().to_ascii_lowercase();
    match extension.as_str() {
        "pdf" => Some("application/pdf"),
        "xlsx" => Some("application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"),
        "docx" => Some("application/vnd.openxmlformats-officedocument.wordprocessingml.document"),
        "txt" | "text" => Some("text/plain"),
        _ => None,
    }
}
