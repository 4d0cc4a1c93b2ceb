//! 错误类型 - 区分本地前置校验、生成调用与图表渲染三类失败

use thiserror::Error;

use crate::generator::types::OperationKind;

/// 前置条件校验失败：从不触达后端，也从不修改会话状态
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please provide a description for the diagram.")]
    EmptyDescription,

    #[error("Please select a file to extract requirements.")]
    NoFileSelected,

    #[error("No architecture description available. Please generate a diagram first.")]
    NoArchitectureDescription,

    #[error("Please enter a component name.")]
    EmptyComponentName,

    #[error("Field `{0}` must not be empty.")]
    EmptyField(&'static str),

    #[error("Not a base64 data URI with an explicit MIME type: {0}")]
    InvalidDataUri(String),

    #[error("The selected file {0} is empty.")]
    EmptyFile(String),

    #[error("Unsupported file type `{mime}` for {name}. Please upload PDF, XLSX, DOCX, or TXT files.")]
    UnsupportedFileType { name: String, mime: String },

    #[error("Input does not match its schema: {0}")]
    Schema(String),
}

impl ValidationError {
    /// 通知标题
    pub fn title(&self) -> &'static str {
        match self {
            ValidationError::NoFileSelected
            | ValidationError::EmptyFile(_)
            | ValidationError::InvalidDataUri(_) => "File Error",
            ValidationError::UnsupportedFileType { .. } => "Invalid File Type",
            _ => "Input Error",
        }
    }
}

/// 一次生成调用失败；畸形输出与后端报错同等对待
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("invalid input for {operation}: {source}")]
    InvalidInput {
        operation: OperationKind,
        #[source]
        source: ValidationError,
    },

    #[error("{operation} backend call failed: {message}")]
    Backend {
        operation: OperationKind,
        message: String,
    },

    #[error("{operation} timed out after {seconds}s")]
    Timeout { operation: OperationKind, seconds: u64 },

    #[error("{operation} returned output violating its schema: {details}")]
    SchemaViolation {
        operation: OperationKind,
        details: String,
    },
}

impl GenerationError {
    pub fn operation(&self) -> OperationKind {
        match self {
            GenerationError::InvalidInput { operation, .. }
            | GenerationError::Backend { operation, .. }
            | GenerationError::Timeout { operation, .. }
            | GenerationError::SchemaViolation { operation, .. } => *operation,
        }
    }
}

/// 图表源码无法渲染；失败内容本身会替代图表展示
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Could not render diagram. Details: {message}")]
pub struct RenderFailure {
    /// 出错的图表源码（原样保留）
    pub source_text: String,
    pub message: String,
    /// 出错行号（从1开始），无法定位时为None
    pub line: Option<usize>,
}

impl RenderFailure {
    pub fn new(source_text: &str, message: impl Into<String>) -> Self {
        Self {
            source_text: source_text.to_string(),
            message: message.into(),
            line: None,
        }
    }

    pub fn at_line(source_text: &str, line: usize, message: impl Into<String>) -> Self {
        Self {
            source_text: source_text.to_string(),
            message: format!("Parse error on line {}: {}", line, message.into()),
            line: Some(line),
        }
    }
}

/// 编排器操作边界上的失败
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    /// 同一操作已在进行中，本次请求被忽略（不排队）
    #[error("{0} is already in progress")]
    Busy(OperationKind),
}

impl OrchestratorError {
    pub fn is_validation(&self) -> bool {
        matches!(self, OrchestratorError::Validation(_))
    }

    pub fn is_busy(&self) -> bool {
        matches!(self, OrchestratorError::Busy(_))
    }
}
