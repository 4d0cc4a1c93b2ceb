//! 生成后端能力边界：`invoke(template, typedInput) -> typedOutput`

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

pub mod client;
pub mod scripted;

pub use client::LLMClient;
pub use scripted::ScriptedBackend;

/// 一次发往生成后端的请求
#[derive(Debug, Clone, Serialize)]
pub struct GenerationRequest {
    /// Prompt模板标识
    pub template_id: String,
    pub system_prompt: String,
    pub user_prompt: String,
    /// 原始的类型化输入（已序列化）
    pub input: Value,
    /// 期望输出的JSON Schema
    pub output_schema: Value,
}

/// 生成后端：每次调用至多发出一次请求，成功时返回未经校验的JSON
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    async fn invoke(&self, request: &GenerationRequest) -> Result<Value>;
}

/// 后端调用超出时限
#[derive(Debug, thiserror::Error)]
#[error("model call exceeded the {seconds}s deadline")]
pub struct BackendTimeout {
    pub seconds: u64,
}
