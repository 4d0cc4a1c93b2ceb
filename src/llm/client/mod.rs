//! LLM客户端 - 基于rig的生成后端实现

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::future::Future;
use std::time::Duration;

use crate::config::LLMConfig;
use crate::llm::{BackendTimeout, GenerationBackend, GenerationRequest};

mod providers;
pub mod utils;

use providers::{ProviderAgent, ProviderClient};
use utils::{evaluate_befitting_model, extract_json_object, schema_instruction};

/// LLM客户端 - 提供统一的LLM服务接口
#[derive(Clone)]
pub struct LLMClient {
    config: LLMConfig,
    client: ProviderClient,
}

impl LLMClient {
    /// 创建新的LLM客户端
    pub fn new(config: LLMConfig) -> Result<Self> {
        let client = ProviderClient::new(&config)?;
        Ok(Self { client, config })
    }

    /// 检查模型连接和功能是否正常
    pub async fn check_connection(&self) -> Result<()> {
        tracing::info!("🔄 正在检查模型连接...");
        let agent = self.client.create_agent(
            &self.config.model_efficient,
            "System: You are a helpful assistant.",
            &self.config,
        )?;
        match self.prompt_with_deadline(&agent, "Hello").await {
            Ok(_) => {
                tracing::info!("✅ 模型连接正常");
                Ok(())
            }
            Err(e) => {
                tracing::warn!("❌ 模型连接失败: {:#}", e);
                Err(e)
            }
        }
    }

    /// 通用重试逻辑，用于处理异步操作的重试机制
    async fn retry_with_backoff<T, F, Fut>(&self, operation: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, anyhow::Error>>,
    {
        let max_retries = self.config.retry_attempts;
        let retry_delay_ms = self.config.retry_delay_ms;
        let mut retries = 0;

        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(err) => {
                    retries += 1;
                    tracing::warn!(
                        "❌ 调用模型服务出错 (第 {} / {}次尝试): {:#}",
                        retries,
                        max_retries,
                        err
                    );
                    if retries >= max_retries {
                        return Err(err);
                    }
                    tokio::time::sleep(Duration::from_millis(retry_delay_ms)).await;
                }
            }
        }
    }

    /// 单次调用，受timeout_seconds约束
    async fn prompt_with_deadline(&self, agent: &ProviderAgent, user_prompt: &str) -> Result<String> {
        let seconds = self.config.timeout_seconds;
        match tokio::time::timeout(Duration::from_secs(seconds), agent.prompt(user_prompt)).await {
            Ok(result) => result,
            Err(_) => Err(BackendTimeout { seconds }.into()),
        }
    }

    /// 结构化调用：prompt后从回复中解析出JSON对象
    async fn invoke_with_model(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        model: &str,
    ) -> Result<Value> {
        let agent = self.client.create_agent(model, system_prompt, &self.config)?;

        self.retry_with_backoff(|| async {
            let text = self.prompt_with_deadline(&agent, user_prompt).await?;
            extract_json_object(&text)
        })
        .await
    }
}

#[async_trait]
impl GenerationBackend for LLMClient {
    async fn invoke(&self, request: &GenerationRequest) -> Result<Value> {
        let system_prompt = format!(
            "{}\n\n{}",
            request.system_prompt,
            schema_instruction(&request.output_schema)
        );
        let (befitting_model, fallover_model) =
            evaluate_befitting_model(&self.config, &system_prompt, &request.user_prompt);

        tracing::debug!(
            template = %request.template_id,
            model = %befitting_model,
            "dispatching generation request"
        );

        let result = self
            .invoke_with_model(&system_prompt, &request.user_prompt, &befitting_model)
            .await;

        match (result, fallover_model) {
            (Ok(value), _) => Ok(value),
            (Err(e), Some(model)) => {
                tracing::warn!(
                    "❌ 模型 {} 尝试 {} 次均失败，改用备选模型 {}...{:#}",
                    befitting_model,
                    self.config.retry_attempts,
                    model,
                    e
                );
                let user_prompt_with_fixer = format!(
                    "{}\n\nNote: a previous attempt failed with \"{}\". Avoid repeating that mistake.",
                    request.user_prompt, e
                );
                self.invoke_with_model(&system_prompt, &user_prompt_with_fixer, &model)
                    .await
            }
            (Err(e), None) => Err(e),
        }
    }
}
