use async_trait::async_trait;
use regex::{Captures, Regex};
use schemars::JsonSchema;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::sync::LazyLock;

use crate::error::{GenerationError, ValidationError};
use crate::generator::schema::{check, schema_of};
use crate::generator::types::OperationKind;
use crate::llm::{BackendTimeout, GenerationBackend, GenerationRequest};
use crate::utils::data_uri::DataUri;

/// `{{field}}` 或 `{{media field}}`
static PLACEHOLDER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*(media\s+)?([A-Za-z_][A-Za-z0-9_]*)\s*\}\}")
        .expect("placeholder pattern must compile")
});

/// Prompt模板配置
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    /// 模板标识
    pub id: &'static str,
    /// 系统提示词
    pub system_prompt: String,
    /// 用户提示词模板，占位符由序列化后的输入字段填充
    pub user_template: String,
}

impl PromptTemplate {
    /// 用输入对象渲染用户提示词；缺失字段渲染为空串
    pub fn render(&self, input: &Value) -> String {
        PLACEHOLDER_PATTERN
            .replace_all(&self.user_template, |caps: &Captures| {
                let value = input
                    .get(&caps[2])
                    .and_then(Value::as_str)
                    .unwrap_or_default();
                if caps.get(1).is_some() {
                    render_media(value)
                } else {
                    value.to_string()
                }
            })
            .into_owned()
    }
}

/// 文本类附件直接内联，其余附件连同MIME类型原样传递
fn render_media(uri: &str) -> String {
    match DataUri::parse(uri) {
        Ok(data_uri) if data_uri.is_textual() => match data_uri.decode() {
            Ok(bytes) => format!(
                "[attached file, {}]\n{}\n[end of file]",
                data_uri.mime_type,
                String::from_utf8_lossy(&bytes)
            ),
            Err(_) => uri.to_string(),
        },
        Ok(data_uri) => format!(
            "[attached file, {}, base64 encoded]\n{}\n[end of file]",
            data_uri.mime_type, data_uri
        ),
        Err(_) => uri.to_string(),
    }
}

/// 生成操作契约：一次类型化的请求/响应往返，不重试、不持有本地状态
#[async_trait]
pub trait GenerationOperation: Send + Sync {
    /// 输入记录
    type Input: Serialize + JsonSchema + Send + Sync;
    /// 输出记录 - 必须是封闭的结构
    type Output: JsonSchema + DeserializeOwned + Serialize + Send + Sync + 'static;

    fn kind(&self) -> OperationKind;

    /// Prompt模板配置
    fn prompt_template(&self) -> PromptTemplate;

    /// 语义层面的输入校验（非空等），结构校验由Schema完成
    fn validate_input(&self, input: &Self::Input) -> Result<(), ValidationError>;

    /// 默认实现的execute方法：校验输入 -> 渲染prompt -> 调用后端 -> 校验输出
    async fn execute(
        &self,
        backend: &dyn GenerationBackend,
        input: &Self::Input,
    ) -> Result<Self::Output, GenerationError> {
        let operation = self.kind();
        let invalid_input =
            |source: ValidationError| GenerationError::InvalidInput { operation, source };

        // 1. 输入校验
        self.validate_input(input).map_err(invalid_input)?;
        let input_value = serde_json::to_value(input)
            .map_err(|e| invalid_input(ValidationError::Schema(e.to_string())))?;
        check(&schema_of::<Self::Input>(), &input_value)
            .map_err(|details| invalid_input(ValidationError::Schema(details)))?;

        // 2. 构建请求
        let template = self.prompt_template();
        let output_schema = schema_of::<Self::Output>();
        let request = GenerationRequest {
            template_id: template.id.to_string(),
            system_prompt: template.system_prompt.clone(),
            user_prompt: template.render(&input_value),
            input: input_value,
            output_schema: output_schema.clone(),
        };

        // 3. 调用后端，超时单独归类
        let raw = backend.invoke(&request).await.map_err(|err| {
            match err.downcast_ref::<BackendTimeout>() {
                Some(timeout) => GenerationError::Timeout {
                    operation,
                    seconds: timeout.seconds,
                },
                None => GenerationError::Backend {
                    operation,
                    message: format!("{:#}", err),
                },
            }
        })?;

        // 4. 输出校验：畸形输出不做部分接受
        check(&output_schema, &raw)
            .map_err(|details| GenerationError::SchemaViolation { operation, details })?;
        serde_json::from_value::<Self::Output>(raw).map_err(|e| {
            GenerationError::SchemaViolation {
                operation,
                details: e.to_string(),
            }
        })
    }
}

/// 文本字段不能为空或只含空白
pub(crate) fn require_text(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::EmptyField(field))
    } else {
        Ok(())
    }
}
