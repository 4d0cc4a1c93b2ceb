use anyhow::{Result, anyhow};
use serde_json::Value;

use crate::config::LLMConfig;

/// 短prompt优先使用高能效模型，失败时由高质量模型兜底
pub fn evaluate_befitting_model(
    llm_config: &LLMConfig,
    system_prompt: &str,
    user_prompt: &str,
) -> (String, Option<String>) {
    if system_prompt.len() + user_prompt.len() <= 32 * 1024 {
        let fallover = (llm_config.model_powerful != llm_config.model_efficient)
            .then(|| llm_config.model_powerful.clone());
        return (llm_config.model_efficient.clone(), fallover);
    }
    (llm_config.model_powerful.clone(), None)
}

/// 要求模型只输出符合Schema的JSON对象
pub fn schema_instruction(schema: &Value) -> String {
    format!(
        "Respond with a single JSON object and nothing else. The object must validate against this JSON Schema:\n{}",
        serde_json::to_string_pretty(schema).unwrap_or_else(|_| schema.to_string())
    )
}

/// 从模型回复中取出JSON对象，容忍Markdown代码块和前后说明文字
pub fn extract_json_object(text: &str) -> Result<Value> {
    let trimmed = text.trim();
    if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(trimmed) {
        return Ok(value);
    }

    let start = trimmed.find('{');
    let end = trimmed.rfind('}');
    match (start, end) {
        (Some(start), Some(end)) if start < end => {
            serde_json::from_str::<Value>(&trimmed[start..=end])
                .map_err(|e| anyhow!("model reply is not valid JSON: {}", e))
        }
        _ => Err(anyhow!("model reply does not contain a JSON object")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_plain_object() {
        let value = extract_json_object(r#"{"diagram": "graph TD; A-->B;"}"#).unwrap();
        assert_eq!(value, json!({"diagram": "graph TD; A-->B;"}));
    }

    #[test]
    fn test_extract_fenced_object() {
        let reply = "Here you go:\n```json\n{\"rationale\": \"Spreads load.\"}\n```\n";
        let value = extract_json_object(reply).unwrap();
        assert_eq!(value, json!({"rationale": "Spreads load."}));
    }

    #[test]
    fn test_extract_rejects_prose() {
        assert!(extract_json_object("I cannot help with that.").is_err());
        assert!(extract_json_object("{ not json }").is_err());
    }

    #[test]
    fn test_model_choice() {
        let config = LLMConfig {
            model_efficient: "small".to_string(),
            model_powerful: "large".to_string(),
            ..Default::default()
        };
        assert_eq!(
            evaluate_befitting_model(&config, "sys", "user"),
            ("small".to_string(), Some("large".to_string()))
        );

        let huge = "x".repeat(40 * 1024);
        assert_eq!(
            evaluate_befitting_model(&config, "sys", &huge),
            ("large".to_string(), None)
        );

        let same = LLMConfig {
            model_efficient: "only".to_string(),
            model_powerful: "only".to_string(),
            ..Default::default()
        };
        assert_eq!(
            evaluate_befitting_model(&same, "sys", "user"),
            ("only".to_string(), None)
        );
    }
}
