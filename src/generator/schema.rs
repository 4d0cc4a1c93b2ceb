//! 基于JSON Schema的结构化校验：输入在发送前校验，输出在接收后校验

use schemars::JsonSchema;
use serde_json::Value;

/// 生成类型的JSON Schema
pub fn schema_of<T: JsonSchema>() -> Value {
    let schema = schemars::schema_for!(T);
    serde_json::to_value(schema).unwrap_or(Value::Bool(true))
}

/// 按Schema校验实例，返回所有违规项拼接成的说明
pub fn check(schema: &Value, instance: &Value) -> Result<(), String> {
    let validator =
        jsonschema::validator_for(schema).map_err(|e| format!("invalid schema: {}", e))?;

    let violations: Vec<String> = validator
        .iter_errors(instance)
        .map(|e| e.to_string())
        .collect();

    if violations.is_empty() {
        Ok(())
    } else {
        Err(violations.join("; "))
    }
}
