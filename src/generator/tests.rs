#[cfg(test)]
mod tests {
    use crate::error::{GenerationError, ValidationError};
    use crate::generator::operation::{GenerationOperation, PromptTemplate};
    use crate::generator::operations::{
        ExplainRationale, ExplainRationaleInput, ExtractRequirements, ExtractRequirementsInput,
        GenerateDiagram, GenerateDiagramInput, GenerateUserFlow, GenerateUserFlowInput,
    };
    use crate::generator::schema::{check, schema_of};
    use crate::generator::types::OperationKind;
    use crate::i18n::TargetLanguage;
    use crate::llm::ScriptedBackend;
    use crate::types::CloudPlatform;
    use crate::utils::data_uri::DataUri;
    use serde_json::json;

    #[test]
    fn test_template_render_fills_placeholders() {
        let template = PromptTemplate {
            id: "test",
            system_prompt: String::new(),
            user_template: "A={{a}} B={{ b }} missing=[{{c}}]".to_string(),
        };
        let rendered = template.render(&json!({"a": "one", "b": "two"}));
        assert_eq!(rendered, "A=one B=two missing=[]");
    }

    #[test]
    fn test_template_inlines_text_media() {
        let template = PromptTemplate {
            id: "test",
            system_prompt: String::new(),
            user_template: "File: {{media file}}".to_string(),
        };
        let uri = DataUri::encode("text/plain", b"api gateway in front of lambdas").to_string();
        let rendered = template.render(&json!({"file": uri}));

        assert!(rendered.contains("[attached file, text/plain]"));
        assert!(rendered.contains("api gateway in front of lambdas"));
        assert!(rendered.ends_with("[end of file]"));
    }

    #[test]
    fn test_template_passes_binary_media_through() {
        let template = PromptTemplate {
            id: "test",
            system_prompt: String::new(),
            user_template: "{{media file}}".to_string(),
        };
        let uri = DataUri::encode("application/pdf", b"%PDF-1.7").to_string();
        let rendered = template.render(&json!({"file": uri.clone()}));

        assert!(rendered.contains("application/pdf, base64 encoded"));
        assert!(rendered.contains(&uri));
    }

    #[test]
    fn test_template_ids_are_distinct() {
        let ids: std::collections::HashSet<&str> =
            OperationKind::ALL.iter().map(|k| k.template_id()).collect();
        assert_eq!(ids.len(), 4);
        assert_eq!(
            GenerateDiagram::default().prompt_template().id,
            "generateDiagramPrompt"
        );
    }

    #[test]
    fn test_output_schema_is_closed() {
        let schema = schema_of::<crate::generator::operations::GenerateDiagramOutput>();
        assert!(check(&schema, &json!({"diagram": "graph TD; A-->B;"})).is_ok());
        assert!(check(&schema, &json!({"diagram": "x", "extra": 1})).is_err());
        assert!(check(&schema, &json!({})).is_err());
        assert!(check(&schema, &json!({"diagram": 42})).is_err());
    }

    #[test]
    fn test_platform_preference_in_system_prompt() {
        let generic = GenerateDiagram::new(CloudPlatform::Generic).prompt_template();
        assert!(!generic.system_prompt.contains("prefer the offerings"));

        let azure = GenerateDiagram::new(CloudPlatform::Azure).prompt_template();
        assert!(azure.system_prompt.contains("Microsoft Azure"));
    }

    #[test]
    fn test_language_instruction_in_narrative_prompts() {
        let flow = GenerateUserFlow::new(TargetLanguage::Chinese).prompt_template();
        assert!(flow.system_prompt.contains("请使用中文作答"));

        let rationale = ExplainRationale::new(TargetLanguage::German).prompt_template();
        assert!(rationale.system_prompt.contains("auf Deutsch"));
    }

    #[tokio::test]
    async fn test_execute_returns_typed_output() {
        let backend = ScriptedBackend::new();
        backend.reply(
            OperationKind::GenerateDiagram,
            json!({"diagram": "graph TD; LB-->Web-->App-->DB;"}),
        );

        let output = GenerateDiagram::default()
            .execute(
                &backend,
                &GenerateDiagramInput {
                    description: "three-tier web app".to_string(),
                },
            )
            .await
            .unwrap();
        assert_eq!(output.diagram, "graph TD; LB-->Web-->App-->DB;");

        let requests = backend.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].template_id, "generateDiagramPrompt");
        assert!(requests[0].user_prompt.contains("three-tier web app"));
        assert_eq!(requests[0].output_schema["type"], "object");
    }

    #[tokio::test]
    async fn test_execute_rejects_blank_input_without_invoking() {
        let backend = ScriptedBackend::new();

        let err = GenerateUserFlow::default()
            .execute(
                &backend,
                &GenerateUserFlowInput {
                    architecture_diagram: "  ".to_string(),
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            GenerationError::InvalidInput {
                operation: OperationKind::GenerateUserFlow,
                source: ValidationError::EmptyField("architectureDiagram"),
            }
        ));
        assert!(backend.requests().is_empty());
    }

    #[tokio::test]
    async fn test_execute_rejects_malformed_data_uri() {
        let backend = ScriptedBackend::new();

        let err = ExtractRequirements::default()
            .execute(
                &backend,
                &ExtractRequirementsInput {
                    file_data_uri: "not-a-data-uri".to_string(),
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            GenerationError::InvalidInput {
                source: ValidationError::InvalidDataUri(_),
                ..
            }
        ));
        assert!(backend.requests().is_empty());
    }

    #[tokio::test]
    async fn test_execute_classifies_backend_failures() {
        let backend = ScriptedBackend::new();
        backend
            .fail(OperationKind::ExplainRationale, "connection reset")
            .time_out(OperationKind::ExplainRationale, 12)
            .reply(OperationKind::ExplainRationale, json!({"reason": "wrong field"}));

        let operation = ExplainRationale::default();
        let input = ExplainRationaleInput {
            architecture_diagram_description: "cache in front of db".to_string(),
            component: "cache".to_string(),
        };

        let first = operation.execute(&backend, &input).await.unwrap_err();
        assert!(matches!(first, GenerationError::Backend { ref message, .. } if message.contains("connection reset")));

        let second = operation.execute(&backend, &input).await.unwrap_err();
        assert!(matches!(second, GenerationError::Timeout { seconds: 12, .. }));

        let third = operation.execute(&backend, &input).await.unwrap_err();
        assert!(matches!(third, GenerationError::SchemaViolation { .. }));
        assert_eq!(third.operation(), OperationKind::ExplainRationale);

        // 每次execute恰好一次调用，不在操作层重试
        assert_eq!(backend.requests().len(), 3);
    }
}
