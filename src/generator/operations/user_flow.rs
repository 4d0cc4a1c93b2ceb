use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::generator::operation::{GenerationOperation, PromptTemplate, require_text};
use crate::generator::types::OperationKind;
use crate::i18n::TargetLanguage;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
#[serde(rename_all = "camelCase")]
pub struct GenerateUserFlowInput {
    /// A description of the architecture diagram.
    pub architecture_diagram: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
#[serde(rename_all = "camelCase")]
pub struct GenerateUserFlowOutput {
    /// The explanation of the user flow.
    pub user_flow_explanation: String,
}

/// 基于架构描述讲解用户流程
#[derive(Debug, Clone, Default)]
pub struct GenerateUserFlow {
    pub language: TargetLanguage,
}

impl GenerateUserFlow {
    pub fn new(language: TargetLanguage) -> Self {
        Self { language }
    }
}

impl GenerationOperation for GenerateUserFlow {
    type Input = GenerateUserFlowInput;
    type Output = GenerateUserFlowOutput;

    fn kind(&self) -> OperationKind {
        OperationKind::GenerateUserFlow
    }

    fn prompt_template(&self) -> PromptTemplate {
        PromptTemplate {
            id: self.kind().template_id(),
            system_prompt: format!(
                "You are an expert in designing and explaining user flows for complex systems.\n\n{}",
                self.language.prompt_instruction()
            ),
            user_template: "Based on the following architecture diagram description, generate a detailed user flow explanation.\n\n\
                            Architecture Diagram Description: {{architectureDiagram}}"
                .to_string(),
        }
    }

    fn validate_input(&self, input: &Self::Input) -> Result<(), ValidationError> {
        require_text("architectureDiagram", &input.architecture_diagram)
    }
}
