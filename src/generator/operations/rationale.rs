use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::generator::operation::{GenerationOperation, PromptTemplate, require_text};
use crate::generator::types::OperationKind;
use crate::i18n::TargetLanguage;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
#[serde(rename_all = "camelCase")]
pub struct ExplainRationaleInput {
    /// A description of the architecture diagram.
    pub architecture_diagram_description: String,
    /// The specific component to explain.
    pub component: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ExplainRationaleOutput {
    /// The explanation of why the component was chosen.
    pub rationale: String,
}

/// 解释架构中某个组件的选型理由
#[derive(Debug, Clone, Default)]
pub struct ExplainRationale {
    pub language: TargetLanguage,
}

impl ExplainRationale {
    pub fn new(language: TargetLanguage) -> Self {
        Self { language }
    }
}

impl GenerationOperation for ExplainRationale {
    type Input = ExplainRationaleInput;
    type Output = ExplainRationaleOutput;

    fn kind(&self) -> OperationKind {
        OperationKind::ExplainRationale
    }

    fn prompt_template(&self) -> PromptTemplate {
        PromptTemplate {
            id: self.kind().template_id(),
            system_prompt: format!(
                "You are an expert system architect. Given a description of an architecture diagram and a specific component, \
                 explain the rationale behind the selection of that component in the architecture.\n\n{}",
                self.language.prompt_instruction()
            ),
            user_template: "Architecture Diagram Description: {{architectureDiagramDescription}}\n\
                            Component: {{component}}\n\n\
                            Explain the rationale in a concise and informative manner. Focus on the benefits, \
                            suitability for the described architecture, and potential alternatives."
                .to_string(),
        }
    }

    fn validate_input(&self, input: &Self::Input) -> Result<(), ValidationError> {
        require_text("architectureDiagramDescription", &input.architecture_diagram_description)?;
        require_text("component", &input.component)
    }
}
