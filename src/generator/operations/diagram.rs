use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::generator::operation::{GenerationOperation, PromptTemplate, require_text};
use crate::generator::types::OperationKind;
use crate::types::CloudPlatform;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct GenerateDiagramInput {
    /// A natural language description of the desired architecture.
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct GenerateDiagramOutput {
    /// The generated architectural diagram in Mermaid syntax.
    pub diagram: String,
}

/// 由自然语言描述生成Mermaid架构图源码
#[derive(Debug, Clone, Default)]
pub struct GenerateDiagram {
    pub platform: CloudPlatform,
}

impl GenerateDiagram {
    pub fn new(platform: CloudPlatform) -> Self {
        Self { platform }
    }
}

impl GenerationOperation for GenerateDiagram {
    type Input = GenerateDiagramInput;
    type Output = GenerateDiagramOutput;

    fn kind(&self) -> OperationKind {
        OperationKind::GenerateDiagram
    }

    fn prompt_template(&self) -> PromptTemplate {
        let mut system_prompt = String::from(
            "You are an AI architect that will generate an architectural diagram based on a user provided description.\n\
             The diagram should be represented in Mermaid flowchart syntax (`graph TD` or `flowchart LR`).\n\
             Return only the diagram source, without Markdown code fences or commentary.",
        );
        if self.platform != CloudPlatform::Generic {
            system_prompt.push_str(&format!(
                "\nWhere a managed service fits, prefer the offerings of {} and name them explicitly in node labels.",
                self.platform.display_name()
            ));
        }

        PromptTemplate {
            id: self.kind().template_id(),
            system_prompt,
            user_template: "Description: {{description}}\nDiagram:".to_string(),
        }
    }

    fn validate_input(&self, input: &Self::Input) -> Result<(), ValidationError> {
        require_text("description", &input.description)
    }
}
