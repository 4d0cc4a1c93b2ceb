use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::generator::operation::{GenerationOperation, PromptTemplate};
use crate::generator::types::OperationKind;
use crate::i18n::TargetLanguage;
use crate::utils::data_uri::DataUri;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
#[serde(rename_all = "camelCase")]
pub struct ExtractRequirementsInput {
    /// A file containing architectural requirements, as a data URI that must include a MIME type and use Base64 encoding. Expected format: 'data:<mimetype>;base64,<encoded_data>'.
    pub file_data_uri: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
#[serde(rename_all = "camelCase")]
pub struct ExtractRequirementsOutput {
    /// The extracted and interpreted architectural requirements from the file.
    pub extracted_requirements: String,
}

/// 从上传文件中提取架构需求
#[derive(Debug, Clone, Default)]
pub struct ExtractRequirements {
    pub language: TargetLanguage,
}

impl ExtractRequirements {
    pub fn new(language: TargetLanguage) -> Self {
        Self { language }
    }
}

impl GenerationOperation for ExtractRequirements {
    type Input = ExtractRequirementsInput;
    type Output = ExtractRequirementsOutput;

    fn kind(&self) -> OperationKind {
        OperationKind::ExtractRequirements
    }

    fn prompt_template(&self) -> PromptTemplate {
        PromptTemplate {
            id: self.kind().template_id(),
            system_prompt: format!(
                "You are an expert architect specializing in extracting architectural requirements from files.\n\
                 You will use the information in the file to identify the architectural requirements.\n\n{}",
                self.language.prompt_instruction()
            ),
            user_template: "Interpret the file content and extract the requirements.\n\nFile: {{media fileDataUri}}"
                .to_string(),
        }
    }

    fn validate_input(&self, input: &Self::Input) -> Result<(), ValidationError> {
        DataUri::parse(&input.file_data_uri).map(|_| ())
    }
}
