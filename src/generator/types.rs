use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// 生成操作类型枚举，每种操作独立占用一个会话槽位
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationKind {
    GenerateDiagram,
    ExtractRequirements,
    GenerateUserFlow,
    ExplainRationale,
}

impl OperationKind {
    pub const ALL: [OperationKind; 4] = [
        OperationKind::GenerateDiagram,
        OperationKind::ExtractRequirements,
        OperationKind::GenerateUserFlow,
        OperationKind::ExplainRationale,
    ];

    /// 对应的Prompt模板标识
    pub fn template_id(&self) -> &'static str {
        match self {
            OperationKind::GenerateDiagram => "generateDiagramPrompt",
            OperationKind::ExtractRequirements => "extractRequirementsFromFilePrompt",
            OperationKind::GenerateUserFlow => "generateUserFlowPrompt",
            OperationKind::ExplainRationale => "explainComponentRationalePrompt",
        }
    }

    /// 槽位数组下标
    pub(crate) fn index(&self) -> usize {
        match self {
            OperationKind::GenerateDiagram => 0,
            OperationKind::ExtractRequirements => 1,
            OperationKind::GenerateUserFlow => 2,
            OperationKind::ExplainRationale => 3,
        }
    }
}

impl Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let str = match self {
            OperationKind::GenerateDiagram => "diagram generation",
            OperationKind::ExtractRequirements => "requirements extraction",
            OperationKind::GenerateUserFlow => "user flow generation",
            OperationKind::ExplainRationale => "rationale explanation",
        };
        write!(f, "{}", str)
    }
}
