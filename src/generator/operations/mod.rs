//! 四个生成操作：图表生成、需求提取、用户流程、组件选型说明

pub mod diagram;
pub mod rationale;
pub mod requirements;
pub mod user_flow;

pub use diagram::{GenerateDiagram, GenerateDiagramInput, GenerateDiagramOutput};
pub use rationale::{ExplainRationale, ExplainRationaleInput, ExplainRationaleOutput};
pub use requirements::{ExtractRequirements, ExtractRequirementsInput, ExtractRequirementsOutput};
pub use user_flow::{GenerateUserFlow, GenerateUserFlowInput, GenerateUserFlowOutput};
