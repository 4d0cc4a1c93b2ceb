//! 会话状态与编排：单个进程内会话，只由编排器修改，从不持久化

use crate::error::OrchestratorError;
use crate::generator::types::OperationKind;
use crate::types::CloudPlatform;

pub mod file_input;
pub mod notification;
pub mod orchestrator;

pub use file_input::{FileSelection, FileSelectionError};
pub use notification::{Notification, NotificationReceiver, Notifier, Severity};
pub use orchestrator::{ExtractionOutcome, SessionOrchestrator};

/// 单个操作槽位的状态：Idle -> Dispatched -> Idle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SlotState {
    #[default]
    Idle,
    Dispatched,
}

/// 会话状态
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    /// 共享上下文：最近一次成功的自由文本请求或需求提取结果（后写覆盖）
    pub architecture_description: Option<String>,
    /// 最近一次成功的图表源码；新的图表请求发出时立即清空
    pub diagram_source: Option<String>,
    pub extracted_requirements_text: Option<String>,
    pub user_flow_text: Option<String>,
    pub rationale_text: Option<String>,
    pub selected_file: Option<FileSelection>,
    pub pending_component_name: String,
    /// 当前的自由文本输入
    pub free_text_input: String,
    pub cloud_platform: CloudPlatform,
    slots: [SlotState; 4],
}

impl Session {
    pub fn slot(&self, kind: OperationKind) -> SlotState {
        self.slots[kind.index()]
    }

    pub fn is_busy(&self, kind: OperationKind) -> bool {
        self.slot(kind) == SlotState::Dispatched
    }

    /// Idle -> Dispatched；同一操作已在进行中时拒绝，不排队
    pub(crate) fn begin(&mut self, kind: OperationKind) -> Result<(), OrchestratorError> {
        match self.slot(kind) {
            SlotState::Dispatched => Err(OrchestratorError::Busy(kind)),
            SlotState::Idle => {
                self.slots[kind.index()] = SlotState::Dispatched;
                Ok(())
            }
        }
    }

    /// Dispatched -> Idle（无论成功或失败）
    pub(crate) fn settle(&mut self, kind: OperationKind) {
        self.slots[kind.index()] = SlotState::Idle;
    }
}
