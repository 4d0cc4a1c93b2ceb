use std::path::Path;
use std::sync::Arc;
use tokio::sync::{RwLock, watch};

use crate::config::Config;
use crate::error::{GenerationError, OrchestratorError, ValidationError};
use crate::generator::operation::GenerationOperation;
use crate::generator::operations::{
    ExplainRationale, ExplainRationaleInput, ExtractRequirements, ExtractRequirementsInput,
    GenerateDiagram, GenerateDiagramInput, GenerateUserFlow, GenerateUserFlowInput,
};
use crate::generator::types::OperationKind;
use crate::i18n::TargetLanguage;
use crate::llm::GenerationBackend;
use crate::session::{
    FileSelection, FileSelectionError, Notification, NotificationReceiver, Notifier, Session,
};
use crate::types::CloudPlatform;
use crate::utils::data_uri::DataUri;

/// 需求提取的结果，以及随后自动触发的图表生成结果
#[derive(Debug)]
pub struct ExtractionOutcome {
    pub extracted_requirements: String,
    pub diagram: Result<String, OrchestratorError>,
}

/// 会话编排器：校验前置条件、派发生成操作、在结算时更新会话状态。
///
/// 会话状态只通过这里的方法修改；后端调用期间从不持有锁，
/// 因此四种操作可以同时在途，而同一操作至多一个在途。
#[derive(Clone)]
pub struct SessionOrchestrator {
    session: Arc<RwLock<Session>>,
    backend: Arc<dyn GenerationBackend>,
    language: TargetLanguage,
    notifier: Notifier,
    diagram_watch: Arc<watch::Sender<Option<String>>>,
}

impl SessionOrchestrator {
    pub fn new(backend: Arc<dyn GenerationBackend>, config: &Config) -> (Self, NotificationReceiver) {
        let (notifier, receiver) = Notifier::channel();
        let session = Session {
            cloud_platform: config.cloud_platform,
            ..Default::default()
        };
        let (diagram_watch, _) = watch::channel(None);

        let orchestrator = Self {
            session: Arc::new(RwLock::new(session)),
            backend,
            language: config.target_language,
            notifier,
            diagram_watch: Arc::new(diagram_watch),
        };
        (orchestrator, receiver)
    }

    /// 会话状态快照
    pub async fn snapshot(&self) -> Session {
        self.session.read().await.clone()
    }

    pub async fn is_busy(&self, kind: OperationKind) -> bool {
        self.session.read().await.is_busy(kind)
    }

    /// 订阅图表源码变化；每次派发清空为None，每次成功结算写入新源码
    pub fn subscribe_diagram(&self) -> watch::Receiver<Option<String>> {
        self.diagram_watch.subscribe()
    }

    /// 通知发送端，渲染等外部环节借此报告错误
    pub fn notifier(&self) -> Notifier {
        self.notifier.clone()
    }

    pub async fn set_free_text(&self, text: &str) {
        self.session.write().await.free_text_input = text.to_string();
    }

    pub async fn set_component_name(&self, name: &str) {
        self.session.write().await.pending_component_name = name.to_string();
    }

    pub async fn set_cloud_platform(&self, platform: CloudPlatform) {
        self.session.write().await.cloud_platform = platform;
    }

    pub async fn select_file(&self, selection: FileSelection) {
        self.session.write().await.selected_file = Some(selection);
    }

    /// 读取并选择本地文件；被拒绝或读取失败的文件不会进入会话
    pub async fn select_file_path(&self, path: &Path) -> Result<FileSelection, FileSelectionError> {
        match FileSelection::from_path(path).await {
            Ok(selection) => {
                self.session.write().await.selected_file = Some(selection.clone());
                Ok(selection)
            }
            Err(e) => {
                self.session.write().await.selected_file = None;
                self.notifier.send(Notification::error(e.title(), e.to_string()));
                Err(e)
            }
        }
    }

    pub async fn clear_file(&self) {
        self.session.write().await.selected_file = None;
    }

    /// 生成图表：给定文本优先，否则使用当前自由文本输入
    pub async fn request_diagram(&self, text: Option<&str>) -> Result<String, OrchestratorError> {
        let (description, platform) = {
            let mut session = self.session.write().await;
            let Some(effective) = resolve_diagram_text(&session, text) else {
                return Err(self.reject(ValidationError::EmptyDescription.into()));
            };
            // 提取在途时图表槽位归提取后的自动生成所有
            if session.is_busy(OperationKind::ExtractRequirements) {
                return Err(self.reject(OrchestratorError::Busy(
                    OperationKind::ExtractRequirements,
                )));
            }
            let platform = self.begin_diagram(&mut session, &effective)?;
            (effective, platform)
        };

        self.finish_diagram(description, platform).await
    }

    /// 从已选文件提取需求；成功后以提取文本自动生成一次图表
    pub async fn request_extraction(&self) -> Result<ExtractionOutcome, OrchestratorError> {
        let kind = OperationKind::ExtractRequirements;
        let file = {
            let mut session = self.session.write().await;
            let Some(file) = session.selected_file.clone() else {
                return Err(self.reject(ValidationError::NoFileSelected.into()));
            };
            if let Err(e) = DataUri::parse(&file.data_uri) {
                return Err(self.reject(e.into()));
            }
            if session.is_busy(OperationKind::GenerateDiagram) {
                return Err(self.reject(OrchestratorError::Busy(OperationKind::GenerateDiagram)));
            }
            session.begin(kind).map_err(|e| self.reject(e))?;
            file
        };
        tracing::info!(operation = %kind, file = %file.name, "dispatched");

        let input = ExtractRequirementsInput {
            file_data_uri: file.data_uri.clone(),
        };
        let result = ExtractRequirements::new(self.language)
            .execute(self.backend.as_ref(), &input)
            .await;

        let extracted = match result {
            Ok(output) => output.extracted_requirements,
            Err(e) => {
                self.session.write().await.settle(kind);
                return Err(self.fail(e, "Extraction Failed"));
            }
        };

        // 结算提取与派发图表在同一临界区内完成，中间不会插入其他图表请求
        let chained = {
            let mut session = self.session.write().await;
            session.settle(kind);
            session.extracted_requirements_text = Some(extracted.clone());
            session.architecture_description = Some(extracted.clone());
            tracing::info!(operation = %kind, "settled");
            self.notifier.send(Notification::info(
                "Requirements Extracted",
                format!("Successfully extracted requirements from {}.", file.name),
            ));

            // 与request_diagram(Some(extracted))相同的文本解析规则
            match resolve_diagram_text(&session, Some(extracted.as_str())) {
                Some(effective) => self
                    .begin_diagram(&mut session, &effective)
                    .map(|platform| (effective, platform)),
                None => Err(self.reject(ValidationError::EmptyDescription.into())),
            }
        };

        let diagram = match chained {
            Ok((description, platform)) => self.finish_diagram(description, platform).await,
            Err(e) => Err(e),
        };

        Ok(ExtractionOutcome {
            extracted_requirements: extracted,
            diagram,
        })
    }

    /// 基于当前架构描述生成用户流程说明
    pub async fn request_user_flow(&self) -> Result<String, OrchestratorError> {
        let kind = OperationKind::GenerateUserFlow;
        let description = {
            let mut session = self.session.write().await;
            let Some(description) = current_description(&session) else {
                return Err(self.reject(ValidationError::NoArchitectureDescription.into()));
            };
            session.begin(kind).map_err(|e| self.reject(e))?;
            description
        };
        tracing::info!(operation = %kind, "dispatched");

        let input = GenerateUserFlowInput {
            architecture_diagram: description,
        };
        let result = GenerateUserFlow::new(self.language)
            .execute(self.backend.as_ref(), &input)
            .await
            .map(|output| output.user_flow_explanation);

        self.settle(
            kind,
            result,
            |session, text| session.user_flow_text = Some(text.clone()),
            Notification::info(
                "User Flow Generated",
                "User flow explanation successfully generated.",
            ),
            "User Flow Generation Failed",
        )
        .await
    }

    /// 解释某个组件的选型理由
    pub async fn request_rationale(&self, component_name: &str) -> Result<String, OrchestratorError> {
        let kind = OperationKind::ExplainRationale;
        let description = {
            let mut session = self.session.write().await;
            let Some(description) = current_description(&session) else {
                return Err(self.reject(ValidationError::NoArchitectureDescription.into()));
            };
            if component_name.trim().is_empty() {
                return Err(self.reject(ValidationError::EmptyComponentName.into()));
            }
            session.begin(kind).map_err(|e| self.reject(e))?;
            description
        };
        tracing::info!(operation = %kind, component = %component_name, "dispatched");

        let input = ExplainRationaleInput {
            architecture_diagram_description: description,
            component: component_name.to_string(),
        };
        let result = ExplainRationale::new(self.language)
            .execute(self.backend.as_ref(), &input)
            .await
            .map(|output| output.rationale);

        self.settle(
            kind,
            result,
            |session, text| session.rationale_text = Some(text.clone()),
            Notification::info(
                "Rationale Explained",
                format!("Rationale for {} successfully generated.", component_name),
            ),
            "Rationale Generation Failed",
        )
        .await
    }

    /// 图表派发的状态迁移：清空旧图、登记描述、占用槽位
    fn begin_diagram(
        &self,
        session: &mut Session,
        description: &str,
    ) -> Result<CloudPlatform, OrchestratorError> {
        let kind = OperationKind::GenerateDiagram;
        session.begin(kind).map_err(|e| self.reject(e))?;
        session.diagram_source = None;
        session.architecture_description = Some(description.to_string());
        self.diagram_watch.send_replace(None);
        tracing::info!(operation = %kind, "dispatched");
        Ok(session.cloud_platform)
    }

    async fn finish_diagram(
        &self,
        description: String,
        platform: CloudPlatform,
    ) -> Result<String, OrchestratorError> {
        let input = GenerateDiagramInput { description };
        let result = GenerateDiagram::new(platform)
            .execute(self.backend.as_ref(), &input)
            .await
            .map(|output| output.diagram);

        self.settle(
            OperationKind::GenerateDiagram,
            result,
            |session, diagram| {
                session.diagram_source = Some(diagram.clone());
                self.diagram_watch.send_replace(Some(diagram.clone()));
            },
            Notification::info(
                "Diagram Generated",
                "Architecture diagram successfully generated.",
            ),
            "Diagram Generation Failed",
        )
        .await
    }

    /// 结算：释放槽位，成功时写入输出，失败时保留原有输出；每次结算恰好一条通知
    async fn settle<F>(
        &self,
        kind: OperationKind,
        result: Result<String, GenerationError>,
        store: F,
        success: Notification,
        failure_title: &str,
    ) -> Result<String, OrchestratorError>
    where
        F: FnOnce(&mut Session, &String),
    {
        let mut session = self.session.write().await;
        session.settle(kind);
        match result {
            Ok(text) => {
                store(&mut session, &text);
                drop(session);
                tracing::info!(operation = %kind, "settled");
                self.notifier.send(success);
                Ok(text)
            }
            Err(e) => {
                drop(session);
                Err(self.fail(e, failure_title))
            }
        }
    }

    fn fail(&self, error: GenerationError, title: &str) -> OrchestratorError {
        tracing::warn!(operation = %error.operation(), "settled with failure: {}", error);
        self.notifier.send(Notification::error(title, error.to_string()));
        error.into()
    }

    /// 派发前被拒绝：不修改状态，只发出通知
    fn reject(&self, error: OrchestratorError) -> OrchestratorError {
        let notification = match &error {
            OrchestratorError::Validation(e) => Notification::error(e.title(), e.to_string()),
            OrchestratorError::Busy(_) => Notification::warning("Already Running", error.to_string()),
            OrchestratorError::Generation(e) => Notification::error("Generation Failed", e.to_string()),
        };
        tracing::debug!("request rejected before dispatch: {}", error);
        self.notifier.send(notification);
        error
    }
}

/// 图表请求的有效文本：给定文本非空时优先，否则取自由文本输入；只含空白时为None
fn resolve_diagram_text(session: &Session, text: Option<&str>) -> Option<String> {
    let effective = match text {
        Some(text) if !text.is_empty() => text.to_string(),
        _ => session.free_text_input.clone(),
    };
    (!effective.trim().is_empty()).then_some(effective)
}

/// 非空白的当前架构描述
fn current_description(session: &Session) -> Option<String> {
    session
        .architecture_description
        .clone()
        .filter(|d| !d.trim().is_empty())
}
