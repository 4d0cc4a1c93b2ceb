//! 交互式前端：从输入读取命令，派发请求，打印通知，在图表源码变化时重新渲染

use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::config::Config;
use crate::error::OrchestratorError;
use crate::generator::types::OperationKind;
use crate::llm::{GenerationBackend, LLMClient};
use crate::render::{DiagramRenderer, MermaidSvgRenderer, RenderTarget, RenderedArtifact};
use crate::session::{
    Notification, NotificationReceiver, Notifier, Session, SessionOrchestrator, Severity,
};
use crate::types::CloudPlatform;

const HELP: &str = "\
Commands:
  describe <text>     set the architecture description
  generate [text]     generate a diagram (from text, or the current description)
  open [path]         select a PDF/XLSX/DOCX/TXT file (no path clears the selection)
  extract             extract requirements from the selected file, then diagram them
  flow                explain the user flow of the current architecture
  component <name>    set the component to explain
  explain [name]      explain why a component was chosen
  platform <p>        aws | azure | gcp | generic
  show <what>         diagram | description | requirements | flow | rationale | file
  status              show which operations are in flight
  help                show this help
  quit                wait for running requests and exit";

/// 可展示的会话字段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShowTarget {
    Diagram,
    Description,
    Requirements,
    Flow,
    Rationale,
    File,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Describe(String),
    Generate(Option<String>),
    Open(Option<PathBuf>),
    Extract,
    Flow,
    Component(String),
    Explain(Option<String>),
    Platform(String),
    Show(ShowTarget),
    Status,
    Help,
    Quit,
}

/// 解析一行输入；空行返回Ok(None)
pub fn parse_command(line: &str) -> Result<Option<Command>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };
    let argument = (!rest.is_empty()).then(|| rest.to_string());

    let command = match verb.to_lowercase().as_str() {
        "describe" => Command::Describe(rest.to_string()),
        "generate" | "gen" => Command::Generate(argument),
        "open" => Command::Open(argument.map(PathBuf::from)),
        "extract" => Command::Extract,
        "flow" => Command::Flow,
        "component" => Command::Component(rest.to_string()),
        "explain" => Command::Explain(argument),
        "platform" => Command::Platform(rest.to_string()),
        "show" => Command::Show(match rest.to_lowercase().as_str() {
            "diagram" | "" => ShowTarget::Diagram,
            "description" => ShowTarget::Description,
            "requirements" => ShowTarget::Requirements,
            "flow" => ShowTarget::Flow,
            "rationale" => ShowTarget::Rationale,
            "file" => ShowTarget::File,
            other => return Err(format!("Unknown field `{}` for show", other)),
        }),
        "status" => Command::Status,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => return Err(format!("Unknown command `{}`, type `help` for a list", other)),
    };
    Ok(Some(command))
}

/// 启动交互式会话
pub async fn launch(config: &Config) -> Result<()> {
    let client = LLMClient::new(config.llm.clone())?;

    // 启动时检查模型连接，失败不终止会话
    if let Err(e) = client.check_connection().await {
        println!("⚠️ 模型连接检查失败，请求可能无法完成: {:#}", e);
    }

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    run(Arc::new(client), config, stdin).await
}

/// 用给定后端和输入运行会话，输入结束或quit后等待在途请求完成再返回
pub async fn run<R>(backend: Arc<dyn GenerationBackend>, config: &Config, input: R) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let (orchestrator, notifications) = SessionOrchestrator::new(backend, config);
    let printer = tokio::spawn(print_notifications(notifications));
    let renderer = tokio::spawn(render_on_change(
        orchestrator.subscribe_diagram(),
        MermaidSvgRenderer::new(config.render.clone()),
        config.output_path.clone(),
        orchestrator.notifier(),
    ));

    println!("🏗️ ArchViz 已就绪，图表将写入 {}", config.output_path.display());
    println!("{}", HELP);

    let mut in_flight: Vec<JoinHandle<()>> = Vec::new();
    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await? {
        in_flight.retain(|handle| !handle.is_finished());

        let command = match parse_command(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(message) => {
                println!("❓ {}", message);
                continue;
            }
        };
        if command == Command::Quit {
            break;
        }
        if let Some(handle) = dispatch(&orchestrator, command).await {
            in_flight.push(handle);
        }
    }

    for handle in in_flight {
        if let Err(e) = handle.await {
            tracing::warn!("request task ended abnormally: {}", e);
        }
    }

    // 释放编排器后，渲染和通知任务在处理完剩余事件后退出
    drop(orchestrator);
    renderer.await?;
    printer.await?;
    Ok(())
}

/// 执行一条命令；生成类请求在后台运行并返回其句柄
async fn dispatch(orchestrator: &SessionOrchestrator, command: Command) -> Option<JoinHandle<()>> {
    match command {
        Command::Describe(text) => {
            orchestrator.set_free_text(&text).await;
            println!("📝 描述已更新");
            None
        }
        Command::Generate(text) => {
            let orchestrator = orchestrator.clone();
            Some(tokio::spawn(async move {
                let result = orchestrator.request_diagram(text.as_deref()).await;
                report(result, "Mermaid");
            }))
        }
        Command::Open(Some(path)) => {
            if let Ok(selection) = orchestrator.select_file_path(&path).await {
                println!("📎 已选择文件 {}", selection.name);
            }
            None
        }
        Command::Open(None) => {
            orchestrator.clear_file().await;
            println!("📎 已清除文件选择");
            None
        }
        Command::Extract => {
            let orchestrator = orchestrator.clone();
            Some(tokio::spawn(async move {
                match orchestrator.request_extraction().await {
                    Ok(outcome) => {
                        println!("\n📄 Requirements\n{}\n", outcome.extracted_requirements);
                        report(outcome.diagram, "Mermaid");
                    }
                    Err(e) => log_rejection(&e),
                }
            }))
        }
        Command::Flow => {
            let orchestrator = orchestrator.clone();
            Some(tokio::spawn(async move {
                let result = orchestrator.request_user_flow().await;
                report(result, "User Flow");
            }))
        }
        Command::Component(name) => {
            orchestrator.set_component_name(&name).await;
            None
        }
        Command::Explain(name) => {
            let name = match name {
                Some(name) => name,
                None => orchestrator.snapshot().await.pending_component_name,
            };
            let orchestrator = orchestrator.clone();
            Some(tokio::spawn(async move {
                let result = orchestrator.request_rationale(&name).await;
                report(result, "Rationale");
            }))
        }
        Command::Platform(value) => {
            match value.parse::<CloudPlatform>() {
                Ok(platform) => {
                    orchestrator.set_cloud_platform(platform).await;
                    println!("☁️ 云平台: {}", platform.display_name());
                }
                Err(message) => println!("❓ {}", message),
            }
            None
        }
        Command::Show(target) => {
            show(&orchestrator.snapshot().await, target);
            None
        }
        Command::Status => {
            let session = orchestrator.snapshot().await;
            for kind in OperationKind::ALL {
                let state = if session.is_busy(kind) { "⏳ running" } else { "idle" };
                println!("  {:<24} {}", kind.to_string(), state);
            }
            None
        }
        Command::Help => {
            println!("{}", HELP);
            None
        }
        Command::Quit => None,
    }
}

/// 成功时打印结果文本；失败已通过通知告知用户
fn report(result: Result<String, OrchestratorError>, heading: &str) {
    match result {
        Ok(text) => println!("\n📌 {}\n{}\n", heading, text),
        Err(e) => log_rejection(&e),
    }
}

fn log_rejection(error: &OrchestratorError) {
    tracing::debug!("request finished without output: {}", error);
}

fn show(session: &Session, target: ShowTarget) {
    let (heading, value) = match target {
        ShowTarget::Diagram => ("Diagram", session.diagram_source.clone()),
        ShowTarget::Description => ("Description", session.architecture_description.clone()),
        ShowTarget::Requirements => ("Requirements", session.extracted_requirements_text.clone()),
        ShowTarget::Flow => ("User Flow", session.user_flow_text.clone()),
        ShowTarget::Rationale => ("Rationale", session.rationale_text.clone()),
        ShowTarget::File => (
            "File",
            session.selected_file.as_ref().map(|file| {
                format!(
                    "{} ({})",
                    file.name,
                    file.mime_type().unwrap_or_else(|| "unknown".to_string())
                )
            }),
        ),
    };
    match value {
        Some(value) => println!("\n📌 {}\n{}\n", heading, value),
        None => println!("(no {} yet)", heading.to_lowercase()),
    }
}

async fn print_notifications(mut notifications: NotificationReceiver) {
    while let Some(notification) = notifications.recv().await {
        println!("{}", format_notification(&notification));
    }
}

pub fn format_notification(notification: &Notification) -> String {
    let icon = match notification.severity {
        Severity::Info => "✅",
        Severity::Warning => "⚠️",
        Severity::Error => "❌",
    };
    format!(
        "{} [{}] {}: {}",
        icon,
        notification.at.format("%H:%M:%S"),
        notification.title,
        notification.message
    )
}

/// 每次图表源码变化都完整重渲染；渲染失败时写入失败页并发出通知
async fn render_on_change(
    mut diagram: watch::Receiver<Option<String>>,
    renderer: MermaidSvgRenderer,
    output_path: PathBuf,
    notifier: Notifier,
) {
    let target = RenderTarget::new();
    while diagram.changed().await.is_ok() {
        let Some(source) = diagram.borrow_and_update().clone() else {
            tracing::debug!("diagram cleared, waiting for the next source");
            continue;
        };

        let artifact = match renderer.render(&target, &source) {
            Ok(artifact) => artifact,
            Err(failure) => {
                notifier.send(Notification::error("Diagram Error", failure.to_string()));
                RenderedArtifact::failure_page(&target, &failure, renderer.theme())
            }
        };

        match write_artifact(&output_path, &artifact).await {
            Ok(()) => println!("🖼️ 图表已写入 {}", output_path.display()),
            Err(e) => {
                tracing::warn!("❌ 无法写入 {}: {:#}", output_path.display(), e);
                notifier.send(Notification::error("Diagram Error", format!("{:#}", e)));
            }
        }
    }
}

async fn write_artifact(path: &Path, artifact: &RenderedArtifact) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, &artifact.svg).await?;
    Ok(())
}

#[cfg(test)]
mod tests;
