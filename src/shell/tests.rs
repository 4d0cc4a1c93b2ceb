#[cfg(test)]
mod tests {
    use crate::config::Config;
    use crate::generator::types::OperationKind;
    use crate::llm::ScriptedBackend;
    use crate::session::Notification;
    use crate::shell::{Command, ShowTarget, format_notification, parse_command, run};
    use serde_json::json;
    use std::path::PathBuf;
    use std::sync::Arc;
    use tempfile::TempDir;

    #[test]
    fn test_parse_commands() {
        assert_eq!(parse_command("   ").unwrap(), None);
        assert_eq!(
            parse_command("describe a three-tier web app").unwrap(),
            Some(Command::Describe("a three-tier web app".to_string()))
        );
        assert_eq!(parse_command("generate").unwrap(), Some(Command::Generate(None)));
        assert_eq!(
            parse_command("GENERATE  queue-based pipeline ").unwrap(),
            Some(Command::Generate(Some("queue-based pipeline".to_string())))
        );
        assert_eq!(
            parse_command("open ./specs/reqs.pdf").unwrap(),
            Some(Command::Open(Some(PathBuf::from("./specs/reqs.pdf"))))
        );
        assert_eq!(parse_command("open").unwrap(), Some(Command::Open(None)));
        assert_eq!(
            parse_command("explain Load Balancer").unwrap(),
            Some(Command::Explain(Some("Load Balancer".to_string())))
        );
        assert_eq!(
            parse_command("show rationale").unwrap(),
            Some(Command::Show(ShowTarget::Rationale))
        );
        assert_eq!(parse_command("exit").unwrap(), Some(Command::Quit));
    }

    #[test]
    fn test_parse_rejects_unknown_input() {
        assert!(parse_command("deploy now").is_err());
        assert!(parse_command("show secrets").is_err());
    }

    #[test]
    fn test_format_notification() {
        let line = format_notification(&Notification::error("Extraction Failed", "timed out"));
        assert!(line.starts_with("❌"));
        assert!(line.ends_with("Extraction Failed: timed out"));
    }

    #[tokio::test]
    async fn test_run_writes_rendered_diagram() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.reply(
            OperationKind::GenerateDiagram,
            json!({"diagram": "graph TD; LB-->Web-->App-->DB;"}),
        );

        let temp_dir = TempDir::new().unwrap();
        let output_path = temp_dir.path().join("out").join("diagram.svg");
        let config = Config {
            output_path: output_path.clone(),
            ..Config::default()
        };

        let input: &[u8] = b"describe three-tier web app\ngenerate\nquit\n";
        run(backend.clone(), &config, input).await.unwrap();

        let svg = std::fs::read_to_string(&output_path).unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("LB"));
        assert_eq!(backend.requests_for(OperationKind::GenerateDiagram).len(), 1);
    }

    #[tokio::test]
    async fn test_run_writes_failure_page_for_bad_diagram() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.reply(
            OperationKind::GenerateDiagram,
            json!({"diagram": "sequenceDiagram\n  A->>B: hi"}),
        );

        let temp_dir = TempDir::new().unwrap();
        let output_path = temp_dir.path().join("diagram.svg");
        let config = Config {
            output_path: output_path.clone(),
            ..Config::default()
        };

        let input: &[u8] = b"generate some system\n";
        run(backend, &config, input).await.unwrap();

        let page = std::fs::read_to_string(&output_path).unwrap();
        assert!(page.contains("Could not render diagram."));
        assert!(page.contains("sequenceDiagram"));
    }
}
