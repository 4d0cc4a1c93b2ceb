#[cfg(test)]
mod tests {
    use crate::cli::Args;
    use crate::config::LLMProvider;
    use crate::i18n::TargetLanguage;
    use crate::render::DiagramTheme;
    use crate::types::CloudPlatform;
    use clap::Parser;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_args_default_values() {
        let args = Args::try_parse_from(["archviz"]).unwrap();

        assert!(args.config.is_none());
        assert!(args.output_path.is_none());
        assert!(!args.verbose);
        assert!(args.llm_provider.is_none());
        assert!(args.theme.is_none());
    }

    #[test]
    fn test_args_short_options() {
        let args = Args::try_parse_from([
            "archviz",
            "-c", "/etc/archviz.toml",
            "-o", "/tmp/diagram.svg",
            "-v",
        ])
        .unwrap();

        assert_eq!(args.config, Some(PathBuf::from("/etc/archviz.toml")));
        assert_eq!(args.output_path, Some(PathBuf::from("/tmp/diagram.svg")));
        assert!(args.verbose);
    }

    #[test]
    fn test_args_llm_options() {
        let args = Args::try_parse_from([
            "archviz",
            "--llm-provider", "anthropic",
            "--llm-api-key", "test-key",
            "--llm-api-base-url", "https://api.anthropic.com",
            "--model-efficient", "claude-haiku",
            "--model-powerful", "claude-sonnet",
            "--max-tokens", "2048",
            "--temperature", "0.7",
            "--timeout-seconds", "45",
        ])
        .unwrap();

        assert_eq!(args.llm_provider, Some("anthropic".to_string()));
        assert_eq!(args.llm_api_key, Some("test-key".to_string()));
        assert_eq!(args.model_powerful, Some("claude-sonnet".to_string()));
        assert_eq!(args.max_tokens, Some(2048));
        assert_eq!(args.temperature, Some(0.7));
        assert_eq!(args.timeout_seconds, Some(45));
    }

    #[test]
    fn test_into_config_with_overrides() {
        let args = Args::try_parse_from([
            "archviz",
            "-o", "/tmp/out.svg",
            "--llm-provider", "deepseek",
            "--model-efficient", "deepseek-chat",
            "--timeout-seconds", "30",
            "--target-language", "ja",
            "--cloud-platform", "gcp",
            "--theme", "neutral",
            "--verbose",
        ])
        .unwrap();

        let config = args.into_config().unwrap();

        assert_eq!(config.output_path, PathBuf::from("/tmp/out.svg"));
        assert_eq!(config.llm.provider, LLMProvider::DeepSeek);
        assert_eq!(config.llm.model_efficient, "deepseek-chat");
        assert_eq!(config.llm.timeout_seconds, 30);
        assert_eq!(config.target_language, TargetLanguage::Japanese);
        assert_eq!(config.cloud_platform, CloudPlatform::Gcp);
        assert_eq!(config.render.theme, DiagramTheme::Neutral);
        assert!(config.verbose);
    }

    #[test]
    fn test_unknown_values_keep_defaults() {
        let args = Args::try_parse_from([
            "archviz",
            "--llm-provider", "skynet",
            "--target-language", "klingon",
            "--cloud-platform", "mainframe",
            "--theme", "sepia",
        ])
        .unwrap();

        let config = args.into_config().unwrap();

        assert_eq!(config.llm.provider, LLMProvider::OpenAI);
        assert_eq!(config.target_language, TargetLanguage::English);
        assert_eq!(config.cloud_platform, CloudPlatform::Generic);
        assert_eq!(config.render.theme, DiagramTheme::Dark);
    }

    #[test]
    fn test_config_file_then_cli_overlay() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("archviz.toml");
        std::fs::write(
            &config_path,
            r#"
cloud_platform = "aws"
target_language = "zh"

[llm]
provider = "mistral"
model_efficient = "mistral-small"
"#,
        )
        .unwrap();

        let args = Args::try_parse_from([
            "archviz",
            "--config",
            config_path.to_str().unwrap(),
            "--cloud-platform",
            "azure",
        ])
        .unwrap();
        let config = args.into_config().unwrap();

        assert_eq!(config.cloud_platform, CloudPlatform::Azure);
        assert_eq!(config.target_language, TargetLanguage::Chinese);
        assert_eq!(config.llm.provider, LLMProvider::Mistral);
        assert_eq!(config.llm.model_efficient, "mistral-small");
    }

    #[test]
    fn test_missing_config_file_is_an_error() {
        let args = Args::try_parse_from(["archviz", "--config", "/nonexistent/archviz.toml"]).unwrap();
        assert!(args.into_config().is_err());
    }
}
