#[cfg(test)]
mod tests {
    use crate::config::{Config, LLMConfig, LLMProvider, RenderConfig};
    use crate::i18n::TargetLanguage;
    use crate::render::DiagramTheme;
    use crate::types::CloudPlatform;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_config_default() {
        let config = Config::default();

        assert_eq!(config.output_path, PathBuf::from("./archviz.svg"));
        assert_eq!(config.target_language, TargetLanguage::English);
        assert_eq!(config.cloud_platform, CloudPlatform::Generic);
        assert_eq!(config.render, RenderConfig::default());
        assert!(!config.verbose);
    }

    #[test]
    fn test_llm_provider_default() {
        let provider = LLMProvider::default();
        assert_eq!(provider, LLMProvider::OpenAI);
    }

    #[test]
    fn test_llm_provider_from_str() {
        assert_eq!("openai".parse::<LLMProvider>().unwrap(), LLMProvider::OpenAI);
        assert_eq!("Moonshot".parse::<LLMProvider>().unwrap(), LLMProvider::Moonshot);
        assert_eq!("DEEPSEEK".parse::<LLMProvider>().unwrap(), LLMProvider::DeepSeek);
        assert_eq!("mistral".parse::<LLMProvider>().unwrap(), LLMProvider::Mistral);
        assert_eq!("openrouter".parse::<LLMProvider>().unwrap(), LLMProvider::OpenRouter);
        assert_eq!("anthropic".parse::<LLMProvider>().unwrap(), LLMProvider::Anthropic);
        assert_eq!("gemini".parse::<LLMProvider>().unwrap(), LLMProvider::Gemini);
        assert_eq!("ollama".parse::<LLMProvider>().unwrap(), LLMProvider::Ollama);
        assert!("invalid".parse::<LLMProvider>().is_err());
    }

    #[test]
    fn test_llm_provider_display() {
        assert_eq!(LLMProvider::OpenAI.to_string(), "openai");
        assert_eq!(LLMProvider::OpenRouter.to_string(), "openrouter");
        assert_eq!(LLMProvider::Ollama.to_string(), "ollama");
    }

    #[test]
    fn test_llm_config_default() {
        let config = LLMConfig::default();

        assert_eq!(config.provider, LLMProvider::OpenAI);
        // api_key取决于环境变量，可能为空
        assert!(!config.api_base_url.is_empty());
        assert_eq!(config.model_efficient, "gpt-4o-mini");
        assert_eq!(config.model_powerful, "gpt-4o");
        assert_eq!(config.max_tokens, 8192);
        assert_eq!(config.temperature, 0.2);
        assert_eq!(config.retry_attempts, 3);
        assert_eq!(config.retry_delay_ms, 2000);
        assert_eq!(config.timeout_seconds, 120);
    }

    #[test]
    fn test_render_config_default() {
        let config = RenderConfig::default();

        assert_eq!(config.theme, DiagramTheme::Dark);
        assert_eq!(config.node_spacing, 48);
        assert_eq!(config.rank_spacing, 72);
    }

    #[test]
    fn test_from_file_partial_toml() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("archviz.toml");
        std::fs::write(
            &path,
            r#"
output_path = "out/diagram.svg"
target_language = "fr"
verbose = true

[llm]
provider = "ollama"
api_base_url = "http://localhost:11434"
retry_attempts = 1

[render]
theme = "forest"
rank_spacing = 100
"#,
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();

        assert_eq!(config.output_path, PathBuf::from("out/diagram.svg"));
        assert_eq!(config.target_language, TargetLanguage::French);
        assert!(config.verbose);
        assert_eq!(config.llm.provider, LLMProvider::Ollama);
        assert_eq!(config.llm.api_base_url, "http://localhost:11434");
        assert_eq!(config.llm.retry_attempts, 1);
        // 未指定的字段取默认值
        assert_eq!(config.llm.timeout_seconds, 120);
        assert_eq!(config.render.theme, DiagramTheme::Forest);
        assert_eq!(config.render.rank_spacing, 100);
        assert_eq!(config.render.node_spacing, 48);
    }

    #[test]
    fn test_from_file_errors() {
        assert!(Config::from_file(&PathBuf::from("/nonexistent/archviz.toml")).is_err());

        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("broken.toml");
        std::fs::write(&path, "output_path = [unclosed").unwrap();
        let err = Config::from_file(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to parse config file"));
    }

    #[test]
    fn test_config_roundtrips_through_toml() {
        let mut config = Config::default();
        config.cloud_platform = CloudPlatform::Aws;
        config.render.theme = DiagramTheme::Neutral;

        let text = toml::to_string(&config).unwrap();
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("archviz.toml");
        std::fs::write(&path, text).unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded.cloud_platform, CloudPlatform::Aws);
        assert_eq!(loaded.render.theme, DiagramTheme::Neutral);
    }
}
