use crate::config::{Config, LLMProvider};
use crate::i18n::TargetLanguage;
use crate::render::DiagramTheme;
use crate::types::CloudPlatform;
use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

/// 默认配置文件名（当前目录下）
pub const DEFAULT_CONFIG_FILE: &str = "archviz.toml";

/// ArchViz - 由AI驱动的架构图生成与讲解工具
#[derive(Parser, Debug)]
#[command(name = "ArchViz (archviz-rs)")]
#[command(
    about = "AI-assisted architecture visualizer: describe a system or upload a requirements file, get a Mermaid diagram, a user flow walkthrough and per-component rationale."
)]
#[command(version)]
pub struct Args {
    /// 配置文件路径
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// 渲染结果输出路径（SVG）
    #[arg(short, long)]
    pub output_path: Option<PathBuf>,

    /// 是否启用详细日志
    #[arg(short, long)]
    pub verbose: bool,

    /// LLM Provider (openai, moonshot, deepseek, mistral, openrouter, anthropic, gemini, ollama)
    #[arg(long)]
    pub llm_provider: Option<String>,

    /// LLM API KEY
    #[arg(long)]
    pub llm_api_key: Option<String>,

    /// LLM API基地址
    #[arg(long)]
    pub llm_api_base_url: Option<String>,

    /// 高能效模型，优先用于常规生成
    #[arg(long)]
    pub model_efficient: Option<String>,

    /// 高质量模型，作为efficient失效情况下的兜底
    #[arg(long)]
    pub model_powerful: Option<String>,

    /// 最大tokens数
    #[arg(long)]
    pub max_tokens: Option<u32>,

    /// 温度参数
    #[arg(long)]
    pub temperature: Option<f64>,

    /// 单次模型调用超时（秒）
    #[arg(long)]
    pub timeout_seconds: Option<u64>,

    /// 目标语言 (zh, en, ja, ko, de, fr, ru)
    #[arg(long)]
    pub target_language: Option<String>,

    /// 云平台偏好 (aws, azure, gcp, generic)
    #[arg(long)]
    pub cloud_platform: Option<String>,

    /// 图表主题 (default, dark, neutral, forest)
    #[arg(long)]
    pub theme: Option<String>,
}

impl Args {
    /// 将CLI参数转换为配置；显式或默认位置的配置文件读取失败时返回错误
    pub fn into_config(self) -> Result<Config> {
        let mut config = match &self.config {
            Some(config_path) => Config::from_file(config_path)?,
            None => {
                let default_config_path = std::env::current_dir()
                    .unwrap_or_else(|_| PathBuf::from("."))
                    .join(DEFAULT_CONFIG_FILE);
                if default_config_path.exists() {
                    Config::from_file(&default_config_path)?
                } else {
                    Config::default()
                }
            }
        };

        if let Some(output_path) = self.output_path {
            config.output_path = output_path;
        }

        // 覆盖LLM配置
        if let Some(provider_str) = self.llm_provider {
            if let Ok(provider) = provider_str.parse::<LLMProvider>() {
                config.llm.provider = provider;
            } else {
                tracing::warn!(
                    "⚠️ 未知的provider: {}，使用 {}",
                    provider_str,
                    config.llm.provider
                );
            }
        }
        if let Some(llm_api_base_url) = self.llm_api_base_url {
            config.llm.api_base_url = llm_api_base_url;
        }
        if let Some(llm_api_key) = self.llm_api_key {
            config.llm.api_key = llm_api_key;
        }
        if let Some(model_efficient) = self.model_efficient {
            config.llm.model_efficient = model_efficient;
        }
        if let Some(model_powerful) = self.model_powerful {
            config.llm.model_powerful = model_powerful;
        }
        if let Some(max_tokens) = self.max_tokens {
            config.llm.max_tokens = max_tokens;
        }
        if let Some(temperature) = self.temperature {
            config.llm.temperature = temperature;
        }
        if let Some(timeout_seconds) = self.timeout_seconds {
            config.llm.timeout_seconds = timeout_seconds;
        }

        // 目标语言配置
        if let Some(target_language_str) = self.target_language {
            if let Ok(target_language) = target_language_str.parse::<TargetLanguage>() {
                config.target_language = target_language;
            } else {
                tracing::warn!(
                    "⚠️ 未知的目标语言: {}，使用 {}",
                    target_language_str,
                    config.target_language.display_name()
                );
            }
        }

        if let Some(platform_str) = self.cloud_platform {
            if let Ok(platform) = platform_str.parse::<CloudPlatform>() {
                config.cloud_platform = platform;
            } else {
                tracing::warn!(
                    "⚠️ 未知的云平台: {}，使用 {}",
                    platform_str,
                    config.cloud_platform.display_name()
                );
            }
        }

        if let Some(theme_str) = self.theme {
            if let Ok(theme) = theme_str.parse::<DiagramTheme>() {
                config.render.theme = theme;
            } else {
                tracing::warn!("⚠️ 未知的图表主题: {}，使用 {}", theme_str, config.render.theme);
            }
        }

        if self.verbose {
            config.verbose = true;
        }

        Ok(config)
    }
}

// Include tests
#[cfg(test)]
mod tests;
