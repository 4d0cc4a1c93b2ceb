use serde::{Deserialize, Serialize};

/// 目标云平台，影响图表生成时优先选用的托管服务
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum CloudPlatform {
    #[serde(rename = "aws")]
    Aws,
    #[serde(rename = "azure")]
    Azure,
    #[serde(rename = "gcp")]
    Gcp,
    #[serde(rename = "generic")]
    #[default]
    Generic,
}

impl std::fmt::Display for CloudPlatform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CloudPlatform::Aws => write!(f, "aws"),
            CloudPlatform::Azure => write!(f, "azure"),
            CloudPlatform::Gcp => write!(f, "gcp"),
            CloudPlatform::Generic => write!(f, "generic"),
        }
    }
}

impl std::str::FromStr for CloudPlatform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "aws" | "amazon" => Ok(CloudPlatform::Aws),
            "azure" | "microsoft" => Ok(CloudPlatform::Azure),
            "gcp" | "google" | "google-cloud" => Ok(CloudPlatform::Gcp),
            "generic" | "none" => Ok(CloudPlatform::Generic),
            _ => Err(format!("Unknown cloud platform: {}", s)),
        }
    }
}

impl CloudPlatform {
    /// 面向用户的平台名称
    pub fn display_name(&self) -> &'static str {
        match self {
            CloudPlatform::Aws => "Amazon Web Services",
            CloudPlatform::Azure => "Microsoft Azure",
            CloudPlatform::Gcp => "Google Cloud Platform",
            CloudPlatform::Generic => "Generic / Cloud Agnostic",
        }
    }
}
