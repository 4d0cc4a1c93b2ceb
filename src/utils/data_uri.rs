use base64::{Engine as _, engine::general_purpose::STANDARD};
use regex::Regex;
use std::fmt::Display;
use std::sync::LazyLock;

use crate::error::ValidationError;

/// `data:<mimetype>[;param=value]*;base64,<payload>`
static DATA_URI_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^data:([A-Za-z0-9][A-Za-z0-9!#$&^_.+-]*/[A-Za-z0-9][A-Za-z0-9!#$&^_.+-]*)((?:;[A-Za-z0-9_.-]+=[^;,]+)*);base64,([A-Za-z0-9+/]+={0,2})$",
    )
    .expect("data URI pattern must compile")
});

/// 带显式MIME类型的base64 data URI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri {
    pub mime_type: String,
    pub payload: String,
}

impl DataUri {
    /// 将文件内容编码为data URI
    pub fn encode(mime_type: &str, bytes: &[u8]) -> Self {
        Self {
            mime_type: mime_type.to_string(),
            payload: STANDARD.encode(bytes),
        }
    }

    /// 解析并校验data URI；payload必须是合法的base64
    pub fn parse(uri: &str) -> Result<Self, ValidationError> {
        let captures = DATA_URI_PATTERN
            .captures(uri.trim())
            .ok_or_else(|| ValidationError::InvalidDataUri(abbreviate(uri)))?;

        let data_uri = Self {
            mime_type: captures[1].to_ascii_lowercase(),
            payload: captures[3].to_string(),
        };

        data_uri
            .decode()
            .map_err(|e| ValidationError::InvalidDataUri(format!("{} ({})", abbreviate(uri), e)))?;

        Ok(data_uri)
    }

    pub fn decode(&self) -> Result<Vec<u8>, base64::DecodeError> {
        STANDARD.decode(&self.payload)
    }

    /// 文本类内容可以直接内联到prompt中
    pub fn is_textual(&self) -> bool {
        self.mime_type.starts_with("text/")
    }
}

impl Display for DataUri {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "data:{};base64,{}", self.mime_type, self.payload)
    }
}

fn abbreviate(uri: &str) -> String {
    const LIMIT: usize = 48;
    match uri.char_indices().nth(LIMIT) {
        Some((idx, _)) => format!("{}...", &uri[..idx]),
        None => uri.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_produces_parseable_uri() {
        let uri = DataUri::encode("text/plain", b"three-tier web app").to_string();
        assert!(uri.starts_with("data:text/plain;base64,"));

        let parsed = DataUri::parse(&uri).unwrap();
        assert_eq!(parsed.mime_type, "text/plain");
        assert_eq!(parsed.decode().unwrap(), b"three-tier web app");
        assert!(parsed.is_textual());
    }

    #[test]
    fn test_parse_accepts_parameters() {
        let parsed = DataUri::parse("data:text/plain;charset=utf-8;base64,aGk=").unwrap();
        assert_eq!(parsed.mime_type, "text/plain");
        assert_eq!(parsed.payload, "aGk=");
    }

    #[test]
    fn test_parse_rejects_missing_mime_or_encoding() {
        assert!(DataUri::parse("data:;base64,aGk=").is_err());
        assert!(DataUri::parse("data:text/plain,hello").is_err());
        assert!(DataUri::parse("data:text/plain;base64,").is_err());
        assert!(DataUri::parse("https://example.com/spec.pdf").is_err());
    }

    #[test]
    fn test_parse_rejects_corrupt_payload() {
        let err = DataUri::parse("data:application/pdf;base64,aGk").unwrap_err();
        assert!(matches!(err, ValidationError::InvalidDataUri(_)));
    }
}
