//! 템플릿 로더 -- 설정 템플릿 파일을 디스크에서 로드합니다.
//!
//! 확장자로 형식을 결정합니다: `.yml`/`.yaml`, `.toml`, `.json`.
//! 모든 형식은 `serde_json::Value` 트리로 정규화되며, 최상위는 매핑이어야 합니다.

use std::path::Path;

use ranctl_core::error::ConfigError;
use serde_json::Value;

/// 템플릿 파일 크기 상한
const MAX_TEMPLATE_FILE_SIZE: u64 = 10 * 1024 * 1024; // 10MB

/// 템플릿 파일 형식
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateFormat {
    Yaml,
    Toml,
    Json,
}

impl TemplateFormat {
    /// 파일 확장자로 형식을 결정합니다.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        match ext.as_deref() {
            Some("yml" | "yaml") => Ok(Self::Yaml),
            Some("toml") => Ok(Self::Toml),
            Some("json") => Ok(Self::Json),
            _ => Err(ConfigError::ParseFailed {
                reason: format!(
                    "unsupported template format: {} (expected .yml, .yaml, .toml or .json)",
                    path.display()
                ),
            }),
        }
    }
}

/// 템플릿 파일 로더
pub struct TemplateLoader;

impl TemplateLoader {
    /// 템플릿 파일을 로드하여 값 트리로 반환합니다.
    ///
    /// # Errors
    /// - 파일이 없으면 `TemplateNotFound`
    /// - 크기 초과 또는 파싱 실패 시 `ParseFailed`
    pub async fn load_file(path: impl AsRef<Path>) -> Result<Value, ConfigError> {
        let path = path.as_ref();
        let source = path.display().to_string();

        let metadata = tokio::fs::metadata(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::TemplateNotFound {
                    path: source.clone(),
                }
            } else {
                ConfigError::ParseFailed {
                    reason: format!("{source}: failed to read file metadata: {e}"),
                }
            }
        })?;

        if !metadata.is_file() {
            return Err(ConfigError::TemplateNotFound { path: source });
        }

        if metadata.len() > MAX_TEMPLATE_FILE_SIZE {
            return Err(ConfigError::ParseFailed {
                reason: format!(
                    "{source}: file too large: {} bytes (max: {MAX_TEMPLATE_FILE_SIZE})",
                    metadata.len()
                ),
            });
        }

        let format = TemplateFormat::from_path(path)?;
        let content =
            tokio::fs::read_to_string(path)
                .await
                .map_err(|e| ConfigError::ParseFailed {
                    reason: format!("{source}: failed to read file: {e}"),
                })?;

        Self::parse(&content, format, &source)
    }

    /// 템플릿 문자열을 파싱합니다.
    pub fn parse(content: &str, format: TemplateFormat, source: &str) -> Result<Value, ConfigError> {
        let parsed: Value = match format {
            TemplateFormat::Yaml => {
                // 빈 YAML 문서는 빈 매핑으로 취급
                if content.trim().is_empty() {
                    Value::Object(serde_json::Map::new())
                } else {
                    serde_yaml::from_str(content).map_err(|e| ConfigError::ParseFailed {
                        reason: format!("{source}: YAML parse error: {e}"),
                    })?
                }
            }
            TemplateFormat::Toml => toml::from_str(content).map_err(|e| ConfigError::ParseFailed {
                reason: format!("{source}: TOML parse error: {e}"),
            })?,
            TemplateFormat::Json => {
                serde_json::from_str(content).map_err(|e| ConfigError::ParseFailed {
                    reason: format!("{source}: JSON parse error: {e}"),
                })?
            }
        };

        if !parsed.is_object() {
            return Err(ConfigError::ParseFailed {
                reason: format!("{source}: template root must be a mapping"),
            });
        }

        Ok(parsed)
    }
}
