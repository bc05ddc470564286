//! ConfigInjector -- 템플릿 해석과 설정 전송
//!
//! # 흐름
//! ```text
//! template file ──load──▶ value tree ──overrides (in order)──▶ flatten ──▶ ConfigPayload ──push──▶ handle
//! ```
//!
//! 해석은 로컬에서만 수행되므로 실패해도 원격 컴포넌트는 건드리지 않습니다.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use ranctl_component::handle::ComponentHandle;
use ranctl_core::error::{ComponentError, ConfigError};
use ranctl_core::types::ConfigPayload;
use serde_json::Value;
use tracing::{debug, info};

use crate::overrides::Overrides;
use crate::template::TemplateLoader;

/// 설정 주입기
#[derive(Debug, Clone, Default)]
pub struct ConfigInjector {
    base_dir: Option<PathBuf>,
}

impl ConfigInjector {
    pub fn new() -> Self {
        Self::default()
    }

    /// 상대 템플릿 경로의 기준 디렉토리를 지정합니다.
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    fn template_path(&self, template: &Path) -> PathBuf {
        match &self.base_dir {
            Some(base) if template.is_relative() => base.join(template),
            _ => template.to_path_buf(),
        }
    }

    /// 템플릿과 오버라이드를 병합하여 최종 페이로드를 만듭니다.
    ///
    /// 템플릿이 없으면 빈 매핑에서 시작하고 오버라이드 경로의 중간 매핑을 새로 만듭니다.
    /// 오버라이드는 선언 순서대로 적용되며 같은 경로는 뒤쪽 값이 우선합니다.
    ///
    /// # Errors
    /// - 템플릿 파일이 없으면 `TemplateNotFound`
    /// - 템플릿 구조와 맞지 않는 경로면 `InvalidOverride`
    pub async fn resolve(
        &self,
        template: Option<&Path>,
        overrides: &Overrides,
    ) -> Result<ConfigPayload, ConfigError> {
        let (root, template) = match template {
            Some(path) => {
                let path = self.template_path(path);
                let mut root = TemplateLoader::load_file(&path).await?;
                overrides.apply_to(&mut root)?;
                (root, Some(path))
            }
            None => (overrides.build()?, None),
        };

        let mut entries = BTreeMap::new();
        flatten(String::new(), root, &mut entries);

        debug!(
            template = ?template,
            overrides = overrides.len(),
            entries = entries.len(),
            "config resolved"
        );

        Ok(ConfigPayload { template, entries })
    }

    /// 페이로드를 컴포넌트에 전송합니다.
    ///
    /// Start 전에 반드시 성공해야 하며, 다시 전송하면 이전 페이로드를 대체합니다.
    pub async fn push(
        &self,
        handle: &mut ComponentHandle,
        payload: ConfigPayload,
    ) -> Result<(), ComponentError> {
        let entries = payload.len();
        handle.push_config(payload).await?;
        info!(component = handle.name(), entries, "config pushed");
        Ok(())
    }
}

/// 값 트리를 `dotted.key → 스칼라`로 평탄화합니다.
///
/// 시퀀스는 인덱스를 세그먼트로 사용합니다. 빈 매핑/시퀀스는 값 그대로 보존합니다.
fn flatten(prefix: String, value: Value, out: &mut BTreeMap<String, Value>) {
    let join = |key: &str| {
        if prefix.is_empty() {
            key.to_owned()
        } else {
            format!("{prefix}.{key}")
        }
    };

    match value {
        Value::Object(map) if !map.is_empty() => {
            for (key, child) in map {
                flatten(join(&key), child, out);
            }
        }
        Value::Array(items) if !items.is_empty() => {
            for (idx, child) in items.into_iter().enumerate() {
                flatten(join(&idx.to_string()), child, out);
            }
        }
        other => {
            if !prefix.is_empty() {
                out.insert(prefix, other);
            }
        }
    }
}
