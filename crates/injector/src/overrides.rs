//! 점 표기 오버라이드
//!
//! [`Overrides`]는 `(경로, 값)` 목록을 선언 순서대로 보관합니다.
//! 같은 경로가 여러 번 나오면 뒤쪽 값이 우선합니다.
//!
//! # 경로 규칙
//! - 경로는 비어 있을 수 없고, 빈 세그먼트(`a..b`)도 허용되지 않습니다.
//! - 중간 세그먼트는 존재하는 매핑 키이거나, 존재하는 시퀀스의 범위 내 인덱스여야 합니다.
//! - 마지막 세그먼트는 매핑에 새 키를 추가할 수 있습니다.
//! - 스칼라를 매핑/시퀀스로, 또는 매핑/시퀀스를 스칼라로 바꿀 수 없습니다.
//!
//! 템플릿이 없는 경우([`Overrides::build`])에는 구조를 검증할 기준이 없으므로
//! 없는 중간 매핑을 새로 만들고 값 교체도 허용합니다. 스칼라를 통과하는 경로만 거부합니다.

use ranctl_core::config::OverrideEntry;
use ranctl_core::error::ConfigError;
use serde_json::Value;

/// 순서가 보존되는 오버라이드 목록
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overrides {
    entries: Vec<(String, Value)>,
}

impl Overrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// 오버라이드를 추가합니다.
    pub fn with(mut self, path: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(path, value);
        self
    }

    pub fn push(&mut self, path: impl Into<String>, value: impl Into<Value>) {
        self.entries.push((path.into(), value.into()));
    }

    /// 중첩 매핑을 점 표기 오버라이드로 평탄화합니다.
    ///
    /// `{gnb: {templates: {main: "x.yml"}}}` → `gnb.templates.main = "x.yml"`.
    /// 시퀀스와 스칼라는 리프 값으로 취급합니다.
    pub fn from_nested(nested: &Value) -> Self {
        let mut overrides = Self::new();
        if let Value::Object(map) = nested {
            for (key, value) in map {
                flatten_nested(key.clone(), value, &mut overrides);
            }
        }
        overrides
    }

    /// 다른 목록을 뒤에 이어 붙입니다. 붙인 쪽이 우선합니다.
    pub fn extend(&mut self, other: Overrides) {
        self.entries.extend(other.entries);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(path, value)| (path.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 모든 오버라이드를 템플릿 트리에 순서대로 적용합니다.
    pub fn apply_to(&self, root: &mut Value) -> Result<(), ConfigError> {
        for (path, value) in &self.entries {
            apply(root, path, value.clone())?;
        }
        Ok(())
    }

    /// 빈 매핑에서 시작해 오버라이드만으로 값 트리를 만듭니다.
    pub fn build(&self) -> Result<Value, ConfigError> {
        let mut root = Value::Object(serde_json::Map::new());
        for (path, value) in &self.entries {
            set_path(&mut root, path, value.clone(), Mode::Create)?;
        }
        Ok(root)
    }
}

impl From<&[OverrideEntry]> for Overrides {
    fn from(entries: &[OverrideEntry]) -> Self {
        Self {
            entries: entries
                .iter()
                .map(|e| (e.path.clone(), e.value.clone()))
                .collect(),
        }
    }
}

fn flatten_nested(prefix: String, value: &Value, out: &mut Overrides) {
    match value {
        Value::Object(map) if !map.is_empty() => {
            for (key, child) in map {
                flatten_nested(format!("{prefix}.{key}"), child, out);
            }
        }
        _ => out.push(prefix, value.clone()),
    }
}

fn is_container(value: &Value) -> bool {
    matches!(value, Value::Object(_) | Value::Array(_))
}

fn invalid(path: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidOverride {
        path: path.to_owned(),
        reason: reason.into(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// 템플릿 구조를 따라야 함
    Template,
    /// 없는 중간 매핑을 생성
    Create,
}

/// 오버라이드 하나를 템플릿 값 트리에 적용합니다.
pub fn apply(root: &mut Value, path: &str, value: Value) -> Result<(), ConfigError> {
    set_path(root, path, value, Mode::Template)
}

fn set_path(root: &mut Value, path: &str, value: Value, mode: Mode) -> Result<(), ConfigError> {
    if path.is_empty() {
        return Err(invalid(path, "path is empty"));
    }
    let segments: Vec<&str> = path.split('.').collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(invalid(path, "path contains an empty segment"));
    }

    let (leaf, parents) = match segments.split_last() {
        Some(split) => split,
        None => return Err(invalid(path, "path is empty")),
    };

    let mut current = root;
    for segment in parents {
        current = match current {
            Value::Object(map) => {
                if mode == Mode::Create {
                    map.entry((*segment).to_owned())
                        .or_insert_with(|| Value::Object(serde_json::Map::new()))
                } else {
                    map.get_mut(*segment).ok_or_else(|| {
                        invalid(path, format!("key '{segment}' does not exist"))
                    })?
                }
            }
            Value::Array(items) => {
                let len = items.len();
                let idx = segment
                    .parse::<usize>()
                    .map_err(|_| invalid(path, format!("'{segment}' is not a sequence index")))?;
                items.get_mut(idx).ok_or_else(|| {
                    invalid(path, format!("index {idx} out of range (len {len})"))
                })?
            }
            _ => {
                return Err(invalid(
                    path,
                    format!("cannot descend into scalar at '{segment}'"),
                ));
            }
        };
    }

    let slot = match current {
        Value::Object(map) => {
            if !map.contains_key(*leaf) {
                map.insert((*leaf).to_owned(), value);
                return Ok(());
            }
            map.get_mut(*leaf)
        }
        Value::Array(items) => {
            let len = items.len();
            let idx = leaf
                .parse::<usize>()
                .map_err(|_| invalid(path, format!("'{leaf}' is not a sequence index")))?;
            if idx >= len {
                return Err(invalid(path, format!("index {idx} out of range (len {len})")));
            }
            items.get_mut(idx)
        }
        _ => {
            return Err(invalid(path, format!("cannot set '{leaf}' on a scalar")));
        }
    };

    let Some(slot) = slot else {
        return Err(invalid(path, format!("'{leaf}' does not exist")));
    };

    if mode == Mode::Template && is_container(slot) != is_container(&value) {
        let (from, to) = if is_container(slot) {
            ("a mapping or sequence", "a scalar")
        } else {
            ("a scalar", "a mapping or sequence")
        };
        return Err(invalid(path, format!("cannot replace {from} with {to}")));
    }

    *slot = value;
    Ok(())
}
