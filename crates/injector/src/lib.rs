//! ranctl-injector — 설정 템플릿 해석과 주입
//!
//! - [`template`]: YAML/TOML/JSON 템플릿 로더
//! - [`overrides`]: 점 표기 오버라이드 (뒤쪽 우선)
//! - [`injector`]: [`ConfigInjector`] (해석 + 전송)

pub mod injector;
pub mod overrides;
pub mod template;

pub use injector::ConfigInjector;
pub use overrides::Overrides;
pub use template::{TemplateFormat, TemplateLoader};
