//! Scenario model and start planning.
//!
//! A [`Scenario`] lists the components of one run in declared order. Before any
//! component is touched, [`Scenario::plan`] turns it into a [`StartPlan`]:
//! a dependency graph grouped into waves. Every component of a wave has all of its
//! dependencies in earlier waves, so a wave's Starts can be issued concurrently.
//!
//! # Dependency sources
//!
//! 1. Explicit `depends_on` entries
//! 2. `{component.field}` placeholders in `post_commands`
//! 3. Kind ordering: a gNB waits for every 5GC, a UE waits for every gNB

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::PathBuf;
use std::sync::LazyLock;
use std::time::Duration;

use ranctl_core::config::{ComponentConfig, RanctlConfig};
use ranctl_core::error::ScenarioError;
use ranctl_core::types::{ComponentKind, Definition};
use ranctl_injector::Overrides;
use regex::Regex;

/// Reference to the component's own definition inside `post_commands`.
pub const SELF_REFERENCE: &str = "self";

const PLACEHOLDER_PATTERN: &str = r"\{([A-Za-z0-9_-]+)\.([A-Za-z0-9_]+)\}";

static PLACEHOLDER: LazyLock<Result<Regex, ScenarioError>> =
    LazyLock::new(|| compile_pattern(PLACEHOLDER_PATTERN));

fn compile_pattern(pattern: &str) -> Result<Regex, ScenarioError> {
    Regex::new(pattern).map_err(|e| ScenarioError::InvalidPattern {
        pattern: pattern.to_owned(),
        reason: e.to_string(),
    })
}

fn placeholder() -> Result<&'static Regex, ScenarioError> {
    PLACEHOLDER.as_ref().map_err(Clone::clone)
}

/// A `{component.field}` placeholder found in a start command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub component: String,
    pub field: String,
}

impl std::fmt::Display for Reference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.component, self.field)
    }
}

/// Extract all placeholders from a start command, in order of appearance.
pub fn references(command: &str) -> Result<Vec<Reference>, ScenarioError> {
    Ok(placeholder()?
        .captures_iter(command)
        .map(|caps| Reference {
            component: caps[1].to_owned(),
            field: caps[2].to_owned(),
        })
        .collect())
}

/// Replace placeholders with values from captured definitions.
///
/// `{self.field}` resolves against `own_name`. An unknown component or field
/// is an `UnresolvedReference` for `own_name`.
pub fn render(
    command: &str,
    own_name: &str,
    definitions: &BTreeMap<String, Definition>,
) -> Result<String, ScenarioError> {
    let re = placeholder()?;

    let mut rendered = String::with_capacity(command.len());
    let mut last = 0;
    for caps in re.captures_iter(command) {
        let Some(whole) = caps.get(0) else { continue };
        let component = if &caps[1] == SELF_REFERENCE {
            own_name
        } else {
            &caps[1]
        };
        let value = definitions
            .get(component)
            .and_then(|def| def.field(&caps[2]))
            .ok_or_else(|| ScenarioError::UnresolvedReference {
                component: own_name.to_owned(),
                reference: format!("{}.{}", &caps[1], &caps[2]),
            })?;

        rendered.push_str(&command[last..whole.start()]);
        rendered.push_str(&value);
        last = whole.end();
    }
    rendered.push_str(&command[last..]);
    Ok(rendered)
}

/// One component of a scenario.
#[derive(Debug, Clone)]
pub struct ComponentSpec {
    pub name: String,
    pub kind: ComponentKind,
    pub template: Option<PathBuf>,
    pub overrides: Overrides,
    pub depends_on: Vec<String>,
    pub post_commands: Option<String>,
    pub start_timeout: Duration,
}

impl ComponentSpec {
    pub fn new(name: impl Into<String>, kind: ComponentKind, start_timeout: Duration) -> Self {
        Self {
            name: name.into(),
            kind,
            template: None,
            overrides: Overrides::new(),
            depends_on: Vec::new(),
            post_commands: None,
            start_timeout,
        }
    }

    pub fn with_template(mut self, template: impl Into<PathBuf>) -> Self {
        self.template = Some(template.into());
        self
    }

    pub fn with_overrides(mut self, overrides: Overrides) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn depends_on(mut self, name: impl Into<String>) -> Self {
        self.depends_on.push(name.into());
        self
    }

    pub fn with_post_commands(mut self, commands: impl Into<String>) -> Self {
        self.post_commands = Some(commands.into());
        self
    }
}

/// A full scenario: components plus run-level settings.
#[derive(Debug, Clone)]
pub struct Scenario {
    pub name: String,
    pub components: Vec<ComponentSpec>,
    /// How long the default body keeps components running.
    pub run_window: Duration,
    /// Scan captured logs for error patterns after cleanup.
    pub log_search: bool,
    /// Download logs even when the scenario passed.
    pub always_download_artifacts: bool,
    /// Overall deadline for the whole scenario.
    pub deadline: Duration,
}

impl Scenario {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            components: Vec::new(),
            run_window: Duration::ZERO,
            log_search: false,
            always_download_artifacts: false,
            deadline: Duration::from_secs(900),
        }
    }

    pub fn with_component(mut self, component: ComponentSpec) -> Self {
        self.components.push(component);
        self
    }

    pub fn with_run_window(mut self, run_window: Duration) -> Self {
        self.run_window = run_window;
        self
    }

    pub fn with_log_search(mut self, enabled: bool) -> Self {
        self.log_search = enabled;
        self
    }

    pub fn with_always_download_artifacts(mut self, enabled: bool) -> Self {
        self.always_download_artifacts = enabled;
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// Build a scenario from the `[scenario]`, `[timeouts]` and `[[components]]` sections.
    pub fn from_config(config: &RanctlConfig) -> Self {
        let default_start = Duration::from_secs(config.timeouts.start_secs);

        let components = config
            .components
            .iter()
            .map(|c| ComponentSpec {
                name: c.name.clone(),
                kind: c.kind,
                template: c.template.as_ref().map(PathBuf::from),
                overrides: component_overrides(c),
                depends_on: c.depends_on.clone(),
                post_commands: c.post_commands.clone(),
                start_timeout: c
                    .start_timeout_secs
                    .map(Duration::from_secs)
                    .unwrap_or(default_start),
            })
            .collect();

        Self {
            name: config.scenario.name.clone(),
            components,
            run_window: Duration::from_secs(config.scenario.run_window_secs),
            log_search: config.scenario.log_search,
            always_download_artifacts: config.scenario.always_download_artifacts,
            deadline: Duration::from_secs(config.timeouts.scenario_secs),
        }
    }

    /// Validate the dependency graph and compute start waves.
    pub fn plan(&self) -> Result<StartPlan, ScenarioError> {
        let mut index = HashMap::with_capacity(self.components.len());
        for (idx, component) in self.components.iter().enumerate() {
            if index.insert(component.name.as_str(), idx).is_some() {
                return Err(ScenarioError::DuplicateComponent {
                    name: component.name.clone(),
                });
            }
        }

        let mut dependencies: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); self.components.len()];

        for (idx, component) in self.components.iter().enumerate() {
            for dep in &component.depends_on {
                let Some(&dep_idx) = index.get(dep.as_str()) else {
                    return Err(ScenarioError::UnknownDependency {
                        component: component.name.clone(),
                        dependency: dep.clone(),
                    });
                };
                if dep_idx == idx {
                    return Err(ScenarioError::DependencyCycle {
                        members: vec![component.name.clone()],
                    });
                }
                dependencies[idx].insert(dep_idx);
            }

            if let Some(commands) = &component.post_commands {
                for reference in references(commands)? {
                    if reference.component == SELF_REFERENCE || reference.component == component.name
                    {
                        continue;
                    }
                    let Some(&dep_idx) = index.get(reference.component.as_str()) else {
                        return Err(ScenarioError::UnresolvedReference {
                            component: component.name.clone(),
                            reference: reference.to_string(),
                        });
                    };
                    dependencies[idx].insert(dep_idx);
                }
            }

            let upstream_kind = match component.kind {
                ComponentKind::FiveGc => None,
                ComponentKind::Gnb => Some(ComponentKind::FiveGc),
                ComponentKind::Ue => Some(ComponentKind::Gnb),
            };
            if let Some(kind) = upstream_kind {
                for (other_idx, other) in self.components.iter().enumerate() {
                    if other.kind == kind {
                        dependencies[idx].insert(other_idx);
                    }
                }
            }
        }

        // Kahn's algorithm, grouped into waves; declared order within each wave
        let mut remaining: Vec<usize> = dependencies.iter().map(BTreeSet::len).collect();
        let mut placed = vec![false; self.components.len()];
        let mut waves: Vec<Vec<usize>> = Vec::new();

        loop {
            let wave: Vec<usize> = (0..self.components.len())
                .filter(|&idx| !placed[idx] && remaining[idx] == 0)
                .collect();
            if wave.is_empty() {
                break;
            }
            for &done in &wave {
                placed[done] = true;
            }
            for (idx, deps) in dependencies.iter().enumerate() {
                if !placed[idx] {
                    remaining[idx] = deps.iter().filter(|d| !placed[**d]).count();
                }
            }
            waves.push(wave);
        }

        if placed.iter().any(|p| !p) {
            let members = self
                .components
                .iter()
                .zip(&placed)
                .filter(|(_, p)| !**p)
                .map(|(c, _)| c.name.clone())
                .collect();
            return Err(ScenarioError::DependencyCycle { members });
        }

        Ok(StartPlan {
            waves,
            dependencies: dependencies
                .into_iter()
                .map(|deps| deps.into_iter().collect())
                .collect(),
        })
    }
}

/// Validated start order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartPlan {
    /// Component indices grouped by wave, declared order within a wave.
    pub waves: Vec<Vec<usize>>,
    /// Direct dependencies of each component (indices, ascending).
    pub dependencies: Vec<Vec<usize>>,
}

impl StartPlan {
    /// Flattened start order.
    pub fn order(&self) -> Vec<usize> {
        self.waves.iter().flatten().copied().collect()
    }
}

/// `settings` table first, then the `overrides` list, so list entries win.
fn component_overrides(config: &ComponentConfig) -> Overrides {
    let mut overrides = config
        .settings
        .as_ref()
        .map(Overrides::from_nested)
        .unwrap_or_default();
    overrides.extend(Overrides::from(config.overrides.as_slice()));
    overrides
}
