//! Configuration types

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Main build configuration for Gantry
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Project name, informational only
    pub name: Option<String>,

    /// Target run when no task is requested
    pub default: Option<String>,

    /// Environment overlay applied to every action
    pub env: BTreeMap<String, String>,

    /// Tasks registered under their bare name
    #[serde(deserialize_with = "unique_keys::map")]
    pub tasks: BTreeMap<String, TaskConfig>,

    /// Tasks grouped by namespace, registered as `<namespace>.<name>`
    #[serde(deserialize_with = "unique_keys::nested_map")]
    pub namespaces: BTreeMap<String, BTreeMap<String, TaskConfig>>,
}

impl Config {
    /// Total number of tasks declared, bare and namespaced
    pub fn task_count(&self) -> usize {
        self.tasks.len() + self.namespaces.values().map(|n| n.len()).sum::<usize>()
    }
}

/// A single task declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskConfig {
    /// Human readable description shown by `gantry list`
    pub description: Option<String>,

    /// Fully-qualified ids of tasks that must complete first, in order
    pub depends_on: Vec<String>,

    /// Executable to run
    pub command: Option<String>,

    /// Arguments passed to `command`
    pub args: Vec<String>,

    /// Environment overlay for `command`, on top of the global overlay
    pub env: BTreeMap<String, String>,

    /// Commands run one after another, stopping at the first failure
    pub steps: Vec<StepConfig>,

    /// Paths deleted recursively, relative to the project root
    pub remove: Vec<PathBuf>,

    /// Whether command output is streamed to the terminal
    pub stream: bool,
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            description: None,
            depends_on: Vec::new(),
            command: None,
            args: Vec::new(),
            env: BTreeMap::new(),
            steps: Vec::new(),
            remove: Vec::new(),
            stream: true,
        }
    }
}

/// One command in a multi-step task
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StepConfig {
    /// Executable to run
    pub command: String,

    /// Arguments passed to `command`
    pub args: Vec<String>,

    /// Environment overlay for this step
    pub env: BTreeMap<String, String>,
}

/// What a task does once its prerequisites are satisfied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskBody<'a> {
    /// Run a single command
    Command(&'a str),
    /// Run several commands in order
    Steps(&'a [StepConfig]),
    /// Delete paths
    Remove(&'a [PathBuf]),
    /// Nothing beyond the prerequisites
    Aggregate,
}

impl TaskConfig {
    /// Number of body kinds declared; anything above one is invalid
    pub fn body_count(&self) -> usize {
        [
            self.command.is_some(),
            !self.steps.is_empty(),
            !self.remove.is_empty(),
        ]
        .iter()
        .filter(|declared| **declared)
        .count()
    }

    /// The body of this task, first declared kind wins
    pub fn body(&self) -> TaskBody<'_> {
        if let Some(ref command) = self.command {
            TaskBody::Command(command)
        } else if !self.steps.is_empty() {
            TaskBody::Steps(&self.steps)
        } else if !self.remove.is_empty() {
            TaskBody::Remove(&self.remove)
        } else {
            TaskBody::Aggregate
        }
    }
}

/// Map deserializers that fail on a repeated key instead of keeping the last
/// entry. YAML mappings allow duplicates; TOML tables already reject them.
mod unique_keys {
    use std::collections::BTreeMap;
    use std::fmt;
    use std::marker::PhantomData;

    use serde::de::{Error, MapAccess, Visitor};
    use serde::{Deserialize, Deserializer};

    struct UniqueMap<V>(BTreeMap<String, V>);

    impl<'de, V: Deserialize<'de>> Deserialize<'de> for UniqueMap<V> {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            struct UniqueVisitor<V>(PhantomData<V>);

            impl<'de, V: Deserialize<'de>> Visitor<'de> for UniqueVisitor<V> {
                type Value = UniqueMap<V>;

                fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str("a map with unique keys")
                }

                fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                    let mut map = BTreeMap::new();
                    while let Some((key, value)) = access.next_entry::<String, V>()? {
                        if map.contains_key(&key) {
                            return Err(A::Error::custom(format!("duplicate key `{}`", key)));
                        }
                        map.insert(key, value);
                    }
                    Ok(UniqueMap(map))
                }
            }

            deserializer.deserialize_map(UniqueVisitor(PhantomData))
        }
    }

    pub fn map<'de, D, V>(deserializer: D) -> Result<BTreeMap<String, V>, D::Error>
    where
        D: Deserializer<'de>,
        V: Deserialize<'de>,
    {
        UniqueMap::deserialize(deserializer).map(|m| m.0)
    }

    pub fn nested_map<'de, D, V>(
        deserializer: D,
    ) -> Result<BTreeMap<String, BTreeMap<String, V>>, D::Error>
    where
        D: Deserializer<'de>,
        V: Deserialize<'de>,
    {
        let outer = UniqueMap::<UniqueMap<V>>::deserialize(deserializer)?;
        Ok(outer.0.into_iter().map(|(k, inner)| (k, inner.0)).collect())
    }
}
