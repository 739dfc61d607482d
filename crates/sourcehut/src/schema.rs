//! Sourcehut build manifest schema types.
//!
//! The subset of the build.sr.ht manifest format the manifest backend
//! emits. Tasks serialize as the single-key `name: script` maps the
//! service expects, so [`Task`] carries a manual `Serialize` impl.
//! See: <https://man.sr.ht/builds.sr.ht/manifest.md>

use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, Serializer};

/// A build manifest, ready to serialize into `.build.yml` or
/// `.builds/<name>.yml`.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Manifest {
    /// Build image, e.g. `debian/stable`.
    pub image: String,

    /// Extra distribution packages installed before the tasks run.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub packages: Vec<String>,

    /// Repositories cloned into the build's home directory.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<String>,

    /// Environment variables exported to every task.
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub environment: IndexMap<String, String>,

    /// The task list, executed in order in separate shells.
    pub tasks: Vec<Task>,

    /// Completion triggers.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub triggers: Vec<Trigger>,
}

/// One named task. Names are restricted to the `[a-z0-9_-]` alphabet by
/// the service; the emitter sanitizes before constructing these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    /// Task name, shown per-task in the build log.
    pub name: String,
    /// The shell script the task runs.
    pub script: String,
}

impl Task {
    /// Create a task.
    pub fn new(name: impl Into<String>, script: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            script: script.into(),
        }
    }
}

impl Serialize for Task {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.name, &self.script)?;
        map.end()
    }
}

/// A completion trigger.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Trigger {
    /// Trigger mechanism (`email`).
    pub action: String,
    /// When the trigger fires (`success`, `failure`, `always`).
    pub condition: String,
    /// Recipient address.
    pub to: String,
}

impl Trigger {
    /// The failure-notification mail trigger.
    #[must_use]
    pub fn email_on_failure(to: impl Into<String>) -> Self {
        Self {
            action: "email".to_string(),
            condition: "failure".to_string(),
            to: to.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tasks_serialize_as_single_key_maps() {
        let manifest = Manifest {
            image: "debian/stable".to_string(),
            packages: vec!["libgmp-dev".to_string()],
            sources: vec!["https://git.sr.ht/~me/servant".to_string()],
            environment: IndexMap::new(),
            tasks: vec![
                Task::new("setup", "ghcup install ghc 9.2.8"),
                Task::new("build", "cabal build all"),
            ],
            triggers: Vec::new(),
        };

        let yaml = serde_yaml::to_string(&manifest).unwrap();
        assert!(yaml.contains("image: debian/stable"));
        assert!(yaml.contains("- libgmp-dev"));
        assert!(yaml.contains("- https://git.sr.ht/~me/servant"));
        assert!(yaml.contains("- setup: ghcup install ghc 9.2.8"));
        assert!(yaml.contains("- build: cabal build all"));
        assert!(!yaml.contains("environment:"));
        assert!(!yaml.contains("triggers:"));
    }

    #[test]
    fn multiline_scripts_become_block_scalars() {
        let task = Task::new("setup", "cabal update\ncabal build all");
        let yaml = serde_yaml::to_string(&vec![task]).unwrap();
        assert!(yaml.contains("- setup: |"));
        assert!(yaml.contains("    cabal update"));
        assert!(yaml.contains("    cabal build all"));
    }

    #[test]
    fn environment_keeps_insertion_order() {
        let mut environment = IndexMap::new();
        environment.insert("CABAL_JOBS".to_string(), "2".to_string());
        environment.insert("LANG".to_string(), "C.UTF-8".to_string());
        let manifest = Manifest {
            image: "debian/stable".to_string(),
            packages: Vec::new(),
            sources: Vec::new(),
            environment,
            tasks: vec![Task::new("noop", "true")],
            triggers: Vec::new(),
        };

        let yaml = serde_yaml::to_string(&manifest).unwrap();
        let jobs = yaml.find("CABAL_JOBS").unwrap();
        let lang = yaml.find("LANG").unwrap();
        assert!(jobs < lang);
    }

    #[test]
    fn email_trigger_has_the_expected_shape() {
        let trigger = Trigger::email_on_failure("ci@example.org");
        let yaml = serde_yaml::to_string(&vec![trigger]).unwrap();
        assert!(yaml.contains("action: email"));
        assert!(yaml.contains("condition: failure"));
        assert!(yaml.contains("to: ci@example.org"));
    }
}
