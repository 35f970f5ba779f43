//! Declared launch configuration (the on-disk schema).
//!
//! This is the structure an ecosystem file contains for one app, with every
//! recognized option and its default spelled out.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// How the supervisor runs the app's processes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
pub enum ExecutionMode {
    /// One attached process
    #[serde(rename = "single")]
    Single,

    /// One detached process
    #[default]
    #[serde(rename = "fork", alias = "fork_mode")]
    Forked,

    /// `instances` load-balanced processes
    #[serde(rename = "cluster", alias = "cluster_mode")]
    Clustered,
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionMode::Single => write!(f, "single"),
            ExecutionMode::Forked => write!(f, "fork"),
            ExecutionMode::Clustered => write!(f, "cluster"),
        }
    }
}

/// Arguments passed to the script, either one line or a list
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Args {
    Line(String),
    List(Vec<String>),
}

impl Args {
    /// Split into individual arguments. A line splits on whitespace, so call
    /// this on the unresolved template when values may contain spaces.
    pub fn argv(&self) -> Vec<String> {
        match self {
            Args::Line(line) => line.split_whitespace().map(str::to_string).collect(),
            Args::List(list) => list.clone(),
        }
    }

    /// Apply `f` to every string, keeping the shape
    pub fn try_map<E, F>(&self, mut f: F) -> Result<Self, E>
    where
        F: FnMut(&str) -> Result<String, E>,
    {
        Ok(match self {
            Args::Line(line) => Args::Line(f(line.as_str())?),
            Args::List(list) => Args::List(list.iter().map(|a| f(a.as_str())).collect::<Result<_, _>>()?),
        })
    }
}

impl fmt::Display for Args {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Args::Line(line) => write!(f, "{}", line),
            Args::List(list) => write!(f, "{}", list.join(" ")),
        }
    }
}

/// One app as declared in an ecosystem file.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Declaration {
    /// App name, unique within a supervisor.
    pub name: String,

    /// Entry script or executable.
    pub script: String,

    /// Script arguments; may contain `${VAR}` placeholders.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub args: Option<Args>,

    /// Execution mode.
    pub exec_mode: ExecutionMode,

    /// Process count for cluster mode.
    pub instances: i64,

    /// Interpreter that runs `script`. "none" runs the script directly.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interpreter: Option<String>,

    /// Working directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cwd: Option<PathBuf>,

    /// Extra environment for the process; values may contain placeholders.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,

    /// Restart when files under the working directory change.
    pub watch: bool,

    /// Glob patterns excluded from watching.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ignore_watch: Vec<String>,

    /// Restart the process when it exits.
    pub autorestart: bool,

    /// Memory ceiling that triggers a restart, e.g. "1G".
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "string_or_number"
    )]
    pub max_memory_restart: Option<String>,
}

impl Default for Declaration {
    fn default() -> Self {
        Self {
            name: String::new(),
            script: String::new(),
            args: None,
            exec_mode: ExecutionMode::default(),
            instances: 1,
            interpreter: None,
            cwd: None,
            env: BTreeMap::new(),
            watch: false,
            ignore_watch: Vec::new(),
            autorestart: true,
            max_memory_restart: None,
        }
    }
}

impl Declaration {
    /// Create a declaration with defaults for everything but name and script
    pub fn new(name: impl Into<String>, script: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            script: script.into(),
            ..Default::default()
        }
    }
}

/// Contents of an ecosystem file: a bare app or an `apps` list
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Ecosystem {
    Apps { apps: Vec<Declaration> },
    Single(Declaration),
}

#[derive(Deserialize)]
struct AppList {
    apps: Vec<Declaration>,
}

impl Ecosystem {
    /// Parse YAML. A top-level `apps` key selects the list shape, so field
    /// errors inside it are reported as such.
    pub fn from_yaml(content: &str) -> Result<Self, serde_yaml::Error> {
        let value: serde_yaml::Value = serde_yaml::from_str(content)?;
        if value.get("apps").is_some() {
            let list: AppList = serde_yaml::from_str(content)?;
            Ok(Ecosystem::Apps { apps: list.apps })
        } else {
            Ok(Ecosystem::Single(serde_yaml::from_str(content)?))
        }
    }

    /// Parse JSON, choosing the shape the same way as `from_yaml`
    pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
        let value: serde_json::Value = serde_json::from_str(content)?;
        if value.get("apps").is_some() {
            let list: AppList = serde_json::from_str(content)?;
            Ok(Ecosystem::Apps { apps: list.apps })
        } else {
            Ok(Ecosystem::Single(serde_json::from_str(content)?))
        }
    }

    pub fn into_apps(self) -> Vec<Declaration> {
        match self {
            Ecosystem::Apps { apps } => apps,
            Ecosystem::Single(app) => vec![app],
        }
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Bytes(u64),
    }

    Ok(Option::<Raw>::deserialize(deserializer)?.map(|raw| match raw {
        Raw::Text(text) => text,
        Raw::Bytes(bytes) => bytes.to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let decl = Declaration::default();
        assert_eq!(decl.exec_mode, ExecutionMode::Forked);
        assert_eq!(decl.instances, 1);
        assert!(!decl.watch);
        assert!(decl.autorestart);
        assert!(decl.max_memory_restart.is_none());
    }

    #[test]
    fn test_parse_minimal_yaml() {
        let yaml = r#"
name: qiblah-graphql
script: ./start_uvicorn.sh
interpreter: /bin/bash
exec_mode: fork
"#;
        let decl: Declaration = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(decl.name, "qiblah-graphql");
        assert_eq!(decl.interpreter.as_deref(), Some("/bin/bash"));
        assert_eq!(decl.instances, 1);
        assert!(decl.autorestart);
    }

    #[test]
    fn test_exec_mode_aliases() {
        let mode: ExecutionMode = serde_yaml::from_str("cluster_mode").unwrap();
        assert_eq!(mode, ExecutionMode::Clustered);
        let mode: ExecutionMode = serde_yaml::from_str("fork_mode").unwrap();
        assert_eq!(mode, ExecutionMode::Forked);
        let mode: ExecutionMode = serde_yaml::from_str("single").unwrap();
        assert_eq!(mode, ExecutionMode::Single);
        assert!(serde_yaml::from_str::<ExecutionMode>("threads").is_err());
    }

    #[test]
    fn test_exec_mode_display_matches_wire_name() {
        for mode in [ExecutionMode::Single, ExecutionMode::Forked, ExecutionMode::Clustered] {
            let wire = serde_json::to_string(&mode).unwrap();
            assert_eq!(wire, format!("\"{}\"", mode));
        }
    }

    #[test]
    fn test_args_line_and_list() {
        let decl: Declaration = serde_json::from_str(r#"{"name":"a","script":"b","args":"app:app --port 80"}"#).unwrap();
        assert_eq!(decl.args, Some(Args::Line("app:app --port 80".to_string())));

        let decl: Declaration = serde_json::from_str(r#"{"name":"a","script":"b","args":["app:app","--port","80"]}"#).unwrap();
        let args = decl.args.unwrap();
        assert_eq!(args.argv(), vec!["app:app", "--port", "80"]);
        assert_eq!(args.to_string(), "app:app --port 80");
    }

    #[test]
    fn test_args_try_map_keeps_shape() {
        let args = Args::List(vec!["a".to_string(), "b".to_string()]);
        let upper: Result<Args, ()> = args.try_map(|s| Ok(s.to_uppercase()));
        assert_eq!(upper.unwrap(), Args::List(vec!["A".to_string(), "B".to_string()]));

        let failed: Result<Args, &str> = Args::Line("x".to_string()).try_map(|_| Err("nope"));
        assert_eq!(failed, Err("nope"));
    }

    #[test]
    fn test_memory_as_number() {
        let decl: Declaration = serde_yaml::from_str("name: a\nscript: b\nmax_memory_restart: 1048576\n").unwrap();
        assert_eq!(decl.max_memory_restart.as_deref(), Some("1048576"));
    }

    #[test]
    fn test_ecosystem_shapes() {
        let single = Ecosystem::from_yaml("name: a\nscript: b\n").unwrap();
        assert_eq!(single.into_apps().len(), 1);

        let many = Ecosystem::from_yaml(
            r#"
apps:
  - name: a
    script: b
  - name: c
    script: d
    exec_mode: cluster
    instances: 4
"#,
        )
        .unwrap();
        let apps = many.into_apps();
        assert_eq!(apps.len(), 2);
        assert_eq!(apps[1].exec_mode, ExecutionMode::Clustered);
        assert_eq!(apps[1].instances, 4);
    }

    #[test]
    fn test_serialize_skips_absent_options() {
        let yaml = serde_yaml::to_string(&Declaration::new("svc", "uvicorn")).unwrap();
        assert!(!yaml.contains("args"));
        assert!(!yaml.contains("interpreter"));
        assert!(!yaml.contains("max_memory_restart"));
        assert!(yaml.contains("exec_mode: fork"));
    }
}
