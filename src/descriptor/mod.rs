//! Launch descriptors.
//!
//! A `Declaration` is what an ecosystem file says. A `LaunchDescriptor` is
//! the validated, environment-resolved result handed to the supervisor. It
//! is immutable; configuration reload builds a new one.

use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub use self::declaration::{Args, Declaration, Ecosystem, ExecutionMode};
pub use self::memory::MemoryThreshold;

mod declaration;
mod memory;

/// Interpreter value meaning "execute the script itself".
pub const NO_INTERPRETER: &str = "none";

/// How many processes the supervisor starts for an app, and how
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpawnPlan {
    pub name: String,
    pub mode: ExecutionMode,
    pub processes: u32,
    pub executable: PathBuf,
    pub argv: Vec<String>,
}

/// Validated launch descriptor.
///
/// Built only by the loader. Fields are private so a descriptor cannot be
/// mutated once loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct LaunchDescriptor {
    pub(crate) name: String,
    pub(crate) script: String,
    pub(crate) interpreter: Option<String>,
    pub(crate) command: String,
    pub(crate) executable: PathBuf,
    pub(crate) args: Option<Args>,
    pub(crate) args_template: Option<Args>,
    pub(crate) arg_tokens: Vec<String>,
    pub(crate) mode: ExecutionMode,
    pub(crate) instances: u32,
    pub(crate) cwd: Option<PathBuf>,
    pub(crate) env: BTreeMap<String, String>,
    pub(crate) env_template: BTreeMap<String, String>,
    pub(crate) auto_restart: bool,
    pub(crate) memory_threshold: Option<MemoryThreshold>,
    pub(crate) watch: bool,
    pub(crate) ignore_watch: Vec<glob::Pattern>,
}

impl LaunchDescriptor {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn script(&self) -> &str {
        &self.script
    }

    /// Declared interpreter, None when absent or "none"
    pub fn interpreter(&self) -> Option<&str> {
        self.interpreter
            .as_deref()
            .map(str::trim)
            .filter(|i| !i.is_empty() && *i != NO_INTERPRETER)
    }

    /// The interpreter when there is one, otherwise the script
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Path the command resolved to at load time
    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// Resolved arguments
    pub fn args(&self) -> Option<&Args> {
        self.args.as_ref()
    }

    /// Arguments for the executable: the script first when run through an
    /// interpreter, then the args.
    ///
    /// A line of args is split on whitespace before substitution, so a
    /// variable whose value contains spaces stays a single argument.
    pub fn argv(&self) -> Vec<String> {
        let mut argv = Vec::new();
        if self.interpreter().is_some() {
            argv.push(self.script.clone());
        }
        argv.extend(self.arg_tokens.iter().cloned());
        argv
    }

    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    /// Declared instance count. Only clustered mode uses it.
    pub fn instances(&self) -> u32 {
        self.instances
    }

    pub fn cwd(&self) -> Option<&Path> {
        self.cwd.as_deref()
    }

    /// Resolved per-process environment additions
    pub fn env(&self) -> &BTreeMap<String, String> {
        &self.env
    }

    pub fn auto_restart(&self) -> bool {
        self.auto_restart
    }

    pub fn memory_threshold(&self) -> Option<&MemoryThreshold> {
        self.memory_threshold.as_ref()
    }

    pub fn watch_enabled(&self) -> bool {
        self.watch
    }

    /// Directory whose changes trigger a restart
    pub fn watch_root(&self) -> &Path {
        self.cwd.as_deref().unwrap_or_else(|| Path::new("."))
    }

    /// True when a changed path should not trigger a restart.
    ///
    /// Paths are matched relative to the watch root when they sit under it.
    pub fn is_watch_ignored(&self, path: &Path) -> bool {
        let relative = path.strip_prefix(self.watch_root()).unwrap_or(path);
        self.ignore_watch
            .iter()
            .any(|pattern| pattern.matches_path(relative) || pattern.matches_path(path))
    }

    /// Processes the supervisor should start
    pub fn spawn_plan(&self) -> SpawnPlan {
        let processes = match self.mode {
            ExecutionMode::Clustered => self.instances,
            ExecutionMode::Single | ExecutionMode::Forked => 1,
        };
        SpawnPlan {
            name: self.name.clone(),
            mode: self.mode,
            processes,
            executable: self.executable.clone(),
            argv: self.argv(),
        }
    }

    /// The declaration this descriptor was loaded from, placeholders unresolved
    pub fn to_declaration(&self) -> Declaration {
        Declaration {
            args: self.args_template.clone(),
            env: self.env_template.clone(),
            ..self.to_registration()
        }
    }

    /// The resolved structure registered with the supervisor
    pub fn to_registration(&self) -> Declaration {
        Declaration {
            name: self.name.clone(),
            script: self.script.clone(),
            args: self.args.clone(),
            exec_mode: self.mode,
            instances: i64::from(self.instances),
            interpreter: self.interpreter.clone(),
            cwd: self.cwd.clone(),
            env: self.env.clone(),
            watch: self.watch,
            ignore_watch: self.ignore_watch.iter().map(|p| p.as_str().to_string()).collect(),
            autorestart: self.auto_restart,
            max_memory_restart: self.memory_threshold.as_ref().map(|m| m.declared().to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(mode: ExecutionMode, instances: u32) -> LaunchDescriptor {
        LaunchDescriptor {
            name: "svc".to_string(),
            script: "server.js".to_string(),
            interpreter: Some("node".to_string()),
            command: "node".to_string(),
            executable: PathBuf::from("/usr/bin/node"),
            args: Some(Args::Line("--port 8118".to_string())),
            args_template: Some(Args::Line("--port ${PORT}".to_string())),
            arg_tokens: vec!["--port".to_string(), "8118".to_string()],
            mode,
            instances,
            cwd: None,
            env: BTreeMap::new(),
            env_template: BTreeMap::new(),
            auto_restart: true,
            memory_threshold: None,
            watch: false,
            ignore_watch: Vec::new(),
        }
    }

    #[test]
    fn test_spawn_plan_by_mode() {
        assert_eq!(descriptor(ExecutionMode::Clustered, 4).spawn_plan().processes, 4);
        assert_eq!(descriptor(ExecutionMode::Forked, 4).spawn_plan().processes, 1);
        assert_eq!(descriptor(ExecutionMode::Single, 4).spawn_plan().processes, 1);
    }

    #[test]
    fn test_argv_puts_script_first() {
        let plan = descriptor(ExecutionMode::Forked, 1).spawn_plan();
        assert_eq!(plan.argv, vec!["server.js", "--port", "8118"]);
        assert_eq!(plan.executable, PathBuf::from("/usr/bin/node"));
    }

    #[test]
    fn test_declaration_vs_registration() {
        let d = descriptor(ExecutionMode::Clustered, 2);
        assert_eq!(d.to_declaration().args, Some(Args::Line("--port ${PORT}".to_string())));
        assert_eq!(d.to_registration().args, Some(Args::Line("--port 8118".to_string())));
        assert_eq!(d.to_declaration().instances, 2);
    }

    #[test]
    fn test_watch_root_defaults_to_current_dir() {
        let d = descriptor(ExecutionMode::Forked, 1);
        assert_eq!(d.watch_root(), Path::new("."));
        assert!(!d.is_watch_ignored(Path::new("app.py")));
    }
}
