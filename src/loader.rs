//! Launch descriptor loader.
//!
//! Turns declarations into validated `LaunchDescriptor`s. Checks run in a
//! fixed order and the first failure is returned:
//! 1. name
//! 2. command
//! 3. instances
//! 4. placeholders (args, then env values)
//! 5. memory threshold
//! 6. watch patterns
//! 7. executable resolution

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use crate::descriptor::{Declaration, Ecosystem, LaunchDescriptor, MemoryThreshold, NO_INTERPRETER};
use crate::env::{EnvSnapshot, SubstituteError};
use crate::error::{LoadError, Result};
use crate::resolve::{ExecutableResolver, PathResolver};

/// Where a descriptor comes from
#[derive(Debug, Clone)]
pub enum DescriptorSource {
    /// A YAML or JSON file holding exactly one app
    File(PathBuf),
    /// An in-memory declaration
    Inline(Declaration),
}

impl From<Declaration> for DescriptorSource {
    fn from(decl: Declaration) -> Self {
        DescriptorSource::Inline(decl)
    }
}

impl From<&Path> for DescriptorSource {
    fn from(path: &Path) -> Self {
        DescriptorSource::File(path.to_path_buf())
    }
}

impl From<PathBuf> for DescriptorSource {
    fn from(path: PathBuf) -> Self {
        DescriptorSource::File(path)
    }
}

/// Load one descriptor with an explicit environment and resolver
pub fn load(
    source: impl Into<DescriptorSource>,
    env: &EnvSnapshot,
    resolver: &dyn ExecutableResolver,
) -> Result<LaunchDescriptor> {
    Loader::with_resolver(env.clone(), resolver).load(source)
}

/// Load every app in an ecosystem file
pub fn load_ecosystem(
    path: &Path,
    env: &EnvSnapshot,
    resolver: &dyn ExecutableResolver,
) -> Result<Vec<LaunchDescriptor>> {
    Loader::with_resolver(env.clone(), resolver).load_ecosystem(path)
}

/// Read the declarations in a file without validating them.
///
/// `.json` files are parsed as JSON, everything else as YAML.
pub fn read_declarations(path: &Path) -> Result<Vec<Declaration>> {
    let content = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let parse_error = |message: String| LoadError::Parse {
        path: path.to_path_buf(),
        message,
    };

    let ecosystem = if path.extension().is_some_and(|ext| ext == "json") {
        Ecosystem::from_json(&content).map_err(|e| parse_error(e.to_string()))?
    } else {
        Ecosystem::from_yaml(&content).map_err(|e| parse_error(e.to_string()))?
    };

    let apps = ecosystem.into_apps();
    log::debug!("Read {} declaration(s) from {}", apps.len(), path.display());
    Ok(apps)
}

/// Loader bound to one environment snapshot and executable resolver.
#[derive(Debug)]
pub struct Loader<R> {
    env: EnvSnapshot,
    resolver: R,
}

impl Loader<PathResolver> {
    /// Resolve executables against the snapshot's `PATH`
    pub fn new(env: EnvSnapshot) -> Self {
        let resolver = PathResolver::from_env(&env);
        Self { env, resolver }
    }
}

impl<R: ExecutableResolver> Loader<R> {
    pub fn with_resolver(env: EnvSnapshot, resolver: R) -> Self {
        Self { env, resolver }
    }

    /// Load a single descriptor
    pub fn load(&self, source: impl Into<DescriptorSource>) -> Result<LaunchDescriptor> {
        match source.into() {
            DescriptorSource::Inline(decl) => self.build(&decl),
            DescriptorSource::File(path) => {
                let mut apps = read_declarations(&path)?;
                match apps.len() {
                    0 => Err(LoadError::EmptyEcosystem(path)),
                    1 => self.build(&apps.remove(0)),
                    count => Err(LoadError::MultipleApps { path, count }),
                }
            }
        }
    }

    /// Load every app in a file. Names must be unique.
    pub fn load_ecosystem(&self, path: &Path) -> Result<Vec<LaunchDescriptor>> {
        let apps = read_declarations(path)?;
        if apps.is_empty() {
            return Err(LoadError::EmptyEcosystem(path.to_path_buf()));
        }
        self.load_all(&apps)
    }

    /// Load a set of declarations. Names must be unique.
    pub fn load_all(&self, apps: &[Declaration]) -> Result<Vec<LaunchDescriptor>> {
        let mut seen = HashSet::new();
        let mut descriptors = Vec::with_capacity(apps.len());

        for decl in apps {
            let descriptor = self.build(decl)?;
            let name = descriptor.name().trim();
            if !seen.insert(name.to_string()) {
                return Err(LoadError::DuplicateName(name.to_string()));
            }
            descriptors.push(descriptor);
        }

        log::info!("Loaded {} app(s)", descriptors.len());
        Ok(descriptors)
    }

    /// Validate and resolve one declaration
    pub fn build(&self, decl: &Declaration) -> Result<LaunchDescriptor> {
        let name = decl.name.trim();
        if name.is_empty() {
            return Err(LoadError::MissingName);
        }
        let app = || name.to_string();

        let interpreter = decl
            .interpreter
            .as_deref()
            .map(str::trim)
            .filter(|i| !i.is_empty() && *i != NO_INTERPRETER);
        if decl.script.trim().is_empty() {
            return Err(LoadError::MissingCommand { app: app() });
        }
        let command = interpreter.unwrap_or(decl.script.trim()).to_string();

        let instances = u32::try_from(decl.instances)
            .ok()
            .filter(|n| *n >= 1)
            .ok_or(LoadError::InvalidInstanceCount {
                app: app(),
                value: decl.instances,
            })?;

        let substitute = |text: &str| {
            self.env.substitute(text).map_err(|e| match e {
                SubstituteError::Missing(variable) => LoadError::MissingVariable { app: app(), variable },
                SubstituteError::Malformed => LoadError::MalformedPlaceholder {
                    app: app(),
                    text: text.to_string(),
                },
            })
        };

        let args = decl.args.as_ref().map(|a| a.try_map(substitute)).transpose()?;
        let arg_tokens = decl
            .args
            .as_ref()
            .map(|a| a.argv().iter().map(|token| substitute(token.as_str())).collect::<Result<Vec<_>>>())
            .transpose()?
            .unwrap_or_default();
        let env = decl
            .env
            .iter()
            .map(|(key, value)| Ok((key.clone(), substitute(value.as_str())?)))
            .collect::<Result<BTreeMap<_, _>>>()?;

        let memory_threshold = decl
            .max_memory_restart
            .as_deref()
            .map(|text| {
                MemoryThreshold::parse(text).ok_or_else(|| LoadError::InvalidMemoryThreshold {
                    app: app(),
                    value: text.to_string(),
                })
            })
            .transpose()?;

        let ignore_watch = decl
            .ignore_watch
            .iter()
            .map(|pattern| {
                glob::Pattern::new(pattern).map_err(|e| LoadError::InvalidWatchPattern {
                    app: app(),
                    pattern: pattern.clone(),
                    reason: e.msg.to_string(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let executable = self
            .resolver
            .resolve(&command, decl.cwd.as_deref())
            .ok_or_else(|| LoadError::UnresolvedExecutable {
                app: app(),
                command: command.clone(),
            })?;

        log::debug!(
            "App '{}': {} resolved to {} ({} mode, {} instance(s))",
            name,
            command,
            executable.display(),
            decl.exec_mode,
            instances
        );

        Ok(LaunchDescriptor {
            name: decl.name.clone(),
            script: decl.script.clone(),
            interpreter: decl.interpreter.clone(),
            command,
            executable,
            args,
            args_template: decl.args.clone(),
            arg_tokens,
            mode: decl.exec_mode,
            instances,
            cwd: decl.cwd.clone(),
            env,
            env_template: decl.env.clone(),
            auto_restart: decl.autorestart,
            memory_threshold,
            watch: decl.watch,
            ignore_watch,
        })
    }
}
