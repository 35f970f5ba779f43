//! launchspec - launch descriptors for an external process supervisor
//!
//! Reads declarative app descriptors (one app or an ecosystem `apps` list),
//! resolves `${VAR}` placeholders against an explicit environment snapshot,
//! validates them, and produces immutable `LaunchDescriptor`s. Spawning,
//! restarting and monitoring belong to the supervisor.

pub mod descriptor;
pub mod env;
pub mod error;
pub mod loader;
pub mod resolve;

pub use descriptor::{Declaration, ExecutionMode, LaunchDescriptor, SpawnPlan};
pub use env::EnvSnapshot;
pub use error::{LoadError, Result};
pub use loader::{Loader, load, load_ecosystem};
