//! TypeScript declaration backend for dtsweave.
//!
//! This crate supplies the collaborators the core pipeline leaves open:
//! an oxc-based [`DeclarationParser`](dtsweave_core::DeclarationParser), a
//! Node-style [`ModuleResolver`](dtsweave_core::ModuleResolver) and
//! declaration file discovery. [`TsBackend`] ties them together.
//!
//! # Example
//!
//! ```no_run
//! use dtsweave_backend_ts::TsBackend;
//! use dtsweave_core::{BundleOptions, DeclarationStyle};
//! use std::path::Path;
//!
//! let mut options = BundleOptions::new("index.d.ts", "my-lib");
//! options.style = DeclarationStyle::Namespace;
//!
//! let output = TsBackend::new().bundle(Path::new("."), &options)?;
//! for diagnostic in &output.diagnostics {
//!     eprintln!("{}", diagnostic.message);
//! }
//! # Ok::<(), dtsweave_backend_ts::BackendError>(())
//! ```

pub mod backend;
pub mod error;
pub mod file_discovery;
pub mod parser;
pub mod references;
pub mod resolver;

pub use backend::{Project, TsBackend};
pub use error::{BackendError, Result};
pub use file_discovery::{discover_declaration_files, DiscoveryConfig};
pub use parser::OxcDeclarationParser;
pub use resolver::{NodeModuleResolver, ResolverSettings};
