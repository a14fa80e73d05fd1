//! dtsweave core - reachability analysis and namespace merging for declaration bundles.
//!
//! This crate takes a set of parsed TypeScript declaration modules and turns
//! them into a single public declaration surface. It defines:
//!
//! - [`SourceModule`]: the declaration model every pass consumes
//! - [`extract_edges`]: import/export edge extraction for one module
//! - [`ModuleGraph`]: the resolved module graph of a bundling run
//! - [`analyze_reachability`]: the export reachability fixpoint
//! - [`find_dead_symbols`]: per-module leaf-pruning of unreferenced declarations
//! - [`bundle`]: the full pipeline producing output files
//!
//! # Architecture
//!
//! Parsing and module resolution are collaborators supplied through the
//! traits in [`backend`]:
//!
//! ```text
//! ┌─────────────────────┐
//! │    dtsweave-cli     │  (User interface)
//! └──────────┬──────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │ dtsweave-backend-ts │  (oxc parser + resolver, file discovery)
//! └──────────┬──────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │    dtsweave-core    │  (This crate - graph analysis and emission)
//! └─────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use dtsweave_core::{bundle, BundleOptions, FileSetResolver, SourceModule};
//!
//! let modules: Vec<SourceModule> = Vec::new(); // produced by a DeclarationParser
//! let options = BundleOptions::new("index.d.ts", "my-lib");
//! let resolver = FileSetResolver::from_modules(&modules);
//!
//! let output = bundle(&modules, &options, &resolver)?;
//! for (path, text) in &output.files {
//!     println!("{}: {} bytes", path.display(), text.len());
//! }
//! # Ok::<(), dtsweave_core::Error>(())
//! ```

pub mod backend;
pub mod bundle;
pub mod circular_deps;
pub mod error;
pub mod extract;
pub mod graph;
pub mod naming;
pub mod printer;
pub mod reachability;
pub mod report;
pub mod rewrite;
pub mod strip;
pub mod symbols;
pub mod syntax;
pub mod types;

// Re-export core types for convenience
pub use backend::{
    CachingResolver, DeclarationParser, FileSetResolver, ModuleResolver, ResolvedModule,
};
pub use bundle::{bundle, StripOutcome};
pub use error::{ConfigurationError, Error, Result};
pub use extract::extract_edges;
pub use graph::{EdgeTarget, ModuleGraph, ModuleId};
pub use reachability::{analyze_reachability, Reachability, UnusedExport};
pub use report::{list_report, ListOptions, ListReport};
pub use symbols::find_dead_symbols;
pub use syntax::{
    Declaration, DeclarationKind, ExportAll, ExportAssignment, ExportList, ExportSpecifier,
    ImportDeclaration, ImportEquals, ImportSpecifier, ModuleReference, Modifiers, SourceModule,
    Statement, VariableDeclarator, VariableKind,
};
pub use types::{
    BundleOptions, BundleOutput, BundleStatistics, DeclarationStyle, Diagnostic, DiagnosticKind,
    ExportEdge, ImportEdge, ImportedName, LineEnding, ModuleEdges, NamedExportItem,
};
