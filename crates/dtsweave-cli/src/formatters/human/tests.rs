//! Tests for the human formatter output.

use super::*;
use dtsweave_core::circular_deps::ImportCycle;
use dtsweave_core::report::{
    ExportKind, ExportListing, ImportListing, ModuleListing, Resolution, UnusedListing,
};
use dtsweave_core::{BundleStatistics, DiagnosticKind};
use std::path::PathBuf;

fn report() -> ListReport {
    ListReport {
        modules: vec![
            ModuleListing {
                path: PathBuf::from("/p/index.d.ts"),
                is_module: true,
                imports: vec![
                    ImportListing {
                        specifier: "./b".to_string(),
                        binding: Some("B".to_string()),
                        resolution: Resolution::Internal {
                            path: PathBuf::from("/p/b.d.ts"),
                        },
                    },
                    ImportListing {
                        specifier: "./gone".to_string(),
                        binding: None,
                        resolution: Resolution::Unresolved,
                    },
                ],
                exports: vec![ExportListing {
                    kind: ExportKind::Local,
                    names: vec!["Api".to_string(), "Extra".to_string()],
                    specifier: None,
                }],
            },
            ModuleListing {
                path: PathBuf::from("/p/b.d.ts"),
                is_module: true,
                imports: vec![],
                exports: vec![ExportListing {
                    kind: ExportKind::ReExport,
                    names: vec![],
                    specifier: Some("./c".to_string()),
                }],
            },
        ],
        unused: vec![UnusedListing {
            path: PathBuf::from("/p/index.d.ts"),
            exports: vec!["Extra".to_string()],
            symbols: vec![],
            star_reexports: vec![],
            whole_file: false,
        }],
        cycles: vec![ImportCycle {
            modules: vec![PathBuf::from("/p/b.d.ts"), PathBuf::from("/p/index.d.ts")],
        }],
        diagnostics: vec![Diagnostic::new(
            DiagnosticKind::UnresolvableReference,
            Path::new("/p/index.d.ts"),
            "cannot resolve './gone'",
        )],
    }
}

#[test]
fn test_list_output_sections() {
    colored::control::set_override(false);
    let text = render_list(&report(), Path::new("/p"));

    assert!(text.contains("📄 Files (2):"));
    assert!(text.contains("    ← B from './b' (b.d.ts)"));
    assert!(text.contains("    ← './gone' (unresolved)"));
    assert!(text.contains("    → Api, Extra"));
    assert!(text.contains("    → * from './c'"));
    assert!(text.contains("📤 Unused exports (1):"));
    assert!(text.contains("    exports: Extra"));
    assert!(text.contains("Cycle 1: b.d.ts ↔ index.d.ts"));
    assert!(text.contains("index.d.ts [unresolvable-reference]: cannot resolve './gone'"));
}

#[test]
fn test_empty_sections_are_omitted() {
    colored::control::set_override(false);
    let report = ListReport {
        modules: vec![],
        ..report()
    };
    let report = ListReport {
        unused: vec![],
        cycles: vec![],
        diagnostics: vec![],
        ..report
    };
    let text = render_list(&report, Path::new("/p"));
    assert!(text.contains("📄 Files (0):"));
    assert!(!text.contains("Unused"));
    assert!(!text.contains("cycles"));
    assert!(!text.contains("Warnings"));
}

#[test]
fn test_pack_summary() {
    colored::control::set_override(false);
    let summary = PackSummary {
        module_name: "lib".to_string(),
        files: vec![PathBuf::from("dist/lib.d.ts")],
        written: false,
        diagnostics: vec![],
        statistics: BundleStatistics {
            modules: 3,
            rounds: 2,
            stripped_exports: 4,
            dead_symbols: 1,
            external_modules: 0,
        },
        duration_ms: 5,
    };
    let text = render_pack(&summary);
    assert!(text.starts_with("✓ lib (3 modules, 5ms)\n"));
    assert!(text.contains("  Would write dist/lib.d.ts\n"));
    assert!(text.contains("Stripped 4 unused exports and 1 dead declarations in 2 rounds"));
    assert!(!text.contains("External modules"));
}

#[test]
fn test_relative_paths() {
    assert_eq!(relative(Path::new("/p/src/a.d.ts"), Path::new("/p")), "src/a.d.ts");
    assert_eq!(relative(Path::new("/elsewhere/a.d.ts"), Path::new("/p")), "/elsewhere/a.d.ts");
}
