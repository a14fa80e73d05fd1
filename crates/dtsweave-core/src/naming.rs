//! Entity naming and canonical namespace paths.
//!
//! The extractor and the rewriters both go through these functions so they
//! always agree on what a declaration is exported as and what a module is
//! called in the merged output.

use crate::syntax::{Declaration, ImportEquals};
use crate::types::NamedExportItem;
use std::path::{Component, Path};

/// Extensions recognised as declaration files, longest first.
const MODULE_EXTENSIONS: &[&str] = &[
    ".d.ts", ".d.mts", ".d.cts", ".tsx", ".mts", ".cts", ".ts",
];

/// Exported names of a declaration.
///
/// Default-marked or anonymous declarations are exported as `default`, with
/// the declaration name (if any) as the declared name. Variable statements
/// yield one item per declarator.
pub fn entity_names(decl: &Declaration) -> Vec<NamedExportItem> {
    if decl.modifiers.default || (!decl.is_variable() && decl.name.is_none()) {
        return vec![NamedExportItem::new("default", decl.name.as_deref())];
    }
    decl.local_names()
        .into_iter()
        .map(|name| NamedExportItem::new(name, None))
        .collect()
}

/// Exported name of an `export import X = ...` alias.
pub fn alias_entity_name(import: &ImportEquals) -> NamedExportItem {
    NamedExportItem::new(import.name.clone(), None)
}

/// Name of the local symbol backing a declaration; anonymous defaults are
/// keyed as `default`.
pub fn symbol_keys(decl: &Declaration) -> Vec<String> {
    let names = decl.local_names();
    if names.is_empty() {
        return vec!["default".to_string()];
    }
    names.into_iter().map(str::to_string).collect()
}

/// Spells an export name as an identifier, mapping `default` to `default_name`.
pub fn identifier_name<'a>(name: &'a str, default_name: &'a str) -> &'a str {
    if name == "default" {
        default_name
    } else {
        name
    }
}

/// Replaces characters that cannot appear in an identifier.
pub fn sanitize_identifier(segment: &str) -> String {
    let mut out: String = segment
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '$' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if out.is_empty() || out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}

/// Strips a declaration extension from a file name.
pub fn strip_module_extension(file_name: &str) -> &str {
    MODULE_EXTENSIONS
        .iter()
        .find_map(|ext| file_name.strip_suffix(ext))
        .filter(|stem| !stem.is_empty())
        .unwrap_or(file_name)
}

/// `/`-separated path of `target` relative to `base`, without extension.
///
/// Files outside `base` keep their path components after the common prefix,
/// with each `..` spelled out as `__`.
pub fn module_relative_name(base: &Path, target: &Path) -> String {
    let relative = relative_components(base, target);
    let last = relative.len().saturating_sub(1);
    relative
        .iter()
        .enumerate()
        .map(|(i, segment)| {
            if i == last {
                strip_module_extension(segment).to_string()
            } else {
                segment.clone()
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Dotted namespace path of a bundled file, `MyLib.sub.file`.
pub fn namespace_name(module_name: &str, base: &Path, target: &Path) -> String {
    let mut segments = vec![namespace_root(module_name)];
    segments.extend(
        module_relative_name(base, target)
            .split('/')
            .filter(|s| !s.is_empty())
            .map(sanitize_identifier),
    );
    segments.join(".")
}

/// Namespace root derived from the output module name; `@scope/pkg` becomes
/// `scope.pkg`.
pub fn namespace_root(module_name: &str) -> String {
    let parts: Vec<String> = module_name
        .split('/')
        .map(|p| p.trim_start_matches('@'))
        .filter(|p| !p.is_empty())
        .map(sanitize_identifier)
        .collect();
    if parts.is_empty() {
        sanitize_identifier(module_name)
    } else {
        parts.join(".")
    }
}

fn relative_components(base: &Path, target: &Path) -> Vec<String> {
    let base: Vec<Component<'_>> = base.components().collect();
    let target: Vec<Component<'_>> = target.components().collect();
    let common = base
        .iter()
        .zip(target.iter())
        .take_while(|(a, b)| a == b)
        .count();
    let ups = base.len() - common;
    std::iter::repeat_n("__".to_string(), ups)
        .chain(
            target[common..]
                .iter()
                .map(|c| c.as_os_str().to_string_lossy().into_owned()),
        )
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::{DeclarationKind, VariableDeclarator, VariableKind};

    #[test]
    fn test_entity_names_named_declaration() {
        let decl =
            Declaration::new(DeclarationKind::Class, Some("Foo"), "class Foo {}").exported();
        assert_eq!(entity_names(&decl), vec![NamedExportItem::new("Foo", None)]);
    }

    #[test]
    fn test_entity_names_default_and_anonymous() {
        let named_default =
            Declaration::new(DeclarationKind::Class, Some("Foo"), "class Foo {}").as_default();
        assert_eq!(
            entity_names(&named_default),
            vec![NamedExportItem::new("default", Some("Foo"))]
        );

        let anonymous =
            Declaration::new(DeclarationKind::Function, None, "function(): void;").as_default();
        assert_eq!(
            entity_names(&anonymous),
            vec![NamedExportItem::new("default", None)]
        );
        assert_eq!(symbol_keys(&anonymous), vec!["default".to_string()]);
    }

    #[test]
    fn test_entity_names_variable_declarators() {
        let decl = Declaration::variable(
            VariableKind::Const,
            vec![
                VariableDeclarator::new("a", "a: 1", &[]),
                VariableDeclarator::new("b", "b: 2", &[]),
            ],
        )
        .exported();
        let names: Vec<String> = entity_names(&decl)
            .into_iter()
            .map(|i| i.exported_name)
            .collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_identifier_name_maps_default() {
        assert_eq!(identifier_name("default", "_default"), "_default");
        assert_eq!(identifier_name("Foo", "_default"), "Foo");
    }

    #[test]
    fn test_sanitize_identifier() {
        assert_eq!(sanitize_identifier("my-lib"), "my_lib");
        assert_eq!(sanitize_identifier("2d"), "_2d");
        assert_eq!(sanitize_identifier("file.name"), "file_name");
    }

    #[test]
    fn test_strip_module_extension() {
        assert_eq!(strip_module_extension("index.d.ts"), "index");
        assert_eq!(strip_module_extension("util.ts"), "util");
        assert_eq!(strip_module_extension("types.d.mts"), "types");
        assert_eq!(strip_module_extension("README"), "README");
    }

    #[test]
    fn test_module_relative_name() {
        let base = Path::new("/p/src");
        assert_eq!(
            module_relative_name(base, Path::new("/p/src/a/b.d.ts")),
            "a/b"
        );
        assert_eq!(
            module_relative_name(base, Path::new("/p/shared.d.ts")),
            "__/shared"
        );
        assert_eq!(
            module_relative_name(base, Path::new("/p/src/v1.2/x.d.ts")),
            "v1.2/x"
        );
    }

    #[test]
    fn test_namespace_name() {
        let base = Path::new("/p");
        assert_eq!(
            namespace_name("my-lib", base, Path::new("/p/sub/index.d.ts")),
            "my_lib.sub.index"
        );
        assert_eq!(
            namespace_name("@scope/pkg", base, Path::new("/p/a.d.ts")),
            "scope.pkg.a"
        );
    }
}
