//! Identifier references of a declaration.

use oxc_ast::ast::IdentifierReference;
use oxc_ast_visit::Visit;
use std::collections::BTreeSet;

/// Collects the names of every identifier reference it visits, in type and
/// value positions alike.
#[derive(Debug, Default)]
pub struct ReferenceCollector {
    names: BTreeSet<String>,
}

impl<'a> Visit<'a> for ReferenceCollector {
    fn visit_identifier_reference(&mut self, it: &IdentifierReference<'a>) {
        self.names.insert(it.name.to_string());
    }
}

impl ReferenceCollector {
    pub fn into_names(self) -> BTreeSet<String> {
        self.names
    }
}

/// Runs `walk` with a fresh collector and returns what it found.
pub fn collect_references(walk: impl FnOnce(&mut ReferenceCollector)) -> BTreeSet<String> {
    let mut collector = ReferenceCollector::default();
    walk(&mut collector);
    collector.into_names()
}
