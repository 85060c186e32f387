// SPDX-License-Identifier: PMPL-1.0-or-later
//! Snapshot scanners.
//!
//! Each scanner walks a [`Document`] once and returns a complete
//! [`Snapshot`]. Scanners hold only their options; all traversal state is
//! local to a call, so one scanner can be reused across documents and
//! threads.

pub mod focus;
pub mod name;
pub mod structure;
pub mod tab_order;

use crate::config::Config;
use crate::dom::Document;
use crate::identity::HashAlgorithm;
use crate::snapshot::{Snapshot, SnapshotKind};
use structure::ScanOptions;

/// Trait implemented by all scanners
pub trait Scanner: Send + Sync {
    /// Human-readable name of this scanner
    fn name(&self) -> &str;

    /// Kind of snapshot this scanner produces
    fn kind(&self) -> SnapshotKind;

    /// Scan a document
    fn scan(&self, doc: &Document) -> Snapshot;
}

/// Landmark, heading and other structural elements
#[derive(Debug, Clone, Default)]
pub struct StructureScanner {
    pub options: ScanOptions,
}

impl Scanner for StructureScanner {
    fn name(&self) -> &str {
        "Structure Scanner"
    }

    fn kind(&self) -> SnapshotKind {
        SnapshotKind::Structure
    }

    fn scan(&self, doc: &Document) -> Snapshot {
        structure::scan(doc, &self.options)
    }
}

/// Sequential keyboard focus order
#[derive(Debug, Clone, Default)]
pub struct TabOrderScanner {
    pub hash: HashAlgorithm,
}

impl Scanner for TabOrderScanner {
    fn name(&self) -> &str {
        "Tab Order Scanner"
    }

    fn kind(&self) -> SnapshotKind {
        SnapshotKind::TabOrder
    }

    fn scan(&self, doc: &Document) -> Snapshot {
        tab_order::scan(doc, self.hash)
    }
}

/// Scanner for a snapshot kind, configured from `config`
pub fn scanner_for(kind: SnapshotKind, config: &Config) -> Box<dyn Scanner> {
    match kind {
        SnapshotKind::Structure => Box::new(StructureScanner {
            options: config.scan_options(),
        }),
        SnapshotKind::TabOrder => Box::new(TabOrderScanner {
            hash: config.identity.algorithm,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scanner_for_kind() {
        let config = Config::default();
        for kind in [SnapshotKind::Structure, SnapshotKind::TabOrder] {
            let scanner = scanner_for(kind, &config);
            assert_eq!(scanner.kind(), kind);
            let doc = Document::parse("<body><nav><a href=\"/\">Home</a></nav></body>");
            let snapshot = scanner.scan(&doc);
            assert_eq!(snapshot.kind(), kind);
            assert_eq!(snapshot.len(), 1);
        }
    }
}
