// SPDX-License-Identifier: PMPL-1.0-or-later
//! Snapshot data model.
//!
//! Records are produced fresh by every scan and never mutated afterwards;
//! the diff engine clones what it reports. Field names serialize in
//! camelCase, matching envelopes persisted by the browser extension, and
//! every record field has a default so older or hand-written envelopes
//! still parse.

use crate::dom::Rect;
use crate::error::{DiffError, Side};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use uuid::Uuid;

/// Closed classification of structural elements
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StructuralKind {
    Heading,
    Landmark,
    Table,
    Label,
    Iframe,
    LiveRegion,
    Button,
    Menu,
    Alert,
    Search,
    Navigation,
    Main,
    Footer,
    Aside,
    Header,
    Form,
    #[default]
    Other,
}

impl StructuralKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StructuralKind::Heading => "heading",
            StructuralKind::Landmark => "landmark",
            StructuralKind::Table => "table",
            StructuralKind::Label => "label",
            StructuralKind::Iframe => "iframe",
            StructuralKind::LiveRegion => "live-region",
            StructuralKind::Button => "button",
            StructuralKind::Menu => "menu",
            StructuralKind::Alert => "alert",
            StructuralKind::Search => "search",
            StructuralKind::Navigation => "navigation",
            StructuralKind::Main => "main",
            StructuralKind::Footer => "footer",
            StructuralKind::Aside => "aside",
            StructuralKind::Header => "header",
            StructuralKind::Form => "form",
            StructuralKind::Other => "other",
        }
    }
}

impl std::fmt::Display for StructuralKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Iframe a nested record was found in
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameInfo {
    pub src: String,
    pub title: String,
}

/// One accessibility-relevant element found by the structure scan
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StructuralRecord {
    pub identity_key: String,
    #[serde(rename = "type")]
    pub kind: StructuralKind,
    pub tag: String,
    pub role: Option<String>,
    pub name: Option<String>,
    /// Discovery order within one scan; not stable across DOM changes
    pub dom_index: usize,
    pub path: String,
    pub rect: Option<Rect>,
    /// Structural nesting depth, not DOM depth
    pub level: usize,
    pub in_shadow: bool,
    pub frame: Option<FrameInfo>,
    pub attributes: BTreeMap<String, String>,
}

impl StructuralRecord {
    /// Key used to match records across snapshots
    pub fn match_key(&self) -> String {
        if !self.identity_key.is_empty() {
            return self.identity_key.clone();
        }
        format!(
            "{}|{}|{}",
            self.tag,
            self.role.as_deref().unwrap_or(""),
            self.name.as_deref().unwrap_or("")
        )
    }
}

/// One element in the keyboard focus sequence
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TabOrderRecord {
    /// Derived from path, role and name; never from order
    pub identity_key: String,
    /// 1-based position in the focus sequence
    pub order: u32,
    pub role: String,
    pub name: String,
    pub tabindex: Option<i32>,
    pub path: String,
    pub bounding_box: Option<Rect>,
}

impl TabOrderRecord {
    /// Key used to match records across snapshots
    pub fn match_key(&self) -> String {
        if !self.identity_key.is_empty() {
            return self.identity_key.clone();
        }
        format!("{}|{}|{}", self.path, self.role, self.name)
    }
}

/// Which scan produced a snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SnapshotKind {
    Structure,
    TabOrder,
}

impl std::fmt::Display for SnapshotKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SnapshotKind::Structure => write!(f, "structure"),
            SnapshotKind::TabOrder => write!(f, "tab-order"),
        }
    }
}

impl std::str::FromStr for SnapshotKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "structure" => Ok(SnapshotKind::Structure),
            "tab-order" | "taborder" | "tab_order" => Ok(SnapshotKind::TabOrder),
            other => Err(format!("Unknown snapshot kind: {}", other)),
        }
    }
}

/// Structure scan output
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StructureScan {
    pub structural_elements: Vec<StructuralRecord>,
    /// The record cap stopped traversal early
    pub truncated: bool,
    /// Closed shadow roots that could not be entered
    pub shadow_roots_skipped: usize,
}

/// Records of one snapshot; the variant is the snapshot kind
#[derive(Debug, Clone, PartialEq)]
pub enum SnapshotData {
    Structure(StructureScan),
    TabOrder(Vec<TabOrderRecord>),
}

/// A complete capture of one page
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub url: String,
    pub title: String,
    pub timestamp: DateTime<Utc>,
    pub data: SnapshotData,
}

impl Snapshot {
    pub fn structure(url: &str, title: &str, scan: StructureScan) -> Self {
        Self {
            url: url.to_string(),
            title: title.to_string(),
            timestamp: Utc::now(),
            data: SnapshotData::Structure(scan),
        }
    }

    pub fn tab_order(url: &str, title: &str, records: Vec<TabOrderRecord>) -> Self {
        Self {
            url: url.to_string(),
            title: title.to_string(),
            timestamp: Utc::now(),
            data: SnapshotData::TabOrder(records),
        }
    }

    pub fn kind(&self) -> SnapshotKind {
        match self.data {
            SnapshotData::Structure(_) => SnapshotKind::Structure,
            SnapshotData::TabOrder(_) => SnapshotKind::TabOrder,
        }
    }

    /// Record count
    pub fn len(&self) -> usize {
        match &self.data {
            SnapshotData::Structure(scan) => scan.structural_elements.len(),
            SnapshotData::TabOrder(records) => records.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn structural_elements(&self) -> Option<&[StructuralRecord]> {
        match &self.data {
            SnapshotData::Structure(scan) => Some(&scan.structural_elements),
            SnapshotData::TabOrder(_) => None,
        }
    }

    pub fn tab_order_records(&self) -> Option<&[TabOrderRecord]> {
        match &self.data {
            SnapshotData::TabOrder(records) => Some(records),
            SnapshotData::Structure(_) => None,
        }
    }

    /// Wrap for storage
    pub fn to_envelope(&self, viewport: Viewport) -> crate::error::Result<SnapshotEnvelope> {
        let (data, truncated, shadow_roots_skipped) = match &self.data {
            SnapshotData::Structure(scan) => (
                serde_json::to_value(&scan.structural_elements)?,
                scan.truncated,
                scan.shadow_roots_skipped,
            ),
            SnapshotData::TabOrder(records) => (serde_json::to_value(records)?, false, 0),
        };
        Ok(SnapshotEnvelope {
            id: Uuid::new_v4().to_string(),
            timestamp: self.timestamp,
            url: self.url.clone(),
            title: self.title.clone(),
            kind: self.kind(),
            data,
            viewport,
            truncated,
            shadow_roots_skipped,
        })
    }
}

/// Viewport size at capture time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 800,
        }
    }
}

/// Persisted snapshot: `{id, timestamp, url, title, type, data, viewport}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotEnvelope {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(rename = "type")]
    pub kind: SnapshotKind,
    /// Raw record array
    #[serde(default)]
    pub data: serde_json::Value,
    #[serde(default)]
    pub viewport: Viewport,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub truncated: bool,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub shadow_roots_skipped: usize,
}

fn is_zero(n: &usize) -> bool {
    *n == 0
}

impl SnapshotEnvelope {
    /// Parse a stored envelope; a missing or unknown `type` is rejected
    pub fn from_json(json: &str, side: Side) -> Result<Self, DiffError> {
        serde_json::from_str(json).map_err(|e| DiffError::InvalidEnvelope {
            side,
            reason: e.to_string(),
        })
    }

    /// Read and parse a stored envelope file
    pub fn load(path: &Path, side: Side) -> Result<Self, DiffError> {
        let json = std::fs::read_to_string(path).map_err(|e| DiffError::InvalidEnvelope {
            side,
            reason: format!("cannot read {}: {}", path.display(), e),
        })?;
        Self::from_json(&json, side)
    }

    /// Decode the raw data array into typed records
    pub fn to_snapshot(&self, side: Side) -> Result<Snapshot, DiffError> {
        if self.data.is_null() {
            return Err(DiffError::Missing(side));
        }
        let malformed = |e: serde_json::Error| DiffError::Malformed {
            kind: self.kind,
            reason: e.to_string(),
        };
        let data = match self.kind {
            SnapshotKind::Structure => SnapshotData::Structure(StructureScan {
                structural_elements: serde_json::from_value(self.data.clone()).map_err(malformed)?,
                truncated: self.truncated,
                shadow_roots_skipped: self.shadow_roots_skipped,
            }),
            SnapshotKind::TabOrder => {
                SnapshotData::TabOrder(serde_json::from_value(self.data.clone()).map_err(malformed)?)
            }
        };
        Ok(Snapshot {
            url: self.url.clone(),
            title: self.title.clone(),
            timestamp: self.timestamp,
            data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_serde_names() {
        assert_eq!(serde_json::to_string(&SnapshotKind::TabOrder).unwrap(), "\"tab-order\"");
        assert_eq!(serde_json::to_string(&StructuralKind::LiveRegion).unwrap(), "\"live-region\"");
        assert_eq!("tab-order".parse::<SnapshotKind>().unwrap(), SnapshotKind::TabOrder);
        assert!("table".parse::<SnapshotKind>().is_err());
    }

    #[test]
    fn test_sparse_record_parses() {
        let record: StructuralRecord =
            serde_json::from_str(r#"{"tag":"h1","path":"/html/body[1]/h1[1]","name":"Title"}"#).unwrap();
        assert_eq!(record.kind, StructuralKind::Other);
        assert_eq!(record.match_key(), "h1||Title");
    }

    #[test]
    fn test_tab_record_fallback_key() {
        let record: TabOrderRecord = serde_json::from_str(r#"{"role":"Link","name":"A","order":1}"#).unwrap();
        assert_eq!(record.match_key(), "|Link|A");
        let keyed = TabOrderRecord {
            identity_key: "abc".to_string(),
            ..record
        };
        assert_eq!(keyed.match_key(), "abc");
    }

    #[test]
    fn test_envelope_shape() {
        let snapshot = Snapshot::tab_order(
            "https://example.com/",
            "Example",
            vec![TabOrderRecord {
                identity_key: "k".to_string(),
                order: 1,
                role: "Link".to_string(),
                name: "Home".to_string(),
                ..Default::default()
            }],
        );
        let envelope = snapshot.to_envelope(Viewport::default()).unwrap();
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["type"], "tab-order");
        assert_eq!(json["viewport"]["width"], 1280);
        assert_eq!(json["data"][0]["identityKey"], "k");
        assert!(json.get("truncated").is_none());

        let back = envelope.to_snapshot(Side::Old).unwrap();
        assert_eq!(back.tab_order_records().unwrap().len(), 1);
    }

    #[test]
    fn test_null_data_is_missing() {
        let envelope = SnapshotEnvelope {
            id: "1".to_string(),
            timestamp: Utc::now(),
            url: String::new(),
            title: String::new(),
            kind: SnapshotKind::Structure,
            data: serde_json::Value::Null,
            viewport: Viewport::default(),
            truncated: false,
            shadow_roots_skipped: 0,
        };
        assert_eq!(envelope.to_snapshot(Side::New), Err(DiffError::Missing(Side::New)));
    }

    #[test]
    fn test_envelope_without_type_rejected() {
        let err = SnapshotEnvelope::from_json(r#"{"id":"1","timestamp":"2026-01-01T00:00:00Z","data":[]}"#, Side::New)
            .unwrap_err();
        assert!(matches!(err, DiffError::InvalidEnvelope { side: Side::New, .. }));
        assert!(err.to_string().contains("type"));

        let unknown = SnapshotEnvelope::from_json(
            r#"{"id":"1","timestamp":"2026-01-01T00:00:00Z","type":"colour","data":[]}"#,
            Side::Old,
        );
        assert!(matches!(unknown, Err(DiffError::InvalidEnvelope { side: Side::Old, .. })));
    }

    #[test]
    fn test_load_unreadable_envelope() {
        let err = SnapshotEnvelope::load(Path::new("/nonexistent/old.json"), Side::Old).unwrap_err();
        assert!(matches!(err, DiffError::InvalidEnvelope { side: Side::Old, .. }));
    }

    #[test]
    fn test_malformed_data() {
        let envelope: SnapshotEnvelope = serde_json::from_str(
            r#"{"id":"1","timestamp":"2026-01-01T00:00:00Z","type":"tab-order","data":{"not":"an array"}}"#,
        )
        .unwrap();
        assert!(matches!(
            envelope.to_snapshot(Side::Old),
            Err(DiffError::Malformed { kind: SnapshotKind::TabOrder, .. })
        ));
    }
}
