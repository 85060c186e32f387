// SPDX-License-Identifier: PMPL-1.0-or-later
//! Snapshot comparison.
//!
//! Records are matched by identity key, never by position. Tab order diffs
//! match multiplicity pairwise in list order and report position changes
//! separately; structure diffs are a plain key set difference.

use crate::error::{DiffError, Side};
use crate::snapshot::{
    Snapshot, SnapshotData, SnapshotEnvelope, SnapshotKind, StructuralRecord, TabOrderRecord,
};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::debug;

/// A tab stop present on both sides at different positions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderChange {
    #[serde(flatten)]
    pub record: TabOrderRecord,
    pub old_order: u32,
    pub new_order: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructureDiff {
    pub added: Vec<StructuralRecord>,
    /// Removed records keep the rect they had when last captured
    pub removed: Vec<StructuralRecord>,
    pub total_old: usize,
    pub total_new: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabOrderDiff {
    pub added: Vec<TabOrderRecord>,
    pub removed: Vec<TabOrderRecord>,
    pub changed: Vec<OrderChange>,
    pub total_old: usize,
    pub total_new: usize,
}

/// Result of comparing two snapshots of the same kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Diff {
    Structure(StructureDiff),
    TabOrder(TabOrderDiff),
}

impl Diff {
    pub fn kind(&self) -> SnapshotKind {
        match self {
            Diff::Structure(_) => SnapshotKind::Structure,
            Diff::TabOrder(_) => SnapshotKind::TabOrder,
        }
    }

    /// Nothing added, removed or moved
    pub fn is_empty(&self) -> bool {
        match self {
            Diff::Structure(d) => d.added.is_empty() && d.removed.is_empty(),
            Diff::TabOrder(d) => d.added.is_empty() && d.removed.is_empty() && d.changed.is_empty(),
        }
    }

    pub fn added_count(&self) -> usize {
        match self {
            Diff::Structure(d) => d.added.len(),
            Diff::TabOrder(d) => d.added.len(),
        }
    }

    pub fn removed_count(&self) -> usize {
        match self {
            Diff::Structure(d) => d.removed.len(),
            Diff::TabOrder(d) => d.removed.len(),
        }
    }

    pub fn changed_count(&self) -> usize {
        match self {
            Diff::Structure(_) => 0,
            Diff::TabOrder(d) => d.changed.len(),
        }
    }

    pub fn totals(&self) -> (usize, usize) {
        match self {
            Diff::Structure(d) => (d.total_old, d.total_new),
            Diff::TabOrder(d) => (d.total_old, d.total_new),
        }
    }
}

/// Compare two snapshots of the same kind
pub fn compare(old: &Snapshot, new: &Snapshot) -> Result<Diff, DiffError> {
    let diff = match (&old.data, &new.data) {
        (SnapshotData::Structure(a), SnapshotData::Structure(b)) => {
            Diff::Structure(compare_structure(&a.structural_elements, &b.structural_elements))
        }
        (SnapshotData::TabOrder(a), SnapshotData::TabOrder(b)) => Diff::TabOrder(compare_tab_order(a, b)),
        _ => {
            return Err(DiffError::KindMismatch {
                old: old.kind(),
                new: new.kind(),
            })
        }
    };

    debug!(
        kind = %diff.kind(),
        added = diff.added_count(),
        removed = diff.removed_count(),
        changed = diff.changed_count(),
        "Compared snapshots"
    );
    Ok(diff)
}

/// Compare two persisted envelopes
///
/// Either side may be absent, e.g. when nothing has been stored yet.
pub fn compare_scans(
    old: Option<&SnapshotEnvelope>,
    new: Option<&SnapshotEnvelope>,
) -> Result<Diff, DiffError> {
    let old = old.ok_or(DiffError::Missing(Side::Old))?;
    let new = new.ok_or(DiffError::Missing(Side::New))?;
    if old.kind != new.kind {
        return Err(DiffError::KindMismatch {
            old: old.kind,
            new: new.kind,
        });
    }
    compare(&old.to_snapshot(Side::Old)?, &new.to_snapshot(Side::New)?)
}

/// Identity-matched tab order comparison
pub fn compare_tab_order(old: &[TabOrderRecord], new: &[TabOrderRecord]) -> TabOrderDiff {
    let old_keys: Vec<String> = old.iter().map(TabOrderRecord::match_key).collect();
    let new_keys: Vec<String> = new.iter().map(TabOrderRecord::match_key).collect();

    let removed = excess(old, &old_keys, &new_keys);
    let added = excess(new, &new_keys, &old_keys);

    // Old positions per key, in list order
    let mut candidates: HashMap<&str, VecDeque<&TabOrderRecord>> = HashMap::new();
    for (record, key) in old.iter().zip(&old_keys) {
        candidates.entry(key.as_str()).or_default().push_back(record);
    }

    let mut consumed: HashSet<(&str, u32)> = HashSet::new();
    let mut changed = Vec::new();
    for (record, key) in new.iter().zip(&new_keys) {
        let key = key.as_str();
        let Some(queue) = candidates.get_mut(key) else {
            continue;
        };
        while queue.front().is_some_and(|front| consumed.contains(&(key, front.order))) {
            queue.pop_front();
        }
        let Some(previous) = queue.pop_front() else {
            continue;
        };
        consumed.insert((key, previous.order));
        if previous.order != record.order {
            changed.push(OrderChange {
                record: record.clone(),
                old_order: previous.order,
                new_order: record.order,
            });
        }
    }

    TabOrderDiff {
        added,
        removed,
        changed,
        total_old: old.len(),
        total_new: new.len(),
    }
}

/// Records of `side` beyond the number of same-key records on `other`,
/// taken in list order
fn excess(side: &[TabOrderRecord], side_keys: &[String], other_keys: &[String]) -> Vec<TabOrderRecord> {
    let mut available: HashMap<&str, usize> = HashMap::new();
    for key in other_keys {
        *available.entry(key.as_str()).or_default() += 1;
    }

    let mut seen: HashMap<&str, usize> = HashMap::new();
    side.iter()
        .zip(side_keys)
        .filter(|(_, key)| {
            let occurrence = seen.entry(key.as_str()).or_default();
            *occurrence += 1;
            *occurrence > available.get(key.as_str()).copied().unwrap_or(0)
        })
        .map(|(record, _)| record.clone())
        .collect()
}

/// Key set difference of structural records
pub fn compare_structure(old: &[StructuralRecord], new: &[StructuralRecord]) -> StructureDiff {
    let old_map = keyed(old);
    let new_map = keyed(new);

    let removed = old_map
        .iter()
        .filter(|(key, _)| !new_map.contains(key))
        .map(|(_, record)| record.clone())
        .collect();
    let added = new_map
        .iter()
        .filter(|(key, _)| !old_map.contains(key))
        .map(|(_, record)| record.clone())
        .collect();

    StructureDiff {
        added,
        removed,
        total_old: old.len(),
        total_new: new.len(),
    }
}

/// Insertion-ordered key map; a repeated key keeps its first position and
/// its last record
struct KeyedRecords<'a> {
    entries: Vec<(String, &'a StructuralRecord)>,
    index: HashMap<String, usize>,
}

impl<'a> KeyedRecords<'a> {
    fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    fn iter(&self) -> impl Iterator<Item = (&str, &'a StructuralRecord)> + '_ {
        self.entries.iter().map(|(key, record)| (key.as_str(), *record))
    }
}

fn keyed(records: &[StructuralRecord]) -> KeyedRecords<'_> {
    let mut map = KeyedRecords {
        entries: Vec::with_capacity(records.len()),
        index: HashMap::with_capacity(records.len()),
    };
    for record in records {
        let key = record.match_key();
        match map.index.get(&key) {
            Some(&slot) => map.entries[slot].1 = record,
            None => {
                map.index.insert(key.clone(), map.entries.len());
                map.entries.push((key, record));
            }
        }
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Rect;
    use crate::snapshot::{StructureScan, Viewport};

    fn tab(role: &str, name: &str, order: u32) -> TabOrderRecord {
        TabOrderRecord {
            order,
            role: role.to_string(),
            name: name.to_string(),
            ..Default::default()
        }
    }

    fn keyed_tab(key: &str, order: u32) -> TabOrderRecord {
        TabOrderRecord {
            identity_key: key.to_string(),
            order,
            ..Default::default()
        }
    }

    fn structural(tag: &str, path: &str, name: &str) -> StructuralRecord {
        StructuralRecord {
            tag: tag.to_string(),
            path: path.to_string(),
            name: Some(name.to_string()),
            ..Default::default()
        }
    }

    fn structure_snapshot(records: Vec<StructuralRecord>) -> Snapshot {
        Snapshot::structure(
            "",
            "",
            StructureScan {
                structural_elements: records,
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_identical_tab_order_is_empty() {
        let records = vec![tab("Link", "A", 1), tab("Button", "Go", 2)];
        let snapshot = Snapshot::tab_order("", "", records);
        let diff = compare(&snapshot, &snapshot).unwrap();
        assert!(diff.is_empty());
        assert_eq!(diff.totals(), (2, 2));
    }

    #[test]
    fn test_identical_structure_is_empty() {
        let snapshot = structure_snapshot(vec![
            structural("h1", "/html/body[1]/h1[1]", "Title"),
            structural("nav", "/html/body[1]/nav[1]", "Main Nav"),
        ]);
        assert!(compare(&snapshot, &snapshot).unwrap().is_empty());
    }

    #[test]
    fn test_structure_addition() {
        let h1 = structural("h1", "/html/body[1]/h1[1]", "Title");
        let nav = structural("nav", "/html/body[1]/nav[1]", "Main Nav");
        let old = structure_snapshot(vec![h1.clone()]);
        let new = structure_snapshot(vec![h1, nav.clone()]);

        let Diff::Structure(diff) = compare(&old, &new).unwrap() else {
            panic!("expected structure diff");
        };
        assert_eq!(diff.added, vec![nav]);
        assert!(diff.removed.is_empty());
        assert_eq!((diff.total_old, diff.total_new), (1, 2));
    }

    #[test]
    fn test_structure_symmetry() {
        let a = structural("h1", "/html/body[1]/h1[1]", "Title");
        let b = structural("nav", "/html/body[1]/nav[1]", "Main Nav");
        let c = structural("footer", "/html/body[1]/footer[1]", "Footer");
        let old = vec![a.clone(), b];
        let new = vec![a, c];

        let forward = compare_structure(&old, &new);
        let backward = compare_structure(&new, &old);
        assert_eq!(forward.added, backward.removed);
        assert_eq!(forward.removed, backward.added);
    }

    #[test]
    fn test_structure_removed_keeps_rect() {
        let mut gone = structural("aside", "/html/body[1]/aside[1]", "Related");
        gone.rect = Some(Rect::new(900.0, 100.0, 300.0, 600.0));
        let diff = compare_structure(&[gone.clone()], &[]);
        assert_eq!(diff.removed[0].rect, gone.rect);
    }

    #[test]
    fn test_structure_prefers_identity_key() {
        let mut old = structural("h1", "/html/body[1]/h1[1]", "Title");
        old.identity_key = "aaaa".to_string();
        let mut new = old.clone();
        new.identity_key = "bbbb".to_string();
        let diff = compare_structure(&[old], &[new]);
        assert_eq!(diff.added.len(), 1);
        assert_eq!(diff.removed.len(), 1);
    }

    #[test]
    fn test_structure_duplicate_keys_collapse() {
        let h2 = structural("h2", "", "Section");
        let diff = compare_structure(&[h2.clone(), h2.clone()], &[h2]);
        assert!(diff.removed.is_empty());
        assert_eq!(diff.total_old, 2);
    }

    #[test]
    fn test_tab_order_reorder() {
        let old = vec![tab("Link", "A", 1), tab("Link", "B", 2)];
        let new = vec![tab("Link", "B", 1), tab("Link", "A", 2)];
        let diff = compare_tab_order(&old, &new);

        assert!(diff.added.is_empty());
        assert!(diff.removed.is_empty());
        assert_eq!(diff.changed.len(), 2);
        assert_eq!(diff.changed[0].record.name, "B");
        assert_eq!((diff.changed[0].old_order, diff.changed[0].new_order), (2, 1));
        assert_eq!(diff.changed[1].record.name, "A");
        assert_eq!((diff.changed[1].old_order, diff.changed[1].new_order), (1, 2));
    }

    #[test]
    fn test_tab_order_multiplicity() {
        let old = vec![keyed_tab("k", 1), keyed_tab("k", 2)];
        let new = vec![keyed_tab("k", 1)];
        let diff = compare_tab_order(&old, &new);
        assert_eq!(diff.removed, vec![keyed_tab("k", 2)]);
        assert!(diff.added.is_empty());
        assert!(diff.changed.is_empty());
    }

    #[test]
    fn test_tab_order_multiplicity_added() {
        let old = vec![keyed_tab("k", 1)];
        let new = vec![keyed_tab("x", 1), keyed_tab("k", 2), keyed_tab("k", 3)];
        let diff = compare_tab_order(&old, &new);
        assert_eq!(diff.added, vec![keyed_tab("x", 1), keyed_tab("k", 3)]);
        assert!(diff.removed.is_empty());
        assert_eq!(diff.changed.len(), 1);
        assert_eq!((diff.changed[0].old_order, diff.changed[0].new_order), (1, 2));
    }

    #[test]
    fn test_tab_order_repeated_position_consumed_once() {
        let old = vec![keyed_tab("k", 1), keyed_tab("k", 1), keyed_tab("k", 2)];
        let new = vec![keyed_tab("k", 1), keyed_tab("k", 1), keyed_tab("k", 2)];
        let diff = compare_tab_order(&old, &new);
        assert!(diff.added.is_empty());
        assert!(diff.removed.is_empty());
        assert_eq!(diff.changed.len(), 1);
        assert_eq!((diff.changed[0].old_order, diff.changed[0].new_order), (2, 1));
    }

    #[test]
    fn test_tab_order_large_reversal() {
        let n = 10_001u32;
        let old: Vec<TabOrderRecord> = (0..n).map(|i| keyed_tab(&format!("k{i}"), i + 1)).collect();
        let new: Vec<TabOrderRecord> = (0..n)
            .map(|j| keyed_tab(&format!("k{}", n - 1 - j), j + 1))
            .collect();

        let diff = compare_tab_order(&old, &new);
        assert!(diff.added.is_empty());
        assert!(diff.removed.is_empty());
        // the middle record keeps its position
        assert_eq!(diff.changed.len(), n as usize - 1);
        assert_eq!(diff.changed[0].record.identity_key, format!("k{}", n - 1));
        assert_eq!((diff.changed[0].old_order, diff.changed[0].new_order), (n, 1));
    }

    #[test]
    fn test_tab_order_disjoint_keys() {
        let diff = compare_tab_order(&[keyed_tab("a", 1)], &[keyed_tab("b", 1)]);
        assert_eq!(diff.added.len(), 1);
        assert_eq!(diff.removed.len(), 1);
        assert!(diff.changed.is_empty());
    }

    #[test]
    fn test_kind_mismatch() {
        let structure = structure_snapshot(Vec::new());
        let tabs = Snapshot::tab_order("", "", Vec::new());
        assert_eq!(
            compare(&structure, &tabs),
            Err(DiffError::KindMismatch {
                old: SnapshotKind::Structure,
                new: SnapshotKind::TabOrder,
            })
        );
    }

    #[test]
    fn test_compare_scans_missing() {
        let envelope = Snapshot::tab_order("", "", vec![tab("Link", "A", 1)])
            .to_envelope(Viewport::default())
            .unwrap();
        assert_eq!(compare_scans(None, Some(&envelope)), Err(DiffError::Missing(Side::Old)));
        assert_eq!(compare_scans(Some(&envelope), None), Err(DiffError::Missing(Side::New)));
        assert!(compare_scans(Some(&envelope), Some(&envelope)).unwrap().is_empty());
    }

    #[test]
    fn test_compare_scans_from_json() {
        let old: SnapshotEnvelope = serde_json::from_str(
            r#"{"id":"1","timestamp":"2026-01-01T00:00:00Z","type":"tab-order","viewport":{"width":1280,"height":800},
                "data":[{"role":"Link","name":"A","order":1},{"role":"Link","name":"B","order":2}]}"#,
        )
        .unwrap();
        let new: SnapshotEnvelope = serde_json::from_str(
            r#"{"id":"2","timestamp":"2026-01-02T00:00:00Z","type":"tab-order","viewport":{"width":1280,"height":800},
                "data":[{"role":"Link","name":"B","order":1},{"role":"Link","name":"A","order":2}]}"#,
        )
        .unwrap();
        let diff = compare_scans(Some(&old), Some(&new)).unwrap();
        assert_eq!(diff.changed_count(), 2);
        assert_eq!(diff.added_count(), 0);
    }

    #[test]
    fn test_diff_json_shape() {
        let diff = Diff::TabOrder(compare_tab_order(&[tab("Link", "A", 1)], &[tab("Link", "A", 2)]));
        let json = serde_json::to_value(&diff).unwrap();
        assert_eq!(json["type"], "tab-order");
        assert_eq!(json["totalOld"], 1);
        assert_eq!(json["changed"][0]["oldOrder"], 1);
        assert_eq!(json["changed"][0]["newOrder"], 2);
        assert_eq!(json["changed"][0]["name"], "A");
    }
}
