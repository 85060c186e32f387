// SPDX-License-Identifier: PMPL-1.0-or-later
//! File and directory capture.
//!
//! Loads HTML from disk into a [`Document`], attaches what a browser would
//! have supplied (layout geometry, same-origin frame documents), runs the
//! requested scanner and wraps the result in a [`SnapshotEnvelope`].

use crate::config::Config;
use crate::dom::{Document, Rect};
use crate::error::Result;
use crate::scanners;
use crate::snapshot::{SnapshotEnvelope, SnapshotKind};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// File extensions to capture
const SCANNABLE_EXTENSIONS: &[&str] = &["html", "htm"];

/// Directories to skip
const SKIP_DIRS: &[&str] = &[
    "node_modules", ".git", "target", "dist", "build",
    "_build", "vendor", ".next", ".nuxt", "coverage",
];

/// Suffix of the optional layout sidecar next to an HTML file
const GEOMETRY_SUFFIX: &str = "geometry.json";

/// Geometry sidecar path for an HTML file: `page.html` -> `page.html.geometry.json`
pub fn geometry_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".");
    name.push(GEOMETRY_SUFFIX);
    PathBuf::from(name)
}

/// Load an HTML file with its geometry sidecar and local frames
pub fn load_document(path: &Path) -> Result<Document> {
    let content = std::fs::read_to_string(path)?;
    let mut doc = Document::parse(&content).with_url(file_url(path));

    attach_local_frames(&mut doc, path);

    let sidecar = geometry_path(path);
    if sidecar.is_file() {
        let geometry: BTreeMap<String, Rect> = serde_json::from_str(&std::fs::read_to_string(&sidecar)?)?;
        apply_geometry(&mut doc, &geometry);
    }

    Ok(doc)
}

/// Record layout boxes keyed by element path. Returns how many resolved.
pub fn apply_geometry(doc: &mut Document, geometry: &BTreeMap<String, Rect>) -> usize {
    let mut applied = 0;
    for (path, rect) in geometry {
        match doc.resolve_path(path) {
            Some(node) => {
                doc.set_bounding_box(node, *rect);
                applied += 1;
            }
            None => warn!("Geometry path does not resolve: {}", path),
        }
    }
    debug!(applied, total = geometry.len(), "Applied geometry");
    applied
}

/// Iframes with a relative `src` naming a readable local file are treated
/// as same-origin; everything else stays inaccessible.
fn attach_local_frames(doc: &mut Document, path: &Path) {
    let Some(base) = path.parent() else {
        return;
    };

    let sources: Vec<String> = doc
        .element_ids()
        .filter_map(|id| {
            let el = doc.element(id)?;
            if el.tag() != "iframe" || el.has_attr("srcdoc") {
                return None;
            }
            el.attr("src").map(str::to_string)
        })
        .collect();

    for src in sources {
        if src.contains("://") || src.starts_with("//") || src.starts_with("data:") {
            debug!("Leaving cross-origin frame unattached: {}", src);
            continue;
        }
        let local = base.join(src.split(['?', '#']).next().unwrap_or(&src));
        match std::fs::read_to_string(&local) {
            Ok(html) => {
                let attached = doc.attach_frame(&src, &html);
                debug!(src = %src, attached, "Attached local frame");
            }
            Err(e) => debug!("Frame {} not readable: {}", local.display(), e),
        }
    }
}

fn file_url(path: &Path) -> String {
    let absolute = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    format!("file://{}", absolute.display())
}

/// Scan a loaded document and wrap it for storage
pub fn capture(doc: &Document, kind: SnapshotKind, config: &Config) -> Result<SnapshotEnvelope> {
    let scanner = scanners::scanner_for(kind, config);
    debug!("Running {}", scanner.name());
    scanner.scan(doc).to_envelope(config.viewport)
}

/// Capture a single HTML file
pub fn capture_file(path: &Path, kind: SnapshotKind, config: &Config) -> Result<SnapshotEnvelope> {
    let doc = load_document(path)?;
    capture(&doc, kind, config)
}

/// Capture every HTML file under a directory
pub fn capture_directory(dir: &Path, kind: SnapshotKind, config: &Config) -> Result<Vec<SnapshotEnvelope>> {
    let mut envelopes = Vec::new();

    info!("Capturing directory: {}", dir.display());

    for entry in WalkDir::new(dir)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            let name = e.file_name().to_str().unwrap_or("");
            if e.file_type().is_dir() && e.depth() > 0 {
                return !SKIP_DIRS.contains(&name) && !name.starts_with('.');
            }
            true
        })
    {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                debug!("Skipping unreadable entry: {}", e);
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        if !SCANNABLE_EXTENSIONS.contains(&ext) {
            continue;
        }

        match capture_file(path, kind, config) {
            Ok(envelope) => envelopes.push(envelope),
            Err(e) => warn!("Skipping {}: {}", path.display(), e),
        }
    }

    info!("Captured {} file(s)", envelopes.len());

    Ok(envelopes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::Snapshot;
    use crate::error::Side;
    use std::fs;
    use tempfile::TempDir;

    fn decode(envelope: &SnapshotEnvelope) -> Snapshot {
        envelope.to_snapshot(Side::New).unwrap()
    }

    #[test]
    fn test_capture_nonexistent_dir() {
        let result = capture_directory(Path::new("/nonexistent/path"), SnapshotKind::Structure, &Config::default());
        assert!(result.unwrap().is_empty());
    }

    #[test]
    fn test_capture_file_tab_order() {
        let tmp = TempDir::new().unwrap();
        let page = tmp.path().join("index.html");
        fs::write(&page, r#"<html><head><title>Home</title></head><body><a href="/">Home</a><button>Go</button></body></html>"#).unwrap();

        let envelope = capture_file(&page, SnapshotKind::TabOrder, &Config::default()).unwrap();
        assert_eq!(envelope.kind, SnapshotKind::TabOrder);
        assert_eq!(envelope.title, "Home");
        assert!(envelope.url.starts_with("file://"));
        assert_eq!(decode(&envelope).len(), 2);
    }

    #[test]
    fn test_geometry_sidecar() {
        let tmp = TempDir::new().unwrap();
        let page = tmp.path().join("page.html");
        fs::write(&page, r#"<body><button id="a">A</button><button id="b">B</button></body>"#).unwrap();
        fs::write(
            geometry_path(&page),
            r##"{"#a": {"x": 0, "y": 0, "width": 80, "height": 24}, "#b": {"x": 0, "y": 0, "width": 0, "height": 0}}"##,
        )
        .unwrap();

        let envelope = capture_file(&page, SnapshotKind::TabOrder, &Config::default()).unwrap();
        let snapshot = decode(&envelope);
        let records = snapshot.tab_order_records().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "A");
        assert_eq!(records[0].bounding_box, Some(Rect::new(0.0, 0.0, 80.0, 24.0)));
    }

    #[test]
    fn test_local_frame_attached() {
        let tmp = TempDir::new().unwrap();
        let page = tmp.path().join("outer.html");
        fs::write(
            &page,
            r#"<body><main><iframe src="inner.html" title="Inner"></iframe><iframe src="https://ads.example/x"></iframe></main></body>"#,
        )
        .unwrap();
        fs::write(tmp.path().join("inner.html"), "<body><nav aria-label=\"Frame nav\"></nav></body>").unwrap();

        let envelope = capture_file(&page, SnapshotKind::Structure, &Config::default()).unwrap();
        let snapshot = decode(&envelope);
        let records = snapshot.structural_elements().unwrap();
        let nav = records.iter().find(|r| r.tag == "nav").expect("frame nav");
        assert_eq!(nav.frame.as_ref().map(|f| f.src.as_str()), Some("inner.html"));
        assert!(records.iter().all(|r| r.frame.as_ref().map(|f| f.src.as_str()) != Some("https://ads.example/x")));
    }

    #[test]
    fn test_capture_directory_skips_vendor() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("a.html"), "<body><h1>A</h1></body>").unwrap();
        fs::write(tmp.path().join("notes.txt"), "not html").unwrap();
        fs::create_dir(tmp.path().join("node_modules")).unwrap();
        fs::write(tmp.path().join("node_modules").join("b.html"), "<body><h1>B</h1></body>").unwrap();
        fs::create_dir(tmp.path().join("docs")).unwrap();
        fs::write(tmp.path().join("docs").join("c.htm"), "<body><h1>C</h1></body>").unwrap();

        let envelopes = capture_directory(tmp.path(), SnapshotKind::Structure, &Config::default()).unwrap();
        assert_eq!(envelopes.len(), 2);
    }
}
