// SPDX-License-Identifier: PMPL-1.0-or-later
//! Snapshotbot - Accessibility Snapshot and Regression Bot
//!
//! Part of the gitbot-fleet ecosystem. Snapshotbot captures what assistive
//! technology sees on a page (landmark and heading structure, keyboard focus
//! order) as stable-identity records, and compares two captures to show what
//! a revision added, removed or reordered.
//!
//! ## Scanners
//!
//! - **Structure**: landmarks, headings, tables, labels, live regions, frames
//!   and open shadow roots, with structural nesting levels
//! - **Tab Order**: focusable elements in sequential navigation order, with
//!   positive tabindex values first
//!
//! ## Identity
//!
//! Records carry an identity key fingerprinted from element path, role and
//! accessible name. Tab order identity excludes position, so a moved element
//! keeps its key and shows up as a position change rather than a removal.
//!
//! ## Diffing
//!
//! [`diff::compare`] and [`diff::compare_scans`] match records by identity
//! with multiplicity, and return a [`error::DiffError`] value for missing or
//! mismatched inputs.

pub mod config;
pub mod diff;
pub mod dom;
pub mod error;
pub mod identity;
pub mod report;
pub mod scanner;
pub mod scanners;
pub mod snapshot;

pub use diff::{compare, compare_scans, Diff};
pub use dom::Document;
pub use error::{DiffError, Result, SnapshotError};
pub use identity::HashAlgorithm;
pub use snapshot::{Snapshot, SnapshotEnvelope, SnapshotKind, StructuralRecord, TabOrderRecord};
