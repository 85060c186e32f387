// SPDX-License-Identifier: PMPL-1.0-or-later
//! Identity fingerprints for matching the same element across snapshots.
//!
//! Fingerprints are equality keys, not security primitives. Two algorithms
//! are available:
//!
//! - **rolling32**: `h = h * 31 + unit` over UTF-16 code units, the format
//!   used by snapshots recorded in the browser extension.
//! - **fnv64** (default): FNV-1a over UTF-8 bytes, which makes accidental
//!   collisions between different (path, role, name) triples negligible.

use serde::{Deserialize, Serialize};

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Hash used to derive identity keys
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// 32-bit rolling multiply-and-add, 8 hex digits
    Rolling32,
    /// 64-bit FNV-1a, 16 hex digits
    #[default]
    Fnv64,
}

impl HashAlgorithm {
    /// Fingerprint an arbitrary string
    pub fn fingerprint(self, input: &str) -> String {
        match self {
            HashAlgorithm::Rolling32 => format!("{:08x}", rolling32(input)),
            HashAlgorithm::Fnv64 => format!("{:016x}", fnv1a64(input)),
        }
    }

    /// Identity key of a structural record
    pub fn structural_key(self, path: &str, role: Option<&str>, name: Option<&str>) -> String {
        self.fingerprint(&format!(
            "{}|{}|{}",
            path,
            role.unwrap_or("no-role"),
            name.unwrap_or("no-name")
        ))
    }

    /// Identity key of a tab-order record. Order is deliberately not an input.
    pub fn tab_order_key(self, path: &str, role: &str, name: &str) -> String {
        self.fingerprint(&format!("{}|{}|{}", path, role, name))
    }
}

impl std::fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HashAlgorithm::Rolling32 => write!(f, "rolling32"),
            HashAlgorithm::Fnv64 => write!(f, "fnv64"),
        }
    }
}

/// 32-bit rolling hash with wrapping arithmetic
pub fn rolling32(input: &str) -> u32 {
    input
        .encode_utf16()
        .fold(0u32, |hash, unit| hash.wrapping_mul(31).wrapping_add(u32::from(unit)))
}

/// 64-bit FNV-1a
pub fn fnv1a64(input: &str) -> u64 {
    input.bytes().fold(FNV_OFFSET_BASIS, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(FNV_PRIME)
    })
}
