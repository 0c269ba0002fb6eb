//! # Identifier Normalization
//!
//! Classification and canonicalization for the heterogeneous task and project
//! identifiers that reach the synchronization layer.
//!
//! ## Overview
//!
//! Three identifier shapes occur in the wild:
//!
//! - **Canonical UUIDs** assigned by the task store (`8-4-4-4-12` hyphenated,
//!   versions 1 through 5).
//! - **Compound identifiers** built by UI flows that append provenance
//!   segments to a canonical UUID (for example a preset suffix). The embedded
//!   UUID always occupies the first five hyphen-delimited segments.
//! - **Legacy numeric ids** from the pre-UUID store generation. These are no
//!   longer addressable and must never be sent to the store.
//!
//! Every function here is pure and total: classification outcomes are values,
//! never errors. The synchronization engine decides what a rejected
//! identifier means for the operation at hand.

use uuid::{Uuid, Variant};

/// Cache addressing outcome for a project identifier.
///
/// `Disabled` is a sentinel, not an error: callers holding a disabled key
/// serve empty data and skip store reads entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// Addressable project collection.
    Project(Uuid),
    /// No usable key. Absent, legacy numeric, or malformed project id.
    Disabled,
}

impl CacheKey {
    /// True when no cache entry or store read may be produced for this key.
    pub fn is_disabled(&self) -> bool {
        matches!(self, CacheKey::Disabled)
    }

    /// Project id behind the key, if addressable.
    pub fn project_id(&self) -> Option<Uuid> {
        match self {
            CacheKey::Project(id) => Some(*id),
            CacheKey::Disabled => None,
        }
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheKey::Project(id) => write!(f, "tasks:{id}"),
            CacheKey::Disabled => f.write_str("tasks:disabled"),
        }
    }
}

/// Parse a candidate string as a store-grade UUID.
///
/// Stricter than `Uuid::parse_str`: only the canonical hyphenated form is
/// accepted (no braces, no URN prefix, no compact hex), the version nibble
/// must be 1 through 5, and the variant must be RFC 4122. The nil UUID and
/// future versions are rejected.
fn parse_store_uuid(value: &str) -> Option<Uuid> {
    let bytes = value.as_bytes();
    if bytes.len() != 36 {
        return None;
    }
    if bytes[8] != b'-' || bytes[13] != b'-' || bytes[18] != b'-' || bytes[23] != b'-' {
        return None;
    }

    let parsed = Uuid::parse_str(value).ok()?;
    let version = parsed.get_version_num();
    if !(1..=5).contains(&version) {
        return None;
    }
    if parsed.get_variant() != Variant::RFC4122 {
        return None;
    }

    Some(parsed)
}

/// Check whether a string is a canonical store UUID.
///
/// Case-insensitive. Accepts versions 1 through 5 with the RFC 4122 variant;
/// rejects everything else, including the nil UUID.
///
/// ```
/// use stagecheck_client::identity::is_valid_uuid;
///
/// assert!(is_valid_uuid("550e8400-e29b-41d4-a716-446655440000"));
/// assert!(is_valid_uuid("550E8400-E29B-41D4-A716-446655440000"));
/// assert!(!is_valid_uuid("550e8400e29b41d4a716446655440000"));
/// assert!(!is_valid_uuid("00000000-0000-0000-0000-000000000000"));
/// ```
pub fn is_valid_uuid(value: &str) -> bool {
    parse_store_uuid(value).is_some()
}

/// Check whether a string is a legacy numeric id.
///
/// The pre-UUID store generation keyed tasks by decimal integers. Those ids
/// still appear in old bookmarks and persisted UI state, but the store no
/// longer resolves them.
///
/// ```
/// use stagecheck_client::identity::is_legacy_numeric_id;
///
/// assert!(is_legacy_numeric_id("482915"));
/// assert!(!is_legacy_numeric_id("48a915"));
/// assert!(!is_legacy_numeric_id(""));
/// ```
pub fn is_legacy_numeric_id(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit())
}

/// Reduce a compound identifier to its embedded canonical id.
///
/// A canonical UUID occupies exactly five hyphen-delimited segments. Inputs
/// with more than four hyphens are truncated to their first five segments;
/// everything else passes through unchanged. The operation is structural
/// only, so the result is not guaranteed to be a valid UUID.
///
/// Idempotent: applying the extraction twice yields the same result as
/// applying it once.
///
/// ```
/// use stagecheck_client::identity::extract_canonical_id;
///
/// let compound = "f8af97e9-9c24-4f83-9a42-7d2b6a8c1e55-intro-2";
/// assert_eq!(extract_canonical_id(compound), "f8af97e9-9c24-4f83-9a42-7d2b6a8c1e55");
///
/// // Already-canonical input is returned as-is.
/// let canonical = "f8af97e9-9c24-4f83-9a42-7d2b6a8c1e55";
/// assert_eq!(extract_canonical_id(canonical), canonical);
/// ```
pub fn extract_canonical_id(value: &str) -> &str {
    let hyphens = value.bytes().filter(|&b| b == b'-').count();
    if hyphens <= 4 {
        return value;
    }

    let mut seen = 0usize;
    for (index, byte) in value.bytes().enumerate() {
        if byte == b'-' {
            seen += 1;
            if seen == 5 {
                return &value[..index];
            }
        }
    }

    value
}

/// Normalize a source id for persistence.
///
/// Compound identifiers are stripped to their embedded UUID. Anything that
/// does not reduce to a canonical UUID is coerced to `None` so that
/// transient UI strings never reach the store.
pub fn sanitize_source_id(value: &str) -> Option<String> {
    let canonical = extract_canonical_id(value);
    if is_valid_uuid(canonical) {
        Some(canonical.to_string())
    } else {
        None
    }
}

/// Build the cache addressing key for a project identifier.
///
/// Absent, legacy numeric, and non-UUID inputs all yield
/// [`CacheKey::Disabled`]; no store read may be issued for a disabled key.
///
/// ```
/// use stagecheck_client::identity::{build_cache_key, CacheKey};
///
/// assert!(matches!(
///     build_cache_key(Some("550e8400-e29b-41d4-a716-446655440000")),
///     CacheKey::Project(_)
/// ));
/// assert_eq!(build_cache_key(Some("12345")), CacheKey::Disabled);
/// assert_eq!(build_cache_key(None), CacheKey::Disabled);
/// ```
pub fn build_cache_key(project_id: Option<&str>) -> CacheKey {
    match project_id.and_then(parse_store_uuid) {
        Some(id) => CacheKey::Project(id),
        None => CacheKey::Disabled,
    }
}
