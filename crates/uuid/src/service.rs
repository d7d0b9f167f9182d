//! Internal implementation of the identifier types.

use crate::{UuidError, UuidResult};
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI64, Ordering};
use std::{fmt, str::FromStr};
use ::uuid::Uuid;

/// Longest share token the resolver will look up.
const MAX_SHARE_ID_LEN: usize = 64;

/// Canonical UUID representation (32 lowercase hex characters, no hyphens).
///
/// Once constructed, the contained UUID is guaranteed to be in canonical form, so sharded
/// path derivation is deterministic.
///
/// # Construction
/// - [`ShardableUuid::new`] generates a new canonical UUID (for new document records).
/// - [`ShardableUuid::parse`] validates an externally supplied identifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShardableUuid(Uuid);

impl Default for ShardableUuid {
    fn default() -> Self {
        Self::new()
    }
}

impl ShardableUuid {
    /// Generates a new random (v4) UUID in canonical form.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Validates and parses a UUID string that must already be in canonical form.
    ///
    /// Hyphenated or uppercase forms are rejected rather than normalised.
    ///
    /// # Errors
    ///
    /// Returns [`UuidError::InvalidInput`] if `input` is not in canonical form.
    pub fn parse(input: &str) -> UuidResult<Self> {
        if !Self::is_canonical(input) {
            return Err(UuidError::InvalidInput(format!(
                "UUID must be 32 lowercase hex characters without hyphens, got: '{}'",
                input
            )));
        }
        Uuid::parse_str(input)
            .map(Self)
            .map_err(|e| UuidError::InvalidInput(format!("{}: {}", input, e)))
    }

    /// Returns true if `input` is exactly 32 lowercase hex characters.
    pub fn is_canonical(input: &str) -> bool {
        input.len() == 32
            && input
                .bytes()
                .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
    }

    /// Returns `parent_dir/<s1>/<s2>/<uuid>/` where `s1`/`s2` are the first two pairs of hex
    /// characters of this UUID.
    pub fn sharded_dir(&self, parent_dir: &Path) -> PathBuf {
        let canonical = self.0.simple().to_string();
        let s1 = &canonical[0..2];
        let s2 = &canonical[2..4];
        parent_dir.join(s1).join(s2).join(&canonical)
    }
}

impl fmt::Display for ShardableUuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

impl FromStr for ShardableUuid {
    type Err = UuidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ShardableUuid::parse(s)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for ShardableUuid {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for ShardableUuid {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        ShardableUuid::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Opaque share token.
///
/// A share id is generated once per upload from 122 random bits (UUID v4, lowercase
/// hyphenated form) and is the only credential needed to view a document without signing in.
/// Holders of the token must treat it as opaque: comparison is exact and case-sensitive.
///
/// There is no rate limiting on resolution; unguessability of the token is the whole access
/// control.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ShareId(String);

impl Default for ShareId {
    fn default() -> Self {
        Self::new()
    }
}

impl ShareId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().hyphenated().to_string())
    }

    /// Returns true if `candidate` could be used as a lookup key without escaping.
    ///
    /// This is a syntactic filter only: a well-formed token may still never have been issued.
    pub fn is_lookup_safe(candidate: &str) -> bool {
        !candidate.is_empty()
            && candidate.len() <= MAX_SHARE_ID_LEN
            && candidate
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-')
    }

    /// Wraps a previously issued token read back from storage.
    pub fn from_issued(token: impl Into<String>) -> UuidResult<Self> {
        let token = token.into();
        if !Self::is_lookup_safe(&token) {
            return Err(UuidError::InvalidInput(format!(
                "share id contains unsupported characters: '{}'",
                token
            )));
        }
        Ok(Self(token))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ShareId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ShareId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for ShareId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for ShareId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        ShareId::from_issued(s).map_err(serde::de::Error::custom)
    }
}

/// A time-prefixed identifier.
///
/// Format:
/// `YYYYMMDDTHHMMSS.mmmZ-<canonical_uuid>`
///
/// Example:
/// `20260111T143522.045Z-550e8400e29b41d4a716446655440000`
///
/// The textual form sorts lexicographically in timestamp order.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TimestampId {
    timestamp: DateTime<Utc>,
    uuid: ShardableUuid,
}

impl TimestampId {
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

impl PartialOrd for TimestampId {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TimestampId {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.timestamp
            .cmp(&other.timestamp)
            .then_with(|| self.uuid.cmp(&other.uuid))
    }
}

impl FromStr for TimestampId {
    type Err = UuidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (ts_str, uuid_str) = s.split_once('-').ok_or_else(|| {
            UuidError::InvalidInput(format!("Invalid timestamp id format: '{}'", s))
        })?;

        let ts_no_z = ts_str.strip_suffix('Z').ok_or_else(|| {
            UuidError::InvalidInput(format!("Timestamp must end with 'Z': '{}'", ts_str))
        })?;

        let naive =
            chrono::NaiveDateTime::parse_from_str(ts_no_z, "%Y%m%dT%H%M%S%.3f").map_err(|e| {
                UuidError::InvalidInput(format!("Invalid timestamp format '{}': {}", ts_str, e))
            })?;

        Ok(Self {
            timestamp: DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc),
            uuid: ShardableUuid::parse(uuid_str)?,
        })
    }
}

impl fmt::Display for TimestampId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}",
            self.timestamp.format("%Y%m%dT%H%M%S%.3fZ"),
            self.uuid
        )
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for TimestampId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for TimestampId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Generator for [`TimestampId`] values.
pub struct TimestampIdGenerator;

impl TimestampIdGenerator {
    /// Generate a new timestamp id at millisecond precision.
    ///
    /// If `last` is provided, the timestamp is guaranteed to be strictly greater than the last
    /// one (by at least 1 ms). Callers that need per-record monotonicity must call this while
    /// holding that record's write lock.
    pub fn generate(last: Option<&TimestampId>) -> TimestampId {
        let now = truncate_to_millis(Utc::now());

        let timestamp = match last {
            Some(prev) if now <= prev.timestamp => prev.timestamp + Duration::milliseconds(1),
            _ => now,
        };

        TimestampId {
            timestamp,
            uuid: ShardableUuid::new(),
        }
    }
}

fn truncate_to_millis(ts: DateTime<Utc>) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(ts.timestamp_millis())
        .single()
        .unwrap_or(ts)
}

/// Strictly increasing millisecond clock.
///
/// Each call to [`MonotonicMillis::next`] returns the current Unix time in milliseconds, or
/// one more than the previous value if the clock has not advanced. Shared across threads.
#[derive(Debug, Default)]
pub struct MonotonicMillis {
    last: AtomicI64,
}

impl MonotonicMillis {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&self) -> i64 {
        let now = Utc::now().timestamp_millis();
        let mut prev = self.last.load(Ordering::Relaxed);
        loop {
            let candidate = if now > prev { now } else { prev + 1 };
            match self
                .last
                .compare_exchange_weak(prev, candidate, Ordering::AcqRel, Ordering::Relaxed)
            {
                Ok(_) => return candidate,
                Err(actual) => prev = actual,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[test]
    fn test_new_generates_canonical_uuid() {
        let id = ShardableUuid::new();
        let canonical = id.to_string();
        assert_eq!(canonical.len(), 32);
        assert!(ShardableUuid::is_canonical(&canonical));
    }

    #[test]
    fn test_parse_rejects_non_canonical_forms() {
        assert!(ShardableUuid::parse("550e8400e29b41d4a716446655440000").is_ok());
        assert!(ShardableUuid::parse("550e8400-e29b-41d4-a716-446655440000").is_err());
        assert!(ShardableUuid::parse("550E8400E29B41D4A716446655440000").is_err());
        assert!(ShardableUuid::parse("550e8400e29b41d4a71644665544000").is_err());
        assert!(ShardableUuid::parse("550e8400e29b41d4a716446655440zzz").is_err());
        assert!(ShardableUuid::parse("").is_err());
    }

    #[test]
    fn test_sharded_dir_structure() {
        let id = ShardableUuid::parse("550e8400e29b41d4a716446655440000").unwrap();
        let sharded = id.sharded_dir(Path::new("/data/documents"));
        assert_eq!(
            sharded,
            PathBuf::from("/data/documents/55/0e/550e8400e29b41d4a716446655440000")
        );
    }

    #[test]
    fn test_share_ids_are_unique_and_lookup_safe() {
        let ids: HashSet<String> = (0..1000).map(|_| ShareId::new().to_string()).collect();
        assert_eq!(ids.len(), 1000);
        for id in &ids {
            assert_eq!(id.len(), 36);
            assert!(ShareId::is_lookup_safe(id));
        }
    }

    #[test]
    fn test_share_id_lookup_safety_filter() {
        assert!(!ShareId::is_lookup_safe(""));
        assert!(!ShareId::is_lookup_safe("../../etc/passwd"));
        assert!(!ShareId::is_lookup_safe("abc def"));
        assert!(!ShareId::is_lookup_safe(&"a".repeat(MAX_SHARE_ID_LEN + 1)));
        assert!(ShareId::is_lookup_safe("not-issued-but-well-formed"));
        assert!(ShareId::from_issued("a/b").is_err());
    }

    #[test]
    fn test_timestamp_id_roundtrip_display() {
        let id = TimestampIdGenerator::generate(None);
        let parsed: TimestampId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_timestamp_id_strictly_after_previous() {
        let first = TimestampIdGenerator::generate(None);
        let future = TimestampId {
            timestamp: first.timestamp() + Duration::seconds(5),
            uuid: ShardableUuid::new(),
        };
        let next = TimestampIdGenerator::generate(Some(&future));
        assert_eq!(next.timestamp(), future.timestamp() + Duration::milliseconds(1));
        assert!(next > future);
    }

    #[test]
    fn test_timestamp_id_text_sorts_like_value() {
        let mut last = None;
        let mut ids = Vec::new();
        for _ in 0..20 {
            let id = TimestampIdGenerator::generate(last.as_ref());
            ids.push(id.clone());
            last = Some(id);
        }
        let mut as_text: Vec<String> = ids.iter().map(|i| i.to_string()).collect();
        let expected = as_text.clone();
        as_text.sort();
        assert_eq!(as_text, expected);
    }

    #[test]
    fn test_timestamp_id_parse_errors() {
        assert!("nonsense".parse::<TimestampId>().is_err());
        assert!("20260111T143522.045-550e8400e29b41d4a716446655440000"
            .parse::<TimestampId>()
            .is_err());
    }

    #[test]
    fn test_monotonic_millis_strictly_increasing_across_threads() {
        let clock = Arc::new(MonotonicMillis::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let clock = Arc::clone(&clock);
                std::thread::spawn(move || (0..250).map(|_| clock.next()).collect::<Vec<_>>())
            })
            .collect();

        let mut all = Vec::new();
        for handle in handles {
            let values = handle.join().unwrap();
            assert!(values.windows(2).all(|w| w[0] < w[1]));
            all.extend(values);
        }
        let unique: HashSet<i64> = all.iter().copied().collect();
        assert_eq!(unique.len(), all.len());
    }
}
