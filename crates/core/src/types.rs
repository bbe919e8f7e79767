use chrono::{Duration, SubsecRound, Utc};

/// Row identifiers are UUIDs; clients may generate them before insert.
pub type EntityId = uuid::Uuid;

/// Identifier of the owning user, as issued by the auth provider.
pub type UserId = uuid::Uuid;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Generate a fresh, time-ordered row identifier.
pub fn new_id() -> EntityId {
    uuid::Uuid::now_v7()
}

/// Current time truncated to microseconds, the precision PostgreSQL stores.
pub fn now() -> Timestamp {
    Utc::now().trunc_subsecs(6)
}

/// Stamp for a mutation of a row last updated at `previous`.
///
/// Always strictly greater than `previous`, even when the wall clock has not
/// advanced (or went backwards) since the last write.
pub fn next_stamp(previous: Timestamp) -> Timestamp {
    let now = now();
    if now > previous {
        now
    } else {
        previous + Duration::microseconds(1)
    }
}
