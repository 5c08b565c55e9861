//! Human-readable numbers for projects and sprints.
//!
//! Convention: `{PREFIX}-{YYYYMM}-{XXXXXX}`
//!
//! - `PREFIX` = `PRJ` for projects, `SPR` for sprints
//! - `YYYYMM` = creation month (UTC)
//! - `XXXXXX` = last six hex digits of the entity id, upper-cased (the random
//!   tail of a UUIDv7, so numbers created in the same month stay distinct)

use crate::types::{EntityId, Timestamp};

pub const PROJECT_NUMBER_PREFIX: &str = "PRJ";
pub const SPRINT_NUMBER_PREFIX: &str = "SPR";

pub fn project_number(id: EntityId, created_at: Timestamp) -> String {
    entity_number(PROJECT_NUMBER_PREFIX, id, created_at)
}

pub fn sprint_number(id: EntityId, created_at: Timestamp) -> String {
    entity_number(SPRINT_NUMBER_PREFIX, id, created_at)
}

fn entity_number(prefix: &str, id: EntityId, created_at: Timestamp) -> String {
    let hex = id.simple().to_string();
    let tail = &hex[hex.len() - 6..];
    format!(
        "{prefix}-{}-{}",
        created_at.format("%Y%m"),
        tail.to_uppercase()
    )
}
