//! Row shape shared by the `projects` and `sprints` tables.

use opsportal_core::store::Document;
use opsportal_core::types::{EntityId, Timestamp, Version};
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DocumentRow {
    pub id: EntityId,
    pub department: String,
    pub doc: serde_json::Value,
    pub version: Version,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<DocumentRow> for Document {
    fn from(row: DocumentRow) -> Self {
        Document {
            id: row.id,
            department: row.department,
            version: row.version,
            body: row.doc,
        }
    }
}
