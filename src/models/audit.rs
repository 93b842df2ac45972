use mongodb::bson::{DateTime, Document, oid::ObjectId};
use serde::{Deserialize, Serialize};

pub const AUDIT_LOGS: &str = "auditLogs";

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AuditLog {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub actor_user_id: ObjectId,
    pub action: String,
    pub entity_type: String,
    pub entity_id: ObjectId,
    pub changes: Document,
    pub created_at: DateTime,
}

impl AuditLog {
    pub fn new(actor: ObjectId, action: &str, entity_type: &str, entity_id: ObjectId, changes: Document) -> Self {
        AuditLog {
            id: None,
            actor_user_id: actor,
            action: action.to_string(),
            entity_type: entity_type.to_string(),
            entity_id,
            changes,
            created_at: DateTime::now(),
        }
    }
}
