use log::{info, warn};
use mongodb::bson::{Document, doc};
use mongodb::options::IndexOptions;
use mongodb::{Database, IndexModel};

use super::{MIGRATIONS, MigrationError, MigrationTrait};
use crate::config::Config;

pub struct Migration;

/// Every collection the marketplace uses, including ones with no endpoints yet.
const COLLECTIONS: [&str; 27] = [
    "users",
    "vendors",
    "vendorServices",
    "packages",
    "events",
    "bookings",
    "availability",
    "quotes",
    "payments",
    "reviews",
    "verificationRequests",
    "documents",
    "auditLogs",
    "conversations",
    "messages",
    "notifications",
    "supportTickets",
    "categories",
    "locations",
    "mediaAssets",
    "vendorStaff",
    "bookingTasks",
    "discountCodes",
    "refunds",
    "favorites",
    "reports",
    "systemSettings",
];

fn index(keys: Document) -> IndexModel {
    IndexModel::builder().keys(keys).build()
}

fn unique(keys: Document) -> IndexModel {
    IndexModel::builder()
        .keys(keys)
        .options(IndexOptions::builder().unique(true).build())
        .build()
}

fn unique_sparse(keys: Document) -> IndexModel {
    IndexModel::builder()
        .keys(keys)
        .options(IndexOptions::builder().unique(true).sparse(true).build())
        .build()
}

fn indexes() -> Vec<(&'static str, IndexModel)> {
    vec![
        ("users", unique(doc! { "email": 1 })),
        ("users", index(doc! { "role": 1, "status": 1 })),
        ("vendors", unique(doc! { "userId": 1 })),
        ("vendors", index(doc! { "verifiedStatus": 1 })),
        ("vendors", index(doc! { "locations": 1 })),
        ("vendorStaff", unique(doc! { "vendorId": 1, "userId": 1 })),
        ("categories", unique(doc! { "slug": 1 })),
        ("categories", index(doc! { "isActive": 1 })),
        ("locations", index(doc! { "parentId": 1 })),
        ("locations", unique_sparse(doc! { "slug": 1 })),
        ("vendorServices", index(doc! { "vendorId": 1, "categoryId": 1 })),
        ("vendorServices", index(doc! { "categoryId": 1 })),
        ("vendorServices", index(doc! { "tags": 1 })),
        ("packages", index(doc! { "vendorId": 1 })),
        ("packages", index(doc! { "categoryId": 1, "isActive": 1 })),
        (
            "packages",
            IndexModel::builder()
                .keys(doc! { "title": "text", "description": "text" })
                .options(
                    IndexOptions::builder()
                        .name("packages_text_search".to_string())
                        .default_language("english".to_string())
                        .build(),
                )
                .build(),
        ),
        ("events", index(doc! { "userId": 1 })),
        ("events", index(doc! { "eventDate": 1 })),
        ("events", index(doc! { "eventType": 1 })),
        ("bookings", index(doc! { "userId": 1, "status": 1, "createdAt": -1 })),
        ("bookings", index(doc! { "vendorId": 1, "status": 1, "createdAt": -1 })),
        ("bookings", index(doc! { "eventId": 1 })),
        ("availability", unique(doc! { "vendorId": 1, "date": 1 })),
        ("quotes", index(doc! { "vendorId": 1, "status": 1, "createdAt": -1 })),
        ("quotes", index(doc! { "eventId": 1 })),
        ("payments", index(doc! { "bookingId": 1 })),
        ("payments", index(doc! { "status": 1 })),
        ("payments", unique_sparse(doc! { "providerRef": 1 })),
        ("refunds", index(doc! { "paymentId": 1 })),
        ("refunds", index(doc! { "bookingId": 1 })),
        ("refunds", unique_sparse(doc! { "providerRef": 1 })),
        ("reviews", unique(doc! { "bookingId": 1 })),
        ("reviews", index(doc! { "vendorId": 1, "createdAt": -1 })),
        ("verificationRequests", index(doc! { "vendorId": 1, "status": 1 })),
        ("verificationRequests", index(doc! { "status": 1 })),
        ("documents", index(doc! { "ownerType": 1, "ownerId": 1 })),
        ("documents", index(doc! { "uploadedBy": 1 })),
        ("auditLogs", index(doc! { "entityType": 1, "entityId": 1, "createdAt": -1 })),
        ("auditLogs", index(doc! { "actorUserId": 1, "createdAt": -1 })),
        ("conversations", index(doc! { "participants": 1 })),
        ("conversations", index(doc! { "lastMessageAt": -1 })),
        ("messages", index(doc! { "conversationId": 1, "createdAt": 1 })),
        ("messages", index(doc! { "senderId": 1, "createdAt": -1 })),
        ("notifications", index(doc! { "userId": 1, "createdAt": -1 })),
        ("notifications", index(doc! { "userId": 1, "readAt": 1 })),
        ("supportTickets", index(doc! { "status": 1, "createdAt": -1 })),
        ("supportTickets", index(doc! { "createdBy": 1, "createdAt": -1 })),
        ("supportTickets", index(doc! { "assignedTo": 1, "createdAt": -1 })),
        ("mediaAssets", index(doc! { "ownerType": 1, "ownerId": 1 })),
        ("bookingTasks", index(doc! { "bookingId": 1, "status": 1 })),
        ("bookingTasks", index(doc! { "assignedTo": 1, "dueAt": 1 })),
        ("discountCodes", unique(doc! { "code": 1 })),
        ("discountCodes", index(doc! { "validTo": 1 })),
        ("favorites", unique_sparse(doc! { "userId": 1, "vendorId": 1 })),
        ("favorites", unique_sparse(doc! { "userId": 1, "packageId": 1 })),
        ("reports", index(doc! { "targetType": 1, "targetId": 1, "status": 1 })),
        ("reports", index(doc! { "status": 1, "createdAt": -1 })),
        ("systemSettings", unique(doc! { "key": 1 })),
    ]
}

#[rocket::async_trait]
impl MigrationTrait for Migration {
    fn name(&self) -> &'static str {
        "001_init_collections_and_indexes"
    }

    async fn up(&self, db: &Database, _config: &Config) -> Result<(), MigrationError> {
        let existing = db.list_collection_names(None).await?;

        for name in COLLECTIONS {
            if existing.iter().any(|c| c == name) {
                continue;
            }
            db.create_collection(name, None).await?;
        }

        let specs = indexes();
        let count = specs.len();
        for (collection, model) in specs {
            db.collection::<Document>(collection)
                .create_index(model, None)
                .await?;
        }

        info!("created {} indexes across {} collections", count, COLLECTIONS.len());
        Ok(())
    }

    async fn down(&self, db: &Database, _config: &Config) -> Result<(), MigrationError> {
        for name in db.list_collection_names(None).await? {
            if name == MIGRATIONS {
                continue;
            }
            if let Err(e) = db.collection::<Document>(&name).drop_indexes(None).await {
                warn!("could not drop indexes on {}: {}", name, e);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn every_index_targets_a_created_collection() {
        let known: HashSet<_> = COLLECTIONS.iter().copied().collect();
        assert_eq!(known.len(), COLLECTIONS.len());

        for (collection, _) in indexes() {
            assert!(known.contains(collection), "{collection} is never created");
        }
    }

    #[test]
    fn email_and_slug_are_unique() {
        let unique_on = |collection: &str, field: &str| {
            indexes().into_iter().any(|(c, model)| {
                c == collection
                    && model.keys.contains_key(field)
                    && model
                        .options
                        .as_ref()
                        .and_then(|o| o.unique)
                        .unwrap_or(false)
            })
        };

        assert!(unique_on("users", "email"));
        assert!(unique_on("vendors", "userId"));
        assert!(unique_on("categories", "slug"));
        assert!(unique_on("locations", "slug"));
    }
}
