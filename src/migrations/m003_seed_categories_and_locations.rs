use mongodb::Database;
use mongodb::bson::{DateTime, Document, doc};
use mongodb::options::UpdateOptions;

use super::{MigrationError, MigrationTrait};
use crate::config::Config;
use crate::models::{CATEGORIES, LOCATIONS};
use crate::utils::slugify;

pub struct Migration;

const CATEGORY_NAMES: [&str; 12] = [
    "Photography",
    "Videography",
    "Catering",
    "Venue",
    "Decoration",
    "Makeup Artist",
    "DJ / Music",
    "Event Planner",
    "Mehendi Artist",
    "Car Rental",
    "Florist",
    "Sound & Lighting",
];

const CITY_NAMES: [&str; 10] = [
    "Kathmandu",
    "Lalitpur",
    "Bhaktapur",
    "Pokhara",
    "Chitwan",
    "Butwal",
    "Biratnagar",
    "Dharan",
    "Nepalgunj",
    "Hetauda",
];

fn slugs(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| slugify(name)).collect()
}

/// Upserts by slug so reruns refresh names without duplicating rows.
async fn upsert(
    db: &Database,
    collection: &str,
    name: &str,
    mut fields: Document,
) -> Result<(), MigrationError> {
    let slug = slugify(name);
    let now = DateTime::now();
    fields.insert("name", name);
    fields.insert("updatedAt", now);

    db.collection::<Document>(collection)
        .update_one(
            doc! { "slug": &slug },
            doc! {
                "$set": fields,
                "$setOnInsert": { "slug": &slug, "createdAt": now },
            },
            UpdateOptions::builder().upsert(true).build(),
        )
        .await?;
    Ok(())
}

#[rocket::async_trait]
impl MigrationTrait for Migration {
    fn name(&self) -> &'static str {
        "003_seed_categories_and_locations"
    }

    async fn up(&self, db: &Database, _config: &Config) -> Result<(), MigrationError> {
        for name in CATEGORY_NAMES {
            upsert(db, CATEGORIES, name, doc! { "isActive": true }).await?;
        }
        for name in CITY_NAMES {
            upsert(db, LOCATIONS, name, doc! { "type": "CITY" }).await?;
        }
        Ok(())
    }

    async fn down(&self, db: &Database, _config: &Config) -> Result<(), MigrationError> {
        db.collection::<Document>(CATEGORIES)
            .delete_many(doc! { "slug": { "$in": slugs(&CATEGORY_NAMES) } }, None)
            .await?;
        db.collection::<Document>(LOCATIONS)
            .delete_many(doc! { "slug": { "$in": slugs(&CITY_NAMES) } }, None)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_slugs() {
        assert_eq!(
            slugs(&CATEGORY_NAMES),
            [
                "photography",
                "videography",
                "catering",
                "venue",
                "decoration",
                "makeup-artist",
                "dj-music",
                "event-planner",
                "mehendi-artist",
                "car-rental",
                "florist",
                "sound-lighting",
            ]
        );
        assert_eq!(slugs(&CITY_NAMES)[0], "kathmandu");
        assert_eq!(slugs(&CITY_NAMES)[8], "nepalgunj");
    }
}
