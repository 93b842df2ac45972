use log::info;
use mongodb::Database;
use mongodb::bson::{DateTime, doc};

use super::{MigrationError, MigrationTrait};
use crate::config::Config;
use crate::models::{Role, USERS, User, UserStatus};
use crate::services::PasswordService;

pub struct Migration;

#[rocket::async_trait]
impl MigrationTrait for Migration {
    fn name(&self) -> &'static str {
        "002_seed_admin_user"
    }

    async fn up(&self, db: &Database, config: &Config) -> Result<(), MigrationError> {
        let users = db.collection::<User>(USERS);
        let email = config.seed_admin_email.to_lowercase();

        if users.find_one(doc! { "email": &email }, None).await?.is_some() {
            info!("admin {} already exists, skipping", email);
            return Ok(());
        }

        let password_hash = PasswordService::hash(&config.seed_admin_password).await?;
        let now = DateTime::now();

        users
            .insert_one(
                User {
                    id: None,
                    full_name: config.seed_admin_name.clone(),
                    email: email.clone(),
                    phone: None,
                    password_hash,
                    role: Role::Admin,
                    status: UserStatus::Active,
                    last_login_at: None,
                    created_at: now,
                    updated_at: now,
                },
                None,
            )
            .await?;

        info!("seeded admin {}", email);
        Ok(())
    }

    async fn down(&self, db: &Database, config: &Config) -> Result<(), MigrationError> {
        db.collection::<User>(USERS)
            .delete_one(
                doc! {
                    "email": config.seed_admin_email.to_lowercase(),
                    "role": Role::Admin,
                },
                None,
            )
            .await?;
        Ok(())
    }
}
