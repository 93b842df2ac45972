use log::{error, info};
use mongodb::bson::{Document, doc};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::FindOptions;
use mongodb::{Client, Collection, Database};
use rocket::fairing::AdHoc;
use rocket::futures::TryStreamExt;
use rocket::futures::future::try_join;
use serde::de::DeserializeOwned;

use crate::config::Config;
use crate::utils::Pagination;

pub type DbConn = Database;

pub fn init() -> AdHoc {
    AdHoc::try_on_ignite("MongoDB", |rocket| async {
        let Some(config) = rocket.state::<Config>() else {
            error!("✗ MongoDB fairing needs the configuration to be loaded first");
            return Err(rocket);
        };

        match connect(config).await {
            Ok(database) => {
                info!("✓ MongoDB connected successfully ({})", database.name());
                Ok(rocket.manage(database))
            }
            Err(e) => {
                error!("✗ Failed to connect to MongoDB: {}", e);
                Err(rocket)
            }
        }
    })
}

/// Opens a client and pings the server before handing out the database.
pub async fn connect(config: &Config) -> Result<Database, mongodb::error::Error> {
    let client = Client::with_uri_str(&config.mongo_uri).await?;

    client
        .database("admin")
        .run_command(doc! {"ping": 1}, None)
        .await?;

    Ok(database(&client, config))
}

/// Database named in the connection string, or `MONGO_DB` when it names none.
pub fn database(client: &Client, config: &Config) -> Database {
    client
        .default_database()
        .unwrap_or_else(|| client.database(&config.mongo_db))
}

/// True for E11000 unique index violations.
pub fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(e)) => e.code == 11000,
        ErrorKind::BulkWrite(failure) => failure
            .write_errors
            .as_ref()
            .is_some_and(|errors| errors.iter().any(|e| e.code == 11000)),
        _ => false,
    }
}

/// One page of `filter` in `sort` order, plus the total match count.
pub async fn find_page<T>(
    collection: &Collection<T>,
    filter: Document,
    sort: Document,
    pagination: Pagination,
) -> Result<(Vec<T>, u64), mongodb::error::Error>
where
    T: DeserializeOwned + Unpin + Send + Sync,
{
    let options = FindOptions::builder()
        .sort(sort)
        .skip(pagination.skip())
        .limit(pagination.limit as i64)
        .build();

    let items = async {
        collection
            .find(filter.clone(), options)
            .await?
            .try_collect::<Vec<T>>()
            .await
    };
    let total = collection.count_documents(filter.clone(), None);

    try_join(items, total).await
}

/// Every match of `filter` in `sort` order, capped at `limit` when given.
pub async fn find_all<T>(
    collection: &Collection<T>,
    filter: Document,
    sort: Document,
    limit: Option<i64>,
) -> Result<Vec<T>, mongodb::error::Error>
where
    T: DeserializeOwned + Unpin + Send + Sync,
{
    let options = FindOptions::builder().sort(sort).limit(limit).build();

    collection.find(filter, options).await?.try_collect().await
}
