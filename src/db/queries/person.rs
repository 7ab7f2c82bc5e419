use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::doc;
use mongodb::{Collection, Database};
use thiserror::Error;
use tracing::{debug, error};

use crate::db::models::person::{Person, PERSONS_COLLECTION};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] mongodb::error::Error),
}

/// Read access to stored persons.
#[async_trait]
pub trait PersonStore: Send + Sync {
    /// Every person, in store iteration order.
    async fn find_all(&self) -> Result<Vec<Person>, StoreError>;

    /// Round-trips to the store; used by readiness checks.
    async fn ping(&self) -> Result<(), StoreError>;
}

/// [`PersonStore`] over the MongoDB `persons` collection.
#[derive(Clone)]
pub struct MongoPersonStore {
    db: Database,
    persons: Collection<Person>,
}

impl MongoPersonStore {
    pub fn new(db: Database) -> Self {
        let persons = db.collection::<Person>(PERSONS_COLLECTION);
        Self { db, persons }
    }
}

#[async_trait]
impl PersonStore for MongoPersonStore {
    async fn find_all(&self) -> Result<Vec<Person>, StoreError> {
        let persons: Vec<Person> = self
            .persons
            .find(doc! {})
            .await
            .map_err(|e| {
                error!("Failed to query persons: {:?}", e);
                e
            })?
            .try_collect()
            .await?;

        debug!(count = persons.len(), "Fetched persons");
        Ok(persons)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.db.run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }
}
