use bson::{doc, Document};
use keep_core::{Entity, KeepError, KeepResult};
use mongodb::{Client, Collection};
use tracing::info;

use crate::repository::MongoRepository;

/// An open client bound to one database.
///
/// Built once at start-up and handed to every repository; closed with
/// [`MongoConnection::shutdown`].
#[derive(Clone)]
pub struct MongoConnection {
    client: Client,
    database: String,
}

impl MongoConnection {
    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    /// Untyped handle on a collection.
    pub fn collection(&self, name: &str) -> Collection<Document> {
        self.client.database(&self.database).collection(name)
    }

    /// Typed repository over a collection.
    pub fn repository<T: Entity>(&self, name: &str) -> MongoRepository<T> {
        MongoRepository::new(self.collection(name))
    }

    /// Close pooled connections and wait for in-flight operations.
    pub async fn shutdown(self) {
        info!(database = %self.database, "closing MongoDB client");
        self.client.shutdown().await;
    }
}

pub struct MongoClientFactory;

impl MongoClientFactory {
    /// Connect and verify the server answers a ping.
    pub async fn connect(uri: &str, database: &str) -> KeepResult<MongoConnection> {
        if database.trim().is_empty() {
            return Err(KeepError::invalid_argument("MongoDB database name is required"));
        }
        info!(database, "connecting to MongoDB");

        let client = Client::with_uri_str(uri).await.map_err(|err| {
            KeepError::unavailable(format!("failed to connect to MongoDB: {err}")).with_source(err)
        })?;

        client
            .database(database)
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|err| {
                KeepError::unavailable(format!("MongoDB ping failed: {err}")).with_source(err)
            })?;

        info!(database, "connected to MongoDB");
        Ok(MongoConnection {
            client,
            database: database.to_string(),
        })
    }
}
