//! MongoDB connection

use std::time::Duration;

use bson::doc;
use mongodb::{options::ClientOptions, Client, Database};
use tracing::info;

use crate::types::{Result, ValidatorError};

/// Startup gives up on an unreachable server after this long
const CONNECT_TIMEOUT: Duration = Duration::from_secs(3);

/// Handle on the dashboard database
#[derive(Clone, Debug)]
pub struct MongoClient {
    db: Database,
}

impl MongoClient {
    /// Connect to `uri` and check that `db_name` answers a ping
    pub async fn connect(uri: &str, db_name: &str) -> Result<Self> {
        info!(db = %db_name, "Connecting to MongoDB");

        let mut options = ClientOptions::parse(uri)
            .await
            .map_err(|e| ValidatorError::Database(format!("invalid MongoDB URI: {}", e)))?;
        options.app_name = Some("validator-dashboard".to_string());
        options.connect_timeout = Some(CONNECT_TIMEOUT);
        options.server_selection_timeout = Some(CONNECT_TIMEOUT);

        let db = Client::with_options(options)?.database(db_name);
        db.run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| ValidatorError::Database(format!("MongoDB ping failed: {}", e)))?;

        info!(db = %db_name, "MongoDB ready");
        Ok(Self { db })
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}
