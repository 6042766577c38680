use std::time::Duration;

use anyhow::{Context, Result};
use mongodb::{options::ClientOptions, Client, Database};

pub type MongoClient = Client;
pub type MongoDatabase = Database;

/// Connect and verify the server is reachable before handing the client out.
pub async fn create_mongo_client(database_url: &str, connect_timeout: Duration) -> Result<MongoClient> {
    let mut options = ClientOptions::parse(database_url)
        .await
        .context("Invalid MongoDB connection string")?;
    options.connect_timeout = Some(connect_timeout);
    options.server_selection_timeout = Some(connect_timeout);

    let client = Client::with_options(options)?;

    ping(&client).await.context("MongoDB ping failed")?;
    tracing::info!("Connected to MongoDB");
    Ok(client)
}

pub fn get_database(client: &MongoClient, database_name: &str) -> MongoDatabase {
    client.database(database_name)
}

pub async fn ping(client: &MongoClient) -> Result<()> {
    client
        .database("admin")
        .run_command(mongodb::bson::doc! {"ping": 1}, None)
        .await?;
    Ok(())
}
