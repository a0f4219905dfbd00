//! Redis-backed chore store.
//!
//! Chores live as JSON strings under `/chore/{node}`. Every create is also
//! announced on a pub/sub channel so downstream consumers can react.

use async_trait::async_trait;
use chore_types::{Chore, ChoreTemplate};
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use serde::Serialize;

use crate::config::RedisConfig;
use crate::error::DaemonResult;

#[async_trait]
pub trait ChoreStore: Send + Sync {
    /// Chore currently stored for `node`, if any.
    async fn get(&self, node: &str) -> DaemonResult<Option<Chore>>;

    /// Store a chore for `node` built from `template`, replacing whatever was
    /// there.
    async fn create(
        &self,
        template: ChoreTemplate,
        person: &str,
        node: &str,
    ) -> DaemonResult<Chore>;
}

/// Notification published for every chore written.
#[derive(Debug, Serialize)]
struct ChoreNotification<'a> {
    action: &'static str,
    chore: &'a Chore,
}

pub fn chore_key(node: &str) -> String {
    format!("/chore/{}", node)
}

pub struct RedisChoreStore {
    connection: MultiplexedConnection,
    channel: String,
}

impl RedisChoreStore {
    pub async fn connect(config: &RedisConfig) -> DaemonResult<Self> {
        let client = redis::Client::open(config.url())?;
        let connection = client.get_multiplexed_async_connection().await?;

        tracing::info!(
            "Connected to chore store at {}:{} (channel: {})",
            config.host,
            config.port,
            config.channel
        );

        Ok(Self {
            connection,
            channel: config.channel.clone(),
        })
    }
}

#[async_trait]
impl ChoreStore for RedisChoreStore {
    async fn get(&self, node: &str) -> DaemonResult<Option<Chore>> {
        let mut conn = self.connection.clone();
        let raw: Option<String> = conn.get(chore_key(node)).await?;

        match raw {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn create(
        &self,
        template: ChoreTemplate,
        person: &str,
        node: &str,
    ) -> DaemonResult<Chore> {
        let chore = Chore::from_template(template, person, node);
        let record = serde_json::to_string(&chore)?;
        let notification = notification_message(&chore)?;

        let mut conn = self.connection.clone();
        let () = redis::pipe()
            .atomic()
            .set(chore_key(node), record)
            .ignore()
            .publish(&self.channel, notification)
            .ignore()
            .query_async(&mut conn)
            .await?;

        Ok(chore)
    }
}

fn notification_message(chore: &Chore) -> DaemonResult<String> {
    Ok(serde_json::to_string(&ChoreNotification {
        action: "create",
        chore,
    })?)
}
