use anyhow::Result;
use async_trait::async_trait;
use redis::AsyncCommands;
use shared::models::DeviceTokens;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Key-value lookup of a user's push delivery targets. `Ok(None)`
/// means the user record itself does not exist, which is distinct from
/// a record with no tokens.
#[async_trait]
pub trait TokenDirectory: Send + Sync {
    async fn lookup(&self, user_id: &str) -> Result<Option<DeviceTokens>>;
    async fn save(&self, user_id: &str, tokens: DeviceTokens) -> Result<()>;
}

#[derive(Clone)]
pub struct RedisTokenDirectory {
    conn_manager: redis::aio::ConnectionManager,
    key_prefix: String,
}

impl RedisTokenDirectory {
    pub fn new(conn_manager: redis::aio::ConnectionManager, key_prefix: String) -> Self {
        Self {
            conn_manager,
            key_prefix,
        }
    }

    fn tokens_key(&self, user_id: &str) -> String {
        format!("{}:user_tokens:{}", self.key_prefix, user_id)
    }
}

#[async_trait]
impl TokenDirectory for RedisTokenDirectory {
    async fn lookup(&self, user_id: &str) -> Result<Option<DeviceTokens>> {
        let mut conn = self.conn_manager.clone();
        let key = self.tokens_key(user_id);
        let json: Option<String> = conn.get(key).await?;
        match json {
            Some(s) => Ok(Some(serde_json::from_str(&s)?)),
            None => Ok(None),
        }
    }

    async fn save(&self, user_id: &str, tokens: DeviceTokens) -> Result<()> {
        let mut conn = self.conn_manager.clone();
        let key = self.tokens_key(user_id);
        let json = serde_json::to_string(&tokens)?;
        conn.set::<_, _, ()>(key, json).await?;
        Ok(())
    }
}

/// In-process directory for local development and tests.
#[derive(Debug, Default)]
pub struct MemoryTokenDirectory {
    users: RwLock<HashMap<String, DeviceTokens>>,
}

#[async_trait]
impl TokenDirectory for MemoryTokenDirectory {
    async fn lookup(&self, user_id: &str) -> Result<Option<DeviceTokens>> {
        let users = self.users.read().await;
        Ok(users.get(user_id).cloned())
    }

    async fn save(&self, user_id: &str, tokens: DeviceTokens) -> Result<()> {
        let mut users = self.users.write().await;
        users.insert(user_id.to_string(), tokens);
        Ok(())
    }
}
