//! Bot and execution-log persistence
//!
//! The core flushes state changes through [`BotStore`] fire-and-forget;
//! a store failure is logged upstream and never stops trading.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

use crate::state::{Bot, ExecutionLogEntry, EXECUTION_LOG_CAP};

#[async_trait]
pub trait BotStore: Send + Sync {
    async fn load_bots(&self) -> Result<Vec<Bot>>;
    async fn save_bot(&self, bot: &Bot) -> Result<()>;
    async fn remove_bot(&self, bot_id: Uuid) -> Result<()>;
    async fn load_logs(&self) -> Result<HashMap<Uuid, Vec<ExecutionLogEntry>>>;
    async fn append_log(&self, entry: &ExecutionLogEntry) -> Result<()>;
}

/// JSON-file store: `bots.json` and `execution-logs.json` under a data
/// directory, rewritten whole on each change. Writes are serialized
/// through one async mutex; readers go through it too so a load never
/// observes a half-written file.
pub struct JsonFileStore {
    bots_path: PathBuf,
    logs_path: PathBuf,
    guard: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(data_dir: impl AsRef<Path>) -> Result<Self> {
        let data_dir = data_dir.as_ref();
        std::fs::create_dir_all(data_dir)
            .with_context(|| format!("Failed to create data dir {}", data_dir.display()))?;

        Ok(Self {
            bots_path: data_dir.join("bots.json"),
            logs_path: data_dir.join("execution-logs.json"),
            guard: Mutex::new(()),
        })
    }
}

async fn read_json<T>(path: &Path) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    if !path.exists() {
        debug!("no existing file at {}, starting empty", path.display());
        return Ok(T::default());
    }
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Failed to parse {}", path.display()))
}

async fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let raw = serde_json::to_string_pretty(value).context("Failed to serialize")?;
    tokio::fs::write(path, raw)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))
}

#[async_trait]
impl BotStore for JsonFileStore {
    async fn load_bots(&self) -> Result<Vec<Bot>> {
        let _guard = self.guard.lock().await;
        let bots: Vec<Bot> = read_json(&self.bots_path).await?;
        info!("loaded {} bots from storage", bots.len());
        Ok(bots)
    }

    async fn save_bot(&self, bot: &Bot) -> Result<()> {
        let _guard = self.guard.lock().await;
        let mut bots: Vec<Bot> = read_json(&self.bots_path).await?;
        match bots.iter_mut().find(|b| b.id == bot.id) {
            Some(existing) => *existing = bot.clone(),
            None => bots.push(bot.clone()),
        }
        write_json(&self.bots_path, &bots).await
    }

    async fn remove_bot(&self, bot_id: Uuid) -> Result<()> {
        let _guard = self.guard.lock().await;

        let mut bots: Vec<Bot> = read_json(&self.bots_path).await?;
        bots.retain(|b| b.id != bot_id);
        write_json(&self.bots_path, &bots).await?;

        let mut logs: HashMap<Uuid, Vec<ExecutionLogEntry>> =
            read_json(&self.logs_path).await?;
        if logs.remove(&bot_id).is_some() {
            write_json(&self.logs_path, &logs).await?;
        }
        Ok(())
    }

    async fn load_logs(&self) -> Result<HashMap<Uuid, Vec<ExecutionLogEntry>>> {
        let _guard = self.guard.lock().await;
        read_json(&self.logs_path).await
    }

    async fn append_log(&self, entry: &ExecutionLogEntry) -> Result<()> {
        let _guard = self.guard.lock().await;
        let mut logs: HashMap<Uuid, Vec<ExecutionLogEntry>> =
            read_json(&self.logs_path).await?;

        let log = logs.entry(entry.bot_id).or_default();
        log.push(entry.clone());
        if log.len() > EXECUTION_LOG_CAP {
            let excess = log.len() - EXECUTION_LOG_CAP;
            log.drain(..excess);
        }

        write_json(&self.logs_path, &logs).await
    }
}
