//! Handle to the database thread.
//!
//! The DuckDB connection lives on a single dedicated thread. Everything else
//! talks to it through a cloneable [`StoreHandle`], which enqueues a
//! [`StoreTask`] and waits for the reply on a oneshot channel.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Sender, TrySendError};
use log::{error, warn};
use tokio::sync::oneshot;

use super::handlers::run_database_handler;
use super::manager::DatabaseManager;
use crate::types::{DerivedMetrics, RawSample, StoreReply, StoreTask, StoredRaw};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(String),
    #[error("database queue is full")]
    QueueFull,
    #[error("database thread is not running")]
    Disconnected,
    #[error("corrupt record: {0}")]
    CorruptRecord(String),
}

impl From<duckdb::Error> for StoreError {
    fn from(e: duckdb::Error) -> Self {
        StoreError::Database(e.to_string())
    }
}

type PendingReply<T> = oneshot::Receiver<Result<T, StoreError>>;

#[derive(Clone, Debug)]
pub struct StoreHandle {
    task_sender: Sender<StoreTask>,
}

/// 启动数据库线程，返回可克隆的句柄
pub fn spawn_store(
    db_manager: DatabaseManager,
    channel_capacity: usize,
    shutdown_signal: Arc<AtomicBool>,
) -> (StoreHandle, JoinHandle<()>) {
    let (task_sender, task_receiver) = bounded(channel_capacity);
    let join_handle = thread::spawn(move || {
        run_database_handler(db_manager, task_receiver, shutdown_signal);
    });
    (StoreHandle::new(task_sender), join_handle)
}

impl StoreHandle {
    pub fn new(task_sender: Sender<StoreTask>) -> Self {
        Self { task_sender }
    }

    fn submit<T>(
        &self,
        make_task: impl FnOnce(StoreReply<T>) -> StoreTask,
    ) -> Result<PendingReply<T>, StoreError> {
        let (response_sender, response_receiver) = oneshot::channel();

        // 不阻塞调用方：队列满时直接报错
        match self.task_sender.try_send(make_task(response_sender)) {
            Ok(()) => Ok(response_receiver),
            Err(TrySendError::Full(task)) => {
                warn!("Database task queue is full, {} not sent", task.name());
                Err(StoreError::QueueFull)
            }
            Err(TrySendError::Disconnected(task)) => {
                error!("Database task channel disconnected, {} not sent", task.name());
                Err(StoreError::Disconnected)
            }
        }
    }

    async fn request<T>(
        &self,
        make_task: impl FnOnce(StoreReply<T>) -> StoreTask,
    ) -> Result<T, StoreError> {
        let pending = self.submit(make_task)?;
        pending.await.map_err(|_| StoreError::Disconnected)?
    }

    /// Must not be called from inside an async runtime.
    fn request_blocking<T>(
        &self,
        make_task: impl FnOnce(StoreReply<T>) -> StoreTask,
    ) -> Result<T, StoreError> {
        let pending = self.submit(make_task)?;
        pending.blocking_recv().map_err(|_| StoreError::Disconnected)?
    }

    pub async fn append_raw(&self, sample: RawSample) -> Result<i64, StoreError> {
        self.request(|response_sender| StoreTask::AppendRaw { sample, response_sender })
            .await
    }

    pub async fn append_derived(&self, metrics: DerivedMetrics) -> Result<i64, StoreError> {
        self.request(|response_sender| StoreTask::AppendDerived { metrics, response_sender })
            .await
    }

    pub async fn most_recent_derived(&self, limit: usize) -> Result<Vec<DerivedMetrics>, StoreError> {
        self.request(|response_sender| StoreTask::MostRecentDerived { limit, response_sender })
            .await
    }

    pub async fn most_recent_raw(&self) -> Result<Option<StoredRaw>, StoreError> {
        self.request(|response_sender| StoreTask::MostRecentRaw { response_sender })
            .await
    }

    pub fn most_recent_derived_blocking(&self, limit: usize) -> Result<Vec<DerivedMetrics>, StoreError> {
        self.request_blocking(|response_sender| StoreTask::MostRecentDerived { limit, response_sender })
    }

    pub fn stats_blocking(&self) -> Result<(usize, usize), StoreError> {
        self.request_blocking(|response_sender| StoreTask::GetStats { response_sender })
    }

    pub fn all_derived_blocking(&self) -> Result<Vec<DerivedMetrics>, StoreError> {
        self.request_blocking(|response_sender| StoreTask::AllDerived { response_sender })
    }
}
