use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::Receiver;
use log::{error, info, warn};

use super::manager::DatabaseManager;
use super::store::StoreError;
use crate::types::{StoreReply, StoreTask};

/// 数据库线程主循环：按到达顺序逐个执行任务，直到收到关闭信号或通道断开
pub fn run_database_handler(
    db_manager: DatabaseManager,
    task_receiver: Receiver<StoreTask>,
    shutdown_signal: Arc<AtomicBool>,
) {
    info!("Database handler thread started");

    while !shutdown_signal.load(Ordering::Relaxed) {
        match task_receiver.recv_timeout(Duration::from_millis(100)) {
            Ok(task) => handle_task(&db_manager, task),
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => {
                // 超时，继续循环检查关闭信号
                continue;
            }
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => {
                info!("Database handler: Task channel disconnected, exiting");
                break;
            }
        }
    }

    info!("Database handler thread exiting gracefully");
}

fn handle_task(db_manager: &DatabaseManager, task: StoreTask) {
    let task_name = task.name();

    match task {
        StoreTask::AppendRaw { sample, response_sender } => {
            let result = db_manager.append_raw(&sample).map_err(StoreError::from);
            respond(task_name, response_sender, result);
        }
        StoreTask::AppendDerived { metrics, response_sender } => {
            let result = db_manager.append_derived(&metrics).map_err(StoreError::from);
            respond(task_name, response_sender, result);
        }
        StoreTask::MostRecentDerived { limit, response_sender } => {
            let result = db_manager.most_recent_derived(limit);
            respond(task_name, response_sender, result);
        }
        StoreTask::MostRecentRaw { response_sender } => {
            let result = db_manager.most_recent_raw().map_err(StoreError::from);
            respond(task_name, response_sender, result);
        }
        StoreTask::GetStats { response_sender } => {
            let result = db_manager.get_stats().map_err(StoreError::from);
            respond(task_name, response_sender, result);
        }
        StoreTask::AllDerived { response_sender } => {
            let result = db_manager.all_derived();
            respond(task_name, response_sender, result);
        }
    }
}

fn respond<T>(task_name: &str, response_sender: StoreReply<T>, result: Result<T, StoreError>) {
    if let Err(e) = &result {
        error!("Database handler: {} failed: {}", task_name, e);
    }

    if response_sender.send(result).is_err() {
        // 请求方已放弃等待（例如 HTTP 连接已断开）
        warn!("Database handler: Requester dropped before {} completed", task_name);
    }
}
