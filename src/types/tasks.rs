use tokio::sync::oneshot;

use super::{DerivedMetrics, RawSample, StoredRaw};
use crate::database::StoreError;

pub type StoreReply<T> = oneshot::Sender<Result<T, StoreError>>;

/// Database task enumeration, executed in order by the database thread
pub enum StoreTask {
    AppendRaw {
        sample: RawSample,
        response_sender: StoreReply<i64>,
    },
    AppendDerived {
        metrics: DerivedMetrics,
        response_sender: StoreReply<i64>,
    },
    MostRecentDerived {
        limit: usize,
        response_sender: StoreReply<Vec<DerivedMetrics>>,
    },
    MostRecentRaw {
        response_sender: StoreReply<Option<StoredRaw>>,
    },
    GetStats {
        response_sender: StoreReply<(usize, usize)>,
    },
    AllDerived {
        response_sender: StoreReply<Vec<DerivedMetrics>>,
    },
}

impl StoreTask {
    pub fn name(&self) -> &'static str {
        match self {
            StoreTask::AppendRaw { .. } => "append_raw",
            StoreTask::AppendDerived { .. } => "append_derived",
            StoreTask::MostRecentDerived { .. } => "most_recent_derived",
            StoreTask::MostRecentRaw { .. } => "most_recent_raw",
            StoreTask::GetStats { .. } => "get_stats",
            StoreTask::AllDerived { .. } => "all_derived",
        }
    }
}
