use serde::{Deserialize, Serialize};

use super::RawSample;

/// 数据库中的原始记录，附带自增 id
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct StoredRaw {
    #[serde(rename = "_id")]
    pub id: i64,
    #[serde(flatten)]
    pub sample: RawSample,
}
