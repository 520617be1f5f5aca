use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BlockHead {
    pub level: i64,
    pub hash: String,
    pub timestamp: DateTime<Utc>,
}
