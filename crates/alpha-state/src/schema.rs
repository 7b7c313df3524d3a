//! SurrealDB row mapping for the `decisions` table

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::QueueError;
use crate::storage_traits::{QueueStatus, QueuedDecision};

/// Serialize chrono DateTime as a SurrealDB datetime
mod surreal_datetime {
    use chrono::{DateTime, Utc};
    use serde::{self, Deserialize, Deserializer, Serializer};
    use surrealdb::sql::Datetime as SurrealDatetime;

    pub fn serialize<S>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serde::Serialize::serialize(&SurrealDatetime::from(*date), serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let sd = SurrealDatetime::deserialize(deserializer)?;
        Ok(DateTime::from(sd))
    }
}

/// Optional variant of [`surreal_datetime`]
mod surreal_datetime_opt {
    use chrono::{DateTime, Utc};
    use serde::{self, Deserialize, Deserializer, Serializer};
    use surrealdb::sql::Datetime as SurrealDatetime;

    pub fn serialize<S>(date: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let sd = date.map(SurrealDatetime::from);
        serde::Serialize::serialize(&sd, serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let sd = Option::<SurrealDatetime>::deserialize(deserializer)?;
        Ok(sd.map(DateTime::from))
    }
}

/// One row of the `decisions` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionRow {
    /// SurrealDB record ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<surrealdb::sql::Thing>,
    /// Decision identifier (unique)
    pub decision_id: String,
    /// Enqueue order, monotonically increasing
    pub seq: u64,
    /// Immutable decision payload
    pub payload: serde_json::Value,
    /// "PENDING" | "DELIVERED" | "FAILED"
    pub status: String,
    pub retry_count: u32,
    pub max_retries: u32,
    #[serde(with = "surreal_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(default, with = "surreal_datetime_opt")]
    pub delivered_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_error: Option<String>,
}

impl DecisionRow {
    /// New pending row.
    pub fn new(decision_id: String, seq: u64, payload: serde_json::Value, max_retries: u32) -> Self {
        DecisionRow {
            id: None,
            decision_id,
            seq,
            payload,
            status: QueueStatus::Pending.as_str().to_string(),
            retry_count: 0,
            max_retries,
            created_at: Utc::now(),
            delivered_at: None,
            last_error: None,
        }
    }

    /// Convert into the backend-agnostic record.
    pub fn into_queued(self) -> Result<QueuedDecision, QueueError> {
        Ok(QueuedDecision {
            status: self.status.parse()?,
            decision_id: self.decision_id,
            payload: self.payload,
            retry_count: self.retry_count,
            max_retries: self.max_retries,
            created_at: self.created_at,
            delivered_at: self.delivered_at,
            last_error: self.last_error,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn new_row_is_pending_without_record_id() {
        let row = DecisionRow::new("AD-S1-20260101000000".into(), 1, json!({"a": 1}), 3);
        let json = serde_json::to_string(&row).expect("serialize");
        assert!(json.contains("PENDING"));
        assert!(!json.contains("\"id\""));
    }

    #[test]
    fn into_queued_parses_status() {
        let mut row = DecisionRow::new("AD-S2-20260101000000".into(), 2, json!({}), 3);
        row.status = "FAILED".into();
        let queued = row.into_queued().expect("known status");
        assert_eq!(queued.status, QueueStatus::Failed);
    }

    #[test]
    fn into_queued_rejects_unknown_status() {
        let mut row = DecisionRow::new("AD-S3-20260101000000".into(), 3, json!({}), 3);
        row.status = "EXPIRED".into();
        assert!(row.into_queued().is_err());
    }
}
