//! Aggregated error row for SeaORM.

use sea_orm::entity::prelude::*;

use vigil_core::domain::{ErrorEntry, ExceptionInfo, RequestInfo};

/// One row per fingerprint; the upsert in `PostgresStorage::add` keeps the
/// row's count in step with concurrent writers.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "alert_events")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub fingerprint: String,
    pub exception_type: String,
    pub message: String,
    #[sea_orm(column_type = "Text")]
    pub stack_trace: String,
    pub sample_url: String,
    pub sample_method: String,
    pub sample_headers: Json,
    pub count: i64,
    pub first_seen: DateTimeWithTimeZone,
    pub last_seen: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Conversion from SeaORM Model to the domain entry.
impl From<Model> for ErrorEntry {
    fn from(model: Model) -> Self {
        let headers: Vec<(String, String)> =
            serde_json::from_value(model.sample_headers).unwrap_or_default();

        Self {
            fingerprint: model.fingerprint,
            count: model.count.max(1) as u64,
            exception: ExceptionInfo::new(model.exception_type, model.message, model.stack_trace),
            request: RequestInfo::new(model.sample_url, model.sample_method).with_headers(headers),
            first_seen: model.first_seen.into(),
            last_seen: model.last_seen.into(),
        }
    }
}
