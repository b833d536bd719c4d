use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JournalEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub entry_date: NaiveDate,
    pub body: String,
    pub journal_type: JournalType,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, Default)]
#[sqlx(type_name = "journal_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum JournalType {
    Gratitude,
    Reflection,
    Goals,
    #[default]
    Free,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateJournalRequest {
    pub entry_date: Option<NaiveDate>,
    #[validate(length(min = 1, max = 20000, message = "Entry must be 1-20000 characters"))]
    pub body: String,
    pub journal_type: Option<JournalType>,
}

#[derive(Debug, Deserialize)]
pub struct JournalQuery {
    pub journal_type: Option<JournalType>,
}
