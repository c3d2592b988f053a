//! Persistence port for every user-owned table.
//!
//! Every method that reads or mutates user data takes the owner's id and
//! scopes its predicate by it. Updates and deletes that match no row are not
//! errors: they report zero affected rows.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{
    Cycle, CycleClose, MoodEntry, NewCycle, NewMood, NewReminder, NewSymptom, Note, NoteFields,
    Profile, Reminder, SymptomEntry,
};

#[async_trait]
pub trait TrackerStore: Send + Sync {
    async fn insert_profile(&self, id: Uuid, name: &str, email: &str) -> Result<Profile, AppError>;
    async fn get_profile(&self, user_id: Uuid) -> Result<Option<Profile>, AppError>;

    async fn insert_cycle(&self, cycle: NewCycle) -> Result<Cycle, AppError>;
    /// The cycle whose interval contains `date`; open cycles extend forever.
    async fn find_cycle_for_date(
        &self,
        user_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<Cycle>, AppError>;
    async fn latest_open_cycle(&self, user_id: Uuid) -> Result<Option<Cycle>, AppError>;
    /// Closes the cycle if it is still open. `None` when no open row matched.
    async fn close_cycle(&self, cycle_id: Uuid, close: CycleClose)
        -> Result<Option<Cycle>, AppError>;
    async fn list_cycles(&self, user_id: Uuid) -> Result<Vec<Cycle>, AppError>;

    async fn insert_symptoms(&self, rows: Vec<NewSymptom>) -> Result<Vec<SymptomEntry>, AppError>;
    async fn list_symptoms(&self, user_id: Uuid) -> Result<Vec<SymptomEntry>, AppError>;

    async fn insert_mood(&self, mood: NewMood) -> Result<MoodEntry, AppError>;
    async fn list_moods(&self, user_id: Uuid) -> Result<Vec<MoodEntry>, AppError>;

    async fn insert_note(&self, user_id: Uuid, fields: NoteFields) -> Result<Note, AppError>;
    async fn update_note(
        &self,
        user_id: Uuid,
        note_id: Uuid,
        fields: NoteFields,
    ) -> Result<Option<Note>, AppError>;
    async fn delete_note(&self, user_id: Uuid, note_id: Uuid) -> Result<u64, AppError>;
    async fn list_notes(&self, user_id: Uuid) -> Result<Vec<Note>, AppError>;

    async fn insert_reminder(&self, reminder: NewReminder) -> Result<Reminder, AppError>;
    async fn delete_reminder(&self, user_id: Uuid, reminder_id: Uuid) -> Result<u64, AppError>;
    async fn list_reminders(&self, user_id: Uuid) -> Result<Vec<Reminder>, AppError>;
}

/// Picks the latest-starting cycle of `user_id` whose `[start, end]` range
/// contains `date`, both ends inclusive. Overlapping cycles are tolerated.
pub fn locate_cycle<'a, I>(cycles: I, user_id: Uuid, date: NaiveDate) -> Option<&'a Cycle>
where
    I: IntoIterator<Item = &'a Cycle>,
{
    cycles
        .into_iter()
        .filter(|c| c.user_id == user_id && c.start_date <= date)
        .filter(|c| c.end_date.map_or(true, |end| end >= date))
        .max_by_key(|c| c.start_date)
}

/// The most recently started cycle with no end date.
pub fn latest_open<'a, I>(cycles: I, user_id: Uuid) -> Option<&'a Cycle>
where
    I: IntoIterator<Item = &'a Cycle>,
{
    cycles
        .into_iter()
        .filter(|c| c.user_id == user_id && c.is_open())
        .max_by_key(|c| c.start_date)
}
