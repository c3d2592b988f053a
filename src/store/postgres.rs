use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::TrackerStore;
use crate::error::AppError;
use crate::models::{
    Cycle, CycleClose, MoodEntry, NewCycle, NewMood, NewReminder, NewSymptom, Note, NoteFields,
    Profile, Reminder, SymptomEntry,
};

const CYCLE_COLUMNS: &str = "id, user_id, start_date, end_date, notes, created_at, updated_at";
const SYMPTOM_COLUMNS: &str = r#"id, user_id, cycle_id, date, "type", severity, created_at"#;
const MOOD_COLUMNS: &str = "id, user_id, cycle_id, date, mood, notes, created_at";
const NOTE_COLUMNS: &str = "id, user_id, title, content, date, created_at, updated_at";
const REMINDER_COLUMNS: &str = r#"id, user_id, title, date, "type", created_at"#;

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TrackerStore for PgStore {
    async fn insert_profile(&self, id: Uuid, name: &str, email: &str) -> Result<Profile, AppError> {
        let profile = sqlx::query_as::<_, Profile>(
            "INSERT INTO profiles (id, name, email) VALUES ($1, $2, $3) RETURNING id, name, email, created_at",
        )
        .bind(id)
        .bind(name)
        .bind(email)
        .fetch_one(&self.pool)
        .await?;
        Ok(profile)
    }

    async fn get_profile(&self, user_id: Uuid) -> Result<Option<Profile>, AppError> {
        let profile = sqlx::query_as::<_, Profile>(
            "SELECT id, name, email, created_at FROM profiles WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(profile)
    }

    async fn insert_cycle(&self, cycle: NewCycle) -> Result<Cycle, AppError> {
        let sql = format!(
            "INSERT INTO cycles (user_id, start_date, notes) VALUES ($1, $2, $3) RETURNING {CYCLE_COLUMNS}"
        );
        let row = sqlx::query_as::<_, Cycle>(&sql)
            .bind(cycle.user_id)
            .bind(cycle.start_date)
            .bind(cycle.notes)
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    async fn find_cycle_for_date(
        &self,
        user_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<Cycle>, AppError> {
        let sql = format!(
            r#"
            SELECT {CYCLE_COLUMNS}
            FROM cycles
            WHERE user_id = $1
              AND start_date <= $2
              AND (end_date IS NULL OR end_date >= $2)
            ORDER BY start_date DESC
            LIMIT 1
            "#
        );
        let row = sqlx::query_as::<_, Cycle>(&sql)
            .bind(user_id)
            .bind(date)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn latest_open_cycle(&self, user_id: Uuid) -> Result<Option<Cycle>, AppError> {
        let sql = format!(
            "SELECT {CYCLE_COLUMNS} FROM cycles WHERE user_id = $1 AND end_date IS NULL ORDER BY start_date DESC LIMIT 1"
        );
        let row = sqlx::query_as::<_, Cycle>(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn close_cycle(
        &self,
        cycle_id: Uuid,
        close: CycleClose,
    ) -> Result<Option<Cycle>, AppError> {
        let sql = format!(
            r#"
            UPDATE cycles SET end_date = $2, notes = $3, updated_at = $4
            WHERE id = $1 AND end_date IS NULL
            RETURNING {CYCLE_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, Cycle>(&sql)
            .bind(cycle_id)
            .bind(close.end_date)
            .bind(close.notes)
            .bind(close.updated_at)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn list_cycles(&self, user_id: Uuid) -> Result<Vec<Cycle>, AppError> {
        let sql = format!(
            "SELECT {CYCLE_COLUMNS} FROM cycles WHERE user_id = $1 ORDER BY start_date DESC"
        );
        let rows = sqlx::query_as::<_, Cycle>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn insert_symptoms(&self, rows: Vec<NewSymptom>) -> Result<Vec<SymptomEntry>, AppError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb = QueryBuilder::<Postgres>::new(
            r#"INSERT INTO symptoms (user_id, cycle_id, date, "type", severity) "#,
        );
        qb.push_values(rows, |mut b, row| {
            b.push_bind(row.user_id)
                .push_bind(row.cycle_id)
                .push_bind(row.date)
                .push_bind(row.symptom_type)
                .push_bind(row.severity.as_str());
        });
        qb.push(" RETURNING ");
        qb.push(SYMPTOM_COLUMNS);

        let inserted = qb
            .build_query_as::<SymptomEntry>()
            .fetch_all(&self.pool)
            .await?;
        Ok(inserted)
    }

    async fn list_symptoms(&self, user_id: Uuid) -> Result<Vec<SymptomEntry>, AppError> {
        let sql = format!(
            "SELECT {SYMPTOM_COLUMNS} FROM symptoms WHERE user_id = $1 ORDER BY date DESC"
        );
        let rows = sqlx::query_as::<_, SymptomEntry>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn insert_mood(&self, mood: NewMood) -> Result<MoodEntry, AppError> {
        let sql = format!(
            "INSERT INTO moods (user_id, cycle_id, date, mood, notes) VALUES ($1, $2, $3, $4, $5) RETURNING {MOOD_COLUMNS}"
        );
        let row = sqlx::query_as::<_, MoodEntry>(&sql)
            .bind(mood.user_id)
            .bind(mood.cycle_id)
            .bind(mood.date)
            .bind(mood.mood)
            .bind(mood.notes)
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    async fn list_moods(&self, user_id: Uuid) -> Result<Vec<MoodEntry>, AppError> {
        let sql = format!("SELECT {MOOD_COLUMNS} FROM moods WHERE user_id = $1 ORDER BY date DESC");
        let rows = sqlx::query_as::<_, MoodEntry>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn insert_note(&self, user_id: Uuid, fields: NoteFields) -> Result<Note, AppError> {
        let sql = format!(
            "INSERT INTO notes (user_id, title, content, date) VALUES ($1, $2, $3, $4) RETURNING {NOTE_COLUMNS}"
        );
        let row = sqlx::query_as::<_, Note>(&sql)
            .bind(user_id)
            .bind(fields.title)
            .bind(fields.content)
            .bind(fields.date)
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    async fn update_note(
        &self,
        user_id: Uuid,
        note_id: Uuid,
        fields: NoteFields,
    ) -> Result<Option<Note>, AppError> {
        let sql = format!(
            r#"
            UPDATE notes SET title = $3, content = $4, date = $5, updated_at = now()
            WHERE id = $1 AND user_id = $2
            RETURNING {NOTE_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, Note>(&sql)
            .bind(note_id)
            .bind(user_id)
            .bind(fields.title)
            .bind(fields.content)
            .bind(fields.date)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn delete_note(&self, user_id: Uuid, note_id: Uuid) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM notes WHERE id = $1 AND user_id = $2")
            .bind(note_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn list_notes(&self, user_id: Uuid) -> Result<Vec<Note>, AppError> {
        let sql = format!("SELECT {NOTE_COLUMNS} FROM notes WHERE user_id = $1 ORDER BY date DESC");
        let rows = sqlx::query_as::<_, Note>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn insert_reminder(&self, reminder: NewReminder) -> Result<Reminder, AppError> {
        let sql = format!(
            r#"INSERT INTO reminders (user_id, title, date, "type") VALUES ($1, $2, $3, $4) RETURNING {REMINDER_COLUMNS}"#
        );
        let row = sqlx::query_as::<_, Reminder>(&sql)
            .bind(reminder.user_id)
            .bind(reminder.title)
            .bind(reminder.date)
            .bind(reminder.reminder_type)
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    async fn delete_reminder(&self, user_id: Uuid, reminder_id: Uuid) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM reminders WHERE id = $1 AND user_id = $2")
            .bind(reminder_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn list_reminders(&self, user_id: Uuid) -> Result<Vec<Reminder>, AppError> {
        let sql = format!(
            "SELECT {REMINDER_COLUMNS} FROM reminders WHERE user_id = $1 ORDER BY date ASC"
        );
        let rows = sqlx::query_as::<_, Reminder>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }
}
