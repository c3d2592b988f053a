use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use super::{latest_open, locate_cycle, TrackerStore};
use crate::error::AppError;
use crate::models::{
    Cycle, CycleClose, MoodEntry, NewCycle, NewMood, NewReminder, NewSymptom, Note, NoteFields,
    Profile, Reminder, SymptomEntry,
};

#[derive(Default)]
struct Tables {
    profiles: Vec<Profile>,
    cycles: Vec<Cycle>,
    symptoms: Vec<SymptomEntry>,
    moods: Vec<MoodEntry>,
    notes: Vec<Note>,
    reminders: Vec<Reminder>,
}

/// In-process store with the same scoping rules as [`super::PgStore`].
///
/// Writes can be made to fail on demand to exercise error paths.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    fail_reminder_inserts: AtomicBool,
    fail_next_write: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_reminder_inserts(&self, fail: bool) {
        self.fail_reminder_inserts.store(fail, Ordering::SeqCst);
    }

    /// The next write of any kind fails with a persistence error.
    pub fn fail_next_write(&self) {
        self.fail_next_write.store(true, Ordering::SeqCst);
    }

    fn check_write(&self) -> Result<(), AppError> {
        if self.fail_next_write.swap(false, Ordering::SeqCst) {
            return Err(AppError::Persistence("simulated store failure".into()));
        }
        Ok(())
    }

    /// Inserts a cycle row as-is, bypassing the start-cycle flow.
    pub fn seed_cycle(
        &self,
        user_id: Uuid,
        start_date: NaiveDate,
        end_date: Option<NaiveDate>,
        notes: Option<&str>,
    ) -> Cycle {
        let now = Utc::now();
        let cycle = Cycle {
            id: Uuid::new_v4(),
            user_id,
            start_date,
            end_date,
            notes: notes.map(str::to_string),
            created_at: now,
            updated_at: now,
        };
        self.tables.lock().unwrap().cycles.push(cycle.clone());
        cycle
    }

    pub fn cycle(&self, cycle_id: Uuid) -> Option<Cycle> {
        self.tables
            .lock()
            .unwrap()
            .cycles
            .iter()
            .find(|c| c.id == cycle_id)
            .cloned()
    }

    /// Every note row regardless of owner.
    pub fn all_notes(&self) -> Vec<Note> {
        self.tables.lock().unwrap().notes.clone()
    }
}

#[async_trait]
impl TrackerStore for MemoryStore {
    async fn insert_profile(&self, id: Uuid, name: &str, email: &str) -> Result<Profile, AppError> {
        self.check_write()?;
        let profile = Profile {
            id,
            name: name.to_string(),
            email: email.to_string(),
            created_at: Utc::now(),
        };
        self.tables.lock().unwrap().profiles.push(profile.clone());
        Ok(profile)
    }

    async fn get_profile(&self, user_id: Uuid) -> Result<Option<Profile>, AppError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.profiles.iter().find(|p| p.id == user_id).cloned())
    }

    async fn insert_cycle(&self, cycle: NewCycle) -> Result<Cycle, AppError> {
        self.check_write()?;
        let now = Utc::now();
        let row = Cycle {
            id: Uuid::new_v4(),
            user_id: cycle.user_id,
            start_date: cycle.start_date,
            end_date: None,
            notes: cycle.notes,
            created_at: now,
            updated_at: now,
        };
        self.tables.lock().unwrap().cycles.push(row.clone());
        Ok(row)
    }

    async fn find_cycle_for_date(
        &self,
        user_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<Cycle>, AppError> {
        let tables = self.tables.lock().unwrap();
        Ok(locate_cycle(&tables.cycles, user_id, date).cloned())
    }

    async fn latest_open_cycle(&self, user_id: Uuid) -> Result<Option<Cycle>, AppError> {
        let tables = self.tables.lock().unwrap();
        Ok(latest_open(&tables.cycles, user_id).cloned())
    }

    async fn close_cycle(
        &self,
        cycle_id: Uuid,
        close: CycleClose,
    ) -> Result<Option<Cycle>, AppError> {
        self.check_write()?;
        let mut tables = self.tables.lock().unwrap();
        let Some(cycle) = tables
            .cycles
            .iter_mut()
            .find(|c| c.id == cycle_id && c.is_open())
        else {
            return Ok(None);
        };

        cycle.end_date = Some(close.end_date);
        cycle.notes = close.notes;
        cycle.updated_at = close.updated_at;
        Ok(Some(cycle.clone()))
    }

    async fn list_cycles(&self, user_id: Uuid) -> Result<Vec<Cycle>, AppError> {
        let tables = self.tables.lock().unwrap();
        let mut rows: Vec<Cycle> = tables
            .cycles
            .iter()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.start_date.cmp(&a.start_date));
        Ok(rows)
    }

    async fn insert_symptoms(&self, rows: Vec<NewSymptom>) -> Result<Vec<SymptomEntry>, AppError> {
        self.check_write()?;
        let now = Utc::now();
        let inserted: Vec<SymptomEntry> = rows
            .into_iter()
            .map(|row| SymptomEntry {
                id: Uuid::new_v4(),
                user_id: row.user_id,
                cycle_id: row.cycle_id,
                date: row.date,
                symptom_type: row.symptom_type,
                severity: row.severity,
                created_at: now,
            })
            .collect();
        self.tables
            .lock()
            .unwrap()
            .symptoms
            .extend(inserted.iter().cloned());
        Ok(inserted)
    }

    async fn list_symptoms(&self, user_id: Uuid) -> Result<Vec<SymptomEntry>, AppError> {
        let tables = self.tables.lock().unwrap();
        let mut rows: Vec<SymptomEntry> = tables
            .symptoms
            .iter()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(rows)
    }

    async fn insert_mood(&self, mood: NewMood) -> Result<MoodEntry, AppError> {
        self.check_write()?;
        let row = MoodEntry {
            id: Uuid::new_v4(),
            user_id: mood.user_id,
            cycle_id: mood.cycle_id,
            date: mood.date,
            mood: mood.mood,
            notes: mood.notes,
            created_at: Utc::now(),
        };
        self.tables.lock().unwrap().moods.push(row.clone());
        Ok(row)
    }

    async fn list_moods(&self, user_id: Uuid) -> Result<Vec<MoodEntry>, AppError> {
        let tables = self.tables.lock().unwrap();
        let mut rows: Vec<MoodEntry> = tables
            .moods
            .iter()
            .filter(|m| m.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(rows)
    }

    async fn insert_note(&self, user_id: Uuid, fields: NoteFields) -> Result<Note, AppError> {
        self.check_write()?;
        let now = Utc::now();
        let note = Note {
            id: Uuid::new_v4(),
            user_id,
            title: fields.title,
            content: fields.content,
            date: fields.date,
            created_at: now,
            updated_at: now,
        };
        self.tables.lock().unwrap().notes.push(note.clone());
        Ok(note)
    }

    async fn update_note(
        &self,
        user_id: Uuid,
        note_id: Uuid,
        fields: NoteFields,
    ) -> Result<Option<Note>, AppError> {
        self.check_write()?;
        let mut tables = self.tables.lock().unwrap();
        let Some(note) = tables
            .notes
            .iter_mut()
            .find(|n| n.id == note_id && n.user_id == user_id)
        else {
            return Ok(None);
        };

        note.title = fields.title;
        note.content = fields.content;
        note.date = fields.date;
        note.updated_at = Utc::now();
        Ok(Some(note.clone()))
    }

    async fn delete_note(&self, user_id: Uuid, note_id: Uuid) -> Result<u64, AppError> {
        self.check_write()?;
        let mut tables = self.tables.lock().unwrap();
        let before = tables.notes.len();
        tables
            .notes
            .retain(|n| !(n.id == note_id && n.user_id == user_id));
        Ok((before - tables.notes.len()) as u64)
    }

    async fn list_notes(&self, user_id: Uuid) -> Result<Vec<Note>, AppError> {
        let tables = self.tables.lock().unwrap();
        let mut rows: Vec<Note> = tables
            .notes
            .iter()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(rows)
    }

    async fn insert_reminder(&self, reminder: NewReminder) -> Result<Reminder, AppError> {
        if self.fail_reminder_inserts.load(Ordering::SeqCst) {
            return Err(AppError::Persistence("simulated reminder failure".into()));
        }
        self.check_write()?;
        let row = Reminder {
            id: Uuid::new_v4(),
            user_id: reminder.user_id,
            title: reminder.title,
            date: reminder.date,
            reminder_type: reminder.reminder_type,
            created_at: Utc::now(),
        };
        self.tables.lock().unwrap().reminders.push(row.clone());
        Ok(row)
    }

    async fn delete_reminder(&self, user_id: Uuid, reminder_id: Uuid) -> Result<u64, AppError> {
        self.check_write()?;
        let mut tables = self.tables.lock().unwrap();
        let before = tables.reminders.len();
        tables
            .reminders
            .retain(|r| !(r.id == reminder_id && r.user_id == user_id));
        Ok((before - tables.reminders.len()) as u64)
    }

    async fn list_reminders(&self, user_id: Uuid) -> Result<Vec<Reminder>, AppError> {
        let tables = self.tables.lock().unwrap();
        let mut rows: Vec<Reminder> = tables
            .reminders
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.date.cmp(&b.date));
        Ok(rows)
    }
}
