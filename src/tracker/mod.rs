//! User-facing actions. Each one resolves the caller's session first and
//! scopes every read and write to that user.

pub mod account;
pub mod calendar;
pub mod cycles;
pub mod moods;
pub mod notes;
pub mod reminders;
pub mod symptoms;
