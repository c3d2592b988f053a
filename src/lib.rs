//! Menstrual cycle tracking backend.
//!
//! Users log cycle starts and ends, symptoms, moods, notes and reminders.
//! Symptom and mood entries are linked to the cycle whose date range holds
//! them, and the calendar marks period days for a month view.

pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod store;
pub mod tracker;
