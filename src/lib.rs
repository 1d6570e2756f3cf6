pub mod cli;
pub mod display;
pub mod error;
pub mod manager;
pub mod models;
pub mod roster;
pub mod schema;
pub mod settings;

pub use error::{Error, Result};
pub use models::{AttendanceEntry, RosterEntry, Status, Student, StudentAttendance};

use crate::manager::AttendanceManager;
use crate::settings::Settings;

/// Builds the store from `config.toml`, `.env`, and the environment.
pub fn create_default_manager() -> Result<AttendanceManager> {
    let settings = Settings::load()?;

    AttendanceManager::from_settings(&settings)
}
