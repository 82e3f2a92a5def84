use crate::calendar::ProjectCalendars;
use crate::timephased::TimephasedResourceAssignment;
use std::path::{Path, PathBuf};

pub use crate::error::{PersistenceError, PersistenceResult};

pub trait CalendarStore {
    fn save_calendars(&self, calendars: &ProjectCalendars) -> PersistenceResult<()>;
    fn load_calendars(&self) -> PersistenceResult<Option<ProjectCalendars>>;
}

/// Keeps a project's calendars in a single JSON file.
#[derive(Debug, Clone)]
pub struct JsonCalendarStore {
    path: PathBuf,
}

impl JsonCalendarStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CalendarStore for JsonCalendarStore {
    fn save_calendars(&self, calendars: &ProjectCalendars) -> PersistenceResult<()> {
        file::save_calendars_to_json(calendars, &self.path)
    }

    fn load_calendars(&self) -> PersistenceResult<Option<ProjectCalendars>> {
        if !self.path.exists() {
            return Ok(None);
        }
        file::load_calendars_from_json(&self.path).map(Some)
    }
}

/// Spans must be ordered by start and must not finish before they start.
pub fn validate_timephased(list: &[TimephasedResourceAssignment]) -> PersistenceResult<()> {
    for assignment in list {
        if assignment.finish < assignment.start {
            return Err(PersistenceError::InvalidData(format!(
                "span starting {} finishes before it starts",
                assignment.start
            )));
        }
    }
    if let Some(pair) = list.windows(2).find(|pair| pair[1].start < pair[0].start) {
        return Err(PersistenceError::InvalidData(format!(
            "span starting {} is out of order after {}",
            pair[1].start, pair[0].start
        )));
    }
    Ok(())
}

pub mod file;

pub use file::{
    load_calendars_from_json, load_config_from_json, load_timephased_from_csv,
    save_calendars_to_json, save_config_to_json, save_timephased_to_csv,
};
