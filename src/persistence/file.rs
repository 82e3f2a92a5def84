use super::{PersistenceError, PersistenceResult};
use crate::calendar::ProjectCalendars;
use crate::config::ProjectConfig;
use crate::duration::Duration;
use crate::timephased::TimephasedResourceAssignment;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;

const DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

pub fn save_config_to_json<P: AsRef<Path>>(config: &ProjectConfig, path: P) -> PersistenceResult<()> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, config)?;
    Ok(())
}

pub fn load_config_from_json<P: AsRef<Path>>(path: P) -> PersistenceResult<ProjectConfig> {
    let file = File::open(path)?;
    Ok(serde_json::from_reader(file)?)
}

pub fn save_calendars_to_json<P: AsRef<Path>>(
    calendars: &ProjectCalendars,
    path: P,
) -> PersistenceResult<()> {
    save_config_to_json(&calendars.to_config(), path)
}

pub fn load_calendars_from_json<P: AsRef<Path>>(path: P) -> PersistenceResult<ProjectCalendars> {
    let config = load_config_from_json(path)?;
    Ok(ProjectCalendars::from_config(&config)?)
}

#[derive(Default, Serialize, Deserialize)]
struct TimephasedCsvRecord {
    start: String,
    finish: String,
    total_work: String,
    #[serde(default)]
    work_per_day: String,
    #[serde(default)]
    modified: String,
}

impl From<&TimephasedResourceAssignment> for TimephasedCsvRecord {
    fn from(assignment: &TimephasedResourceAssignment) -> Self {
        Self {
            start: format_datetime(assignment.start),
            finish: format_datetime(assignment.finish),
            total_work: assignment.total_work.to_string(),
            work_per_day: format_option_duration(assignment.work_per_day),
            modified: assignment.modified.to_string(),
        }
    }
}

impl TimephasedCsvRecord {
    fn into_assignment(self) -> PersistenceResult<TimephasedResourceAssignment> {
        let start = parse_datetime(&self.start)?;
        let finish = parse_datetime(&self.finish)?;
        if finish < start {
            return Err(PersistenceError::InvalidData(format!(
                "span finishes at {finish} before it starts at {start}"
            )));
        }
        Ok(TimephasedResourceAssignment {
            start,
            finish,
            total_work: self.total_work.trim().parse::<Duration>()?,
            work_per_day: parse_option_duration(&self.work_per_day)?,
            modified: parse_bool(&self.modified)?.unwrap_or(false),
        })
    }
}

pub fn save_timephased_to_csv<P: AsRef<Path>>(
    list: &[TimephasedResourceAssignment],
    path: P,
) -> PersistenceResult<()> {
    let file = File::create(path)?;
    let mut writer = csv::Writer::from_writer(file);
    for assignment in list {
        writer.serialize(TimephasedCsvRecord::from(assignment))?;
    }
    writer.flush()?;
    Ok(())
}

pub fn load_timephased_from_csv<P: AsRef<Path>>(
    path: P,
) -> PersistenceResult<Vec<TimephasedResourceAssignment>> {
    let file = File::open(path)?;
    let mut reader = csv::Reader::from_reader(file);
    let mut list = Vec::new();
    for record in reader.deserialize::<TimephasedCsvRecord>() {
        list.push(record?.into_assignment()?);
    }
    super::validate_timephased(&list)?;
    tracing::debug!(records = list.len(), "loaded timephased work from csv");
    Ok(list)
}

fn format_datetime(value: NaiveDateTime) -> String {
    value.format(DATE_TIME_FORMAT).to_string()
}

/// Accepts `YYYY-MM-DDTHH:MM:SS`, the same with a space separator, or a
/// bare date meaning midnight.
fn parse_datetime(input: &str) -> PersistenceResult<NaiveDateTime> {
    let trimmed = input.trim();
    NaiveDateTime::parse_from_str(trimmed, DATE_TIME_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S"))
        .or_else(|_| NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").map(|d| d.and_time(NaiveTime::MIN)))
        .map_err(|e| PersistenceError::InvalidData(format!("invalid date-time '{input}': {e}")))
}

fn format_option_duration(value: Option<Duration>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn parse_option_duration(input: &str) -> PersistenceResult<Option<Duration>> {
    if input.trim().is_empty() {
        return Ok(None);
    }
    Ok(Some(input.trim().parse::<Duration>()?))
}

fn parse_bool(input: &str) -> PersistenceResult<Option<bool>> {
    if input.trim().is_empty() {
        return Ok(None);
    }
    match input.trim().to_ascii_lowercase().as_str() {
        "true" => Ok(Some(true)),
        "false" => Ok(Some(false)),
        other => Err(PersistenceError::InvalidData(format!(
            "invalid boolean '{other}'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_time_accepts_several_layouts() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 4)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();
        assert_eq!(parse_datetime("2024-03-04T08:00:00").unwrap(), expected);
        assert_eq!(parse_datetime(" 2024-03-04 08:00:00 ").unwrap(), expected);
        assert_eq!(
            parse_datetime("2024-03-04").unwrap(),
            expected.date().and_time(NaiveTime::MIN)
        );
        assert!(parse_datetime("04/03/2024").is_err());
    }

    #[test]
    fn blank_optional_fields_read_as_none() {
        assert_eq!(parse_option_duration("  ").unwrap(), None);
        assert_eq!(parse_bool("").unwrap(), None);
        assert!(parse_bool("maybe").is_err());
    }
}
