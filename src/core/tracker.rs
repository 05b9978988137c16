// Keeps projects and their sessions in step
//
// A session only gets written after its project has been updated, so a
// session never points at a project that didn't exist when it was logged.

use crate::config::Config;
use crate::error::{Result, TrackerError};
use crate::store::{
    DeleteReport, ElementType, Project, PutOutcome, RecordStore, Session, Status, TypeFilter,
};
use chrono::{Local, NaiveDate};
use std::ops::Deref;
use tracing::{info, warn};

/// Literal accepted in place of a date
pub const TODAY: &str = "today";

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Input for a new project, straight from the user
#[derive(Debug, Clone)]
pub struct NewProject {
    pub name: String,
    pub duration: i64,
    pub time_done: i64,
    pub status: Status,
}

/// Input for a new session, straight from the user
#[derive(Debug, Clone)]
pub struct NewSession {
    pub project: String,
    pub name: String,
    pub duration: i64,
    /// `today` or `YYYY-MM-DD`
    pub date: String,
}

/// A session that made it into the store
#[derive(Debug, Clone, PartialEq)]
pub struct SessionAdded {
    pub id: String,
    pub session: Session,
    pub outcome: PutOutcome,
}

/// Records returned by a listing
///
/// `store_present` is false when the backing file doesn't exist yet, which
/// is different from a store with nothing matching.
#[derive(Debug, Clone, PartialEq)]
pub struct Listing<T> {
    pub items: Vec<(String, T)>,
    pub store_present: bool,
}

impl<T> Deref for Listing<T> {
    type Target = [(String, T)];

    fn deref(&self) -> &Self::Target {
        &self.items
    }
}

pub struct Tracker {
    projects: RecordStore,
    sessions: RecordStore,
}

impl Tracker {
    pub fn new(config: &Config) -> Self {
        Self {
            projects: RecordStore::new(&config.projects_path),
            sessions: RecordStore::new(&config.sessions_path),
        }
    }

    pub fn projects_store(&self) -> &RecordStore {
        &self.projects
    }

    pub fn sessions_store(&self) -> &RecordStore {
        &self.sessions
    }

    /// Whether a project with this id is stored
    pub fn project_exists(&self, id: &str) -> Result<bool> {
        Ok(self.project(id)?.is_some())
    }

    pub fn project(&self, id: &str) -> Result<Option<Project>> {
        Ok(self.projects.load()?.project(id).cloned())
    }

    /// Validate and store a project
    ///
    /// The project's name is its id. With `overwrite` false an existing
    /// project is left alone and `PutOutcome::Cancelled` comes back.
    pub fn add_project(&self, input: NewProject, overwrite: bool) -> Result<PutOutcome> {
        let name = validate_name(&input.name)?;
        let duration = validate_duration(input.duration)?;
        let time_done = validate_duration(input.time_done)?;

        let project = Project::new(name, duration, time_done, input.status);
        self.projects.put(name, project, overwrite)
    }

    /// Projects, optionally only those with `status`
    pub fn list_projects(&self, status: Option<Status>) -> Result<Listing<Project>> {
        let fetched = self
            .projects
            .fetch_by_type(TypeFilter::Only(ElementType::Project))?;

        Ok(Listing {
            items: fetched
                .records
                .projects()
                .filter(|(_, p)| status.map_or(true, |s| p.status == s))
                .map(|(id, p)| (id.clone(), p.clone()))
                .collect(),
            store_present: fetched.store_present,
        })
    }

    /// Sessions, optionally only those logged against `project`
    pub fn list_sessions(&self, project: Option<&str>) -> Result<Listing<Session>> {
        let fetched = self
            .sessions
            .fetch_by_type(TypeFilter::Only(ElementType::Session))?;

        Ok(Listing {
            items: fetched
                .records
                .sessions()
                .filter(|(_, s)| project.map_or(true, |p| s.project == p))
                .map(|(id, s)| (id.clone(), s.clone()))
                .collect(),
            store_present: fetched.store_present,
        })
    }

    /// Record a session against a project
    ///
    /// Validates the input, updates the project, then writes the session.
    /// The sessions store is locked and loaded before the project is
    /// touched, so an unreadable sessions file fails without side effects.
    /// If writing the session fails afterwards the project update is
    /// reverted. Session ids are deterministic, so logging the same session
    /// twice replaces it.
    pub fn add_session(&self, input: NewSession) -> Result<SessionAdded> {
        let name = validate_name(&input.name)?;
        let duration = validate_duration(input.duration)?;
        let date = parse_date(&input.date, Local::now().date_naive())?;

        let session = Session {
            name: name.to_string(),
            project: input.project.clone(),
            duration,
            date,
        };
        let id = session.id();

        let _sessions_lock = self.sessions.lock()?;
        let mut sessions = self.sessions.load()?;

        if !self.attach_session(&input.project, &id, duration)? {
            return Err(TrackerError::ProjectNotFound(input.project));
        }

        let outcome = match sessions.insert(id.as_str(), session.clone()) {
            Some(_) => PutOutcome::Replaced,
            None => PutOutcome::Inserted,
        };

        if let Err(e) = self.sessions.save(&sessions) {
            warn!(session = %id, error = %e, "session write failed, reverting project");
            if let Err(revert) = self.detach_session(&input.project, &id, duration) {
                warn!(project = %input.project, error = %revert, "could not revert project");
            }
            return Err(e);
        }

        info!(session = %id, project = %session.project, "session added");

        Ok(SessionAdded {
            id,
            session,
            outcome,
        })
    }

    /// Link a session id to a project and add its duration
    ///
    /// # Returns
    /// * `Ok(true)` - Project updated and saved
    /// * `Ok(false)` - No such project; nothing written
    pub fn attach_session(&self, project_id: &str, session_id: &str, duration: u64) -> Result<bool> {
        self.projects.update(|records| match records.project_mut(project_id) {
            Some(project) => {
                project.sessions.push(session_id.to_string());
                project.time_done = project.time_done.saturating_add(duration);
                Ok(true)
            }
            None => {
                warn!(project = project_id, session = session_id, "project not found");
                Ok(false)
            }
        })
    }

    // Undo one attach_session: drop the last matching id and its duration
    fn detach_session(&self, project_id: &str, session_id: &str, duration: u64) -> Result<()> {
        self.projects.update(|records| {
            if let Some(project) = records.project_mut(project_id) {
                if let Some(pos) = project.sessions.iter().rposition(|s| s == session_id) {
                    project.sessions.remove(pos);
                    project.time_done = project.time_done.saturating_sub(duration);
                }
            }
            Ok(())
        })
    }

    /// Reset a project's sessions and time done
    ///
    /// The session records themselves stay in the sessions store.
    pub fn purge_project_sessions(&self, project_id: &str) -> Result<()> {
        self.projects.update(|records| match records.project_mut(project_id) {
            Some(project) => {
                project.sessions.clear();
                project.time_done = 0;
                Ok(())
            }
            None => Err(TrackerError::ProjectNotFound(project_id.to_string())),
        })?;

        info!(project = project_id, "project sessions purged");
        Ok(())
    }

    /// Delete projects by id
    ///
    /// `proceed` is the user's answer; `false` deletes nothing.
    pub fn delete_projects<S: AsRef<str>>(&self, ids: &[S], proceed: bool) -> Result<DeleteReport> {
        self.projects.delete_many(ids, proceed)
    }

    /// Delete every stored project, one by one
    pub fn delete_all_projects(&self, proceed: bool) -> Result<DeleteReport> {
        if !proceed {
            return Ok(DeleteReport::cancelled());
        }

        let ids = self.projects.load()?.ids();
        self.projects.delete_many(&ids, true)
    }

    /// Empty the projects store
    pub fn purge_projects(&self) -> Result<()> {
        self.projects.clear()
    }

    /// Empty the sessions store
    pub fn purge_sessions(&self) -> Result<()> {
        self.sessions.clear()
    }
}

/// Reject negative durations
pub fn validate_duration(value: i64) -> Result<u64> {
    u64::try_from(value).map_err(|_| TrackerError::InvalidDuration(value))
}

fn validate_name(name: &str) -> Result<&str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(TrackerError::InvalidName(name.to_string()));
    }
    Ok(trimmed)
}

/// Parse `today` or a strict `YYYY-MM-DD` date
pub fn parse_date(raw: &str, today: NaiveDate) -> Result<NaiveDate> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case(TODAY) {
        return Ok(today);
    }

    // chrono accepts unpadded fields; only the canonical form is allowed
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .ok()
        .filter(|date| date.format(DATE_FORMAT).to_string() == raw)
        .ok_or_else(|| TrackerError::InvalidDate(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn setup() -> (TempDir, Tracker) {
        let temp = TempDir::new().unwrap();
        let tracker = Tracker::new(&Config::for_dir(temp.path()));
        (temp, tracker)
    }

    fn new_project(name: &str, duration: i64) -> NewProject {
        NewProject {
            name: name.to_string(),
            duration,
            time_done: 0,
            status: Status::Active,
        }
    }

    fn new_session(project: &str, name: &str, duration: i64, date: &str) -> NewSession {
        NewSession {
            project: project.to_string(),
            name: name.to_string(),
            duration,
            date: date.to_string(),
        }
    }

    #[test]
    fn test_add_project() {
        let (_temp, tracker) = setup();

        let outcome = tracker.add_project(new_project("thesis", 1200), false).unwrap();
        assert_eq!(outcome, PutOutcome::Inserted);

        let project = tracker.project("thesis").unwrap().unwrap();
        assert_eq!(project.duration, 1200);
        assert_eq!(project.time_done, 0);
        assert!(project.sessions.is_empty());
    }

    #[test]
    fn test_add_project_negative_duration() {
        let (_temp, tracker) = setup();

        let result = tracker.add_project(new_project("thesis", -1), false);
        match result {
            Err(TrackerError::InvalidDuration(-1)) => {}
            other => panic!("Expected InvalidDuration error, got {:?}", other),
        }
        assert!(!tracker.projects_store().exists());
    }

    #[test]
    fn test_add_project_negative_time_done() {
        let (_temp, tracker) = setup();

        let mut input = new_project("thesis", 10);
        input.time_done = -3;
        assert!(matches!(
            tracker.add_project(input, false),
            Err(TrackerError::InvalidDuration(-3))
        ));
    }

    #[test]
    fn test_add_project_empty_name() {
        let (_temp, tracker) = setup();
        assert!(matches!(
            tracker.add_project(new_project("  ", 10), false),
            Err(TrackerError::InvalidName(_))
        ));
    }

    #[test]
    fn test_add_existing_project_declined() {
        let (_temp, tracker) = setup();
        tracker.add_project(new_project("thesis", 1200), false).unwrap();
        let before = fs::read(tracker.projects_store().path()).unwrap();

        let outcome = tracker.add_project(new_project("thesis", 5), false).unwrap();

        assert_eq!(outcome, PutOutcome::Cancelled);
        assert_eq!(fs::read(tracker.projects_store().path()).unwrap(), before);
    }

    #[test]
    fn test_add_session_updates_project() {
        let (_temp, tracker) = setup();
        tracker.add_project(new_project("thesis", 1200), false).unwrap();

        let added = tracker
            .add_session(new_session("thesis", "writing", 90, "2024-01-05"))
            .unwrap();

        assert_eq!(added.id, "writing_2024-01-05_90");
        assert_eq!(added.outcome, PutOutcome::Inserted);

        let project = tracker.project("thesis").unwrap().unwrap();
        assert_eq!(project.time_done, 90);
        assert_eq!(project.sessions, vec!["writing_2024-01-05_90".to_string()]);
        assert_eq!(crate::core::Progress::percentage(&project).floor(), 7.0);

        let sessions = tracker.list_sessions(Some("thesis")).unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].1.duration, 90);
    }

    #[test]
    fn test_add_sessions_accumulate() {
        let (_temp, tracker) = setup();
        tracker.add_project(new_project("thesis", 1200), false).unwrap();

        tracker
            .add_session(new_session("thesis", "writing", 90, "2024-01-05"))
            .unwrap();
        tracker
            .add_session(new_session("thesis", "reading", 45, "2024-01-06"))
            .unwrap();

        let project = tracker.project("thesis").unwrap().unwrap();
        assert_eq!(project.time_done, 135);
        assert_eq!(
            project.sessions,
            vec![
                "writing_2024-01-05_90".to_string(),
                "reading_2024-01-06_45".to_string()
            ]
        );
    }

    #[test]
    fn test_add_session_unknown_project() {
        let (_temp, tracker) = setup();
        tracker.add_project(new_project("thesis", 1200), false).unwrap();
        let projects_before = fs::read(tracker.projects_store().path()).unwrap();

        let result = tracker.add_session(new_session("novel", "writing", 90, "2024-01-05"));

        match result {
            Err(TrackerError::ProjectNotFound(id)) => assert_eq!(id, "novel"),
            other => panic!("Expected ProjectNotFound error, got {:?}", other),
        }
        assert!(!tracker.sessions_store().exists());
        assert_eq!(fs::read(tracker.projects_store().path()).unwrap(), projects_before);
    }

    #[test]
    fn test_add_session_corrupt_sessions_store_leaves_project() {
        let (_temp, tracker) = setup();
        tracker.add_project(new_project("thesis", 1200), false).unwrap();
        fs::write(tracker.sessions_store().path(), "{ broken").unwrap();
        let projects_before = fs::read(tracker.projects_store().path()).unwrap();

        for _ in 0..3 {
            let result = tracker.add_session(new_session("thesis", "writing", 90, "2024-01-05"));
            match result {
                Err(TrackerError::CorruptData { path, .. }) => assert!(path.ends_with("sessions.json")),
                other => panic!("Expected CorruptData error, got {:?}", other),
            }
        }

        assert_eq!(fs::read(tracker.projects_store().path()).unwrap(), projects_before);
        let project = tracker.project("thesis").unwrap().unwrap();
        assert_eq!(project.time_done, 0);
        assert!(project.sessions.is_empty());
    }

    #[test]
    fn test_add_session_failed_write_reverts_project() {
        let (temp, tracker) = setup();
        tracker.add_project(new_project("thesis", 1200), false).unwrap();
        tracker
            .add_session(new_session("thesis", "reading", 45, "2024-01-04"))
            .unwrap();
        let projects_before = fs::read(tracker.projects_store().path()).unwrap();

        // A directory where the temp file should go makes the save fail
        fs::create_dir(temp.path().join(".sessions.json.tmp")).unwrap();

        let result = tracker.add_session(new_session("thesis", "writing", 90, "2024-01-05"));

        assert!(matches!(result, Err(TrackerError::Io(_))));
        assert_eq!(fs::read(tracker.projects_store().path()).unwrap(), projects_before);
        let project = tracker.project("thesis").unwrap().unwrap();
        assert_eq!(project.time_done, 45);
        assert_eq!(project.sessions, vec!["reading_2024-01-04_45".to_string()]);
        assert_eq!(tracker.list_sessions(None).unwrap().len(), 1);
    }

    #[test]
    fn test_add_session_bad_input_writes_nothing() {
        let (_temp, tracker) = setup();
        tracker.add_project(new_project("thesis", 1200), false).unwrap();

        assert!(matches!(
            tracker.add_session(new_session("thesis", "writing", 90, "05/01/2024")),
            Err(TrackerError::InvalidDate(_))
        ));
        assert!(matches!(
            tracker.add_session(new_session("thesis", "writing", -90, "2024-01-05")),
            Err(TrackerError::InvalidDuration(-90))
        ));

        assert_eq!(tracker.project("thesis").unwrap().unwrap().time_done, 0);
        assert!(!tracker.sessions_store().exists());
    }

    #[test]
    fn test_add_session_today() {
        let (_temp, tracker) = setup();
        tracker.add_project(new_project("thesis", 1200), false).unwrap();

        let added = tracker
            .add_session(new_session("thesis", "writing", 30, "today"))
            .unwrap();

        assert_eq!(added.session.date, Local::now().date_naive());
    }

    #[test]
    fn test_purge_project_sessions() {
        let (_temp, tracker) = setup();
        tracker.add_project(new_project("thesis", 1200), false).unwrap();
        tracker
            .add_session(new_session("thesis", "writing", 90, "2024-01-05"))
            .unwrap();

        tracker.purge_project_sessions("thesis").unwrap();
        let project = tracker.project("thesis").unwrap().unwrap();
        assert_eq!(project.time_done, 0);
        assert!(project.sessions.is_empty());

        // Idempotent
        tracker.purge_project_sessions("thesis").unwrap();
        assert_eq!(tracker.project("thesis").unwrap().unwrap(), project);

        // Session records are left behind
        assert_eq!(tracker.list_sessions(None).unwrap().len(), 1);
    }

    #[test]
    fn test_purge_unknown_project() {
        let (_temp, tracker) = setup();
        assert!(matches!(
            tracker.purge_project_sessions("ghost"),
            Err(TrackerError::ProjectNotFound(_))
        ));
    }

    #[test]
    fn test_list_projects_by_status() {
        let (_temp, tracker) = setup();
        tracker.add_project(new_project("thesis", 1200), false).unwrap();
        let mut garden = new_project("garden", 60);
        garden.status = Status::Inactive;
        tracker.add_project(garden, false).unwrap();

        assert_eq!(tracker.list_projects(None).unwrap().len(), 2);

        let inactive = tracker.list_projects(Some(Status::Inactive)).unwrap();
        assert_eq!(inactive.len(), 1);
        assert_eq!(inactive[0].0, "garden");
    }

    #[test]
    fn test_list_without_stores() {
        let (_temp, tracker) = setup();

        let projects = tracker.list_projects(None).unwrap();
        assert!(projects.is_empty());
        assert!(!projects.store_present);

        let sessions = tracker.list_sessions(None).unwrap();
        assert!(sessions.is_empty());
        assert!(!sessions.store_present);
    }

    #[test]
    fn test_list_empty_match_with_store() {
        let (_temp, tracker) = setup();
        tracker.add_project(new_project("thesis", 1200), false).unwrap();

        let inactive = tracker.list_projects(Some(Status::Inactive)).unwrap();
        assert!(inactive.is_empty());
        assert!(inactive.store_present);
    }

    #[test]
    fn test_delete_all_projects() {
        let (_temp, tracker) = setup();
        tracker.add_project(new_project("thesis", 1200), false).unwrap();
        tracker.add_project(new_project("garden", 60), false).unwrap();

        let report = tracker.delete_all_projects(false).unwrap();
        assert!(report.cancelled);
        assert_eq!(tracker.list_projects(None).unwrap().len(), 2);

        let report = tracker.delete_all_projects(true).unwrap();
        assert_eq!(report.deleted_count(), 2);
        assert!(tracker.list_projects(None).unwrap().is_empty());
    }

    #[test]
    fn test_session_left_dangling_after_project_delete() {
        let (_temp, tracker) = setup();
        tracker.add_project(new_project("thesis", 1200), false).unwrap();
        tracker
            .add_session(new_session("thesis", "writing", 90, "2024-01-05"))
            .unwrap();

        tracker.delete_projects(&["thesis"], true).unwrap();

        let sessions = tracker.list_sessions(None).unwrap();
        assert_eq!(sessions[0].1.project, "thesis");
        assert!(!tracker.project_exists("thesis").unwrap());
    }

    #[test]
    fn test_purge_stores() {
        let (_temp, tracker) = setup();
        tracker.add_project(new_project("thesis", 1200), false).unwrap();
        tracker
            .add_session(new_session("thesis", "writing", 90, "2024-01-05"))
            .unwrap();

        tracker.purge_sessions().unwrap();
        assert!(tracker.list_sessions(None).unwrap().is_empty());
        assert_eq!(tracker.project("thesis").unwrap().unwrap().time_done, 90);

        tracker.purge_projects().unwrap();
        assert!(tracker.list_projects(None).unwrap().is_empty());
    }

    #[test]
    fn test_parse_date() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 14).unwrap();

        assert_eq!(parse_date("today", today).unwrap(), today);
        assert_eq!(
            parse_date("2024-01-05", today).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 5).unwrap()
        );

        for bad in [
            "2024-1-5",
            "2024-01-5",
            "02024-01-05",
            "2024-02-30",
            "05-01-2024",
            "2024/01/05",
            "",
            "yesterday",
        ] {
            assert!(
                matches!(parse_date(bad, today), Err(TrackerError::InvalidDate(_))),
                "{} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_validate_duration() {
        assert_eq!(validate_duration(0).unwrap(), 0);
        assert_eq!(validate_duration(90).unwrap(), 90);
        assert!(validate_duration(-1).is_err());
    }
}
