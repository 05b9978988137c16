/// Data models for stored records
///
/// Projects and sessions share one on-disk shape: a JSON object keyed by
/// record id, each entry tagged with `element_type`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

/// Discriminator written into every record as `element_type`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementType {
    Project,
    Session,
}

impl std::fmt::Display for ElementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ElementType::Project => "project",
            ElementType::Session => "session",
        };
        write!(f, "{}", s)
    }
}

/// Project status, only ever set at creation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    #[default]
    Active,
    Inactive,
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Status::Active => "active",
            Status::Inactive => "inactive",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Status::Active),
            "inactive" => Ok(Status::Inactive),
            other => Err(format!(
                "invalid status '{}' (expected 'active' or 'inactive')",
                other
            )),
        }
    }
}

/// A tracked goal with a target duration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
    pub duration: u64,
    // Older files were written without these two
    #[serde(default)]
    pub time_done: u64,
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub sessions: Vec<String>,
}

impl Project {
    pub fn new(name: impl Into<String>, duration: u64, time_done: u64, status: Status) -> Self {
        Self {
            name: name.into(),
            duration,
            time_done,
            status,
            sessions: Vec::new(),
        }
    }
}

/// One logged block of work against a project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub name: String,
    /// Project id, lookup only
    pub project: String,
    pub duration: u64,
    pub date: NaiveDate,
}

impl Session {
    /// Deterministic id: `{name}_{date}_{duration}`
    pub fn id(&self) -> String {
        format!("{}_{}_{}", self.name, self.date.format("%Y-%m-%d"), self.duration)
    }
}

/// A stored entry. The variant decides `element_type` on write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "element_type", rename_all = "snake_case")]
pub enum Record {
    Project(Project),
    Session(Session),
}

impl Record {
    pub fn element_type(&self) -> ElementType {
        match self {
            Record::Project(_) => ElementType::Project,
            Record::Session(_) => ElementType::Session,
        }
    }

    pub fn as_project(&self) -> Option<&Project> {
        match self {
            Record::Project(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_project_mut(&mut self) -> Option<&mut Project> {
        match self {
            Record::Project(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_session(&self) -> Option<&Session> {
        match self {
            Record::Session(s) => Some(s),
            _ => None,
        }
    }
}

impl From<Project> for Record {
    fn from(project: Project) -> Self {
        Record::Project(project)
    }
}

impl From<Session> for Record {
    fn from(session: Session) -> Self {
        Record::Session(session)
    }
}

/// Which records a fetch should return
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeFilter {
    Any,
    Only(ElementType),
}

impl TypeFilter {
    pub fn matches(&self, record: &Record) -> bool {
        match self {
            TypeFilter::Any => true,
            TypeFilter::Only(kind) => record.element_type() == *kind,
        }
    }
}

/// The keyed collection held by one store file
///
/// Backed by a `BTreeMap` so saved files keep a stable key order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Records(BTreeMap<String, Record>);

impl Records {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.0.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&Record> {
        self.0.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Record> {
        self.0.get_mut(id)
    }

    /// Insert or replace, returning the previous record
    pub fn insert(&mut self, id: impl Into<String>, record: impl Into<Record>) -> Option<Record> {
        self.0.insert(id.into(), record.into())
    }

    pub fn remove(&mut self, id: &str) -> Option<Record> {
        self.0.remove(id)
    }

    pub fn ids(&self) -> Vec<String> {
        self.0.keys().cloned().collect()
    }

    /// Copy out the records accepted by `filter`
    pub fn filtered(&self, filter: TypeFilter) -> Records {
        Records(
            self.0
                .iter()
                .filter(|(_, record)| filter.matches(record))
                .map(|(id, record)| (id.clone(), record.clone()))
                .collect(),
        )
    }

    /// Look up a project by id, ignoring records of other kinds
    pub fn project(&self, id: &str) -> Option<&Project> {
        self.get(id).and_then(Record::as_project)
    }

    pub fn project_mut(&mut self, id: &str) -> Option<&mut Project> {
        self.get_mut(id).and_then(Record::as_project_mut)
    }

    pub fn projects(&self) -> impl Iterator<Item = (&String, &Project)> {
        self.0
            .iter()
            .filter_map(|(id, record)| record.as_project().map(|p| (id, p)))
    }

    pub fn sessions(&self) -> impl Iterator<Item = (&String, &Session)> {
        self.0
            .iter()
            .filter_map(|(id, record)| record.as_session().map(|s| (id, s)))
    }
}
