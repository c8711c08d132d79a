//! Database storage and the entity store interface.
//!
//! All records live in a single JSON file loaded into a `Database`. Mutations go
//! through a [`Session`], which implements [`EntityStore`] for every record type and
//! appends to the activity history on each change. Analytics never touch this module;
//! they take the plain record slices.

use std::cmp::Ordering;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use std::str::FromStr;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::access::Viewer;
use crate::entities::{Activity, Project, Resource, Team, User};
use crate::error::{DashboardError, Result};
use crate::fields::*;
use crate::task::{BoardTask, DailyTask, Task};

/// File name of the database inside the data directory.
pub const DB_FILE_NAME: &str = "dashboard.json";

/// In-memory database for every record type.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Database {
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub teams: Vec<Team>,
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub daily_tasks: Vec<DailyTask>,
    #[serde(default)]
    pub board_tasks: Vec<BoardTask>,
    #[serde(default)]
    pub resources: Vec<Resource>,
    #[serde(default)]
    pub activities: Vec<Activity>,
}

impl Database {
    /// Load the database from a JSON file. A missing file is an empty database; an
    /// unreadable or corrupt one is an error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "no database yet, starting empty");
            return Ok(Database::default());
        }
        let buf = fs::read_to_string(path).map_err(|e| DashboardError::io(path, e))?;
        let db: Database = serde_json::from_str(&buf).map_err(|source| DashboardError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(
            path = %path.display(),
            projects = db.projects.len(),
            daily_tasks = db.daily_tasks.len(),
            board_tasks = db.board_tasks.len(),
            "database loaded"
        );
        Ok(db)
    }

    /// Save database to JSON file using atomic write (temp file + rename).
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|e| DashboardError::io(dir, e))?;
        }
        let tmp = path.with_extension("json.tmp");
        let data = serde_json::to_string_pretty(self)?;
        let mut f = File::create(&tmp).map_err(|e| DashboardError::io(&tmp, e))?;
        f.write_all(data.as_bytes())
            .and_then(|_| f.flush())
            .map_err(|e| DashboardError::io(&tmp, e))?;
        fs::rename(&tmp, path).map_err(|e| DashboardError::io(path, e))?;
        debug!(path = %path.display(), "database saved");
        Ok(())
    }

    pub fn project(&self, id: u64) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == id)
    }

    pub fn team(&self, id: u64) -> Option<&Team> {
        self.teams.iter().find(|t| t.id == id)
    }

    pub fn user(&self, id: u64) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    fn next_activity_id(&self) -> Result<u64> {
        next_id("activity", self.activities.iter().map(|a| a.id))
    }
}

/// One past the highest id in use, or 1 for an empty collection.
fn next_id(kind: &str, ids: impl Iterator<Item = u64>) -> Result<u64> {
    let max = ids.max().unwrap_or(0);
    max.checked_add(1)
        .ok_or_else(|| DashboardError::Invalid(format!("no {kind} id left after {max}")))
}

/// A value a listing can be ordered by.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum SortField {
    Int(i64),
    Text(String),
}

/// Sort key plus direction, written `date` or `-date` for descending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    pub key: SortKey,
    pub descending: bool,
}

impl FromStr for SortSpec {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        let (descending, name) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };
        let key = <SortKey as clap::ValueEnum>::from_str(name, true)
            .map_err(|_| format!("unknown sort key '{name}' (expected id, date, name or priority)"))?;
        Ok(SortSpec { key, descending })
    }
}

/// Record types the store can hold.
pub trait Record: Clone {
    /// Name used in messages and the activity history.
    fn kind() -> &'static str;
    fn id(&self) -> u64;
    fn set_id(&mut self, id: u64);
    fn display_name(&self) -> &str;

    fn sort_field(&self, key: SortKey) -> Option<SortField> {
        match key {
            SortKey::Id => Some(SortField::Int(self.id() as i64)),
            SortKey::Name => Some(SortField::Text(self.display_name().to_lowercase())),
            SortKey::Date | SortKey::Priority => None,
        }
    }

    /// Set creation/update timestamps.
    fn stamp(&mut self, _now: i64, _created: bool) {}

    /// Clear references to a deleted record of this type elsewhere in the database.
    fn detach(_db: &mut Database, _id: u64) {}
}

/// Gives typed access to the collection of `T` inside a `Database`.
pub trait Collection<T> {
    fn records(&self) -> &Vec<T>;
    fn records_mut(&mut self) -> &mut Vec<T>;
}

impl Collection<Project> for Database {
    fn records(&self) -> &Vec<Project> {
        &self.projects
    }
    fn records_mut(&mut self) -> &mut Vec<Project> {
        &mut self.projects
    }
}

impl Collection<Team> for Database {
    fn records(&self) -> &Vec<Team> {
        &self.teams
    }
    fn records_mut(&mut self) -> &mut Vec<Team> {
        &mut self.teams
    }
}

impl Collection<User> for Database {
    fn records(&self) -> &Vec<User> {
        &self.users
    }
    fn records_mut(&mut self) -> &mut Vec<User> {
        &mut self.users
    }
}

impl Collection<DailyTask> for Database {
    fn records(&self) -> &Vec<DailyTask> {
        &self.daily_tasks
    }
    fn records_mut(&mut self) -> &mut Vec<DailyTask> {
        &mut self.daily_tasks
    }
}

impl Collection<BoardTask> for Database {
    fn records(&self) -> &Vec<BoardTask> {
        &self.board_tasks
    }
    fn records_mut(&mut self) -> &mut Vec<BoardTask> {
        &mut self.board_tasks
    }
}

impl Collection<Resource> for Database {
    fn records(&self) -> &Vec<Resource> {
        &self.resources
    }
    fn records_mut(&mut self) -> &mut Vec<Resource> {
        &mut self.resources
    }
}

/// Create/read/update/delete over one record type.
pub trait EntityStore<T: Record> {
    /// All records, in insertion order unless `sort` is given.
    fn list(&self, sort: Option<SortSpec>) -> Vec<T>;

    fn get(&self, id: u64) -> Option<T>;

    /// Insert `record` under a freshly assigned id and return it.
    fn create(&mut self, record: T) -> Result<T>;

    /// Apply `change` to the record with `id` and return the result.
    fn update<F>(&mut self, id: u64, change: F) -> Result<T>
    where
        F: FnOnce(&mut T);

    /// Remove the record with `id` and return it.
    fn delete(&mut self, id: u64) -> Result<T>;
}

/// Sort records per `spec`; records without a value for the key go last, ties by id.
pub fn sort_records<T: Record>(records: &mut [T], spec: SortSpec) {
    records.sort_by(|a, b| {
        let ord = match (a.sort_field(spec.key), b.sort_field(spec.key)) {
            (Some(x), Some(y)) if spec.descending => y.cmp(&x),
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        ord.then(a.id().cmp(&b.id()))
    });
}

/// A database opened on behalf of one viewer.
pub struct Session<'a> {
    db: &'a mut Database,
    viewer: Viewer,
    now: i64,
}

impl<'a> Session<'a> {
    pub fn new(db: &'a mut Database, viewer: Viewer) -> Self {
        Self::at(db, viewer, Utc::now().timestamp())
    }

    /// Session with a fixed clock.
    pub fn at(db: &'a mut Database, viewer: Viewer, now: i64) -> Self {
        Session { db, viewer, now }
    }

    fn log<T: Record>(&mut self, action: ActionKind, record: &T) -> Result<()> {
        let activity = Activity {
            id: self.db.next_activity_id()?,
            entity_type: T::kind().to_string(),
            entity_id: record.id(),
            entity_name: record.display_name().to_string(),
            action,
            performed_by: self.viewer.user_id,
            performed_by_role: Some(self.viewer.role),
            at_utc: self.now,
        };
        self.db.activities.push(activity);
        Ok(())
    }
}

impl<T> EntityStore<T> for Session<'_>
where
    T: Record,
    Database: Collection<T>,
{
    fn list(&self, sort: Option<SortSpec>) -> Vec<T> {
        let mut records = <Database as Collection<T>>::records(&*self.db).clone();
        if let Some(spec) = sort {
            sort_records(&mut records, spec);
        }
        records
    }

    fn get(&self, id: u64) -> Option<T> {
        <Database as Collection<T>>::records(&*self.db)
            .iter()
            .find(|r| r.id() == id)
            .cloned()
    }

    #[tracing::instrument(skip(self, record), fields(kind = T::kind()))]
    fn create(&mut self, mut record: T) -> Result<T> {
        let id = next_id(
            T::kind(),
            <Database as Collection<T>>::records(&*self.db).iter().map(|r| r.id()),
        )?;
        record.set_id(id);
        record.stamp(self.now, true);
        <Database as Collection<T>>::records_mut(self.db).push(record.clone());
        self.log(ActionKind::Create, &record)?;
        info!(id, "created");
        Ok(record)
    }

    #[tracing::instrument(skip(self, change), fields(kind = T::kind()))]
    fn update<F>(&mut self, id: u64, change: F) -> Result<T>
    where
        F: FnOnce(&mut T),
    {
        let now = self.now;
        let record = <Database as Collection<T>>::records_mut(self.db)
            .iter_mut()
            .find(|r| r.id() == id)
            .ok_or(DashboardError::NotFound { kind: T::kind(), id })?;
        change(record);
        record.set_id(id);
        record.stamp(now, false);
        let updated = record.clone();
        self.log(ActionKind::Update, &updated)?;
        info!("updated");
        Ok(updated)
    }

    #[tracing::instrument(skip(self), fields(kind = T::kind()))]
    fn delete(&mut self, id: u64) -> Result<T> {
        let records = <Database as Collection<T>>::records_mut(self.db);
        let idx = records
            .iter()
            .position(|r| r.id() == id)
            .ok_or(DashboardError::NotFound { kind: T::kind(), id })?;
        let removed = records.remove(idx);
        T::detach(self.db, id);
        self.log(ActionKind::Delete, &removed)?;
        info!("deleted");
        Ok(removed)
    }
}

impl<S: StatusSet> Record for Task<S> {
    fn kind() -> &'static str {
        S::TASK_KIND
    }
    fn id(&self) -> u64 {
        self.id
    }
    fn set_id(&mut self, id: u64) {
        self.id = id;
    }
    fn display_name(&self) -> &str {
        &self.title
    }
    fn sort_field(&self, key: SortKey) -> Option<SortField> {
        match key {
            SortKey::Id => Some(SortField::Int(self.id as i64)),
            SortKey::Name => Some(SortField::Text(self.title.to_lowercase())),
            SortKey::Date => Some(SortField::Text(self.date.clone())).filter(|_| !self.date.is_empty()),
            SortKey::Priority => self.priority.map(|p| SortField::Int(p as i64)),
        }
    }
    fn stamp(&mut self, now: i64, created: bool) {
        if created {
            self.created_at_utc = now;
        }
        self.updated_at_utc = now;
    }
}

impl Record for Project {
    fn kind() -> &'static str {
        "project"
    }
    fn id(&self) -> u64 {
        self.id
    }
    fn set_id(&mut self, id: u64) {
        self.id = id;
    }
    fn display_name(&self) -> &str {
        &self.name
    }
    fn sort_field(&self, key: SortKey) -> Option<SortField> {
        match key {
            SortKey::Id => Some(SortField::Int(self.id as i64)),
            SortKey::Name => Some(SortField::Text(self.name.to_lowercase())),
            SortKey::Date => self.start_date.map(|d| SortField::Text(d.to_string())),
            SortKey::Priority => self.priority.map(|p| SortField::Int(p as i64)),
        }
    }
    fn stamp(&mut self, now: i64, created: bool) {
        if created {
            self.created_at_utc = now;
        }
        self.updated_at_utc = now;
    }
    fn detach(db: &mut Database, id: u64) {
        for t in db.daily_tasks.iter_mut().filter(|t| t.project_id == Some(id)) {
            t.project_id = None;
        }
        for t in db.board_tasks.iter_mut().filter(|t| t.project_id == Some(id)) {
            t.project_id = None;
        }
        db.resources.retain(|r| r.project_id != id);
    }
}

impl Record for Team {
    fn kind() -> &'static str {
        "team"
    }
    fn id(&self) -> u64 {
        self.id
    }
    fn set_id(&mut self, id: u64) {
        self.id = id;
    }
    fn display_name(&self) -> &str {
        &self.name
    }
    fn stamp(&mut self, now: i64, created: bool) {
        if created {
            self.created_at_utc = now;
        }
        self.updated_at_utc = now;
    }
    fn detach(db: &mut Database, id: u64) {
        for p in db.projects.iter_mut().filter(|p| p.team_id == Some(id)) {
            p.team_id = None;
        }
    }
}

impl Record for User {
    fn kind() -> &'static str {
        "user"
    }
    fn id(&self) -> u64 {
        self.id
    }
    fn set_id(&mut self, id: u64) {
        self.id = id;
    }
    fn display_name(&self) -> &str {
        &self.display_name
    }
    fn sort_field(&self, key: SortKey) -> Option<SortField> {
        match key {
            SortKey::Id => Some(SortField::Int(self.id as i64)),
            SortKey::Name => Some(SortField::Text(self.display_name.to_lowercase())),
            SortKey::Date => self.hire_date.map(|d| SortField::Text(d.to_string())),
            SortKey::Priority => None,
        }
    }
    fn stamp(&mut self, now: i64, created: bool) {
        if created {
            self.created_at_utc = now;
        }
    }
    fn detach(db: &mut Database, id: u64) {
        for t in db.daily_tasks.iter_mut().filter(|t| t.user_id == Some(id)) {
            t.user_id = None;
        }
        for t in db.board_tasks.iter_mut().filter(|t| t.user_id == Some(id)) {
            t.user_id = None;
        }
        for p in db.projects.iter_mut() {
            p.member_ids.retain(|m| *m != id);
            if p.manager_id == Some(id) {
                p.manager_id = None;
            }
        }
        for t in db.teams.iter_mut() {
            t.member_ids.retain(|m| *m != id);
            if t.lead_id == Some(id) {
                t.lead_id = None;
            }
        }
    }
}

impl Record for Resource {
    fn kind() -> &'static str {
        "resource"
    }
    fn id(&self) -> u64 {
        self.id
    }
    fn set_id(&mut self, id: u64) {
        self.id = id;
    }
    fn display_name(&self) -> &str {
        &self.title
    }
    fn stamp(&mut self, now: i64, created: bool) {
        if created {
            self.created_at_utc = now;
        }
    }
}

/// Split comma-separated inputs, trimming and dropping empties.
pub fn split_list(inputs: &[String]) -> Vec<String> {
    let mut out = Vec::new();
    for raw in inputs {
        for part in raw.split(',') {
            let item = part.trim();
            if !item.is_empty() {
                out.push(item.to_string());
            }
        }
    }
    out.sort();
    out.dedup();
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::TaskStatus;

    fn session(db: &mut Database) -> Session<'_> {
        Session::at(db, Viewer::admin(), 1_700_000_000)
    }

    #[test]
    fn create_assigns_sequential_ids_and_logs() {
        let mut db = Database::default();
        let mut s = session(&mut db);
        let a = s.create(Project::new(0, "Website")).unwrap();
        let b = s.create(Project::new(0, "Mobile")).unwrap();
        assert_eq!((a.id, b.id), (1, 2));
        assert_eq!(a.created_at_utc, 1_700_000_000);
        assert_eq!(db.activities.len(), 2);
        assert_eq!(db.activities[1].entity_name, "Mobile");
        assert_eq!(db.activities[1].action, ActionKind::Create);
    }

    #[test]
    fn update_applies_partial_change_and_keeps_id() {
        let mut db = Database::default();
        let mut s = session(&mut db);
        let t = s
            .create(DailyTask::new(0, "write docs", TaskStatus::Pending, "2024-03-01"))
            .unwrap();
        let updated: DailyTask = s
            .update(t.id, |t: &mut DailyTask| {
                t.status = TaskStatus::Completed;
                t.id = 999;
            })
            .unwrap();
        assert_eq!(updated.id, t.id);
        assert_eq!(updated.status, TaskStatus::Completed);
        assert_eq!(updated.title, "write docs");
    }

    #[test]
    fn missing_ids_are_not_found() {
        let mut db = Database::default();
        let mut s = session(&mut db);
        let err = EntityStore::<User>::delete(&mut s, 42).unwrap_err();
        assert!(matches!(err, DashboardError::NotFound { kind: "user", id: 42 }));
        assert!(EntityStore::<User>::get(&s, 42).is_none());
    }

    #[test]
    fn deleting_a_project_detaches_tasks_and_drops_resources() {
        let mut db = Database::default();
        let mut s = session(&mut db);
        let p = s.create(Project::new(0, "Website")).unwrap();
        let mut t = DailyTask::new(0, "t", TaskStatus::Pending, "2024-03-01");
        t.project_id = Some(p.id);
        let t = s.create(t).unwrap();
        s.create(Resource {
            id: 0,
            project_id: p.id,
            title: "brief".into(),
            description: None,
            kind: ResourceKind::Link,
            content: "https://example.com".into(),
            file_name: None,
            file_size: None,
            created_at_utc: 0,
        })
        .unwrap();

        EntityStore::<Project>::delete(&mut s, p.id).unwrap();
        let t: DailyTask = s.get(t.id).unwrap();
        assert_eq!(t.project_id, None);
        assert!(db.resources.is_empty());
    }

    #[test]
    fn create_fails_once_ids_run_out() {
        let mut db = Database::default();
        db.projects.push(Project::new(u64::MAX, "Last"));
        let mut s = session(&mut db);
        let err = s.create(Project::new(0, "Overflow")).unwrap_err();
        assert!(matches!(err, DashboardError::Invalid(_)));
        assert_eq!(db.projects.len(), 1);
        assert!(db.activities.is_empty());
    }

    #[test]
    fn next_id_starts_at_one() {
        assert_eq!(next_id("team", std::iter::empty()).unwrap(), 1);
        assert_eq!(next_id("team", [4, 9, 2].into_iter()).unwrap(), 10);
        assert!(next_id("team", [u64::MAX].into_iter()).is_err());
    }

    #[test]
    fn list_sorts_descending_with_missing_last() {
        let mut db = Database::default();
        let mut s = session(&mut db);
        for date in ["2024-03-01", "", "2024-03-05"] {
            s.create(DailyTask::new(0, "t", TaskStatus::Pending, date)).unwrap();
        }
        let spec: SortSpec = "-date".parse().unwrap();
        let listed: Vec<DailyTask> = s.list(Some(spec));
        let dates: Vec<&str> = listed.iter().map(|t| t.date.as_str()).collect();
        assert_eq!(dates, vec!["2024-03-05", "2024-03-01", ""]);
    }

    #[test]
    fn sort_spec_parsing() {
        assert_eq!(
            "name".parse::<SortSpec>().unwrap(),
            SortSpec {
                key: SortKey::Name,
                descending: false
            }
        );
        assert!("-colour".parse::<SortSpec>().is_err());
    }

    #[test]
    fn split_list_trims_and_dedups() {
        let got = split_list(&["rust, go".into(), "go,,sql".into()]);
        assert_eq!(got, vec!["go", "rust", "sql"]);
    }
}
