//! Database persistence through the entity store.

use std::fs;

use pretty_assertions::assert_eq;
use tempfile::TempDir;

use project_dashboard::access::Viewer;
use project_dashboard::db::{Database, EntityStore, Session, DB_FILE_NAME};
use project_dashboard::entities::{Project, Team, User};
use project_dashboard::error::DashboardError;
use project_dashboard::fields::{ActionKind, BoardStatus, Role, TaskStatus};
use project_dashboard::task::{BoardTask, DailyTask};

#[test]
fn saved_database_loads_back_identically() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join(DB_FILE_NAME);

    let mut db = Database::default();
    {
        let mut s = Session::at(&mut db, Viewer::admin(), 1_710_000_000);
        let ada = s.create(User::new(0, "Ada Lovelace", Role::TeamLeader)).unwrap();
        let web = s.create(Project::new(0, "Website")).unwrap();
        let mut t = DailyTask::new(0, "Fix nav", TaskStatus::InProgress, "2024-03-04");
        t.user_id = Some(ada.id);
        t.project_id = Some(web.id);
        t.expected_hours = Some(2.0);
        s.create(t).unwrap();
        let mut b = BoardTask::new(0, "Launch page", BoardStatus::Review, "2024-03-20");
        b.project_id = Some(web.id);
        s.create(b).unwrap();
    }
    db.save(&path).unwrap();
    assert!(!path.with_extension("json.tmp").exists());

    let loaded = Database::load(&path).unwrap();
    assert_eq!(loaded.users, db.users);
    assert_eq!(loaded.projects, db.projects);
    assert_eq!(loaded.daily_tasks, db.daily_tasks);
    assert_eq!(loaded.board_tasks, db.board_tasks);
    assert_eq!(loaded.activities.len(), 4);
    assert!(loaded
        .activities
        .iter()
        .all(|a| a.action == ActionKind::Create && a.at_utc == 1_710_000_000));
}

#[test]
fn missing_file_is_an_empty_database() {
    let dir = TempDir::new().unwrap();
    let db = Database::load(&dir.path().join(DB_FILE_NAME)).unwrap();
    assert!(db.daily_tasks.is_empty());
    assert!(db.projects.is_empty());
}

#[test]
fn corrupt_file_is_an_error_and_left_alone() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(DB_FILE_NAME);
    fs::write(&path, "{ not json").unwrap();

    let err = Database::load(&path).unwrap_err();
    assert!(matches!(err, DashboardError::Json { .. }));
    assert_eq!(fs::read_to_string(&path).unwrap(), "{ not json");
}

#[test]
fn loose_legacy_records_are_accepted() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(DB_FILE_NAME);
    fs::write(
        &path,
        r#"{
            "daily_tasks": [
                {"id": 1, "task": "Write report", "task_status": "In Progress",
                 "date": "2024-03-04", "expected_time": "2.5", "actual_time_taken": "n/a"}
            ]
        }"#,
    )
    .unwrap();

    let db = Database::load(&path).unwrap();
    let t = &db.daily_tasks[0];
    assert_eq!(t.title, "Write report");
    assert_eq!(t.status, TaskStatus::InProgress);
    assert_eq!(t.expected_hours, Some(2.5));
    assert_eq!(t.actual_hours, None);
}

#[test]
fn deleting_a_user_unassigns_their_work() {
    let mut db = Database::default();
    let mut s = Session::at(&mut db, Viewer::admin(), 1);
    let ada = s.create(User::new(0, "Ada", Role::Member)).unwrap();
    let mut p = Project::new(0, "Website");
    p.member_ids = vec![ada.id];
    p.manager_id = Some(ada.id);
    let p = s.create(p).unwrap();
    let mut t = DailyTask::new(0, "t", TaskStatus::Pending, "2024-03-01");
    t.user_id = Some(ada.id);
    let t = s.create(t).unwrap();

    EntityStore::<User>::delete(&mut s, ada.id).unwrap();

    let t: DailyTask = s.get(t.id).unwrap();
    let p: Project = s.get(p.id).unwrap();
    assert_eq!(t.user_id, None);
    assert!(p.member_ids.is_empty());
    assert_eq!(p.manager_id, None);
    let last = db.activities.last().unwrap();
    assert_eq!(last.action, ActionKind::Delete);
    assert_eq!(last.entity_type, "user");
}

#[test]
fn teams_round_trip_and_detach_on_delete() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(DB_FILE_NAME);

    let mut db = Database::default();
    {
        let mut s = Session::at(&mut db, Viewer::admin(), 1_710_000_000);
        let lead = s.create(User::new(0, "Linus", Role::TeamLeader)).unwrap();
        let dev = s.create(User::new(0, "Ken", Role::Member)).unwrap();
        let mut team = Team::new(0, "Platform");
        team.lead_id = Some(lead.id);
        team.member_ids = vec![dev.id];
        let team = s.create(team).unwrap();
        let mut p = Project::new(0, "Website");
        p.team_id = Some(team.id);
        s.create(p).unwrap();
    }
    db.save(&path).unwrap();

    let mut loaded = Database::load(&path).unwrap();
    assert_eq!(loaded.teams, db.teams);
    assert_eq!(loaded.teams[0].created_at_utc, 1_710_000_000);
    assert_eq!(loaded.projects[0].team_id, Some(1));

    let mut s = Session::at(&mut loaded, Viewer::admin(), 1_710_000_100);
    EntityStore::<User>::delete(&mut s, 2).unwrap();
    let team: Team = s.get(1).unwrap();
    assert_eq!(team.member_ids, Vec::<u64>::new());
    assert_eq!(team.lead_id, Some(1));

    let removed = EntityStore::<Team>::delete(&mut s, 1).unwrap();
    assert_eq!(removed.name, "Platform");
    let p: Project = s.get(1).unwrap();
    assert_eq!(p.team_id, None);
    let last = loaded.activities.last().unwrap();
    assert_eq!(last.entity_type, "team");
    assert_eq!(last.action, ActionKind::Delete);
}
