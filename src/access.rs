//! Role checks for the acting user.
//!
//! There is no ambient "current user": every function that depends on who is asking
//! takes a [`Viewer`].

use crate::entities::{Project, User};
use crate::error::{DashboardError, Result};
use crate::fields::Role;
use crate::task::DailyTask;

/// The person a command runs on behalf of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewer {
    pub user_id: Option<u64>,
    pub role: Role,
}

impl Viewer {
    /// Full access, used when no identity is configured.
    pub fn admin() -> Self {
        Viewer {
            user_id: None,
            role: Role::Admin,
        }
    }

    pub fn from_user(user: &User) -> Self {
        Viewer {
            user_id: Some(user.id),
            role: user.role,
        }
    }

    /// Admins and team leaders may create, edit and delete shared records.
    pub fn can_manage(&self) -> bool {
        matches!(self.role, Role::Admin | Role::TeamLeader)
    }

    /// Fail with [`DashboardError::Forbidden`] unless [`Viewer::can_manage`].
    pub fn require_manage(&self, action: &'static str) -> Result<()> {
        if self.can_manage() {
            Ok(())
        } else {
            Err(DashboardError::Forbidden {
                role: self.role,
                action,
            })
        }
    }

    /// Only admins manage accounts.
    pub fn require_admin(&self, action: &'static str) -> Result<()> {
        if self.role == Role::Admin {
            Ok(())
        } else {
            Err(DashboardError::Forbidden {
                role: self.role,
                action,
            })
        }
    }

    /// Whether this viewer may edit a task owned by `owner`.
    pub fn can_edit_task(&self, owner: Option<u64>) -> bool {
        self.can_manage() || (owner.is_some() && owner == self.user_id)
    }
}

/// Restrict a daily-task collection to what `viewer` should see.
///
/// Members only see their own tasks, whatever `member` says. Team leaders see the
/// whole team or, with `member`, one person. Admins see everything and may also narrow
/// to one person.
pub fn scope_daily_tasks(tasks: &[DailyTask], viewer: &Viewer, member: Option<u64>) -> Vec<DailyTask> {
    let wanted = match viewer.role {
        Role::Member => Some(viewer.user_id),
        Role::TeamLeader | Role::Admin => member.map(Some),
    };
    match wanted {
        None => tasks.to_vec(),
        Some(owner) => tasks
            .iter()
            .filter(|t| owner.is_some() && t.user_id == owner)
            .cloned()
            .collect(),
    }
}

/// Projects `viewer` takes part in. Managers and admins see all of them.
pub fn visible_projects<'a>(projects: &'a [Project], viewer: &Viewer) -> Vec<&'a Project> {
    projects
        .iter()
        .filter(|p| match (viewer.can_manage(), viewer.user_id) {
            (true, _) => true,
            (false, Some(me)) => p.manager_id == Some(me) || p.member_ids.contains(&me),
            (false, None) => false,
        })
        .collect()
}

/// People eligible to manage a project.
pub fn project_managers(users: &[User]) -> Vec<&User> {
    users
        .iter()
        .filter(|u| matches!(u.role, Role::Admin | Role::TeamLeader))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::TaskStatus;

    fn owned(id: u64, user: u64) -> DailyTask {
        let mut t = DailyTask::new(id, "t", TaskStatus::Pending, "2024-03-01");
        t.user_id = Some(user);
        t
    }

    fn ids(tasks: &[DailyTask]) -> Vec<u64> {
        tasks.iter().map(|t| t.id).collect()
    }

    #[test]
    fn members_only_see_their_own_tasks() {
        let tasks = vec![owned(1, 10), owned(2, 20), owned(3, 10)];
        let me = Viewer {
            user_id: Some(10),
            role: Role::Member,
        };
        assert_eq!(ids(&scope_daily_tasks(&tasks, &me, None)), vec![1, 3]);
        // Asking for someone else is ignored.
        assert_eq!(ids(&scope_daily_tasks(&tasks, &me, Some(20))), vec![1, 3]);
    }

    #[test]
    fn anonymous_member_sees_nothing() {
        let tasks = vec![owned(1, 10), DailyTask::new(2, "t", TaskStatus::Pending, "")];
        let nobody = Viewer {
            user_id: None,
            role: Role::Member,
        };
        assert!(scope_daily_tasks(&tasks, &nobody, None).is_empty());
    }

    #[test]
    fn leaders_can_narrow_to_a_member() {
        let tasks = vec![owned(1, 10), owned(2, 20)];
        let lead = Viewer {
            user_id: Some(1),
            role: Role::TeamLeader,
        };
        assert_eq!(ids(&scope_daily_tasks(&tasks, &lead, None)), vec![1, 2]);
        assert_eq!(ids(&scope_daily_tasks(&tasks, &lead, Some(20))), vec![2]);
    }

    #[test]
    fn manage_rights() {
        let member = Viewer {
            user_id: Some(3),
            role: Role::Member,
        };
        assert!(!member.can_manage());
        assert!(member.require_manage("delete projects").is_err());
        assert!(member.can_edit_task(Some(3)));
        assert!(!member.can_edit_task(Some(4)));
        assert!(!member.can_edit_task(None));
        assert!(Viewer::admin().can_edit_task(None));
        let lead = Viewer {
            user_id: Some(1),
            role: Role::TeamLeader,
        };
        assert!(lead.require_manage("delete projects").is_ok());
        assert!(lead.require_admin("delete users").is_err());
    }

    #[test]
    fn members_see_projects_they_belong_to() {
        let mut a = Project::new(1, "Website");
        a.member_ids = vec![3, 4];
        let mut b = Project::new(2, "Mobile");
        b.manager_id = Some(3);
        let c = Project::new(3, "Infra");
        let projects = vec![a, b, c];

        let me = Viewer {
            user_id: Some(4),
            role: Role::Member,
        };
        let ids: Vec<u64> = visible_projects(&projects, &me).iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1]);
        let ids: Vec<u64> = visible_projects(&projects, &Viewer::admin())
            .iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn managers_are_admins_and_leaders() {
        let users = vec![
            User::new(1, "a", Role::Admin),
            User::new(2, "b", Role::Member),
            User::new(3, "c", Role::TeamLeader),
        ];
        let ids: Vec<u64> = project_managers(&users).iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }
}
