//! Process-wide application state.
//!
//! [`AppState`] owns every open wizard session and the signed-in user's
//! project context. Command handlers borrow the individual locks.

use std::collections::{HashMap, VecDeque};
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::models::WizardRecord;
use crate::wizard::WizardSession;

/// How many recently selected projects are remembered.
pub const RECENT_PROJECTS_MAX: usize = 10;

/// A project as picked on the project list screen.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectSelection {
    pub project_id: String,
    pub project_name: String,
    pub project_number: String,
    pub owner: String,
}

/// Who is reporting, and on which project.
///
/// Only read when a session is created; after that the session's record is
/// the one source of truth.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserContext {
    pub user_id: Option<String>,
    pub active_project: Option<ProjectSelection>,
    /// Most-recently selected projects, newest first, unique by `project_id`.
    pub recent_projects: VecDeque<ProjectSelection>,
}

impl UserContext {
    pub fn select_project(&mut self, project: ProjectSelection) {
        self.recent_projects
            .retain(|p| p.project_id != project.project_id);
        self.recent_projects.push_front(project.clone());
        self.recent_projects.truncate(RECENT_PROJECTS_MAX);
        self.active_project = Some(project);
    }

    /// Initial record values for a new session.
    pub fn seed_record(&self) -> WizardRecord {
        let mut record = WizardRecord::default();
        if let Some(user_id) = &self.user_id {
            record.user_id = user_id.clone();
        }
        if let Some(project) = &self.active_project {
            record.project_id = project.project_id.clone();
            record.project_name = project.project_name.clone();
            record.project_number = project.project_number.clone();
            record.owner = project.owner.clone();
        }
        record
    }
}

/// Root application state.
///
/// Both tables are behind [`RwLock`] so read-only queries (a snapshot for
/// rendering, the recent-projects list) do not block each other.
pub struct AppState {
    pub sessions: RwLock<HashMap<Uuid, WizardSession>>,
    pub context: RwLock<UserContext>,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            context: RwLock::new(UserContext::default()),
            config,
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(AppConfig::default())
    }
}
