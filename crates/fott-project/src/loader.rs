use std::sync::{Arc, Mutex, PoisonError, RwLock};

use fott_core::project::ProjectDefinition;
use tracing::info;

/// Moves the user to another screen.
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: &str);
}

/// Navigator that remembers every route, for tests and headless runs.
#[derive(Debug, Default, Clone)]
pub struct RecordingNavigator {
    routes: Arc<Mutex<Vec<String>>>,
}

impl RecordingNavigator {
    pub fn routes(&self) -> Vec<String> {
        self.routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, route: &str) {
        self.routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(route.to_string());
    }
}

/// The application's "current project" slot.
#[derive(Debug, Default)]
pub struct CurrentProject {
    inner: RwLock<Option<ProjectDefinition>>,
}

impl CurrentProject {
    pub fn get(&self) -> Option<ProjectDefinition> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the slot, returning what was there.
    pub fn replace(&self, project: Option<ProjectDefinition>) -> Option<ProjectDefinition> {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *guard, project)
    }
}

/// Route of a project's editing surface.
pub fn edit_route(project_id: &str) -> String {
    format!("/projects/{project_id}/edit")
}

/// Final step of opening a project: make it current and show it.
pub struct ProjectLoader<N: Navigator> {
    current: Arc<CurrentProject>,
    navigator: N,
}

impl<N: Navigator> ProjectLoader<N> {
    pub fn new(current: Arc<CurrentProject>, navigator: N) -> Self {
        Self { current, navigator }
    }

    pub fn current(&self) -> Option<ProjectDefinition> {
        self.current.get()
    }

    /// Activating the project that is already current leaves the slot unchanged.
    pub fn activate(&self, project: ProjectDefinition) {
        let route = edit_route(&project.id);
        let name = project.name.clone();
        let previous = self.current.replace(Some(project));
        if previous.as_ref().map(|p| p.name.as_str()) != Some(name.as_str()) {
            info!(project = %name, "project activated");
        }
        self.navigator.navigate(&route);
    }
}
