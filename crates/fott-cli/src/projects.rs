use std::{collections::BTreeMap, path::Path, sync::Arc};

use color_eyre::Result;
use fott_core::{
    project::{Connection, ProjectDefinition, ProviderOptions, ProviderType},
    tokens::SecurityTokenStore,
};
use fott_project::{
    lifecycle::{find_recent, ProjectLifecycle},
    loader::{CurrentProject, Navigator, ProjectLoader},
    opener::{open_project, Notifier, OpenOutcome},
    resolver::{ProjectNotFound, ProjectResolver},
};
use fott_storage::{factory::StorageFactory, local::FOLDER_PATH_OPTION};
use tracing::info;
use uuid::Uuid;

use crate::{cli::ProjectCommand, config::Config};

const PROJECT_VERSION: &str = env!("CARGO_PKG_VERSION");

const HOME_ROUTE: &str = "/";

/// Prints the route the editor would switch to.
pub struct ConsoleNavigator;

impl Navigator for ConsoleNavigator {
    fn navigate(&self, route: &str) {
        println!("-> {route}");
    }
}

/// Shows handled problems on stderr.
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn project_not_found(&self, missing: &ProjectNotFound) {
        eprintln!("{missing}");
    }
}

/// Execute a project subcommand. Returns whether the config changed.
pub async fn handle<F: StorageFactory>(
    cmd: ProjectCommand,
    config: &mut Config,
    tokens: Arc<SecurityTokenStore>,
    factory: F,
) -> Result<bool> {
    match cmd {
        ProjectCommand::List => {
            list(config);
            Ok(false)
        }
        ProjectCommand::Create {
            name,
            folder,
            token,
        } => {
            let lifecycle = ProjectLifecycle::with_factory(tokens, factory);
            let project = new_local_project(&name, &folder, &token);
            let reference = lifecycle
                .save(&project, &mut config.recent_projects)
                .await
                .map_err(|e| color_eyre::eyre::eyre!(e.to_string()))?;
            println!("Created project {} ({})", reference.name, reference.id);
            Ok(true)
        }
        ProjectCommand::Open { project } => {
            let reference = find_recent(&config.recent_projects, &project)
                .cloned()
                .ok_or_else(|| color_eyre::eyre::eyre!("no recent project named {project}"))?;
            let resolver = ProjectResolver::with_factory(tokens, factory);
            let loader = ProjectLoader::new(Arc::new(CurrentProject::default()), ConsoleNavigator);

            match open_project(&resolver, &loader, &ConsoleNotifier, &reference).await? {
                OpenOutcome::Opened { project_id } => {
                    config.current_project_id = Some(project_id);
                    Ok(true)
                }
                OpenOutcome::NotFound(_) => Ok(false),
            }
        }
        ProjectCommand::Delete { project } => {
            let reference = find_recent(&config.recent_projects, &project)
                .cloned()
                .ok_or_else(|| color_eyre::eyre::eyre!("no recent project named {project}"))?;
            let lifecycle = ProjectLifecycle::with_factory(tokens, factory);
            lifecycle
                .delete(&reference, &mut config.recent_projects)
                .await
                .map_err(|e| color_eyre::eyre::eyre!(e.to_string()))?;
            if config.current_project_id.as_deref() == Some(reference.id.as_str()) {
                config.current_project_id = None;
            }
            println!("Deleted project {}", reference.name);
            Ok(true)
        }
        ProjectCommand::Close => {
            if let Some(id) = config.current_project_id.take() {
                info!(project = %id, "project closed");
                ConsoleNavigator.navigate(HOME_ROUTE);
                return Ok(true);
            }
            println!("No project is open.");
            Ok(false)
        }
    }
}

fn list(config: &Config) {
    if config.recent_projects.is_empty() {
        println!("No recent projects. Create one with `fott projects create <name>`.");
        return;
    }
    for project in &config.recent_projects {
        let marker = if config.current_project_id.as_deref() == Some(project.id.as_str()) {
            "*"
        } else {
            " "
        };
        println!(
            "{marker} {} {} [{} via {}]",
            project.id,
            project.name,
            project.source_connection.name,
            project.source_connection.provider_type.as_str()
        );
    }
}

fn new_local_project(name: &str, folder: &Path, token: &str) -> ProjectDefinition {
    ProjectDefinition {
        id: Uuid::new_v4().to_string(),
        name: name.to_string(),
        version: PROJECT_VERSION.to_string(),
        security_token: token.to_string(),
        source_connection: Connection {
            id: Uuid::new_v4().to_string(),
            name: folder
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| folder.display().to_string()),
            description: None,
            provider_type: ProviderType::LocalFileSystemProxy,
            provider_options: ProviderOptions::Plain(BTreeMap::from([(
                FOLDER_PATH_OPTION.to_string(),
                folder.display().to_string(),
            )])),
        },
        tags: Vec::new(),
        folder_path: None,
        extra: BTreeMap::new(),
    }
}
