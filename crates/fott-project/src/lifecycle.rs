use std::sync::Arc;

use anyhow::Result;
use fott_core::{
    project::{legacy_project_file_name, project_file_name, ProjectDefinition, ProjectReference},
    tokens::SecurityTokenStore,
};
use fott_storage::{
    crypto::decrypt_connection,
    factory::{DefaultStorageFactory, StorageFactory},
};
use tracing::{info, instrument};

use crate::decryptor::encrypt_project;

/// Find a recent project by id, falling back to its name.
pub fn find_recent<'a>(recent: &'a [ProjectReference], key: &str) -> Option<&'a ProjectReference> {
    recent
        .iter()
        .find(|p| p.id == key)
        .or_else(|| recent.iter().find(|p| p.name == key))
}

/// Insert or replace a reference, most recent first.
pub fn upsert_recent(recent: &mut Vec<ProjectReference>, reference: ProjectReference) {
    recent.retain(|p| p.id != reference.id);
    recent.insert(0, reference);
}

pub fn remove_recent(recent: &mut Vec<ProjectReference>, id: &str) -> Option<ProjectReference> {
    let idx = recent.iter().position(|p| p.id == id)?;
    Some(recent.remove(idx))
}

/// Saving and deleting project files, keeping the recent list in step.
pub struct ProjectLifecycle<F: StorageFactory = DefaultStorageFactory> {
    tokens: Arc<SecurityTokenStore>,
    factory: F,
}

impl ProjectLifecycle<DefaultStorageFactory> {
    pub fn new(tokens: Arc<SecurityTokenStore>) -> Self {
        Self::with_factory(tokens, DefaultStorageFactory)
    }
}

impl<F: StorageFactory> ProjectLifecycle<F> {
    pub fn with_factory(tokens: Arc<SecurityTokenStore>, factory: F) -> Self {
        Self { tokens, factory }
    }

    /// Write the project file with its connection sealed and record it as recent.
    /// The project's connection must be in the clear.
    #[instrument(skip_all, fields(project = %project.name))]
    pub async fn save(
        &self,
        project: &ProjectDefinition,
        recent: &mut Vec<ProjectReference>,
    ) -> Result<ProjectReference> {
        let token = self.tokens.resolve(&project.security_token)?;
        let storage = self.factory.create(&project.source_connection)?;
        let sealed = encrypt_project(project, token)?;

        let body = serde_json::to_string_pretty(&sealed)?;
        storage.write_text(&project.file_name(), &body).await?;

        let reference = sealed.reference();
        upsert_recent(recent, reference.clone());
        info!(file = %project.file_name(), "project saved");
        Ok(reference)
    }

    /// Forget a project and remove its file under either naming convention.
    #[instrument(skip_all, fields(project = %reference.name))]
    pub async fn delete(
        &self,
        reference: &ProjectReference,
        recent: &mut Vec<ProjectReference>,
    ) -> Result<()> {
        let token = self.tokens.resolve(&reference.security_token)?;
        let connection = decrypt_connection(token, &reference.source_connection)?;
        let storage = self.factory.create(&connection)?;

        storage.delete_file(&project_file_name(&reference.name)).await?;
        storage
            .delete_file(&legacy_project_file_name(&reference.name))
            .await?;

        remove_recent(recent, &reference.id);
        info!("project deleted");
        Ok(())
    }
}
