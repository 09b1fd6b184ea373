use std::collections::BTreeMap;

use fott_core::{
    project::{ProjectDefinition, ProjectReference},
    tokens::SecurityToken,
};
use fott_storage::crypto::{decrypt_connection, encrypt_connection, CryptoError};

/// Open a reference's sealed connection settings into a cleartext definition.
///
/// The definition carries only what the reference knows (identity and
/// connection); the rest is filled in once the project file is read.
pub fn decrypt_project(
    reference: &ProjectReference,
    token: &SecurityToken,
) -> Result<ProjectDefinition, CryptoError> {
    let source_connection = decrypt_connection(token, &reference.source_connection)?;
    Ok(ProjectDefinition {
        id: reference.id.clone(),
        name: reference.name.clone(),
        version: String::new(),
        security_token: reference.security_token.clone(),
        source_connection,
        tags: Vec::new(),
        folder_path: None,
        extra: BTreeMap::new(),
    })
}

/// Seal a project's connection settings with its security token.
pub fn encrypt_project(
    project: &ProjectDefinition,
    token: &SecurityToken,
) -> Result<ProjectDefinition, CryptoError> {
    Ok(ProjectDefinition {
        source_connection: encrypt_connection(token, &project.source_connection)?,
        ..project.clone()
    })
}
