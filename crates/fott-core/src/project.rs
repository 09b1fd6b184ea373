use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Extension projects are saved under by the current release.
pub const PROJECT_FILE_EXTENSION: &str = ".json";

/// Extension used by earlier releases; still accepted when opening a project.
pub const LEGACY_PROJECT_FILE_EXTENSION: &str = ".fottproj";

/// Storage backends a connection can point at.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum ProviderType {
    LocalFileSystemProxy,
    AzureBlobStorage,
}

impl ProviderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderType::LocalFileSystemProxy => "localFileSystemProxy",
            ProviderType::AzureBlobStorage => "azureBlobStorage",
        }
    }
}

/// Sealed provider options as persisted in settings and project files.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SecureString {
    pub encrypted: String,
}

/// Provider options are either sealed with a security token or in the clear.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum ProviderOptions {
    Encrypted(SecureString),
    Plain(BTreeMap<String, String>),
}

impl ProviderOptions {
    pub fn is_encrypted(&self) -> bool {
        matches!(self, ProviderOptions::Encrypted(_))
    }

    /// Look up a cleartext option; sealed options never yield values.
    pub fn get(&self, key: &str) -> Option<&str> {
        match self {
            ProviderOptions::Plain(map) => map.get(key).map(String::as_str),
            ProviderOptions::Encrypted(_) => None,
        }
    }
}

/// Connection descriptor selecting a storage backend and its credentials.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub provider_type: ProviderType,
    pub provider_options: ProviderOptions,
}

/// Lightweight pointer to a previously opened project, as kept in the recent list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectReference {
    pub id: String,
    pub name: String,
    /// Name of the security token that sealed the connection options.
    pub security_token: String,
    pub source_connection: Connection,
}

/// Label tag defined on a project.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub name: String,
    #[serde(default)]
    pub color: String,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub field_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

/// Canonical project as stored in its project file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDefinition {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub version: String,
    pub security_token: String,
    pub source_connection: Connection,
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder_path: Option<String>,
    /// Fields this release does not model are carried through untouched.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl ProjectDefinition {
    /// File name under the current naming convention.
    pub fn file_name(&self) -> String {
        project_file_name(&self.name)
    }

    pub fn reference(&self) -> ProjectReference {
        ProjectReference {
            id: self.id.clone(),
            name: self.name.clone(),
            security_token: self.security_token.clone(),
            source_connection: self.source_connection.clone(),
        }
    }
}

pub fn project_file_name(name: &str) -> String {
    format!("{name}{PROJECT_FILE_EXTENSION}")
}

pub fn legacy_project_file_name(name: &str) -> String {
    format!("{name}{LEGACY_PROJECT_FILE_EXTENSION}")
}
