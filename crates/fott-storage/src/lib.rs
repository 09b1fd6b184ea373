//! Concrete storage backends and the crypto used to seal connection settings.
//! Uses AES-GCM with keys taken from security tokens (or the OS keyring).

pub mod azure_blob;
pub mod crypto;
pub mod factory;
pub mod key_provider;
pub mod local;
