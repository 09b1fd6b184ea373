use std::collections::BTreeMap;

use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use base64::{
    engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD},
    Engine as _,
};
use fott_core::{
    project::{Connection, ProviderOptions, SecureString},
    tokens::SecurityToken,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::key_provider::{decode_key, KeyMaterial};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CryptoError {
    #[error("invalid key for security token {token}: {reason}")]
    InvalidKey { token: String, reason: String },
    #[error("malformed sealed value: {reason}")]
    Malformed { reason: String },
    #[error("decryption failed with security token {token}: wrong key or corrupt data")]
    Decrypt { token: String },
    #[error("encryption failed: {reason}")]
    Encrypt { reason: String },
}

#[derive(Debug, Serialize, Deserialize)]
struct SealedBlob {
    nonce: String,
    ciphertext: String,
}

/// Seal bytes with the token's key. A fresh nonce is drawn per call.
pub fn seal(token: &SecurityToken, plaintext: &[u8]) -> Result<SecureString, CryptoError> {
    let cipher = build_cipher(&material(token)?)?;
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
    let ciphertext = cipher
        .encrypt(&nonce, plaintext)
        .map_err(|e| CryptoError::Encrypt {
            reason: e.to_string(),
        })?;

    let blob = SealedBlob {
        nonce: URL_SAFE_NO_PAD.encode(nonce.as_slice()),
        ciphertext: URL_SAFE_NO_PAD.encode(ciphertext),
    };
    let json = serde_json::to_vec(&blob).map_err(|e| CryptoError::Encrypt {
        reason: e.to_string(),
    })?;
    Ok(SecureString {
        encrypted: STANDARD.encode(json),
    })
}

/// Open a value sealed by [`seal`]. Deterministic for a given input.
pub fn open(token: &SecurityToken, sealed: &SecureString) -> Result<Vec<u8>, CryptoError> {
    let json = STANDARD
        .decode(sealed.encrypted.trim())
        .map_err(malformed)?;
    let blob: SealedBlob = serde_json::from_slice(&json).map_err(malformed)?;

    let nonce_bytes = URL_SAFE_NO_PAD.decode(blob.nonce).map_err(malformed)?;
    if nonce_bytes.len() != 12 {
        return Err(CryptoError::Malformed {
            reason: format!("expected 12 byte nonce, got {}", nonce_bytes.len()),
        });
    }
    let nonce = Nonce::from_slice(&nonce_bytes);
    let ciphertext = URL_SAFE_NO_PAD.decode(blob.ciphertext).map_err(malformed)?;

    let cipher = build_cipher(&material(token)?)?;
    cipher
        .decrypt(nonce, ciphertext.as_ref())
        .map_err(|_| CryptoError::Decrypt {
            token: token.name.clone(),
        })
}

/// Seal cleartext provider options. Already sealed options are returned as-is.
pub fn encrypt_options(
    token: &SecurityToken,
    options: &ProviderOptions,
) -> Result<ProviderOptions, CryptoError> {
    match options {
        ProviderOptions::Encrypted(_) => Ok(options.clone()),
        ProviderOptions::Plain(map) => {
            let json = serde_json::to_vec(map).map_err(|e| CryptoError::Encrypt {
                reason: e.to_string(),
            })?;
            Ok(ProviderOptions::Encrypted(seal(token, &json)?))
        }
    }
}

/// Open sealed provider options. Cleartext options pass through unchanged.
pub fn decrypt_options(
    token: &SecurityToken,
    options: &ProviderOptions,
) -> Result<ProviderOptions, CryptoError> {
    match options {
        ProviderOptions::Plain(_) => Ok(options.clone()),
        ProviderOptions::Encrypted(sealed) => {
            let json = open(token, sealed)?;
            let map: BTreeMap<String, String> =
                serde_json::from_slice(&json).map_err(malformed)?;
            Ok(ProviderOptions::Plain(map))
        }
    }
}

pub fn encrypt_connection(
    token: &SecurityToken,
    connection: &Connection,
) -> Result<Connection, CryptoError> {
    Ok(Connection {
        provider_options: encrypt_options(token, &connection.provider_options)?,
        ..connection.clone()
    })
}

pub fn decrypt_connection(
    token: &SecurityToken,
    connection: &Connection,
) -> Result<Connection, CryptoError> {
    Ok(Connection {
        provider_options: decrypt_options(token, &connection.provider_options)?,
        ..connection.clone()
    })
}

fn material(token: &SecurityToken) -> Result<KeyMaterial, CryptoError> {
    decode_key(&token.name, &token.key).map_err(|e| CryptoError::InvalidKey {
        token: token.name.clone(),
        reason: e.to_string(),
    })
}

fn build_cipher(material: &KeyMaterial) -> Result<Aes256Gcm, CryptoError> {
    Aes256Gcm::new_from_slice(&material.bytes).map_err(|e| CryptoError::InvalidKey {
        token: material.id.clone(),
        reason: format!("cipher init failed: {e}"),
    })
}

fn malformed<E: ToString>(err: E) -> CryptoError {
    CryptoError::Malformed {
        reason: err.to_string(),
    }
}
