//! Opening, saving and closing projects on top of the storage and token layers.

pub mod decryptor;
pub mod lifecycle;
pub mod loader;
pub mod opener;
pub mod resolver;

#[cfg(test)]
pub(crate) mod test_support;
