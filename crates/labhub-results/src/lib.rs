//! Stored lab result files: decryption and inspection.
//!
//! Independent of the hub client. [`ResultDecryptor`] needs only a
//! [`KeySource`]; [`list_result_files`] needs nothing but a directory.

pub mod cipher;
pub mod decryptor;
pub mod envelope;
pub mod error;
pub mod keys;
pub mod listing;

pub use cipher::{ResultKey, seal};
pub use decryptor::{DecryptStatus, Decrypted, ResultDecryptor};
pub use envelope::sniff_version;
pub use error::{DecryptError, Result};
pub use keys::{KeySource, RESULT_KEY_ENV, StaticKeySource, StoredKeySource, key_name};
pub use listing::{ResultFile, list_result_files};
