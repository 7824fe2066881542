//! Storage abstraction for the lab hub integration.
//!
//! The host platform owns the database; this crate describes the handful of
//! reads and writes the integration needs from it:
//!
//! - [`CatalogStore`]: procedure types and AOE questions imported from the compendium
//! - [`QuestionLookup`]: whether an order still has unanswered AOE questions
//! - [`BackgroundServices`]: activation flag of the results retrieval service
//! - [`KeyStore`]: named keys used to decrypt stored result files
//!
//! [`InMemoryStorage`] implements all of them and backs the test suites.

pub mod error;
pub mod memory;
pub mod traits;

pub use error::StorageError;
pub use memory::InMemoryStorage;
pub use traits::{
    BackgroundServices, CatalogStore, KeyStore, QuestionLookup, RESULTS_SERVICE_NAME,
};

/// Type alias for a shareable catalog store.
pub type DynCatalogStore = std::sync::Arc<dyn CatalogStore>;

/// Type alias for a shareable question lookup.
pub type DynQuestionLookup = std::sync::Arc<dyn QuestionLookup>;

/// Type alias for a shareable key store.
pub type DynKeyStore = std::sync::Arc<dyn KeyStore>;
