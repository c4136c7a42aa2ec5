//! Local collaborators of the publish pipeline: the artifact store, file
//! cleanup and subscriber notification

pub mod cleanup;
pub mod json_store;
pub mod notifications;

pub use cleanup::FsCleanupAgent;
pub use json_store::{JsonArtifactStore, StoreData};
pub use notifications::{MailRelayDispatcher, MailRequest};
