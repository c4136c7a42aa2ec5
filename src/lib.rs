pub mod core;
pub mod destinations;
pub mod orchestration;
pub mod security;
pub mod store;
pub mod validation;

pub use crate::core::*;
pub use destinations::{ObjectStoreSyncer, S3cmdSync, SecureFileTransfer, Ssh2Connector};
pub use orchestration::{
    BatchPublishOptions, BatchPublishResult, BatchPublisher, PublishCoordinator, PublishReport,
    SideEffectOutcome, SingleFlight,
};
pub use security::{CommandError, SafeCommandExecutor, SftpCredentials, StorageCredentials};
pub use store::{FsCleanupAgent, JsonArtifactStore, MailRelayDispatcher};
pub use validation::PreconditionValidator;
