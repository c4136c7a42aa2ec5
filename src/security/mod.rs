pub mod command_executor;
pub mod credentials;

pub use command_executor::{CommandError, SafeCommandExecutor};
pub use credentials::{SftpCredentials, StorageCredentials, mask_in, mask_secret};
