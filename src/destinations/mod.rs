//! Publish destinations: the object storage bucket and the SFTP file host

pub mod object_store;
pub mod secure_transfer;

pub use object_store::{ObjectStoreSyncer, S3cmdSync};
pub use secure_transfer::{SecureFileTransfer, Ssh2Connector, Ssh2Session, TransferReceipt};
