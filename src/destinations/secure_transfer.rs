//! Secure File Transfer - Uploads the packaged archive over SFTP
//!
//! One authenticated session is opened per upload and closed on every exit
//! path. Inside that session the upload is retried while failures are
//! transient (I/O errors or a dropped connection).

use crate::core::error::{PublishError, TransferError};
use crate::core::retry::{RetryError, RetryManager, RetryPolicy};
use crate::core::traits::{SftpConnector, SftpSession};
use crate::security::credentials::SftpCredentials;
use async_trait::async_trait;
use secrecy::ExposeSecret;
use std::io;
use std::net::TcpStream;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Where an archive ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferReceipt {
    pub remote_path: String,
    pub attempts: u32,
}

/// Uploads archives into the publish directory of one SFTP host
pub struct SecureFileTransfer {
    connector: Arc<dyn SftpConnector>,
    credentials: SftpCredentials,
    publish_dir: String,
    retry: RetryManager,
}

impl SecureFileTransfer {
    pub fn new(
        connector: Arc<dyn SftpConnector>,
        credentials: SftpCredentials,
        publish_dir: impl Into<String>,
        max_attempts: u32,
    ) -> Self {
        Self {
            connector,
            credentials,
            publish_dir: publish_dir.into(),
            retry: RetryManager::new(RetryPolicy::immediate(max_attempts)),
        }
    }

    /// Remote path for `local`: its base name under the publish directory
    pub fn remote_path_for(&self, local: &Path) -> Option<String> {
        let file_name = local.file_name()?.to_string_lossy();
        let dir = self.publish_dir.trim_end_matches('/');
        if dir.is_empty() {
            Some(file_name.into_owned())
        } else {
            Some(format!("{}/{}", dir, file_name))
        }
    }

    /// Upload `archive` into the publish directory
    pub async fn upload(&self, archive: &Path) -> Result<TransferReceipt, PublishError> {
        // Send the file a symlink points at, under the link's own name
        let remote_path = self.remote_path_for(archive).ok_or_else(|| {
            PublishError::ConfigError(format!(
                "Cannot derive a remote file name from {}",
                archive.display()
            ))
        })?;
        let physical = tokio::fs::canonicalize(archive)
            .await
            .map_err(|e| PublishError::TransferFailed {
                attempts: 0,
                source: TransferError::Io(e),
            })?;

        let attempts = self.upload_to(&physical, &remote_path).await?;

        Ok(TransferReceipt {
            remote_path,
            attempts,
        })
    }

    /// Upload `local` to `remote` within a single session
    ///
    /// Returns the number of upload attempts made. A failure to open the
    /// session is reported with zero attempts.
    pub async fn upload_to(&self, local: &Path, remote: &str) -> Result<u32, PublishError> {
        tracing::info!(
            host = %self.credentials.host,
            local = %local.display(),
            remote,
            "uploading archive"
        );

        let session = self
            .connector
            .connect(&self.credentials)
            .await
            .map_err(|source| PublishError::TransferFailed {
                attempts: 0,
                source,
            })?;
        let session = SessionGuard::new(session);

        let result = self
            .retry
            .retry(TransferError::is_retryable, |attempt| {
                let session = session.get();
                async move {
                    tracing::debug!(attempt, "uploading");
                    session.upload(local, remote).await.map(|()| attempt)
                }
            })
            .await;

        session.close().await;

        result.map_err(|error| {
            let attempts = error.attempts();
            if let RetryError::Exhausted { last, .. } = &error {
                tracing::error!(attempts, error = %last, "archive upload retries exhausted");
            }
            PublishError::TransferFailed {
                attempts,
                source: error.into_inner(),
            }
        })
    }
}

/// Open session that is disconnected on every exit path
///
/// If the owning future is dropped before [`SessionGuard::close`], the
/// disconnect is handed to the runtime instead.
struct SessionGuard {
    session: Arc<dyn SftpSession>,
    closed: bool,
}

impl SessionGuard {
    fn new(session: Box<dyn SftpSession>) -> Self {
        Self {
            session: Arc::from(session),
            closed: false,
        }
    }

    fn get(&self) -> &dyn SftpSession {
        self.session.as_ref()
    }

    async fn close(mut self) {
        self.closed = true;
        self.session.disconnect().await;
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        if self.closed {
            return;
        }

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                tracing::debug!("upload cancelled, disconnecting in the background");
                let session = Arc::clone(&self.session);
                handle.spawn(async move { session.disconnect().await });
            }
            Err(_) => tracing::warn!("no runtime left to disconnect the SFTP session"),
        }
    }
}

/// [`SftpConnector`] backed by libssh2
#[derive(Debug, Clone)]
pub struct Ssh2Connector {
    timeout: Duration,
}

impl Default for Ssh2Connector {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
        }
    }
}

impl Ssh2Connector {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    fn connect_blocking(
        credentials: &SftpCredentials,
        timeout: Duration,
    ) -> Result<ssh2::Session, TransferError> {
        let connect_error = |message: String| TransferError::Connect {
            host: credentials.host.clone(),
            message,
        };

        let tcp = TcpStream::connect((credentials.host.as_str(), credentials.port))
            .map_err(|e| connect_error(e.to_string()))?;

        let mut session = ssh2::Session::new().map_err(|e| connect_error(e.to_string()))?;
        session.set_tcp_stream(tcp);
        session.set_timeout(u32::try_from(timeout.as_millis()).unwrap_or(u32::MAX));
        session
            .handshake()
            .map_err(|e| connect_error(e.to_string()))?;

        session
            .userauth_password(&credentials.username, credentials.password.expose_secret())
            .map_err(|_| TransferError::Authentication {
                username: credentials.username.clone(),
            })?;

        if !session.authenticated() {
            return Err(TransferError::Authentication {
                username: credentials.username.clone(),
            });
        }

        Ok(session)
    }
}

#[async_trait]
impl SftpConnector for Ssh2Connector {
    async fn connect(
        &self,
        credentials: &SftpCredentials,
    ) -> Result<Box<dyn SftpSession>, TransferError> {
        let credentials = credentials.clone();
        let timeout = self.timeout;

        let session =
            tokio::task::spawn_blocking(move || Self::connect_blocking(&credentials, timeout))
                .await
                .map_err(|e| TransferError::Protocol(format!("connect task failed: {}", e)))??;

        Ok(Box::new(Ssh2Session { session }))
    }
}

/// Authenticated libssh2 session
#[derive(Clone)]
pub struct Ssh2Session {
    session: ssh2::Session,
}

impl Ssh2Session {
    fn upload_blocking(
        session: &ssh2::Session,
        local: &Path,
        remote: &str,
    ) -> Result<(), TransferError> {
        let sftp = session.sftp().map_err(classify)?;
        let mut source = std::fs::File::open(local)?;
        let mut target = sftp.create(Path::new(remote)).map_err(classify)?;
        io::copy(&mut source, &mut target)?;
        Ok(())
    }
}

#[async_trait]
impl SftpSession for Ssh2Session {
    async fn upload(&self, local: &Path, remote: &str) -> Result<(), TransferError> {
        let session = self.session.clone();
        let local: PathBuf = local.to_path_buf();
        let remote = remote.to_string();

        tokio::task::spawn_blocking(move || Self::upload_blocking(&session, &local, &remote))
            .await
            .map_err(|e| TransferError::Protocol(format!("upload task failed: {}", e)))?
    }

    async fn disconnect(&self) {
        let session = self.session.clone();
        let result = tokio::task::spawn_blocking(move || {
            session.disconnect(None, "publish finished", None)
        })
        .await;

        match result {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!(error = %e, "SFTP disconnect failed"),
            Err(e) => tracing::warn!(error = %e, "SFTP disconnect task failed"),
        }
    }
}

/// Map a libssh2 error onto the transfer taxonomy
fn classify(error: ssh2::Error) -> TransferError {
    // LIBSSH2_ERROR_SOCKET_SEND, _TIMEOUT, _SOCKET_DISCONNECT, _SOCKET_RECV
    const CONNECTION_LOST: [i32; 4] = [-7, -9, -13, -43];

    match error.code() {
        ssh2::ErrorCode::Session(code) if CONNECTION_LOST.contains(&code) => {
            TransferError::Disconnected(error.message().to_string())
        }
        _ => TransferError::Protocol(error.to_string()),
    }
}
