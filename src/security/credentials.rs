//! Destination credentials with memory-safe secret handling
//!
//! Secrets are held in `secrecy::SecretString` so they never show up in
//! `Debug` output, and `mask_secret` gives a loggable stand-in when a
//! command line or message has to mention one.

use secrecy::{ExposeSecret, SecretString};
use std::fmt;

/// Access credentials for the object storage bucket
#[derive(Clone)]
pub struct StorageCredentials {
    pub access_key: String,
    pub secret_key: SecretString,
}

impl StorageCredentials {
    pub fn new(access_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            access_key: access_key.into(),
            secret_key: SecretString::new(Into::<String>::into(secret_key).into()),
        }
    }
}

impl fmt::Debug for StorageCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageCredentials")
            .field("access_key", &self.access_key)
            .field("secret_key", &mask_secret(self.secret_key.expose_secret()))
            .finish()
    }
}

/// Login for the SFTP file host
#[derive(Clone)]
pub struct SftpCredentials {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: SecretString,
}

impl SftpCredentials {
    pub fn new(
        host: impl Into<String>,
        port: u16,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            username: username.into(),
            password: SecretString::new(Into::<String>::into(password).into()),
        }
    }
}

impl fmt::Debug for SftpCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SftpCredentials")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"****")
            .finish()
    }
}

/// Masks a secret for safe logging
///
/// Shows only the first 3 and last 3 characters for identification purposes.
/// Secrets shorter than 10 characters are fully masked as "****".
///
/// # Examples
///
/// ```
/// use doc_publisher::security::mask_secret;
///
/// assert_eq!(mask_secret("abcdef123456"), "abc...456");
/// assert_eq!(mask_secret("short"), "****");
/// ```
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() < 10 {
        return "****".to_string();
    }

    let prefix: String = chars[..3].iter().collect();
    let suffix: String = chars[chars.len() - 3..].iter().collect();
    format!("{}...{}", prefix, suffix)
}

/// Replaces every occurrence of `secret` in `text` with its masked form
pub fn mask_in(text: &str, secret: &str) -> String {
    if secret.is_empty() {
        return text.to_string();
    }
    text.replace(secret, &mask_secret(secret))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_secret_with_short_secret() {
        assert_eq!(mask_secret("short"), "****");
        assert_eq!(mask_secret(""), "****");
    }

    #[test]
    fn test_mask_secret_with_long_secret() {
        assert_eq!(mask_secret("abcdef123456"), "abc...456");
        assert_eq!(mask_secret("very-long-token-string"), "ver...ing");
    }

    #[test]
    fn test_mask_in_replaces_every_occurrence() {
        let text = "--secret_key=wJalrXUtnFEMI --again=wJalrXUtnFEMI";
        let masked = mask_in(text, "wJalrXUtnFEMI");

        assert!(!masked.contains("wJalrXUtnFEMI"));
        assert_eq!(masked.matches("wJa...EMI").count(), 2);
    }

    #[test]
    fn test_mask_in_with_empty_secret_is_identity() {
        assert_eq!(mask_in("nothing to hide", ""), "nothing to hide");
    }

    #[test]
    fn test_debug_never_prints_secrets() {
        let storage = StorageCredentials::new("AKIAEXAMPLE", "super-secret-key-value");
        let sftp = SftpCredentials::new("files.example.com", 22, "publisher", "hunter2-password");

        let storage_debug = format!("{:?}", storage);
        let sftp_debug = format!("{:?}", sftp);

        assert!(storage_debug.contains("AKIAEXAMPLE"));
        assert!(!storage_debug.contains("super-secret-key-value"));
        assert!(!sftp_debug.contains("hunter2-password"));
        assert!(sftp_debug.contains("files.example.com"));
    }
}
