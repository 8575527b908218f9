use std::collections::BTreeMap;
use std::path::PathBuf;

use tokio::sync::Mutex;

use crate::common::TokenRecord;
use crate::error::AuthError;

/// An account id and the display name it was linked under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountSummary {
    pub account_id: String,
    pub username: String,
}

/// Linked accounts persisted as one JSON object keyed by account id.
///
/// Every mutation rewrites the whole file while the lock is held, so
/// concurrent writers cannot interleave partial updates.
pub struct CredentialStore {
    path: PathBuf,
    records: Mutex<BTreeMap<String, TokenRecord>>,
}

impl CredentialStore {
    /// Load the credential file. A missing file is an empty store.
    pub async fn load(path: impl Into<PathBuf>) -> Result<Self, AuthError> {
        let path = path.into();

        let records = match tokio::fs::read_to_string(&path).await {
            Ok(json) if json.trim().is_empty() => BTreeMap::new(),
            Ok(json) => serde_json::from_str(&json).map_err(|e| {
                AuthError::TokenStorage(format!(
                    "Failed to parse {}: {}",
                    path.display(),
                    e
                ))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                return Err(AuthError::TokenStorage(format!(
                    "Failed to read {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        tracing::info!(
            path = %path.display(),
            accounts = records.len(),
            "Credential store loaded"
        );

        Ok(Self {
            path,
            records: Mutex::new(records),
        })
    }

    pub async fn get(&self, account_id: &str) -> Option<TokenRecord> {
        self.records.lock().await.get(account_id).cloned()
    }

    /// Linked accounts, ordered by account id.
    pub async fn accounts(&self) -> Vec<AccountSummary> {
        self.records
            .lock()
            .await
            .iter()
            .map(|(account_id, record)| AccountSummary {
                account_id: account_id.clone(),
                username: record.username.clone(),
            })
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.lock().await.is_empty()
    }

    /// Insert or replace the record for `account_id` and persist.
    pub async fn upsert(&self, account_id: &str, record: TokenRecord) -> Result<(), AuthError> {
        if record.access_token.is_empty() {
            return Err(AuthError::TokenStorage(
                "Refusing to store a record without an access token".to_string(),
            ));
        }

        let mut records = self.records.lock().await;
        records.insert(account_id.to_string(), record);
        self.persist(&records).await?;

        tracing::debug!(account_id = %account_id, "Stored credentials");
        Ok(())
    }

    /// Modify an existing record in place and persist. Returns the updated
    /// record.
    pub async fn update<F>(&self, account_id: &str, update_fn: F) -> Result<TokenRecord, AuthError>
    where
        F: FnOnce(&mut TokenRecord),
    {
        let mut records = self.records.lock().await;
        let record = records
            .get_mut(account_id)
            .ok_or_else(|| AuthError::UnknownAccount(account_id.to_string()))?;
        update_fn(record);
        let updated = record.clone();
        self.persist(&records).await?;

        tracing::debug!(account_id = %account_id, "Updated credentials");
        Ok(updated)
    }

    async fn persist(&self, records: &BTreeMap<String, TokenRecord>) -> Result<(), AuthError> {
        let json = serde_json::to_string_pretty(records)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                AuthError::TokenStorage(format!("Failed to create directory: {}", e))
            })?;
        }

        tokio::fs::write(&self.path, json)
            .await
            .map_err(|e| AuthError::TokenStorage(format!("Failed to save credentials: {}", e)))?;

        // Set permissions to 0600 (read/write for owner only)
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tokio::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))
                .await
                .map_err(|e| {
                    AuthError::TokenStorage(format!("Failed to set file permissions: {}", e))
                })?;
        }

        Ok(())
    }
}
