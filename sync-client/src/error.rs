//! Error types for sync-client.

/// Local queue storage errors.
///
/// Any of these means offline saving is not working. They are fatal to the
/// offline-write feature only; the rest of the application keeps running.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The queue database could not be opened or created.
    #[error("offline storage unavailable: {0}")]
    Unavailable(#[source] sqlx::Error),

    /// A read or write against the queue database failed.
    #[error("storage I/O error: {0}")]
    Io(#[from] sqlx::Error),

    /// A payload could not be encoded for storage.
    #[error("payload encoding failed: {0}")]
    Encode(#[from] serde_json::Error),

    /// A stored record could not be decoded.
    #[error("corrupt record {local_id}: {reason}")]
    Corrupt {
        /// The record's local id.
        local_id: String,
        /// What was wrong with it.
        reason: String,
    },

    /// Every generated local id collided with an existing one.
    #[error("could not generate a unique local id after {attempts} attempts")]
    IdCollision {
        /// Number of ids tried.
        attempts: u32,
    },
}

/// Result type alias for storage operations.
pub type StorageResult<T> = std::result::Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = StorageError::Corrupt {
            local_id: "offline_1_abc".into(),
            reason: "payload is not a JSON object".into(),
        };
        assert_eq!(
            err.to_string(),
            "corrupt record offline_1_abc: payload is not a JSON object"
        );
    }

    #[test]
    fn unavailable_mentions_offline_storage() {
        let err = StorageError::Unavailable(sqlx::Error::PoolClosed);
        assert!(err.to_string().starts_with("offline storage unavailable"));
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<StorageError>();
    }
}
