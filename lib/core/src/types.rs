use serde::{Deserialize, Serialize};

/// Parameters for simple list operations (users, branches, cars).
///
/// The operations log has its own richer filter type in the workshop
/// module; this one covers plain reference-table listings.
#[derive(Debug, Clone, Deserialize)]
pub struct ListParams {
    /// Maximum number of results to return.
    #[serde(default = "default_limit")]
    pub limit: usize,

    /// Offset for pagination.
    #[serde(default)]
    pub offset: usize,
}

fn default_limit() -> usize {
    50
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            limit: default_limit(),
            offset: 0,
        }
    }
}

/// Result wrapper for list operations.
#[derive(Debug, Clone, Serialize)]
pub struct ListResult<T: Serialize> {
    pub items: Vec<T>,
    pub total: usize,
}

/// Generate a new random ID (UUIDv4, no dashes).
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string().replace('-', "")
}

/// Get the current time as an RFC 3339 string.
pub fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_id() {
        let id = new_id();
        assert_eq!(id.len(), 32);
        assert!(!id.contains('-'));
    }

    #[test]
    fn test_now_rfc3339() {
        let ts = now_rfc3339();
        assert!(ts.contains('T'));
    }

}
