//! In-memory bearer sessions.
//!
//! Login hands out a uuid v4 token; the map keeps it until it expires
//! or is revoked. Nothing is persisted: restarting the daemon logs
//! everyone out, which is acceptable for a family app.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

/// One logged-in user. `is_parent` is fixed at issue time; parent
/// profiles only ever come into existence at registration, so the flag
/// cannot go stale.
#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: i64,
    pub is_parent: bool,
    pub expires_at: DateTime<Utc>,
}

/// Token to session map with a per-token TTL
pub struct SessionMap {
    ttl: Duration,
    inner: RwLock<HashMap<String, Session>>,
}

impl SessionMap {
    pub fn new(ttl_minutes: u64) -> Self {
        Self {
            ttl: Duration::minutes(ttl_minutes as i64),
            inner: RwLock::new(HashMap::new()),
        }
    }

    /// Issue a fresh token. Expired entries are swept on the way so the
    /// map stays bounded by the number of live sessions.
    pub fn issue(&self, user_id: i64, is_parent: bool, now: DateTime<Utc>) -> String {
        let token = Uuid::new_v4().to_string();
        let mut map = self.inner.write().unwrap();
        map.retain(|_, s| s.expires_at > now);
        map.insert(
            token.clone(),
            Session {
                user_id,
                is_parent,
                expires_at: now + self.ttl,
            },
        );
        token
    }

    /// Look up a token; expired entries read as absent.
    pub fn get(&self, token: &str, now: DateTime<Utc>) -> Option<Session> {
        let map = self.inner.read().unwrap();
        map.get(token).filter(|s| s.expires_at > now).cloned()
    }

    /// Drop a token. Returns false when it was not present.
    pub fn revoke(&self, token: &str) -> bool {
        self.inner.write().unwrap().remove(token).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at_minute(minute: i64) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-06-01T08:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
            + Duration::minutes(minute)
    }

    #[test]
    fn test_issue_and_get() {
        let sessions = SessionMap::new(60);
        let token = sessions.issue(7, false, at_minute(0));

        let session = sessions.get(&token, at_minute(10)).unwrap();
        assert_eq!(session.user_id, 7);
        assert!(!session.is_parent);
        assert!(sessions.get("not-a-token", at_minute(10)).is_none());
    }

    #[test]
    fn test_tokens_expire() {
        let sessions = SessionMap::new(60);
        let token = sessions.issue(7, false, at_minute(0));

        assert!(sessions.get(&token, at_minute(59)).is_some());
        assert!(sessions.get(&token, at_minute(60)).is_none());
        assert!(sessions.get(&token, at_minute(120)).is_none());
    }

    #[test]
    fn test_revoke() {
        let sessions = SessionMap::new(60);
        let token = sessions.issue(7, true, at_minute(0));

        assert!(sessions.revoke(&token));
        assert!(sessions.get(&token, at_minute(1)).is_none());
        assert!(!sessions.revoke(&token));
    }

    #[test]
    fn test_issue_sweeps_expired_entries() {
        let sessions = SessionMap::new(30);
        let stale = sessions.issue(1, false, at_minute(0));
        let fresh = sessions.issue(2, false, at_minute(45));

        // The first token aged out when the second was issued
        assert!(sessions.inner.read().unwrap().len() == 1);
        assert!(sessions.get(&stale, at_minute(45)).is_none());
        assert!(sessions.get(&fresh, at_minute(46)).is_some());
    }

    #[test]
    fn test_tokens_are_unique() {
        let sessions = SessionMap::new(60);
        let a = sessions.issue(1, false, at_minute(0));
        let b = sessions.issue(1, false, at_minute(0));
        assert_ne!(a, b);
    }
}
