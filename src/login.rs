//! Email gate and the in-memory session registry.
//!
//! **This is not authentication.** The portal only checks that an email
//! address ends with the organisation's domain: there is no password, no
//! verification that the caller owns the address, and no token beyond a
//! random session cookie. Anyone who types a matching address gets in. Treat
//! it as an allow-list filter and raise it with whoever owns access control
//! before relying on it.

use crate::session::Session;
use lazy_static::lazy_static;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use std::time::{Duration, SystemTime};
use uuid::Uuid;

/// Email domain the portal admits unless configured otherwise
pub const DEFAULT_EMAIL_DOMAIN: &str = "@ey.com";

/// Name of the cookie carrying the session id
pub const SESSION_COOKIE: &str = "session";

const SESSION_DURATION: u64 = 24 * 60 * 60; // 24 hours in seconds

/// Check an email address against the allowed domain suffix
///
/// Surrounding whitespace is ignored and the comparison is case-insensitive.
///
/// # Arguments
/// * `email` - Address as typed by the user
/// * `domain` - Required suffix, e.g. `@ey.com`
///
/// # Returns
/// * `bool` - Whether the address is admitted
///
/// # Examples
/// ```
/// use research_portal::login::authenticate;
///
/// assert!(authenticate(" Jane.Doe@EY.com ", "@ey.com"));
/// assert!(!authenticate("jane@gmail.com", "@ey.com"));
/// ```
pub fn authenticate(email: &str, domain: &str) -> bool {
    let email = normalize_email(email);
    let domain = domain.trim().to_lowercase();
    !domain.is_empty() && email.ends_with(&domain)
}

/// Trimmed, lower-cased form of an email address
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// A registered session and its expiry
#[derive(Debug, Clone)]
struct SessionEntry {
    session: Session,
    expires_at: SystemTime,
}

lazy_static! {
    static ref SESSIONS: RwLock<HashMap<String, SessionEntry>> = RwLock::new(HashMap::new());
}

/// Register a session and return its new id
pub fn create_session(session: Session) -> String {
    let session_id = Uuid::new_v4().to_string();
    let expires_at = SystemTime::now() + Duration::from_secs(SESSION_DURATION);

    let mut sessions = SESSIONS.write().unwrap_or_else(PoisonError::into_inner);
    sessions.retain(|_, entry| entry.expires_at > SystemTime::now());
    sessions.insert(session_id.clone(), SessionEntry { session, expires_at });

    session_id
}

/// Look up a live session
///
/// # Returns
/// * `Option<Session>` - A copy of the stored session, or `None` if the id is
///   unknown or expired
pub fn load_session(session_id: &str) -> Option<Session> {
    let sessions = SESSIONS.read().unwrap_or_else(PoisonError::into_inner);

    match sessions.get(session_id) {
        Some(entry) if entry.expires_at > SystemTime::now() => Some(entry.session.clone()),
        _ => None,
    }
}

/// Replace the session stored under an existing id
///
/// Returns `false` if the id is unknown or expired; nothing is stored then.
pub fn store_session(session_id: &str, session: Session) -> bool {
    let mut sessions = SESSIONS.write().unwrap_or_else(PoisonError::into_inner);

    match sessions.get_mut(session_id) {
        Some(entry) if entry.expires_at > SystemTime::now() => {
            entry.session = session;
            true
        }
        _ => false,
    }
}

/// Forget a session (logout)
pub fn destroy_session(session_id: &str) {
    let mut sessions = SESSIONS.write().unwrap_or_else(PoisonError::into_inner);
    sessions.remove(session_id);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authenticate_checks_suffix() {
        assert!(authenticate("User@EY.COM", DEFAULT_EMAIL_DOMAIN));
        assert!(authenticate(" user@ey.com ", DEFAULT_EMAIL_DOMAIN));
        assert!(!authenticate("user@gmail.com", DEFAULT_EMAIL_DOMAIN));
        assert!(!authenticate("", DEFAULT_EMAIL_DOMAIN));
        assert!(!authenticate("user@ey.com.evil.org", DEFAULT_EMAIL_DOMAIN));
    }

    #[test]
    fn authenticate_with_custom_domain() {
        assert!(authenticate("a@Example.org", "@EXAMPLE.org"));
        // an empty domain would admit everybody
        assert!(!authenticate("a@example.org", "  "));
    }

    #[test]
    fn registry_round_trip() {
        let id = create_session(Session::default());
        assert!(load_session(&id).is_some());

        let mut next = Session::default();
        next.user = Some("someone@ey.com".into());
        assert!(store_session(&id, next));
        assert_eq!(load_session(&id).unwrap().user.as_deref(), Some("someone@ey.com"));

        destroy_session(&id);
        assert!(load_session(&id).is_none());
        assert!(!store_session(&id, Session::default()));
    }
}
