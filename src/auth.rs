//! Login gate
//!
//! A single demo account is accepted by literal comparison. Logging in
//! only flips a flag in the local store; there is no token and no expiry.

use crate::error::{ProcuraiError, Result};
use crate::storage::KeyValueStore;

/// Key holding the `"true"` flag while logged in
pub const AUTHENTICATED_KEY: &str = "is_authenticated";

/// Key holding the email of the logged-in user
pub const USER_EMAIL_KEY: &str = "user_email";

/// Email of the only accepted account
pub const DEMO_EMAIL: &str = "hassan@liztek.com";
/// Password of the only accepted account
pub const DEMO_PASSWORD: &str = "1234";

/// Check credentials and mark the client as logged in
///
/// # Errors
///
/// Returns [`ProcuraiError::InvalidCredentials`] when the pair does not
/// match; the store is not touched in that case.
pub fn login(kv: &dyn KeyValueStore, email: &str, password: &str) -> Result<()> {
    if email != DEMO_EMAIL || password != DEMO_PASSWORD {
        tracing::warn!("Rejected login attempt for {}", email);
        return Err(ProcuraiError::InvalidCredentials.into());
    }

    kv.set(AUTHENTICATED_KEY, "true")?;
    kv.set(USER_EMAIL_KEY, email)?;
    tracing::info!("Logged in as {}", email);
    Ok(())
}

/// Clear the login flag and remembered email
pub fn logout(kv: &dyn KeyValueStore) -> Result<()> {
    kv.remove(AUTHENTICATED_KEY)?;
    kv.remove(USER_EMAIL_KEY)?;
    Ok(())
}

/// Whether the login flag is set
pub fn is_authenticated(kv: &dyn KeyValueStore) -> Result<bool> {
    Ok(kv.get(AUTHENTICATED_KEY)?.as_deref() == Some("true"))
}

/// Email of the logged-in user, if any
pub fn current_user(kv: &dyn KeyValueStore) -> Result<Option<String>> {
    if !is_authenticated(kv)? {
        return Ok(None);
    }
    kv.get(USER_EMAIL_KEY)
}

/// Fail with [`ProcuraiError::NotAuthenticated`] unless logged in
pub fn require_login(kv: &dyn KeyValueStore) -> Result<()> {
    if is_authenticated(kv)? {
        Ok(())
    } else {
        Err(ProcuraiError::NotAuthenticated.into())
    }
}
