//! Session lifecycle: login, restore, logout
//!
//! The session is persisted in the key-value store and restored explicitly
//! at every entry point. There is no process-wide current user; callers
//! receive a `Session` value and pass it to the synchronizer they build.

use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use crate::db::kv;
use crate::error::{Error, Result};
use crate::models::{Identity, Role, Session};

/// Sign-in email domain for student accounts
const STUDENT_DOMAIN: &str = "@stu.com";
/// Sign-in email domain for creator accounts
const CREATOR_DOMAIN: &str = "@cre.com";

/// Sign in with an email address
///
/// The email is trimmed and lowercased; the role comes from the domain
/// suffix (`@stu.com` for students, `@cre.com` for creators). A fresh uid
/// is assigned on every login. The session is persisted so later entry
/// points can restore it without re-authenticating.
pub async fn login(db: &SqlitePool, email: &str) -> Result<Session> {
    let email = email.trim().to_lowercase();

    if !email.contains('@') {
        return Err(Error::InvalidInput(
            "Email address must contain '@'".to_string(),
        ));
    }

    let role = if email.ends_with(STUDENT_DOMAIN) {
        Role::Student
    } else if email.ends_with(CREATOR_DOMAIN) {
        Role::Creator
    } else {
        return Err(Error::InvalidInput(format!(
            "Unrecognized email domain; accepted domains are {} and {}",
            STUDENT_DOMAIN, CREATOR_DOMAIN
        )));
    };

    let session = Session::new(Identity {
        uid: Uuid::new_v4(),
        email,
        role,
    });

    kv::store_session(db, &session).await?;
    info!(
        "Signed in {} as {}",
        session.identity.email, session.identity.role
    );

    Ok(session)
}

/// Restore the persisted session
///
/// `None` means nobody is signed in; callers redirect to their login
/// boundary rather than treating this as an error.
pub async fn restore(db: &SqlitePool) -> Result<Option<Session>> {
    kv::load_session(db).await
}

/// Sign out, removing the persisted session
pub async fn logout(db: &SqlitePool) -> Result<()> {
    kv::clear_session(db).await?;
    info!("Signed out");
    Ok(())
}
