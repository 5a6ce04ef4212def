use crate::error::{CsrfTokenMismatchSnafu, MissingCsrfTokenSnafu, RollcallResult, TowerSessionSnafu};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::{Rng, rng};
use snafu::{OptionExt, ResultExt};
use tower_sessions::Session;

pub mod postgres_store;

pub const CSRF_TOKEN_KEY: &str = "rollcall.csrf_token";

/// Gets the anti-forgery token for this session, making one if the session has none yet.
pub async fn issue_csrf_token(session: &Session) -> RollcallResult<String> {
    if let Some(token) = session
        .get::<String>(CSRF_TOKEN_KEY)
        .await
        .context(TowerSessionSnafu)?
    {
        return Ok(token);
    }

    let mut bytes = [0_u8; 32];
    rng().fill(&mut bytes);
    let token = URL_SAFE_NO_PAD.encode(bytes);

    session
        .insert(CSRF_TOKEN_KEY, &token)
        .await
        .context(TowerSessionSnafu)?;
    debug!("Issued new anti-forgery token");

    Ok(token)
}

pub async fn verify_csrf_token(session: &Session, submitted: &str) -> RollcallResult<()> {
    let expected = session
        .get::<String>(CSRF_TOKEN_KEY)
        .await
        .context(TowerSessionSnafu)?
        .context(MissingCsrfTokenSnafu)?;

    snafu::ensure!(
        tokens_match(expected.as_bytes(), submitted.as_bytes()),
        CsrfTokenMismatchSnafu
    );
    Ok(())
}

fn tokens_match(expected: &[u8], submitted: &[u8]) -> bool {
    expected.len() == submitted.len()
        && expected
            .iter()
            .zip(submitted)
            .fold(0, |acc, (a, b)| acc | (a ^ b))
            == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RollcallError;
    use std::sync::Arc;
    use tower_sessions::MemoryStore;

    fn new_session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    #[tokio::test]
    async fn token_is_stable_within_a_session() {
        let session = new_session();
        let first = issue_csrf_token(&session).await.unwrap();
        let second = issue_csrf_token(&session).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.len(), 43);
        verify_csrf_token(&session, &first).await.unwrap();
    }

    #[tokio::test]
    async fn sessions_get_different_tokens() {
        let a = issue_csrf_token(&new_session()).await.unwrap();
        let b = issue_csrf_token(&new_session()).await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn wrong_token_is_rejected() {
        let session = new_session();
        let token = issue_csrf_token(&session).await.unwrap();

        let mut forged = token.clone();
        forged.pop();
        assert!(matches!(
            verify_csrf_token(&session, &forged).await,
            Err(RollcallError::CsrfTokenMismatch)
        ));
        assert!(matches!(
            verify_csrf_token(&session, "").await,
            Err(RollcallError::CsrfTokenMismatch)
        ));
    }

    #[tokio::test]
    async fn session_without_token_is_rejected() {
        assert!(matches!(
            verify_csrf_token(&new_session(), "anything").await,
            Err(RollcallError::MissingCsrfToken)
        ));
    }
}
