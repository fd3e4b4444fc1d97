//! Session checkpoint for drafts crossing the login page.

use serde::Serialize;
use tower_sessions::Session;

use eazyy_core::OrderDraft;

use crate::models::session_keys;

/// What was parked before authentication.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Checkpoint {
    pub return_to: Option<String>,
    pub order_draft: Option<OrderDraft>,
}

impl Checkpoint {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.return_to.is_none() && self.order_draft.is_none()
    }
}

/// Store the draft and the path to come back to.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn park_draft(
    session: &Session,
    return_to: &str,
    draft: &OrderDraft,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::RETURN_TO, return_to).await?;
    session.insert(session_keys::ORDER_DRAFT, draft).await
}

/// Take the parked checkpoint out of the session.
///
/// Both keys are removed. An entry that no longer deserializes is dropped.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn resume(session: &Session) -> Result<Checkpoint, tower_sessions::session::Error> {
    let return_to = session
        .remove::<String>(session_keys::RETURN_TO)
        .await
        .or_else(ignore_bad_value)?;
    let order_draft = session
        .remove::<OrderDraft>(session_keys::ORDER_DRAFT)
        .await
        .or_else(ignore_bad_value)?;

    Ok(Checkpoint {
        return_to: return_to.filter(|path| is_local_path(path)),
        order_draft,
    })
}

fn ignore_bad_value<T>(
    err: tower_sessions::session::Error,
) -> Result<Option<T>, tower_sessions::session::Error> {
    match err {
        tower_sessions::session::Error::SerdeJson(e) => {
            tracing::warn!(error = %e, "Dropping unreadable checkpoint entry");
            Ok(None)
        }
        other => Err(other),
    }
}

/// Only same-site paths are honoured as return targets.
fn is_local_path(path: &str) -> bool {
    path.starts_with('/') && !path.starts_with("//")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use tower_sessions::MemoryStore;

    use super::*;

    fn session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    #[tokio::test]
    async fn test_park_and_resume_clears_keys() {
        let session = session();
        let draft = OrderDraft::for_service("wash-and-fold");
        park_draft(&session, "/order/confirmation", &draft)
            .await
            .unwrap();

        let checkpoint = resume(&session).await.unwrap();
        assert_eq!(checkpoint.return_to.as_deref(), Some("/order/confirmation"));
        assert_eq!(checkpoint.order_draft, Some(draft));

        // Consumed exactly once.
        assert!(resume(&session).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_foreign_return_path_is_dropped() {
        let session = session();
        park_draft(&session, "//evil.example/", &OrderDraft::default())
            .await
            .unwrap();
        let checkpoint = resume(&session).await.unwrap();
        assert_eq!(checkpoint.return_to, None);
        assert!(checkpoint.order_draft.is_some());
    }

    #[tokio::test]
    async fn test_resume_without_checkpoint() {
        assert!(resume(&session()).await.unwrap().is_empty());
    }
}
