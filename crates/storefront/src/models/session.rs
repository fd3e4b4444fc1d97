//! Session-related types.
//!
//! Types stored in the session for authentication state and the order
//! checkpoint.

use serde::{Deserialize, Serialize};

use eazyy_core::{Email, UserId};

/// Session-stored user identity.
///
/// Carries the profile fields the order commit needs so confirming an order
/// does not have to reload the profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    /// User's database ID.
    pub id: UserId,
    /// User's email address.
    pub email: Email,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
}

impl CurrentUser {
    /// First and last name joined and trimmed. `None` when both are blank.
    #[must_use]
    pub fn full_name(&self) -> Option<String> {
        let name = format!(
            "{} {}",
            self.first_name.as_deref().unwrap_or_default(),
            self.last_name.as_deref().unwrap_or_default()
        );
        let name = name.trim();
        (!name.is_empty()).then(|| name.to_owned())
    }
}

/// Session keys.
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Where to send the user once authentication completes.
    pub const RETURN_TO: &str = "return_to";

    /// Order draft parked while the user authenticates.
    pub const ORDER_DRAFT: &str = "order_draft";
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn user(first: Option<&str>, last: Option<&str>) -> CurrentUser {
        CurrentUser {
            id: UserId::new(),
            email: Email::parse("klant@eazyy.nl").unwrap(),
            first_name: first.map(str::to_owned),
            last_name: last.map(str::to_owned),
            phone: None,
        }
    }

    #[test]
    fn test_full_name() {
        assert_eq!(
            user(Some("Jan"), Some("Jansen")).full_name().as_deref(),
            Some("Jan Jansen")
        );
        assert_eq!(user(Some("Jan"), None).full_name().as_deref(), Some("Jan"));
        assert_eq!(user(None, Some(" ")).full_name(), None);
    }
}
