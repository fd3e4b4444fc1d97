//! Saved customer addresses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use eazyy_core::{AddressId, DraftAddress, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Address {
    pub id: AddressId,
    pub user_id: UserId,
    /// Label such as "Home" or "Office".
    pub name: Option<String>,
    pub street: String,
    pub house_number: String,
    pub additional_info: Option<String>,
    pub city: String,
    pub postal_code: String,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
}

impl Address {
    /// `"<street> <house_number>[, <additional_info>]"`.
    #[must_use]
    pub fn street_line(&self) -> String {
        let mut line = format!("{} {}", self.street, self.house_number);
        if let Some(extra) = self.additional_info.as_deref().filter(|s| !s.trim().is_empty()) {
            line.push_str(", ");
            line.push_str(extra);
        }
        line
    }

    /// The address as the order draft carries it.
    #[must_use]
    pub fn to_draft(&self) -> DraftAddress {
        DraftAddress {
            street: self.street_line(),
            city: self.city.clone(),
            postal_code: self.postal_code.clone(),
        }
    }
}

/// Submitted fields for a new address.
#[derive(Debug, Clone, Deserialize)]
pub struct NewAddress {
    pub name: Option<String>,
    pub street: String,
    pub house_number: String,
    pub additional_info: Option<String>,
    pub city: String,
    pub postal_code: String,
}

impl NewAddress {
    /// Name of the first required field that is blank, if any.
    #[must_use]
    pub fn missing_field(&self) -> Option<&'static str> {
        [
            ("street", &self.street),
            ("house_number", &self.house_number),
            ("city", &self.city),
            ("postal_code", &self.postal_code),
        ]
        .into_iter()
        .find(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address(extra: Option<&str>) -> Address {
        Address {
            id: AddressId::new(),
            user_id: UserId::new(),
            name: Some("Home".to_owned()),
            street: "Prinsengracht".to_owned(),
            house_number: "263".to_owned(),
            additional_info: extra.map(str::to_owned),
            city: "Amsterdam".to_owned(),
            postal_code: "1016 GV".to_owned(),
            is_default: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_street_line() {
        assert_eq!(address(None).street_line(), "Prinsengracht 263");
        assert_eq!(address(Some("")).street_line(), "Prinsengracht 263");
        assert_eq!(
            address(Some("2nd floor")).street_line(),
            "Prinsengracht 263, 2nd floor"
        );
    }

    #[test]
    fn test_to_draft() {
        let draft = address(Some("B")).to_draft();
        assert_eq!(draft.street, "Prinsengracht 263, B");
        assert_eq!(draft.city, "Amsterdam");
        assert_eq!(draft.postal_code, "1016 GV");
    }

    #[test]
    fn test_missing_field() {
        let new = NewAddress {
            name: None,
            street: "Damrak".to_owned(),
            house_number: " ".to_owned(),
            additional_info: None,
            city: "Amsterdam".to_owned(),
            postal_code: String::new(),
        };
        assert_eq!(new.missing_field(), Some("house_number"));
    }
}
