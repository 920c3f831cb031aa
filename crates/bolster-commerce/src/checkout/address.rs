//! Address types.

use crate::ids::AddressId;
use serde::{Deserialize, Serialize};

/// A shipping address.
///
/// Stored against a user's account; copied verbatim into orders so that
/// later edits never rewrite shipping history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Address {
    /// Address ID (None for unsaved addresses).
    pub id: Option<AddressId>,
    /// Recipient name.
    pub name: String,
    /// Street line.
    pub street: String,
    /// City.
    pub city: String,
    /// State.
    pub state: String,
    /// Postal/ZIP code.
    pub zip: String,
    /// Contact phone number.
    pub phone: String,
}

impl Address {
    /// Create a new unsaved address.
    pub fn new(
        name: impl Into<String>,
        street: impl Into<String>,
        city: impl Into<String>,
        state: impl Into<String>,
        zip: impl Into<String>,
        phone: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            name: name.into(),
            street: street.into(),
            city: city.into(),
            state: state.into(),
            zip: zip.into(),
            phone: phone.into(),
        }
    }

    /// Format as a single line.
    pub fn one_line(&self) -> String {
        format!(
            "{}, {}, {} {} - {}",
            self.street, self.city, self.state, self.zip, self.phone
        )
    }

    /// Check that every field required for shipping is present.
    pub fn is_complete(&self) -> bool {
        !self.name.is_empty()
            && !self.street.is_empty()
            && !self.city.is_empty()
            && !self.state.is_empty()
            && !self.zip.is_empty()
    }
}
