//! Contact records — the unit of storage.
//!
//! A contact is a single fact: at most one email, at most one phone number,
//! and the linkage metadata that places it inside an identity cluster. The
//! only mutation a contact ever sees is demotion (`primary → secondary`)
//! together with re-pointing its `linked_id`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString, IntoStaticStr};

/// Store-assigned, monotonically increasing contact identifier.
pub type ContactId = i64;

// ─── Precedence ──────────────────────────────────────────────────────────────

/// Whether a contact anchors its cluster or hangs off another contact.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  AsRefStr,
  Display,
  EnumString,
  IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LinkPrecedence {
  Primary,
  Secondary,
}

// ─── Records ─────────────────────────────────────────────────────────────────

/// A persisted contact record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
  pub id:              ContactId,
  pub email:           Option<String>,
  pub phone_number:    Option<String>,
  /// Present only on secondaries; always names a primary.
  pub linked_id:       Option<ContactId>,
  pub link_precedence: LinkPrecedence,
  /// Seniority within a cluster is decided by this timestamp, then by `id`.
  pub created_at:      DateTime<Utc>,
  pub updated_at:      DateTime<Utc>,
  /// Soft-delete marker. Never set by the resolver.
  pub deleted_at:      Option<DateTime<Utc>>,
}

impl Contact {
  pub fn is_primary(&self) -> bool {
    self.link_precedence == LinkPrecedence::Primary
  }

  /// The id of the primary that owns this contact's cluster, as recorded
  /// on the contact itself.
  pub fn owner_id(&self) -> Option<ContactId> {
    match self.link_precedence {
      LinkPrecedence::Primary => Some(self.id),
      LinkPrecedence::Secondary => self.linked_id,
    }
  }

  /// Sort key for seniority: oldest first, lowest id on ties.
  pub fn seniority(&self) -> (DateTime<Utc>, ContactId) {
    (self.created_at, self.id)
  }
}

/// Input for [`ContactStore::create`](crate::store::ContactStore::create).
/// The store assigns `id` and the timestamps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewContact {
  pub email:           Option<String>,
  pub phone_number:    Option<String>,
  pub link_precedence: LinkPrecedence,
  pub linked_id:       Option<ContactId>,
}

impl NewContact {
  /// A fresh primary carrying the given fields.
  pub fn primary(email: Option<String>, phone_number: Option<String>) -> Self {
    Self {
      email,
      phone_number,
      link_precedence: LinkPrecedence::Primary,
      linked_id: None,
    }
  }

  /// A secondary attached to `primary_id`.
  pub fn secondary(
    email: Option<String>,
    phone_number: Option<String>,
    primary_id: ContactId,
  ) -> Self {
    Self {
      email,
      phone_number,
      link_precedence: LinkPrecedence::Secondary,
      linked_id: Some(primary_id),
    }
  }
}

#[cfg(test)]
mod tests {
  use std::str::FromStr;

  use super::*;

  #[test]
  fn precedence_encodes_lowercase() {
    assert_eq!(LinkPrecedence::Primary.as_ref(), "primary");
    assert_eq!(LinkPrecedence::Secondary.to_string(), "secondary");
    assert_eq!(
      LinkPrecedence::from_str("secondary").unwrap(),
      LinkPrecedence::Secondary
    );
    assert!(LinkPrecedence::from_str("tertiary").is_err());
  }

  #[test]
  fn owner_of_secondary_is_its_link() {
    let now = Utc::now();
    let contact = Contact {
      id:              9,
      email:           None,
      phone_number:    Some("123".into()),
      linked_id:       Some(2),
      link_precedence: LinkPrecedence::Secondary,
      created_at:      now,
      updated_at:      now,
      deleted_at:      None,
    };
    assert_eq!(contact.owner_id(), Some(2));
    assert!(!contact.is_primary());
  }
}
