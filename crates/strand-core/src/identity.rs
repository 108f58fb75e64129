//! The consolidated identity — the computed read model of a cluster.
//!
//! Never stored, always derived from the primary and its members.

use serde::{Deserialize, Serialize};

use crate::{
  contact::{Contact, ContactId},
  request::Submission,
};

// ─── Response types ──────────────────────────────────────────────────────────

/// One resolved identity.
///
/// `emails` and `phone_numbers` are deduplicated; the primary contact's own
/// values come first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsolidatedIdentity {
  pub primary_contact_id:    ContactId,
  pub emails:                Vec<String>,
  pub phone_numbers:         Vec<String>,
  /// In cluster-load order, with any contact created by the current call
  /// last.
  pub secondary_contact_ids: Vec<ContactId>,
}

/// Envelope returned by `POST /identify`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifyResponse {
  pub contact: ConsolidatedIdentity,
}

impl From<ConsolidatedIdentity> for IdentifyResponse {
  fn from(contact: ConsolidatedIdentity) -> Self { Self { contact } }
}

// ─── Accumulator ─────────────────────────────────────────────────────────────

/// Known values of a cluster, accumulated in presentation order.
#[derive(Debug)]
pub(crate) struct ClusterView {
  primary_id:    ContactId,
  emails:        Vec<String>,
  phone_numbers: Vec<String>,
  secondary_ids: Vec<ContactId>,
}

impl ClusterView {
  /// Seed with the primary's own values so they render first, then fold in
  /// every other member.
  pub(crate) fn new(primary: &Contact, members: &[Contact]) -> Self {
    let mut view = Self {
      primary_id:    primary.id,
      emails:        Vec::new(),
      phone_numbers: Vec::new(),
      secondary_ids: Vec::new(),
    };
    view.add_values(primary);
    for member in members.iter().filter(|m| m.id != primary.id) {
      view.absorb(member);
    }
    view
  }

  /// True when the submission carries an email or phone number not yet
  /// seen anywhere in the cluster. Absent fields are never novel.
  pub(crate) fn is_novel(&self, submission: &Submission) -> bool {
    let new_email = submission
      .email()
      .is_some_and(|e| !self.emails.iter().any(|k| k == e));
    let new_phone = submission
      .phone_number()
      .is_some_and(|p| !self.phone_numbers.iter().any(|k| k == p));
    new_email || new_phone
  }

  /// Record a secondary member.
  pub(crate) fn absorb(&mut self, contact: &Contact) {
    self.secondary_ids.push(contact.id);
    self.add_values(contact);
  }

  fn add_values(&mut self, contact: &Contact) {
    push_unique(&mut self.emails, contact.email.as_deref());
    push_unique(&mut self.phone_numbers, contact.phone_number.as_deref());
  }

  pub(crate) fn into_identity(self) -> ConsolidatedIdentity {
    ConsolidatedIdentity {
      primary_contact_id:    self.primary_id,
      emails:                self.emails,
      phone_numbers:         self.phone_numbers,
      secondary_contact_ids: self.secondary_ids,
    }
  }
}

fn push_unique(values: &mut Vec<String>, value: Option<&str>) {
  if let Some(v) = value
    && !values.iter().any(|k| k == v)
  {
    values.push(v.to_owned());
  }
}
