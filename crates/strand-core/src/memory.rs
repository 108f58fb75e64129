//! [`MemoryStore`] — an in-process [`ContactStore`] for tests and ephemeral
//! deployments.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use thiserror::Error;

use crate::{
  contact::{Contact, ContactId, LinkPrecedence, NewContact},
  store::ContactStore,
};

#[derive(Debug, Error)]
pub enum MemoryError {
  #[error("contact not found: {0}")]
  ContactNotFound(ContactId),
}

#[derive(Debug, Default)]
struct Inner {
  contacts: Vec<Contact>,
  next_id:  ContactId,
}

/// A contact store held entirely in memory.
///
/// Cloning is cheap — clones share the same underlying records.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
  inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
  pub fn new() -> Self { Self::default() }

  /// Insert a fully-formed record as-is, bypassing id and timestamp
  /// assignment. Later [`create`](ContactStore::create) calls continue
  /// numbering after the highest id seen.
  pub fn insert(&self, contact: Contact) {
    let mut inner = self.lock();
    inner.next_id = inner.next_id.max(contact.id);
    inner.contacts.push(contact);
  }

  /// Snapshot of every record, in id order.
  pub fn contacts(&self) -> Vec<Contact> {
    let mut all = self.lock().contacts.clone();
    all.sort_by_key(|c| c.id);
    all
  }

  /// Look up a single record by id.
  pub fn get(&self, id: ContactId) -> Option<Contact> {
    self.lock().contacts.iter().find(|c| c.id == id).cloned()
  }

  fn lock(&self) -> MutexGuard<'_, Inner> {
    self.inner.lock().unwrap_or_else(PoisonError::into_inner)
  }
}

fn oldest_first(mut contacts: Vec<Contact>) -> Vec<Contact> {
  contacts.sort_by_key(Contact::seniority);
  contacts
}

impl ContactStore for MemoryStore {
  type Error = MemoryError;

  async fn find_by_email_or_phone(
    &self,
    email: Option<String>,
    phone_number: Option<String>,
  ) -> Result<Vec<Contact>, MemoryError> {
    let matches = self
      .lock()
      .contacts
      .iter()
      .filter(|c| {
        let by_email = email.is_some() && c.email == email;
        let by_phone = phone_number.is_some() && c.phone_number == phone_number;
        by_email || by_phone
      })
      .cloned()
      .collect();
    Ok(oldest_first(matches))
  }

  async fn find_cluster(&self, primary_id: ContactId) -> Result<Vec<Contact>, MemoryError> {
    let members = self
      .lock()
      .contacts
      .iter()
      .filter(|c| c.id == primary_id || c.linked_id == Some(primary_id))
      .cloned()
      .collect();
    Ok(oldest_first(members))
  }

  async fn create(&self, input: NewContact) -> Result<Contact, MemoryError> {
    let mut inner = self.lock();
    inner.next_id += 1;
    let now = Utc::now();
    let contact = Contact {
      id:              inner.next_id,
      email:           input.email,
      phone_number:    input.phone_number,
      linked_id:       input.linked_id,
      link_precedence: input.link_precedence,
      created_at:      now,
      updated_at:      now,
      deleted_at:      None,
    };
    inner.contacts.push(contact.clone());
    Ok(contact)
  }

  async fn demote_to_secondary(
    &self,
    ids: Vec<ContactId>,
    primary_id: ContactId,
  ) -> Result<(), MemoryError> {
    let mut inner = self.lock();

    // Validate everything before touching anything.
    if let Some(missing) = ids
      .iter()
      .find(|id| !inner.contacts.iter().any(|c| c.id == **id))
    {
      return Err(MemoryError::ContactNotFound(*missing));
    }

    let now = Utc::now();
    for contact in inner.contacts.iter_mut().filter(|c| ids.contains(&c.id)) {
      contact.link_precedence = LinkPrecedence::Secondary;
      contact.linked_id = Some(primary_id);
      contact.updated_at = now;
    }
    Ok(())
  }
}
