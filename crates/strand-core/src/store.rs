//! The `ContactStore` trait.
//!
//! Implemented by storage backends (e.g. `strand-store-sqlite`, or the
//! in-memory [`MemoryStore`](crate::memory::MemoryStore)). The resolver
//! depends on this abstraction, never on a concrete backend.

use std::future::Future;

use crate::contact::{Contact, ContactId, NewContact};

/// Abstraction over an ordered, queryable collection of contacts.
///
/// Contacts are never deleted through this interface. The only in-place
/// update is [`demote_to_secondary`](ContactStore::demote_to_secondary).
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait ContactStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// All contacts whose email equals `email` or whose phone number equals
  /// `phone_number`, oldest first (`created_at`, then `id`).
  ///
  /// An absent argument matches nothing; it is never a wildcard. With both
  /// absent the result is empty.
  fn find_by_email_or_phone(
    &self,
    email: Option<String>,
    phone_number: Option<String>,
  ) -> impl Future<Output = Result<Vec<Contact>, Self::Error>> + Send + '_;

  /// The contact `primary_id` plus every contact whose `linked_id` is
  /// `primary_id`, oldest first. Empty if no such contact exists.
  fn find_cluster(
    &self,
    primary_id: ContactId,
  ) -> impl Future<Output = Result<Vec<Contact>, Self::Error>> + Send + '_;

  /// Persist a new contact. The store assigns `id`, `created_at` and
  /// `updated_at`.
  fn create(
    &self,
    input: NewContact,
  ) -> impl Future<Output = Result<Contact, Self::Error>> + Send + '_;

  /// Atomically mark every contact in `ids` as secondary and point its
  /// `linked_id` at `primary_id`. Either all rows change or none do.
  fn demote_to_secondary(
    &self,
    ids: Vec<ContactId>,
    primary_id: ContactId,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
