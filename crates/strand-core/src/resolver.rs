//! [`IdentityResolver`] — maps a submission onto the identity graph.
//!
//! One call runs these steps in order:
//!
//! 1. **Match** every contact sharing the submitted email or phone number.
//!    No match creates a fresh primary and stops there.
//! 2. **Own**: map each match to the primary owning its cluster.
//! 3. **Consolidate**: if several primaries own matches, the most senior
//!    (oldest `created_at`, then lowest id) survives; every other one is
//!    demoted together with its secondaries.
//! 4. **Load** the surviving cluster in full.
//! 5. **Extend** it with a new secondary when the submission carries an
//!    email or phone number the cluster has not seen.
//! 6. **Render** the [`ConsolidatedIdentity`].
//!
//! All writes happen after the reads that decide them, under
//! [`KeyLocks`].

use std::sync::Arc;

use crate::{
  Error, Result,
  contact::{Contact, ContactId, NewContact},
  identity::{ClusterView, ConsolidatedIdentity},
  lock::KeyLocks,
  request::{IdentifyRequest, Submission},
  store::ContactStore,
};

/// The identity consolidation engine, generic over its store.
pub struct IdentityResolver<S> {
  store: Arc<S>,
  locks: KeyLocks,
}

impl<S: ContactStore> IdentityResolver<S> {
  pub fn new(store: Arc<S>) -> Self { Self { store, locks: KeyLocks::new() } }

  pub fn store(&self) -> &Arc<S> { &self.store }

  /// Validate `request`, then resolve it. Invalid requests never reach the
  /// store.
  pub async fn identify(&self, request: &IdentifyRequest) -> Result<ConsolidatedIdentity> {
    let submission = request.validate()?;
    self.resolve(&submission).await
  }

  /// Resolve an already-validated submission.
  pub async fn resolve(&self, submission: &Submission) -> Result<ConsolidatedIdentity> {
    tracing::debug!(
      has_email = submission.email().is_some(),
      has_phone = submission.phone_number().is_some(),
      "resolving identity"
    );

    {
      let _keys = self.locks.shared(&submission.lock_keys()).await;
      if let Some(identity) = self.pass(submission, false).await? {
        return Ok(identity);
      }
    }

    tracing::debug!("submission bridges clusters; retrying with exclusive access");
    let _gate = self.locks.exclusive().await;
    self
      .pass(submission, true)
      .await?
      .ok_or_else(|| Error::Consistency("cluster merge did not settle".to_owned()))
  }

  /// One read-decide-write sequence. Returns `None` when a merge is needed
  /// but `may_merge` is false.
  async fn pass(
    &self,
    submission: &Submission,
    may_merge: bool,
  ) -> Result<Option<ConsolidatedIdentity>> {
    let matches = self
      .store
      .find_by_email_or_phone(
        submission.email().map(str::to_owned),
        submission.phone_number().map(str::to_owned),
      )
      .await
      .map_err(Error::store)?;

    if matches.is_empty() {
      return self.create_primary(submission).await.map(Some);
    }

    let owners = self.owning_primaries(&matches).await?;
    tracing::debug!(matched = matches.len(), owners = owners.len(), "matched contacts");

    let Some((survivor, younger)) = owners.split_first() else {
      return Err(violation("matched contacts resolved to no primary".to_owned()));
    };

    if !younger.is_empty() {
      if !may_merge {
        return Ok(None);
      }
      self.consolidate(survivor, younger).await?;
    }

    self.settle(survivor.id, submission).await.map(Some)
  }

  async fn create_primary(&self, submission: &Submission) -> Result<ConsolidatedIdentity> {
    let created = self
      .store
      .create(NewContact::primary(
        submission.email().map(str::to_owned),
        submission.phone_number().map(str::to_owned),
      ))
      .await
      .map_err(Error::store)?;

    tracing::info!(primary_id = created.id, "created primary contact");
    Ok(ClusterView::new(&created, &[]).into_identity())
  }

  /// Distinct primaries owning `matches`, most senior first.
  async fn owning_primaries(&self, matches: &[Contact]) -> Result<Vec<Contact>> {
    let mut owners: Vec<Contact> = Vec::new();

    for contact in matches {
      let owner_id = contact.owner_id().ok_or_else(|| {
        violation(format!("secondary contact {} has no linked primary", contact.id))
      })?;
      if owners.iter().any(|o| o.id == owner_id) {
        continue;
      }

      let owner = match matches.iter().find(|m| m.id == owner_id) {
        Some(found) => found.clone(),
        None => self.load_contact(owner_id, contact.id).await?,
      };
      if !owner.is_primary() {
        return Err(violation(format!(
          "contact {} links to contact {owner_id}, which is not primary",
          contact.id
        )));
      }
      owners.push(owner);
    }

    owners.sort_by_key(Contact::seniority);
    Ok(owners)
  }

  async fn load_contact(&self, id: ContactId, referrer: ContactId) -> Result<Contact> {
    self
      .store
      .find_cluster(id)
      .await
      .map_err(Error::store)?
      .into_iter()
      .find(|c| c.id == id)
      .ok_or_else(|| {
        violation(format!("contact {referrer} links to missing contact {id}"))
      })
  }

  /// Demote every primary in `younger`, and its secondaries, under
  /// `survivor` in one store call.
  async fn consolidate(&self, survivor: &Contact, younger: &[Contact]) -> Result<()> {
    let mut ids = Vec::new();
    for primary in younger {
      let members = self
        .store
        .find_cluster(primary.id)
        .await
        .map_err(Error::store)?;
      ids.extend(members.iter().map(|c| c.id));
    }
    ids.sort_unstable();
    ids.dedup();

    tracing::info!(
      primary_id = survivor.id,
      demoted = younger.len(),
      relinked = ids.len(),
      "consolidating primary contacts"
    );

    self
      .store
      .demote_to_secondary(ids, survivor.id)
      .await
      .map_err(Error::store)
  }

  /// Load the full cluster of `primary_id`, extend it if the submission is
  /// novel, and render it.
  async fn settle(
    &self,
    primary_id: ContactId,
    submission: &Submission,
  ) -> Result<ConsolidatedIdentity> {
    let members = self
      .store
      .find_cluster(primary_id)
      .await
      .map_err(Error::store)?;

    let primary = members
      .iter()
      .find(|c| c.id == primary_id)
      .ok_or_else(|| violation(format!("primary contact {primary_id} vanished")))?;
    if !primary.is_primary() {
      return Err(violation(format!(
        "contact {primary_id} is no longer primary"
      )));
    }

    let mut view = ClusterView::new(primary, &members);

    if view.is_novel(submission) {
      let created = self
        .store
        .create(NewContact::secondary(
          submission.email().map(str::to_owned),
          submission.phone_number().map(str::to_owned),
          primary_id,
        ))
        .await
        .map_err(Error::store)?;

      tracing::info!(primary_id, secondary_id = created.id, "created secondary contact");
      view.absorb(&created);
    }

    let identity = view.into_identity();
    tracing::debug!(
      primary_id,
      emails = identity.emails.len(),
      phone_numbers = identity.phone_numbers.len(),
      secondaries = identity.secondary_contact_ids.len(),
      "identity resolved"
    );
    Ok(identity)
  }
}

fn violation(message: String) -> Error {
  tracing::error!(%message, "identity graph consistency violation");
  Error::Consistency(message)
}
