//! [`SqliteStore`] — the SQLite implementation of [`ContactStore`].

use std::path::Path;

use chrono::Utc;
use strand_core::{
  contact::{Contact, ContactId, LinkPrecedence, NewContact},
  store::ContactStore,
};

use crate::{
  encode::{CONTACT_COLUMNS, RawContact, encode_dt, encode_precedence},
  schema::SCHEMA,
  Error, Result,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Strand contact store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run a `SELECT` over [`CONTACT_COLUMNS`] and decode every row.
  async fn select_contacts(
    &self,
    where_clause: &'static str,
    params: [Option<rusqlite::types::Value>; 2],
  ) -> Result<Vec<Contact>> {
    let raws: Vec<RawContact> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {CONTACT_COLUMNS} FROM contacts WHERE {where_clause} \
           ORDER BY created_at, id"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params), RawContact::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawContact::into_contact).collect()
  }
}

// ─── ContactStore impl ───────────────────────────────────────────────────────

impl ContactStore for SqliteStore {
  type Error = Error;

  async fn find_by_email_or_phone(
    &self,
    email: Option<String>,
    phone_number: Option<String>,
  ) -> Result<Vec<Contact>> {
    // A NULL parameter compares unequal to everything, so an absent field
    // matches nothing.
    self
      .select_contacts(
        "email = ?1 OR phone_number = ?2",
        [
          email.map(rusqlite::types::Value::Text),
          phone_number.map(rusqlite::types::Value::Text),
        ],
      )
      .await
  }

  async fn find_cluster(&self, primary_id: ContactId) -> Result<Vec<Contact>> {
    let id = Some(rusqlite::types::Value::Integer(primary_id));
    self
      .select_contacts("id = ?1 OR linked_id = ?2", [id.clone(), id])
      .await
  }

  async fn create(&self, input: NewContact) -> Result<Contact> {
    let precedence = encode_precedence(input.link_precedence);
    let (email, phone_number, linked_id) =
      (input.email.clone(), input.phone_number.clone(), input.linked_id);

    // Stamped on the connection thread so `created_at` order matches id order.
    let (id, now) = self
      .conn
      .call(move |conn| {
        let now = Utc::now();
        conn.execute(
          "INSERT INTO contacts (
             email, phone_number, linked_id, link_precedence, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
          rusqlite::params![email, phone_number, linked_id, precedence, encode_dt(now)],
        )?;
        Ok((conn.last_insert_rowid(), now))
      })
      .await?;

    tracing::trace!(id, precedence, "inserted contact");

    Ok(Contact {
      id,
      email: input.email,
      phone_number: input.phone_number,
      linked_id: input.linked_id,
      link_precedence: input.link_precedence,
      created_at: now,
      updated_at: now,
      deleted_at: None,
    })
  }

  async fn demote_to_secondary(
    &self,
    ids: Vec<ContactId>,
    primary_id: ContactId,
  ) -> Result<()> {
    let at_str = encode_dt(Utc::now());
    let secondary = encode_precedence(LinkPrecedence::Secondary);

    let missing: Option<i64> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        for id in &ids {
          let changed = tx.execute(
            "UPDATE contacts
             SET link_precedence = ?1, linked_id = ?2, updated_at = ?3
             WHERE id = ?4",
            rusqlite::params![secondary, primary_id, at_str, id],
          )?;
          if changed == 0 {
            // Dropping `tx` rolls back every row already updated.
            return Ok(Some(*id));
          }
        }
        tx.commit()?;
        Ok(None)
      })
      .await?;

    match missing {
      Some(id) => Err(Error::ContactNotFound(id)),
      None => Ok(()),
    }
  }
}
