//! [`SqliteStore`]: the SQLite implementation of [`VersionStore`].

use std::path::Path;

use bitemp_core::{
  invariant,
  store::{Batch, VersionStore, Write},
  version::{EntityId, Version},
};
use rusqlite::{Connection, OptionalExtension as _, TransactionBehavior};
use tracing::debug;
use uuid::Uuid;

use crate::{
  Result,
  encode::{
    EncodedVersion, RawVersion, VERSION_COLUMNS, encode_dt, encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A version store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted. Separate
/// `open` calls on the same file behave like separate processes: each
/// commit re-reads and re-validates inside its own write transaction.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref().to_path_buf();
    debug!(path = %path.display(), "opening sqlite version store");
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, mostly for tests.
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

  /// Validate and write `batch` in one immediate transaction.
  pub async fn commit_batch(&self, batch: Batch) -> Result<Vec<Uuid>> {
    self.conn.call(move |conn| Ok(commit_in(conn, &batch))).await?
  }

  pub async fn load_versions(&self, entity_id: &EntityId) -> Result<Vec<Version>> {
    let entity_id = entity_id.clone();
    self
      .conn
      .call(move |conn| Ok(select_versions(conn, &entity_id)))
      .await?
  }

  pub async fn locate_version(&self, version_id: Uuid) -> Result<Option<EntityId>> {
    let id_str = encode_uuid(version_id);

    let entity: Option<String> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT entity_id FROM versions WHERE version_id = ?1",
              rusqlite::params![id_str],
              |row| row.get(0),
            )
            .optional()?,
        )
      })
      .await?;

    Ok(entity.map(EntityId::new))
  }

  pub async fn list_entities(&self) -> Result<Vec<EntityId>> {
    let ids: Vec<String> = self
      .conn
      .call(|conn| {
        let mut stmt = conn
          .prepare("SELECT DISTINCT entity_id FROM versions ORDER BY entity_id")?;
        let rows = stmt
          .query_map([], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(ids.into_iter().map(EntityId::new).collect())
  }
}

// ─── Blocking helpers (run on the connection thread) ─────────────────────────

fn select_versions(conn: &Connection, entity_id: &EntityId) -> Result<Vec<Version>> {
  let mut stmt = conn.prepare(&format!(
    "SELECT {VERSION_COLUMNS} FROM versions
     WHERE entity_id = ?1
     ORDER BY transaction_from, valid_from"
  ))?;

  let raws = stmt
    .query_map(rusqlite::params![entity_id.as_str()], RawVersion::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  raws.into_iter().map(RawVersion::into_version).collect()
}

fn insert_version(conn: &Connection, version: &Version) -> Result<()> {
  let row = EncodedVersion::new(version)?;
  conn.execute(
    &format!(
      "INSERT INTO versions ({VERSION_COLUMNS})
       VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"
    ),
    rusqlite::params![
      row.version_id,
      row.entity_id,
      row.attributes,
      row.valid_from,
      row.valid_to,
      row.transaction_from,
      row.transaction_to,
    ],
  )?;
  Ok(())
}

/// The whole commit protocol. `BEGIN IMMEDIATE` takes the database write
/// lock up front, so the rows read for validation cannot change before the
/// writes land. Any early return drops the transaction, which rolls it back.
fn commit_in(conn: &mut Connection, batch: &Batch) -> Result<Vec<Uuid>> {
  let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

  let mut versions = select_versions(&tx, &batch.entity_id)?;
  let appended = invariant::apply(&mut versions, batch)?;

  for write in &batch.writes {
    match write {
      Write::Close { version_id, at } => {
        tx.execute(
          "UPDATE versions SET transaction_to = ?2
           WHERE version_id = ?1 AND transaction_to IS NULL",
          rusqlite::params![encode_uuid(*version_id), encode_dt(*at)?],
        )?;
      }
      Write::Append(version) => insert_version(&tx, version)?,
    }
  }

  tx.commit()?;
  Ok(appended)
}

// ─── VersionStore impl ───────────────────────────────────────────────────────

impl VersionStore for SqliteStore {
  async fn commit(&self, batch: Batch) -> bitemp_core::Result<Vec<Uuid>> {
    Ok(self.commit_batch(batch).await?)
  }

  async fn versions_for(
    &self,
    entity_id: &EntityId,
  ) -> bitemp_core::Result<Vec<Version>> {
    Ok(self.load_versions(entity_id).await?)
  }

  async fn locate(&self, version_id: Uuid) -> bitemp_core::Result<Option<EntityId>> {
    Ok(self.locate_version(version_id).await?)
  }

  async fn entities(&self) -> bitemp_core::Result<Vec<EntityId>> {
    Ok(self.list_entities().await?)
  }
}
