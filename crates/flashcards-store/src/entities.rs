// ABOUTME: Folder and card persistence, every statement scoped by owner (and folder, for cards).
// ABOUTME: A scoped statement touching zero rows is how callers learn an entity is absent or not theirs.

use flashcards_core::{Card, Folder, RowId};
use rusqlite::{OptionalExtension, Row, params};

use crate::sqlite::Store;

/// Outcome of inserting a card, which needs a folder owned by the same user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardInsert {
    Created(Card),
    FolderNotFound,
    Failed,
}

fn folder_from_row(row: &Row<'_>) -> rusqlite::Result<Folder> {
    Ok(Folder {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        name: row.get(2)?,
    })
}

fn card_from_row(row: &Row<'_>) -> rusqlite::Result<Card> {
    Ok(Card {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        folder_id: row.get(2)?,
        term: row.get(3)?,
        translation: row.get(4)?,
    })
}

impl Store {
    pub fn insert_folder(&self, owner_id: RowId, name: &str) -> Option<Folder> {
        self.with_conn("insert folder", |conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO folders (owner_id, name) VALUES (?1, ?2)",
                params![owner_id, name],
            )?;
            let id = tx.last_insert_rowid();
            tx.commit()?;
            Ok(Folder {
                id,
                owner_id,
                name: name.to_string(),
            })
        })
    }

    pub fn folder(&self, folder_id: RowId, owner_id: RowId) -> Option<Folder> {
        self.with_conn("get folder", |conn| {
            let folder = conn
                .query_row(
                    "SELECT id, owner_id, name FROM folders WHERE id = ?1 AND owner_id = ?2",
                    params![folder_id, owner_id],
                    folder_from_row,
                )
                .optional()?;
            Ok(folder)
        })
        .flatten()
    }

    /// All folders of an owner, oldest first. `None` only on storage failure.
    pub fn folders(&self, owner_id: RowId) -> Option<Vec<Folder>> {
        self.with_conn("list folders", |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, owner_id, name FROM folders WHERE owner_id = ?1 ORDER BY id ASC",
            )?;
            let rows = stmt.query_map(params![owner_id], folder_from_row)?;

            let mut folders = Vec::new();
            for row in rows {
                folders.push(row?);
            }
            Ok(folders)
        })
    }

    pub fn rename_folder(&self, folder_id: RowId, owner_id: RowId, name: &str) -> bool {
        self.with_conn_bool("rename folder", |conn| {
            let tx = conn.transaction()?;
            let changed = tx.execute(
                "UPDATE folders SET name = ?1 WHERE id = ?2 AND owner_id = ?3",
                params![name, folder_id, owner_id],
            )?;
            tx.commit()?;
            Ok(changed > 0)
        })
    }

    /// Delete a folder and every card in it. Both statements share one
    /// transaction; if the folder is absent nothing is applied.
    pub fn delete_folder(&self, folder_id: RowId, owner_id: RowId) -> bool {
        self.with_conn_bool("delete folder", |conn| {
            let tx = conn.transaction()?;
            let cards = tx.execute(
                "DELETE FROM cards WHERE folder_id = ?1 AND owner_id = ?2",
                params![folder_id, owner_id],
            )?;
            let folders = tx.execute(
                "DELETE FROM folders WHERE id = ?1 AND owner_id = ?2",
                params![folder_id, owner_id],
            )?;
            if folders == 0 {
                return Ok(false);
            }
            tx.commit()?;

            tracing::debug!(folder_id, owner_id, cards, "deleted folder");
            Ok(true)
        })
    }

    /// Insert a card into a folder the owner holds. The ownership check and
    /// the insert run in the same transaction.
    pub fn insert_card(
        &self,
        owner_id: RowId,
        folder_id: RowId,
        term: &str,
        translation: &str,
    ) -> CardInsert {
        self.with_conn("insert card", |conn| {
            let tx = conn.transaction()?;
            let owned = tx
                .query_row(
                    "SELECT 1 FROM folders WHERE id = ?1 AND owner_id = ?2",
                    params![folder_id, owner_id],
                    |_| Ok(()),
                )
                .optional()?
                .is_some();
            if !owned {
                return Ok(CardInsert::FolderNotFound);
            }

            tx.execute(
                "INSERT INTO cards (owner_id, folder_id, term, translation) VALUES (?1, ?2, ?3, ?4)",
                params![owner_id, folder_id, term, translation],
            )?;
            let id = tx.last_insert_rowid();
            tx.commit()?;

            Ok(CardInsert::Created(Card {
                id,
                owner_id,
                folder_id,
                term: term.to_string(),
                translation: translation.to_string(),
            }))
        })
        .unwrap_or(CardInsert::Failed)
    }

    pub fn card(&self, card_id: RowId, owner_id: RowId, folder_id: RowId) -> Option<Card> {
        self.with_conn("get card", |conn| {
            let card = conn
                .query_row(
                    "SELECT id, owner_id, folder_id, term, translation FROM cards
                     WHERE id = ?1 AND owner_id = ?2 AND folder_id = ?3",
                    params![card_id, owner_id, folder_id],
                    card_from_row,
                )
                .optional()?;
            Ok(card)
        })
        .flatten()
    }

    /// All cards in one of the owner's folders, oldest first.
    pub fn cards(&self, owner_id: RowId, folder_id: RowId) -> Option<Vec<Card>> {
        self.with_conn("list cards", |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, owner_id, folder_id, term, translation FROM cards
                 WHERE owner_id = ?1 AND folder_id = ?2 ORDER BY id ASC",
            )?;
            let rows = stmt.query_map(params![owner_id, folder_id], card_from_row)?;

            let mut cards = Vec::new();
            for row in rows {
                cards.push(row?);
            }
            Ok(cards)
        })
    }

    pub fn update_card(
        &self,
        card_id: RowId,
        owner_id: RowId,
        folder_id: RowId,
        term: &str,
        translation: &str,
    ) -> bool {
        self.with_conn_bool("update card", |conn| {
            let tx = conn.transaction()?;
            let changed = tx.execute(
                "UPDATE cards SET term = ?1, translation = ?2
                 WHERE id = ?3 AND owner_id = ?4 AND folder_id = ?5",
                params![term, translation, card_id, owner_id, folder_id],
            )?;
            tx.commit()?;
            Ok(changed > 0)
        })
    }

    pub fn delete_card(&self, card_id: RowId, owner_id: RowId, folder_id: RowId) -> bool {
        self.with_conn_bool("delete card", |conn| {
            let tx = conn.transaction()?;
            let changed = tx.execute(
                "DELETE FROM cards WHERE id = ?1 AND owner_id = ?2 AND folder_id = ?3",
                params![card_id, owner_id, folder_id],
            )?;
            tx.commit()?;
            Ok(changed > 0)
        })
    }

    /// Total card rows across all owners.
    pub fn card_count(&self) -> Option<usize> {
        self.with_conn("count cards", |conn| {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM cards", [], |row| row.get(0))?;
            Ok(count as usize)
        })
    }
}
