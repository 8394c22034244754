//! Resume-position tracking for the indexer.
//!
//! The cursor is the highest block number whose ingest jobs have all been
//! durably enqueued. It only moves forward, and only after the publish that
//! justifies the move has been acknowledged by the broker — never before.

use anyhow::Result;
use sea_orm::{ActiveValue::Set, ConnectionTrait, EntityTrait};

use evm_indexer_entity::indexer_checkpoints;

use crate::metrics::INDEXER_CURSOR;

pub const INDEXER_COMPONENT: &str = "indexer";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Cursor(pub u64);

impl Cursor {
    /// Returns the cursor that results from observing `candidate` as
    /// durably published. Never regresses.
    pub fn advanced(self, candidate: u64) -> Self {
        Cursor(self.0.max(candidate))
    }
}

/// Reads the persisted cursor for `component`, defaulting to 0 (meaning:
/// replay from the genesis/starting-block override) when no row exists yet.
pub async fn load_cursor<C: ConnectionTrait>(db: &C, component: &str) -> Result<Cursor> {
    let row = indexer_checkpoints::Entity::find_by_id(component.to_owned())
        .one(db)
        .await?;
    let value = row.map(|m| m.validated_cursor()).unwrap_or(0);
    INDEXER_CURSOR
        .with_label_values(&[component])
        .set(value as f64);
    Ok(Cursor(value))
}

/// Persists `cursor` for `component` if it advances the stored value.
pub async fn store_cursor<C: ConnectionTrait>(
    db: &C,
    component: &str,
    cursor: Cursor,
) -> Result<()> {
    let existing = indexer_checkpoints::Entity::find_by_id(component.to_owned())
        .one(db)
        .await?;
    if let Some(row) = &existing {
        if row.cursor_block_number as u64 >= cursor.0 {
            return Ok(());
        }
    }

    let model = indexer_checkpoints::ActiveModel {
        component: Set(component.to_owned()),
        cursor_block_number: Set(cursor.0 as i64),
        updated_at: Set(chrono::Utc::now()),
    };

    use sea_orm::sea_query::OnConflict;
    indexer_checkpoints::Entity::insert(model)
        .on_conflict(
            OnConflict::column(indexer_checkpoints::Column::Component)
                .update_columns([
                    indexer_checkpoints::Column::CursorBlockNumber,
                    indexer_checkpoints::Column::UpdatedAt,
                ])
                .to_owned(),
        )
        .exec(db)
        .await?;

    INDEXER_CURSOR
        .with_label_values(&[component])
        .set(cursor.0 as f64);
    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn advance_never_regresses() {
        let c = Cursor(100);
        assert_eq!(c.advanced(50), Cursor(100));
        assert_eq!(c.advanced(150), Cursor(150));
        assert_eq!(c.advanced(150).advanced(150), Cursor(150));
    }

    #[test]
    fn ordering_is_numeric() {
        assert!(Cursor(10) < Cursor(11));
        assert!(Cursor(0) == Cursor(0));
    }
}
