use crate::{indexer_checkpoints, validators};

impl indexer_checkpoints::Model {
    pub fn validated_cursor(&self) -> u64 {
        self.cursor_block_number.max(0) as u64
    }
}

impl validators::Model {
    pub fn clamped_uptime_score(&self) -> f64 {
        self.uptime_score.unwrap_or(0.0).clamp(0.0, 1.0)
    }
}
