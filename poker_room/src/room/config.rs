//! Room configuration models.

use serde::{Deserialize, Serialize};

use crate::game::{Blinds, Chips, hand::MAX_PARTICIPANTS};

/// Room configuration, shared by every room a registry creates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomConfig {
    /// Maximum number of seats (default: 9)
    pub max_seats: usize,

    /// Small blind amount
    pub small_blind: Chips,

    /// Big blind amount
    pub big_blind: Chips,

    /// Buy-in used when a join names no amount
    pub default_buy_in: Chips,

    /// Smallest accepted buy-in
    pub min_buy_in: Chips,

    /// Largest accepted buy-in
    pub max_buy_in: Chips,

    /// Per-connection outbound queue depth before the connection is
    /// treated as a slow consumer and dropped
    pub outbound_capacity: usize,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            max_seats: 9,
            small_blind: 50,
            big_blind: 100,
            default_buy_in: 1000,
            min_buy_in: 1,
            max_buy_in: 1_000_000,
            outbound_capacity: 256,
        }
    }
}

impl RoomConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.small_blind == 0 {
            return Err("Small blind must be positive".to_string());
        }

        if self.big_blind < self.small_blind {
            return Err("Big blind must be at least the small blind".to_string());
        }

        if self.max_seats < 2 || self.max_seats > MAX_PARTICIPANTS {
            return Err(format!(
                "Max seats must be between 2 and {MAX_PARTICIPANTS}"
            ));
        }

        if self.min_buy_in == 0 || self.max_buy_in < self.min_buy_in {
            return Err("Buy-in range must be non-empty and positive".to_string());
        }

        // Seats are never freed, so this bounds every chip the room holds.
        let table_chips = u64::from(self.max_buy_in) * self.max_seats as u64;
        if table_chips > u64::from(Chips::MAX) {
            return Err(format!(
                "Max buy-in times max seats must not exceed {}",
                Chips::MAX
            ));
        }

        if !(self.min_buy_in..=self.max_buy_in).contains(&self.default_buy_in) {
            return Err("Default buy-in must lie within the buy-in range".to_string());
        }

        if self.outbound_capacity == 0 {
            return Err("Outbound capacity must be positive".to_string());
        }

        Ok(())
    }

    pub fn blinds(&self) -> Blinds {
        Blinds {
            small: self.small_blind,
            big: self.big_blind,
        }
    }
}
