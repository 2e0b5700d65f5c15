//! Snowflake ID Generator
//!
//! Time-ordered 63-bit identifiers for messages and device tokens.
//!
//! Layout: 41 bits of milliseconds since [`EPOCH_MS`], 10 bits of machine id,
//! 12 bits of per-millisecond sequence.

use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, TimeZone, Utc};
use parking_lot::Mutex;

/// Custom epoch (2024-01-01T00:00:00.000Z)
pub const EPOCH_MS: u64 = 1_704_067_200_000;

const MACHINE_BITS: u64 = 10;
const SEQUENCE_BITS: u64 = 12;
const MAX_SEQUENCE: u64 = (1 << SEQUENCE_BITS) - 1;

struct GeneratorState {
    last_timestamp: u64,
    sequence: u64,
}

/// Snowflake ID generator
pub struct SnowflakeGenerator {
    machine_id: u64,
    state: Mutex<GeneratorState>,
}

impl SnowflakeGenerator {
    pub fn new(machine_id: u16) -> Self {
        Self {
            machine_id: u64::from(machine_id) & ((1 << MACHINE_BITS) - 1),
            state: Mutex::new(GeneratorState {
                last_timestamp: 0,
                sequence: 0,
            }),
        }
    }

    /// Generate a new snowflake ID.
    ///
    /// IDs from one generator are strictly increasing; when the sequence for
    /// the current millisecond is exhausted the generator spins into the next.
    pub fn generate(&self) -> i64 {
        let mut state = self.state.lock();
        let mut timestamp = current_millis().max(state.last_timestamp);

        if timestamp == state.last_timestamp {
            state.sequence = (state.sequence + 1) & MAX_SEQUENCE;
            if state.sequence == 0 {
                while timestamp <= state.last_timestamp {
                    std::hint::spin_loop();
                    timestamp = current_millis().max(state.last_timestamp);
                }
            }
        } else {
            state.sequence = 0;
        }
        state.last_timestamp = timestamp;

        let id = ((timestamp - EPOCH_MS) << (MACHINE_BITS + SEQUENCE_BITS))
            | (self.machine_id << SEQUENCE_BITS)
            | state.sequence;
        id as i64
    }
}

fn current_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(EPOCH_MS)
}

/// Creation time encoded in a snowflake.
pub fn timestamp_of(snowflake: i64) -> DateTime<Utc> {
    let millis = ((snowflake as u64) >> (MACHINE_BITS + SEQUENCE_BITS)) + EPOCH_MS;
    Utc.timestamp_millis_opt(millis as i64)
        .single()
        .unwrap_or_else(Utc::now)
}
