use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::scramble::{DEFAULT_PUZZLE, PuzzleId};
use crate::session::SolveRecord;

const SCHEMA_VERSION: u32 = 1;

/// Solve history map, one capped record list per puzzle. Stored under the
/// `all_data` key.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SolveData {
    pub schema_version: u32,
    pub puzzles: HashMap<PuzzleId, Vec<SolveRecord>>,
}

impl Default for SolveData {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            puzzles: HashMap::new(),
        }
    }
}

/// Active puzzle selection. Stored under the `current_puzzle` key.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionData {
    pub schema_version: u32,
    pub current_puzzle: PuzzleId,
}

impl Default for SessionData {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            current_puzzle: PuzzleId::new(DEFAULT_PUZZLE),
        }
    }
}

/// Pre-generated scramble queues, full map for every puzzle. Stored under
/// the `scramble_queues` key. Order within a queue is significant:
/// consumption pops from the tail.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct QueueData {
    pub schema_version: u32,
    pub queues: HashMap<PuzzleId, Vec<String>>,
}

impl Default for QueueData {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            queues: HashMap::new(),
        }
    }
}

pub const EXPORT_VERSION: u32 = 1;

/// Everything persisted plus the config, bundled for backup/transfer.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExportData {
    pub cubedr_export_version: u32,
    pub exported_at: DateTime<Utc>,
    pub config: Config,
    pub solves: SolveData,
    pub session: SessionData,
    pub queues: QueueData,
}
