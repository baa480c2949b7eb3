//! Local leaderboard of finished sessions
//!
//! Best first by score. Equal scores go to whoever survived longer; a full
//! tie keeps the older entry ahead.

use serde::{Deserialize, Serialize};

/// Entries kept on the board
pub const MAX_HIGH_SCORES: usize = 10;

/// One finished session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighScoreEntry {
    pub score: u64,
    /// Level reached
    pub level: u32,
    /// Seconds survived
    pub elapsed_secs: u32,
    /// Unix timestamp (ms) when the session ended
    pub timestamp: f64,
}

impl HighScoreEntry {
    fn key(&self) -> (u64, u32) {
        (self.score, self.elapsed_secs)
    }

    /// Strictly better than `other`
    pub fn outranks(&self, other: &HighScoreEntry) -> bool {
        self.key() > other.key()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HighScores {
    pub entries: Vec<HighScoreEntry>,
}

impl HighScores {
    #[cfg(target_arch = "wasm32")]
    const STORAGE_KEY: &'static str = "space_defender_highscores";

    pub fn new() -> Self {
        Self::default()
    }

    /// Board slot (0-based) a session with this result would take
    fn slot_for(&self, score: u64, elapsed_secs: u32) -> Option<usize> {
        if score == 0 {
            return None;
        }
        let slot = self
            .entries
            .iter()
            .position(|e| (score, elapsed_secs) > e.key())
            .unwrap_or(self.entries.len());
        (slot < MAX_HIGH_SCORES).then_some(slot)
    }

    /// A session with this result would make the board
    pub fn qualifies(&self, score: u64, elapsed_secs: u32) -> bool {
        self.slot_for(score, elapsed_secs).is_some()
    }

    /// 1-based rank this result would get, without recording it
    pub fn potential_rank(&self, score: u64, elapsed_secs: u32) -> Option<usize> {
        self.slot_for(score, elapsed_secs).map(|slot| slot + 1)
    }

    /// Record a finished session; returns its 1-based rank when it made the board
    pub fn add_score(
        &mut self,
        score: u64,
        level: u32,
        elapsed_secs: u32,
        timestamp: f64,
    ) -> Option<usize> {
        let slot = self.slot_for(score, elapsed_secs)?;
        self.entries.insert(
            slot,
            HighScoreEntry {
                score,
                level,
                elapsed_secs,
                timestamp,
            },
        );
        self.entries.truncate(MAX_HIGH_SCORES);
        Some(slot + 1)
    }

    pub fn top_score(&self) -> Option<u64> {
        self.entries.first().map(|e| e.score)
    }

    /// Read the board from LocalStorage; unreadable data starts a fresh board
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let stored = web_sys::window()
            .and_then(|w| w.local_storage().ok().flatten())
            .and_then(|s| s.get_item(Self::STORAGE_KEY).ok().flatten());

        let Some(json) = stored else {
            log::info!("No high scores stored yet");
            return Self::new();
        };
        match serde_json::from_str::<HighScores>(&json) {
            Ok(mut board) => {
                // Older boards may predate the survival tie-break
                board.entries.sort_by(|a, b| {
                    b.score
                        .cmp(&a.score)
                        .then_with(|| b.elapsed_secs.cmp(&a.elapsed_secs))
                });
                board.entries.truncate(MAX_HIGH_SCORES);
                log::info!("Loaded {} high scores", board.entries.len());
                board
            }
            Err(e) => {
                log::warn!("Discarding unreadable high scores: {}", e);
                Self::new()
            }
        }
    }

    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let Some(storage) = web_sys::window().and_then(|w| w.local_storage().ok().flatten())
        else {
            log::warn!("LocalStorage unavailable, high scores not saved");
            return;
        };
        match serde_json::to_string(self) {
            Ok(json) => {
                if storage.set_item(Self::STORAGE_KEY, &json).is_err() {
                    log::warn!("Failed to write high scores");
                }
            }
            Err(e) => log::warn!("Failed to encode high scores: {}", e),
        }
    }

    /// Native builds keep the board in memory only
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::new()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {}
}
