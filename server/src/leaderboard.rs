//! Top-N score read-model derived from the player store.

use skirmish_shared::{LeaderboardEntry, PlayerId};
use std::collections::BTreeMap;

use crate::entity::Player;

#[derive(Debug, Clone)]
pub struct Leaderboard {
    capacity: usize,
    entries: Vec<LeaderboardEntry>,
}

impl Leaderboard {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: Vec::new(),
        }
    }

    /// Sorts by score descending, ties broken by the older (lower) id, and
    /// keeps the first `capacity` entries.
    pub fn rank(players: &BTreeMap<PlayerId, Player>, capacity: usize) -> Vec<LeaderboardEntry> {
        let mut ranked: Vec<&Player> = players.values().collect();
        ranked.sort_by(|a, b| b.score.cmp(&a.score).then(a.id.cmp(&b.id)));
        ranked
            .into_iter()
            .take(capacity)
            .map(|player| LeaderboardEntry {
                username: player.username.clone(),
                score: player.score,
            })
            .collect()
    }

    /// Recomputes the cached ranking. Returns true if it changed.
    pub fn refresh(&mut self, players: &BTreeMap<PlayerId, Player>) -> bool {
        let ranked = Self::rank(players, self.capacity);
        if ranked == self.entries {
            return false;
        }
        self.entries = ranked;
        true
    }

    pub fn entries(&self) -> &[LeaderboardEntry] {
        &self.entries
    }
}
