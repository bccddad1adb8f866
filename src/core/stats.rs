//! Statistics schema reported by the classic tracker server
//!
//! Every counter is an `f64` on the wire. `Stats::default()` is the
//! placeholder shown before the first payload and after a `Connecting` reset.

use serde::{Deserialize, Serialize};

#[derive(Clone, Default, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelDeaths {
    pub level_1: f64,
    pub level_2: f64,
    pub level_3: f64,
    pub level_4: f64,
    pub level_5: f64,
    pub level_6: f64,
    pub level_7: f64,
    pub level_8: f64,
    pub level_9: f64,
    pub level_10: f64,
    pub level_11: f64,
    pub level_12: f64,
    pub level_13: f64,
    pub level_14: f64,
    pub level_15: f64,
    pub level_16: f64,
}

impl LevelDeaths {
    /// Deaths per level, level 1 first
    pub fn as_array(&self) -> [f64; 16] {
        [
            self.level_1,
            self.level_2,
            self.level_3,
            self.level_4,
            self.level_5,
            self.level_6,
            self.level_7,
            self.level_8,
            self.level_9,
            self.level_10,
            self.level_11,
            self.level_12,
            self.level_13,
            self.level_14,
            self.level_15,
            self.level_16,
        ]
    }
}

/// Deaths caused by each enemy kind
#[derive(Clone, Default, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyDeaths {
    pub bat: f64,
    pub snake: f64,
    pub spider: f64,
    pub giant_spider: f64,
    pub caveman: f64,
    pub skeleton: f64,
    pub zombie: f64,
    pub vampire: f64,
    pub frog: f64,
    pub fire_frog: f64,
    pub mantrap: f64,
    pub piranha: f64,
    pub megamouth: f64,
    pub yeti: f64,
    pub yeti_king: f64,
    pub alien: f64,
    pub ufo: f64,
    pub alien_boss: f64,
    pub hawkman: f64,
    pub shopkeeper: f64,
    pub tomb_lord: f64,
    pub magma_man: f64,
    pub olmec: f64,
    pub ghost: f64,
}

/// Deaths caused by traps and the environment
#[derive(Clone, Default, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MiscDeaths {
    pub rock: f64,
    pub explosion: f64,
    pub crushed: f64,
    pub long_fall: f64,
    pub spikes: f64,
    pub boulder: f64,
    pub arrow_trap: f64,
    pub spear_trap: f64,
    pub smash_trap: f64,
    pub ceiling_trap: f64,
    pub pit: f64,
    pub lava: f64,
}

/// Enemies killed by the player
#[derive(Clone, Default, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyKills {
    pub bat: f64,
    pub snake: f64,
    pub spider: f64,
    pub giant_spider: f64,
    pub caveman: f64,
    pub skeleton: f64,
    pub zombie: f64,
    pub vampire: f64,
    pub frog: f64,
    pub monkey: f64,
    pub fire_frog: f64,
    pub mantrap: f64,
    pub piranha: f64,
    pub megamouth: f64,
    pub yeti: f64,
    pub yeti_king: f64,
    pub alien: f64,
    pub ufo: f64,
    pub alien_boss: f64,
    pub hawkman: f64,
    pub shopkeeper: f64,
    pub tomb_lord: f64,
    pub olmec: f64,
}

/// Full statistics snapshot
#[derive(Clone, Default, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Stats {
    pub crates_opened: f64,
    pub chests_opened: f64,
    pub idols_grabbed: f64,
    pub idols_converted: f64,
    pub damsels_grabbed: f64,
    pub kisses_bought: f64,
    pub damsels_bought: f64,
    pub damsels_saved: f64,
    pub damsels_killed: f64,
    pub items_bought: f64,
    pub items_stolen: f64,
    pub dice_games_played: f64,
    pub dice_games_won: f64,
    pub dice_games_lost: f64,

    pub level_deaths: LevelDeaths,
    pub enemy_deaths: EnemyDeaths,
    pub misc_deaths: MiscDeaths,
    pub enemy_kills: EnemyKills,
}

impl Stats {
    /// Sum of deaths across all levels
    pub fn total_deaths(&self) -> f64 {
        self.level_deaths.as_array().iter().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_payload_fills_defaults() {
        let json = r#"{"crates_opened": 3, "level_deaths": {"level_2": 4, "level_16": 1}}"#;
        let stats: Stats = serde_json::from_str(json).unwrap();

        assert_eq!(stats.crates_opened, 3.0);
        assert_eq!(stats.chests_opened, 0.0);
        assert_eq!(stats.level_deaths.level_2, 4.0);
        assert_eq!(stats.total_deaths(), 5.0);
        assert_eq!(stats.enemy_kills, EnemyKills::default());
    }

    #[test]
    fn test_default_is_all_zero() {
        let stats = Stats::default();
        assert_eq!(stats.total_deaths(), 0.0);
        assert_eq!(stats.misc_deaths.lava, 0.0);
    }
}
