use serde::{Deserialize, Serialize};

use crate::wire::CombatantRecord;

/// One row of the damage table for the current encounter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatantStanding {
    pub id: i32,
    pub name: String,
    pub world: String,
    pub job: String,
    pub damage: i32,
    pub damage_taken: i32,
    pub damage_healed: i32,
    pub deaths: i32,
    pub hits: i32,
    pub heals: i32,
    pub kills: i32,
}

impl CombatantStanding {
    pub fn from_record(record: &CombatantRecord) -> Self {
        Self {
            id: record.id,
            name: record.name.clone(),
            world: record.world.clone(),
            job: record.job.clone(),
            damage: record.damage,
            damage_taken: record.damage_taken,
            damage_healed: record.damage_healed,
            deaths: record.deaths,
            hits: record.hits,
            heals: record.heals,
            kills: record.kills,
        }
    }
}
