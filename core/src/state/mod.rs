pub mod cache;
pub mod info;
pub mod ipc;

pub use cache::{CacheUpdate, EncounterCache};
pub use info::CombatantStanding;
pub use ipc::{DecodeWorkerOutput, WorkerEncounterInfo};
