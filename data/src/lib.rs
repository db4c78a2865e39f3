//! Table-side data and rules for TableKit: generators, dice, encounters,
//! the monster vault and the map measurer. Nothing here knows about the UI.

pub mod dice;
pub mod encounter;
pub mod generator;
pub mod map;
pub mod monster;
mod schema;
pub mod store;
pub mod token;

pub use dice::{DiceError, History, ModeRoll, Roll, RollMode};
pub use encounter::{Combatant, Encounter, Party, Role};
pub use generator::{Generator, GeneratorKind, GeneratorStore, ImportError, ImportMode};
pub use map::{CalibrationError, MapState, Point, Unit};
pub use monster::{Monster, MonsterDetails, Vault, VaultState};
pub use store::{Store, keys};
