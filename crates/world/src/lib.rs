mod estimator;
mod inventory;
mod loot;
mod salvage;
mod snapshot;

pub use estimator::*;
pub use inventory::*;
pub use loot::*;
pub use salvage::*;
pub use snapshot::*;
