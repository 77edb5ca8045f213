pub use astroturf_core::{BehaviorLogic, Simulation};
pub mod config {
    pub use astroturf_core::config::*;
}
pub mod detection {
    pub use astroturf_core::detection::*;
}
pub mod error {
    pub use astroturf_core::error::*;
}
pub mod scheduler {
    pub use astroturf_core::scheduler::*;
}
pub mod snapshot {
    pub use astroturf_core::snapshot::*;
}
pub mod spatial_hash {
    pub use astroturf_core::spatial_hash::*;
}
pub mod world {
    pub use astroturf_core::world::*;
}
pub mod state {
    pub use astroturf_data::*;
}
