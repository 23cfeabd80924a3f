pub mod outcome;
pub mod target;

pub use outcome::{
    BootstrapOutcome, ReadinessState, SeedAccount, SeedResult, Stage, StageStatus,
};
pub use target::{ConnectionTarget, ServiceTarget, StoreKind};
