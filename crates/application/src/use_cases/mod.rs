pub mod control;

pub use control::{HandleControlEventUseCase, RestoreProxyStateUseCase};
