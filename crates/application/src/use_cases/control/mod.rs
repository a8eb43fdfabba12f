mod handle_control_event;
mod restore_proxy_state;

pub use handle_control_event::HandleControlEventUseCase;
pub use restore_proxy_state::RestoreProxyStateUseCase;
