/// Self-update checker, told only whether it may run automatically.
pub trait UpdaterPort: Send + Sync {
    fn set_auto_run(&self, enabled: bool);
}
