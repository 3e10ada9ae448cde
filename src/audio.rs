//! Audio session collaborator.

/// Process-wide audio session, driven by the coordinator.
///
/// Calls are side-effecting and may be repeated; nothing is returned.
pub trait AudioController: Send + Sync {
    fn configure_audio_session(&self);
    fn start_audio(&self);
    fn stop_audio(&self);
}
