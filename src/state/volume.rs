// src/state/volume.rs
use std::sync::Arc;
use tokio::sync::watch;

const VOLUME_STEP: u8 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VolumeState {
    pub current: u8,
    pub max: u8,
}

impl Default for VolumeState {
    fn default() -> Self {
        Self { current: 50, max: 100 }
    }
}

/// State holder for the volume screen: one locally owned signal, no
/// collaborator traffic.
pub struct VolumeViewModel {
    volume: Arc<watch::Sender<VolumeState>>,
}

impl VolumeViewModel {
    pub fn new() -> Self {
        let (volume, _) = watch::channel(VolumeState::default());
        Self { volume: Arc::new(volume) }
    }

    pub fn subscribe(&self) -> watch::Receiver<VolumeState> {
        self.volume.subscribe()
    }

    pub fn on_volume_up(&self) {
        self.volume.send_if_modified(|state| {
            let next = state.current.saturating_add(VOLUME_STEP).min(state.max);
            let changed = next != state.current;
            state.current = next;
            changed
        });
    }

    pub fn on_volume_down(&self) {
        self.volume.send_if_modified(|state| {
            let next = state.current.saturating_sub(VOLUME_STEP);
            let changed = next != state.current;
            state.current = next;
            changed
        });
    }
}

impl Default for VolumeViewModel {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_volume_steps_clamp_at_bounds() {
        let view_model = VolumeViewModel::new();
        let state_rx = view_model.subscribe();

        for _ in 0..30 {
            view_model.on_volume_up();
        }
        assert_eq!(state_rx.borrow().current, 100);

        for _ in 0..30 {
            view_model.on_volume_down();
        }
        assert_eq!(state_rx.borrow().current, 0);
    }
}
