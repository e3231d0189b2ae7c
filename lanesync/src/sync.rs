use std::sync::Arc;
use shared::types::NodeDescriptor;
use crate::load::LoadOrchestrator;
use crate::outcome::Outcome;
use crate::save::SaveOrchestrator;
use crate::state_manager::DashboardState;
use crate::transport::Transport;

/// Outcomes of a save-and-load run; each half reports on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveAndLoad {
    pub save: Outcome,
    pub load: Outcome,
}

/// Both orchestrators over one transport.
pub struct ConfigSync<T: ?Sized> {
    pub saver: SaveOrchestrator<T>,
    pub loader: LoadOrchestrator<T>,
}

impl<T: Transport + ?Sized> ConfigSync<T> {
    pub fn new(transport: Arc<T>) -> Self {
        Self {
            saver: SaveOrchestrator::new(transport.clone()),
            loader: LoadOrchestrator::new(transport),
        }
    }

    pub async fn save<S: DashboardState + ?Sized>(&self, state: &S) -> Outcome {
        self.saver.save(state).await
    }

    pub async fn load<S: DashboardState + ?Sized>(&self, target: &NodeDescriptor, state: &S) -> Outcome {
        self.loader.load(target, state).await
    }

    /// Save, then load from `target` whatever the save outcome was, so the
    /// dashboard ends up showing what the node holds.
    pub async fn save_and_load<S: DashboardState + ?Sized>(
        &self,
        target: &NodeDescriptor,
        state: &S,
    ) -> SaveAndLoad {
        let save = self.save(state).await;
        match save.failure() {
            Some(reason) if reason.is_expected() => {
                tracing::info!("Nothing saved ({}), loading anyway", reason)
            }
            Some(reason) => tracing::warn!("Save failed ({}), loading anyway", reason),
            None => {}
        }
        let load = self.load(target, state).await;
        SaveAndLoad { save, load }
    }
}
