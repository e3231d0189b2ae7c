use std::sync::Mutex;
use async_trait::async_trait;
use shared::types::NodeDescriptor;
use crate::state_manager::DashboardState;

/// In-memory state container that counts writes.
#[derive(Default)]
pub struct MemoryState {
    user: Mutex<Option<String>>,
    nodes: Mutex<Vec<NodeDescriptor>>,
    pub writes: Mutex<usize>,
}

impl MemoryState {
    pub fn new(user: Option<&str>, nodes: Vec<NodeDescriptor>) -> Self {
        Self {
            user: Mutex::new(user.map(str::to_string)),
            nodes: Mutex::new(nodes),
            writes: Mutex::new(0),
        }
    }

    pub fn write_count(&self) -> usize {
        *self.writes.lock().unwrap()
    }

    pub fn snapshot(&self) -> (Option<String>, Vec<NodeDescriptor>) {
        (self.user.lock().unwrap().clone(), self.nodes.lock().unwrap().clone())
    }
}

#[async_trait]
impl DashboardState for MemoryState {
    async fn current_user(&self) -> Option<String> {
        self.user.lock().unwrap().clone()
    }

    async fn nodes(&self) -> Vec<NodeDescriptor> {
        self.nodes.lock().unwrap().clone()
    }

    async fn set_current_user(&self, user: String) {
        *self.writes.lock().unwrap() += 1;
        *self.user.lock().unwrap() = Some(user);
    }

    async fn set_nodes(&self, nodes: Vec<NodeDescriptor>) {
        *self.writes.lock().unwrap() += 1;
        *self.nodes.lock().unwrap() = nodes;
    }
}
