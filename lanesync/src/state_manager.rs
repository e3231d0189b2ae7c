use std::thread;
use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot, watch};
use anyhow::Result;
use shared::types::NodeDescriptor;
use crate::state::{db::StateDb, hash};

/// Read/write access to the dashboard's active user and node list.
///
/// Handed to the save and load orchestrators explicitly. Writes are
/// side-effect only; implementations report their own failures.
#[async_trait]
pub trait DashboardState: Send + Sync {
    async fn current_user(&self) -> Option<String>;

    async fn nodes(&self) -> Vec<NodeDescriptor>;

    /// Node configuration is saved to: the one flagged default, else the first.
    async fn default_node(&self) -> Option<NodeDescriptor> {
        let nodes = self.nodes().await;
        nodes
            .iter()
            .find(|node| node.is_default)
            .or_else(|| nodes.first())
            .cloned()
    }

    async fn set_current_user(&self, user: String);

    /// Replace the whole node list.
    async fn set_nodes(&self, nodes: Vec<NodeDescriptor>);
}

/// Commands sent to the state thread
pub enum StateCommand {
    SetNodes(Vec<NodeDescriptor>, oneshot::Sender<Result<bool>>),
    SetCurrentUser(String, oneshot::Sender<Result<bool>>),
    GetNodes(oneshot::Sender<Result<Vec<NodeDescriptor>>>),
    GetCurrentUser(oneshot::Sender<Result<Option<String>>>),
    Shutdown,
}

/// Handle to the state database thread
#[derive(Clone)]
pub struct StateHandle {
    tx: mpsc::Sender<StateCommand>,
}

impl StateHandle {
    /// Spawn a new state thread with the given database.
    /// The fingerprint is republished after every write that changed data.
    pub fn spawn(mut db: StateDb, fingerprint_tx: watch::Sender<String>) -> Self {
        let (tx, mut rx) = mpsc::channel::<StateCommand>(64);

        let republish = |db: &StateDb, fingerprint_tx: &watch::Sender<String>| {
            match (db.get_current_user(), db.get_nodes()) {
                (Ok(user), Ok(nodes)) => {
                    let _ = fingerprint_tx.send(hash::compute_fingerprint(user.as_deref(), &nodes));
                }
                (Err(e), _) | (_, Err(e)) => {
                    tracing::error!("Failed to fingerprint state: {}", e);
                }
            }
        };

        thread::spawn(move || {
            while let Some(cmd) = rx.blocking_recv() {
                match cmd {
                    StateCommand::SetNodes(nodes, reply) => {
                        let result = db.replace_nodes(&nodes);
                        if matches!(&result, Ok(true)) {
                            republish(&db, &fingerprint_tx);
                        }
                        let _ = reply.send(result);
                    }
                    StateCommand::SetCurrentUser(user, reply) => {
                        let result = db.set_current_user(&user);
                        if matches!(&result, Ok(true)) {
                            republish(&db, &fingerprint_tx);
                        }
                        let _ = reply.send(result);
                    }
                    StateCommand::GetNodes(reply) => {
                        let _ = reply.send(db.get_nodes());
                    }
                    StateCommand::GetCurrentUser(reply) => {
                        let _ = reply.send(db.get_current_user());
                    }
                    StateCommand::Shutdown => {
                        tracing::info!("State thread shutting down");
                        break;
                    }
                }
            }
        });

        Self { tx }
    }

    /// Open the database at `path`, compute the initial fingerprint and spawn
    /// the state thread.
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<(Self, watch::Receiver<String>)> {
        let db = StateDb::open(path)?;
        let initial = hash::compute_fingerprint(db.get_current_user()?.as_deref(), &db.get_nodes()?);
        let (fingerprint_tx, fingerprint_rx) = watch::channel(initial);
        Ok((Self::spawn(db, fingerprint_tx), fingerprint_rx))
    }

    /// Replace the node list. Returns true if data changed.
    pub async fn replace_nodes(&self, nodes: Vec<NodeDescriptor>) -> Result<bool> {
        let (reply, rx) = oneshot::channel();
        self.tx.send(StateCommand::SetNodes(nodes, reply)).await?;
        rx.await?
    }

    /// Record the active user. Returns true if data changed.
    pub async fn store_current_user(&self, user: String) -> Result<bool> {
        let (reply, rx) = oneshot::channel();
        self.tx.send(StateCommand::SetCurrentUser(user, reply)).await?;
        rx.await?
    }

    pub async fn load_nodes(&self) -> Result<Vec<NodeDescriptor>> {
        let (reply, rx) = oneshot::channel();
        self.tx.send(StateCommand::GetNodes(reply)).await?;
        rx.await?
    }

    pub async fn load_current_user(&self) -> Result<Option<String>> {
        let (reply, rx) = oneshot::channel();
        self.tx.send(StateCommand::GetCurrentUser(reply)).await?;
        rx.await?
    }

    /// Shutdown the state thread
    pub async fn shutdown(&self) -> Result<()> {
        self.tx.send(StateCommand::Shutdown).await?;
        Ok(())
    }
}

#[async_trait]
impl DashboardState for StateHandle {
    async fn current_user(&self) -> Option<String> {
        self.load_current_user().await.unwrap_or_else(|e| {
            tracing::error!("Failed to read current user: {}", e);
            None
        })
    }

    async fn nodes(&self) -> Vec<NodeDescriptor> {
        self.load_nodes().await.unwrap_or_else(|e| {
            tracing::error!("Failed to read nodes: {}", e);
            Vec::new()
        })
    }

    async fn set_current_user(&self, user: String) {
        if let Err(e) = self.store_current_user(user).await {
            tracing::error!("Failed to store current user: {}", e);
        }
    }

    async fn set_nodes(&self, nodes: Vec<NodeDescriptor>) {
        let count = nodes.len();
        match self.replace_nodes(nodes).await {
            Ok(true) => tracing::info!("Stored {} nodes", count),
            Ok(false) => tracing::debug!("Node list unchanged"),
            Err(e) => tracing::error!("Failed to store nodes: {}", e),
        }
    }
}
