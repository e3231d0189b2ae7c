use serde::Serialize;
use sha2::{Sha256, Digest};
use shared::types::NodeDescriptor;

#[derive(Serialize)]
struct FingerprintView<'a> {
    user: Option<&'a str>,
    nodes: &'a [NodeDescriptor],
}

/// Computes a SHA-256 fingerprint of the dashboard state.
/// Node order is significant: reordering the list is a change.
pub fn compute_fingerprint(user: Option<&str>, nodes: &[NodeDescriptor]) -> String {
    let view = FingerprintView { user, nodes };

    let json = serde_json::to_vec(&view)
        .expect("Failed to serialize dashboard state for hashing");

    let hash = Sha256::digest(&json);
    hex::encode(hash)
}
