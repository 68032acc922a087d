use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::slot::Slot;

/// One saved performer in the venue's directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    pub id: String,
    pub name: String,
}

/// Read/write boundary to wherever the venue keeps its performer directory.
pub trait DirectoryClient {
    fn list_entries(
        &self,
        owner_id: &str,
    ) -> impl Future<Output = anyhow::Result<Vec<DirectoryEntry>>> + Send;

    /// Adds a name and returns the new entry's id.
    fn add_entry(
        &self,
        owner_id: &str,
        name: &str,
    ) -> impl Future<Output = anyhow::Result<String>> + Send;
}

/// Saves a slot's typed-in performer to the directory and marks the slot as
/// holding a directory entry. A blank name or one already saved is a no-op.
pub async fn save_performer<C>(
    client: &C,
    owner_id: &str,
    slot: &mut Slot,
) -> anyhow::Result<Option<String>>
where
    C: DirectoryClient,
{
    let name = slot.performer_name.trim();
    if name.is_empty() || slot.performer_from_directory {
        return Ok(None);
    }
    let id = client.add_entry(owner_id, name).await?;
    slot.performer_from_directory = true;
    Ok(Some(id))
}
