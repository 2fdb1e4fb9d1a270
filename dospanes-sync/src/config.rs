use serde::{Deserialize, Serialize};

/// Configuration for merging incoming batches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// How an item finds the instance it applies to.
    #[serde(default)]
    pub identity: Identity,
    /// How an item's attributes are written.
    #[serde(default)]
    pub merge_strategy: MergeStrategy,
    /// What a bad item does to the rest of its batch.
    #[serde(default)]
    pub item_errors: ItemErrorPolicy,
}

/// How a change item is matched to a stored instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Identity {
    /// Match `ChangeItem::id` against the instance id.
    #[default]
    InstanceId,
    /// Match the item's value for this stored attribute against the
    /// instance's value. The first instance in store order wins.
    Attribute(String),
}

/// How a matched instance is updated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeStrategy {
    /// Write only the attributes present in the item.
    #[default]
    Patch,
    /// Write the item's attributes and reset every other stored attribute
    /// to its default.
    Replace,
}

/// What happens when an item cannot be merged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemErrorPolicy {
    /// Log the item and carry on with the rest of the batch.
    #[default]
    Skip,
    /// Reject the whole batch. Nothing is written.
    FailBatch,
}
