use crate::ModelResult;
use async_trait::async_trait;
use dospanes_types::InstanceId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// What `save()` hands to the persistence seam.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistRequest {
    pub model_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_path: Option<String>,
    pub instance_id: InstanceId,
    pub attributes: Map<String, Value>,
}

/// The transport behind `ModelInstance::save`.
///
/// Return `Err` to leave the instance dirty and fail the save.
#[async_trait]
pub trait Persistence: Send + Sync {
    async fn persist(&self, request: PersistRequest) -> ModelResult<()>;
}

/// Accepts every save without writing anywhere.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopPersistence;

#[async_trait]
impl Persistence for NoopPersistence {
    async fn persist(&self, _request: PersistRequest) -> ModelResult<()> {
        Ok(())
    }
}
