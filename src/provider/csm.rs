//! CSM placeholder: no working backend yet, both calls fail immediately.

use super::{ProviderClient, ProviderId};
use crate::error::ForgeError;
use crate::job::{GenerationRequest, JobHandle, JobStatus};
use async_trait::async_trait;

#[derive(Debug, Default)]
pub struct CsmClient;

impl CsmClient {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProviderClient for CsmClient {
    fn id(&self) -> ProviderId {
        ProviderId::Csm
    }

    async fn submit(
        &self,
        _request: &GenerationRequest,
        _api_key: &str,
    ) -> Result<JobHandle, ForgeError> {
        Err(ForgeError::NotImplemented {
            provider: self.id(),
        })
    }

    async fn poll(&self, _handle: &JobHandle, _api_key: &str) -> Result<JobStatus, ForgeError> {
        Err(ForgeError::NotImplemented {
            provider: self.id(),
        })
    }
}
