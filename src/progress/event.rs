//! Event schema for progress observability.

use crate::batch::{BatchJob, BatchOutcome};
use crate::error::ErrorKind;
use crate::job::ModelResult;
use crate::provider::ProviderId;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressEvent {
    Status {
        provider: ProviderId,
        message: String,
        percent: u8,
    },
    Succeeded {
        provider: ProviderId,
        prompt: String,
        result: ModelResult,
        elapsed_ms: u64,
    },
    Failed {
        #[serde(skip_serializing_if = "Option::is_none")]
        provider: Option<ProviderId>,
        prompt: String,
        kind: ErrorKind,
        message: String,
        elapsed_ms: u64,
    },
    BatchJobUpdated {
        job: BatchJob,
    },
    BatchFinished {
        outcome: BatchOutcome,
    },
}

impl ProgressEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ProgressEvent::Succeeded { .. } | ProgressEvent::Failed { .. }
        )
    }
}

/// A progress event stamped with emission time and a per-channel sequence number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEnvelope {
    pub ts: u64,
    pub seq: u64,
    #[serde(flatten)]
    pub event: ProgressEvent,
}

impl ProgressEnvelope {
    pub fn with_now(seq: u64, event: ProgressEvent) -> Self {
        Self {
            ts: now_millis(),
            seq,
            event,
        }
    }
}

pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
