//! Meshforge: Text-to-3D Generation Orchestration
//!
//! Submits text prompts to remote text-to-3D services (Meshy, Tripo, CSM), polls each job
//! to completion under a bounded wait, normalizes provider responses into one result shape,
//! and sequences multi-prompt batches under a cancellable, rate-limited run loop.

pub mod batch;
pub mod cli;
pub mod config;
pub mod credentials;
pub mod download;
pub mod enhance;
pub mod error;
pub mod history;
pub mod job;
pub mod logging;
pub mod orchestrator;
pub mod poller;
pub mod progress;
pub mod provider;

pub use batch::{BatchJob, BatchJobStatus, BatchOutcome, BatchRunner, PromptGenerator};
pub use credentials::Credentials;
pub use error::{ErrorKind, ForgeError};
pub use job::{GenerationRequest, JobHandle, JobStatus, ModelFormat, ModelResult};
pub use orchestrator::GenerationOrchestrator;
pub use provider::{PollSchedule, ProviderClient, ProviderId, ProviderRegistry};
