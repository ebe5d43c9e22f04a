//! Enhancement orchestration for promptlift
//!
//! [`EnhancementOrchestrator`] performs a cache-aware project context lookup,
//! renders the outbound prompt and drives a single [`EnhancementClient`] call
//! under a progress, cancellation and timeout contract.
//!
//! # Example
//!
//! ```rust,no_run
//! use promptlift_orchestrator::{CancelHandle, EnhancementOrchestrator, EnhancementRequest};
//! use promptlift_config::{Config, ConfigOverrides};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::discover(&ConfigOverrides::default())?;
//! let orchestrator = EnhancementOrchestrator::from_config(&config)?;
//!
//! let cancel = CancelHandle::new();
//! let result = orchestrator
//!     .enhance(
//!         EnhancementRequest::new("add retries to the upload client")
//!             .project_path(".")
//!             .cancel_handle(cancel.clone()),
//!     )
//!     .await?;
//!
//! match result.enhanced {
//!     Some(prompt) => println!("{prompt}"),
//!     None => eprintln!("{:?}: {:?}", result.outcome, result.error_message),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! [`EnhancementClient`]: promptlift_llm::EnhancementClient

mod cancel;
mod orchestrator;
mod progress;
mod prompt;
mod request;
mod result;
mod state;

pub use cancel::CancelHandle;
pub use orchestrator::EnhancementOrchestrator;
pub use progress::{ProgressSink, ProgressUpdate};
pub use prompt::{ENHANCEMENT_SYSTEM_PROMPT, render_outbound_prompt};
pub use request::EnhancementRequest;
pub use result::{EnhancementOutcome, EnhancementResult};
pub use state::{EnhancementState, InvalidTransition};
