//! promptlift - turn short coding instructions into detailed, project-aware prompts
//!
//! promptlift inspects a project (tech stack, layout, recent history), renders
//! that context ahead of a short user instruction and asks an LLM provider to
//! expand it into a prompt an AI coding assistant can act on.
//!
//! # Quick Start
//!
//! ```toml
//! [dependencies]
//! promptlift = "0.1"
//! tokio = { version = "1", features = ["rt-multi-thread", "macros"] }
//! ```
//!
//! ```rust,no_run
//! use promptlift::{Config, ConfigOverrides, EnhancementOrchestrator, EnhancementRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let config = Config::discover(&ConfigOverrides::default())?;
//!     promptlift::init_tracing(config.verbose())?;
//!
//!     let orchestrator = EnhancementOrchestrator::from_config(&config)?;
//!     let result = orchestrator
//!         .enhance(EnhancementRequest::new("fix the flaky login test").project_path("."))
//!         .await?;
//!
//!     if let Some(prompt) = result.enhanced {
//!         println!("{prompt}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Stable Public API
//!
//! - [`EnhancementOrchestrator`] with [`EnhancementRequest`] and [`EnhancementResult`]
//! - [`CancelHandle`], [`ProgressSink`] and [`ProgressUpdate`] for call control
//! - [`Config`], [`ConfigBuilder`] and [`ConfigOverrides`]
//! - [`PromptliftError`] and [`InputValidationError`]
//!
//! Component crates are re-exported under [`analyzers`], [`context`],
//! [`llm`] and [`config`] for extension points such as custom analyzers or
//! enhancement clients.

// ============================================================================
// Stable Public API
// ============================================================================

/// Entry point: context lookup, outbound prompt and one provider call.
///
/// Each orchestrator owns its project context cache; see
/// [`EnhancementOrchestrator::clear_cache`].
pub use promptlift_orchestrator::EnhancementOrchestrator;

pub use promptlift_orchestrator::{
    CancelHandle, EnhancementOutcome, EnhancementRequest, EnhancementResult, EnhancementState,
    ProgressSink, ProgressUpdate,
};

/// Layered configuration: overrides > `PROMPTLIFT_*` environment > TOML file > defaults.
///
/// Use [`Config::discover()`] for file and environment lookup or
/// [`Config::builder()`] for deterministic programmatic configuration.
pub use promptlift_config::Config;

/// Programmatic configuration without environment or file lookups.
///
/// ```rust
/// use promptlift::Config;
/// use std::time::Duration;
///
/// let config = Config::builder()
///     .timeout(Duration::from_secs(30))
///     .provider("openrouter")
///     .max_context_bytes(8 * 1024)
///     .build()
///     .expect("valid configuration");
/// assert_eq!(config.timeout_secs(), 30.0);
/// ```
pub use promptlift_config::ConfigBuilder;

pub use promptlift_config::ConfigOverrides;

pub use promptlift_utils::error::{
    ErrorCategory, InputValidationError, PromptliftError, UserFriendlyError,
};

/// Install the default `tracing` subscriber (`RUST_LOG` overrides the filter).
pub use promptlift_utils::logging::init_tracing;

// ============================================================================
// Component crates - accessible but not stable
// ============================================================================

#[doc(hidden)]
pub use promptlift_analyzers as analyzers;

#[doc(hidden)]
pub use promptlift_config as config;

#[doc(hidden)]
pub use promptlift_context as context;

#[doc(hidden)]
pub use promptlift_llm as llm;

#[doc(hidden)]
pub use promptlift_utils::{error, logging, paths};

#[cfg(any(test, feature = "test-utils"))]
#[doc(hidden)]
pub use promptlift_utils::test_support;
