//! Public API surface tests
//!
//! Everything here goes through `promptlift::*` only, the way an embedding
//! application (CLI, editor plugin) would use the crate.

use promptlift::config::AnthropicConfig;
use promptlift::{
    CancelHandle, Config, ConfigOverrides, EnhancementOrchestrator, EnhancementOutcome,
    EnhancementRequest, EnhancementResult, EnhancementState, ErrorCategory, InputValidationError,
    ProgressSink, ProgressUpdate, PromptliftError, UserFriendlyError,
};
use promptlift_utils::test_support::{EnvGuard, ProjectFixture};
use serial_test::serial;
use std::sync::Arc;

const TEST_KEY_ENV: &str = "PROMPTLIFT_TEST_PUBLIC_API_KEY";

fn anthropic_config(timeout_secs: u64) -> Config {
    Config::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .anthropic(AnthropicConfig {
            api_key_env: Some(TEST_KEY_ENV.to_string()),
            ..AnthropicConfig::default()
        })
        .build()
        .unwrap()
}

#[test]
fn public_types_are_reachable_from_the_root() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<EnhancementOrchestrator>();
    assert_send_sync::<EnhancementRequest>();
    assert_send_sync::<EnhancementResult>();
    assert_send_sync::<CancelHandle>();

    let sink: Arc<dyn ProgressSink> = Arc::new(|_: &ProgressUpdate| {});
    let request = EnhancementRequest::new("fix bug")
        .timeout_secs(2.5)
        .progress_sink(sink)
        .cancel_handle(CancelHandle::new());

    assert_eq!(request.prompt(), "fix bug");
    assert_eq!(request.timeout_secs_value(), 2.5);
    assert_eq!(EnhancementOutcome::TimedOut.state(), EnhancementState::TimedOut);
}

#[test]
#[serial]
fn from_config_without_api_key_is_an_llm_error() {
    let _key = EnvGuard::remove(TEST_KEY_ENV);

    let err = EnhancementOrchestrator::from_config(&anthropic_config(30)).unwrap_err();

    assert!(matches!(err, PromptliftError::Llm(_)), "got {err:?}");
    assert_eq!(err.category(), ErrorCategory::Configuration);
    assert!(err.user_message().contains(TEST_KEY_ENV));
}

#[test]
#[serial]
fn from_config_carries_provider_and_timeout() {
    let _key = EnvGuard::set(TEST_KEY_ENV, "sk-test");

    let orchestrator = EnhancementOrchestrator::from_config(&anthropic_config(45)).unwrap();

    assert_eq!(orchestrator.provider_name(), "anthropic");
    assert_eq!(orchestrator.default_timeout_secs(), 45.0);
}

#[test]
#[serial]
fn discovery_layers_file_env_and_overrides() {
    let project = ProjectFixture::new();
    project.write(
        ".promptlift/config.toml",
        "[defaults]\ntimeout_secs = 90\nmodel = \"file-model\"\n\n[context]\nmax_context_bytes = 4096\n",
    );
    let _home = EnvGuard::remove("PROMPTLIFT_HOME");
    let _provider = EnvGuard::remove("PROMPTLIFT_LLM_PROVIDER");
    let _model = EnvGuard::remove("PROMPTLIFT_MODEL");
    let _timeout = EnvGuard::set("PROMPTLIFT_TIMEOUT_SECS", "12.5");

    let from_file_and_env = Config::discover_from(project.path(), &ConfigOverrides::default())
        .unwrap();
    assert_eq!(from_file_and_env.timeout_secs(), 12.5);
    assert_eq!(from_file_and_env.max_context_bytes(), 4096);
    assert_eq!(from_file_and_env.defaults.model.as_deref(), Some("file-model"));

    let overrides = ConfigOverrides {
        timeout_secs: Some(3.0),
        max_context_bytes: Some(1024),
        ..ConfigOverrides::default()
    };
    let overridden = Config::discover_from(project.path(), &overrides).unwrap();
    assert_eq!(overridden.timeout_secs(), 3.0);
    assert_eq!(overridden.max_context_bytes(), 1024);
}

#[tokio::test]
async fn input_validation_errors_convert_into_promptlift_error() {
    let orchestrator = EnhancementOrchestrator::new(Arc::new(
        promptlift_llm::testing::ScriptedClient::echoing(),
    ));

    let err: PromptliftError = orchestrator
        .enhance(EnhancementRequest::new("   "))
        .await
        .unwrap_err()
        .into();

    assert!(matches!(
        err,
        PromptliftError::InputValidation(InputValidationError::EmptyPrompt)
    ));
    assert_eq!(err.category(), ErrorCategory::Validation);
    assert!(!err.suggestions().is_empty());
}
