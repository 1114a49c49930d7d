//! Error handling tests for input and checkpoint problems.

use engine_core::Error;
use integration_tests::{fixtures, mocks::ScriptedFetcher, setup::TestContext};
use serde_json::json;

/// A missing input file aborts the run before anything is written.
#[tokio::test]
async fn test_missing_input_is_fatal() {
    let ctx = TestContext::new();
    let fetcher = ScriptedFetcher::new();

    let err = ctx.engine(&fetcher).run().await.unwrap_err();

    assert!(matches!(err, Error::InputMissing { .. }), "got {err}");
    assert!(err.is_input_error());
    assert!(!ctx.output_exists());
    assert_eq!(fetcher.total_calls(), 0);
}

/// Corrupt input aborts the run and leaves an existing checkpoint untouched.
#[tokio::test]
async fn test_corrupt_input_leaves_checkpoint_untouched() {
    let ctx = TestContext::new();
    std::fs::write(&ctx.input_path, "[{\"url\": \"a\"").unwrap();
    ctx.write_checkpoint(&[fixtures::enriched("a")]);
    let before = ctx.output_raw();
    let fetcher = ScriptedFetcher::new();

    let err = ctx.engine(&fetcher).run().await.unwrap_err();

    assert!(matches!(err, Error::InputInvalid { .. }), "got {err}");
    assert_eq!(ctx.output_raw(), before);
}

/// Input that is not a list of objects is rejected.
#[tokio::test]
async fn test_non_list_input_rejected() {
    let ctx = TestContext::new();
    std::fs::write(&ctx.input_path, r#"{"url": "a"}"#).unwrap();
    let fetcher = ScriptedFetcher::new();

    let err = ctx.engine(&fetcher).run().await.unwrap_err();

    assert!(matches!(err, Error::InputInvalid { .. }), "got {err}");
}

/// A malformed checkpoint is ignored and every product is fetched again.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_corrupt_checkpoint_refetches_everything() {
    let ctx = TestContext::new();
    ctx.write_input(&fixtures::products(5));
    ctx.write_output_raw("[{\"url\": \"p0\", \"nutrition\": {");
    let fetcher = ScriptedFetcher::new();

    let summary = ctx.engine(&fetcher).run().await.expect("Run failed");

    assert_eq!(summary.already_done, 0);
    assert_eq!(fetcher.total_calls(), 5);
    assert_eq!(ctx.read_output().len(), 5);
}

/// A checkpoint whose top level is not a list counts as empty.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_non_list_checkpoint_treated_as_empty() {
    let ctx = TestContext::new();
    ctx.write_input(&[fixtures::product("a")]);
    ctx.write_output_raw(&json!({"url": "a"}).to_string());
    let fetcher = ScriptedFetcher::new();

    ctx.engine(&fetcher).run().await.expect("Run failed");

    assert_eq!(fetcher.calls("a"), 1);
    assert_eq!(ctx.read_output(), vec![fixtures::enriched("a")]);
}

/// A final write that cannot complete is reported as an output error.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_unwritable_output_is_reported() {
    let ctx = TestContext::new();
    ctx.write_input(&[fixtures::product("a")]);
    // A directory where the output file should be makes every rename fail.
    std::fs::create_dir(&ctx.output_path).unwrap();
    let fetcher = ScriptedFetcher::new();

    let err = ctx.engine(&fetcher).run().await.unwrap_err();

    assert!(matches!(err, Error::OutputWrite { .. }), "got {err}");
    assert!(ctx.output_path.is_dir());
}

/// Zero workers is a configuration error.
#[test]
fn test_zero_workers_rejected() {
    let ctx = TestContext::new();
    let mut config = ctx.worker_config();
    config.num_workers = 0;

    let result = ctx.engine_with(config, &ScriptedFetcher::new());

    assert!(matches!(result, Err(Error::Configuration(_))));
}
