//! Resume and interruption tests.
//!
//! The output file doubles as the checkpoint, so a second run against the
//! same paths must pick up exactly where the first one stopped.

use integration_tests::{
    fixtures,
    mocks::{ScriptedFetcher, Step},
    setup::TestContext,
};
use serde_json::json;
use std::time::Duration;

/// A completed run followed by a second run fetches nothing and rewrites the same output.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_resume_after_completion_is_idempotent() {
    let ctx = TestContext::new();
    ctx.write_input(&fixtures::products(30));

    let first = ScriptedFetcher::new();
    ctx.engine(&first).run().await.expect("First run failed");
    let first_output = ctx.output_raw();
    assert_eq!(first.total_calls(), 30);

    let second = ScriptedFetcher::new();
    let summary = ctx.engine(&second).run().await.expect("Second run failed");

    assert_eq!(second.total_calls(), 0, "Resumed run should not fetch");
    assert_eq!(summary.already_done, 30);
    assert_eq!(summary.enqueued, 0);
    assert_eq!(ctx.output_raw(), first_output);
}

/// Interrupting a run checkpoints finished products; the next run fetches the rest.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_interrupted_run_resumes() {
    let ctx = TestContext::new();
    ctx.write_input(&[
        fixtures::product("a"),
        fixtures::product("b"),
        fixtures::product("c"),
    ]);
    let mut config = ctx.worker_config();
    config.num_workers = 3;
    // Only the shutdown save should write.
    config.checkpoint_interval_ms = 60_000;

    let fetcher = ScriptedFetcher::new().hang("c");
    let watcher = fetcher.clone();
    let shutdown = async move {
        while watcher.completed() < 2 || watcher.calls("c") == 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    };

    let summary = ctx
        .engine_with(config.clone(), &fetcher)
        .expect("Invalid config")
        .run_until(shutdown)
        .await
        .expect("Interrupted run failed");

    assert!(summary.interrupted);
    assert!(!summary.output_written);
    let checkpoint = ctx.read_output();
    let mut saved = fixtures::urls(&checkpoint);
    saved.sort();
    assert_eq!(saved, vec!["a", "b"], "In-flight product must not be checkpointed");

    let resumed = ScriptedFetcher::new();
    let summary = ctx
        .engine_with(config, &resumed)
        .expect("Invalid config")
        .run()
        .await
        .expect("Resumed run failed");

    assert_eq!(resumed.calls("a"), 0);
    assert_eq!(resumed.calls("b"), 0);
    assert_eq!(resumed.calls("c"), 1);
    assert_eq!(summary.already_done, 2);
    assert_eq!(
        ctx.read_output(),
        vec![
            fixtures::enriched("a"),
            fixtures::enriched("b"),
            fixtures::enriched("c"),
        ]
    );
}

/// Interrupting before anything completes leaves no output file behind.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_interrupt_with_nothing_done_writes_nothing() {
    let ctx = TestContext::new();
    ctx.write_input(&[fixtures::product("a")]);
    let fetcher = ScriptedFetcher::new().hang("a");
    let watcher = fetcher.clone();

    let summary = ctx
        .engine(&fetcher)
        .run_until(async move {
            while watcher.calls("a") == 0 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("Interrupted run failed");

    assert!(summary.interrupted);
    assert!(!ctx.output_exists());
}

/// Stale checkpoint entries for products no longer in the input are not emitted.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_stale_checkpoint_entries_ignored() {
    let ctx = TestContext::new();
    ctx.write_input(&[fixtures::product("a")]);
    ctx.write_checkpoint(&[fixtures::enriched("gone"), fixtures::enriched("a")]);
    let fetcher = ScriptedFetcher::new();

    ctx.engine(&fetcher).run().await.expect("Run failed");

    assert_eq!(fetcher.total_calls(), 0);
    assert_eq!(ctx.read_output(), vec![fixtures::enriched("a")]);
}

/// Fetched data naming a canonical product URL must not re-key the result.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_fetched_product_url_does_not_break_resume() {
    let ctx = TestContext::new();
    ctx.write_input(&[json!({"url": "a"})]);
    let canonical = fixtures::payload_for("a").with_extra("product_url", "https://canonical/a");
    let first = ScriptedFetcher::new().script("a", [Step::Ok(canonical)]);

    ctx.engine(&first).run().await.expect("First run failed");

    let output = ctx.read_output();
    assert_eq!(output.len(), 1);
    assert_eq!(output[0]["url"], "a");
    assert!(output[0].get("product_url").is_none());
    assert_eq!(output[0]["ingredients"], "ingredients of a");

    let second = ScriptedFetcher::new();
    let summary = ctx.engine(&second).run().await.expect("Second run failed");

    assert_eq!(second.calls("a"), 0);
    assert_eq!(second.total_calls(), 0);
    assert_eq!(summary.already_done, 1);
    assert_eq!(summary.enqueued, 0);
    assert_eq!(ctx.read_output(), output);
}
