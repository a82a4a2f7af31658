//! Integration tests for per-task model fallback

mod common;

use common::mocks::MockFactory;
use deepdive::llm::{LLMClientFactory, ModelCandidates, ModelFallback, TaskCategory};
use deepdive::types::{AppError, Result};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

/// Counts WARN events.
struct WarnCounter(Arc<AtomicUsize>);

impl<S: Subscriber> Layer<S> for WarnCounter {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() == Level::WARN {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// Run `fut` on a fresh runtime with a warn-counting subscriber installed.
fn with_warn_count<T>(fut: impl std::future::Future<Output = T>) -> (T, usize) {
    let warnings = Arc::new(AtomicUsize::new(0));
    let subscriber = tracing_subscriber::registry().with(WarnCounter(warnings.clone()));

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();
    let output = tracing::subscriber::with_default(subscriber, || runtime.block_on(fut));

    (output, warnings.load(Ordering::SeqCst))
}

fn candidates() -> ModelCandidates {
    ModelCandidates::new("default/model")
        .with_task(TaskCategory::Analysis, ["free/model", "paid/model"])
        .with_task(TaskCategory::Report, ["writer/model"])
}

async fn ask(fallback: &ModelFallback, factory: &MockFactory, task: TaskCategory) -> Result<String> {
    fallback
        .dispatch(task, |model| async move {
            let client = factory.create(&model)?;
            client.generate("What changed?").await
        })
        .await
}

#[test]
fn test_first_failure_falls_through_with_one_warning() {
    let factory = MockFactory::with_responder(|model, _, _| Ok(format!("answer from {}", model)))
        .failing_model("free/model");
    let fallback = ModelFallback::new(candidates());

    let (result, warnings) =
        with_warn_count(async { ask(&fallback, &factory, TaskCategory::Analysis).await });

    assert_eq!(result.unwrap(), "answer from paid/model");
    assert_eq!(warnings, 1);
    assert_eq!(factory.models_called(), vec!["free/model", "paid/model"]);
}

#[test]
fn test_success_on_first_candidate_logs_nothing() {
    let factory = MockFactory::replying("ok");
    let fallback = ModelFallback::new(candidates());

    let (result, warnings) =
        with_warn_count(async { ask(&fallback, &factory, TaskCategory::Analysis).await });

    assert_eq!(result.unwrap(), "ok");
    assert_eq!(warnings, 0);
    assert_eq!(factory.models_called(), vec!["free/model"]);
}

#[test]
fn test_all_candidates_failing_names_the_task() {
    let factory = MockFactory::replying("unused")
        .failing_model("free/model")
        .failing_model("paid/model");
    let fallback = ModelFallback::new(candidates());

    let (result, warnings) =
        with_warn_count(async { ask(&fallback, &factory, TaskCategory::Analysis).await });

    let err = result.unwrap_err();
    assert!(matches!(err, AppError::AllModelsFailed(TaskCategory::Analysis)));
    assert!(err.to_string().contains("ANALYSIS"));
    assert_eq!(warnings, 2);
}

#[tokio::test]
async fn test_unconfigured_task_uses_default_model() {
    let factory = MockFactory::replying("planned");
    let fallback = ModelFallback::new(candidates());

    let result = ask(&fallback, &factory, TaskCategory::Planning).await.unwrap();

    assert_eq!(result, "planned");
    assert_eq!(factory.models_called(), vec!["default/model"]);
}

#[tokio::test]
async fn test_factory_errors_count_as_candidate_failures() {
    struct Unavailable;

    impl LLMClientFactory for Unavailable {
        fn create(&self, model: &str) -> Result<Box<dyn deepdive::llm::LLMClient>> {
            Err(AppError::LLM(format!("{} unavailable", model)))
        }

        fn provider_name(&self) -> &str {
            "unavailable"
        }
    }

    let fallback = ModelFallback::new(candidates());
    let factory = Unavailable;
    let result: Result<String> = fallback
        .dispatch(TaskCategory::Report, |model| {
            let factory = &factory;
            async move {
                let client = factory.create(&model)?;
                client.generate("report").await
            }
        })
        .await;

    assert!(matches!(
        result,
        Err(AppError::AllModelsFailed(TaskCategory::Report))
    ));
}
