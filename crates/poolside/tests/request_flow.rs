// Integration tests: controllers driven through retry and form submission

use poolside::fetch::testing::ScriptedTransport;
use poolside::fetch::{Method, RequestError, RequestOptions, RetryPolicy, TargetOverride};
use poolside::forms::{FieldInput, SubmitOutcome};
use poolside::prelude::*;
use poolside::validation::{length, required};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::time::Duration;

#[tokio::test]
async fn test_retry_recovers_from_transport_failure() {
    let (transport, mut requests) = ScriptedTransport::new();
    let controller = Arc::new(RequestController::<Value>::new(
        Arc::new(transport),
        RequestTarget::get("/api/plans"),
        RequestOptions::default(),
    ));

    let server = tokio::spawn(async move {
        requests.recv().await.unwrap().fail("connection refused");
        requests.recv().await.unwrap().respond(200, json!([{"id": 7, "weeks": 12}]));
        requests
    });

    let attempts = {
        let controller = controller.clone();
        with_retry(move || controller.execute(None, None), 3, Duration::from_millis(10))
    };
    let plans = attempts.await.unwrap();

    assert_eq!(plans, json!([{"id": 7, "weeks": 12}]));
    let state = controller.state();
    assert!(state.error.is_none());
    assert!(!state.loading);
    assert_eq!(state.status_code, Some(200));
    server.await.unwrap();
}

#[tokio::test]
async fn test_client_errors_are_not_retried_with_transient_predicate() {
    let (transport, mut requests) = ScriptedTransport::new();
    let controller = RequestController::<Value>::new(
        Arc::new(transport),
        RequestTarget::get("/api/lists/404"),
        RequestOptions::default(),
    );

    let server = tokio::spawn(async move {
        requests
            .recv()
            .await
            .unwrap()
            .respond(404, json!({"detail": "List not found"}));
        // Nothing else should arrive
        tokio::time::timeout(Duration::from_millis(100), requests.recv())
            .await
            .is_err()
    });

    let error = RetryPolicy::new(3, Duration::from_millis(10))
        .retry_if(|| controller.execute(None, None), RequestError::is_transient)
        .await
        .unwrap_err();

    assert_eq!(error.status(), Some(404));
    assert_eq!(
        controller.state().error.map(|e| e.message),
        Some("List not found".to_string())
    );
    assert!(server.await.unwrap(), "a second attempt was sent");
}

#[tokio::test]
async fn test_form_submission_through_controller() {
    let (transport, mut requests) = ScriptedTransport::new();
    let create = Arc::new(RequestController::<Value>::new(
        Arc::new(transport),
        RequestTarget::new(Method::Post, "/api/workouts"),
        RequestOptions::default(),
    ));

    let handler = {
        let create = create.clone();
        submit_handler(move |values| {
            let call = create.execute(
                Some(TargetOverride::new().body(json!({
                    "name": values.text("name"),
                }))),
                None,
            );
            async move {
                call.await?;
                Ok::<_, anyhow::Error>(())
            }
        })
    };

    let form = FormEngine::configure(
        FormValues::new().with("name", ""),
        handler,
        FormConfig::default().with_validator(
            FieldRules::new()
                .field("name", [required("Name is required"), length(3, 40)])
                .into_validator(),
        ),
    );

    assert_eq!(form.submit(None).await, SubmitOutcome::Invalid);
    assert_eq!(form.visible_error("name").as_deref(), Some("Name is required"));

    form.on_field_change("name", FieldInput::text("Broken 200s"));
    assert!(form.is_valid());

    let submission = tokio::spawn(form.submit(None));
    let request = requests.recv().await.unwrap();
    assert_eq!(request.descriptor.method, Method::Post);
    assert_eq!(request.descriptor.body, Some(json!({"name": "Broken 200s"})));
    request.respond(409, json!({"message": "A workout with this name exists"}));

    assert_eq!(submission.await.unwrap(), SubmitOutcome::Failed);
    let state = form.state();
    assert_eq!(
        state.submit_error(),
        Some("server failure (409): A workout with this name exists")
    );
    assert!(!state.is_submitting);
    assert_eq!(create.state().status_code, Some(409));

    let retry = tokio::spawn(form.submit(None));
    requests.recv().await.unwrap().respond(201, json!({"id": 31}));
    assert_eq!(retry.await.unwrap(), SubmitOutcome::Submitted);
    assert_eq!(create.state().data, Some(json!({"id": 31})));
}
