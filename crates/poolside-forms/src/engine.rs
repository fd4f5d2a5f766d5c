// File: poolside-forms/src/engine.rs
// Purpose: Form state engine with synchronous validation and guarded submission

use futures::future::BoxFuture;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

use crate::state::{FormState, SUBMIT_ERROR_KEY};
use crate::value::{FieldErrors, FieldInput, FieldValue, FormValues};

/// Maps the full value set to the failing fields
pub type Validator = Arc<dyn Fn(&FormValues) -> FieldErrors + Send + Sync>;

/// Slow checks such as server-side uniqueness
pub type AsyncValidator = Arc<dyn Fn(FormValues) -> BoxFuture<'static, FieldErrors> + Send + Sync>;

pub type SubmitHandler =
    Arc<dyn Fn(FormValues) -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

pub fn validator<F>(f: F) -> Validator
where
    F: Fn(&FormValues) -> FieldErrors + Send + Sync + 'static,
{
    Arc::new(f)
}

pub fn async_validator<F, Fut>(f: F) -> AsyncValidator
where
    F: Fn(FormValues) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = FieldErrors> + Send + 'static,
{
    Arc::new(move |values| Box::pin(f(values)))
}

pub fn submit_handler<F, Fut>(f: F) -> SubmitHandler
where
    F: Fn(FormValues) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    Arc::new(move |values| Box::pin(f(values)))
}

/// The host event that triggered a submission
pub trait SubmitEvent {
    fn prevent_default(&mut self);
}

#[derive(Clone)]
pub struct FormConfig {
    /// Must not call back into the engine
    pub validate: Validator,
    pub initial_errors: FieldErrors,
    pub reset_on_submit: bool,
    pub async_validate: Option<AsyncValidator>,
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            validate: Arc::new(|_| FieldErrors::new()),
            initial_errors: FieldErrors::new(),
            reset_on_submit: false,
            async_validate: None,
        }
    }
}

impl FormConfig {
    pub fn with_validator(mut self, validate: Validator) -> Self {
        self.validate = validate;
        self
    }

    pub fn with_initial_errors(mut self, errors: FieldErrors) -> Self {
        self.initial_errors = errors;
        self
    }

    pub fn reset_on_submit(mut self, reset: bool) -> Self {
        self.reset_on_submit = reset;
        self
    }

    pub fn with_async_validator(mut self, validate: AsyncValidator) -> Self {
        self.async_validate = Some(validate);
        self
    }
}

impl fmt::Debug for FormConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormConfig")
            .field("initial_errors", &self.initial_errors)
            .field("reset_on_submit", &self.reset_on_submit)
            .field("async_validate", &self.async_validate.is_some())
            .finish_non_exhaustive()
    }
}

/// How a call to [`FormEngine::submit`] ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Handler ran and succeeded
    Submitted,
    /// Validation failed; handler not called
    Invalid,
    /// Handler ran and failed; its message is under the `submit` key
    Failed,
    /// Another submission was running, or values changed during async validation
    Ignored,
}

struct Inner {
    initial: FormValues,
    handler: SubmitHandler,
    config: FormConfig,
    state: watch::Sender<FormState>,
    /// Bumped on every validation pass, only while the state lock is held
    generation: AtomicU64,
    submitting: AtomicBool,
}

impl Inner {
    fn revalidate(&self, state: &mut FormState) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        state.set_errors((self.config.validate)(&state.values));
    }

    fn restore_initial(&self, state: &mut FormState) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        *state = FormState::new(self.initial.clone(), self.config.initial_errors.clone());
    }

    fn snapshot(&self) -> (FormValues, u64) {
        let state = self.state.borrow();
        (state.values.clone(), self.generation.load(Ordering::SeqCst))
    }

    /// Merge async errors unless a validation pass ran since `generation`
    fn merge_async(&self, generation: u64, errors: FieldErrors) -> bool {
        let mut current = false;
        self.state.send_if_modified(|state| {
            if self.generation.load(Ordering::SeqCst) != generation {
                return false;
            }
            current = true;
            if errors.is_empty() {
                return false;
            }
            let mut merged = state.errors.clone();
            merged.extend(errors);
            state.set_errors(merged);
            true
        });

        if !current {
            tracing::trace!(generation, "dropping stale async validation");
        }
        current
    }

    async fn run_submit(&self) -> SubmitOutcome {
        let mut values = FormValues::new();
        let mut generation = 0;
        let mut valid = false;

        self.state.send_modify(|state| {
            self.revalidate(state);
            for name in state.values.names() {
                state.touched.insert(name.to_string(), true);
            }
            for name in state.errors.keys() {
                state.touched.insert(name.clone(), true);
            }
            values = state.values.clone();
            generation = self.generation.load(Ordering::SeqCst);
            valid = state.is_valid;
        });

        if !valid {
            tracing::debug!("submit blocked by validation errors");
            return SubmitOutcome::Invalid;
        }

        if let Some(validate) = &self.config.async_validate {
            let errors = validate(values.clone()).await;
            let failed = !errors.is_empty();
            if !self.merge_async(generation, errors) {
                tracing::debug!("values changed during async validation, submit dropped");
                return SubmitOutcome::Ignored;
            }
            if failed {
                tracing::debug!("submit blocked by async validation errors");
                return SubmitOutcome::Invalid;
            }
        }

        self.state.send_modify(|state| state.is_submitting = true);
        tracing::debug!(fields = values.len(), "submitting form");

        match (self.handler)(values).await {
            Ok(()) => {
                self.state.send_modify(|state| {
                    if self.config.reset_on_submit {
                        self.restore_initial(state);
                    } else {
                        state.is_submitting = false;
                    }
                });
                tracing::debug!("form submitted");
                SubmitOutcome::Submitted
            }
            Err(error) => {
                tracing::debug!(%error, "submit handler failed");
                self.state.send_modify(|state| {
                    let mut errors = state.errors.clone();
                    errors.insert(SUBMIT_ERROR_KEY.to_string(), error.to_string());
                    state.set_errors(errors);
                    state.is_submitting = false;
                });
                SubmitOutcome::Failed
            }
        }
    }
}

/// Held for the whole of one submission
struct SubmitGuard {
    inner: Arc<Inner>,
}

impl SubmitGuard {
    fn acquire(inner: &Arc<Inner>) -> Option<Self> {
        inner
            .submitting
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| Self {
                inner: Arc::clone(inner),
            })
    }
}

impl Drop for SubmitGuard {
    fn drop(&mut self) {
        self.inner.state.send_if_modified(|state| {
            let was_submitting = state.is_submitting;
            state.is_submitting = false;
            was_submitting
        });
        self.inner.submitting.store(false, Ordering::SeqCst);
    }
}

/// Owns the values, errors and touched set of one form
///
/// Every change revalidates synchronously, so `is_valid` always matches the
/// validator's verdict on the current values. Clones share the same form.
#[derive(Clone)]
pub struct FormEngine {
    inner: Arc<Inner>,
}

impl FormEngine {
    pub fn new(initial_values: FormValues, handler: SubmitHandler) -> Self {
        Self::configure(initial_values, handler, FormConfig::default())
    }

    /// Create an engine; `initial_errors` are shown as given until the first change
    pub fn configure(initial_values: FormValues, handler: SubmitHandler, config: FormConfig) -> Self {
        let (state, _) = watch::channel(FormState::new(
            initial_values.clone(),
            config.initial_errors.clone(),
        ));

        Self {
            inner: Arc::new(Inner {
                initial: initial_values,
                handler,
                config,
                state,
                generation: AtomicU64::new(0),
                submitting: AtomicBool::new(false),
            }),
        }
    }

    /// Store the value extracted from an input and revalidate
    pub fn on_field_change(&self, name: &str, input: FieldInput) {
        self.set_field_value(name, input.into_value());
    }

    /// Mark a field touched; values and errors are left alone
    pub fn on_field_blur(&self, name: &str) {
        self.inner
            .state
            .send_if_modified(|state| state.touched.insert(name.to_string(), true) != Some(true));
    }

    pub fn set_field_value(&self, name: &str, value: impl Into<FieldValue>) {
        let value = value.into();
        self.inner.state.send_modify(|state| {
            state.values.insert(name, value);
            self.inner.revalidate(state);
        });
        tracing::trace!(field = name, "field changed");
    }

    /// Overwrite the fields present in `partial` and revalidate once
    pub fn set_values(&self, partial: FormValues) {
        self.inner.state.send_modify(|state| {
            state.values.merge(partial);
            self.inner.revalidate(state);
        });
    }

    /// Run async validation against the current values
    ///
    /// Resolves `true` if the result was merged, `false` if a change made it
    /// stale first. Without an async validator this resolves `true` at once.
    pub fn validate_async(&self) -> impl Future<Output = bool> + Send + 'static {
        let inner = Arc::clone(&self.inner);
        let (values, generation) = inner.snapshot();

        async move {
            let Some(validate) = inner.config.async_validate.clone() else {
                return true;
            };
            let errors = validate(values).await;
            inner.merge_async(generation, errors)
        }
    }

    /// Validate and, if clean, hand the values to the submit handler
    ///
    /// `prevent_default` is called on the event and the double-submit guard
    /// is taken before this returns. Handler failures are stored under the
    /// `submit` error key rather than returned.
    pub fn submit(
        &self,
        event: Option<&mut dyn SubmitEvent>,
    ) -> impl Future<Output = SubmitOutcome> + Send + 'static {
        if let Some(event) = event {
            event.prevent_default();
        }
        let inner = Arc::clone(&self.inner);
        let guard = SubmitGuard::acquire(&inner);

        async move {
            let Some(_guard) = guard else {
                tracing::debug!("submit ignored, already submitting");
                return SubmitOutcome::Ignored;
            };
            inner.run_submit().await
        }
    }

    /// Restore values, errors and touched to the initial snapshot
    pub fn reset_form(&self) {
        self.inner
            .state
            .send_modify(|state| self.inner.restore_initial(state));
    }

    pub fn state(&self) -> FormState {
        self.inner.state.borrow().clone()
    }

    pub fn values(&self) -> FormValues {
        self.inner.state.borrow().values.clone()
    }

    pub fn errors(&self) -> FieldErrors {
        self.inner.state.borrow().errors.clone()
    }

    pub fn is_valid(&self) -> bool {
        self.inner.state.borrow().is_valid
    }

    pub fn is_submitting(&self) -> bool {
        self.inner.state.borrow().is_submitting
    }

    pub fn is_touched(&self, name: &str) -> bool {
        self.inner.state.borrow().is_touched(name)
    }

    pub fn visible_error(&self, name: &str) -> Option<String> {
        self.inner
            .state
            .borrow()
            .visible_error(name)
            .map(str::to_string)
    }

    pub fn subscribe(&self) -> watch::Receiver<FormState> {
        self.inner.state.subscribe()
    }
}

impl fmt::Debug for FormEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormEngine")
            .field("state", &*self.inner.state.borrow())
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::FileRef;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::Notify;

    fn require_name_and_distance(values: &FormValues) -> FieldErrors {
        let mut errors = FieldErrors::new();
        if values.text("name").trim().is_empty() {
            errors.insert("name".to_string(), "Name is required".to_string());
        }
        match values.text("distance").parse::<u32>() {
            Ok(d) if d > 0 => {}
            _ => {
                errors.insert("distance".to_string(), "Distance must be positive".to_string());
            }
        }
        errors
    }

    fn blank_workout() -> FormValues {
        FormValues::new().with("name", "").with("distance", "")
    }

    fn counting_handler(calls: Arc<AtomicUsize>) -> SubmitHandler {
        submit_handler(move |_values| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok(()) }
        })
    }

    fn engine_with(handler: SubmitHandler, config: FormConfig) -> FormEngine {
        FormEngine::configure(
            blank_workout(),
            handler,
            config.with_validator(validator(require_name_and_distance)),
        )
    }

    #[derive(Default)]
    struct FakeEvent {
        prevented: bool,
    }

    impl SubmitEvent for FakeEvent {
        fn prevent_default(&mut self) {
            self.prevented = true;
        }
    }

    #[test]
    fn test_validity_tracks_every_change() {
        let engine = engine_with(counting_handler(Arc::default()), FormConfig::default());

        let steps = [
            ("name", "Pyramid"),
            ("distance", "0"),
            ("distance", "800"),
            ("name", "  "),
            ("name", "Pyramid 2"),
        ];
        for (field, text) in steps {
            engine.on_field_change(field, FieldInput::text(text));
            let expected = require_name_and_distance(&engine.values()).is_empty();
            assert_eq!(engine.is_valid(), expected, "after setting {} to {:?}", field, text);
            assert_eq!(engine.errors(), require_name_and_distance(&engine.values()));
        }
        assert!(engine.is_valid());
    }

    #[test]
    fn test_initial_errors_shown_as_given() {
        let initial = FieldErrors::from([("name".to_string(), "Taken".to_string())]);
        let engine = engine_with(
            counting_handler(Arc::default()),
            FormConfig::default().with_initial_errors(initial.clone()),
        );

        assert_eq!(engine.errors(), initial);
        assert!(!engine.is_valid());
    }

    #[test]
    fn test_change_does_not_touch_and_blur_does_not_validate() {
        let passes = Arc::new(AtomicUsize::new(0));
        let counter = passes.clone();
        let engine = FormEngine::configure(
            blank_workout(),
            counting_handler(Arc::default()),
            FormConfig::default().with_validator(validator(move |values| {
                counter.fetch_add(1, Ordering::SeqCst);
                require_name_and_distance(values)
            })),
        );

        engine.on_field_change("name", FieldInput::text(""));
        assert_eq!(passes.load(Ordering::SeqCst), 1);
        assert!(!engine.is_touched("name"));
        assert_eq!(engine.visible_error("name"), None);

        engine.on_field_blur("name");
        assert_eq!(passes.load(Ordering::SeqCst), 1);
        assert!(engine.is_touched("name"));
        assert_eq!(engine.visible_error("name").as_deref(), Some("Name is required"));
    }

    #[test]
    fn test_checkbox_and_files_extracted() {
        let engine = FormEngine::new(FormValues::new(), counting_handler(Arc::default()));

        engine.on_field_change("public", FieldInput::checkbox(true));
        engine.on_field_change(
            "attachments",
            FieldInput::FileList(vec![FileRef::new("plan.pdf", 4096)]),
        );

        let values = engine.values();
        assert_eq!(values.get("public"), Some(&FieldValue::Bool(true)));
        assert_eq!(
            values.get("attachments"),
            Some(&FieldValue::Files(vec![FileRef::new("plan.pdf", 4096)]))
        );
    }

    #[tokio::test]
    async fn test_invalid_submit_skips_handler_and_touches_fields() {
        let calls = Arc::new(AtomicUsize::new(0));
        let engine = engine_with(counting_handler(calls.clone()), FormConfig::default());
        engine.on_field_change("name", FieldInput::text("Broken set"));

        let mut event = FakeEvent::default();
        let outcome = engine.submit(Some(&mut event)).await;

        assert!(event.prevented);
        assert_eq!(outcome, SubmitOutcome::Invalid);
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let state = engine.state();
        assert!(!state.errors.is_empty());
        for field in state.errors.keys() {
            assert!(state.is_touched(field), "{} should be touched", field);
        }
        assert!(!state.is_submitting);
    }

    #[tokio::test]
    async fn test_valid_submit_calls_handler_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let release = Arc::new(Notify::new());

        let handler = {
            let calls = calls.clone();
            let release = release.clone();
            submit_handler(move |values| {
                calls.fetch_add(1, Ordering::SeqCst);
                let release = release.clone();
                async move {
                    assert_eq!(values.text("name"), "Aerobic 400s");
                    release.notified().await;
                    Ok(())
                }
            })
        };
        let engine = engine_with(handler, FormConfig::default());
        engine.set_values(
            FormValues::new()
                .with("name", "Aerobic 400s")
                .with("distance", "2400"),
        );

        let mut updates = engine.subscribe();
        let call = tokio::spawn(engine.submit(None));

        updates.wait_for(|state| state.is_submitting).await.unwrap();
        assert!(engine.is_submitting());

        release.notify_one();
        assert_eq!(call.await.unwrap(), SubmitOutcome::Submitted);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!engine.is_submitting());
    }

    #[tokio::test]
    async fn test_double_submit_is_ignored() {
        let calls = Arc::new(AtomicUsize::new(0));
        let release = Arc::new(Notify::new());

        let handler = {
            let calls = calls.clone();
            let release = release.clone();
            submit_handler(move |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                let release = release.clone();
                async move {
                    release.notified().await;
                    Ok(())
                }
            })
        };
        let engine = engine_with(handler, FormConfig::default());
        engine.set_values(FormValues::new().with("name", "IM").with("distance", "400"));

        let first = tokio::spawn(engine.submit(None));
        let second = engine.submit(None).await;
        assert_eq!(second, SubmitOutcome::Ignored);

        release.notify_one();
        assert_eq!(first.await.unwrap(), SubmitOutcome::Submitted);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // Guard is released once the first submission finishes
        release.notify_one();
        assert_eq!(engine.submit(None).await, SubmitOutcome::Submitted);
    }

    #[tokio::test]
    async fn test_failed_submit_sets_submit_error() {
        let engine = engine_with(
            submit_handler(|_| async { Err(anyhow::anyhow!("Server unavailable")) }),
            FormConfig::default(),
        );
        engine.set_values(FormValues::new().with("name", "Drills").with("distance", "600"));

        assert_eq!(engine.submit(None).await, SubmitOutcome::Failed);

        let state = engine.state();
        assert_eq!(state.submit_error(), Some("Server unavailable"));
        assert!(!state.is_valid);
        assert!(!state.is_submitting);

        // The next validation pass replaces the map
        engine.on_field_change("name", FieldInput::text("Drills 2"));
        assert_eq!(engine.state().submit_error(), None);
        assert!(engine.is_valid());
    }

    #[tokio::test]
    async fn test_reset_on_submit_restores_initial_snapshot() {
        let initial = FormValues::new().with("name", "Template").with("distance", "100");
        let engine = FormEngine::configure(
            initial.clone(),
            counting_handler(Arc::default()),
            FormConfig::default()
                .with_validator(validator(require_name_and_distance))
                .reset_on_submit(true),
        );

        engine.set_field_value("name", "Edited");
        engine.on_field_blur("name");
        assert_eq!(engine.submit(None).await, SubmitOutcome::Submitted);

        let state = engine.state();
        assert_eq!(state.values, initial);
        assert!(state.touched.is_empty());
        assert!(state.errors.is_empty());
    }

    #[tokio::test]
    async fn test_submit_without_reset_keeps_values() {
        let engine = engine_with(counting_handler(Arc::default()), FormConfig::default());
        engine.set_values(FormValues::new().with("name", "Kick").with("distance", "200"));

        assert_eq!(engine.submit(None).await, SubmitOutcome::Submitted);
        assert_eq!(engine.values().text("name"), "Kick");
    }

    #[test]
    fn test_reset_form() {
        let engine = engine_with(counting_handler(Arc::default()), FormConfig::default());
        let initial = engine.state();

        engine.set_field_value("name", "Changed");
        engine.on_field_blur("name");
        engine.reset_form();

        assert_eq!(engine.state(), initial);
    }

    #[tokio::test]
    async fn test_async_validation_merges_when_current() {
        let engine = engine_with(
            counting_handler(Arc::default()),
            FormConfig::default().with_async_validator(async_validator(|values| async move {
                let mut errors = FieldErrors::new();
                if values.text("name") == "Taken" {
                    errors.insert("name".to_string(), "Name already used".to_string());
                }
                errors
            })),
        );
        engine.set_values(FormValues::new().with("name", "Taken").with("distance", "50"));
        assert!(engine.is_valid());

        assert!(engine.validate_async().await);
        assert_eq!(engine.state().error("name"), Some("Name already used"));
        assert!(!engine.is_valid());
    }

    #[tokio::test]
    async fn test_stale_async_validation_is_dropped() {
        let release = Arc::new(Notify::new());
        let gate = release.clone();
        let engine = engine_with(
            counting_handler(Arc::default()),
            FormConfig::default().with_async_validator(async_validator(move |_| {
                let gate = gate.clone();
                async move {
                    gate.notified().await;
                    FieldErrors::from([("name".to_string(), "Name already used".to_string())])
                }
            })),
        );
        engine.set_values(FormValues::new().with("name", "Taken").with("distance", "50"));

        let pending = tokio::spawn(engine.validate_async());
        engine.on_field_change("name", FieldInput::text("Fresh"));
        release.notify_one();

        assert!(!pending.await.unwrap());
        assert_eq!(engine.state().error("name"), None);
        assert!(engine.is_valid());
    }

    #[tokio::test]
    async fn test_async_errors_block_submit() {
        let calls = Arc::new(AtomicUsize::new(0));
        let engine = engine_with(
            counting_handler(calls.clone()),
            FormConfig::default().with_async_validator(async_validator(|_| async {
                FieldErrors::from([("name".to_string(), "Name already used".to_string())])
            })),
        );
        engine.set_values(FormValues::new().with("name", "Taken").with("distance", "50"));

        assert_eq!(engine.submit(None).await, SubmitOutcome::Invalid);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(engine.visible_error("name").as_deref(), Some("Name already used"));
    }
}
