use crate::config::{
    load_policy, save_policy, Policy, PolicyStore, Staging, StoreError, ValidationErrors,
};
use crate::drift::StatusSummary;
use crate::external::{
    ApplyOutcome, ControllerError, ObservedState, ProxyController, ProxyStack, StackError,
};
use arc_swap::ArcSwap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::broadcast;

const EVENT_CAPACITY: usize = 16;

/// Snapshots published to every context sharing a channel.
#[derive(Debug, Clone)]
pub enum ContextEvent {
    PolicyChanged(Arc<Policy>),
    ObservedChanged(Arc<ObservedState>),
}

#[derive(Error, Debug)]
pub enum ContextError {
    #[error("Invalid policy: {0}")]
    Invalid(#[from] ValidationErrors),
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    #[error("Controller error: {0}")]
    Controller(#[from] ControllerError),
}

impl From<StackError> for ContextError {
    fn from(e: StackError) -> Self {
        ContextError::Controller(ControllerError::Stack(e))
    }
}

/// Owns the active policy and the latest observation of the stack.
pub struct Context {
    store: Arc<dyn PolicyStore>,
    controller: ProxyController,
    policy: ArcSwap<Policy>,
    events: broadcast::Sender<ContextEvent>,
}

impl Context {
    /// Load the persisted policy and observe the stack. Nothing is applied.
    pub async fn load(
        store: Arc<dyn PolicyStore>,
        stack: Arc<dyn ProxyStack>,
    ) -> Result<Self, ContextError> {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self::load_with_events(store, stack, events).await
    }

    /// Like [`Context::load`], publishing on an existing channel so that
    /// several contexts observe each other's changes.
    pub async fn load_with_events(
        store: Arc<dyn PolicyStore>,
        stack: Arc<dyn ProxyStack>,
        events: broadcast::Sender<ContextEvent>,
    ) -> Result<Self, ContextError> {
        let policy = load_policy(store.as_ref()).await?;
        let controller = ProxyController::new(stack);
        controller.observe().await?;
        tracing::debug!("Context loaded with mode {}", policy.mode);
        Ok(Self {
            store,
            controller,
            policy: ArcSwap::new(Arc::new(policy)),
            events,
        })
    }

    pub fn policy(&self) -> Arc<Policy> {
        self.policy.load_full()
    }

    pub fn observed(&self) -> Arc<ObservedState> {
        self.controller.observed()
    }

    pub fn controller(&self) -> &ProxyController {
        &self.controller
    }

    pub fn staging(&self) -> Staging {
        Staging::new(self.policy())
    }

    pub fn status(&self) -> StatusSummary {
        StatusSummary::compute(&self.policy(), &self.observed())
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ContextEvent> {
        self.events.subscribe()
    }

    pub fn sender(&self) -> broadcast::Sender<ContextEvent> {
        self.events.clone()
    }

    /// Validate, persist, activate and apply a staged policy.
    pub async fn save(&self, staging: Staging) -> Result<ApplyOutcome, ContextError> {
        let policy = Arc::new(staging.commit()?);
        save_policy(self.store.as_ref(), &policy).await?;
        self.policy.store(policy.clone());
        self.publish(ContextEvent::PolicyChanged(policy.clone()));
        self.apply_policy(&policy).await
    }

    /// Apply the active policy again without changing it.
    pub async fn apply(&self) -> Result<ApplyOutcome, ContextError> {
        self.apply_policy(&self.policy()).await
    }

    pub async fn clear(&self) -> Result<(), ContextError> {
        self.controller.clear().await?;
        self.publish(ContextEvent::ObservedChanged(self.observed()));
        Ok(())
    }

    pub async fn refresh_observed(&self) -> Result<Arc<ObservedState>, ContextError> {
        let observed = self.controller.observe().await?;
        self.publish(ContextEvent::ObservedChanged(observed.clone()));
        Ok(observed)
    }

    /// Replace the local policy snapshot from an event. Observations are
    /// re-read from the stack rather than copied.
    pub async fn handle_event(&self, event: ContextEvent) -> Result<(), ContextError> {
        match event {
            ContextEvent::PolicyChanged(policy) => self.policy.store(policy),
            ContextEvent::ObservedChanged(_) => {
                self.controller.observe().await?;
            }
        }
        Ok(())
    }

    async fn apply_policy(&self, policy: &Policy) -> Result<ApplyOutcome, ContextError> {
        let outcome = self.controller.apply(policy).await?;
        if !matches!(outcome, ApplyOutcome::Skipped(_)) {
            self.publish(ContextEvent::ObservedChanged(self.observed()));
        }
        Ok(outcome)
    }

    fn publish(&self, event: ContextEvent) {
        // No receivers is fine.
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MemoryStore, ProxyConfig, ProxyMode, ProxyScheme, ProxyServer};
    use crate::external::{MemoryStack, StackRequest};

    async fn setup() -> (Arc<MemoryStore>, Arc<MemoryStack>, Context) {
        let store = Arc::new(MemoryStore::new());
        let stack = Arc::new(MemoryStack::new());
        let ctx = Context::load(store.clone(), stack.clone()).await.unwrap();
        (store, stack, ctx)
    }

    #[tokio::test]
    async fn test_load_defaults() {
        let (_, stack, ctx) = setup().await;
        assert_eq!(*ctx.policy(), Policy::default());
        assert_eq!(ctx.observed().mode, ProxyMode::System);
        assert!(stack.requests().is_empty());
    }

    #[tokio::test]
    async fn test_save_applies_and_publishes() {
        let (store, stack, ctx) = setup().await;
        let mut rx = ctx.subscribe();
        let mut staging = ctx.staging();
        staging.add_proxy(ProxyConfig::new(
            "work",
            ProxyServer::new(ProxyScheme::Http, "proxy.local", 3128),
        ));
        staging.set_mode(ProxyMode::FixedServers, Some("work"));
        let outcome = ctx.save(staging).await.unwrap();
        assert!(matches!(outcome, ApplyOutcome::Set(_)));

        assert_eq!(ctx.policy().mode, ProxyMode::FixedServers);
        assert_eq!(load_policy(store.as_ref()).await.unwrap(), *ctx.policy());
        assert_eq!(stack.requests().len(), 1);
        assert!(!ctx.status().is_foreign());

        let ContextEvent::PolicyChanged(policy) = rx.recv().await.unwrap() else {
            panic!("expected policy event");
        };
        assert!(Arc::ptr_eq(&policy, &ctx.policy()));
        let ContextEvent::ObservedChanged(observed) = rx.recv().await.unwrap() else {
            panic!("expected observation event");
        };
        assert_eq!(observed.mode, ProxyMode::FixedServers);
    }

    #[tokio::test]
    async fn test_invalid_save_is_refused() {
        let (store, stack, ctx) = setup().await;
        let mut staging = ctx.staging();
        staging.set_mode(ProxyMode::FixedServers, Some("nowhere"));
        assert!(matches!(ctx.save(staging).await, Err(ContextError::Invalid(_))));
        assert_eq!(*ctx.policy(), Policy::default());
        assert_eq!(load_policy(store.as_ref()).await.unwrap(), Policy::default());
        assert!(stack.requests().is_empty());
    }

    #[tokio::test]
    async fn test_contexts_share_events() {
        let store = Arc::new(MemoryStore::new());
        let stack = Arc::new(MemoryStack::new());
        let first = Context::load(store.clone(), stack.clone()).await.unwrap();
        let second = Context::load_with_events(store.clone(), stack.clone(), first.sender())
            .await
            .unwrap();
        let mut rx = second.subscribe();

        let mut staging = first.staging();
        staging.set_mode(ProxyMode::AutoDetect, None);
        first.save(staging).await.unwrap();

        for _ in 0..2 {
            let event = rx.recv().await.unwrap();
            second.handle_event(event).await.unwrap();
        }
        assert_eq!(second.policy().mode, ProxyMode::AutoDetect);
        assert_eq!(second.observed().mode, ProxyMode::AutoDetect);
    }

    #[tokio::test]
    async fn test_refresh_and_clear() {
        let (_, stack, ctx) = setup().await;
        stack.override_with(steerapi::ProxySettingsSchema::mode_only("pac_script"));
        assert_eq!(ctx.observed().mode, ProxyMode::System);
        ctx.refresh_observed().await.unwrap();
        assert!(ctx.status().pac_foreign);

        ctx.clear().await.unwrap();
        assert_eq!(stack.requests(), vec![StackRequest::Clear]);
        assert_eq!(ctx.observed().mode, ProxyMode::System);
    }
}
