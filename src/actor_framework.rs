use std::collections::BTreeMap;
use std::fmt::{Debug, Display};
use tokio::sync::{mpsc, oneshot};
use thiserror::Error;
use tracing::{debug, info, warn};

// =============================================================================
// 1. THE ABSTRACTION (Traits with Hooks, Params, and Actions)
// =============================================================================

/// Trait that any domain entity must implement to be managed by ResourceActor
pub trait Entity: Clone + Send + Sync + 'static {
    type Id: Ord + Clone + Send + Sync + Display + Debug;
    type CreateParams: Send + Sync + Debug;
    type Patch: Send + Sync + Debug;
    type Action: Send + Sync + Debug;
    type ActionResult: Send + Sync + Debug;

    /// Get the ID of the entity
    fn id(&self) -> &Self::Id;

    /// An ID chosen by the caller. When `None`, the actor's generator is used.
    fn assigned_id(_params: &Self::CreateParams) -> Option<Self::Id> {
        None
    }

    /// Construct the full Entity from the ID and creation parameters
    fn from_create_params(id: Self::Id, params: Self::CreateParams) -> Result<Self, String>;

    // --- Lifecycle Hooks ---

    fn on_create(&mut self) -> Result<(), String> { Ok(()) }
    fn on_update(&mut self, patch: Self::Patch) -> Result<(), String>;
    fn on_delete(&self) -> Result<(), String> { Ok(()) }

    // --- Action Handler ---

    /// Handle a custom domain-specific action
    fn handle_action(&mut self, action: Self::Action) -> Result<Self::ActionResult, String>;
}

/// Errors produced by the generic actor and its client.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FrameworkError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Item already exists: {0}")]
    AlreadyExists(String),
    #[error("Rejected: {0}")]
    Rejected(String),
    #[error("Actor closed")]
    ActorClosed,
    #[error("Actor dropped")]
    ActorDropped,
}

// =============================================================================
// 2. THE GENERIC MESSAGES
// =============================================================================

pub type Response<T> = oneshot::Sender<Result<T, FrameworkError>>;

#[derive(Debug)]
pub enum ResourceRequest<T: Entity> {
    Create {
        params: T::CreateParams,
        respond_to: Response<T::Id>,
    },
    Get {
        id: T::Id,
        respond_to: Response<Option<T>>,
    },
    List {
        respond_to: Response<Vec<T>>,
    },
    Update {
        id: T::Id,
        patch: T::Patch,
        respond_to: Response<T>,
    },
    Delete {
        id: T::Id,
        respond_to: Response<()>,
    },
    Action {
        id: T::Id,
        action: T::Action,
        respond_to: Response<T::ActionResult>,
    },
}

// =============================================================================
// 3. THE GENERIC ACTOR SERVER
// =============================================================================

pub struct ResourceActor<T: Entity> {
    receiver: mpsc::Receiver<ResourceRequest<T>>,
    store: BTreeMap<T::Id, T>,
    next_id_fn: Box<dyn Fn() -> T::Id + Send + Sync>,
}

impl<T: Entity> ResourceActor<T> {
    pub fn new(
        buffer_size: usize,
        next_id_fn: impl Fn() -> T::Id + Send + Sync + 'static,
    ) -> (Self, ResourceClient<T>) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let actor = Self {
            receiver,
            store: BTreeMap::new(),
            next_id_fn: Box::new(next_id_fn),
        };
        let client = ResourceClient::new(sender);
        (actor, client)
    }

    /// Serves requests until every client has been dropped.
    pub async fn run(mut self) {
        let entity = std::any::type_name::<T>();
        info!(entity, "ResourceActor starting");

        while let Some(msg) = self.receiver.recv().await {
            match msg {
                ResourceRequest::Create { params, respond_to } => {
                    let _ = respond_to.send(self.handle_create(params));
                }
                ResourceRequest::Get { id, respond_to } => {
                    let _ = respond_to.send(Ok(self.store.get(&id).cloned()));
                }
                ResourceRequest::List { respond_to } => {
                    let _ = respond_to.send(Ok(self.store.values().cloned().collect()));
                }
                ResourceRequest::Update { id, patch, respond_to } => {
                    let result = match self.store.get_mut(&id) {
                        Some(item) => item
                            .on_update(patch)
                            .map(|_| item.clone())
                            .map_err(FrameworkError::Rejected),
                        None => Err(FrameworkError::NotFound(id.to_string())),
                    };
                    let _ = respond_to.send(result);
                }
                ResourceRequest::Delete { id, respond_to } => {
                    let result = match self.store.get(&id) {
                        Some(item) => item.on_delete().map_err(FrameworkError::Rejected),
                        None => Err(FrameworkError::NotFound(id.to_string())),
                    };
                    if result.is_ok() {
                        self.store.remove(&id);
                    }
                    let _ = respond_to.send(result);
                }
                ResourceRequest::Action { id, action, respond_to } => {
                    let result = match self.store.get_mut(&id) {
                        Some(item) => item.handle_action(action).map_err(FrameworkError::Rejected),
                        None => Err(FrameworkError::NotFound(id.to_string())),
                    };
                    if let Err(e) = &result {
                        debug!(entity, error = %e, "Action failed");
                    }
                    let _ = respond_to.send(result);
                }
            }
        }

        info!(entity, "ResourceActor stopped");
    }

    fn handle_create(&mut self, params: T::CreateParams) -> Result<T::Id, FrameworkError> {
        let id = T::assigned_id(&params).unwrap_or_else(|| (self.next_id_fn)());
        if self.store.contains_key(&id) {
            warn!(id = %id, "Duplicate create rejected");
            return Err(FrameworkError::AlreadyExists(id.to_string()));
        }
        let mut item = T::from_create_params(id.clone(), params).map_err(FrameworkError::Rejected)?;
        item.on_create().map_err(FrameworkError::Rejected)?;
        self.store.insert(id.clone(), item);
        Ok(id)
    }
}

// =============================================================================
// 4. THE GENERIC CLIENT
// =============================================================================

#[derive(Clone)]
pub struct ResourceClient<T: Entity> {
    sender: mpsc::Sender<ResourceRequest<T>>,
}

impl<T: Entity> ResourceClient<T> {
    pub fn new(sender: mpsc::Sender<ResourceRequest<T>>) -> Self {
        Self { sender }
    }

    async fn request<R>(
        &self,
        build: impl FnOnce(Response<R>) -> ResourceRequest<T>,
    ) -> Result<R, FrameworkError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(build(respond_to))
            .await
            .map_err(|_| FrameworkError::ActorClosed)?;
        response.await.map_err(|_| FrameworkError::ActorDropped)?
    }

    pub async fn create(&self, params: T::CreateParams) -> Result<T::Id, FrameworkError> {
        self.request(|respond_to| ResourceRequest::Create { params, respond_to }).await
    }

    pub async fn get(&self, id: T::Id) -> Result<Option<T>, FrameworkError> {
        self.request(|respond_to| ResourceRequest::Get { id, respond_to }).await
    }

    pub async fn list(&self) -> Result<Vec<T>, FrameworkError> {
        self.request(|respond_to| ResourceRequest::List { respond_to }).await
    }

    pub async fn update(&self, id: T::Id, patch: T::Patch) -> Result<T, FrameworkError> {
        self.request(|respond_to| ResourceRequest::Update { id, patch, respond_to }).await
    }

    pub async fn delete(&self, id: T::Id) -> Result<(), FrameworkError> {
        self.request(|respond_to| ResourceRequest::Delete { id, respond_to }).await
    }

    pub async fn perform_action(&self, id: T::Id, action: T::Action) -> Result<T::ActionResult, FrameworkError> {
        self.request(|respond_to| ResourceRequest::Action { id, action, respond_to }).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    // --- Domain Definition ---

    #[derive(Clone, Debug, PartialEq)]
    struct Counter {
        id: String,
        label: String,
        value: u32,
    }

    #[derive(Debug)]
    struct CounterCreate {
        label: String,
        fixed_id: Option<String>,
    }

    #[derive(Debug)]
    enum CounterAction {
        Bump,
        Take(u32),
    }

    impl Entity for Counter {
        type Id = String;
        type CreateParams = CounterCreate;
        type Patch = String;
        type Action = CounterAction;
        type ActionResult = u32;

        fn id(&self) -> &String { &self.id }

        fn assigned_id(params: &CounterCreate) -> Option<String> {
            params.fixed_id.clone()
        }

        fn from_create_params(id: String, params: CounterCreate) -> Result<Self, String> {
            if params.label.is_empty() {
                return Err("label required".to_string());
            }
            Ok(Self { id, label: params.label, value: 0 })
        }

        fn on_update(&mut self, patch: String) -> Result<(), String> {
            self.label = patch;
            Ok(())
        }

        fn handle_action(&mut self, action: CounterAction) -> Result<u32, String> {
            match action {
                CounterAction::Bump => {
                    self.value += 1;
                    Ok(self.value)
                }
                CounterAction::Take(n) if n <= self.value => {
                    self.value -= n;
                    Ok(self.value)
                }
                CounterAction::Take(n) => Err(format!("only {} left, {} requested", self.value, n)),
            }
        }
    }

    fn spawn_counters() -> ResourceClient<Counter> {
        let counter = Arc::new(AtomicU64::new(1));
        let next_id = move || format!("counter_{}", counter.fetch_add(1, Ordering::SeqCst));
        let (actor, client) = ResourceActor::new(10, next_id);
        tokio::spawn(actor.run());
        client
    }

    fn params(label: &str) -> CounterCreate {
        CounterCreate { label: label.into(), fixed_id: None }
    }

    #[tokio::test]
    async fn test_resource_actor_with_actions() {
        let client = spawn_counters();

        let id = client.create(params("donuts")).await.unwrap();
        assert_eq!(id, "counter_1");

        assert_eq!(client.perform_action(id.clone(), CounterAction::Bump).await, Ok(1));
        assert_eq!(client.perform_action(id.clone(), CounterAction::Bump).await, Ok(2));
        assert!(matches!(
            client.perform_action(id.clone(), CounterAction::Take(5)).await,
            Err(FrameworkError::Rejected(_))
        ));

        let stored = client.get(id).await.unwrap().unwrap();
        assert_eq!(stored.value, 2);
    }

    #[tokio::test]
    async fn test_assigned_ids_and_duplicates() {
        let client = spawn_counters();

        let fixed = CounterCreate { label: "glazed".into(), fixed_id: Some("glazed".into()) };
        assert_eq!(client.create(fixed).await, Ok("glazed".to_string()));

        let again = CounterCreate { label: "glazed".into(), fixed_id: Some("glazed".into()) };
        assert_eq!(
            client.create(again).await,
            Err(FrameworkError::AlreadyExists("glazed".to_string()))
        );

        client.create(params("sprinkles")).await.unwrap();
        let ids: Vec<String> = client.list().await.unwrap().into_iter().map(|c| c.id).collect();
        assert_eq!(ids, vec!["counter_1".to_string(), "glazed".to_string()]);
    }

    #[tokio::test]
    async fn test_missing_items_and_rejected_creates() {
        let client = spawn_counters();

        assert_eq!(client.get("nope".into()).await, Ok(None));
        assert_eq!(
            client.update("nope".into(), "x".into()).await,
            Err(FrameworkError::NotFound("nope".to_string()))
        );
        assert!(matches!(client.create(params("")).await, Err(FrameworkError::Rejected(_))));

        let id = client.create(params("a")).await.unwrap();
        client.delete(id.clone()).await.unwrap();
        assert_eq!(client.get(id).await, Ok(None));
    }
}
