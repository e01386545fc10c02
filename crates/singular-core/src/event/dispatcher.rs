use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::event::{AsyncEventHandler, Event, EventId, EventResult};

// This type represents an owned future that returns EventResult
pub type BoxFuture<'a> = Pin<Box<dyn Future<Output = EventResult> + Send + 'a>>;

/// Handler subscribed by event name
pub type NameHandlerFn = Box<dyn Fn(&dyn Event) -> BoxFuture<'_> + Send + Sync>;
/// Handler subscribed by event type
pub type TypedHandlerFn<E> = Box<dyn Fn(&E) -> BoxFuture<'_> + Send + Sync>;

//--------------------------------------------------
// EventDispatcher (Internal, wrapped by SharedEventDispatcher)
//--------------------------------------------------

/// Event dispatcher holding name and type handlers
pub struct EventDispatcher {
    handlers: HashMap<&'static str, Vec<(EventId, Box<dyn AsyncEventHandler>)>>,
    type_handlers: HashMap<TypeId, Vec<(EventId, Box<dyn AsyncEventHandler>)>>,
    next_handler_id: EventId,
}

impl fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("name_handlers_count", &self.handler_count_by_name())
            .field("type_handlers_count", &self.handler_count_by_type())
            .field("next_handler_id", &self.next_handler_id)
            .finish()
    }
}

/// Handler for events with a specific name
struct SimpleHandler {
    handler: NameHandlerFn,
}

#[async_trait]
impl AsyncEventHandler for SimpleHandler {
    async fn handle(&self, event: &dyn Event) -> EventResult {
        (self.handler)(event).await
    }
}

/// Handler for typed events that will check the type
struct TypedEventHandler<E: Event + 'static> {
    handler: TypedHandlerFn<E>,
}

#[async_trait]
impl<E: Event + 'static> AsyncEventHandler for TypedEventHandler<E> {
    async fn handle(&self, event: &dyn Event) -> EventResult {
        match event.as_any().downcast_ref::<E>() {
            Some(e) => (self.handler)(e).await,
            None => EventResult::Continue,
        }
    }
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
            type_handlers: HashMap::new(),
            next_handler_id: 1,
        }
    }

    fn next_id(&mut self) -> EventId {
        let id = self.next_handler_id;
        self.next_handler_id += 1;
        id
    }

    pub fn register_handler(&mut self, event_name: &'static str, handler: NameHandlerFn) -> EventId {
        let id = self.next_id();
        self.handlers
            .entry(event_name)
            .or_default()
            .push((id, Box::new(SimpleHandler { handler })));
        id
    }

    pub fn register_type_handler<E: Event + 'static>(&mut self, handler: TypedHandlerFn<E>) -> EventId {
        let id = self.next_id();
        self.type_handlers
            .entry(TypeId::of::<E>())
            .or_default()
            .push((id, Box::new(TypedEventHandler { handler })));
        id
    }

    pub fn unregister_handler(&mut self, id: EventId) -> bool {
        let mut found = false;
        for handlers in self.handlers.values_mut().chain(self.type_handlers.values_mut()) {
            let len_before = handlers.len();
            handlers.retain(|(h_id, _)| *h_id != id);
            found |= handlers.len() < len_before;
        }
        found
    }

    fn handler_count_by_name(&self) -> usize {
        self.handlers.values().map(Vec::len).sum()
    }

    fn handler_count_by_type(&self) -> usize {
        self.type_handlers.values().map(Vec::len).sum()
    }

    /// Total number of registered handlers
    pub fn handler_count(&self) -> usize {
        self.handler_count_by_name() + self.handler_count_by_type()
    }

    /// Run name handlers, then type handlers, until one returns `Stop`
    pub async fn dispatch_internal(&self, event: &dyn Event) -> EventResult {
        let by_name = self.handlers.get(event.name()).into_iter().flatten();
        let by_type = self
            .type_handlers
            .get(&event.as_any().type_id())
            .into_iter()
            .flatten();

        for (_, handler) in by_name.chain(by_type) {
            if handler.handle(event).await == EventResult::Stop {
                return EventResult::Stop;
            }
        }
        EventResult::Continue
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

//--------------------------------------------------
// SharedEventDispatcher (Public API)
//--------------------------------------------------

/// Thread-safe shared event dispatcher using Tokio Mutex
#[derive(Clone, Default)]
pub struct SharedEventDispatcher {
    dispatcher: Arc<Mutex<EventDispatcher>>,
}

impl fmt::Debug for SharedEventDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedEventDispatcher").finish_non_exhaustive()
    }
}

impl SharedEventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn dispatch(&self, event: &dyn Event) -> EventResult {
        let dispatcher = self.dispatcher.lock().await;
        dispatcher.dispatch_internal(event).await
    }

    pub async fn register_handler(&self, event_name: &'static str, handler: NameHandlerFn) -> EventId {
        let mut dispatcher = self.dispatcher.lock().await;
        dispatcher.register_handler(event_name, handler)
    }

    pub async fn register_type_handler<E: Event + 'static>(&self, handler: TypedHandlerFn<E>) -> EventId {
        let mut dispatcher = self.dispatcher.lock().await;
        dispatcher.register_type_handler::<E>(handler)
    }

    pub async fn unregister_handler(&self, id: EventId) -> bool {
        let mut dispatcher = self.dispatcher.lock().await;
        dispatcher.unregister_handler(id)
    }

    pub async fn handler_count(&self) -> usize {
        self.dispatcher.lock().await.handler_count()
    }
}

//--------------------------------------------------
// Helper Functions
//--------------------------------------------------

/// Wrap a synchronous name handler for the async dispatcher
pub fn sync_event_handler<F>(f: F) -> NameHandlerFn
where
    F: Fn(&dyn Event) -> EventResult + Send + Sync + 'static,
{
    Box::new(move |event| {
        let result = f(event);
        Box::pin(async move { result })
    })
}

/// Wrap a synchronous typed handler for the async dispatcher
pub fn sync_typed_handler<E, F>(f: F) -> TypedHandlerFn<E>
where
    E: Event + 'static,
    F: Fn(&E) -> EventResult + Send + Sync + 'static,
{
    Box::new(move |event| {
        let result = f(event);
        Box::pin(async move { result })
    })
}
