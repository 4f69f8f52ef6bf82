//! The event dispatcher
//!
//! [`Dispatcher`] owns a registry mapping each [`EventType`] to the ordered
//! bindings registered for it. Registration, removal and emission are all
//! async so that meta-events (`newListener`, `removeListener`) and async
//! listeners can be awaited in order.
//!
//! Emission works on a snapshot: the bindings for an event are copied when the
//! emission starts and one-shot bindings are dropped from the live registry at
//! the same moment. Listeners may re-enter the dispatcher freely; whatever they
//! register or remove only affects later emissions.

use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use futures::future::try_join_all;
use indexmap::map::Entry;
use indexmap::IndexMap;

use crate::config::EmitterConfig;
use crate::error::{Error, Result};
use crate::event::{EventType, Payload};
use crate::filter::ResultFilter;
use crate::listener::Listener;

/// One registered listener
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    listener: Listener,
    once: bool,
}

impl Binding {
    /// The registered listener
    pub fn listener(&self) -> &Listener {
        &self.listener
    }

    /// Whether the binding is dropped by the next emission of its event
    pub fn is_once(&self) -> bool {
        self.once
    }
}

type Registry = IndexMap<EventType, Vec<Binding>>;

struct State {
    /// `None` until the first registration, and again after a full clear
    registry: Option<Registry>,
    /// Always equal to the number of keys in `registry`
    type_count: usize,
    max_listeners: usize,
    leak_warned: HashSet<EventType>,
    result_filter: ResultFilter,
}

impl State {
    fn new(config: EmitterConfig) -> Self {
        Self {
            registry: None,
            type_count: 0,
            max_listeners: config.max_listeners,
            leak_warned: HashSet::new(),
            result_filter: config.result_filter,
        }
    }

    fn bindings(&self, event: &EventType) -> Option<&Vec<Binding>> {
        self.registry.as_ref()?.get(event)
    }

    fn insert(&mut self, event: &EventType, binding: Binding, prepend: bool) -> usize {
        let registry = self.registry.get_or_insert_with(Registry::default);
        let count = match registry.entry(event.clone()) {
            Entry::Occupied(mut entry) => {
                let bindings = entry.get_mut();
                if prepend {
                    bindings.insert(0, binding);
                } else {
                    bindings.push(binding);
                }
                bindings.len()
            }
            Entry::Vacant(entry) => {
                entry.insert(vec![binding]);
                self.type_count += 1;
                1
            }
        };

        if self.max_listeners > 0
            && count > self.max_listeners
            && self.leak_warned.insert(event.clone())
        {
            tracing::warn!(
                event = %event,
                count,
                max = self.max_listeners,
                "possible listener leak detected, use set_max_listeners to raise the limit"
            );
        }

        count
    }

    /// Remove the first binding of `listener` for `event`
    fn detach(&mut self, event: &EventType, listener: &Listener) -> bool {
        let Some(registry) = self.registry.as_mut() else {
            return false;
        };
        let Some(bindings) = registry.get_mut(event) else {
            return false;
        };
        let Some(index) = bindings.iter().position(|b| b.listener == *listener) else {
            return false;
        };

        bindings.remove(index);
        if bindings.is_empty() {
            registry.shift_remove(event);
            self.type_count -= 1;
            self.leak_warned.remove(event);
        }
        true
    }

    /// Copy the listeners for an emission and drop its one-shot bindings
    fn take_snapshot(&mut self, event: &EventType) -> Option<Vec<Listener>> {
        let registry = self.registry.as_mut()?;
        let bindings = registry.get_mut(event)?;
        let snapshot = bindings.iter().map(|b| b.listener.clone()).collect();

        bindings.retain(|b| !b.once);
        if bindings.is_empty() {
            registry.shift_remove(event);
            self.type_count -= 1;
            self.leak_warned.remove(event);
        }
        Some(snapshot)
    }

    fn remove_type(&mut self, event: &EventType) {
        let removed = self
            .registry
            .as_mut()
            .and_then(|registry| registry.shift_remove(event));
        if removed.is_some() {
            self.type_count -= 1;
        }
        self.leak_warned.remove(event);
    }

    fn clear(&mut self) {
        self.registry = None;
        self.type_count = 0;
        self.leak_warned.clear();
    }
}

/// Async event dispatcher
///
/// Cloning is cheap and every clone shares the same registry. A listener that
/// needs to re-enter its own dispatcher should capture a [`WeakDispatcher`]
/// from [`downgrade`](Self::downgrade); a captured strong clone keeps the
/// registry alive through the listener it is stored in.
#[derive(Clone)]
pub struct Dispatcher {
    state: Arc<Mutex<State>>,
}

/// Non-owning handle to a [`Dispatcher`]
#[derive(Clone)]
pub struct WeakDispatcher {
    state: Weak<Mutex<State>>,
}

impl WeakDispatcher {
    /// The dispatcher, if any strong handle is still alive
    pub fn upgrade(&self) -> Option<Dispatcher> {
        self.state.upgrade().map(|state| Dispatcher { state })
    }
}

impl fmt::Debug for WeakDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakDispatcher")
            .field("alive", &(self.state.strong_count() > 0))
            .finish()
    }
}

impl Dispatcher {
    /// Create a dispatcher with default configuration
    pub fn new() -> Self {
        Self::with_config(EmitterConfig::default())
    }

    /// Create a dispatcher from `config`
    pub fn with_config(config: EmitterConfig) -> Self {
        Self {
            state: Arc::new(Mutex::new(State::new(config))),
        }
    }

    /// Non-owning handle for listeners that call back into this dispatcher
    pub fn downgrade(&self) -> WeakDispatcher {
        WeakDispatcher {
            state: Arc::downgrade(&self.state),
        }
    }

    // Never held across an await.
    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn has_listeners(&self, event: &EventType) -> bool {
        self.state().bindings(event).is_some()
    }

    /// Append a listener for `event`
    ///
    /// Existing `newListener` listeners are notified with `(event, listener)`
    /// and awaited before the listener becomes visible.
    pub async fn add_listener<E: Into<EventType>>(&self, event: E, listener: Listener) -> Result<()> {
        self.register(event.into(), listener, false, false).await
    }

    /// Alias of [`add_listener`](Self::add_listener)
    pub async fn on<E: Into<EventType>>(&self, event: E, listener: Listener) -> Result<()> {
        self.register(event.into(), listener, false, false).await
    }

    /// Append a listener that is removed by the next emission of `event`
    pub async fn once<E: Into<EventType>>(&self, event: E, listener: Listener) -> Result<()> {
        self.register(event.into(), listener, true, false).await
    }

    /// Insert a listener at the front of the sequence for `event`
    pub async fn prepend_listener<E: Into<EventType>>(
        &self,
        event: E,
        listener: Listener,
    ) -> Result<()> {
        self.register(event.into(), listener, false, true).await
    }

    /// Insert a one-shot listener at the front of the sequence for `event`
    pub async fn prepend_once_listener<E: Into<EventType>>(
        &self,
        event: E,
        listener: Listener,
    ) -> Result<()> {
        self.register(event.into(), listener, true, true).await
    }

    async fn register(
        &self,
        event: EventType,
        listener: Listener,
        once: bool,
        prepend: bool,
    ) -> Result<()> {
        if self.has_listeners(&EventType::NEW_LISTENER) {
            let args = vec![
                Payload::Event(event.clone()),
                Payload::Listener(listener.clone()),
            ];
            self.emit(EventType::NEW_LISTENER, args).await?;
        }

        let count = self.state().insert(&event, Binding { listener, once }, prepend);
        tracing::trace!(event = %event, count, once, prepend, "listener added");
        Ok(())
    }

    /// Remove the first binding of `listener` for `event`
    ///
    /// Does nothing when the listener is not registered. Otherwise the
    /// remaining `removeListener` listeners are notified with
    /// `(event, listener)` and awaited.
    pub async fn remove_listener<E: Into<EventType>>(
        &self,
        event: E,
        listener: &Listener,
    ) -> Result<()> {
        let event = event.into();
        let removed = self.state().detach(&event, listener);
        if !removed {
            return Ok(());
        }
        tracing::trace!(event = %event, "listener removed");

        if self.has_listeners(&EventType::REMOVE_LISTENER) {
            let args = vec![Payload::Event(event), Payload::Listener(listener.clone())];
            self.emit(EventType::REMOVE_LISTENER, args).await?;
        }
        Ok(())
    }

    /// Alias of [`remove_listener`](Self::remove_listener)
    pub async fn off<E: Into<EventType>>(&self, event: E, listener: &Listener) -> Result<()> {
        self.remove_listener(event, listener).await
    }

    /// Remove every listener for `event`, or for all events when `None`
    ///
    /// When `removeListener` listeners exist, listeners are removed one at a
    /// time, most recent first, so each removal is announced. The
    /// `removeListener` listeners themselves go last.
    pub async fn remove_all_listeners(&self, event: Option<EventType>) -> Result<()> {
        if !self.has_listeners(&EventType::REMOVE_LISTENER) {
            let mut state = self.state();
            match &event {
                Some(event) => state.remove_type(event),
                None => state.clear(),
            }
            return Ok(());
        }

        match event {
            Some(event) => self.remove_each(event).await,
            None => {
                for event in self.event_names() {
                    if event != EventType::REMOVE_LISTENER {
                        self.remove_each(event).await?;
                    }
                }
                self.remove_each(EventType::REMOVE_LISTENER).await
            }
        }
    }

    async fn remove_each(&self, event: EventType) -> Result<()> {
        for listener in self.listeners(&event).iter().rev() {
            self.remove_listener(&event, listener).await?;
        }
        Ok(())
    }

    /// Emit `event` to its listeners and collect their filtered results
    ///
    /// Results are ordered by registration, not by completion. The first
    /// listener failure fails the whole emission and abandons the listeners
    /// still running. Emitting `"error"` with nobody listening fails with the
    /// error argument, or with a generic unhandled-error message.
    pub async fn emit<E: Into<EventType>>(
        &self,
        event: E,
        args: Vec<Payload>,
    ) -> Result<Vec<Option<Payload>>> {
        let event = event.into();
        let snapshot = self.state().take_snapshot(&event);

        let Some(listeners) = snapshot else {
            if event == EventType::ERROR {
                tracing::debug!(args = args.len(), "unhandled 'error' event");
                return Err(unhandled(args));
            }
            tracing::trace!(event = %event, "no listeners");
            return Ok(Vec::new());
        };

        tracing::trace!(
            event = %event,
            listeners = listeners.len(),
            args = args.len(),
            "emitting"
        );

        let pending = listeners.iter().map(|listener| listener.call(args.clone()));
        let results = try_join_all(pending)
            .await
            .map_err(|source| Error::listener(event.clone(), source))?;

        let filter = self.state().result_filter.clone();
        Ok(filter.apply(results))
    }

    /// Number of listeners registered for `event`
    pub fn listener_count<E: Into<EventType>>(&self, event: E) -> usize {
        self.state()
            .bindings(&event.into())
            .map_or(0, Vec::len)
    }

    /// Number of listeners registered for `event` on `dispatcher`
    pub fn listener_count_of<E: Into<EventType>>(dispatcher: &Dispatcher, event: E) -> usize {
        dispatcher.listener_count(event)
    }

    /// Copy of the listeners registered for `event`, in invocation order
    pub fn listeners<E: Into<EventType>>(&self, event: E) -> Vec<Listener> {
        self.state()
            .bindings(&event.into())
            .map(|bindings| bindings.iter().map(|b| b.listener.clone()).collect())
            .unwrap_or_default()
    }

    /// Copy of the bindings registered for `event`, one-shot flags included
    pub fn raw_listeners<E: Into<EventType>>(&self, event: E) -> Vec<Binding> {
        self.state()
            .bindings(&event.into())
            .cloned()
            .unwrap_or_default()
    }

    /// Event types currently holding listeners, in first registration order
    pub fn event_names(&self) -> Vec<EventType> {
        self.state()
            .registry
            .as_ref()
            .map(|registry| registry.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of event types currently holding listeners
    pub fn type_count(&self) -> usize {
        self.state().type_count
    }

    /// Current leak warning threshold
    pub fn max_listeners(&self) -> usize {
        self.state().max_listeners
    }

    /// Set the leak warning threshold; `0` disables the warning
    pub fn set_max_listeners(&self, max: usize) {
        self.state().max_listeners = max;
    }

    /// Replace the result filter
    ///
    /// Accepts a [`ResultFilter`], or a dynamic value where `null` disables
    /// filtering and anything else fails with [`Error::InvalidFilter`].
    pub fn set_result_filter<F>(&self, filter: F) -> Result<()>
    where
        F: TryInto<ResultFilter>,
        Error: From<F::Error>,
    {
        let filter = filter.try_into()?;
        self.state().result_filter = filter;
        Ok(())
    }

    /// Filter applied to emission results
    pub fn result_filter(&self) -> ResultFilter {
        self.state().result_filter.clone()
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state();
        f.debug_struct("Dispatcher")
            .field("type_count", &state.type_count)
            .field("max_listeners", &state.max_listeners)
            .field("result_filter", &state.result_filter)
            .finish()
    }
}

fn unhandled(args: Vec<Payload>) -> Error {
    match args.into_iter().next() {
        Some(Payload::Error(err)) => Error::Emitted(err),
        Some(arg) => Error::unspecified(Some(arg.to_string())),
        None => Error::unspecified(None::<String>),
    }
}
