//! Change notifications for the host

use std::fmt;

/// Events the navigation controls emit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlsEvent {
    /// The camera moved; the host should render again
    Change,
    /// A gesture began
    ChangeStart,
    /// A gesture ended
    ChangeEnd,
}

/// Identifies a registered listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Box<dyn FnMut()>;

/// Synchronous listener list, dispatched in registration order
#[derive(Default)]
pub struct EventDispatcher {
    listeners: Vec<(ListenerId, ControlsEvent, Listener)>,
    next_id: u64,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_listener(&mut self, event: ControlsEvent, listener: impl FnMut() + 'static) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, event, Box::new(listener)));
        id
    }

    /// Returns whether a listener was removed
    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener, _, _)| *listener != id);
        self.listeners.len() != before
    }

    pub fn dispatch(&mut self, event: ControlsEvent) {
        for (_, kind, listener) in self.listeners.iter_mut() {
            if *kind == event {
                listener();
            }
        }
    }

    pub fn clear(&mut self) {
        self.listeners.clear();
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
