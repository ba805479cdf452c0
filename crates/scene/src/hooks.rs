use keystone_common::Entity;
use std::cell::RefCell;
use std::rc::Weak;

/// Transform lifecycle notification emitted by the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformEvent {
    Added(Entity),
    Removed(Entity),
    /// Local transform or parent edge changed.
    Modified(Entity),
}

impl TransformEvent {
    pub fn entity(&self) -> Entity {
        match self {
            Self::Added(e) | Self::Removed(e) | Self::Modified(e) => *e,
        }
    }
}

pub(crate) type TransformHook = Box<dyn FnMut(Entity)>;

/// Events waiting to be drained by a subscriber.
pub(crate) type EventQueue = RefCell<Vec<TransformEvent>>;

/// Registered listeners, invoked in registration order.
///
/// Queue subscribers are held weakly and dropped once their owner is gone.
#[derive(Default)]
pub(crate) struct TransformHooks {
    added: Vec<TransformHook>,
    removed: Vec<TransformHook>,
    modified: Vec<TransformHook>,
    queues: Vec<Weak<EventQueue>>,
}

impl TransformHooks {
    pub(crate) fn on_added(&mut self, hook: TransformHook) {
        self.added.push(hook);
    }

    pub(crate) fn on_removed(&mut self, hook: TransformHook) {
        self.removed.push(hook);
    }

    pub(crate) fn on_modified(&mut self, hook: TransformHook) {
        self.modified.push(hook);
    }

    /// Receive every event on `queue` for as long as it is alive.
    pub(crate) fn subscribe_queue(&mut self, queue: Weak<EventQueue>) {
        self.queues.retain(|q| q.strong_count() > 0);
        self.queues.push(queue);
    }

    pub(crate) fn notify(&mut self, event: TransformEvent) {
        self.queues.retain(|queue| match queue.upgrade() {
            Some(queue) => {
                queue.borrow_mut().push(event);
                true
            }
            None => false,
        });

        let hooks = match event {
            TransformEvent::Added(_) => &mut self.added,
            TransformEvent::Removed(_) => &mut self.removed,
            TransformEvent::Modified(_) => &mut self.modified,
        };
        let entity = event.entity();
        for hook in hooks.iter_mut() {
            hook(entity);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.added.len() + self.removed.len() + self.modified.len() + self.queues.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    #[test]
    fn notify_routes_by_kind() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut hooks = TransformHooks::default();
        let sink = seen.clone();
        hooks.on_removed(Box::new(move |e| sink.borrow_mut().push(e)));

        let e = Entity::new(1, 0);
        hooks.notify(TransformEvent::Added(e));
        hooks.notify(TransformEvent::Modified(e));
        assert!(seen.borrow().is_empty());

        hooks.notify(TransformEvent::Removed(e));
        assert_eq!(*seen.borrow(), vec![e]);
        assert_eq!(hooks.len(), 1);
    }

    #[test]
    fn queues_receive_every_kind_until_dropped() {
        let mut hooks = TransformHooks::default();
        let queue: Rc<EventQueue> = Rc::default();
        hooks.subscribe_queue(Rc::downgrade(&queue));

        let e = Entity::new(2, 1);
        hooks.notify(TransformEvent::Added(e));
        hooks.notify(TransformEvent::Modified(e));
        assert_eq!(
            *queue.borrow(),
            vec![TransformEvent::Added(e), TransformEvent::Modified(e)]
        );
        assert_eq!(hooks.len(), 1);

        drop(queue);
        hooks.notify(TransformEvent::Removed(e));
        assert_eq!(hooks.len(), 0);
    }

    #[test]
    fn subscribing_prunes_dead_queues() {
        let mut hooks = TransformHooks::default();
        for _ in 0..5 {
            let queue: Rc<EventQueue> = Rc::default();
            hooks.subscribe_queue(Rc::downgrade(&queue));
        }
        let live: Rc<EventQueue> = Rc::default();
        hooks.subscribe_queue(Rc::downgrade(&live));
        assert_eq!(hooks.len(), 1);
    }
}
