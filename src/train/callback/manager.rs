//! Callback manager for dispatching events to multiple callbacks

use super::traits::{CallbackAction, CallbackContext, TrainerCallback};

/// Manages multiple callbacks and dispatches events
#[derive(Default)]
pub struct CallbackManager {
    callbacks: Vec<Box<dyn TrainerCallback>>,
}

impl CallbackManager {
    /// Create new callback manager
    pub fn new() -> Self {
        Self { callbacks: Vec::new() }
    }

    /// Add a callback
    pub fn add<C: TrainerCallback + 'static>(&mut self, callback: C) {
        self.callbacks.push(Box::new(callback));
    }

    /// Check if no callbacks are registered
    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }

    /// Get number of callbacks
    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    /// Fire train begin event
    pub fn on_train_begin(&mut self, ctx: &CallbackContext) -> CallbackAction {
        for cb in &mut self.callbacks {
            if cb.on_train_begin(ctx) == CallbackAction::Stop {
                tracing::info!(callback = cb.name(), "stop requested before training");
                return CallbackAction::Stop;
            }
        }
        CallbackAction::Continue
    }

    /// Fire train end event
    pub fn on_train_end(&mut self, ctx: &CallbackContext) {
        for cb in &mut self.callbacks {
            cb.on_train_end(ctx);
        }
    }

    /// Fire epoch begin event; the first non-continue action wins.
    pub fn on_epoch_begin(&mut self, ctx: &CallbackContext) -> CallbackAction {
        for cb in &mut self.callbacks {
            match cb.on_epoch_begin(ctx) {
                CallbackAction::Continue => {}
                action => {
                    tracing::debug!(callback = cb.name(), ?action, "epoch begin action");
                    return action;
                }
            }
        }
        CallbackAction::Continue
    }

    /// Fire epoch end event
    pub fn on_epoch_end(&mut self, ctx: &CallbackContext) -> CallbackAction {
        let mut action = CallbackAction::Continue;
        for cb in &mut self.callbacks {
            if cb.on_epoch_end(ctx) == CallbackAction::Stop {
                action = CallbackAction::Stop;
            }
        }
        action
    }

    /// Fire step end event
    pub fn on_step_end(&mut self, ctx: &CallbackContext) {
        for cb in &mut self.callbacks {
            cb.on_step_end(ctx);
        }
    }

    /// Fire validation event
    pub fn on_validation(&mut self, ctx: &CallbackContext) {
        for cb in &mut self.callbacks {
            cb.on_validation(ctx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    struct Fixed(CallbackAction);
    impl TrainerCallback for Fixed {
        fn on_train_begin(&mut self, _: &CallbackContext) -> CallbackAction {
            self.0
        }
        fn on_epoch_begin(&mut self, _: &CallbackContext) -> CallbackAction {
            self.0
        }
        fn on_epoch_end(&mut self, _: &CallbackContext) -> CallbackAction {
            self.0
        }
    }

    struct Counter(Rc<Cell<usize>>);
    impl TrainerCallback for Counter {
        fn on_epoch_end(&mut self, _: &CallbackContext) -> CallbackAction {
            self.0.set(self.0.get() + 1);
            CallbackAction::Continue
        }
        fn on_train_end(&mut self, _: &CallbackContext) {
            self.0.set(self.0.get() + 100);
        }
    }

    #[test]
    fn test_callback_manager_len_and_empty() {
        let mut manager = CallbackManager::new();
        assert!(manager.is_empty());
        manager.add(Fixed(CallbackAction::Continue));
        assert_eq!(manager.len(), 1);
    }

    #[test]
    fn test_epoch_begin_skip_propagates() {
        let mut manager = CallbackManager::new();
        manager.add(Fixed(CallbackAction::Continue));
        manager.add(Fixed(CallbackAction::SkipEpoch));
        assert_eq!(manager.on_epoch_begin(&CallbackContext::default()), CallbackAction::SkipEpoch);
    }

    #[test]
    fn test_train_begin_stop() {
        let mut manager = CallbackManager::new();
        manager.add(Fixed(CallbackAction::Stop));
        assert_eq!(manager.on_train_begin(&CallbackContext::default()), CallbackAction::Stop);
    }

    #[test]
    fn test_epoch_end_reaches_every_callback() {
        let count = Rc::new(Cell::new(0));
        let mut manager = CallbackManager::new();
        manager.add(Fixed(CallbackAction::Stop));
        manager.add(Counter(count.clone()));

        let ctx = CallbackContext::default();
        assert_eq!(manager.on_epoch_end(&ctx), CallbackAction::Stop);
        assert_eq!(count.get(), 1);
        manager.on_train_end(&ctx);
        assert_eq!(count.get(), 101);
    }
}
