use std::sync::{Arc, Mutex, PoisonError};

/// Single-initialization slot for an expensive, shareable service.
///
/// The first successful `get_or_try_init` constructs the value while holding
/// the lock, so concurrent first users cannot both build it. A failed
/// construction stores nothing and the next caller tries again.
pub struct SharedModel<T: ?Sized> {
    slot: Mutex<Option<Arc<T>>>,
}

impl<T: ?Sized> SharedModel<T> {
    pub const fn new() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }

    pub fn get_or_try_init<E>(
        &self,
        init: impl FnOnce() -> Result<Arc<T>, E>,
    ) -> Result<Arc<T>, E> {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(model) = slot.as_ref() {
            return Ok(Arc::clone(model));
        }
        let model = init()?;
        *slot = Some(Arc::clone(&model));
        Ok(model)
    }

    pub fn get(&self) -> Option<Arc<T>> {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(Arc::clone)
    }
}

impl<T: ?Sized> Default for SharedModel<T> {
    fn default() -> Self {
        Self::new()
    }
}
