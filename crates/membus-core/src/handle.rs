//! Single-use subscription handles.

use std::fmt;
use std::sync::{Mutex, PoisonError};

use crate::registry::EntryId;

type Unsubscribe = Box<dyn FnOnce() + Send>;

/// Token returned by every subscribe/respond call.
///
/// [`dispose`](Self::dispose) removes the registered entry. It is safe to call
/// any number of times, from any thread, and after the bus itself has been
/// disposed or dropped. Dropping the handle without disposing it leaves the
/// entry registered.
pub struct SubscriptionHandle {
    id: EntryId,
    unsubscribe: Mutex<Option<Unsubscribe>>,
}

impl SubscriptionHandle {
    pub(crate) fn new(id: EntryId, unsubscribe: impl FnOnce() + Send + 'static) -> Self {
        Self {
            id,
            unsubscribe: Mutex::new(Some(Box::new(unsubscribe))),
        }
    }

    /// Id of the entry this handle controls.
    pub fn id(&self) -> EntryId {
        self.id
    }

    /// Unregister the entry. Only the first call has an effect.
    pub fn dispose(&self) {
        let unsubscribe = self
            .unsubscribe
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(unsubscribe) = unsubscribe {
            unsubscribe();
        }
    }

    /// Whether [`dispose`](Self::dispose) has already run.
    pub fn is_disposed(&self) -> bool {
        self.unsubscribe
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }
}

impl fmt::Debug for SubscriptionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionHandle")
            .field("id", &self.id)
            .field("disposed", &self.is_disposed())
            .finish()
    }
}
