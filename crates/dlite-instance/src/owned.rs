//! RAII ownership of one instance reference.

use std::fmt;
use std::ops::Deref;
use std::rc::Rc;

use crate::traits::{Instance, InstanceRef};

/// One owned reference count on an instance.
///
/// Dropping the guard releases the reference. [`into_inner`] hands the
/// reference on to a new owner (for example a collection) without
/// releasing it.
///
/// [`into_inner`]: OwnedInstance::into_inner
pub struct OwnedInstance {
    inner: Option<InstanceRef>,
}

impl OwnedInstance {
    /// Take over a reference the caller already owns. No incref.
    pub fn adopt(instance: InstanceRef) -> Self {
        Self {
            inner: Some(instance),
        }
    }

    /// Take a new reference on `instance`.
    pub fn acquire(instance: &InstanceRef) -> Self {
        instance.incref();
        Self::adopt(Rc::clone(instance))
    }

    /// The underlying handle.
    pub fn handle(&self) -> &InstanceRef {
        match &self.inner {
            Some(instance) => instance,
            None => unreachable!("OwnedInstance is only emptied when consumed"),
        }
    }

    /// Hand the reference on without releasing it.
    pub fn into_inner(mut self) -> InstanceRef {
        match self.inner.take() {
            Some(instance) => instance,
            None => unreachable!("OwnedInstance is only emptied when consumed"),
        }
    }

    /// Release the reference and keep a borrowed handle.
    pub fn into_borrowed(self) -> InstanceRef {
        let instance = Rc::clone(self.handle());
        drop(self);
        instance
    }
}

impl Deref for OwnedInstance {
    type Target = dyn Instance;

    fn deref(&self) -> &Self::Target {
        &**self.handle()
    }
}

impl Drop for OwnedInstance {
    fn drop(&mut self) {
        if let Some(instance) = self.inner.take() {
            instance.decref();
        }
    }
}

impl fmt::Debug for OwnedInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner {
            Some(instance) => f
                .debug_struct("OwnedInstance")
                .field("uuid", &instance.uuid())
                .field("refcount", &instance.refcount())
                .finish(),
            None => f.write_str("OwnedInstance(<released>)"),
        }
    }
}
