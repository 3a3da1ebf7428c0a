//! Emitter trait - dispatcher output boundary
//!
//! The dispatcher hands every released item to an [`Emitter`]. Emission is
//! fire-and-forget: the implementation must not block the release path, so
//! anything slow behind it (file IO, sockets) belongs in its own queue.

use std::sync::Arc;

/// Receives released items from a dispatcher
pub trait Emitter<T>: Send + Sync {
    /// Hand one item downstream
    fn emit(&self, item: T);
}

impl<T, E> Emitter<T> for Arc<E>
where
    E: Emitter<T> + ?Sized,
{
    fn emit(&self, item: T) {
        (**self).emit(item)
    }
}
