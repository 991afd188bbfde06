use std::ops::{Deref, DerefMut};

use crate::{foundation::error::KitResult, host::api::TimelineHost};

/// Restores the host's time cursor when dropped.
///
/// The cursor is captured on construction; every exit path (normal return, `?`, unwinding) puts it
/// back. Derefs to the host so work can continue through the guard.
pub struct CursorGuard<'h, H: TimelineHost + ?Sized> {
    host: &'h mut H,
    saved: f64,
}

impl<'h, H: TimelineHost + ?Sized> CursorGuard<'h, H> {
    pub fn new(host: &'h mut H) -> KitResult<Self> {
        let saved = host.current_time()?;
        Ok(Self { host, saved })
    }

    /// Time the cursor will be restored to.
    pub fn saved_time(&self) -> f64 {
        self.saved
    }

    pub fn seek(&mut self, time: f64) -> KitResult<()> {
        self.host.set_current_time(time)
    }
}

impl<H: TimelineHost + ?Sized> Deref for CursorGuard<'_, H> {
    type Target = H;

    fn deref(&self) -> &H {
        self.host
    }
}

impl<H: TimelineHost + ?Sized> DerefMut for CursorGuard<'_, H> {
    fn deref_mut(&mut self) -> &mut H {
        self.host
    }
}

impl<H: TimelineHost + ?Sized> Drop for CursorGuard<'_, H> {
    fn drop(&mut self) {
        match self.host.set_current_time(self.saved) {
            Ok(()) => tracing::trace!(time = self.saved, "restored time cursor"),
            Err(e) => {
                tracing::error!(time = self.saved, error = %e, "failed to restore time cursor")
            }
        }
    }
}

/// Keeps one undo group open for its lifetime.
pub struct UndoScope<'h, H: TimelineHost + ?Sized> {
    host: &'h mut H,
}

impl<'h, H: TimelineHost + ?Sized> UndoScope<'h, H> {
    pub fn open(host: &'h mut H, name: &str) -> Self {
        host.begin_undo_group(name);
        tracing::debug!(group = name, "undo group opened");
        Self { host }
    }
}

impl<H: TimelineHost + ?Sized> Deref for UndoScope<'_, H> {
    type Target = H;

    fn deref(&self) -> &H {
        self.host
    }
}

impl<H: TimelineHost + ?Sized> DerefMut for UndoScope<'_, H> {
    fn deref_mut(&mut self) -> &mut H {
        self.host
    }
}

impl<H: TimelineHost + ?Sized> Drop for UndoScope<'_, H> {
    fn drop(&mut self) {
        self.host.end_undo_group();
        tracing::debug!("undo group closed");
    }
}

#[cfg(test)]
#[path = "../../tests/unit/host/cursor.rs"]
mod tests;
