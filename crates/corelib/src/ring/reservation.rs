//! RAII load reservation.

use std::fmt;
use std::sync::Arc;

use crate::host::Host;
use crate::ring::HashRing;

/// One in-flight request counted against a host.
///
/// Created by [`HashRing::reserve`]; the load is released when the guard is
/// dropped, whether the work it covers succeeded or failed. If the host was
/// unregistered in the meantime the release is a no-op, even when a host
/// with the same name has since been registered again.
#[must_use = "dropping a reservation releases it immediately"]
pub struct Reservation<'a> {
    ring: &'a HashRing,
    host: Arc<Host>,
}

impl<'a> Reservation<'a> {
    pub(crate) fn new(ring: &'a HashRing, host: Arc<Host>) -> Self {
        Self { ring, host }
    }

    /// Name of the reserved host.
    pub fn host(&self) -> &str {
        self.host.name()
    }
}

impl Drop for Reservation<'_> {
    fn drop(&mut self) {
        self.ring.release(&self.host);
    }
}

impl fmt::Debug for Reservation<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reservation")
            .field("host", &self.host.name())
            .finish()
    }
}
