//! Port traits: the boundary between the main loop and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ BridgeService
//! ```

use super::events::AppEvent;

// ───────────────────────────────────────────────────────────────
// Link port (driven adapter: domain → USB stack)
// ───────────────────────────────────────────────────────────────

/// The USB device stack must be serviced regularly or the host drops the
/// device.  Everything that blocks for more than a few milliseconds calls
/// back into this port.
pub trait LinkPort {
    /// Service the USB stack once.  Must return quickly.
    fn refresh(&mut self);

    /// Wait roughly `ms` milliseconds, refreshing throughout.
    fn delay_ms(&mut self, ms: u32);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The main loop emits structured [`AppEvent`]s through this port.
pub trait EventSink {
    fn emit(&mut self, event: &AppEvent);
}
