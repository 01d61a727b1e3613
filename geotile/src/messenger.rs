/// Receives redraw requests from the tile cache.
///
/// The tile cache calls [`Messenger::request_redraw`] every time a tile that was requested for
/// display (not a prefetch) becomes available, so the application can schedule a repaint.
pub trait Messenger: Send + Sync {
    /// Requests the map to be redrawn.
    fn request_redraw(&self);
}

/// Messenger that ignores all requests.
#[derive(Debug, Default, Clone, Copy)]
pub struct DummyMessenger;

impl Messenger for DummyMessenger {
    fn request_redraw(&self) {}
}
