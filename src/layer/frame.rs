/// Single-slot pending-frame flag. At most one redraw is scheduled at a time;
/// further requests before the frame runs are folded into it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameSlot {
    pending: bool,
}

impl FrameSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a frame as pending. Returns true only when the slot was free,
    /// i.e. when the caller must actually ask the host for a frame.
    pub fn schedule(&mut self) -> bool {
        !std::mem::replace(&mut self.pending, true)
    }

    /// Consume the pending frame. Returns whether one was pending.
    pub fn take(&mut self) -> bool {
        std::mem::take(&mut self.pending)
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }
}
