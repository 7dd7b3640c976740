//! Display snapshots and the hand-off to a rendering thread.
use std::{
    fmt,
    sync::{Arc, Mutex, PoisonError},
};

use crate::constants::*;

/// Owned copy of the display buffer.
///
/// Snapshots are what crosses from the thread stepping the machine to the
/// thread drawing the screen. The machine's own buffer is never shared.
#[derive(Clone, PartialEq, Eq)]
pub struct DisplaySnapshot {
    cells: Box<[u8; DISPLAY_BUFFER_SIZE]>,
}

impl DisplaySnapshot {
    pub(crate) fn new(cells: &[u8; DISPLAY_BUFFER_SIZE]) -> Self {
        Self {
            cells: Box::new(*cells),
        }
    }

    /// Row-major cells, `0` for unset and `1` for set.
    pub fn cells(&self) -> &[u8; DISPLAY_BUFFER_SIZE] {
        &self.cells
    }

    /// Whether the pixel at the coordinate is set.
    ///
    /// Coordinates outside the display are unset.
    pub fn pixel(&self, x: usize, y: usize) -> bool {
        x < DISPLAY_WIDTH && y < DISPLAY_HEIGHT && self.cells[x + y * DISPLAY_WIDTH] != 0
    }

    pub fn rows(&self) -> impl Iterator<Item = &[u8]> {
        self.cells.chunks(DISPLAY_WIDTH)
    }

    /// Render the snapshot as text, one line per display row.
    pub fn to_text(&self, on: char, off: char) -> String {
        let mut buf = String::with_capacity((DISPLAY_WIDTH + 1) * DISPLAY_HEIGHT);
        for row in self.rows() {
            buf.extend(row.iter().map(|px| if *px != 0 { on } else { off }));
            buf.push('\n');
        }
        buf
    }
}

impl fmt::Debug for DisplaySnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DisplaySnapshot\n{}", self.to_text('#', '.'))
    }
}

/// Single-producer, single-consumer slot holding the latest published frame.
///
/// The stepping thread publishes snapshots and the rendering thread takes
/// them. A frame that is not taken before the next publish is replaced, so
/// the renderer always sees the most recent state.
#[derive(Clone, Default)]
pub struct FrameHandoff {
    slot: Arc<Mutex<Option<DisplaySnapshot>>>,
}

impl FrameHandoff {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the pending frame with a new one.
    pub fn publish(&self, snapshot: DisplaySnapshot) {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        *slot = Some(snapshot);
    }

    /// Take the pending frame, if one was published since the last take.
    pub fn take(&self) -> Option<DisplaySnapshot> {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}
