//! Keypad state from terminal key presses.
use std::time::{Duration, Instant};

use chip8::{constants::KEY_COUNT, prelude::*};

/// Holds keypad keys down for a fixed time after each press.
///
/// Terminals only report presses, and repeat them while a key is held.
/// Each press extends the hold, so a held key stays down until the
/// repeats stop.
pub struct KeyLatch {
    hold: Duration,
    release_at: [Option<Instant>; KEY_COUNT as usize],
}

impl KeyLatch {
    pub fn new(hold: Duration) -> Self {
        Self {
            hold,
            release_at: [None; KEY_COUNT as usize],
        }
    }

    /// Register a press. Returns `true` if the key was up before.
    pub fn press(&mut self, key: KeyCode, now: Instant) -> bool {
        let slot = &mut self.release_at[key.as_u8() as usize];
        let was_up = slot.is_none();
        *slot = Some(now + self.hold);
        was_up
    }

    /// Release every key whose hold has run out.
    pub fn expire(&mut self, now: Instant) -> Vec<KeyCode> {
        let mut released = Vec::new();

        for (key_id, slot) in self.release_at.iter_mut().enumerate() {
            if matches!(slot, Some(deadline) if *deadline <= now) {
                *slot = None;
                released.push(KeyCode::ALL[key_id]);
            }
        }

        released
    }

    pub fn is_down(&self, key: KeyCode) -> bool {
        self.release_at[key.as_u8() as usize].is_some()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_hold_and_release() {
        let hold = Duration::from_millis(100);
        let mut latch = KeyLatch::new(hold);
        let start = Instant::now();

        assert!(latch.press(KeyCode::Key5, start));
        assert!(latch.is_down(KeyCode::Key5));
        assert!(latch.expire(start + Duration::from_millis(50)).is_empty());

        assert_eq!(latch.expire(start + hold), vec![KeyCode::Key5]);
        assert!(!latch.is_down(KeyCode::Key5));
    }

    #[test]
    fn test_repeat_extends_hold() {
        let hold = Duration::from_millis(100);
        let mut latch = KeyLatch::new(hold);
        let start = Instant::now();

        latch.press(KeyCode::KeyA, start);
        assert!(!latch.press(KeyCode::KeyA, start + Duration::from_millis(80)));
        latch.press(KeyCode::Key0, start + Duration::from_millis(10));

        assert_eq!(
            latch.expire(start + Duration::from_millis(120)),
            vec![KeyCode::Key0]
        );
        assert!(latch.is_down(KeyCode::KeyA));
        assert_eq!(
            latch.expire(start + Duration::from_millis(180)),
            vec![KeyCode::KeyA]
        );
    }
}
