//! Keypad key codes.
use std::fmt;

use crate::constants::KEY_COUNT;

/// One of the 16 keys of the COSMAC VIP hexadecimal keypad.
///
/// ```text
/// 1 2 3 C
/// 4 5 6 D
/// 7 8 9 E
/// A 0 B F
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum KeyCode {
    Key0 = 0,
    Key1,
    Key2,
    Key3,
    Key4,
    Key5,
    Key6,
    Key7,
    Key8,
    Key9,
    KeyA,
    KeyB,
    KeyC,
    KeyD,
    KeyE,
    KeyF = 0xF,
}

impl KeyCode {
    /// Every key, indexed by its value.
    #[rustfmt::skip]
    pub const ALL: [KeyCode; KEY_COUNT as usize] = [
        Self::Key0, Self::Key1, Self::Key2, Self::Key3,
        Self::Key4, Self::Key5, Self::Key6, Self::Key7,
        Self::Key8, Self::Key9, Self::KeyA, Self::KeyB,
        Self::KeyC, Self::KeyD, Self::KeyE, Self::KeyF,
    ];

    pub fn as_u8(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "k{:x}", self.as_u8())
    }
}

impl From<KeyCode> for u8 {
    fn from(keycode: KeyCode) -> Self {
        keycode.as_u8()
    }
}

impl TryFrom<u8> for KeyCode {
    type Error = InvalidKeyCode;

    fn try_from(key_id: u8) -> Result<Self, Self::Error> {
        Self::ALL.get(key_id as usize).copied().ok_or(InvalidKeyCode)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct InvalidKeyCode;

impl std::error::Error for InvalidKeyCode {}

impl fmt::Display for InvalidKeyCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "keycode must be in range 0 <= keycode < {KEY_COUNT}")
    }
}

#[cfg(feature = "serde")]
mod de {
    use serde::de::{Deserialize, Error, Expected, Unexpected, Visitor};

    use super::*;

    impl Expected for InvalidKeyCode {
        fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
            <Self as fmt::Display>::fmt(self, f)
        }
    }

    impl<'de> Deserialize<'de> for KeyCode {
        fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
        where
            D: serde::Deserializer<'de>,
        {
            // YAML integer type
            deserializer.deserialize_i64(KeyCodeVisitor)
        }
    }

    struct KeyCodeVisitor;

    impl<'de> Visitor<'de> for KeyCodeVisitor {
        type Value = KeyCode;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            write!(f, "an integer between 0 and 15")
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: Error,
        {
            u8::try_from(v)
                .ok()
                .and_then(|key_id| KeyCode::try_from(key_id).ok())
                .ok_or_else(|| E::invalid_value(Unexpected::Signed(v), &InvalidKeyCode))
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: Error,
        {
            u8::try_from(v)
                .ok()
                .and_then(|key_id| KeyCode::try_from(key_id).ok())
                .ok_or_else(|| E::invalid_value(Unexpected::Unsigned(v), &InvalidKeyCode))
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_keycode_conversion() {
        for key_id in 0..KEY_COUNT {
            let keycode = KeyCode::try_from(key_id).unwrap();
            assert_eq!(u8::from(keycode), key_id);
            assert_eq!(KeyCode::ALL[key_id as usize], keycode);
        }
        assert_eq!(KeyCode::try_from(16), Err(InvalidKeyCode));
        assert_eq!(KeyCode::KeyA.to_string(), "ka");
    }
}
