//! Host configuration.
use std::{fs::File, path::Path};

use chip8::prelude::*;
use serde::Deserialize;

use crate::error::CliError;

/// Settings for the terminal host, loaded from YAML.
///
/// ```yaml
/// instructions_per_second: 700
/// timer_hz: 60
/// key_hold_ms: 150
/// keymap:
///   - chip8: 1
///     keys: ['1']
/// ```
///
/// Every field is optional and falls back to its default.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct HostConf {
    pub instructions_per_second: u64,
    pub timer_hz: u64,
    /// Terminals don't report key release, so a press is held this long.
    pub key_hold_ms: u64,
    /// Fixed seed for the random number instruction.
    pub seed: Option<u64>,
    pub keymap: Vec<KeyDef>,
}

/// Keyboard characters bound to one keypad key.
#[derive(Debug, Deserialize)]
pub struct KeyDef {
    pub chip8: KeyCode,
    pub keys: Vec<char>,
}

impl Default for HostConf {
    fn default() -> Self {
        Self {
            instructions_per_second: 700,
            timer_hz: 60,
            key_hold_ms: 150,
            seed: None,
            keymap: default_keymap(),
        }
    }
}

/// Conventional layout of the COSMAC VIP keypad on the left-hand side of a
/// QWERTY keyboard.
///
/// ```text
/// 1 2 3 C      1 2 3 4
/// 4 5 6 D      Q W E R
/// 7 8 9 E  =>  A S D F
/// A 0 B F      Z X C V
/// ```
fn default_keymap() -> Vec<KeyDef> {
    use KeyCode::*;

    #[rustfmt::skip]
    let layout = [
        (Key1, '1'), (Key2, '2'), (Key3, '3'), (KeyC, '4'),
        (Key4, 'q'), (Key5, 'w'), (Key6, 'e'), (KeyD, 'r'),
        (Key7, 'a'), (Key8, 's'), (Key9, 'd'), (KeyE, 'f'),
        (KeyA, 'z'), (Key0, 'x'), (KeyB, 'c'), (KeyF, 'v'),
    ];

    layout
        .into_iter()
        .map(|(chip8, key)| KeyDef {
            chip8,
            keys: vec![key],
        })
        .collect()
}

impl HostConf {
    pub fn from_file(filepath: impl AsRef<Path>) -> Result<Self, CliError> {
        let file = File::open(filepath.as_ref())?;
        let conf: HostConf = serde_yaml::from_reader(file)?;
        conf.validate()?;
        log::debug!("loaded host configuration: {conf:#?}");
        Ok(conf)
    }

    pub fn parse(source: &str) -> Result<Self, CliError> {
        let conf: HostConf = serde_yaml::from_str(source)?;
        conf.validate()?;
        Ok(conf)
    }

    fn validate(&self) -> Result<(), CliError> {
        let rates = [
            ("instructions_per_second", self.instructions_per_second),
            ("timer_hz", self.timer_hz),
        ];

        for (name, rate) in rates {
            if rate == 0 || rate > Hz::MAX.0 {
                return Err(CliError::invalid_conf(format!(
                    "{name} must be between 1 and {}, got {rate}",
                    Hz::MAX.0
                )));
            }
        }

        Ok(())
    }

    /// Machine configuration derived from the host settings.
    pub fn vm_conf(&self) -> Chip8Conf {
        Chip8Conf {
            clock_frequency: Some(Hz(self.instructions_per_second)),
            timer_frequency: Some(Hz(self.timer_hz)),
            seed: self.seed,
        }
    }

    /// Flatten the keymap into a lookup from keyboard character to keypad key.
    pub fn key_bindings(&self) -> KeyBindings {
        let keys = self
            .keymap
            .iter()
            .flat_map(|def| {
                def.keys
                    .iter()
                    .map(move |key| (key.to_ascii_lowercase(), def.chip8))
            })
            .collect::<Vec<(char, KeyCode)>>()
            .into_boxed_slice();

        KeyBindings { keys }
    }
}

#[derive(Debug)]
pub struct KeyBindings {
    keys: Box<[(char, KeyCode)]>,
}

impl KeyBindings {
    /// Map a typed character to a keypad key. Letters match either case.
    pub fn map_char(&self, key: char) -> Option<KeyCode> {
        let key = key.to_ascii_lowercase();
        self.keys
            .iter()
            .find(|(bound, _)| *bound == key)
            .map(|(_, keycode)| *keycode)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_defaults() {
        let conf = HostConf::default();
        let bindings = conf.key_bindings();

        assert_eq!(bindings.map_char('1'), Some(KeyCode::Key1));
        assert_eq!(bindings.map_char('4'), Some(KeyCode::KeyC));
        assert_eq!(bindings.map_char('x'), Some(KeyCode::Key0));
        assert_eq!(bindings.map_char('V'), Some(KeyCode::KeyF));
        assert_eq!(bindings.map_char('p'), None);

        let vm_conf = conf.vm_conf();
        assert_eq!(vm_conf.clock_frequency, Some(Hz(700)));
        assert_eq!(vm_conf.timer_frequency, Some(Hz(60)));
    }

    #[test]
    fn test_parse_partial() {
        let conf = HostConf::parse(
            r#"
instructions_per_second: 1000
seed: 42
keymap:
  - chip8: 0
    keys: ['m', 'n']
  - chip8: 15
    keys: ['/']
"#,
        )
        .unwrap();

        assert_eq!(conf.instructions_per_second, 1000);
        assert_eq!(conf.timer_hz, 60);
        assert_eq!(conf.key_hold_ms, 150);
        assert_eq!(conf.vm_conf().seed, Some(42));

        let bindings = conf.key_bindings();
        assert_eq!(bindings.map_char('n'), Some(KeyCode::Key0));
        assert_eq!(bindings.map_char('/'), Some(KeyCode::KeyF));
        assert_eq!(bindings.map_char('1'), None);
    }

    #[test]
    fn test_parse_errors() {
        assert!(HostConf::parse("keymap:\n  - chip8: 16\n    keys: ['1']\n").is_err());
        assert!(HostConf::parse("timer_hz: fast").is_err());
        assert!(HostConf::parse("instructions_per_second: 0").is_err());
        assert!(HostConf::parse("instructions_per_second: 2000000000").is_err());
        assert!(HostConf::parse("timer_hz: 0").is_err());
        assert!(HostConf::parse("timer_hz: 1000000000").is_ok());
    }
}
