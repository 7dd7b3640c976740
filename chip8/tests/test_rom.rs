use std::{fs, path::PathBuf};

use chip8::{prelude::*, rom};

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("chip8-{}-{name}", std::process::id()))
}

#[test]
fn test_load_hex_file() {
    let path = temp_path("image.hex");
    fs::write(&path, "00E0 A22A\n600C 6108\nD01F\n").unwrap();

    let bytecode = rom::load_hex_file(&path).unwrap();
    fs::remove_file(&path).unwrap();

    assert_eq!(
        bytecode,
        vec![0x00, 0xE0, 0xA2, 0x2A, 0x60, 0x0C, 0x61, 0x08, 0xD0, 0x1F]
    );
}

#[test]
fn test_missing_file() {
    let result = rom::load_hex_file(temp_path("missing.hex"));
    assert!(matches!(result, Err(Chip8Error::Io(_))));
}

#[test]
fn test_error_reports_position() {
    let err = rom::parse_hex_image("600A\n6105\nZZZZ").unwrap_err();
    let message = err.to_string();
    assert!(message.contains('3'), "{message}");
    assert!(message.contains("ZZZZ"), "{message}");
}
