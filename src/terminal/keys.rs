/// End-of-text, what Ctrl+C produces in raw mode.
const ETX: u8 = 0x03;
const ESC: u8 = 0x1b;

/// Navigation events decoded from raw terminal input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Up,
    Down,
    Confirm,
    Quit,
    Ignored,
}

/// Decode one raw read into a [`Key`].
pub fn decode(bytes: &[u8]) -> Key {
    match bytes {
        [b'q' | b'Q' | ETX] => Key::Quit,
        [b'\r' | b'\n'] => Key::Confirm,
        [b'j'] => Key::Down,
        [b'k'] => Key::Up,
        [ESC, b'[', b'A'] => Key::Up,
        [ESC, b'[', b'B'] => Key::Down,
        _ => Key::Ignored,
    }
}
