/// Knobs read from the environment.

use std::env;

pub const DEFAULT_MAX_FRAME_SIZE: usize = 0x10000;

#[derive(Debug, Clone)]
pub struct Config {
    /// Print the disassembly of compiled units.
    pub dump: bool,
    /// Largest frame the interpreter agrees to allocate, in bytes.
    pub max_frame_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            dump: false,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
        }
    }
}

impl Config {
    /// `VCODE_DUMP` (any value) and `VCODE_MAX_FRAME` (bytes).
    pub fn from_env() -> Self {
        let dump = env::var("VCODE_DUMP").map(|_| true).unwrap_or(false);
        let max_frame_size = env::var("VCODE_MAX_FRAME")
            .ok()
            .and_then(|x| x.parse().ok())
            .unwrap_or(DEFAULT_MAX_FRAME_SIZE);
        Config {
            dump: dump,
            max_frame_size: max_frame_size,
        }
    }
}
