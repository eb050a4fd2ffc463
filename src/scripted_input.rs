use bracket_terminal::prelude::VirtualKeyCode;
use std::{
    fs::File,
    io::{self, BufRead, BufReader},
    path::Path,
};
use tracing::warn;

/// Key presses replayed one per tick instead of reading the keyboard.
pub struct ScriptedInput {
    script_commands: Vec<VirtualKeyCode>,
    current_command_index: usize,
}

impl ScriptedInput {
    pub fn from_file<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    pub fn from_reader<R: BufRead>(reader: R) -> io::Result<Self> {
        let mut script_commands = Vec::new();

        for line in reader.lines() {
            let line = line?;
            let trimmed_line = line.trim();
            if trimmed_line.is_empty() || trimmed_line.starts_with('#') {
                continue;
            }

            for char_code in trimmed_line.chars() {
                if let Some(key) = char_to_virtualkeycode(char_code) {
                    script_commands.push(key);
                } else {
                    warn!(key = %char_code, "Unknown key in script");
                }
            }
        }

        Ok(Self {
            script_commands,
            current_command_index: 0,
        })
    }

    pub fn next_key(&mut self) -> Option<VirtualKeyCode> {
        let key = self.script_commands.get(self.current_command_index).copied();
        if key.is_some() {
            self.current_command_index += 1;
        }
        key
    }

    pub fn is_finished(&self) -> bool {
        self.current_command_index >= self.script_commands.len()
    }

    pub fn len(&self) -> usize {
        self.script_commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.script_commands.is_empty()
    }
}

fn char_to_virtualkeycode(c: char) -> Option<VirtualKeyCode> {
    match c {
        'w' | 'W' => Some(VirtualKeyCode::W),
        'a' | 'A' => Some(VirtualKeyCode::A),
        's' | 'S' => Some(VirtualKeyCode::S),
        'd' | 'D' => Some(VirtualKeyCode::D),
        'c' | 'C' => Some(VirtualKeyCode::C), // Reposition guess
        'g' | 'G' => Some(VirtualKeyCode::G), // Guess start
        'r' | 'R' => Some(VirtualKeyCode::R), // Rotate sensor
        '1' => Some(VirtualKeyCode::Key1),
        '2' => Some(VirtualKeyCode::Key2),
        '3' => Some(VirtualKeyCode::Key3),
        'e' | 'E' => Some(VirtualKeyCode::Return), // Confirm
        'x' | 'X' => Some(VirtualKeyCode::Escape), // Cancel
        'p' | 'P' => Some(VirtualKeyCode::P),      // Snapshot
        'n' | 'N' => Some(VirtualKeyCode::N),      // New game
        'q' | 'Q' => Some(VirtualKeyCode::Q),
        '\x1B' => Some(VirtualKeyCode::Escape),
        _ => None,
    }
}
