//! Key handling. Keys are interpreted against an input mode so the same
//! movement keys drive the robot, a reposition cursor or a guess cursor.

use bracket_geometry::prelude::Point;
use bracket_terminal::prelude::VirtualKeyCode;
use tracing::debug;

use crate::robot::Direction;
use crate::session::GameSession;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum InputMode {
    Play,
    Reposition { cursor: Point },
    Rotate,
    GuessStart { cursor: Point },
}

/// What the caller has to do after a key, beyond what the controller
/// already did to the session.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum InputEffect {
    None,
    Quit,
    NewGame,
    Snapshot,
}

pub fn key_direction(key: VirtualKeyCode) -> Option<Direction> {
    match key {
        VirtualKeyCode::W | VirtualKeyCode::Up => Some(Direction::Up),
        VirtualKeyCode::S | VirtualKeyCode::Down => Some(Direction::Down),
        VirtualKeyCode::A | VirtualKeyCode::Left => Some(Direction::Left),
        VirtualKeyCode::D | VirtualKeyCode::Right => Some(Direction::Right),
        _ => None,
    }
}

#[derive(Clone, Debug)]
pub struct Controller {
    mode: InputMode,
}

impl Default for Controller {
    fn default() -> Self {
        Self::new()
    }
}

impl Controller {
    pub const fn new() -> Self {
        Self {
            mode: InputMode::Play,
        }
    }

    pub const fn mode(&self) -> InputMode {
        self.mode
    }

    /// Cursor being placed in reposition or guess mode.
    pub const fn pending_cursor(&self) -> Option<Point> {
        match self.mode {
            InputMode::Reposition { cursor } | InputMode::GuessStart { cursor } => Some(cursor),
            InputMode::Play | InputMode::Rotate => None,
        }
    }

    pub const fn prompt(&self) -> &'static str {
        match self.mode {
            InputMode::Play => "WASD move · C reposition · R rotate · G guess start · P snapshot · Q quit",
            InputMode::Reposition { .. } => "Reposition guess: WASD move · Enter confirm · Esc cancel",
            InputMode::Rotate => "How many clockwise 90-deg turns of the sensor picture? (1, 2 or 3) · Esc cancel",
            InputMode::GuessStart { .. } => "Guess starting location: WASD move · Enter submit · Esc cancel",
        }
    }

    pub fn reset(&mut self) {
        self.mode = InputMode::Play;
    }

    pub fn handle_key(&mut self, key: VirtualKeyCode, session: &mut GameSession) -> InputEffect {
        if session.is_over() {
            self.mode = InputMode::Play;
            return match key {
                VirtualKeyCode::N => InputEffect::NewGame,
                VirtualKeyCode::P => InputEffect::Snapshot,
                VirtualKeyCode::Q | VirtualKeyCode::Escape => InputEffect::Quit,
                _ => InputEffect::None,
            };
        }

        match self.mode {
            InputMode::Play => self.handle_play(key, session),
            InputMode::Rotate => {
                self.handle_rotate(key, session);
                InputEffect::None
            }
            InputMode::Reposition { cursor } | InputMode::GuessStart { cursor } => {
                self.handle_cursor(key, cursor, session);
                InputEffect::None
            }
        }
    }

    fn handle_play(&mut self, key: VirtualKeyCode, session: &mut GameSession) -> InputEffect {
        if let Some(direction) = key_direction(key) {
            if let Err(err) = session.step(direction) {
                session.push_log_entry(err.to_string());
            }
            return InputEffect::None;
        }

        match key {
            VirtualKeyCode::C => {
                self.mode = InputMode::Reposition {
                    cursor: session.cursor(),
                };
            }
            VirtualKeyCode::G => {
                self.mode = InputMode::GuessStart {
                    cursor: session.cursor(),
                };
            }
            VirtualKeyCode::R => self.mode = InputMode::Rotate,
            VirtualKeyCode::P => return InputEffect::Snapshot,
            VirtualKeyCode::Q | VirtualKeyCode::Escape => return InputEffect::Quit,
            _ => {}
        }
        InputEffect::None
    }

    fn handle_rotate(&mut self, key: VirtualKeyCode, session: &mut GameSession) {
        let turns = match key {
            VirtualKeyCode::Key1 => 1,
            VirtualKeyCode::Key2 => 2,
            VirtualKeyCode::Key3 => 3,
            VirtualKeyCode::Escape => {
                self.mode = InputMode::Play;
                return;
            }
            _ => {
                session.push_log_entry("Invalid option. Choose 1, 2 or 3.");
                return;
            }
        };
        if let Err(err) = session.rotate(turns) {
            session.push_log_entry(err.to_string());
        }
        self.mode = InputMode::Play;
    }

    fn handle_cursor(&mut self, key: VirtualKeyCode, cursor: Point, session: &mut GameSession) {
        if let Some(direction) = key_direction(key) {
            let map = session.display_map();
            let (drow, dcol) = direction.delta();
            let moved = Point::new(
                (cursor.x + dcol).clamp(0, map.cols() - 1),
                (cursor.y + drow).clamp(0, map.rows() - 1),
            );
            self.mode = match self.mode {
                InputMode::GuessStart { .. } => InputMode::GuessStart { cursor: moved },
                _ => InputMode::Reposition { cursor: moved },
            };
            return;
        }

        match key {
            VirtualKeyCode::Return => {
                let result = match self.mode {
                    InputMode::GuessStart { .. } => session.guess_start(cursor.y, cursor.x).map(|_| ()),
                    _ => session.reposition(cursor.y, cursor.x).map(|_| ()),
                };
                if let Err(err) = result {
                    session.push_log_entry(err.to_string());
                }
                debug!(row = cursor.y, col = cursor.x, mode = ?self.mode, "Cursor confirmed");
                self.mode = InputMode::Play;
            }
            VirtualKeyCode::Escape => self.mode = InputMode::Play,
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::session::Outcome;

    fn session() -> GameSession {
        let config = GameConfig::default()
            .with_size(9, 11)
            .with_wall_percent(0)
            .with_start(4, 5)
            .with_seed(Some(5));
        GameSession::new(config).unwrap()
    }

    #[test]
    fn movement_keys_step_the_session() {
        let mut session = session();
        let mut controller = Controller::new();
        assert_eq!(
            controller.handle_key(VirtualKeyCode::D, &mut session),
            InputEffect::None
        );
        assert_eq!(session.moves_used(), 1);
    }

    #[test]
    fn rotate_mode_takes_a_count() {
        let mut session = session();
        let mut controller = Controller::new();
        let before = session.mapper().orientation();
        controller.handle_key(VirtualKeyCode::R, &mut session);
        assert_eq!(controller.mode(), InputMode::Rotate);
        controller.handle_key(VirtualKeyCode::X, &mut session);
        assert_eq!(controller.mode(), InputMode::Rotate);
        controller.handle_key(VirtualKeyCode::Key3, &mut session);
        assert_eq!(controller.mode(), InputMode::Play);
        assert_eq!(session.mapper().orientation(), (before + 3) % 4);
    }

    #[test]
    fn guess_mode_moves_a_pending_cursor() {
        let mut session = session();
        let mut controller = Controller::new();
        let start = session.cursor();
        controller.handle_key(VirtualKeyCode::G, &mut session);
        controller.handle_key(VirtualKeyCode::S, &mut session);
        assert_eq!(
            controller.pending_cursor(),
            Some(Point::new(start.x, start.y + 1))
        );
        assert_eq!(session.cursor(), start);
        assert_eq!(session.moves_used(), 0);
        controller.handle_key(VirtualKeyCode::Escape, &mut session);
        assert_eq!(controller.mode(), InputMode::Play);
        assert_eq!(session.guesses_used(), 0);
    }

    #[test]
    fn guessing_the_start_through_keys_wins() {
        let mut session = session();
        let mut controller = Controller::new();
        controller.handle_key(VirtualKeyCode::G, &mut session);
        let cursor = controller.pending_cursor().unwrap();
        let (row, col) = (4, 5);
        let vertical = if row > cursor.y { VirtualKeyCode::S } else { VirtualKeyCode::W };
        let horizontal = if col > cursor.x { VirtualKeyCode::D } else { VirtualKeyCode::A };
        for _ in 0..(row - cursor.y).abs() {
            controller.handle_key(vertical, &mut session);
        }
        for _ in 0..(col - cursor.x).abs() {
            controller.handle_key(horizontal, &mut session);
        }
        controller.handle_key(VirtualKeyCode::Return, &mut session);
        assert_eq!(session.outcome(), Some(Outcome::Victory));
        assert_eq!(
            controller.handle_key(VirtualKeyCode::N, &mut session),
            InputEffect::NewGame
        );
    }

    #[test]
    fn cursor_is_clamped_to_the_map() {
        let mut session = session();
        let mut controller = Controller::new();
        controller.handle_key(VirtualKeyCode::C, &mut session);
        for _ in 0..20 {
            controller.handle_key(VirtualKeyCode::A, &mut session);
        }
        assert_eq!(controller.pending_cursor().map(|p| p.x), Some(0));
        controller.handle_key(VirtualKeyCode::Return, &mut session);
        // Column 0 is border wall on the true map, so the cursor stays put.
        assert_eq!(session.log()[0], "You found a worm!");
    }

    #[test]
    fn quit_and_snapshot_are_reported() {
        let mut session = session();
        let mut controller = Controller::new();
        assert_eq!(
            controller.handle_key(VirtualKeyCode::P, &mut session),
            InputEffect::Snapshot
        );
        assert_eq!(
            controller.handle_key(VirtualKeyCode::Q, &mut session),
            InputEffect::Quit
        );
    }
}
