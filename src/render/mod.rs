use bracket_geometry::prelude::Point;
use bracket_terminal::prelude::*;

use crate::input::Controller;
use crate::map::WallMap;
use crate::robot::{Direction, Reading};
use crate::session::GameSession;

const SAND: (u8, u8, u8) = (237, 201, 175);

pub fn sand() -> RGB {
    RGB::from_u8(SAND.0, SAND.1, SAND.2)
}

pub fn reading_color(reading: Reading) -> RGB {
    match reading {
        Reading::NoWall => RGB::named(GREEN),
        Reading::WallDetected => RGB::named(RED),
    }
}

/// Top HUD line. The sensor orientation stays hidden, since recovering it
/// is part of the puzzle.
pub fn budget_line(session: &GameSession) -> String {
    format!(
        "Desert Puzzle · Moves left {} · Guesses left {}",
        session.moves_remaining(),
        session.guesses_remaining()
    )
}

pub struct Hud;

impl Hud {
    pub const fn new() -> Self {
        Self
    }

    pub fn draw(&self, ctx: &mut BTerm, session: &GameSession, controller: &Controller, frame: u64) {
        let (width, _) = ctx.get_char_size();
        let width = width as i32;
        ctx.draw_box(0, 0, width - 1, 4, RGB::named(GRAY), RGB::named(BLACK));
        ctx.print_color(
            2,
            1,
            RGB::named(WHITE),
            RGB::named(BLACK),
            budget_line(session),
        );
        ctx.print_color(
            2,
            2,
            RGB::named(LIGHT_BLUE),
            RGB::named(BLACK),
            controller.prompt(),
        );

        let status = match session.outcome() {
            Some(outcome) => format!("{} · N new game · Q quit", outcome.message()),
            None => format!("Frame {frame}"),
        };
        let color = match session.outcome() {
            Some(outcome) if outcome.is_victory() => RGB::named(LIGHT_GREEN),
            Some(_) => RGB::named(ORANGE),
            None => RGB::named(DARK_GRAY),
        };
        ctx.print_color(2, 3, color, RGB::named(BLACK), status);
    }
}

impl Default for Hud {
    fn default() -> Self {
        Self::new()
    }
}

pub fn draw_log(ctx: &mut BTerm, log: &[String], start_y: i32) {
    let (width, _) = ctx.get_char_size();
    let width = width as i32;
    let height = (log.len() as i32).min(5) + 2;
    let top = (start_y - 1).max(0);
    ctx.draw_box(
        0,
        top,
        width - 1,
        height,
        RGB::named(DARK_GRAY),
        RGB::named(BLACK),
    );
    ctx.print_color(
        2,
        top + 1,
        RGB::named(WHITE),
        RGB::named(BLACK),
        "Event Log",
    );
    for (row, entry) in log.iter().take(5).enumerate() {
        ctx.print(2, top + 2 + row as i32, entry);
    }
}

/// Draws the player-visible map with column labels above and row labels to
/// the left of `map_origin`.
pub fn draw_map(ctx: &mut BTerm, map: &WallMap, map_origin: Point, reserved_rows: i32) {
    let (screen_w, screen_h) = ctx.get_char_size();
    let screen_w = screen_w as i32;
    let screen_h = screen_h as i32;
    let max_draw_y = screen_h - reserved_rows;
    let max_draw_x = screen_w - 2;

    for col in (0..map.cols()).step_by(5) {
        ctx.print_color(
            map_origin.x + col,
            map_origin.y - 1,
            RGB::named(DARK_GRAY),
            RGB::named(BLACK),
            format!("{col}"),
        );
    }

    for row in 0..map.rows() {
        let screen_y = map_origin.y + row;
        if screen_y >= max_draw_y {
            break;
        }
        if row % 2 == 0 {
            ctx.print_color(
                map_origin.x - 3,
                screen_y,
                RGB::named(DARK_GRAY),
                RGB::named(BLACK),
                format!("{row:>2}"),
            );
        }
        for col in 0..map.cols() {
            let screen_x = map_origin.x + col;
            if screen_x >= max_draw_x {
                break;
            }
            if map.is_wall(row, col) {
                ctx.set(
                    screen_x,
                    screen_y,
                    RGB::named(DARK_GRAY),
                    RGB::named(BLACK),
                    to_cp437('#'),
                );
            } else {
                ctx.set(screen_x, screen_y, sand(), RGB::named(BLACK), to_cp437('.'));
            }
        }
    }
}

/// Paints the rotated sensor readings around `cursor` and marks the cursor.
pub fn draw_sensors(ctx: &mut BTerm, session: &GameSession, cursor: Point, map_origin: Point) {
    let map = session.display_map();
    let shown = session.display_frame();
    for (slot, direction) in Direction::CANONICAL.iter().enumerate() {
        let (drow, dcol) = direction.delta();
        let (row, col) = (cursor.y + drow, cursor.x + dcol);
        if !map.in_bounds(row, col) {
            continue;
        }
        ctx.set(
            map_origin.x + col,
            map_origin.y + row,
            RGB::named(BLACK),
            reading_color(shown.readings[slot]),
            to_cp437(' '),
        );
    }
    ctx.set(
        map_origin.x + cursor.x,
        map_origin.y + cursor.y,
        RGB::named(GREEN),
        RGB::named(BLACK),
        to_cp437('x'),
    );
}

pub fn draw_pending_cursor(ctx: &mut BTerm, cursor: Point, map_origin: Point) {
    ctx.set(
        map_origin.x + cursor.x,
        map_origin.y + cursor.y,
        RGB::named(YELLOW),
        RGB::named(BLACK),
        to_cp437('+'),
    );
}

pub fn draw_revealed_start(ctx: &mut BTerm, start: (i32, i32), map_origin: Point) {
    let (row, col) = start;
    ctx.set(
        map_origin.x + col,
        map_origin.y + row,
        RGB::named(MAGENTA),
        RGB::named(BLACK),
        to_cp437('@'),
    );
}
