use std::env;
use std::path::PathBuf;

use bracket_geometry::prelude::Point;
use bracket_terminal::prelude::*;
use dunesense::config::GameConfig;
use dunesense::input::{Controller, InputEffect};
use dunesense::render::{
    Hud, draw_log, draw_map, draw_pending_cursor, draw_revealed_start, draw_sensors,
};
use dunesense::scripted_input::ScriptedInput;
use dunesense::session::{GameSession, SessionError};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const SCREEN_HEIGHT: i32 = 50;
const MAP_ORIGIN_X: i32 = 4;
const MAP_ORIGIN_Y: i32 = 7;
const LOG_RESERVED_ROWS: i32 = 8;
const LOG_PANEL_START: i32 = SCREEN_HEIGHT - 7;
const LOG_ENV: &str = "DUNESENSE_LOG";

struct DuneState {
    config: GameConfig,
    session: GameSession,
    controller: Controller,
    hud: Hud,
    script: Option<ScriptedInput>,
    games_played: u64,
    frame: u64,
}

impl GameState for DuneState {
    fn tick(&mut self, ctx: &mut BTerm) {
        self.frame = self.frame.wrapping_add(1);
        let key = match self.script.as_mut() {
            Some(script) => script.next_key(),
            None => ctx.key,
        };
        if let Some(key) = key {
            self.handle_input(ctx, key);
        }
        ctx.cls();
        self.draw_scene(ctx);
    }
}

impl DuneState {
    fn new(config: GameConfig, script: Option<ScriptedInput>) -> Result<Self, SessionError> {
        let session = GameSession::new(config.clone())?;
        Ok(Self {
            config,
            session,
            controller: Controller::new(),
            hud: Hud::new(),
            script,
            games_played: 1,
            frame: 0,
        })
    }

    fn handle_input(&mut self, ctx: &mut BTerm, key: VirtualKeyCode) {
        let was_over = self.session.is_over();
        let effect = self.controller.handle_key(key, &mut self.session);
        if !was_over && self.session.record_win(self.games_played) {
            info!(games = self.games_played, "Puzzle solved");
        }
        match effect {
            InputEffect::None => {}
            InputEffect::Quit => ctx.quit(),
            InputEffect::NewGame => self.new_game(),
            InputEffect::Snapshot => match self.session.write_snapshot(".") {
                Ok(path) => self
                    .session
                    .push_log_entry(format!("Snapshot written to {}", path.display())),
                Err(err) => self.session.push_log_entry(err.to_string()),
            },
        }
    }

    fn new_game(&mut self) {
        if let Some(outcome) = self.session.outcome() {
            info!(?outcome, games = self.games_played, "Starting the next game");
        }
        let seed = self
            .config
            .seed
            .map(|seed| seed.wrapping_add(self.games_played));
        match GameSession::new(self.config.clone().with_seed(seed)) {
            Ok(session) => {
                self.session = session;
                self.controller.reset();
                self.games_played += 1;
            }
            Err(err) => {
                error!(%err, "Could not start a new game");
                self.session.push_log_entry(err.to_string());
            }
        }
    }

    fn draw_scene(&mut self, ctx: &mut BTerm) {
        let origin = Point::new(MAP_ORIGIN_X, MAP_ORIGIN_Y);
        self.hud.draw(ctx, &self.session, &self.controller, self.frame);
        draw_map(ctx, self.session.display_map(), origin, LOG_RESERVED_ROWS);
        draw_sensors(ctx, &self.session, self.session.cursor(), origin);
        if let Some(cursor) = self.controller.pending_cursor() {
            draw_pending_cursor(ctx, cursor, origin);
        }
        if let Some(start) = self.session.revealed_start() {
            draw_revealed_start(ctx, start, origin);
        }
        draw_log(ctx, self.session.log(), LOG_PANEL_START);
    }
}

struct Args {
    config: Option<PathBuf>,
    script: Option<PathBuf>,
}

fn parse_args() -> Result<Args, String> {
    let mut args = Args {
        config: None,
        script: None,
    };
    let mut iter = env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--script" => {
                let path = iter.next().ok_or("--script needs a file")?;
                args.script = Some(PathBuf::from(path));
            }
            _ if args.config.is_none() && !arg.starts_with("--") => {
                args.config = Some(PathBuf::from(arg));
            }
            _ => return Err(format!("unexpected argument `{arg}`")),
        }
    }
    Ok(args)
}

fn init_logging() {
    // The console belongs to the game, so logs only go to stderr on request.
    if env::var_os(LOG_ENV).is_none() {
        return;
    }
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_env(LOG_ENV))
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> BError {
    init_logging();

    let args = parse_args()?;
    let config = match &args.config {
        Some(path) => GameConfig::from_file(path)?,
        None => GameConfig::default(),
    };
    let script = args.script.as_ref().map(ScriptedInput::from_file).transpose()?;
    let game_state = DuneState::new(config, script)?;

    let context = BTermBuilder::simple80x50()
        .with_title("Dunesense · Desert Puzzle")
        .build()?;
    main_loop(context, game_state)
}
