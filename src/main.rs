pub mod ui;

use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use dryfire::{
    clock::{SystemTimeSource, TimeSource},
    config::{CueBackend, FileSettingsStore, Settings, SettingsStore},
    cue::{BellPlayer, CuePlayer, SilentPlayer},
    runtime::{CrosstermEventSource, DrillEvent, DrillEventSource, FixedTicker, Runner, Ticker},
    util::{numeric_chars, parse_count, parse_secs},
    DrillConfig, DrillSnapshot, DrillTimer, TimerMode,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Frame, Terminal,
};
use std::{
    error::Error,
    io::{self, stdin},
    sync::mpsc::Receiver,
};

/// interval timer for dry-fire and repetition drills
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "An interval timer for repetition drills: each rep waits out a delay, then runs an active par time, with an audible cue at every boundary. Pausing never eats into the drill."
)]
pub struct Cli {
    /// active (par) time per rep, in seconds
    #[clap(short = 'p', long, default_value = "0")]
    par: String,

    /// waiting time before each rep, in seconds
    #[clap(short = 'd', long, default_value = "0")]
    delay: String,

    /// number of reps
    #[clap(short = 'r', long, default_value = "0")]
    reps: String,

    /// tick interval in milliseconds, 1 to 10 (overrides the settings file)
    #[clap(long)]
    tick_ms: Option<u64>,

    /// how cues are played (overrides the settings file)
    #[clap(long, value_enum)]
    cue: Option<CueBackend>,

    /// start the drill as soon as the app opens
    #[clap(long)]
    start: bool,

    /// run without the terminal UI, printing a JSON snapshot at every phase change
    #[clap(long)]
    headless: bool,

    /// write the effective settings to the settings file and exit
    #[clap(long)]
    save_settings: bool,
}

impl Cli {
    /// Malformed numbers read as zero, like the fields in the UI
    fn to_drill_config(&self) -> DrillConfig {
        DrillConfig::new(
            parse_secs(&self.par),
            parse_secs(&self.delay),
            parse_count(&self.reps),
        )
    }

    fn apply_to(&self, mut settings: Settings) -> Settings {
        if let Some(tick_ms) = self.tick_ms {
            settings.tick_ms = tick_ms;
        }
        if let Some(cue) = self.cue {
            settings.cue = cue;
        }
        settings
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Par,
    Delay,
    Reps,
}

impl Field {
    fn next(self) -> Self {
        match self {
            Field::Par => Field::Delay,
            Field::Delay => Field::Reps,
            Field::Reps => Field::Par,
        }
    }

    fn index(self) -> usize {
        match self {
            Field::Par => 0,
            Field::Delay => 1,
            Field::Reps => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    Continue,
    Quit,
}

pub struct App<T: TimeSource> {
    pub timer: DrillTimer<T, Box<dyn CuePlayer>>,
    /// raw text of the par, delay and reps fields
    pub fields: [String; 3],
    pub focus: Field,
    pub snapshot: DrillSnapshot,
    snapshots: Receiver<DrillSnapshot>,
}

impl<T: TimeSource> App<T> {
    pub fn new(cli: &Cli, source: T, player: Box<dyn CuePlayer>) -> Self {
        let mut timer = DrillTimer::new(cli.to_drill_config(), source, player);
        let snapshots = timer.subscribe();
        let snapshot = timer.snapshot();
        Self {
            timer,
            fields: [cli.par.clone(), cli.delay.clone(), cli.reps.clone()],
            focus: Field::Par,
            snapshot,
            snapshots,
        }
    }

    pub fn field(&self, field: Field) -> &str {
        &self.fields[field.index()]
    }

    /// Take the latest published snapshot. Returns true if it changed.
    pub fn refresh(&mut self) -> bool {
        match self.snapshots.try_iter().last() {
            Some(latest) if latest != self.snapshot => {
                self.snapshot = latest;
                true
            }
            _ => false,
        }
    }

    fn fields_config(&self) -> DrillConfig {
        DrillConfig::new(
            parse_secs(&self.fields[0]),
            parse_secs(&self.fields[1]),
            parse_count(&self.fields[2]),
        )
    }

    fn edit_field(&mut self, edit: impl FnOnce(&mut String)) {
        if self.timer.mode() != TimerMode::Idle {
            return;
        }
        let text = &mut self.fields[self.focus.index()];
        edit(text);
        *text = numeric_chars(text);
        let config = self.fields_config();
        self.timer.set_config(config);
    }

    pub fn on_key(&mut self, key: KeyEvent) -> KeyOutcome {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return KeyOutcome::Quit;
        }

        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => return KeyOutcome::Quit,
            KeyCode::Char(' ') | KeyCode::Enter => self.timer.toggle(),
            KeyCode::Char('p') => self.timer.pause(),
            KeyCode::Char('r') => self.timer.resume(),
            KeyCode::Char('x') => self.timer.stop(),
            KeyCode::Tab => {
                if self.timer.mode() == TimerMode::Idle {
                    self.focus = self.focus.next();
                }
            }
            KeyCode::Backspace => self.edit_field(|text| {
                text.pop();
            }),
            KeyCode::Char(c) if c.is_ascii_digit() || c == '.' => {
                self.edit_field(|text| text.push(c))
            }
            _ => {}
        }
        KeyOutcome::Continue
    }
}

fn build_player(settings: &Settings, headless: bool) -> Box<dyn CuePlayer> {
    match settings.cue {
        CueBackend::Silent => Box::new(SilentPlayer),
        #[cfg(feature = "audio")]
        CueBackend::Sound => Box::new(dryfire::cue::SoundPlayer::new(
            settings.sound_dir(),
            settings.volume,
        )),
        #[cfg(not(feature = "audio"))]
        CueBackend::Sound => {
            tracing::warn!("built without the `audio` feature, using the terminal bell");
            bell(headless)
        }
        CueBackend::Bell => bell(headless),
    }
}

// headless output is JSON on stdout, so bells go to stderr there
fn bell(headless: bool) -> Box<dyn CuePlayer> {
    if headless {
        Box::new(BellPlayer::new(io::stderr()))
    } else {
        Box::new(BellPlayer::stdout())
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let _log_guard = dryfire::logging::init();

    let store = FileSettingsStore::new();
    let settings = cli.apply_to(store.load());

    if cli.save_settings {
        store.save(&settings)?;
        println!("settings saved to {}", store.path().display());
        return Ok(());
    }

    let ticker = FixedTicker::new(settings.tick_interval());
    let player = build_player(&settings, cli.headless);

    if cli.headless {
        return run_headless(&cli, player, &ticker);
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(&cli, SystemTimeSource, player);
    if cli.start {
        app.timer.start();
    }
    let mut runner = Runner::new(CrosstermEventSource::new(), ticker);
    let result = start_tui(&mut terminal, &mut app, &mut runner);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen,)?;
    terminal.show_cursor()?;

    result
}

fn start_tui<B: Backend, T: TimeSource, E: DrillEventSource, K: Ticker>(
    terminal: &mut Terminal<B>,
    app: &mut App<T>,
    runner: &mut Runner<E, K>,
) -> Result<(), Box<dyn Error>> {
    app.refresh();
    terminal.draw(|f| ui(app, f))?;

    loop {
        let redraw = match runner.step() {
            DrillEvent::Tick => {
                app.timer.tick();
                false
            }
            DrillEvent::Resize => true,
            DrillEvent::Key(key) => {
                if app.on_key(key) == KeyOutcome::Quit {
                    break;
                }
                true
            }
        };

        if app.refresh() || redraw {
            terminal.draw(|f| ui(app, f))?;
        }
    }

    app.timer.stop();
    Ok(())
}

/// Run one drill to completion on the real clock, printing a JSON line each
/// time the mode, rep or phase changes.
fn run_headless<K: Ticker>(
    cli: &Cli,
    player: Box<dyn CuePlayer>,
    ticker: &K,
) -> Result<(), Box<dyn Error>> {
    let config = cli.to_drill_config();
    if !config.is_runnable() {
        let mut cmd = Cli::command();
        cmd.error(
            ErrorKind::ValueValidation,
            "a drill needs --reps above zero and a par or delay time above zero",
        )
        .exit();
    }

    let mut timer = DrillTimer::new(config, SystemTimeSource, player);
    let snapshots = timer.subscribe();

    let printer = std::thread::spawn(move || -> Result<(), serde_json::Error> {
        let mut last: Option<DrillSnapshot> = None;
        for snap in snapshots {
            let changed = last.map_or(true, |prev| {
                (prev.timer_mode, prev.current_rep, prev.phase)
                    != (snap.timer_mode, snap.current_rep, snap.phase)
            });
            if changed {
                println!("{}", serde_json::to_string(&snap)?);
                last = Some(snap);
            }
        }
        Ok(())
    });

    timer.run_to_completion(ticker);
    drop(timer);

    match printer.join() {
        Ok(result) => Ok(result?),
        Err(_) => Err("snapshot printer panicked".into()),
    }
}

fn ui<T: TimeSource>(app: &mut App<T>, f: &mut Frame) {
    f.render_widget(&*app, f.area());
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use dryfire::{
        clock::ManualTimeSource,
        cue::{Cue, RecordingPlayer},
        Phase,
    };
    use ratatui::{backend::TestBackend, Terminal};
    use std::time::Duration;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn test_app(args: &[&str]) -> (ManualTimeSource, RecordingPlayer, App<ManualTimeSource>) {
        let mut argv = vec!["dryfire"];
        argv.extend_from_slice(args);
        let cli = Cli::parse_from(argv);
        let time = ManualTimeSource::new();
        let cues = RecordingPlayer::new();
        let app = App::new(&cli, time.clone(), Box::new(cues.clone()));
        (time, cues, app)
    }

    fn buffer_text(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        buffer
            .content
            .chunks(buffer.area.width as usize)
            .map(|row| row.iter().map(|c| c.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_cli_default_values() {
        let cli = Cli::parse_from(["dryfire"]);

        assert_eq!(cli.par, "0");
        assert_eq!(cli.delay, "0");
        assert_eq!(cli.reps, "0");
        assert_eq!(cli.tick_ms, None);
        assert_eq!(cli.cue, None);
        assert!(!cli.start);
        assert!(!cli.headless);
    }

    #[test]
    fn test_cli_drill_config() {
        let cli = Cli::parse_from(["dryfire", "-p", "1.5", "-d", "2", "-r", "10"]);
        assert_eq!(cli.to_drill_config(), DrillConfig::new(1.5, 2.0, 10));
    }

    #[test]
    fn test_cli_malformed_values_read_as_zero() {
        let cli = Cli::parse_from(["dryfire", "--par", "fast", "--reps", "1.2.3"]);
        let config = cli.to_drill_config();
        assert_eq!(config.par_time_secs, 0.0);
        assert_eq!(config.rep_count, 0);
        assert!(!config.is_runnable());
    }

    #[test]
    fn test_cli_overrides_settings() {
        let cli = Cli::parse_from(["dryfire", "--tick-ms", "5", "--cue", "silent"]);
        let settings = cli.apply_to(Settings::default());
        assert_eq!(settings.tick_ms, 5);
        assert_eq!(settings.cue, CueBackend::Silent);

        let untouched = Cli::parse_from(["dryfire"]).apply_to(Settings::default());
        assert_eq!(untouched, Settings::default());
    }

    #[test]
    fn test_space_toggles_run() {
        let (time, _cues, mut app) = test_app(&["-p", "1", "-d", "0.5", "-r", "2"]);
        app.on_key(key(KeyCode::Char(' ')));
        assert_eq!(app.timer.mode(), TimerMode::Running);

        time.advance(Duration::from_millis(300));
        app.timer.tick();
        app.on_key(key(KeyCode::Char(' ')));
        assert_eq!(app.timer.mode(), TimerMode::Paused);

        time.advance(Duration::from_secs(2));
        app.on_key(key(KeyCode::Enter));
        assert_eq!(app.timer.mode(), TimerMode::Running);
        assert_eq!(app.timer.elapsed(), Duration::from_millis(300));
    }

    #[test]
    fn test_explicit_commands() {
        let (_time, _cues, mut app) = test_app(&["-p", "1", "-d", "0.5", "-r", "2"]);
        app.on_key(key(KeyCode::Char('p')));
        assert_eq!(app.timer.mode(), TimerMode::Idle);
        app.on_key(key(KeyCode::Enter));
        app.on_key(key(KeyCode::Char('p')));
        assert_eq!(app.timer.mode(), TimerMode::Paused);
        app.on_key(key(KeyCode::Char('r')));
        assert_eq!(app.timer.mode(), TimerMode::Running);
        app.on_key(key(KeyCode::Char('x')));
        assert_eq!(app.timer.mode(), TimerMode::Idle);
    }

    #[test]
    fn test_quit_keys() {
        let (_time, _cues, mut app) = test_app(&[]);
        assert_eq!(app.on_key(key(KeyCode::Esc)), KeyOutcome::Quit);
        assert_eq!(app.on_key(key(KeyCode::Char('q'))), KeyOutcome::Quit);
        assert_eq!(
            app.on_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            KeyOutcome::Quit
        );
        assert_eq!(app.on_key(key(KeyCode::Char('z'))), KeyOutcome::Continue);
    }

    #[test]
    fn test_editing_fields_updates_config() {
        let (_time, _cues, mut app) = test_app(&[]);
        app.on_key(key(KeyCode::Backspace));
        app.on_key(key(KeyCode::Char('2')));
        app.on_key(key(KeyCode::Char('.')));
        app.on_key(key(KeyCode::Char('5')));
        app.on_key(key(KeyCode::Tab));
        app.on_key(key(KeyCode::Char('1')));
        app.on_key(key(KeyCode::Tab));
        app.on_key(key(KeyCode::Backspace));
        app.on_key(key(KeyCode::Char('3')));

        assert_eq!(app.field(Field::Par), "2.5");
        assert_eq!(app.field(Field::Delay), "01");
        assert_eq!(app.field(Field::Reps), "3");
        assert_eq!(app.timer.config(), &DrillConfig::new(2.5, 1.0, 3));
    }

    #[test]
    fn test_fields_locked_while_running() {
        let (_time, _cues, mut app) = test_app(&["-p", "1", "-d", "1", "-r", "1"]);
        app.on_key(key(KeyCode::Char(' ')));
        app.on_key(key(KeyCode::Tab));
        app.on_key(key(KeyCode::Char('9')));
        assert_eq!(app.focus, Field::Par);
        assert_eq!(app.field(Field::Par), "1");
        assert_eq!(app.timer.config().par_time_secs, 1.0);
    }

    #[test]
    fn test_start_ignored_without_reps() {
        let (_time, cues, mut app) = test_app(&["-p", "1", "-d", "1"]);
        app.on_key(key(KeyCode::Char(' ')));
        assert_eq!(app.timer.mode(), TimerMode::Idle);
        assert!(!app.refresh());
        assert!(cues.played().is_empty());
    }

    #[test]
    fn test_refresh_takes_latest_snapshot() {
        let (time, _cues, mut app) = test_app(&["-p", "1", "-d", "0.5", "-r", "2"]);
        app.timer.start();
        for _ in 0..60 {
            time.advance(Duration::from_millis(10));
            app.timer.tick();
        }
        assert!(app.refresh());
        assert_eq!(app.snapshot.phase, Phase::Active);
        assert_eq!(app.snapshot.current_rep, 1);
        assert!(!app.refresh());
    }

    #[test]
    fn test_ui_idle_screen() {
        let (_time, _cues, mut app) = test_app(&["-p", "1", "-d", "0.5", "-r", "2"]);
        let mut terminal = Terminal::new(TestBackend::new(80, 30)).unwrap();
        terminal.draw(|f| ui(&mut app, f)).unwrap();
        let text = buffer_text(&terminal);
        assert!(text.contains("DRYFIRE"));
        assert!(text.contains("Par Time"));
        assert!(text.contains("00:00:03"));
        assert!(text.contains("IDLE"));
    }

    #[test]
    fn test_ui_running_screen() {
        let (time, cues, mut app) = test_app(&["-p", "1", "-d", "0.5", "-r", "2"]);
        app.timer.start();
        for _ in 0..160 {
            time.advance(Duration::from_millis(10));
            app.timer.tick();
        }
        app.refresh();
        let mut terminal = Terminal::new(TestBackend::new(80, 30)).unwrap();
        terminal.draw(|f| ui(&mut app, f)).unwrap();
        let text = buffer_text(&terminal);
        assert!(text.contains("RUNNING"));
        assert!(text.contains("2 / 2"));
        assert!(text.contains("DELAY"));
        assert_eq!(cues.played(), vec![Cue::ActiveStart, Cue::RepEnd]);
    }

    #[test]
    fn test_ui_tiny_terminal_does_not_panic() {
        let (_time, _cues, mut app) = test_app(&["-p", "1", "-r", "1"]);
        let mut terminal = Terminal::new(TestBackend::new(10, 3)).unwrap();
        terminal.draw(|f| ui(&mut app, f)).unwrap();
    }

    #[test]
    fn test_build_player_silent() {
        let settings = Settings {
            cue: CueBackend::Silent,
            ..Settings::default()
        };
        let mut player = build_player(&settings, true);
        assert!(player.play_cue(Cue::ActiveStart).is_ok());
    }
}
