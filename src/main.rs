mod ui;

use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{
        DisableMouseCapture, EnableMouseCapture, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, KeyboardEnhancementFlags, MouseButton, MouseEvent, MouseEventKind,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    execute,
    terminal::{
        disable_raw_mode, enable_raw_mode, supports_keyboard_enhancement, EnterAlternateScreen,
        LeaveAlternateScreen,
    },
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Frame, Terminal,
};
use itertools::Itertools;
use std::{
    error::Error,
    fs::{self, File, OpenOptions},
    io::{self, stdin, Write},
    path::{Path, PathBuf},
    sync::Mutex,
};
use tracing_subscriber::EnvFilter;

use cubetime::{
    app_dirs::AppDirs,
    archive::{write_csv, SolveArchive},
    clock::{Clock, SystemClock},
    config::{Config, ConfigStore, FileConfigStore},
    events::{event_name, next_event, previous_event, require_event, WCA_EVENTS},
    practice::{PracticeRound, ROUND_SIZE},
    runtime::{AppEvent, CrosstermEventSource, FixedTicker, Runner},
    scheduler::DeadlineScheduler,
    scramble::{scramble_or_placeholder, RandomMoveScrambler, ScrambleProvider},
    session::{validate_session_id, FileSessionStore, Session, SessionStore},
    solve::SolveEntry,
    timer::{InputChannel, InspectionMode, SolveResult, Task, Timer, TimerEvent, TimerState},
    warning::{NullSink, TerminalBell, Warning, WarningSink},
};

const DEFAULT_SESSION: &str = "default";
const LOG_ENV: &str = "CUBETIME_LOG";
const RECENT_SOLVES: usize = 5;

/// speedcubing timer tui with WCA inspection and session averages
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A terminal speedcubing timer with WCA inspection (15s plus 2s grace), hold-to-start, automatic +2/DNF penalties, scrambles for every WCA event, and session statistics (best, mo3, ao5, ao12)."
)]
pub struct Cli {
    /// WCA event id to time (see --list-events)
    #[clap(short = 'e', long)]
    event: Option<String>,

    /// skip the 15 second inspection for this run
    #[clap(long)]
    no_inspection: bool,

    /// do not ring the terminal bell for inspection warnings
    #[clap(long)]
    mute: bool,

    /// storage id of the session to load and save (letters, digits, - and _)
    #[clap(long, default_value = DEFAULT_SESSION)]
    session: String,

    /// print every WCA event id and name, then exit
    #[clap(long)]
    list_events: bool,

    /// print the stored session's statistics, then exit
    #[clap(long)]
    stats: bool,

    /// write every recorded solve as CSV to PATH, then exit
    #[clap(long, value_name = "PATH")]
    export: Option<PathBuf>,
}

impl Cli {
    /// Overrides for this run only
    fn apply(&self, config: &mut Config) {
        if let Some(event) = &self.event {
            config.event = event.clone();
        }
        if self.no_inspection {
            config.inspection = InspectionMode::Off;
        }
        if self.mute {
            config.sound = false;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Timing,
    Help,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct App<C: Clock> {
    pub timer: Timer<C, DeadlineScheduler<Task>>,
    pub session: Session,
    pub state: AppState,
    /// Fastest archived solve for the selected event
    pub best_ever: Option<u64>,
    pub last_warning: Option<Warning>,
    pub practice: Option<PracticeRound>,
    /// Terminal reports key releases; without it Space works as a latch
    pub key_release: bool,
    session_id: String,
    store: Box<dyn SessionStore>,
    archive: Option<SolveArchive>,
    scrambler: Box<dyn ScrambleProvider>,
    sink: Box<dyn WarningSink>,
}

impl<C: Clock> App<C> {
    pub fn new(clock: C, config: &Config, session_id: &str, store: Box<dyn SessionStore>) -> Self {
        let session = match store.load(session_id) {
            Some(snapshot) => Session::from_snapshot(snapshot),
            None => Session::new(&config.event, String::new()),
        };
        let practice = store
            .load_practice(session_id)
            .and_then(PracticeRound::from_snapshot)
            .filter(|round| round.event_id() == session.selected_event());

        let mut app = Self {
            timer: Timer::new(clock, DeadlineScheduler::new(), config.inspection),
            session,
            state: AppState::Timing,
            best_ever: None,
            last_warning: None,
            practice,
            key_release: false,
            session_id: session_id.to_string(),
            store,
            archive: None,
            scrambler: Box::new(RandomMoveScrambler::new()),
            sink: Box::new(NullSink),
        };
        if app.practice.is_some() {
            app.sync_practice();
        } else if app.session.current_scramble().is_empty() {
            app.new_scramble();
        }
        app
    }

    pub fn with_archive(mut self, archive: Option<SolveArchive>) -> Self {
        self.archive = archive;
        // solves recorded while the archive was unavailable
        if let Some(archive) = self.archive.as_mut() {
            if let Err(e) = archive.record_batch(self.session.history()) {
                tracing::warn!(error = %e, "failed to archive session history");
            }
        }
        self.refresh_best();
        self
    }

    pub fn with_scrambler(mut self, scrambler: Box<dyn ScrambleProvider>) -> Self {
        self.scrambler = scrambler;
        self
    }

    pub fn with_sink(mut self, sink: Box<dyn WarningSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Flow {
        if key.code == KeyCode::Char(' ') {
            self.handle_space(key.kind);
            return Flow::Continue;
        }
        if key.kind != KeyEventKind::Press {
            return Flow::Continue;
        }
        if key.code == KeyCode::Esc
            || (key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c'))
        {
            return Flow::Quit;
        }

        if self.state == AppState::Help {
            self.state = AppState::Timing;
            return Flow::Continue;
        }

        match key.code {
            KeyCode::Char('?') => self.state = AppState::Help,
            KeyCode::Char('r') => self.reset_timer(),
            KeyCode::Char('n') if self.practice.is_some() => self.step_practice(true),
            KeyCode::Char('n') => {
                if !self.timer.state().is_active() {
                    self.timer.reset();
                    self.new_scramble();
                }
            }
            KeyCode::Right => self.step_practice(true),
            KeyCode::Left => self.step_practice(false),
            KeyCode::Char('g') => self.regenerate_practice(),
            KeyCode::Char('p') => self.toggle_practice(),
            KeyCode::Tab => self.select_event(next_event(self.session.selected_event()).id),
            KeyCode::BackTab => {
                self.select_event(previous_event(self.session.selected_event()).id)
            }
            KeyCode::Char('c') => self.clear_session(),
            KeyCode::Char('i') => self.toggle_inspection(),
            _ => {}
        }
        Flow::Continue
    }

    fn handle_space(&mut self, kind: KeyEventKind) {
        match (self.key_release, kind) {
            // auto-repeat of a held key
            (_, KeyEventKind::Repeat) => {}
            (true, KeyEventKind::Press) => self.press(InputChannel::Keyboard),
            (true, KeyEventKind::Release) => self.release(InputChannel::Keyboard),
            (false, KeyEventKind::Release) => {}
            (false, KeyEventKind::Press) => {
                if self.timer.state() == TimerState::Running
                    || !self.timer.is_held(InputChannel::Keyboard)
                {
                    self.press(InputChannel::Keyboard);
                } else {
                    self.release(InputChannel::Keyboard);
                }
            }
        }
    }

    pub fn handle_mouse(&mut self, mouse: MouseEvent) {
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => self.press(InputChannel::Pointer),
            MouseEventKind::Up(MouseButton::Left) => self.release(InputChannel::Pointer),
            _ => {}
        }
    }

    /// Fire whatever the timer has due
    pub fn on_tick(&mut self) {
        let events = self.timer.poll();
        self.apply(events);
    }

    pub fn press(&mut self, channel: InputChannel) {
        self.state = AppState::Timing;
        self.sink.acquire();
        let events = self.timer.press(channel);
        self.apply(events);
    }

    pub fn release(&mut self, channel: InputChannel) {
        let events = self.timer.release(channel);
        self.apply(events);
    }

    fn apply(&mut self, events: Vec<TimerEvent>) {
        for event in events {
            match event {
                TimerEvent::InspectionStarted | TimerEvent::Started { .. } => {
                    self.last_warning = None
                }
                TimerEvent::Armed => {}
                TimerEvent::Warning(warning) => {
                    self.sink.signal(warning);
                    self.last_warning = Some(warning);
                }
                TimerEvent::Stopped(result) => self.finish_solve(result),
            }
        }
    }

    fn finish_solve(&mut self, result: SolveResult) {
        let created_at_ms = chrono::Utc::now().timestamp_millis();
        let entry = self.session.record(result, created_at_ms).clone();
        if let Some(archive) = &self.archive {
            if let Err(e) = archive.record(&entry) {
                tracing::warn!(error = %e, id = %entry.id, "failed to archive solve");
            }
        }
        self.refresh_best();
        match self.practice.as_mut() {
            Some(round) => {
                round.next();
                self.sync_practice();
            }
            None => self.new_scramble(),
        }
    }

    pub fn reset_timer(&mut self) {
        self.timer.reset();
        self.last_warning = None;
    }

    pub fn new_scramble(&mut self) {
        let scramble =
            scramble_or_placeholder(self.scrambler.as_mut(), self.session.selected_event());
        self.session.set_scramble(scramble);
        self.save_session();
    }

    /// Switch event. Ignored mid-solve.
    pub fn select_event(&mut self, event_id: &str) {
        if self.timer.state().is_active() || event_id == self.session.selected_event() {
            return;
        }
        self.reset_timer();
        self.session.select_event(event_id);
        tracing::info!(event = event_id, "event selected");
        self.refresh_best();
        if self.practice.is_some() {
            self.practice = Some(PracticeRound::generate(
                self.scrambler.as_mut(),
                event_id,
                ROUND_SIZE,
            ));
            self.sync_practice();
        } else {
            self.new_scramble();
        }
    }

    /// Start a practice round for the selected event, or end the current one
    pub fn toggle_practice(&mut self) {
        if self.timer.state().is_active() {
            return;
        }
        self.reset_timer();
        if self.practice.take().is_some() {
            if let Err(e) = self.store.remove_practice(&self.session_id) {
                tracing::warn!(error = %e, session = %self.session_id, "failed to remove practice round");
            }
            tracing::info!("practice round ended");
            self.new_scramble();
        } else {
            let round = PracticeRound::generate(
                self.scrambler.as_mut(),
                self.session.selected_event(),
                ROUND_SIZE,
            );
            tracing::info!(event = round.event_id(), "practice round started");
            self.practice = Some(round);
            self.sync_practice();
        }
    }

    pub fn step_practice(&mut self, forward: bool) {
        if self.timer.state().is_active() {
            return;
        }
        let Some(round) = self.practice.as_mut() else {
            return;
        };
        let moved = if forward {
            round.next()
        } else {
            round.previous()
        };
        if moved {
            self.timer.reset();
            self.sync_practice();
        }
    }

    pub fn regenerate_practice(&mut self) {
        if self.timer.state().is_active() {
            return;
        }
        if let Some(round) = self.practice.as_mut() {
            round.regenerate(self.scrambler.as_mut());
            self.timer.reset();
            self.sync_practice();
        }
    }

    /// Show the round's current scramble and persist both snapshots
    fn sync_practice(&mut self) {
        let Some(round) = &self.practice else {
            return;
        };
        self.session.set_scramble(round.current().to_string());
        if let Err(e) = self.store.save_practice(&self.session_id, &round.snapshot()) {
            tracing::warn!(error = %e, session = %self.session_id, "failed to save practice round");
        }
        self.save_session();
    }

    pub fn toggle_inspection(&mut self) {
        if self.timer.state().is_active() {
            return;
        }
        let mode = self.timer.mode().toggled();
        self.timer.set_mode(mode);
        self.last_warning = None;
    }

    pub fn clear_session(&mut self) {
        if self.timer.state().is_active() {
            return;
        }
        self.reset_timer();
        self.session.clear();
        self.save_session();
    }

    pub fn shutdown(&mut self) {
        self.sink.release();
        self.save_session();
    }

    fn refresh_best(&mut self) {
        self.best_ever = self.archive.as_ref().and_then(|archive| {
            archive
                .best_for_event(self.session.selected_event())
                .unwrap_or_else(|e| {
                    tracing::warn!(error = %e, "failed to read archive");
                    None
                })
        });
    }

    fn save_session(&self) {
        if let Err(e) = self.store.save(&self.session_id, &self.session.snapshot()) {
            tracing::warn!(error = %e, session = %self.session_id, "failed to save session");
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_logging();

    if let Some(event) = &cli.event {
        if let Err(e) = require_event(event) {
            let mut cmd = Cli::command();
            cmd.error(ErrorKind::InvalidValue, e).exit();
        }
    }

    if let Err(e) = validate_session_id(&cli.session) {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::InvalidValue, e).exit();
    }

    if cli.list_events {
        print_events(&mut io::stdout().lock())?;
        return Ok(());
    }

    let config_store = FileConfigStore::new();
    let saved_config = config_store.load();
    let mut config = saved_config.clone();
    cli.apply(&mut config);

    let store = FileSessionStore::new();

    if cli.stats || cli.export.is_some() {
        let session = store
            .load(&cli.session)
            .map(Session::from_snapshot)
            .unwrap_or_else(|| Session::new(&config.event, String::new()));
        let archive = open_archive();

        if cli.stats {
            let event_id = session.selected_event();
            let (best, recent) = match &archive {
                Some(archive) => (
                    archive.best_for_event(event_id)?,
                    archive.recent_for_event(event_id, RECENT_SOLVES)?,
                ),
                None => (None, Vec::new()),
            };
            print_stats(&mut io::stdout().lock(), &cli.session, &session, best, &recent)?;
        }
        if let Some(path) = &cli.export {
            let n = export(path, archive.as_ref(), &session)?;
            println!("exported {n} solves to {}", path.display());
        }
        return Ok(());
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let mut app = App::new(SystemClock::new(), &config, &cli.session, Box::new(store))
        .with_archive(open_archive());
    if config.sound {
        app = app.with_sink(Box::new(TerminalBell::stdout()));
    }
    if let Some(event) = &cli.event {
        app.select_event(event);
    }

    enable_raw_mode()?;
    app.key_release = supports_keyboard_enhancement().unwrap_or(false);
    tracing::info!(key_release = app.key_release, "terminal ready");

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    if app.key_release {
        execute!(
            stdout,
            PushKeyboardEnhancementFlags(
                KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
                    | KeyboardEnhancementFlags::REPORT_EVENT_TYPES
            )
        )?;
    }
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(&mut terminal, &mut app, config.tick_rate_ms);
    app.shutdown();

    if app.key_release {
        execute!(terminal.backend_mut(), PopKeyboardEnhancementFlags)?;
    }
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableMouseCapture,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;

    // changes made inside the tui persist; cli overrides do not
    let mut updated = saved_config.clone();
    if app.session.selected_event() != config.event {
        updated.event = app.session.selected_event().to_string();
    }
    if app.timer.mode() != config.inspection {
        updated.inspection = app.timer.mode();
    }
    if updated != saved_config {
        if let Err(e) = config_store.save(&updated) {
            tracing::warn!(error = %e, "failed to save config");
        }
    }

    result
}

fn start_tui<B: Backend, C: Clock>(
    terminal: &mut Terminal<B>,
    app: &mut App<C>,
    tick_rate_ms: u64,
) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::from_millis(tick_rate_ms),
    );

    loop {
        terminal.draw(|f| ui(app, f))?;

        let flow = match runner.step() {
            AppEvent::Key(key) => app.handle_key(key),
            AppEvent::Mouse(mouse) => {
                app.handle_mouse(mouse);
                Flow::Continue
            }
            AppEvent::Resize | AppEvent::Tick => Flow::Continue,
        };
        if flow == Flow::Quit {
            break;
        }
        // a steady stream of input must not starve the scheduler
        app.on_tick();
    }

    Ok(())
}

fn ui<C: Clock>(app: &App<C>, f: &mut Frame) {
    let area = f.area();
    match app.state {
        AppState::Timing => f.render_widget(app, area),
        AppState::Help => ui::render_help(area, f.buffer_mut()),
    }
}

/// Log to a file under the state dir; stdout belongs to the tui
fn init_logging() {
    let Some(path) = AppDirs::log_path() else {
        return;
    };
    if let Some(parent) = path.parent() {
        if fs::create_dir_all(parent).is_err() {
            return;
        }
    }
    let Ok(file) = OpenOptions::new().create(true).append(true).open(&path) else {
        return;
    };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init();
}

fn open_archive() -> Option<SolveArchive> {
    match SolveArchive::open_default() {
        Ok(archive) => Some(archive),
        Err(e) => {
            tracing::warn!(error = %e, "solve archive unavailable");
            None
        }
    }
}

fn print_events<W: Write>(out: &mut W) -> io::Result<()> {
    for event in WCA_EVENTS.iter() {
        writeln!(out, "{}\t{}", event.id, event.name)?;
    }
    Ok(())
}

fn print_stats<W: Write>(
    out: &mut W,
    session_id: &str,
    session: &Session,
    best_ever: Option<u64>,
    recent: &[SolveEntry],
) -> io::Result<()> {
    let stats = session.stats();
    writeln!(
        out,
        "session {session_id} ({})",
        event_name(session.selected_event())
    )?;
    writeln!(out, "{:<9}{}", "solves", session.len())?;
    writeln!(out, "{:<9}{}", "current", stats.current)?;
    writeln!(out, "{:<9}{}", "best", stats.best)?;
    writeln!(out, "{:<9}{}", "mo3", stats.mo3)?;
    writeln!(out, "{:<9}{}", "ao5", stats.ao5)?;
    writeln!(out, "{:<9}{}", "ao12", stats.ao12)?;
    if let Some(ms) = best_ever {
        writeln!(out, "all-time best {}", cubetime::util::format_time(ms))?;
    }
    if !recent.is_empty() {
        writeln!(
            out,
            "{:<9}{}",
            "recent",
            recent.iter().map(SolveEntry::display_time).join("  ")
        )?;
    }
    Ok(())
}

fn export(
    path: &Path,
    archive: Option<&SolveArchive>,
    session: &Session,
) -> cubetime::Result<usize> {
    let file = File::create(path)?;
    match archive {
        Some(archive) => archive.export_csv(file),
        None => write_csv(session.history(), file),
    }
}
