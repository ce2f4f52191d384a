use std::io::Stdout;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::widgets::ListState;
use ratatui::Terminal;
use tokio::runtime::Runtime;
use unicode_segmentation::UnicodeSegmentation;

use crate::api::{HttpNoteRepository, Note, SharedRepository};
use crate::config::{AppConfig, ConfigPaths, ThemeMode, ThemeStore};
use crate::ui;

pub mod actions;
pub mod controller;
pub mod form;
pub mod state;

pub use actions::{run_effect, ActionDispatcher};
pub use controller::{Completion, ControllerOptions, Effect, NoteController};
pub use form::{FieldEditor, FormField, FormState};
pub use state::{
    ActiveSurface, ControllerState, DeleteToken, Notification, PendingDelete, SaveMode, Severity,
};

enum Action {
    Quit,
    SelectNext,
    SelectPrevious,
    StartSearch,
    NewNote,
    EditNote,
    ViewNote,
    DeleteNote,
    Refresh,
    ToggleTheme,
    Dismiss,
}

pub struct App {
    pub config: Arc<AppConfig>,
    controller: NoteController,
    dispatcher: ActionDispatcher,
    themes: ThemeStore,
    theme: ThemeMode,
    form: Option<FormState>,
    delete_token: Option<DeleteToken>,
    search_active: bool,
    selected: usize,
    list_state: ListState,
    viewer_scroll: u16,
    should_quit: bool,
    tick_rate: Duration,
    runtime: Option<Runtime>,
}

impl App {
    pub fn new(config: Arc<AppConfig>, paths: &ConfigPaths) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("quicknote-net")
            .enable_all()
            .build()
            .context("starting network runtime")?;
        let repository: SharedRepository =
            Arc::new(HttpNoteRepository::new(&config.api).context("building http client")?);
        let themes = ThemeStore::new(paths.theme_file.clone(), config.theme);
        let dispatcher = ActionDispatcher::new(repository, runtime.handle().clone());
        let mut app = Self::with_dispatcher(config, dispatcher, themes);
        app.runtime = Some(runtime);
        Ok(app)
    }

    /// Builds the app around an existing dispatcher; the caller keeps the
    /// runtime behind it alive.
    pub fn with_dispatcher(
        config: Arc<AppConfig>,
        dispatcher: ActionDispatcher,
        themes: ThemeStore,
    ) -> Self {
        let theme = themes.load();
        let controller = NoteController::new(ControllerOptions::from_config(&config));
        Self {
            config,
            controller,
            dispatcher,
            themes,
            theme,
            form: None,
            delete_token: None,
            search_active: false,
            selected: 0,
            list_state: ListState::default(),
            viewer_scroll: 0,
            should_quit: false,
            tick_rate: Duration::from_millis(250),
            runtime: None,
        }
    }

    pub fn controller(&self) -> &NoteController {
        &self.controller
    }

    pub fn theme(&self) -> ThemeMode {
        self.theme
    }

    pub fn run(&mut self) -> Result<()> {
        let mut terminal = setup_terminal()?;
        let result = self.event_loop(&mut terminal);
        restore_terminal(&mut terminal)?;
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_timeout(Duration::from_millis(500));
        }
        result
    }

    /// Issues the initial load.
    pub fn start(&mut self) {
        let effect = self.controller.start();
        self.dispatcher.dispatch(effect);
    }

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        self.start();
        loop {
            terminal
                .draw(|frame| {
                    let screen = ui::Screen {
                        state: self.controller.state(),
                        form: self.form.as_ref(),
                        search_focused: self.search_active,
                        theme: self.theme,
                        viewer_scroll: self.viewer_scroll,
                    };
                    ui::draw_app(frame, &screen, &mut self.list_state);
                })
                .context("rendering frame")?;

            if self.should_quit {
                break;
            }

            let now = Instant::now();
            let timeout = self
                .controller
                .next_deadline()
                .map(|deadline| deadline.saturating_duration_since(now))
                .map_or(self.tick_rate, |until| until.min(self.tick_rate));

            if event::poll(timeout).context("polling for terminal events")? {
                if let Event::Key(key) = event::read().context("reading terminal event")? {
                    self.handle_key(key, Instant::now());
                }
            }

            self.on_tick(Instant::now());
        }
        Ok(())
    }

    /// Applies finished requests and advances the controller's timers.
    pub fn on_tick(&mut self, now: Instant) {
        for completion in self.dispatcher.drain() {
            let effects = self.controller.apply(completion, now);
            self.dispatcher.dispatch_all(effects);
        }
        let effects = self.controller.tick(now);
        self.dispatcher.dispatch_all(effects);
        self.sync_view();
    }

    pub fn handle_key(&mut self, key: KeyEvent, now: Instant) {
        if key.kind != KeyEventKind::Press {
            return;
        }

        if self.delete_token.is_some() {
            self.handle_delete_confirm_key(key);
        } else if self.controller.surface().is_form() {
            self.handle_form_key(key, now);
        } else if self.controller.surface().is_viewer() {
            self.handle_viewer_key(key);
        } else if self.search_active {
            self.handle_search_key(key, now);
        } else {
            let action = match key.code {
                KeyCode::Char('q') => Some(Action::Quit),
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                    Some(Action::Quit)
                }
                KeyCode::Char('j') | KeyCode::Down => Some(Action::SelectNext),
                KeyCode::Char('k') | KeyCode::Up => Some(Action::SelectPrevious),
                KeyCode::Char('/') => Some(Action::StartSearch),
                KeyCode::Char('a') => Some(Action::NewNote),
                KeyCode::Char('e') => Some(Action::EditNote),
                KeyCode::Enter | KeyCode::Char('v') => Some(Action::ViewNote),
                KeyCode::Char('d') => Some(Action::DeleteNote),
                KeyCode::Char('r') => Some(Action::Refresh),
                KeyCode::Char('t') => Some(Action::ToggleTheme),
                KeyCode::Esc => Some(Action::Dismiss),
                _ => None,
            };
            if let Some(action) = action {
                self.handle_action(action, now);
            }
        }
        self.sync_view();
    }

    fn handle_action(&mut self, action: Action, now: Instant) {
        match action {
            Action::Quit => self.should_quit = true,
            Action::SelectNext => self.move_selection(1),
            Action::SelectPrevious => self.move_selection(-1),
            Action::StartSearch => self.search_active = true,
            Action::NewNote => self.controller.open_create_form(),
            Action::EditNote => {
                if let Some(note) = self.selected_note().cloned() {
                    self.controller.open_edit_form(note);
                }
            }
            Action::ViewNote => {
                if let Some(note) = self.selected_note().cloned() {
                    self.viewer_scroll = 0;
                    self.controller.open_viewer(note);
                }
            }
            Action::DeleteNote => {
                if let Some(note) = self.selected_note().cloned() {
                    self.request_delete(&note);
                }
            }
            Action::Refresh => {
                let effect = self.controller.refresh();
                self.dispatcher.dispatch(effect);
            }
            Action::ToggleTheme => self.toggle_theme(now),
            Action::Dismiss => self.controller.dismiss_notification(),
        }
    }

    fn handle_search_key(&mut self, key: KeyEvent, now: Instant) {
        let term = self.controller.search_term();
        match key.code {
            KeyCode::Esc => {
                self.search_active = false;
                if !term.is_empty() {
                    self.controller.set_search_term("", now);
                }
            }
            KeyCode::Enter => self.search_active = false,
            KeyCode::Backspace => {
                let mut term = term.to_string();
                if let Some((idx, _)) = term.grapheme_indices(true).next_back() {
                    term.truncate(idx);
                    self.controller.set_search_term(term, now);
                }
            }
            KeyCode::Char(ch)
                if !key.modifiers.intersects(
                    KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SUPER,
                ) =>
            {
                let mut term = term.to_string();
                term.push(ch);
                self.controller.set_search_term(term, now);
            }
            _ => {}
        }
    }

    fn handle_form_key(&mut self, key: KeyEvent, now: Instant) {
        let Some(form) = self.form.as_mut() else {
            return;
        };
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('s') => {
                    let draft = form.draft();
                    if let Some(effect) = self.controller.save(draft, now) {
                        self.dispatcher.dispatch(effect);
                    }
                }
                KeyCode::Char('p') => form.toggle_preview(),
                KeyCode::Char('c') => self.should_quit = true,
                _ => {}
            }
            return;
        }

        match key.code {
            KeyCode::Esc => {
                if self.controller.is_saving() {
                    tracing::debug!("form stays open while a save is in flight");
                } else {
                    self.controller.close_surface();
                }
            }
            KeyCode::Tab => form.focus_next(),
            KeyCode::BackTab => form.focus_previous(),
            KeyCode::Enter => {
                if !form.focused_mut().insert_newline() {
                    form.focus_next();
                }
            }
            KeyCode::Backspace => {
                form.focused_mut().backspace();
            }
            KeyCode::Delete => {
                form.focused_mut().delete();
            }
            KeyCode::Left => {
                form.focused_mut().move_left();
            }
            KeyCode::Right => {
                form.focused_mut().move_right();
            }
            KeyCode::Home => {
                form.focused_mut().move_home();
            }
            KeyCode::End => {
                form.focused_mut().move_end();
            }
            KeyCode::Char(ch) if !key.modifiers.intersects(KeyModifiers::ALT | KeyModifiers::SUPER) => {
                form.focused_mut().insert_char(ch);
            }
            _ => {}
        }
    }

    fn handle_viewer_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => self.controller.close_surface(),
            KeyCode::Char('e') => {
                self.controller.edit_viewed_note();
            }
            KeyCode::Char('d') => {
                if let Some(note) = self.controller.surface().viewed_note().cloned() {
                    self.request_delete(&note);
                }
            }
            KeyCode::Char('j') | KeyCode::Down => {
                self.viewer_scroll = self.viewer_scroll.saturating_add(1);
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.viewer_scroll = self.viewer_scroll.saturating_sub(1);
            }
            _ => {}
        }
    }

    fn handle_delete_confirm_key(&mut self, key: KeyEvent) {
        let Some(token) = self.delete_token else {
            return;
        };
        match key.code {
            KeyCode::Char('y') | KeyCode::Enter => {
                self.delete_token = None;
                if let Some(effect) = self.controller.confirm_delete(token) {
                    self.dispatcher.dispatch(effect);
                }
            }
            KeyCode::Char('n') | KeyCode::Esc => {
                self.delete_token = None;
                self.controller.cancel_delete(token);
            }
            _ => {}
        }
    }

    fn request_delete(&mut self, note: &Note) {
        match &note.id {
            Some(id) => self.delete_token = Some(self.controller.request_delete(id.clone())),
            None => tracing::debug!("ignoring delete for a note that was never saved"),
        }
    }

    fn toggle_theme(&mut self, now: Instant) {
        self.theme = self.theme.toggled();
        if let Err(err) = self.themes.save(self.theme) {
            tracing::error!(?err, "failed to persist theme preference");
            self.controller.notify(
                "Could not save theme preference",
                Severity::Warning,
                now,
            );
        }
    }

    fn selected_note(&self) -> Option<&Note> {
        self.controller.notes().get(self.selected)
    }

    fn move_selection(&mut self, delta: isize) {
        let len = self.controller.notes().len();
        if len == 0 {
            return;
        }
        let next = self.selected.saturating_add_signed(delta);
        self.selected = next.min(len - 1);
    }

    /// Keeps the form buffers and list selection in step with the controller.
    fn sync_view(&mut self) {
        match self.controller.surface() {
            ActiveSurface::Form { editing } => {
                if self.form.is_none() {
                    self.form = Some(
                        editing
                            .as_ref()
                            .map(FormState::from_note)
                            .unwrap_or_else(FormState::blank),
                    );
                }
            }
            _ => self.form = None,
        }
        if self.controller.pending_delete().is_none() {
            self.delete_token = None;
        }

        let len = self.controller.notes().len();
        if len == 0 {
            self.selected = 0;
            self.list_state.select(None);
        } else {
            self.selected = self.selected.min(len - 1);
            self.list_state.select(Some(self.selected));
        }
    }
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode().context("enabling raw mode")?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen).context("switching to alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("creating terminal backend")?;
    terminal.hide_cursor().context("hiding cursor")?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    terminal.show_cursor().ok();
    disable_raw_mode().context("disabling raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen).context("restoring screen state")?;
    Ok(())
}
