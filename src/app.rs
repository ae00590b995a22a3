use crate::api::{CachedApi, Resource, SessionState};
use crate::auth::AccessToken;
use crate::cache::QueryClient;
use crate::config::Config;
use crate::error::{ApiErrorCode, QueryError};
use crate::event::{Event, EventHandler};
use crate::preferences::{Language, Preference, PreferenceError, PreferenceValue, Preferences, Subscription, Theme};
use crate::query::Query;
use crate::routes::Route;
use crate::session::{login_target, require_session, GuardError, Location, RedirectSignal, LOGIN_PATH};
use crate::ui;
use crate::ui::components::{CommandEvent, CommandInput, KeyResult};
use crate::ui::view::{Shortcut, View, ViewAction};
use crate::ui::views;
use crate::ui::UiContext;
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{
  disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use futures::future::join_all;
use ratatui::prelude::*;
use std::io::stdout;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// How long a status message stays in the status bar
const STATUS_TTL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
  Info,
  Error,
}

struct Status {
  level: StatusLevel,
  message: String,
  shown_at: Instant,
}

/// Main application state
pub struct App {
  /// Cached API shared with every view
  api: CachedApi,

  preferences: Preferences,

  /// Application configuration
  config: Config,

  /// Location of the open view, or of the first navigation until one opens
  location: Location,
  route: Route,
  view: Option<Box<dyn View>>,

  /// Navigation whose guard is still running. Only its result is applied.
  pending: Option<Location>,

  /// Command input (after pressing :)
  command: CommandInput,

  status: Option<Status>,

  /// Signed-in user, for the header
  session: Query<SessionState>,

  /// Event sender for async tasks
  event_tx: mpsc::UnboundedSender<Event>,

  subscriptions: Vec<Subscription>,

  /// Whether to quit
  should_quit: bool,
}

impl App {
  pub async fn new(config: Config, start: &str) -> Result<Self> {
    let token = AccessToken::new(Config::get_access_token());
    let api = CachedApi::new(&config.api, QueryClient::new(), token)?;
    Ok(Self::with_api(config, api, start))
  }

  fn with_api(config: Config, api: CachedApi, start: &str) -> Self {
    let (tx, _rx) = mpsc::unbounded_channel();
    let location = Location::parse(start);
    let route = Route::from_path(&location.path).unwrap_or(Route::Dashboard);
    Self {
      preferences: Preferences::new(config.language, config.theme),
      session: api.watch_session(),
      api,
      config,
      location,
      route,
      view: None,
      pending: None,
      command: CommandInput::new(),
      status: None,
      event_tx: tx,
      subscriptions: Vec::new(),
      should_quit: false,
    }
  }

  pub async fn run(&mut self) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    // Create event handler
    let mut events = EventHandler::new(Duration::from_millis(250));
    self.event_tx = events.sender();
    self.subscribe_preferences();

    // Initial data load
    self.session.fetch();
    let start = self.location.href();
    self.navigate(&start);

    // Main loop
    let result = self.event_loop(&mut terminal, &mut events).await;

    // Cleanup terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
  }

  async fn event_loop<B: Backend>(
    &mut self,
    terminal: &mut Terminal<B>,
    events: &mut EventHandler,
  ) -> Result<()> {
    while !self.should_quit {
      // Draw UI
      terminal.draw(|frame| ui::draw(frame, self))?;

      // Handle events
      if let Some(event) = events.next().await {
        self.handle_event(event)?;
      }
    }
    Ok(())
  }

  /// Redraw on language or theme changes.
  fn subscribe_preferences(&mut self) {
    let tx = self.event_tx.clone();
    self.subscriptions.push(self.preferences.language.subscribe(move |_| {
      let _ = tx.send(Event::PreferenceChanged);
    }));
    let tx = self.event_tx.clone();
    self.subscriptions.push(self.preferences.theme.subscribe(move |_| {
      let _ = tx.send(Event::PreferenceChanged);
    }));
  }

  // Accessors for rendering

  pub fn ui_context(&self) -> UiContext {
    UiContext::new(self.language(), self.theme())
  }

  pub fn route(&self) -> Route {
    self.route
  }

  pub fn nickname(&self) -> Option<&str> {
    self
      .session
      .data()
      .and_then(|state| state.session())
      .map(|session| session.nickname.as_str())
  }

  pub fn shortcuts(&self) -> Vec<Shortcut> {
    match &self.view {
      Some(view) => view.shortcuts(),
      None => vec![Shortcut::new(":", "command"), Shortcut::new("q", "quit")],
    }
  }

  pub fn api_url(&self) -> &str {
    &self.config.api.url
  }

  pub fn view_mut(&mut self) -> Option<&mut Box<dyn View>> {
    self.view.as_mut()
  }

  pub fn status(&self) -> Option<(StatusLevel, &str)> {
    self
      .status
      .as_ref()
      .map(|status| (status.level, status.message.as_str()))
  }

  pub fn language(&self) -> Language {
    self.preferences.language.get()
  }

  pub fn theme(&self) -> Theme {
    self.preferences.theme.get()
  }

  pub fn command(&self) -> &CommandInput {
    &self.command
  }

  fn set_info(&mut self, message: impl Into<String>) {
    self.status = Some(Status {
      level: StatusLevel::Info,
      message: message.into(),
      shown_at: Instant::now(),
    });
  }

  fn set_error(&mut self, message: impl Into<String>) {
    self.status = Some(Status {
      level: StatusLevel::Error,
      message: message.into(),
      shown_at: Instant::now(),
    });
  }

  /// Show `error`; an expired session also sends the user to log in again.
  fn report_error(&mut self, error: &QueryError) {
    self.set_error(error.user_message());
    if error.code() == Some(&ApiErrorCode::Unauthorized) && self.route.is_protected() {
      // The cached session would otherwise send the login screen straight back here.
      self.api.token().clear();
      self.api.client().invalidate_in_background(&Resource::Session.key());
      let signal = RedirectSignal::to_login(&self.location.href());
      self.navigate(&signal.to);
    }
  }

  fn handle_event(&mut self, event: Event) -> Result<()> {
    match event {
      Event::Key(key) => self.handle_key(key),
      Event::Tick => self.tick(),
      Event::Navigated { location, outcome } => self.on_navigated(location, outcome),
      Event::LoggedIn { redirect } => self.on_logged_in(&redirect),
      Event::LoggedOut(result) => self.on_logged_out(result),
      Event::MutationDone { name, outcome } => match outcome {
        Ok(message) => {
          debug!(mutation = name, "mutation reported");
          self.set_info(message);
        }
        Err(error) => self.report_error(&error),
      },
      Event::PreferenceChanged => {
        let message = format!("{} · {}", self.language(), self.theme());
        self.set_info(message);
      }
    }
    Ok(())
  }

  fn tick(&mut self) {
    self.session.tick();
    if let Some(view) = self.view.as_mut() {
      view.tick();
    }
    if self
      .status
      .as_ref()
      .is_some_and(|status| status.shown_at.elapsed() >= STATUS_TTL)
    {
      self.status = None;
    }
  }

  fn handle_key(&mut self, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
      self.should_quit = true;
      return;
    }

    let captured =
      !self.command.is_active() && self.view.as_ref().is_some_and(|view| view.captures_input());
    if !captured {
      match self.command.handle_key(key) {
        KeyResult::Handled | KeyResult::Event(CommandEvent::Cancelled) => return,
        KeyResult::Event(CommandEvent::Submitted(name, argument)) => {
          self.execute_command(name, argument.as_deref());
          return;
        }
        KeyResult::NotHandled => {}
      }
      if key.code == KeyCode::Char('q') {
        self.should_quit = true;
        return;
      }
    }

    let action = match self.view.as_mut() {
      Some(view) => view.handle_key(key),
      None => ViewAction::None,
    };
    self.apply(action);
  }

  fn apply(&mut self, action: ViewAction) {
    match action {
      ViewAction::None => {}
      ViewAction::Login(token) => self.login(token),
      ViewAction::SyncInventory => {
        let api = self.api.clone();
        self.spawn_mutation("sync_inventory", async move {
          let receipt = api.sync_inventory().await?;
          Ok(format!("Synced {} items", receipt.synced_items))
        });
      }
      ViewAction::UpdateSettings(patch) => {
        let api = self.api.clone();
        self.spawn_mutation("update_settings", async move {
          api.update_settings(&patch).await?;
          Ok("Settings saved".to_string())
        });
      }
    }
  }

  fn spawn_mutation<F>(&self, name: &'static str, mutation: F)
  where
    F: std::future::Future<Output = Result<String, QueryError>> + Send + 'static,
  {
    let tx = self.event_tx.clone();
    tokio::spawn(async move {
      let outcome = mutation.await;
      let _ = tx.send(Event::MutationDone { name, outcome });
    });
  }

  fn execute_command(&mut self, name: &str, argument: Option<&str>) {
    let route = match name {
      "dashboard" => Some(Route::Dashboard),
      "inventory" => Some(Route::Inventory),
      "logs" => Some(Route::Logs),
      "profile" => Some(Route::Profile),
      "settings" => Some(Route::Settings),
      _ => None,
    };
    if let Some(route) = route {
      self.navigate(route.path());
      return;
    }

    match name {
      "theme" => {
        let theme = self.preferences.theme.clone();
        self.change_preference(&theme, argument);
      }
      "lang" => {
        let language = self.preferences.language.clone();
        self.change_preference(&language, argument);
      }
      "sync" => self.apply(ViewAction::SyncInventory),
      "more" => {
        let loading = self.view.as_mut().is_some_and(|view| view.load_more());
        if !loading {
          self.set_info("Nothing more to load");
        }
      }
      "refresh" => self.refresh(),
      "logout" => self.logout(),
      "quit" => self.should_quit = true,
      other => warn!(command = other, "unhandled command"),
    }
  }

  /// Set a preference from a command argument, or step to its next value.
  fn change_preference<T: PreferenceValue>(&mut self, preference: &Preference<T>, argument: Option<&str>) {
    let result: Result<bool, PreferenceError> = match argument {
      Some(raw) => preference.set_str(raw),
      None => Ok(preference.set(preference.get().next())),
    };
    match result {
      Ok(true) => {}
      Ok(false) => self.set_info(format!("{} is already {}", T::NAME, preference.get())),
      Err(error) => self.set_error(error.to_string()),
    }
  }

  fn refresh(&mut self) {
    match self.view.as_mut() {
      Some(view) => view.refresh(),
      None => {
        let href = self.location.href();
        self.navigate(&href);
      }
    }
  }

  /// Start a guarded navigation to `href`. The view opens once the session
  /// check and prefetch finish; a newer navigation supersedes this one.
  fn navigate(&mut self, href: &str) {
    let location = Location::parse(href);
    let Some(route) = Route::from_path(&location.path) else {
      self.set_error(format!("Unknown route {}", location.path));
      return;
    };

    debug!(to = %location.href(), "navigating");
    self.pending = Some(location.clone());
    let api = self.api.clone();
    let tx = self.event_tx.clone();
    tokio::spawn(async move {
      let outcome = enter_route(&api, route, &location).await;
      let _ = tx.send(Event::Navigated { location, outcome });
    });
  }

  fn on_navigated(&mut self, location: Location, outcome: Result<(), GuardError>) {
    if self.pending.as_ref() != Some(&location) {
      debug!(to = %location.href(), "ignoring superseded navigation");
      return;
    }
    self.pending = None;

    match outcome {
      Ok(()) => {
        let Some(route) = Route::from_path(&location.path) else {
          return;
        };
        let redirect = login_target(&location);
        self.view = Some(views::open(
          route,
          &self.api,
          redirect,
          self.config.logs.page_size,
        ));
        self.route = route;
        self.location = location;
      }
      Err(GuardError::Redirect(signal)) => self.navigate(&signal.to),
      Err(GuardError::Query(error)) => self.set_error(error.user_message()),
    }
  }

  fn login(&mut self, token: String) {
    let redirect = login_target(&self.location);
    let api = self.api.clone();
    let tx = self.event_tx.clone();
    tokio::spawn(async move {
      api.login(&token).await;
      let _ = tx.send(Event::LoggedIn { redirect });
    });
  }

  fn on_logged_in(&mut self, redirect: &str) {
    let signed_in = self
      .api
      .client()
      .peek::<SessionState>(&Resource::Session.key())
      .is_some_and(|state| state.session().is_some());
    if signed_in {
      info!(to = redirect, "signed in");
      self.navigate(redirect);
    } else {
      self.set_error(ApiErrorCode::Unauthorized.user_message());
    }
  }

  fn logout(&mut self) {
    let api = self.api.clone();
    let tx = self.event_tx.clone();
    tokio::spawn(async move {
      let result = api.logout().await;
      let _ = tx.send(Event::LoggedOut(result));
    });
  }

  fn on_logged_out(&mut self, result: Result<(), QueryError>) {
    match result {
      Ok(()) => self.set_info("Signed out"),
      Err(error) => self.set_error(error.user_message()),
    }
    // The old session query still holds the signed-in user.
    self.session = self.api.watch_session();
    self.session.fetch();
    self.view = None;
    self.navigate(LOGIN_PATH);
  }
}

/// Guard and warm a route. The login route sends a signed-in user straight
/// on to its redirect target.
async fn enter_route(api: &CachedApi, route: Route, location: &Location) -> Result<(), GuardError> {
  if route.is_protected() {
    require_session(api, location).await?;
  } else if api.session().await?.session().is_some() {
    return Err(GuardError::Redirect(RedirectSignal {
      to: login_target(location),
    }));
  }

  for result in join_all(route.prefetch().iter().map(|resource| api.prefetch(*resource))).await {
    result?;
  }
  Ok(())
}
