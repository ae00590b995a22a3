use super::{bordered, draw_placeholder, field_line, panel_title};
use crate::api::{CachedApi, Profile};
use crate::query::Query;
use crate::ui::renderfns::format_time;
use crate::ui::view::{View, ViewAction};
use crate::ui::UiContext;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

pub struct ProfileView {
  profile: Query<Profile>,
}

impl ProfileView {
  pub fn new(api: &CachedApi) -> Self {
    let mut profile = api.watch_profile();
    profile.fetch();
    Self { profile }
  }
}

impl View for ProfileView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    if key.code == KeyCode::Char('r') {
      self.refresh();
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect, ui: &UiContext) {
    let block = bordered(panel_title(ui.labels.profile, &self.profile, ui), ui);
    if draw_placeholder(frame, area, block.clone(), &self.profile, ui) {
      return;
    }
    let Some(profile) = self.profile.data() else {
      return;
    };

    let labels = ui.labels;
    let lines = vec![
      Line::from(vec![
        Span::styled(profile.nickname.clone(), Style::default().fg(ui.palette.accent).bold()),
        Span::styled(format!("  #{}", profile.user_id), Style::default().fg(ui.palette.muted)),
      ]),
      Line::raw(""),
      field_line(labels.level, profile.level.to_string(), ui),
      field_line(
        labels.guild,
        profile
          .guild
          .clone()
          .unwrap_or_else(|| labels.no_guild.to_string()),
        ui,
      ),
      field_line(labels.joined, format_time(&profile.joined_at), ui),
      field_line(labels.public_profile, labels.toggle(profile.public).to_string(), ui),
    ];
    frame.render_widget(Paragraph::new(lines).block(block), area);
  }

  fn tick(&mut self) -> bool {
    self.profile.tick()
  }

  fn refresh(&mut self) {
    self.profile.refetch();
  }
}
