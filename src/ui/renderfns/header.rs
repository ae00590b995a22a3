use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

use crate::ui::view::Shortcut;
use crate::ui::UiContext;

/// Draw the header bar with logo, API host, signed-in user, screen and shortcuts
pub fn draw_header(
  frame: &mut Frame,
  area: Rect,
  ui: &UiContext,
  api_url: &str,
  who: &str,
  title: &str,
  shortcuts: &[Shortcut],
) {
  let palette = ui.palette;
  let domain = extract_domain(api_url);

  let mut spans = vec![
    Span::styled(" hoardview ", Style::default().fg(palette.accent).bold()),
    Span::styled("│", Style::default().fg(palette.muted)),
    Span::styled(format!(" {} ", domain), Style::default().fg(palette.text)),
    Span::styled("│", Style::default().fg(palette.muted)),
    Span::styled(format!(" {} ", who), Style::default().fg(palette.warn).bold()),
    Span::styled("│", Style::default().fg(palette.muted)),
    Span::styled(format!(" {} ", title), Style::default().fg(palette.text).bold()),
    Span::raw(" "),
  ];

  // Shortcuts - keys highlighted, descriptions dimmed
  for shortcut in shortcuts {
    spans.push(Span::raw("  "));
    spans.push(Span::styled(
      format!("<{}>", shortcut.key),
      Style::default().fg(palette.accent),
    ));
    spans.push(Span::styled(
      format!(" {}", shortcut.label),
      Style::default().fg(palette.muted),
    ));
  }

  let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(palette.bar));

  frame.render_widget(paragraph, area);
}

/// Extract host from the API URL
fn extract_domain(url: &str) -> &str {
  url
    .strip_prefix("https://")
    .or_else(|| url.strip_prefix("http://"))
    .unwrap_or(url)
    .split('/')
    .next()
    .unwrap_or(url)
}
