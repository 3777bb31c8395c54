use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};

use cubetime::{
    clock::Clock,
    events::event_name,
    inspection::{GRACE_MS, INSPECTION_MS},
    stats::StatValue,
    timer::{InspectionMode, TimerState},
    util::format_time,
};

use crate::App;

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 1;
const HISTORY_ROWS: usize = 5;

impl<C: Clock> Widget for &App<C> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let bold_style = Style::default().add_modifier(Modifier::BOLD);
        let dim_style = Style::default().add_modifier(Modifier::DIM);
        let italic_style = Style::default().add_modifier(Modifier::ITALIC);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints(
                [
                    Constraint::Length(1),
                    Constraint::Length(3),
                    Constraint::Min(1),
                    Constraint::Length(3),
                    Constraint::Length(1),
                    Constraint::Length(2),
                    Constraint::Length(HISTORY_ROWS as u16 + 1),
                    Constraint::Length(1),
                ]
                .as_ref(),
            )
            .split(area);

        let event_id = self.session.selected_event();
        let mut header_spans = vec![
            Span::styled(event_name(event_id).to_string(), bold_style),
            Span::styled(format!("  [{event_id}]"), dim_style),
            Span::styled(
                match self.timer.mode() {
                    InspectionMode::Wca => "   inspection: wca",
                    InspectionMode::Off => "   inspection: off",
                },
                dim_style,
            ),
            Span::styled(format!("   session: {}", self.session_id()), dim_style),
        ];
        if let Some(round) = &self.practice {
            header_spans.push(Span::styled(
                format!("   practice: {}", round.position_label()),
                Style::default().fg(Color::Magenta),
            ));
        }
        Paragraph::new(Line::from(header_spans))
            .alignment(Alignment::Center)
            .render(chunks[0], buf);

        let scramble = Paragraph::new(self.session.current_scramble().to_string())
            .style(Style::default().fg(Color::Gray))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        scramble.render(chunks[1], buf);

        let display = Paragraph::new(Span::styled(
            self.timer.display(),
            Style::default()
                .patch(bold_style)
                .fg(self.display_color()),
        ))
        .alignment(Alignment::Center);
        display.render(vertical_center(chunks[2]), buf);

        let mut label = vec![Span::styled(self.state_hint(), italic_style)];
        if let (TimerState::Inspection | TimerState::Armed, Some(warning)) =
            (self.timer.state(), self.last_warning)
        {
            label.push(Span::styled(
                format!("   {warning}!"),
                Style::default().patch(bold_style).fg(Color::Yellow),
            ));
        }
        Paragraph::new(Line::from(label))
            .alignment(Alignment::Center)
            .render(chunks[3], buf);

        let solves = Paragraph::new(Span::styled(
            format!("solves: {}", self.session.len()),
            dim_style,
        ))
        .alignment(Alignment::Center);
        solves.render(chunks[4], buf);

        let stats = self.session.stats();
        let mut stat_lines = vec![Line::from(vec![
            stat_span("current", stats.current, bold_style),
            stat_span("best", stats.best, bold_style),
            stat_span("mo3", stats.mo3, bold_style),
            stat_span("ao5", stats.ao5, bold_style),
            stat_span("ao12", stats.ao12, bold_style),
        ])];
        if let Some(pb) = self.best_ever {
            stat_lines.push(Line::from(Span::styled(
                format!("all-time best {}", format_time(pb)),
                Style::default().fg(Color::Cyan),
            )));
        }
        Paragraph::new(stat_lines)
            .alignment(Alignment::Center)
            .render(chunks[5], buf);

        let recent: Vec<Line> = self
            .session
            .history()
            .iter()
            .enumerate()
            .rev()
            .take(HISTORY_ROWS)
            .map(|(idx, entry)| {
                let style = if entry.is_dnf() {
                    Style::default().fg(Color::Red)
                } else {
                    Style::default()
                };
                Line::from(vec![
                    Span::styled(format!("{:>4}. ", idx + 1), dim_style),
                    Span::styled(format!("{:<10}", entry.display_time()), style),
                    Span::styled(entry.event_id.clone(), dim_style),
                ])
            })
            .collect();
        Paragraph::new(recent)
            .block(Block::default().borders(Borders::TOP).title("recent"))
            .alignment(Alignment::Center)
            .render(chunks[6], buf);

        let legend = Paragraph::new(Span::styled(
            "(space/click) time / (r)eset / (n)ew scramble / (tab) event / (p)ractice / (i)nspection / (c)lear / (?) help / (esc)ape",
            italic_style,
        ))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
        legend.render(chunks[7], buf);
    }
}

impl<C: Clock> App<C> {
    fn display_color(&self) -> Color {
        if self.timer.has_pending_arm() {
            return Color::Red;
        }
        match self.timer.state() {
            TimerState::Idle => Color::White,
            TimerState::Inspection => match self.timer.remaining_ms() {
                Some(0) => Color::LightRed,
                _ => Color::Yellow,
            },
            TimerState::Armed => Color::Green,
            TimerState::Running => Color::Reset,
            TimerState::Stopped => match self.timer.last_result() {
                Some(r) if r.inspection_outcome.is_dnf() => Color::Red,
                _ => Color::Cyan,
            },
        }
    }

    fn state_hint(&self) -> String {
        let hold = if self.key_release {
            "hold space or click"
        } else {
            "tap space or hold click"
        };
        match (self.timer.state(), self.timer.mode()) {
            (TimerState::Idle | TimerState::Stopped, InspectionMode::Wca) => {
                format!("{hold} to inspect")
            }
            (TimerState::Idle | TimerState::Stopped, InspectionMode::Off) => {
                format!("{hold} to get ready")
            }
            (TimerState::Inspection, _) => match self.timer.inspection_elapsed_ms() {
                Some(elapsed) if elapsed > INSPECTION_MS + GRACE_MS => {
                    "inspection over: DNF".to_string()
                }
                _ => format!("inspecting: {hold} to get ready"),
            },
            (TimerState::Armed, _) => "release to start".to_string(),
            (TimerState::Running, _) => "press to stop".to_string(),
        }
    }
}

fn stat_span(label: &str, value: StatValue, style: Style) -> Span<'static> {
    let style = match value {
        StatValue::Dnf => style.fg(Color::Red),
        StatValue::NoData => style.add_modifier(Modifier::DIM),
        StatValue::Time(_) => style,
    };
    Span::styled(format!("{label} {value}   "), style)
}

fn vertical_center(area: Rect) -> Rect {
    let offset = area.height.saturating_sub(1) / 2;
    Rect {
        y: area.y + offset,
        height: area.height.min(1),
        ..area
    }
}

/// Key reference shown with `?`
pub fn render_help(area: Rect, buf: &mut Buffer) {
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let rows = [
        ("space / left click", "hold to inspect or get ready, release to start, press to stop"),
        ("r", "reset the timer"),
        ("n", "new scramble, or next in a practice round"),
        ("p", "start or end a practice round of 5 scrambles"),
        ("left / right", "previous / next practice scramble"),
        ("g", "regenerate the practice round"),
        ("tab / shift-tab", "next / previous event"),
        ("i", "toggle WCA inspection"),
        ("c", "clear the session"),
        ("?", "close this help"),
        ("esc / ctrl-c", "quit"),
    ];
    let mut lines = vec![
        Line::from(Span::styled("keys", bold_style)),
        Line::from(""),
    ];
    lines.extend(rows.iter().map(|(key, action)| {
        Line::from(vec![
            Span::styled(format!("{key:>20}  "), bold_style),
            Span::raw(*action),
        ])
    }));

    Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("help"))
        .wrap(Wrap { trim: false })
        .render(area, buf);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rendered(buf: &Buffer) -> String {
        buf.content().iter().map(|c| c.symbol()).collect()
    }

    #[test]
    fn vertical_center_picks_middle_row() {
        let area = Rect::new(0, 10, 40, 7);
        let centered = vertical_center(area);
        assert_eq!(centered.y, 13);
        assert_eq!(centered.height, 1);
        assert_eq!(centered.width, 40);

        let empty = vertical_center(Rect::new(0, 0, 10, 0));
        assert_eq!(empty.height, 0);
    }

    #[test]
    fn help_lists_bindings() {
        let area = Rect::new(0, 0, 100, 16);
        let mut buf = Buffer::empty(area);
        render_help(area, &mut buf);
        let text = rendered(&buf);
        assert!(text.contains("new scramble"));
        assert!(text.contains("toggle WCA inspection"));
        assert!(text.contains("regenerate the practice round"));
    }

    #[test]
    fn stat_span_formats_value() {
        let span = stat_span("ao5", StatValue::Time(10_000), Style::default());
        assert_eq!(span.content, "ao5 10.00   ");
        let span = stat_span("ao12", StatValue::NoData, Style::default());
        assert_eq!(span.content, "ao12 —   ");
    }
}
