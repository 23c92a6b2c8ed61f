use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Widget},
};

use dryfire::{
    clock::TimeSource,
    util::{format_countdown, format_hms},
    Phase, TimerMode,
};

use crate::{App, Field};

const HORIZONTAL_MARGIN: u16 = 2;
const VERTICAL_MARGIN: u16 = 1;

const FIELDS: [(Field, &str); 3] = [
    (Field::Par, "Par Time (s)"),
    (Field::Delay, "Delay Time (s)"),
    (Field::Reps, "Number of Reps"),
];

impl<T: TimeSource> Widget for &App<T> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let snap = &self.snapshot;
        let config = self.timer.config();

        let bold_style = Style::default().add_modifier(Modifier::BOLD);
        let dim_style = Style::default().add_modifier(Modifier::DIM);
        let title_style = Style::default().patch(bold_style).fg(Color::Yellow);
        let focus_style = Style::default().patch(bold_style).fg(Color::Cyan);

        let phase_color = match (snap.timer_mode, snap.phase) {
            (TimerMode::Idle, _) => Color::Gray,
            (TimerMode::Paused, _) => Color::Yellow,
            (TimerMode::Running, Phase::Delay) => Color::Red,
            (TimerMode::Running, Phase::Active) => Color::Green,
        };

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([
                Constraint::Length(1), // title
                Constraint::Length(5), // fields
                Constraint::Length(4), // time left / rep
                Constraint::Length(3), // phase
                Constraint::Min(0),
                Constraint::Length(1), // mode
                Constraint::Length(1), // legend
            ])
            .split(area);

        Paragraph::new(Span::styled("DRYFIRE", title_style))
            .alignment(Alignment::Center)
            .render(chunks[0], buf);

        let editable = snap.timer_mode == TimerMode::Idle;
        let field_lines: Vec<Line> = FIELDS
            .iter()
            .map(|(field, label)| {
                let focused = editable && *field == self.focus;
                let value = self.field(*field);
                let value = if value.is_empty() { "0" } else { value };
                Line::from(vec![
                    Span::styled(
                        format!("{} {:<16}", if focused { ">" } else { " " }, label),
                        if focused { focus_style } else { Style::default() },
                    ),
                    Span::styled(value.to_string(), bold_style),
                ])
            })
            .collect();
        Paragraph::new(field_lines)
            .block(Block::default().borders(Borders::ALL).title("Drill"))
            .render(chunks[1], buf);

        let readouts = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(chunks[2]);

        Paragraph::new(vec![
            Line::from(Span::styled(
                format_countdown(snap.time_left_secs),
                bold_style,
            )),
            Line::from(Span::styled(
                format!("elapsed {}", format_hms(snap.elapsed_secs)),
                dim_style,
            )),
        ])
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Time Left (HH:MM:SS)"),
        )
        .render(readouts[0], buf);

        Paragraph::new(vec![
            Line::from(Span::styled(
                format!("{} / {}", snap.current_rep, snap.rep_count),
                bold_style,
            )),
            Line::from(Span::styled(
                format!("par {:.2}s  delay {:.2}s", config.par_time_secs, config.delay_time_secs),
                dim_style,
            )),
        ])
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title("Rep"))
        .render(readouts[1], buf);

        let phase_len = match snap.phase {
            Phase::Delay => config.delay_time_secs,
            Phase::Active => config.par_time_secs,
        };
        let ratio = if editable || phase_len <= 0.0 {
            0.0
        } else {
            (snap.phase_elapsed_secs / phase_len).clamp(0.0, 1.0)
        };
        Gauge::default()
            .block(Block::default().borders(Borders::ALL).title("Phase"))
            .gauge_style(Style::default().fg(phase_color))
            .ratio(ratio)
            .label(format!("{} {:.2}s", snap.phase, snap.phase_elapsed_secs))
            .render(chunks[3], buf);

        Paragraph::new(Span::styled(
            snap.timer_mode.to_string(),
            Style::default().patch(bold_style).fg(phase_color),
        ))
        .alignment(Alignment::Center)
        .render(chunks[5], buf);

        let legend = if editable {
            "(space) start / (tab) next field / (0-9 .) edit / (q) quit"
        } else {
            "(space) pause-resume / (p) pause / (r) resume / (x) stop / (q) quit"
        };
        Paragraph::new(Span::styled(legend, Style::default().add_modifier(Modifier::ITALIC)))
            .alignment(Alignment::Center)
            .render(chunks[6], buf);
    }
}
