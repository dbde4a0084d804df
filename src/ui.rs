use crate::app::{App, InputMode};
use crate::chat::Sender;
use ratatui::{
    layout::{Constraint, Layout},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    let [header_area, chat_area, chips_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(3),
        Constraint::Length(1),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(area);

    // Header
    let header = Line::from(vec![
        Span::styled(" TaskNest ", Style::default().fg(Color::Black).bg(Color::Green)),
        Span::raw(" "),
        Span::styled("Nest — marketplace assistant", Style::default().bold()),
        Span::raw(format!("  ({} sellers)", app.engine.directory().len())),
    ]);
    frame.render_widget(Paragraph::new(header), header_area);

    // Transcript
    let chat_block = Block::default().borders(Borders::ALL).title(" Chat ");
    let inner = chat_block.inner(chat_area);
    app.chat_height = inner.height;
    app.chat_width = inner.width;

    let mut lines: Vec<Line> = Vec::new();
    for msg in &app.messages {
        match msg.sender {
            Sender::User => lines.push(Line::from(Span::styled(
                "You:",
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ))),
            Sender::Bot => lines.push(Line::from(Span::styled(
                "Nest:",
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            ))),
        }
        for text_line in msg.text.lines() {
            lines.push(Line::raw(text_line.to_string()));
        }
        lines.push(Line::default());
    }

    if app.is_typing() {
        let dots = ".".repeat((app.animation_frame + 1) as usize);
        lines.push(Line::from(Span::styled(
            "Nest:",
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        )));
        lines.push(Line::from(Span::styled(
            format!("typing{}", dots),
            Style::default().fg(Color::DarkGray).italic(),
        )));
    }

    let transcript = Paragraph::new(lines)
        .block(chat_block)
        .wrap(Wrap { trim: false })
        .scroll((app.chat_scroll, 0));
    frame.render_widget(transcript, chat_area);

    // Quick-reply chips
    let mut chip_spans: Vec<Span> = Vec::new();
    for (i, chip) in app.quick_replies().iter().enumerate() {
        let style = if app.chip_selected == Some(i) {
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Cyan)
        };
        chip_spans.push(Span::styled(format!(" {} ", chip), style));
        chip_spans.push(Span::raw(" "));
    }
    frame.render_widget(Paragraph::new(Line::from(chip_spans)), chips_area);

    // Input box
    let input_style = if app.input_mode == InputMode::Editing {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };
    let inner_width = input_area.width.saturating_sub(2) as usize;
    let (input_scroll, cursor_col) = input_window(app.input_cursor, inner_width);
    let input = Paragraph::new(app.input.as_str())
        .scroll((0, input_scroll as u16))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Message ")
                .border_style(input_style),
        );
    frame.render_widget(input, input_area);

    if app.input_mode == InputMode::Editing {
        frame.set_cursor_position((
            input_area.x + 1 + cursor_col as u16,
            input_area.y + 1,
        ));
    }

    // Footer
    let hint = match app.input_mode {
        InputMode::Normal => "i or /: type  Tab: chips  Enter: send chip  j/k: scroll  q: quit",
        InputMode::Editing => "Enter: send  Esc: done  ←/→: move cursor",
    };
    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(
            hint,
            Style::default().fg(Color::DarkGray),
        ))),
        footer_area,
    );
}

/// Horizontal window for the input line: scrolls the text so the cursor
/// column always lands inside the box.
fn input_window(cursor: usize, width: usize) -> (usize, usize) {
    let scroll = cursor.saturating_sub(width.saturating_sub(1));
    (scroll, cursor - scroll)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_window_keeps_cursor_inside_the_box() {
        // Cursor fits: no scroll.
        assert_eq!(input_window(3, 10), (0, 3));
        assert_eq!(input_window(9, 10), (0, 9));
        // Cursor past the last column: text scrolls, column pins to the edge.
        assert_eq!(input_window(10, 10), (1, 9));
        assert_eq!(input_window(25, 10), (16, 9));
    }
}
