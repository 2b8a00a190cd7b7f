use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
};
use juris_core::{ChatResult, Comparison, Message, Mode, Sender, Source};
use crate::app::{chat_body, App, FocusPane, InputMode};

/// Parse a line of answer text, rendering **bold** spans
fn parse_markdown_line(text: &str) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut rest = text;

    while let Some(open) = rest.find("**") {
        let after_open = &rest[open + 2..];
        let Some(close) = after_open.find("**") else {
            break;
        };
        if close == 0 {
            // "****" is literal
            spans.push(Span::raw(rest[..open + 4].to_string()));
            rest = &after_open[2..];
            continue;
        }
        if open > 0 {
            spans.push(Span::raw(rest[..open].to_string()));
        }
        spans.push(Span::styled(
            after_open[..close].to_string(),
            Style::default().add_modifier(Modifier::BOLD),
        ));
        rest = &after_open[close + 2..];
    }

    if !rest.is_empty() {
        spans.push(Span::raw(rest.to_string()));
    }

    if spans.is_empty() {
        Line::default()
    } else {
        Line::from(spans)
    }
}

fn mode_color(mode: Mode) -> Color {
    match mode {
        Mode::Naive => Color::Magenta,
        Mode::Advanced => Color::Green,
        Mode::Compare => Color::Blue,
    }
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, body, footer
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);
    render_chat_screen(app, frame, body_area);
    render_footer(app, frame, footer_area);

    if app.show_mode_picker {
        render_mode_picker(app, frame, area);
    }
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let mode = app.conversation.mode();

    let title = Line::from(vec![
        Span::styled(" juris ", Style::default().fg(Color::Cyan).bold()),
        Span::styled("consumer law assistant ", Style::default().fg(Color::White)),
        Span::styled(
            format!(" {} ", mode.as_str().to_uppercase()),
            Style::default().bg(mode_color(mode)).fg(Color::Black).bold(),
        ),
        Span::raw(" "),
        Span::styled(app.api_url.clone(), Style::default().fg(Color::Gray)),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let mode_style = match app.input_mode {
        InputMode::Normal => Style::default().bg(Color::Blue).fg(Color::White),
        InputMode::Editing => Style::default().bg(Color::Yellow).fg(Color::Black),
    };

    let mode_text = match app.input_mode {
        InputMode::Normal => " CHAT ",
        InputMode::Editing => " INPUT ",
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let hints = if app.show_mode_picker {
        vec![
            Span::styled(" j/k ", key_style),
            Span::styled(" nav ", label_style),
            Span::styled(" Enter ", key_style),
            Span::styled(" select ", label_style),
            Span::styled(" Esc ", key_style),
            Span::styled(" cancel ", label_style),
        ]
    } else {
        match app.input_mode {
            InputMode::Normal => vec![
                Span::styled(" i ", key_style),
                Span::styled(" ask ", label_style),
                Span::styled(" j/k ", key_style),
                Span::styled(" scroll ", label_style),
                Span::styled(" n/p ", key_style),
                Span::styled(" details ", label_style),
                Span::styled(" J/K ", key_style),
                Span::styled(" scroll details ", label_style),
                Span::styled(" m ", key_style),
                Span::styled(" mode ", label_style),
                Span::styled(" 1/2/3 ", key_style),
                Span::styled(" naive/adv/cmp ", label_style),
                Span::styled(" q ", key_style),
                Span::styled(" quit ", label_style),
            ],
            InputMode::Editing => vec![
                Span::styled(" Enter ", key_style),
                Span::styled(" send ", label_style),
                Span::styled(" Esc ", key_style),
                Span::styled(" stop typing ", label_style),
            ],
        }
    };

    let footer_content = Line::from(
        vec![
            Span::styled(mode_text, mode_style),
            Span::styled(" ", label_style),
        ]
        .into_iter()
        .chain(hints)
        .collect::<Vec<_>>(),
    );

    let footer = Paragraph::new(footer_content).style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}

fn render_chat_screen(app: &mut App, frame: &mut Frame, area: Rect) {
    // Chat on the left, details of the selected answer on the right
    let [left_area, details_area] = Layout::horizontal([
        Constraint::Percentage(55),
        Constraint::Percentage(45),
    ])
    .areas(area);

    let [chat_area, input_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(3),
    ])
    .areas(left_area);

    // Store areas for mouse hit-testing
    app.chat_area = Some(chat_area);
    app.details_area = Some(details_area);

    // Inner size minus borders, for scroll calculations
    app.chat_height = chat_area.height.saturating_sub(2);
    app.chat_width = chat_area.width.saturating_sub(2);

    render_transcript(app, frame, chat_area);
    render_input(app, frame, input_area);
    render_details(app, frame, details_area);
}

fn render_transcript(app: &App, frame: &mut Frame, area: Rect) {
    let focused = app.focus == FocusPane::Chat;
    let border_color = if focused { Color::Cyan } else { Color::DarkGray };

    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(format!(" Chat: {} ", app.conversation.mode().display_name()));

    let mut lines: Vec<Line> = Vec::new();

    for (idx, msg) in app.conversation.messages().iter().enumerate() {
        let time = msg.timestamp().format("%H:%M").to_string();
        let (label, color) = match msg.sender() {
            Sender::User => ("You:", Color::Cyan),
            Sender::Bot => ("AI:", Color::Yellow),
        };
        let marker = if app.selected_detail == Some(idx) { "> " } else { "" };

        lines.push(Line::from(vec![
            Span::styled(
                format!("{}{}", marker, label),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ),
            Span::styled(format!(" {}", time), Style::default().fg(Color::DarkGray)),
        ]));

        match msg.sender() {
            Sender::User => {
                for line in chat_body(msg).lines() {
                    lines.push(Line::from(line.to_string()));
                }
            }
            Sender::Bot => {
                for line in chat_body(msg).lines() {
                    lines.push(parse_markdown_line(line));
                }
            }
        }
        lines.push(Line::default());
    }

    if app.is_loading() {
        lines.push(Line::from(Span::styled(
            "AI:",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )));
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        lines.push(Line::from(Span::styled(
            format!("Thinking{}", dots),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }

    let chat = Paragraph::new(Text::from(lines))
        .block(chat_block)
        .wrap(Wrap { trim: true })
        .scroll((app.chat_scroll, 0));

    frame.render_widget(chat, area);
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let editing = app.input_mode == InputMode::Editing;
    let input_border_color = if editing { Color::Yellow } else { Color::DarkGray };

    let title = if app.is_loading() {
        " Ask (waiting for answer...) "
    } else {
        " Ask (i to type, Enter to send) "
    };

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(input_border_color))
        .title(title);

    // Horizontal scrolling keeps the cursor visible
    let inner_width = area.width.saturating_sub(2) as usize;
    let cursor_pos = app.query_cursor;

    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    let visible_text: String = app
        .conversation
        .input
        .chars()
        .skip(scroll_offset)
        .take(inner_width)
        .collect();

    let input = Paragraph::new(visible_text)
        .style(Style::default().fg(Color::Cyan))
        .block(input_block);

    frame.render_widget(input, area);

    if editing {
        let cursor_x = (cursor_pos - scroll_offset) as u16;
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

fn render_details(app: &App, frame: &mut Frame, area: Rect) {
    let focused = app.focus == FocusPane::Details;
    let border_color = if focused { Color::Cyan } else { Color::DarkGray };

    let Some(msg) = app.selected_message() else {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border_color))
            .title(" Details ");
        let placeholder = Paragraph::new(Span::styled(
            "Sources and comparisons appear here. Use n/p to pick an answer.",
            Style::default().fg(Color::DarkGray),
        ))
        .block(block)
        .wrap(Wrap { trim: true });
        frame.render_widget(placeholder, area);
        return;
    };

    if let Some(comparison) = msg.comparison() {
        render_comparison(app, comparison, frame, area, border_color);
    } else {
        render_sources(app, msg, frame, area, border_color);
    }
}

fn render_sources(app: &App, msg: &Message, frame: &mut Frame, area: Rect, border_color: Color) {
    let sources = msg.sources().unwrap_or_default();

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(format!(" Sources ({}) ", sources.len()));

    let details = Paragraph::new(Text::from(source_lines(sources)))
        .block(block)
        .wrap(Wrap { trim: true })
        .scroll((app.detail_scroll, 0));

    frame.render_widget(details, area);
}

fn render_comparison(
    app: &App,
    comparison: &Comparison,
    frame: &mut Frame,
    area: Rect,
    border_color: Color,
) {
    let [naive_area, advanced_area] = Layout::horizontal([
        Constraint::Percentage(50),
        Constraint::Percentage(50),
    ])
    .areas(area);

    for (title, result, column) in [
        ("Naive", &comparison.naive, naive_area),
        ("Advanced", &comparison.advanced, advanced_area),
    ] {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border_color))
            .title(format!(" {} ({:.2}s) ", title, result.processing_time));

        let column_text = Paragraph::new(Text::from(result_lines(result)))
            .block(block)
            .wrap(Wrap { trim: true })
            .scroll((app.detail_scroll, 0));

        frame.render_widget(column_text, column);
    }
}

fn result_lines(result: &ChatResult) -> Vec<Line<'static>> {
    let mut lines: Vec<Line<'static>> = result.answer.lines().map(parse_markdown_line).collect();
    lines.push(Line::default());
    lines.push(Line::from(Span::styled(
        format!("Sources ({})", result.sources.len()),
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
    )));
    lines.extend(source_lines(&result.sources));
    lines
}

fn source_lines(sources: &[Source]) -> Vec<Line<'static>> {
    if sources.is_empty() {
        return vec![Line::from(Span::styled(
            "No sources returned.",
            Style::default().fg(Color::DarkGray),
        ))];
    }

    let mut lines = Vec::new();
    for (i, source) in sources.iter().enumerate() {
        lines.push(Line::from(vec![
            Span::styled(
                format!("{}. Article {}", i + 1, source.article_number),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("  score {:.3}", source.score),
                Style::default().fg(Color::DarkGray),
            ),
        ]));
        lines.push(Line::from(source.content.clone()));
        lines.push(Line::default());
    }
    lines
}

fn render_mode_picker(app: &mut App, frame: &mut Frame, area: Rect) {
    let modes = Mode::all();

    // Calculate popup size and position (centered)
    let popup_width = 40.min(area.width.saturating_sub(4));
    let popup_height = (modes.len() as u16 + 2).min(area.height.saturating_sub(4));

    let popup_x = (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = (area.height.saturating_sub(popup_height)) / 2;

    let popup_area = Rect::new(popup_x, popup_y, popup_width, popup_height);

    // Clear the area behind the popup
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Answer Mode ");

    let current = app.conversation.mode();
    let items: Vec<ListItem> = modes
        .iter()
        .map(|mode| {
            let style = if *mode == current {
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            ListItem::new(format!(" {} ", mode.display_name())).style(style)
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, popup_area, &mut app.mode_picker_state);
}
