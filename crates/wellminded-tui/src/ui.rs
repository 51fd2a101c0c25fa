use std::time::{Duration, Instant};

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Padding, Paragraph, Wrap},
};
use wellminded_core::Sender;

use crate::app::{App, InputMode, Screen};
use crate::confetti::ConfettiView;
use crate::frame_view::FrameView;

const LAVENDER: Color = Color::Rgb(161, 157, 251);
const LAVENDER_DARK: Color = Color::Rgb(138, 131, 209);

const PRODUCT_NAME: &str = "WellMinded";
const GREETING: &str = "Hi! I'm WellMinded, your personal mental health assistant.";
const TAGLINE: &str = "Your wellbeing, our priority. Calm, confident check-ins.";
const START_LABEL: &str = "  Let's go!  ";
const MENU_TRAY: &str = " ⌂ GitHub   ☰ Docs ";

const EMPTY_STATE: [&str; 3] = ["Let's get started!", "Capture an image", "and write a message."];
const PLACEHOLDER: &str = "How are you feeling today?";
const SEND_LABEL: &str = "Let's talk!";
const SPINNER: [&str; 4] = ["◐", "◓", "◑", "◒"];

/// Fade-in on entering the capture screen
const CAPTURE_FADE: Duration = Duration::from_millis(600);

/// Rows the landing content rests below the header, used as room for the
/// slide animations
const LANDING_MARGIN: u16 = 4;

const HIKER: &str = r"
            /\
           /  \       /\
      o   /    \     /  \
     /|\ /      \   /    \
     / \/        \ /      \
   ____/__________\________\___
";

const BOT: &str = r"
  .---.
 ( o o )
  ) - (
";

pub fn render(app: &mut App, frame: &mut Frame) {
    render_at(app, frame, Instant::now());
}

/// Draw the whole UI as it looks at `now`.
pub fn render_at(app: &mut App, frame: &mut Frame, now: Instant) {
    let area = frame.area();

    let [body_area, footer_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    match app.screen {
        Screen::Landing => render_landing(app, frame, body_area, now),
        Screen::Capture => render_capture(app, frame, body_area, now),
    }

    render_footer(app, frame, footer_area);

    if let Some(alert) = &app.alert {
        render_alert(alert, frame, area);
    }
}

fn render_landing(app: &App, frame: &mut Frame, area: Rect, now: Instant) {
    let [header_area, content_area] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Min(0),
    ])
    .areas(area);

    render_landing_header(app, frame, header_area, now);

    let entrance = app.landing.entrance_progress(now);
    let exit = app.landing.exit_progress(now);
    if exit >= 1.0 {
        return;
    }

    // Slide up into place on entrance, keep sliding up on exit
    let offset = ((1.0 - entrance) * 3.0).round() as i32 - (exit * LANDING_MARGIN as f32).round() as i32;
    let content_area = shift_content(content_area, offset);

    let [text_area, art_area] = Layout::horizontal([
        Constraint::Percentage(55),
        Constraint::Percentage(45),
    ])
    .areas(content_area);

    let text = vec![
        Line::from(Span::styled(GREETING, Style::default().fg(Color::Gray))),
        Line::default(),
        Line::from(Span::styled(TAGLINE, Style::default().fg(LAVENDER).bold())),
        Line::default(),
        Line::default(),
        Line::from(Span::styled(
            START_LABEL,
            Style::default().bg(LAVENDER).fg(Color::White).bold(),
        )),
    ];
    let text = Paragraph::new(text)
        .wrap(Wrap { trim: true })
        .block(Block::default().padding(Padding::horizontal(2)));
    frame.render_widget(text, text_area);

    let art = Paragraph::new(HIKER.trim_start_matches('\n')).style(Style::default().fg(LAVENDER_DARK));
    frame.render_widget(art, art_area);

    if entrance < 0.5 || exit > 0.4 {
        frame
            .buffer_mut()
            .set_style(content_area, Style::default().add_modifier(Modifier::DIM));
    }
}

fn render_landing_header(app: &App, frame: &mut Frame, area: Rect, now: Instant) {
    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(Style::default().fg(Color::DarkGray));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    // The sticker grows while the tray is open
    let sticker_style = if app.landing.is_menu_open() {
        Style::default().bg(LAVENDER_DARK).fg(Color::White).bold()
    } else {
        Style::default().bg(LAVENDER).fg(Color::White)
    };
    let sticker = if app.landing.is_menu_open() { "  ✿  " } else { " ✿ " };

    let tray_len = MENU_TRAY.chars().count();
    let shown = (tray_len as f32 * app.landing.menu_progress(now)).round() as usize;
    let tray: String = MENU_TRAY.chars().take(shown).collect();

    let left = Line::from(vec![
        Span::raw(" "),
        Span::styled(sticker, sticker_style),
        Span::raw(" "),
        Span::styled(tray, Style::default().fg(LAVENDER)),
    ]);
    frame.render_widget(Paragraph::new(left), inner);

    let right = Line::from(Span::styled(
        format!("{} ", PRODUCT_NAME),
        Style::default().fg(LAVENDER).bold(),
    ));
    frame.render_widget(Paragraph::new(right).alignment(Alignment::Right), inner);
}

/// Place landing content `offset` rows away from its resting position.
fn shift_content(area: Rect, offset: i32) -> Rect {
    let margin = LANDING_MARGIN.min(area.height) as i32;
    let top = (margin + offset).clamp(0, area.height as i32) as u16;
    Rect {
        y: area.y + top,
        height: area.height - top,
        ..area
    }
}

fn render_capture(app: &mut App, frame: &mut Frame, area: Rect, now: Instant) {
    let [video_area, side_area] = Layout::horizontal([
        Constraint::Percentage(55),
        Constraint::Percentage(45),
    ])
    .areas(area);

    render_video(app, frame, video_area, now);
    render_chat(app, frame, side_area);

    let fading = app
        .capture_entered_at
        .is_some_and(|entered| now.saturating_duration_since(entered) < CAPTURE_FADE);
    if fading {
        frame
            .buffer_mut()
            .set_style(area, Style::default().add_modifier(Modifier::DIM));
    }
}

fn render_video(app: &mut App, frame: &mut Frame, area: Rect, now: Instant) {
    let title = if app.session.is_capturing() {
        format!(" Camera: {} ", app.camera_name())
    } else {
        " Captured ".to_string()
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(LAVENDER))
        .title(title);
    let inner = block.inner(area);
    frame.render_widget(block, area);
    app.video_area = Some(inner);

    let [picture_area, hint_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(inner);

    if app.session.is_flashing() {
        frame.render_widget(Block::default().style(Style::default().bg(Color::White)), picture_area);
    } else if let Some(captured) = app.session.captured() {
        match captured.preview() {
            Some(image) => frame.render_widget(FrameView::new(image), picture_area),
            None => render_placeholder(frame, picture_area, "Empty frame"),
        }
    } else if let Some(feed) = &app.feed {
        feed.with_latest(|latest| match latest {
            Some(image) => frame.render_widget(FrameView::new(image), picture_area),
            None => render_placeholder(frame, picture_area, "Waiting for the first frame..."),
        });
    } else if app.camera_task.is_some() {
        render_placeholder(frame, picture_area, "Requesting camera access...");
    } else {
        render_placeholder(frame, picture_area, "No camera feed");
    }

    if let Some(burst) = &app.confetti {
        frame.render_widget(ConfettiView::new(burst, now), picture_area);
    }

    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().fg(Color::White);
    let (icon, key, label) = if app.session.captured().is_some() && !app.session.is_flashing() {
        ("⟳", " r ", " retry")
    } else {
        ("◉", " Space ", " capture")
    };
    let hint = Line::from(vec![
        Span::styled(format!("{} ", icon), Style::default().fg(LAVENDER).bold()),
        Span::styled(key, key_style),
        Span::styled(label, label_style),
    ]);
    frame.render_widget(Paragraph::new(hint).alignment(Alignment::Center), hint_area);
}

fn render_placeholder(frame: &mut Frame, area: Rect, text: &str) {
    if area.height == 0 {
        return;
    }
    let line_area = Rect {
        y: area.y + area.height / 2,
        height: 1,
        ..area
    };
    let placeholder = Paragraph::new(text)
        .style(Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC))
        .alignment(Alignment::Center);
    frame.render_widget(placeholder, line_area);
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    let [chat_area, input_area, button_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(3),
        Constraint::Length(3),
    ])
    .areas(area);

    // Store chat area for mouse hit-testing and its inner size for scrolling
    app.chat_area = Some(chat_area);
    app.chat_height = chat_area.height.saturating_sub(2);
    app.chat_width = chat_area.width.saturating_sub(2);

    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Chat ");

    let in_flight = app.session.in_flight();

    if app.session.transcript().is_empty() && !in_flight {
        let inner = chat_block.inner(chat_area);
        frame.render_widget(chat_block, chat_area);

        let mut lines: Vec<Line> = BOT
            .trim_start_matches('\n')
            .lines()
            .map(|line| Line::from(Span::styled(line, Style::default().fg(LAVENDER_DARK))))
            .collect();
        lines.push(Line::default());
        lines.extend(EMPTY_STATE.iter().map(|line| {
            Line::from(Span::styled(*line, Style::default().fg(LAVENDER).bold()))
        }));

        let height = lines.len() as u16;
        let top = inner.height.saturating_sub(height) / 2;
        let empty_area = Rect {
            y: inner.y + top,
            height: inner.height.saturating_sub(top),
            ..inner
        };
        frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), empty_area);
    } else {
        let mut lines: Vec<Line> = Vec::new();

        for message in app.session.transcript() {
            match message.sender {
                Sender::User => {
                    lines.push(
                        Line::from(Span::styled(
                            message.sender.display_name(),
                            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                        ))
                        .alignment(Alignment::Right),
                    );
                    for line in message.text.lines() {
                        lines.push(Line::from(line.to_string()).alignment(Alignment::Right));
                    }
                }
                Sender::Agent => {
                    lines.push(Line::from(Span::styled(
                        message.sender.display_name(),
                        Style::default().fg(LAVENDER).add_modifier(Modifier::BOLD),
                    )));
                    for line in message.text.lines() {
                        lines.push(Line::from(line.to_string()));
                    }
                }
            }
            lines.push(Line::default());
        }

        if in_flight {
            lines.push(Line::from(Span::styled(
                Sender::Agent.display_name(),
                Style::default().fg(LAVENDER).add_modifier(Modifier::BOLD),
            )));
            let dots = ".".repeat((app.animation_frame as usize / 4) % 3 + 1);
            lines.push(Line::from(Span::styled(
                format!("Thinking{}", dots),
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            )));
        }

        let chat = Paragraph::new(Text::from(lines))
            .block(chat_block)
            .wrap(Wrap { trim: true })
            .scroll((app.chat_scroll, 0));
        frame.render_widget(chat, chat_area);
    }

    render_message_input(app, frame, input_area);

    let button_label = if in_flight {
        let spinner = SPINNER[(app.animation_frame as usize / 2) % SPINNER.len()];
        format!(" {} {} ", spinner, SEND_LABEL)
    } else {
        format!(" {} ", SEND_LABEL)
    };
    let button_style = if in_flight {
        Style::default().bg(LAVENDER_DARK).fg(Color::White)
    } else {
        Style::default().bg(LAVENDER).fg(Color::White).bold()
    };
    let button = Paragraph::new(Line::from(Span::styled(button_label, button_style)))
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::TOP | Borders::BOTTOM)
                .border_style(Style::default().fg(Color::DarkGray)),
        );
    frame.render_widget(button, button_area);
}

fn render_message_input(app: &App, frame: &mut Frame, area: Rect) {
    let editing = app.input_mode == InputMode::Editing;
    let border_color = if editing { Color::Yellow } else { Color::DarkGray };

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(" Message (i to type) ");

    let message = app.session.message();

    // Calculate visible portion of input with horizontal scrolling
    // Inner width = total width - 2 (for borders)
    let inner_width = area.width.saturating_sub(2) as usize;
    let cursor_pos = app.message_cursor;

    // Calculate scroll offset to keep cursor visible
    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    let input = if message.is_empty() {
        Paragraph::new(PLACEHOLDER).style(Style::default().fg(Color::DarkGray))
    } else {
        let visible_text: String = message.chars().skip(scroll_offset).take(inner_width).collect();
        Paragraph::new(visible_text).style(Style::default().fg(Color::Cyan))
    };
    frame.render_widget(input.block(input_block), area);

    // Show cursor when editing
    if editing {
        let cursor_x = (cursor_pos - scroll_offset) as u16;
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let mode_style = match app.input_mode {
        InputMode::Normal => Style::default().bg(LAVENDER_DARK).fg(Color::White),
        InputMode::Editing => Style::default().bg(Color::Yellow).fg(Color::Black),
    };

    let mode_text = match (app.screen, app.input_mode) {
        (Screen::Landing, _) => " WELCOME ",
        (Screen::Capture, InputMode::Normal) => " CAPTURE ",
        (Screen::Capture, InputMode::Editing) => " MESSAGE ",
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let hints = if app.alert.is_some() {
        vec![
            Span::styled(" Enter ", key_style),
            Span::styled(" dismiss ", label_style),
        ]
    } else {
        match (app.screen, app.input_mode) {
            (Screen::Landing, _) => vec![
                Span::styled(" Enter ", key_style),
                Span::styled(" let's go ", label_style),
                Span::styled(" m ", key_style),
                Span::styled(" menu ", label_style),
                Span::styled(" q ", key_style),
                Span::styled(" quit ", label_style),
            ],
            (Screen::Capture, InputMode::Normal) => vec![
                Span::styled(" Space ", key_style),
                Span::styled(" capture ", label_style),
                Span::styled(" r ", key_style),
                Span::styled(" retry ", label_style),
                Span::styled(" i ", key_style),
                Span::styled(" type ", label_style),
                Span::styled(" s ", key_style),
                Span::styled(" send ", label_style),
                Span::styled(" j/k ", key_style),
                Span::styled(" scroll ", label_style),
                Span::styled(" q ", key_style),
                Span::styled(" quit ", label_style),
            ],
            (Screen::Capture, InputMode::Editing) => vec![
                Span::styled(" Enter ", key_style),
                Span::styled(" send ", label_style),
                Span::styled(" Esc ", key_style),
                Span::styled(" done ", label_style),
            ],
        }
    };

    let mut spans = vec![Span::styled(mode_text, mode_style), Span::raw(" ")];
    spans.extend(hints);

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_alert(alert: &str, frame: &mut Frame, area: Rect) {
    // Calculate popup size and position (centered)
    let popup_width = 56.min(area.width.saturating_sub(4));
    let popup_height = 7.min(area.height);

    let popup_x = area.x + (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = area.y + (area.height.saturating_sub(popup_height)) / 2;

    let popup_area = Rect::new(popup_x, popup_y, popup_width, popup_height);

    // Clear the area behind the popup
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" Notice ");

    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let [message_area, _, action_area] = Layout::vertical([
        Constraint::Min(1),
        Constraint::Length(1),
        Constraint::Length(1),
    ])
    .areas(inner);

    let message = Paragraph::new(alert)
        .wrap(Wrap { trim: true })
        .alignment(Alignment::Center);
    frame.render_widget(message, message_area);

    let action = Paragraph::new(Line::from(vec![
        Span::styled(" Enter ", Style::default().bg(Color::DarkGray).fg(Color::White)),
        Span::raw(" OK"),
    ]))
    .alignment(Alignment::Center);
    frame.render_widget(action, action_area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::{backend::TestBackend, buffer::Buffer, Terminal};
    use wellminded_core::landing::ENTRANCE_ANIMATION;

    use crate::app::tests::{captured_app, settle, test_app, CannedChat};

    fn draw(app: &mut App, now: Instant) -> Buffer {
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|frame| render_at(app, frame, now)).unwrap();
        terminal.backend().buffer().clone()
    }

    fn screen_text(buf: &Buffer) -> String {
        let area = buf.area;
        (0..area.height)
            .map(|y| {
                (0..area.width)
                    .map(|x| buf[(x, y)].symbol())
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[tokio::test]
    async fn test_landing_shows_greeting_and_start() {
        let mut app = test_app(CannedChat::replying("hi"));
        let now = Instant::now() + ENTRANCE_ANIMATION;
        let text = screen_text(&draw(&mut app, now));

        assert!(text.contains(PRODUCT_NAME));
        assert!(text.contains("Let's go!"));
        assert!(text.contains("Your wellbeing, our priority."));
        assert!(!text.contains("GitHub"));
    }

    #[tokio::test]
    async fn test_landing_menu_tray_opens() {
        let mut app = test_app(CannedChat::replying("hi"));
        let t0 = Instant::now();
        app.landing.toggle_menu(t0);
        let text = screen_text(&draw(&mut app, t0 + Duration::from_secs(1)));

        assert!(text.contains("GitHub"));
        assert!(text.contains("Docs"));
    }

    #[tokio::test]
    async fn test_capture_empty_state() {
        let mut app = test_app(CannedChat::replying("hi"));
        let t0 = Instant::now();
        app.enter_capture(t0);
        settle(&mut app).await;
        let text = screen_text(&draw(&mut app, t0 + CAPTURE_FADE));

        assert!(text.contains("Let's get started!"));
        assert!(text.contains(PLACEHOLDER));
        assert!(text.contains(SEND_LABEL));
        assert!(text.contains("◉"));
        assert!(app.video_area.is_some());
        assert!(app.chat_area.is_some());
    }

    #[tokio::test]
    async fn test_transcript_and_retry_hint() {
        let mut app = captured_app(CannedChat::replying("breathe")).await;
        app.session.message_mut().push_str("hello there");
        app.send();
        settle(&mut app).await;

        let text = screen_text(&draw(&mut app, Instant::now() + CAPTURE_FADE));
        assert!(text.contains("You"));
        assert!(text.contains("hello there"));
        assert!(text.contains("Emoting"));
        assert!(text.contains("breathe"));
        assert!(text.contains("⟳"));
    }

    #[tokio::test]
    async fn test_flash_fills_video_white() {
        let mut app = test_app(CannedChat::replying("hi"));
        let t0 = Instant::now();
        app.enter_capture(t0);
        settle(&mut app).await;
        app.capture(t0);

        let buf = draw(&mut app, t0 + CAPTURE_FADE);
        let inner = app.video_area.unwrap();
        assert_eq!(buf[(inner.x + 1, inner.y + 1)].bg, Color::White);
    }

    #[tokio::test]
    async fn test_alert_popup_is_drawn() {
        let mut app = captured_app(CannedChat::replying("hi")).await;
        app.send();
        let text = screen_text(&draw(&mut app, Instant::now()));

        assert!(text.contains("Notice"));
        assert!(text.contains("Capture an image and write"));
    }

    #[test]
    fn test_shift_content_stays_inside() {
        let area = Rect::new(0, 3, 80, 20);
        assert_eq!(shift_content(area, 0).y, 3 + LANDING_MARGIN);
        assert_eq!(shift_content(area, -10).y, 3);
        let low = shift_content(area, 3);
        assert_eq!(low.y + low.height, area.y + area.height);
    }
}
