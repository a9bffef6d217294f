use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, FocusPane, InputMode, OutputSlot};
use crate::situation::Mode;

/// Wrap text to fit within a given width, breaking on word boundaries.
fn wrap_text_to_width(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![text.to_string()];
    }

    let mut lines = Vec::new();
    let mut current_line = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();

        if current_len == 0 {
            current_line = word.to_string();
            current_len = word_len;
        } else if current_len + 1 + word_len <= width {
            current_line.push(' ');
            current_line.push_str(word);
            current_len += 1 + word_len;
        } else {
            lines.push(current_line);
            current_line = word.to_string();
            current_len = word_len;
        }
    }

    if !current_line.is_empty() {
        lines.push(current_line);
    }

    if lines.is_empty() {
        lines.push(String::new());
    }

    lines
}

/// Render a value being edited with a block cursor at the char position.
fn edit_spans(value: &str, cursor: usize) -> Vec<Span<'static>> {
    let chars: Vec<char> = value.chars().collect();
    let before: String = chars.iter().take(cursor).collect();
    let at: String = chars
        .get(cursor)
        .map(|c| c.to_string())
        .unwrap_or_else(|| " ".to_string());
    let after: String = chars.iter().skip(cursor + 1).collect();

    vec![
        Span::raw(before),
        Span::styled(at, Style::default().add_modifier(Modifier::REVERSED)),
        Span::raw(after),
    ]
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(frame, header_area);

    let [form_area, results_area] =
        Layout::horizontal([Constraint::Percentage(42), Constraint::Percentage(58)])
            .areas(body_area);

    render_form(app, frame, form_area);
    render_results(app, frame, results_area);
    render_footer(app, frame, footer_area);

    if app.show_api_key_input {
        render_api_key_input(app, frame, area);
    }
}

fn render_header(frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(" Dues ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(
            "payment reminder drafts ",
            Style::default().fg(Color::Gray),
        ),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_form(app: &App, frame: &mut Frame, area: Rect) {
    let border_style = if app.focus == FocusPane::Form {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(" Situation ");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut lines: Vec<Line> = Vec::new();

    // Mode tabs
    let tab_style = |selected: bool| {
        if selected {
            Style::default().bg(Color::Blue).fg(Color::White).bold()
        } else {
            Style::default().fg(Color::DarkGray)
        }
    };
    lines.push(Line::from(vec![
        Span::styled(
            format!(" 1 {} ", Mode::Collect.label()),
            tab_style(app.details.mode == Mode::Collect),
        ),
        Span::raw("  "),
        Span::styled(
            format!(" 2 {} ", Mode::Negotiate.label()),
            tab_style(app.details.mode == Mode::Negotiate),
        ),
    ]));
    lines.push(Line::default());

    let fields = app.visible_fields();
    let focused_idx = app.field_idx.min(fields.len() - 1);

    for (i, field) in fields.iter().enumerate() {
        let is_focused = app.focus == FocusPane::Form && i == focused_idx;
        let editing = is_focused && app.input_mode == InputMode::Editing;

        let label_style = if is_focused {
            Style::default().fg(Color::Yellow).bold()
        } else {
            Style::default().fg(Color::Gray)
        };

        let marker = if is_focused { "▸ " } else { "  " };
        let mut spans = vec![
            Span::styled(marker, label_style),
            Span::styled(format!("{:<18}", field.label()), label_style),
        ];

        let value = app.field_value(*field);
        if field.is_select() {
            spans.push(Span::styled(
                format!("◂ {} ▸", value),
                if is_focused {
                    Style::default().fg(Color::White).bold()
                } else {
                    Style::default().fg(Color::White)
                },
            ));
        } else if editing {
            spans.extend(edit_spans(value, app.edit_cursor));
        } else if value.is_empty() {
            spans.push(Span::styled("—", Style::default().fg(Color::DarkGray)));
        } else {
            spans.push(Span::raw(value.to_string()));
        }

        lines.push(Line::from(spans));
    }

    lines.push(Line::default());
    lines.push(Line::from(Span::styled(
        if app.loading {
            " Drafting… ".to_string()
        } else {
            " g  Generate Reminders ".to_string()
        },
        if app.loading {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default().bg(Color::Green).fg(Color::Black).bold()
        },
    )));

    frame.render_widget(Paragraph::new(lines), inner);
}

fn render_results(app: &mut App, frame: &mut Frame, area: Rect) {
    let border_style = if app.focus == FocusPane::Results {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(" Reminders ");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    // Error banner sits above whatever else is showing
    let content_area = if let Some(error) = &app.error {
        let [banner_area, rest] =
            Layout::vertical([Constraint::Length(2), Constraint::Min(0)]).areas(inner);
        let banner = Paragraph::new(error.clone())
            .style(Style::default().fg(Color::Red))
            .wrap(Wrap { trim: true });
        frame.render_widget(banner, banner_area);
        rest
    } else {
        inner
    };

    if app.loading {
        let dots = ".".repeat((app.animation_frame + 1) as usize);
        let waiting = Paragraph::new(format!("Drafting reminders{}", dots))
            .style(Style::default().fg(Color::Yellow));
        frame.render_widget(waiting, content_area);
        return;
    }

    let width = content_area.width.saturating_sub(1) as usize;
    let selected_slot = app.selected_slot();

    // Pull everything the widgets need out as owned data so the list
    // state can be borrowed mutably afterwards.
    let (summary_lines, principles, items, voice_copied, voice_lines) = {
        let Some(set) = &app.reminders else {
            let help = Paragraph::new(
                "Fill in the situation on the left, then press g to draft four reminder \
                 variants and a voice-note script.",
            )
            .style(Style::default().fg(Color::DarkGray))
            .wrap(Wrap { trim: true });
            frame.render_widget(help, content_area);
            return;
        };

        let summary_lines = wrap_text_to_width(&set.summary, width);

        let mut principles: Vec<Span> = Vec::new();
        for p in &set.principles {
            principles.push(Span::styled(
                format!(" {} ", p),
                Style::default().bg(Color::DarkGray).fg(Color::White),
            ));
            principles.push(Span::raw(" "));
        }

        let items: Vec<ListItem> = set
            .variants
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let mut title_spans = vec![Span::styled(
                    format!("Variant {}: {}", v.variant, v.title),
                    Style::default().fg(Color::Cyan).bold(),
                )];
                if app.is_copied(OutputSlot::Variant(i)) {
                    title_spans.push(Span::styled(
                        "  ✓ copied",
                        Style::default().fg(Color::Green).bold(),
                    ));
                }

                let mut item_lines = vec![Line::from(title_spans)];
                for wrapped in wrap_text_to_width(&v.content, width.saturating_sub(2)) {
                    item_lines.push(Line::from(format!("  {}", wrapped)));
                }
                item_lines.push(Line::default());
                ListItem::new(item_lines)
            })
            .collect();

        let voice_copied = app.is_copied(OutputSlot::VoiceNote);
        let voice_lines = wrap_text_to_width(&set.voice_note, width.saturating_sub(2));

        (summary_lines, principles, items, voice_copied, voice_lines)
    };

    let summary_height = summary_lines.len() as u16 + 2;
    let voice_height = (voice_lines.len() as u16 + 2).min(8);
    let [summary_area, variants_area, voice_area] = Layout::vertical([
        Constraint::Length(summary_height),
        Constraint::Min(0),
        Constraint::Length(voice_height),
    ])
    .areas(content_area);

    let mut summary_text: Vec<Line> = summary_lines
        .into_iter()
        .map(|l| Line::from(Span::styled(l, Style::default().fg(Color::White))))
        .collect();
    summary_text.push(Line::default());
    summary_text.push(Line::from(principles));
    frame.render_widget(Paragraph::new(summary_text), summary_area);

    let list = List::new(items).highlight_style(Style::default().bg(Color::Black));
    app.variants_state.select(match selected_slot {
        Some(OutputSlot::Variant(i)) => Some(i),
        _ => None,
    });
    frame.render_stateful_widget(list, variants_area, &mut app.variants_state);

    let voice_selected = selected_slot == Some(OutputSlot::VoiceNote);
    let voice_title = if voice_copied {
        " Voice note ✓ copied "
    } else {
        " Voice note "
    };
    let voice_block = Block::default()
        .borders(Borders::TOP)
        .border_style(if voice_selected {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default().fg(Color::DarkGray)
        })
        .title(voice_title);
    let voice_inner = voice_block.inner(voice_area);
    frame.render_widget(voice_block, voice_area);
    let voice_text: Vec<Line> = voice_lines.into_iter().map(Line::from).collect();
    frame.render_widget(Paragraph::new(voice_text), voice_inner);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let hints: Vec<Span> = if app.show_api_key_input {
        vec![
            Span::styled(" Enter ", key_style),
            Span::styled(" save key ", label_style),
            Span::styled(" Esc ", key_style),
            Span::styled(" cancel ", label_style),
        ]
    } else if app.input_mode == InputMode::Editing {
        vec![
            Span::styled(" Enter/Esc ", key_style),
            Span::styled(" done ", label_style),
            Span::styled(" ←/→ ", key_style),
            Span::styled(" move ", label_style),
        ]
    } else if app.focus == FocusPane::Results {
        vec![
            Span::styled(" j/k ", key_style),
            Span::styled(" select ", label_style),
            Span::styled(" c ", key_style),
            Span::styled(" copy ", label_style),
            Span::styled(" Tab ", key_style),
            Span::styled(" form ", label_style),
            Span::styled(" g ", key_style),
            Span::styled(" redraft ", label_style),
            Span::styled(" q ", key_style),
            Span::styled(" quit ", label_style),
        ]
    } else {
        vec![
            Span::styled(" j/k ", key_style),
            Span::styled(" field ", label_style),
            Span::styled(" Enter ", key_style),
            Span::styled(" edit ", label_style),
            Span::styled(" h/l ", key_style),
            Span::styled(" options ", label_style),
            Span::styled(" 1/2 ", key_style),
            Span::styled(" mode ", label_style),
            Span::styled(" g ", key_style),
            Span::styled(" generate ", label_style),
            Span::styled(" Tab ", key_style),
            Span::styled(" results ", label_style),
            Span::styled(" q ", key_style),
            Span::styled(" quit ", label_style),
        ]
    };

    frame.render_widget(Paragraph::new(Line::from(hints)), area);
}

fn render_api_key_input(app: &App, frame: &mut Frame, area: Rect) {
    let popup = centered_rect(56, 6, area);
    frame.render_widget(Clear, popup);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" Gemini API key ");
    let inner = block.inner(popup);
    frame.render_widget(block, popup);

    // Masked input with a block cursor
    let masked: String = "•".repeat(app.api_key_input.chars().count());
    let mut lines = vec![Line::default(), Line::from(edit_spans(&masked, app.api_key_cursor))];
    lines.push(Line::default());
    lines.push(Line::from(Span::styled(
        "Stored in the config file. GEMINI_API_KEY overrides it.",
        Style::default().fg(Color::DarkGray),
    )));

    frame.render_widget(Paragraph::new(lines), inner);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_respects_width() {
        let lines = wrap_text_to_width("pay the five hundred rupees today", 10);
        assert!(lines.iter().all(|l| l.chars().count() <= 10));
        assert_eq!(lines.join(" "), "pay the five hundred rupees today");
    }

    #[test]
    fn test_wrap_zero_width_passes_through() {
        assert_eq!(wrap_text_to_width("abc", 0), vec!["abc".to_string()]);
    }

    #[test]
    fn test_edit_spans_places_cursor_at_end() {
        let spans = edit_spans("ab", 2);
        assert_eq!(spans[0].content, "ab");
        assert_eq!(spans[1].content, " ");
    }
}
