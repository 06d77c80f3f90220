use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;

pub mod layout;

use crate::app::{App, ConnectButton, Focus, InputMode, StatusLevel};
use crate::domain::audit::{format_timestamp, AuditDetails, AuditUri};

pub fn draw(f: &mut Frame, app: &App) {
    let areas = layout::areas(f.size());

    draw_header(f, areas.header, app);
    draw_list_panel(f, areas.list, app);
    draw_detail_panel(f, areas.details, app);
    draw_activity(f, areas.activity, app);
    draw_status_line(f, areas.status_line, app);
    draw_command_line(f, areas.command_line, app);
}

fn label(text: &str) -> Span<'static> {
    Span::styled(text.to_string(), Style::default().fg(Color::DarkGray))
}

fn draw_header(f: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(area);

    let endpoint = app
        .connection
        .as_ref()
        .map(|c| c.endpoint.clone())
        .or_else(|| app.wallet.as_ref().map(|w| w.endpoint.clone()))
        .unwrap_or_else(|| "--".to_string());
    let chain = app
        .connection
        .as_ref()
        .and_then(|c| c.chain_id)
        .map(|id| id.to_string())
        .unwrap_or_else(|| "--".to_string());

    let title = Line::from(vec![
        Span::styled(
            "Auditdesk",
            Style::default()
                .fg(Color::LightCyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        label("Wallet"),
        Span::raw(format!(" {} ", endpoint)),
        label("Chain"),
        Span::raw(format!(" {}", chain)),
    ]);
    let wallet_line = Line::from(Span::styled(
        app.wallet_line(),
        Style::default().fg(Color::Gray),
    ));

    let left = Paragraph::new(Text::from(vec![title, wallet_line]))
        .block(Block::default().borders(Borders::ALL))
        .alignment(Alignment::Left);

    let button_style = match app.button {
        ConnectButton::Connected => Style::default().fg(Color::LightGreen),
        ConnectButton::Install => Style::default()
            .fg(Color::Black)
            .bg(Color::LightYellow)
            .add_modifier(Modifier::BOLD),
        ConnectButton::Connect => Style::default()
            .fg(Color::Black)
            .bg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
        ConnectButton::Detecting | ConnectButton::Onboarding | ConnectButton::Connecting => {
            Style::default().fg(Color::DarkGray)
        }
    };
    let mut button_lines = vec![Line::from(Span::styled(
        format!(" {} ", app.button.label()),
        button_style,
    ))];
    if app.button.is_enabled() && app.button != ConnectButton::Connected {
        button_lines.push(Line::from(label("Enter to press")));
    } else if let Some(wallet) = &app.wallet {
        button_lines.push(Line::from(label(&wallet.client_version)));
    }
    let right = Paragraph::new(Text::from(button_lines))
        .block(Block::default().borders(Borders::ALL))
        .alignment(Alignment::Center);

    f.render_widget(left, chunks[0]);
    f.render_widget(right, chunks[1]);
}

fn draw_list_panel(f: &mut Frame, area: Rect, app: &App) {
    let title = match &app.query {
        Some(query) => format!("Audits: {} ({})", query, app.audits.len()),
        None => "Audits".to_string(),
    };
    let border_style = if app.focus == Focus::List {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    let highlight_style = if app.focus == Focus::List {
        Style::default()
            .fg(Color::Black)
            .bg(Color::Cyan)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().add_modifier(Modifier::BOLD)
    };

    let items: Vec<ListItem> = app
        .audits
        .iter()
        .map(|address| {
            let line = match app.summaries.get(address) {
                Some(summary) => Line::from(vec![
                    Span::raw(short_addr(&address.to_string())),
                    Span::raw("  "),
                    Span::styled(
                        format!("{:<14}", truncate_str(&summary.status, 14)),
                        status_style(&summary.status),
                    ),
                    Span::raw(format!(
                        " {} / {}",
                        truncate_str(&summary.owner_name, 16),
                        truncate_str(&summary.title, 24)
                    )),
                ]),
                None => Line::from(vec![
                    Span::raw(short_addr(&address.to_string())),
                    Span::styled("  loading…", Style::default().fg(Color::DarkGray)),
                ]),
            };
            ListItem::new(line)
        })
        .collect();

    let empty = items.is_empty();
    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .border_style(border_style),
        )
        .highlight_style(highlight_style)
        .highlight_symbol(">> ");

    let mut state = ListState::default();
    if !empty {
        state.select(Some(app.selected));
    }
    f.render_stateful_widget(list, area, &mut state);
}

fn status_style(status: &str) -> Style {
    let upper = status.to_uppercase();
    if upper.contains("COMPLETE") || upper.contains("PUBLISH") {
        Style::default().fg(Color::LightGreen)
    } else if upper.contains("BOOK") || upper.contains("PROGRESS") {
        Style::default().fg(Color::LightYellow)
    } else if upper.contains("WITHDRAW") || upper.contains("EXPIRE") {
        Style::default().fg(Color::LightRed)
    } else {
        Style::default().fg(Color::White)
    }
}

fn draw_detail_panel(f: &mut Frame, area: Rect, app: &App) {
    let border_style = if app.focus == Focus::Details {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };

    let mut lines = match &app.details {
        Some(details) => detail_lines(details),
        None => Vec::new(),
    };
    if lines.is_empty() {
        lines.push(Line::from("No audit open (Enter or :open <address>)"));
    }

    let paragraph = Paragraph::new(Text::from(lines))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Audit")
                .border_style(border_style),
        )
        .wrap(Wrap { trim: true });

    f.render_widget(paragraph, area);
}

fn field(name: &str, value: impl Into<String>) -> Line<'static> {
    Line::from(vec![label(&format!("{name:<14}")), Span::raw(value.into())])
}

fn uri_line(uri: &AuditUri) -> Line<'static> {
    let mut spans = vec![Span::raw("  ")];
    if !uri.label.is_empty() {
        spans.push(Span::styled(
            format!("{} ", uri.label),
            Style::default().fg(Color::LightCyan),
        ));
    }
    spans.push(Span::raw(uri.uri.clone()));
    if uri.is_private {
        spans.push(Span::styled(" (private)", Style::default().fg(Color::LightYellow)));
    }
    Line::from(spans)
}

fn detail_lines(details: &AuditDetails) -> Vec<Line<'static>> {
    let seed = &details.seed;
    let mut lines = vec![
        Line::from(Span::styled(
            seed.title.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        field("Address", details.address.to_string()),
        field("Name", format!("{} v{}", details.name, details.version)),
        Line::from(vec![
            label(&format!("{:<14}", "Status")),
            Span::styled(details.status.clone(), status_style(&details.status)),
        ]),
        field("Owner", format!("{} ({})", seed.owner_name, seed.owner)),
        field("Uploaded", format_timestamp(seed.upload_date)),
        field("Audit window", format!("{} s", seed.max_audit_window)),
        field("Carbon offset", seed.carbon_offset.to_string()),
    ];

    if seed.is_booked() {
        lines.push(field(
            "Auditor",
            format!("{} ({})", seed.auditor_name, seed.auditor),
        ));
        lines.push(field("Audit start", format_timestamp(seed.audit_start)));
        lines.push(field("Est. end", format_timestamp(details.estimated_end)));
    } else {
        lines.push(field("Auditor", "not booked"));
    }
    lines.push(field("Audited", format_timestamp(seed.audit_date)));
    lines.push(field("Published", format_timestamp(seed.publish_date)));
    lines.push(field("Expires", format_timestamp(seed.expires)));

    lines.push(Line::from(""));
    lines.push(Line::from(label(&format!(
        "URIs to audit ({})",
        details.uris.uris.len()
    ))));
    lines.extend(details.uris.uris.iter().map(uri_line));
    if !details.uris.notes_uri.is_empty() {
        lines.push(field("Notes", details.uris.notes_uri.clone()));
    }

    if !details.public_data.is_empty() {
        lines.push(Line::from(label(&format!(
            "Public data ({})",
            details.public_data.len()
        ))));
        lines.extend(details.public_data.iter().map(uri_line));
    }

    lines.push(Line::from(""));
    match &details.report {
        Some(report) => {
            lines.push(field("Report", report.uri.clone()));
            lines.push(field("Declaration", report.declaration.to_string()));
        }
        None => lines.push(field("Report", "none")),
    }
    for (kind, proof) in &details.proofs {
        lines.push(field(
            &format!("Proof {kind}"),
            format!("{} #{}", proof.erc1155, proof.nft_id),
        ));
    }

    lines
}

fn draw_activity(f: &mut Frame, area: Rect, app: &App) {
    let visible = area.height.saturating_sub(2) as usize;
    let lines: Vec<Line> = app
        .activity
        .iter()
        .take(visible)
        .map(|entry| {
            Line::from(vec![
                label(&entry.at.format("%H:%M:%S ").to_string()),
                Span::styled(entry.text.clone(), Style::default().fg(level_color(entry.level))),
            ])
        })
        .collect();

    let paragraph = Paragraph::new(Text::from(lines))
        .block(Block::default().borders(Borders::ALL).title("Activity"));
    f.render_widget(paragraph, area);
}

fn level_color(level: StatusLevel) -> Color {
    match level {
        StatusLevel::Info => Color::LightGreen,
        StatusLevel::Warn => Color::LightYellow,
        StatusLevel::Error => Color::LightRed,
    }
}

fn draw_status_line(f: &mut Frame, area: Rect, app: &App) {
    let mut spans = vec![label("Registry "), Span::raw(
        app.connection
            .as_ref()
            .map(|c| short_addr(&c.registry.to_string()))
            .unwrap_or_else(|| "--".to_string()),
    )];
    spans.push(Span::raw("  "));
    spans.push(label("Manager "));
    spans.push(Span::raw(
        app.connection
            .as_ref()
            .and_then(|c| c.manager)
            .map(|m| short_addr(&m.to_string()))
            .unwrap_or_else(|| "--".to_string()),
    ));
    if let Some(report) = &app.conformance {
        spans.push(Span::raw("  "));
        spans.push(label("ABI "));
        spans.push(Span::raw(if report.is_ok() {
            format!("{} ok", report.checked_methods)
        } else {
            format!("{} mismatches", report.mismatches.len())
        }));
    }
    if let Some(last) = &app.command.last {
        spans.push(Span::raw("  "));
        spans.push(label("Last "));
        spans.push(Span::raw(format!(":{last}")));
    }

    let paragraph = Paragraph::new(Line::from(spans))
        .style(Style::default().fg(Color::White))
        .alignment(Alignment::Left);

    f.render_widget(paragraph, area);
}

/// Get command hint for autocompletion
fn command_hint(input: &str) -> Option<&'static str> {
    let input = input.trim().to_lowercase();
    if input.is_empty() {
        return None;
    }
    let word = input.split_whitespace().next().unwrap_or("");

    let commands = [
        ("connect", "Connect the wallet"),
        ("mine", "List my audits"),
        ("public", "public [address]"),
        ("status", "status <status>"),
        ("auditor", "auditor [address]"),
        ("open", "open <audit address>"),
        ("refresh", "Reload list and open audit"),
        ("book", "book <auditor name>"),
        ("submit", "submit <report uri> <declaration> <seal uri> <manifest uri>"),
        ("publish", "Make the open audit public"),
        ("withdraw", "Withdraw the open audit"),
        ("upload", "upload owner|title|window|offset|uri,label,private;...|notes|manifest"),
        ("receipt", "receipt [tx hash]"),
        ("abi", "Check ABI tables against bindings"),
        ("quit", "Quit"),
    ];

    commands
        .iter()
        .find(|(cmd, _)| cmd.starts_with(word))
        .map(|(_, desc)| *desc)
}

fn draw_command_line(f: &mut Frame, area: Rect, app: &App) {
    let content = match app.input_mode {
        InputMode::Command => {
            let hint = command_hint(&app.command.input).unwrap_or("Enter=run Esc=cancel");
            Line::from(vec![
                Span::styled(": ", Style::default().fg(Color::Yellow)),
                Span::raw(app.command.input.clone()),
                Span::styled(format!("  {}", hint), Style::default().fg(Color::DarkGray)),
            ])
        }
        InputMode::Normal => {
            if let Some((text, level)) = app.status_text() {
                Line::from(vec![
                    label("msg: "),
                    Span::styled(text.to_string(), Style::default().fg(level_color(level))),
                ])
            } else {
                Line::from(label(
                    "Enter open/connect  j/k move  Tab focus  y copy  : command  q quit",
                ))
            }
        }
    };

    let paragraph = Paragraph::new(content).style(Style::default().fg(Color::White));
    f.render_widget(paragraph, area);
}

fn short_addr(value: &str) -> String {
    if value.len() <= 10 {
        return value.to_string();
    }
    let start: String = value.chars().take(6).collect();
    let end: String = value
        .chars()
        .rev()
        .take(4)
        .collect::<String>()
        .chars()
        .rev()
        .collect();
    format!("{}..{}", start, end)
}

fn truncate_str(value: &str, max: usize) -> String {
    if value.chars().count() <= max {
        return value.to_string();
    }
    value.chars().take(max).collect::<String>() + "…"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_hint() {
        assert_eq!(command_hint("bo"), Some("book <auditor name>"));
        assert_eq!(command_hint("submit ipfs://"), command_hint("submit"));
        assert_eq!(command_hint(""), None);
        assert_eq!(command_hint("zzz"), None);
    }

    #[test]
    fn test_short_addr() {
        assert_eq!(
            short_addr("0x1d012AE2340C058D1473ACC911c0B3144B7F5EF2"),
            "0x1d01..5EF2"
        );
        assert_eq!(short_addr("0x1234"), "0x1234");
    }

    #[test]
    fn test_truncate_str() {
        assert_eq!(truncate_str("Emissions", 4), "Emis…");
        assert_eq!(truncate_str("Q3", 4), "Q3");
    }
}
