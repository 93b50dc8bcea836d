use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, List, ListItem, ListState, Paragraph, Row, Table, TableState, Wrap},
};

use recview::board::CardView;
use recview::domain::{CMDMode, RVConfig};
use recview::sort::SortDirection;
use recview::source::Severity;
use recview::table::PageItem;

use crate::model::{BoardData, Model, TableData, UIData, View};

pub struct TableUI {
    max_column_width: usize,
    table_state: TableState,
    record_state: TableState,
}

impl TableUI {
    pub fn new(cfg: &RVConfig) -> Self {
        Self {
            max_column_width: cfg.max_column_width,
            table_state: TableState::default(),
            record_state: TableState::default(),
        }
    }

    pub fn draw(&mut self, model: &Model, frame: &mut Frame) {
        let uidata = model.get_uidata();
        let [main, pager, cmdline] = Layout::vertical([
            Constraint::Min(3),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .areas(frame.area());

        match uidata.view {
            View::Table => self.draw_table(&uidata.name, &uidata.table, frame, main),
            View::Board => draw_board(&uidata.board, frame, main),
            View::Record => self.draw_record(&uidata.record, frame, main),
        }
        draw_pager(&uidata.table, frame, pager);
        draw_cmdline(uidata, frame, cmdline);

        if uidata.show_popup {
            let area = frame.area();
            draw_popup(&uidata.popup_message, frame, area);
        }
    }

    fn draw_table(&mut self, name: &str, table: &TableData, frame: &mut Frame, area: Rect) {
        let mut widths: Vec<usize> = table.headers.iter().map(|h| h.chars().count() + 2).collect();
        for row in table.rows.iter() {
            for (width, cell) in widths.iter_mut().zip(row.iter()) {
                *width = (*width).max(cell.chars().count());
            }
        }
        let widths: Vec<Constraint> = widths
            .iter()
            .map(|w| Constraint::Length((*w).min(self.max_column_width) as u16))
            .collect();

        let header = Row::new(table.headers.iter().enumerate().map(|(idx, h)| {
            let marker = match table.sorted_column {
                Some((col, SortDirection::Asc)) if col == idx => " ▲",
                Some((col, SortDirection::Desc)) if col == idx => " ▼",
                _ => "",
            };
            let style = if idx == table.selected_column {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default().add_modifier(Modifier::BOLD)
            };
            Cell::from(format!("{h}{marker}")).style(style)
        }))
        .height(1);

        let rows = table.rows.iter().map(|row| {
            Row::new(
                row.iter()
                    .map(|cell| Cell::from(truncate(cell, self.max_column_width))),
            )
        });

        let block = Block::default()
            .borders(Borders::ALL)
            .title(Line::from(Span::raw(format!(" {name} ")).bold()).centered());
        let widget = Table::new(rows, widths)
            .header(header)
            .block(block)
            .column_spacing(1)
            .row_highlight_style(Style::default().bg(Color::DarkGray));

        self.table_state.select(if table.rows.is_empty() {
            None
        } else {
            Some(table.selected_row)
        });
        frame.render_stateful_widget(widget, area, &mut self.table_state);
    }

    fn draw_record(&mut self, record: &[(String, String)], frame: &mut Frame, area: Rect) {
        let key_width = record
            .iter()
            .map(|(k, _)| k.chars().count())
            .max()
            .unwrap_or(0) as u16;
        let rows = record.iter().map(|(k, v)| {
            Row::new(vec![
                Cell::from(k.as_str()).style(Style::default().fg(Color::Cyan)),
                Cell::from(v.as_str()),
            ])
        });
        let widget = Table::new(rows, [Constraint::Length(key_width), Constraint::Min(10)])
            .block(Block::default().borders(Borders::ALL).title(" Record "))
            .column_spacing(2);
        frame.render_stateful_widget(widget, area, &mut self.record_state);
    }
}

fn draw_board(board: &BoardData, frame: &mut Frame, area: Rect) {
    if board.buckets.is_empty() {
        frame.render_widget(
            Paragraph::new("No buckets to show").block(Block::default().borders(Borders::ALL)),
            area,
        );
        return;
    }
    let nbuckets = board.buckets.len() as u32;
    let areas = Layout::horizontal(board.buckets.iter().map(|_| Constraint::Ratio(1, nbuckets)))
        .split(area);

    for (idx, (bucket, bucket_area)) in board.buckets.iter().zip(areas.iter()).enumerate() {
        let selected = idx == board.selected_bucket;
        let border_style = match (selected, board.dragging.is_some()) {
            (true, true) => Style::default().fg(Color::Magenta),
            (true, false) => Style::default().fg(Color::Yellow),
            _ => Style::default(),
        };
        let mut title = format!(" {} ({}) ", bucket.label, bucket.cards.len());
        if selected && board.updating {
            title.push_str("… ");
        }
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(title);

        let items: Vec<ListItem> = bucket
            .cards
            .iter()
            .map(|card| card_item(card, board.dragging.as_deref() == Some(card.id.as_str())))
            .collect();
        let list = List::new(items)
            .block(block)
            .highlight_style(Style::default().bg(Color::DarkGray));
        let mut state = ListState::default();
        if selected && !bucket.cards.is_empty() {
            state.select(Some(board.selected_card));
        }
        frame.render_stateful_widget(list, *bucket_area, &mut state);
    }
}

fn card_item(card: &CardView, dragged: bool) -> ListItem<'static> {
    let name_style = if dragged {
        Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD)
    } else {
        Style::default().add_modifier(Modifier::BOLD)
    };
    ListItem::new(vec![
        Line::from(Span::styled(card.name.clone(), name_style)),
        Line::from(vec![
            Span::styled(card.priority_label.clone(), priority_style(card.priority_class)),
            Span::raw(" · "),
            Span::raw(card.assignee.clone()),
        ]),
        Line::from(Span::styled(card.feature.clone(), Style::default().fg(Color::DarkGray))),
        Line::from(""),
    ])
}

fn priority_style(class: &str) -> Style {
    match class {
        "badge-error" => Style::default().fg(Color::Red),
        "badge-warning" => Style::default().fg(Color::Yellow),
        "badge" => Style::default().fg(Color::Cyan),
        _ => Style::default().fg(Color::DarkGray),
    }
}

fn draw_pager(table: &TableData, frame: &mut Frame, area: Rect) {
    let mut spans = vec![Span::raw(" « ")];
    for item in table.page_items.iter() {
        match item {
            PageItem::Page { current: true, .. } => spans.push(Span::styled(
                format!("[{}]", item.label()),
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            )),
            _ => spans.push(Span::raw(format!(" {} ", item.label()))),
        }
    }
    spans.push(Span::raw(" »  "));
    spans.push(Span::styled(
        table.page_info.clone(),
        Style::default().fg(Color::DarkGray),
    ));
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_cmdline(uidata: &UIData, frame: &mut Frame, area: Rect) {
    if uidata.active_cmdinput {
        let prefix = match uidata.cmd_mode {
            Some(CMDMode::Filter) => "/",
            Some(CMDMode::GoToPage) => ":",
            _ => "!",
        };
        frame.render_widget(
            Paragraph::new(format!("{prefix}{}", uidata.cmdinput.input)),
            area,
        );
        let x = area.x + (prefix.len() + uidata.cmdinput.cursor_pos) as u16;
        frame.set_cursor_position((x.min(area.right().saturating_sub(1)), area.y));
        return;
    }
    let style = match uidata.status.severity {
        Severity::Success => Style::default().fg(Color::Green),
        Severity::Info => Style::default(),
        Severity::Warning => Style::default().fg(Color::Yellow),
        Severity::Error => Style::default().fg(Color::Red),
    };
    frame.render_widget(
        Paragraph::new(Span::styled(uidata.status.message.clone(), style)),
        area,
    );
}

fn draw_popup(message: &str, frame: &mut Frame, area: Rect) {
    let width = (area.width * 60 / 100).clamp(40, 80).min(area.width);
    let height = (message.lines().count() as u16 + 2).min(area.height);
    let popup = Rect::new(
        area.x + area.width.saturating_sub(width) / 2,
        area.y + area.height.saturating_sub(height) / 2,
        width,
        height,
    );
    frame.render_widget(Clear, popup);
    frame.render_widget(
        Paragraph::new(message)
            .wrap(Wrap { trim: false })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Cyan))
                    .title(" Help "),
            ),
        popup,
    );
}

/// Cuts `s` to `width` chars, marking the cut with an ellipsis.
fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        return s.to_string();
    }
    let mut cut: String = s.chars().take(width.saturating_sub(1)).collect();
    cut.push('…');
    cut
}
