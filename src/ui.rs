use ratatui::{
    Frame,
    layout::{Constraint, Flex, Layout, Margin, Position, Rect},
    style::{Color, Modifier, Style, Stylize},
    symbols::border,
    text::{Line, Span, Text},
    widgets::{
        Block, Cell, Clear, Paragraph, Row, Scrollbar, ScrollbarOrientation, ScrollbarState,
        Table, TableState as RowSelection, Wrap,
    },
};

use std::time::{Duration, Instant};

use crate::domain::{CMDMode, HELP_TEXT};
use crate::layout::{self, COLUMN_SPACING, PageTarget, UILayout};
use crate::model::{Model, Popup};
use crate::record::{Column, DataClass, Record};
use crate::table::{FilterField, TableState};

/// Placeholder rows drawn while a fetch is running.
pub const SKELETON_ROWS: usize = 5;
/// Status messages are dimmed once they are older than this.
const STATUS_FADE: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy)]
struct Theme {
    bg: Color,
    fg: Color,
    accent: Color,
    muted: Color,
    border: Color,
    header_bg: Color,
    header_fg: Color,
    selected_bg: Color,
    column_bg: Color,
    error: Color,
}

impl Theme {
    fn light() -> Self {
        Theme {
            bg: Color::White,
            fg: Color::Black,
            accent: Color::Red,
            muted: Color::Gray,
            border: Color::Black,
            header_bg: Color::Blue,
            header_fg: Color::White,
            selected_bg: Color::LightBlue,
            column_bg: Color::Rgb(232, 238, 250),
            error: Color::Red,
        }
    }

    fn dark() -> Self {
        Theme {
            bg: Color::Black,
            fg: Color::White,
            accent: Color::Yellow,
            muted: Color::DarkGray,
            border: Color::White,
            header_bg: Color::Blue,
            header_fg: Color::White,
            selected_bg: Color::DarkGray,
            column_bg: Color::Rgb(28, 32, 44),
            error: Color::LightRed,
        }
    }

    fn base(&self) -> Style {
        Style::new().fg(self.fg).bg(self.bg)
    }
}

#[derive(Debug, Default)]
pub struct TableUI {}

impl TableUI {
    pub fn new() -> Self {
        Self {}
    }

    pub fn draw(&mut self, model: &Model, frame: &mut Frame) {
        let theme = if model.dark_mode() {
            Theme::dark()
        } else {
            Theme::light()
        };
        let ui = model.layout();

        frame.render_widget(Block::new().style(theme.base()), frame.area());
        self.draw_title(model, &theme, ui.title, frame);
        self.draw_filter(model, &theme, FilterField::Name, ui.name_filter, frame);
        self.draw_filter(model, &theme, FilterField::Email, ui.email_filter, frame);
        self.draw_table(model, &theme, ui, frame);
        self.draw_pagination(model, &theme, ui.pagination, frame);
        self.draw_statusline(model, &theme, ui.statusline, frame);

        match model.popup() {
            Some(Popup::Help) => self.draw_popup(" Help ", Text::from(HELP_TEXT), &theme, frame),
            Some(Popup::Record(_)) => {
                if let Some(record) = model.popup_record() {
                    let text = Self::record_text(record, &theme);
                    self.draw_popup(" Record ", text, &theme, frame)
                }
            }
            None => {}
        }
    }

    fn draw_title(&self, model: &Model, theme: &Theme, area: Rect, frame: &mut Frame) {
        let title = Line::from(" User table ".bold().fg(theme.accent));
        let mut indicators = Vec::new();
        if model.loading() {
            indicators.push(Span::from("Loading … ").fg(theme.accent));
        }
        indicators.push(if model.dark_mode() {
            Span::from("☾ dark ")
        } else {
            Span::from("☀ light ")
        });
        let [left, right] =
            Layout::horizontal([Constraint::Fill(1), Constraint::Length(20)]).areas(area);
        frame.render_widget(Paragraph::new(title), left);
        frame.render_widget(Paragraph::new(Line::from(indicators).right_aligned()), right);
    }

    fn draw_filter(
        &self,
        model: &Model,
        theme: &Theme,
        field: FilterField,
        area: Rect,
        frame: &mut Frame,
    ) {
        let (label, mode) = match field {
            FilterField::Name => (" Name / ", CMDMode::FilterName),
            FilterField::Email => (" Email @ ", CMDMode::FilterEmail),
        };
        let editing = model.cmd_mode() == Some(mode);
        let state = model.table().filter_state(field);

        let mut block = Block::bordered()
            .title(Line::from(label))
            .border_style(Style::new().fg(if editing { theme.accent } else { theme.border }));
        if state.no_match {
            block = block.title_bottom(
                Line::from(" No records found ".fg(theme.error).bold()).right_aligned(),
            );
        }

        let text = if editing {
            model.cmd_input().input.clone()
        } else {
            state.query.clone()
        };
        let inner = block.inner(area);
        frame.render_widget(Paragraph::new(text).block(block), area);

        if editing {
            let x = inner.x + model.cmd_input().cursor_pos as u16;
            frame.set_cursor_position(Position::new(x.min(inner.right().saturating_sub(1)), inner.y));
        }
    }

    fn sort_icon(class: DataClass, direction: Option<bool>) -> &'static str {
        match (class, direction) {
            (_, None) => "⇅",
            (DataClass::Numeric, Some(true)) => "0-9",
            (DataClass::Numeric, Some(false)) => "9-0",
            (DataClass::Textual, Some(true)) => "A-Z",
            (DataClass::Textual, Some(false)) => "Z-A",
            (DataClass::Temporal, Some(true)) => "↑",
            (DataClass::Temporal, Some(false)) => "↓",
        }
    }

    fn header_row<'a>(model: &Model, table: &TableState, theme: &Theme) -> Row<'a> {
        let sort = table.sort_state();
        let dragging = table.dragging().map(|g| g.index);
        let resizing = table.resizing().map(|r| r.column);

        let cells = table.column_order().iter().enumerate().map(|(idx, &column)| {
            let direction = (sort.column == Some(column)).then_some(sort.ascending);
            let mut label = format!(
                "{} {}",
                column.label(),
                Self::sort_icon(column.data_class(), direction)
            );
            if resizing == Some(column) {
                label = format!("{} {:.0}%", column.label(), table.column_width(column));
            }

            let mut style = Style::new().fg(theme.header_fg).bg(theme.header_bg).bold();
            if idx == model.selected_column() {
                style = style.add_modifier(Modifier::UNDERLINED);
            }
            if dragging == Some(idx) {
                style = style.add_modifier(Modifier::REVERSED);
            }
            Cell::from(label).style(style)
        });
        Row::new(cells).style(Style::new().bg(theme.header_bg))
    }

    fn data_row<'a>(model: &Model, record: &Record, order: &[Column], theme: &Theme) -> Row<'a> {
        let cells = order.iter().enumerate().map(|(idx, &column)| {
            let cell = Cell::from(record.cell(column));
            if idx == model.selected_column() {
                cell.style(Style::new().bg(theme.column_bg))
            } else {
                cell
            }
        });
        Row::new(cells)
    }

    fn skeleton_row<'a>(order: &[Column], theme: &Theme) -> Row<'a> {
        Row::new(order.iter().map(|_| Cell::from("░░░░░░".fg(theme.muted))))
    }

    fn draw_table(&self, model: &Model, theme: &Theme, ui: &UILayout, frame: &mut Frame) {
        let table = model.table();
        let title = Line::from(format!(
            " Page {}/{} · {} of {} records ",
            table.current_page(),
            table.max_page(),
            table.displayed_len(),
            table.dataset_len(),
        ));
        let instructions = Line::from(vec![
            " Sort ".into(),
            "<s>".fg(theme.accent).bold(),
            " Move ".into(),
            "<[ ]>".fg(theme.accent).bold(),
            " Width ".into(),
            "<< >>".fg(theme.accent).bold(),
            " Help ".into(),
            "<?> ".fg(theme.accent).bold(),
        ]);
        let block = Block::bordered()
            .title(title.centered())
            .title_bottom(instructions.centered())
            .border_set(border::ROUNDED)
            .border_style(Style::new().fg(theme.border));
        frame.render_widget(block, ui.table);

        let spans = layout::column_spans(table.column_order(), |c| table.column_width(c), ui.header);
        let widths: Vec<Constraint> = spans.iter().map(|s| Constraint::Length(s.width)).collect();
        let header = Self::header_row(model, table, theme);
        let order = table.column_order();

        if let Some(message) = model.source_error() {
            let widget = Table::new(Vec::<Row>::new(), widths.clone())
                .header(header)
                .column_spacing(COLUMN_SPACING)
                .flex(Flex::Start);
            frame.render_widget(widget, ui.table_inner);
            let error = Paragraph::new(message.to_string())
                .style(Style::new().fg(theme.error))
                .centered()
                .wrap(Wrap { trim: true });
            frame.render_widget(error, ui.body);
            return;
        }

        let (rows, selected): (Vec<Row>, Option<usize>) = if model.loading() {
            ((0..SKELETON_ROWS).map(|_| Self::skeleton_row(order, theme)).collect(), None)
        } else {
            let begin = model.offset_row();
            let rows = table
                .displayed_rows()
                .skip(begin)
                .take(ui.body_rows())
                .map(|r| Self::data_row(model, r, order, theme))
                .collect();
            (rows, model.selected_row().checked_sub(begin))
        };

        let widget = Table::new(rows, widths)
            .header(header)
            .column_spacing(COLUMN_SPACING)
            .flex(Flex::Start)
            .row_highlight_style(Style::new().bg(theme.selected_bg));
        let mut selection = RowSelection::default().with_selected(selected);
        frame.render_stateful_widget(widget, ui.table_inner, &mut selection);

        if !model.loading() && table.displayed_len() > ui.body_rows() {
            let mut scrollbar_state =
                ScrollbarState::new(table.displayed_len()).position(model.selected_row());
            frame.render_stateful_widget(
                Scrollbar::new(ScrollbarOrientation::VerticalRight),
                ui.table.inner(Margin::new(0, 1)),
                &mut scrollbar_state,
            );
        }
    }

    fn draw_pagination(&self, model: &Model, theme: &Theme, area: Rect, frame: &mut Frame) {
        let table = model.table();
        let strip = layout::pagination(
            table.current_page(),
            table.max_page(),
            area,
            model.config().compact_pagination_below,
        );
        for item in strip.items.iter() {
            let style = match item.target {
                Some(PageTarget::Page(p)) if p == table.current_page() => {
                    Style::new().fg(theme.header_fg).bg(theme.header_bg).bold()
                }
                Some(PageTarget::Prev) if table.current_page() <= 1 => {
                    Style::new().fg(theme.muted)
                }
                Some(PageTarget::Next) if table.current_page() >= table.max_page() => {
                    Style::new().fg(theme.muted)
                }
                None => Style::new().bold(),
                _ => Style::new(),
            };
            let rect = Rect::new(item.x, area.y, item.width, 1);
            frame.render_widget(Paragraph::new(item.label.clone()).style(style), rect);
        }
    }

    fn draw_statusline(&self, model: &Model, theme: &Theme, area: Rect, frame: &mut Frame) {
        if model.cmd_mode() == Some(CMDMode::JumpToPage) {
            let input = model.cmd_input();
            let line = Line::from(vec![
                "Go to page: ".fg(theme.accent).bold(),
                Span::from(input.input.clone()),
            ]);
            frame.render_widget(Paragraph::new(line), area);
            let x = area.x + 12 + input.cursor_pos as u16;
            frame.set_cursor_position(Position::new(x.min(area.right().saturating_sub(1)), area.y));
            return;
        }

        let [left, right] =
            Layout::horizontal([Constraint::Fill(1), Constraint::Length(12)]).areas(area);
        let color = if status_is_fresh(model.last_status_message_update(), Instant::now()) {
            theme.fg
        } else {
            theme.muted
        };
        frame.render_widget(
            Paragraph::new(model.status_message().to_string()).style(Style::new().fg(color)),
            left,
        );
        frame.render_widget(
            Paragraph::new(Line::from(vec!["? ".fg(theme.accent).bold(), "help ".into()]).right_aligned()),
            right,
        );
    }

    fn record_text<'a>(record: &Record, theme: &Theme) -> Text<'a> {
        let field = |name: &str, value: String| {
            Line::from(vec![
                Span::from(format!("{name:>10}  ")).fg(theme.accent).bold(),
                Span::from(value),
            ])
        };
        Text::from(vec![
            field("ID", record.id.clone()),
            field("Name", record.name.clone()),
            field("Age", record.age.to_string()),
            field("Gender", record.gender.clone()),
            field("Email", record.email.clone()),
            field("Born", record.date.clone()),
            field(
                "Picture",
                record.thumbnail.clone().unwrap_or_else(|| "∅".to_string()),
            ),
            Line::from(""),
            Line::from("←/→ previous/next record, y copy, Esc close".fg(theme.muted)),
        ])
    }

    fn draw_popup(&self, title: &str, text: Text, theme: &Theme, frame: &mut Frame) {
        let area = popup_area(frame.area(), 70, 70);
        let block = Block::bordered()
            .title(Line::from(title.to_string()).centered())
            .border_set(border::THICK)
            .style(theme.base());
        frame.render_widget(Clear, area);
        frame.render_widget(
            Paragraph::new(text).block(block).wrap(Wrap { trim: false }),
            area,
        );
    }
}

fn status_is_fresh(updated: Instant, now: Instant) -> bool {
    now.saturating_duration_since(updated) <= STATUS_FADE
}

fn popup_area(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let [area] = Layout::vertical([Constraint::Percentage(percent_y)])
        .flex(Flex::Center)
        .areas(area);
    let [area] = Layout::horizontal([Constraint::Percentage(percent_x)])
        .flex(Flex::Center)
        .areas(area);
    area
}
