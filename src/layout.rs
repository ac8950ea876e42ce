//! Screen geometry shared by the renderer and the mouse hit-testing in the controller.
//!
//! Everything here is derived from the terminal size and the table state only,
//! so both sides agree on where each header cell and page button lives.

use ratatui::layout::{Constraint, Layout, Margin, Rect};
use tracing::trace;

use crate::record::Column;

pub const TITLE_HEIGHT: u16 = 1;
pub const FILTER_HEIGHT: u16 = 3;
pub const PAGINATION_HEIGHT: u16 = 1;
pub const CMDLINE_HEIGH: u16 = 1;
pub const TABLE_HEADER_HEIGHT: u16 = 1;
pub const COLUMN_SPACING: u16 = 1;

#[derive(Default, Clone, Debug, PartialEq)]
pub struct UILayout {
    pub width: u16,
    pub height: u16,
    pub title: Rect,
    pub name_filter: Rect,
    pub email_filter: Rect,
    pub table: Rect,
    pub table_inner: Rect,
    pub header: Rect,
    pub body: Rect,
    pub pagination: Rect,
    pub statusline: Rect,
}

impl UILayout {
    pub fn from_values(width: u16, height: u16) -> Self {
        let area = Rect::new(0, 0, width, height);
        let [title, filters, table, pagination, statusline] = Layout::vertical([
            Constraint::Length(TITLE_HEIGHT),
            Constraint::Length(FILTER_HEIGHT),
            Constraint::Min(0),
            Constraint::Length(PAGINATION_HEIGHT),
            Constraint::Length(CMDLINE_HEIGH),
        ])
        .areas(area);
        let [name_filter, email_filter] =
            Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)])
                .areas(filters);

        let table_inner = table.inner(Margin::new(1, 1));
        let header_height = TABLE_HEADER_HEIGHT.min(table_inner.height);
        let header = Rect::new(table_inner.x, table_inner.y, table_inner.width, header_height);
        let body = Rect::new(
            table_inner.x,
            table_inner.y + header_height,
            table_inner.width,
            table_inner.height - header_height,
        );

        let layout = UILayout {
            width,
            height,
            title,
            name_filter,
            email_filter,
            table,
            table_inner,
            header,
            body,
            pagination,
            statusline,
        };
        trace!("Build UILayout: {:?}", layout);
        layout
    }

    pub fn body_rows(&self) -> usize {
        self.body.height as usize
    }
}

pub fn contains(area: Rect, x: u16, y: u16) -> bool {
    x >= area.x && x < area.right() && y >= area.y && y < area.bottom()
}

// -------------------- Header ---------------------- //

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnSpan {
    pub index: usize,
    pub column: Column,
    pub x: u16,
    pub width: u16,
}

impl ColumnSpan {
    pub fn right(&self) -> u16 {
        self.x + self.width
    }
}

/// Convert percentage widths into terminal cells, left to right.
/// Columns that no longer fit are clipped, down to zero cells.
pub fn column_spans(order: &[Column], width_of: impl Fn(Column) -> f64, area: Rect) -> Vec<ColumnSpan> {
    let mut spans = Vec::with_capacity(order.len());
    let mut x = area.x;
    for (index, &column) in order.iter().enumerate() {
        let wanted = (width_of(column) * area.width as f64 / 100.0).round().max(1.0) as u16;
        let width = if x >= area.right() {
            0
        } else {
            wanted.min(area.right() - x)
        };
        spans.push(ColumnSpan {
            index,
            column,
            x,
            width,
        });
        x = x.saturating_add(width).saturating_add(COLUMN_SPACING);
    }
    spans
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HeaderHit {
    Cell(usize),
    /// The resize handle on the right edge of a header cell.
    Edge(usize),
}

pub fn header_hit(spans: &[ColumnSpan], x: u16) -> Option<HeaderHit> {
    for span in spans.iter().filter(|s| s.width > 0) {
        let on_handle = x == span.right() || (span.width > 2 && x + 1 == span.right());
        if on_handle {
            return Some(HeaderHit::Edge(span.index));
        }
        if x >= span.x && x < span.right() {
            return Some(HeaderHit::Cell(span.index));
        }
    }
    None
}

// -------------------- Pagination strip ---------------------- //

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PageTarget {
    Prev,
    Next,
    Page(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PaginationItem {
    pub target: Option<PageTarget>,
    pub label: String,
    pub x: u16,
    pub width: u16,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Pagination {
    pub compact: bool,
    pub items: Vec<PaginationItem>,
}

impl Pagination {
    pub fn hit(&self, x: u16) -> Option<PageTarget> {
        self.items
            .iter()
            .find(|item| x >= item.x && x < item.x + item.width)
            .and_then(|item| item.target)
    }
}

const PREV_LABEL: &str = "◀ Prev";
const NEXT_LABEL: &str = "Next ▶";

/// One button per page, or a compact `current/total` indicator when the
/// strip is narrower than `compact_below` or the buttons would not fit.
pub fn pagination(current: usize, max_page: usize, area: Rect, compact_below: usize) -> Pagination {
    let buttons: Vec<(Option<PageTarget>, String)> =
        (1..=max_page).map(|p| (Some(PageTarget::Page(p)), format!(" {p} "))).collect();
    let full_width: usize = buttons.iter().map(|(_, l)| l.chars().count() + 1).sum::<usize>()
        + PREV_LABEL.chars().count()
        + NEXT_LABEL.chars().count()
        + 3;
    let compact = (area.width as usize) < compact_below || full_width > area.width as usize;

    let mut labels = vec![(Some(PageTarget::Prev), PREV_LABEL.to_string())];
    if compact {
        labels.push((None, format!(" {current}/{max_page} ")));
    } else {
        labels.extend(buttons);
    }
    labels.push((Some(PageTarget::Next), NEXT_LABEL.to_string()));

    let mut x = area.x + 1;
    let mut items = Vec::with_capacity(labels.len());
    for (target, label) in labels {
        let width = label.chars().count() as u16;
        if x + width > area.right() {
            break;
        }
        items.push(PaginationItem {
            target,
            label,
            x,
            width,
        });
        x += width + 1;
    }
    Pagination { compact, items }
}
