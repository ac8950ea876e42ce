use std::collections::HashMap;

use tracing::trace;

use crate::domain::TVError;
use crate::record::{Column, MIN_COLUMN_WIDTH, Record};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FilterField {
    Name,
    Email,
}

impl FilterField {
    fn value<'a>(&self, record: &'a Record) -> &'a str {
        match self {
            FilterField::Name => &record.name,
            FilterField::Email => &record.email,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct FilterState {
    pub query: String,
    pub no_match: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FilterOutcome {
    /// Empty query, the unfiltered page slice is back.
    Restored,
    Narrowed(usize),
    NoMatch,
}

/// The direction flag is shared by all columns and flips on every sort.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct SortState {
    pub column: Option<Column>,
    pub ascending: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResizeCapture {
    pub column: Column,
    pub start_x: u16,
    pub start_width: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragGesture {
    pub index: usize,
    pub moved: bool,
}

/// View state of one table: pagination, sorting, filters, column order and widths.
///
/// `rows` maps displayed rows to indices into the dataset. It always starts
/// out as the current page slice; filters and sorting rework it in place
/// until the next page change or dataset replacement.
#[derive(Debug)]
pub struct TableState {
    dataset: Vec<Record>,
    rows: Vec<usize>,
    page_size: usize,
    current_page: usize,
    column_order: Vec<Column>,
    column_widths: HashMap<Column, f64>,
    sort: SortState,
    name_filter: FilterState,
    email_filter: FilterState,
    resizing: Option<ResizeCapture>,
    dragging: Option<DragGesture>,
}

impl TableState {
    pub fn new(page_size: usize) -> Self {
        Self {
            dataset: Vec::new(),
            rows: Vec::new(),
            page_size: page_size.max(1),
            current_page: 1,
            column_order: Column::ALL.to_vec(),
            column_widths: Column::ALL
                .iter()
                .map(|c| (*c, c.default_width()))
                .collect(),
            sort: SortState::default(),
            name_filter: FilterState::default(),
            email_filter: FilterState::default(),
            resizing: None,
            dragging: None,
        }
    }

    // -------------------- Dataset and pagination ---------------------- //

    /// Replace the dataset wholesale and rebuild the current page.
    pub fn set_dataset(&mut self, records: Vec<Record>) {
        self.dataset = records;
        self.current_page = self.current_page.clamp(1, self.max_page());
        self.reslice();
    }

    pub fn dataset_len(&self) -> usize {
        self.dataset.len()
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn max_page(&self) -> usize {
        self.dataset.len().div_ceil(self.page_size).max(1)
    }

    /// Jump to page `n`, clamped into the valid range. Returns true if the page changed.
    pub fn go_to_page(&mut self, n: usize) -> bool {
        let page = n.clamp(1, self.max_page());
        let changed = page != self.current_page;
        self.current_page = page;
        self.reslice();
        changed
    }

    pub fn next_page(&mut self) -> bool {
        if self.current_page >= self.max_page() {
            return false;
        }
        self.go_to_page(self.current_page + 1)
    }

    pub fn prev_page(&mut self) -> bool {
        if self.current_page <= 1 {
            return false;
        }
        self.go_to_page(self.current_page - 1)
    }

    /// Drop filters and sorting and show the plain slice of the current page.
    pub fn restore_page(&mut self) {
        self.reslice();
    }

    fn reslice(&mut self) {
        let begin = (self.current_page - 1) * self.page_size;
        let end = std::cmp::min(begin + self.page_size, self.dataset.len());
        self.rows = (begin.min(end)..end).collect();
        self.sort.column = None;
        self.name_filter = FilterState::default();
        self.email_filter = FilterState::default();
        trace!(
            "Page {}/{}: rows {}..{}",
            self.current_page,
            self.max_page(),
            begin,
            end
        );
    }

    pub fn displayed_rows(&self) -> impl Iterator<Item = &Record> {
        self.rows.iter().map(|&idx| &self.dataset[idx])
    }

    pub fn displayed_len(&self) -> usize {
        self.rows.len()
    }

    pub fn row(&self, idx: usize) -> Option<&Record> {
        self.rows.get(idx).map(|&ridx| &self.dataset[ridx])
    }

    // -------------------- Sorting ---------------------- //

    pub fn sort_state(&self) -> SortState {
        self.sort
    }

    /// Flip the global direction and sort the displayed rows by `column`.
    pub fn toggle_sort(&mut self, column: Column) {
        self.sort.ascending = !self.sort.ascending;
        self.sort.column = Some(column);

        let data = &self.dataset;
        let ascending = self.sort.ascending;
        self.rows.sort_by(|&a, &b| {
            let ord = column.compare(&data[a], &data[b]);
            if ascending { ord } else { ord.reverse() }
        });
        trace!(
            "Sorted {} rows by {} ({})",
            self.rows.len(),
            column,
            if ascending { "asc" } else { "desc" }
        );
    }

    // -------------------- Filtering ---------------------- //

    pub fn filter_state(&self, field: FilterField) -> &FilterState {
        match field {
            FilterField::Name => &self.name_filter,
            FilterField::Email => &self.email_filter,
        }
    }

    fn filter_state_mut(&mut self, field: FilterField) -> &mut FilterState {
        match field {
            FilterField::Name => &mut self.name_filter,
            FilterField::Email => &mut self.email_filter,
        }
    }

    pub fn filter_by_name(&mut self, query: &str) -> FilterOutcome {
        self.filter(FilterField::Name, query)
    }

    pub fn filter_by_email(&mut self, query: &str) -> FilterOutcome {
        self.filter(FilterField::Email, query)
    }

    /// Narrow the displayed rows by a case-insensitive substring match.
    /// A query without matches keeps the current rows and raises the no-match flag.
    pub fn filter(&mut self, field: FilterField, query: &str) -> FilterOutcome {
        if query.is_empty() {
            self.reslice();
            return FilterOutcome::Restored;
        }

        let needle = query.to_lowercase();
        let matches: Vec<usize> = self
            .rows
            .iter()
            .copied()
            .filter(|&idx| {
                field
                    .value(&self.dataset[idx])
                    .to_lowercase()
                    .contains(&needle)
            })
            .collect();

        let state = self.filter_state_mut(field);
        state.query = query.to_string();
        if matches.is_empty() {
            state.no_match = true;
            trace!("Filter {:?} \"{}\" found no matches", field, query);
            FilterOutcome::NoMatch
        } else {
            state.no_match = false;
            let n = matches.len();
            self.rows = matches;
            FilterOutcome::Narrowed(n)
        }
    }

    // -------------------- Column order ---------------------- //

    pub fn column_order(&self) -> &[Column] {
        &self.column_order
    }

    /// Move the column at `from` to position `to`. Out of range indices are ignored.
    pub fn move_column(&mut self, from: usize, to: usize) -> bool {
        let n = self.column_order.len();
        if from >= n || to >= n || from == to {
            return false;
        }
        let column = self.column_order.remove(from);
        self.column_order.insert(to, column);
        trace!("Moved column {} from {} to {}", column, from, to);
        true
    }

    pub fn dragging(&self) -> Option<DragGesture> {
        self.dragging
    }

    pub fn begin_drag(&mut self, index: usize) {
        if index < self.column_order.len() {
            self.dragging = Some(DragGesture {
                index,
                moved: false,
            });
        }
    }

    /// The dragged column entered the header cell at `index`.
    pub fn drag_enter(&mut self, index: usize) -> bool {
        let Some(gesture) = self.dragging else {
            return false;
        };
        if !self.move_column(gesture.index, index) {
            return false;
        }
        self.dragging = Some(DragGesture { index, moved: true });
        true
    }

    pub fn end_drag(&mut self) -> Option<DragGesture> {
        self.dragging.take()
    }

    // -------------------- Column widths ---------------------- //

    pub fn column_width(&self, column: Column) -> f64 {
        self.column_widths
            .get(&column)
            .copied()
            .unwrap_or_else(|| column.default_width())
    }

    pub fn resizing(&self) -> Option<ResizeCapture> {
        self.resizing
    }

    pub fn begin_resize(&mut self, column: Column, x: u16) -> Result<(), TVError> {
        if let Some(active) = self.resizing {
            return Err(TVError::ResizeInProgress(active.column));
        }
        self.resizing = Some(ResizeCapture {
            column,
            start_x: x,
            start_width: self.column_width(column),
        });
        trace!("Begin resize of {} at x={}", column, x);
        Ok(())
    }

    /// Follow the pointer while resizing. Returns the new width of the captured column.
    pub fn resize_to(&mut self, x: u16, viewport_width: usize) -> Option<f64> {
        let capture = self.resizing?;
        if viewport_width == 0 {
            return None;
        }
        let delta = (x as f64 - capture.start_x as f64) / viewport_width as f64 * 100.0;
        let width = (capture.start_width + delta).max(MIN_COLUMN_WIDTH);
        self.column_widths.insert(capture.column, width);
        Some(width)
    }

    pub fn end_resize(&mut self) -> Option<Column> {
        let capture = self.resizing.take()?;
        trace!(
            "End resize of {} at {:.1}%",
            capture.column,
            self.column_width(capture.column)
        );
        Some(capture.column)
    }

    /// Change the width of `column` by `delta` percent points.
    pub fn resize_by(&mut self, column: Column, delta: f64) -> f64 {
        let width = (self.column_width(column) + delta).max(MIN_COLUMN_WIDTH);
        self.column_widths.insert(column, width);
        width
    }
}
