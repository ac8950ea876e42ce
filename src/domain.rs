use std::io::Error;
use std::path::PathBuf;

use derive_setters::Setters;
use ratatui::crossterm::event::KeyEvent;
use thiserror::Error as ThisError;

use crate::record::Column;

pub const DEFAULT_SOURCE_URL: &str = "https://randomuser.me/api/";
pub const DEFAULT_RESULTS: usize = 1000;
pub const DEFAULT_PAGE_SIZE: usize = 40;

#[derive(Debug, ThisError)]
pub enum TVError {
    #[error("io error: {0}")]
    IoError(#[from] Error),
    #[error("request failed: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("malformed payload: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("file not found")]
    FileNotFound,
    #[error("permission denied")]
    PermissionDenied,
    #[error("column {0} is already being resized")]
    ResizeInProgress(Column),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Which text field the command line is currently editing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CMDMode {
    FilterName,
    FilterEmail,
    JumpToPage,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Quit,
    Help,
    Enter,
    Exit,
    Reload,
    ToggleDarkMode,
    CopyRow,
    Resize(usize, usize),
    RawKey(KeyEvent),

    // Row cursor inside the current page
    MoveUp,
    MoveDown,
    MovePageUp,
    MovePageDown,
    MoveLeft,
    MoveRight,
    SelectRow(usize),

    // Pagination
    NextPage,
    PrevPage,
    FirstPage,
    LastPage,
    GoToPage(usize),
    JumpToPage,

    // Sorting and filtering
    SortColumn(Column),
    SortSelected,
    FilterName,
    FilterEmail,

    // Column order
    MoveColumnLeft,
    MoveColumnRight,
    BeginDrag(usize),
    DragEnter(usize),
    EndDrag,

    // Column widths
    BeginResize(Column, u16),
    ResizeTo(u16),
    EndResize,
    WidenColumn,
    NarrowColumn,

    /// Drop any running pointer gesture without applying it.
    CancelGestures,
}

pub const HELP_TEXT: &str = "\
Pages
  n / →        next page            p / ←        previous page
  Home / End   first / last page    :            jump to page
Rows
  j / ↓        next row             k / ↑        previous row
  PgDn / PgUp  scroll               Enter        record details
Columns
  h / l        select column        s            sort selected column
  [ / ]        move column          < / >        narrow / widen column
  mouse        click header to sort, drag header to reorder,
               drag the right edge of a header to resize
Filters
  /            filter by name       @            filter by email
  Enter        keep filter          Esc          clear filter
Other
  d            toggle dark mode     r            reload data
  y            copy row as csv      ?            help
  q            quit";

#[derive(Debug, Clone, Setters)]
#[setters(prefix = "with_")]
pub struct TVConfig {
    pub event_poll_time: u64,
    pub source_url: String,
    pub results: usize,
    #[setters(strip_option)]
    pub fixture: Option<PathBuf>,
    pub page_size: usize,
    #[setters(strip_option)]
    pub timeout_secs: Option<u64>,
    pub refetch_on_page_change: bool,
    pub dark_mode: bool,
    pub compact_pagination_below: usize,
}

impl Default for TVConfig {
    fn default() -> Self {
        Self {
            event_poll_time: 100,
            source_url: DEFAULT_SOURCE_URL.to_string(),
            results: DEFAULT_RESULTS,
            fixture: None,
            page_size: DEFAULT_PAGE_SIZE,
            timeout_secs: None,
            refetch_on_page_change: true,
            dark_mode: false,
            compact_pagination_below: 110,
        }
    }
}

impl TVConfig {
    pub fn validate(&self) -> Result<(), TVError> {
        if self.page_size == 0 {
            return Err(TVError::InvalidConfig("page size must be at least 1".into()));
        }
        if self.results == 0 {
            return Err(TVError::InvalidConfig("results must be at least 1".into()));
        }
        Ok(())
    }
}
