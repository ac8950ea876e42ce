use arboard::Clipboard;
use ratatui::crossterm::event::KeyEvent;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, trace};

use crate::domain::{CMDMode, Message, TVConfig, TVError};
use crate::inputter::{InputResult, Inputter};
use crate::layout::UILayout;
use crate::record::{Column, Record};
use crate::source::{DataSource, FetchResult, Fetcher, SourceResponse};
use crate::table::{FilterField, FilterOutcome, TableState};

/// Percent points a column grows or shrinks per key press.
pub const RESIZE_STEP: f64 = 2.5;

#[derive(Debug, PartialEq)]
pub enum Status {
    READY,
    QUITTING,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Modus {
    TABLE,
    POPUP,
    CMDINPUT,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Popup {
    Help,
    /// Details of the displayed row with this index.
    Record(usize),
}

pub struct Model {
    config: TVConfig,
    pub status: Status,
    modus: Modus,
    previous_modus: Modus,
    table: TableState,
    fetcher: Fetcher,
    source_error: Option<String>,
    uilayout: UILayout,
    input: Inputter,
    cmd_mode: Option<CMDMode>,
    last_input: InputResult,
    popup: Option<Popup>,
    dark_mode: bool,
    curser_row: usize,
    offset_row: usize,
    curser_column: usize,
    clipboard: Option<Clipboard>,
    status_message: String,
    last_status_message_update: Instant,
}

impl Model {
    pub fn init(
        config: &TVConfig,
        source: Arc<dyn DataSource>,
        ui_width: u16,
        ui_height: u16,
    ) -> Result<Self, TVError> {
        config.validate()?;
        let mut model = Self {
            config: config.clone(),
            status: Status::READY,
            modus: Modus::TABLE,
            previous_modus: Modus::TABLE,
            table: TableState::new(config.page_size),
            fetcher: Fetcher::new(source),
            source_error: None,
            uilayout: UILayout::from_values(ui_width, ui_height),
            input: Inputter::default(),
            cmd_mode: None,
            last_input: InputResult::default(),
            popup: None,
            dark_mode: config.dark_mode,
            curser_row: 0,
            offset_row: 0,
            curser_column: 0,
            clipboard: None,
            status_message: "Started usertable!".to_string(),
            last_status_message_update: Instant::now(),
        };
        model.fetcher.request()?;
        model.set_status_message(format!("Loading {} ...", model.fetcher.source().describe()));
        Ok(model)
    }

    // -------------------- Accessors used by ui and controller ---------------------- //

    pub fn table(&self) -> &TableState {
        &self.table
    }

    pub fn layout(&self) -> &UILayout {
        &self.uilayout
    }

    pub fn config(&self) -> &TVConfig {
        &self.config
    }

    pub fn loading(&self) -> bool {
        self.fetcher.in_flight() > 0
    }

    pub fn source_error(&self) -> Option<&str> {
        self.source_error.as_deref()
    }

    pub fn dark_mode(&self) -> bool {
        self.dark_mode
    }

    pub fn popup(&self) -> Option<Popup> {
        self.popup
    }

    pub fn cmd_mode(&self) -> Option<CMDMode> {
        self.cmd_mode
    }

    pub fn cmd_input(&self) -> &InputResult {
        &self.last_input
    }

    pub fn selected_row(&self) -> usize {
        self.curser_row
    }

    pub fn offset_row(&self) -> usize {
        self.offset_row
    }

    pub fn selected_column(&self) -> usize {
        self.curser_column
    }

    pub fn status_message(&self) -> &str {
        &self.status_message
    }

    pub fn last_status_message_update(&self) -> Instant {
        self.last_status_message_update
    }

    /// While a text field is edited, keys go to the model unmapped.
    pub fn raw_keyevents(&self) -> bool {
        self.modus == Modus::CMDINPUT
    }

    pub fn quit(&mut self) {
        self.status = Status::QUITTING;
    }

    fn set_status_message(&mut self, message: impl Into<String>) {
        self.status_message = message.into();
        self.last_status_message_update = Instant::now();
    }

    // -------------------- Update ---------------------- //

    pub fn update(&mut self, message: Option<Message>) -> Result<(), TVError> {
        self.poll_fetches();

        if let Some(msg) = message {
            trace!("Update: Modus {:?}, Message {:?}", self.modus, msg);
            match self.modus {
                Modus::TABLE => match msg {
                    Message::Quit => self.quit(),
                    Message::Help => self.show_popup(Popup::Help),
                    Message::Enter => self.show_record(),
                    Message::Exit => self.clear_filters(),
                    Message::Reload => self.request_fetch(),
                    Message::ToggleDarkMode => self.dark_mode = !self.dark_mode,
                    Message::CopyRow => self.copy_row(),
                    Message::Resize(width, height) => self.ui_resize(width, height),
                    Message::MoveUp => self.move_selection_up(1),
                    Message::MoveDown => self.move_selection_down(1),
                    Message::MovePageUp => self.move_selection_up(self.uilayout.body_rows().max(1)),
                    Message::MovePageDown => {
                        self.move_selection_down(self.uilayout.body_rows().max(1))
                    }
                    Message::MoveLeft => self.curser_column = self.curser_column.saturating_sub(1),
                    Message::MoveRight => {
                        self.curser_column = (self.curser_column + 1).min(Column::ALL.len() - 1)
                    }
                    Message::SelectRow(row) => self.select_row(row),
                    Message::NextPage => self.change_page(|t| t.next_page()),
                    Message::PrevPage => self.change_page(|t| t.prev_page()),
                    Message::FirstPage => self.change_page(|t| t.go_to_page(1)),
                    Message::LastPage => self.change_page(|t| t.go_to_page(t.max_page())),
                    Message::GoToPage(n) => self.change_page(|t| t.go_to_page(n)),
                    Message::JumpToPage => self.enter_cmd_mode(CMDMode::JumpToPage),
                    Message::SortColumn(column) => self.table.toggle_sort(column),
                    Message::SortSelected => self.sort_selected_column(),
                    Message::FilterName => self.enter_cmd_mode(CMDMode::FilterName),
                    Message::FilterEmail => self.enter_cmd_mode(CMDMode::FilterEmail),
                    Message::MoveColumnLeft => self.move_selected_column(-1),
                    Message::MoveColumnRight => self.move_selected_column(1),
                    Message::BeginDrag(index) => self.table.begin_drag(index),
                    Message::DragEnter(index) => {
                        if self.table.drag_enter(index) {
                            self.curser_column = index;
                        }
                    }
                    Message::EndDrag => self.end_drag(),
                    Message::BeginResize(column, x) => {
                        if let Err(e) = self.table.begin_resize(column, x) {
                            debug!("Ignoring resize request: {e}");
                        }
                    }
                    Message::ResizeTo(x) => {
                        self.table
                            .resize_to(x, self.uilayout.table_inner.width as usize);
                    }
                    Message::EndResize => {
                        self.table.end_resize();
                    }
                    Message::WidenColumn => self.resize_selected_column(RESIZE_STEP),
                    Message::NarrowColumn => self.resize_selected_column(-RESIZE_STEP),
                    Message::CancelGestures => {
                        self.table.end_resize();
                        self.table.end_drag();
                    }
                    Message::RawKey(_) => (),
                },
                Modus::POPUP => match msg {
                    Message::Quit => self.quit(),
                    Message::Resize(width, height) => self.ui_resize(width, height),
                    Message::MoveLeft | Message::MoveUp => self.step_record(-1),
                    Message::MoveRight | Message::MoveDown => self.step_record(1),
                    Message::CopyRow => self.copy_row(),
                    Message::Exit | Message::Enter | Message::Help => self.close_popup(),
                    _ => (),
                },
                Modus::CMDINPUT => match msg {
                    Message::RawKey(key) => self.raw_input(key),
                    Message::Resize(width, height) => self.ui_resize(width, height),
                    Message::FilterName => self.enter_cmd_mode(CMDMode::FilterName),
                    Message::FilterEmail => self.enter_cmd_mode(CMDMode::FilterEmail),
                    _ => (),
                },
            }
        }
        Ok(())
    }

    // -------------------- Data acquisition ---------------------- //

    fn request_fetch(&mut self) {
        match self.fetcher.request() {
            Ok(request) => trace!("Issued fetch request #{request}"),
            Err(e) => {
                error!("Could not start fetch: {e}");
                self.set_status_message("Could not start loading, see log");
            }
        }
    }

    fn poll_fetches(&mut self) {
        while let Some(result) = self.fetcher.poll() {
            self.apply_fetch(result);
        }
    }

    // Responses are applied in arrival order, a slow earlier request can overwrite a later one.
    fn apply_fetch(&mut self, result: FetchResult) {
        match result.outcome {
            Ok(SourceResponse::Records(records)) => {
                let n = records.len();
                self.source_error = None;
                self.table.set_dataset(records);
                self.reapply_edited_filter();
                self.clamp_selection();
                self.set_status_message(format!(
                    "Loaded {n} records, page {}/{}",
                    self.table.current_page(),
                    self.table.max_page()
                ));
                info!("Applied request #{} with {n} records", result.request);
            }
            Ok(SourceResponse::Error(message)) => {
                info!("Applied request #{} with source error", result.request);
                self.source_error = Some(message);
                self.set_status_message("The data source reported an error");
            }
            Err(e) => {
                error!("Request #{} failed: {e}", result.request);
                self.set_status_message("Loading failed, press r to retry");
            }
        }
    }

    // -------------------- Pagination ---------------------- //

    fn change_page(&mut self, step: impl FnOnce(&mut TableState) -> bool) {
        if !step(&mut self.table) {
            return;
        }
        self.curser_row = 0;
        self.offset_row = 0;
        if self.config.refetch_on_page_change {
            self.request_fetch();
        }
        self.set_status_message(format!(
            "Page {}/{}",
            self.table.current_page(),
            self.table.max_page()
        ));
    }

    // -------------------- Sorting and filtering ---------------------- //

    fn selected_column_id(&self) -> Column {
        self.table.column_order()[self.curser_column]
    }

    fn sort_selected_column(&mut self) {
        let column = self.selected_column_id();
        self.table.toggle_sort(column);
    }

    fn apply_filter(&mut self, field: FilterField, query: &str) {
        let outcome = self.table.filter(field, query);
        trace!("Filter {:?} \"{}\" => {:?}", field, query, outcome);
        match outcome {
            FilterOutcome::Restored => {
                if self.fetcher.source().is_networked() && self.config.refetch_on_page_change {
                    self.request_fetch();
                }
            }
            FilterOutcome::Narrowed(n) => {
                self.set_status_message(format!("{n} matching records"));
            }
            FilterOutcome::NoMatch => {}
        }
        self.clamp_selection();
    }

    fn edited_filter(&self) -> Option<FilterField> {
        match self.cmd_mode {
            Some(CMDMode::FilterName) => Some(FilterField::Name),
            Some(CMDMode::FilterEmail) => Some(FilterField::Email),
            _ => None,
        }
    }

    // A new dataset resets all filters, the one still being typed has to follow the input box
    fn reapply_edited_filter(&mut self) {
        let Some(field) = self.edited_filter() else {
            return;
        };
        let query = self.last_input.input.clone();
        if !query.is_empty() {
            self.apply_filter(field, &query);
        }
    }

    fn clear_filters(&mut self) {
        let active = [FilterField::Name, FilterField::Email]
            .iter()
            .any(|&f| !self.table.filter_state(f).query.is_empty());
        if active {
            self.apply_filter(FilterField::Name, "");
        }
    }

    fn enter_cmd_mode(&mut self, mode: CMDMode) {
        trace!("Entering command mode {:?} ...", mode);
        if self.modus != Modus::CMDINPUT {
            self.previous_modus = self.modus;
        }
        self.modus = Modus::CMDINPUT;
        self.cmd_mode = Some(mode);

        match mode {
            CMDMode::FilterName => self.input.set(&self.table.filter_state(FilterField::Name).query),
            CMDMode::FilterEmail => {
                self.input.set(&self.table.filter_state(FilterField::Email).query)
            }
            CMDMode::JumpToPage => self.input.clear(),
        }
        self.last_input = self.input.get();
    }

    fn raw_input(&mut self, key: KeyEvent) {
        self.last_input = self.input.read(key);
        let input = self.last_input.input.clone();

        if self.last_input.changed {
            if let Some(field) = self.edited_filter() {
                self.apply_filter(field, &input);
            }
        }
        if self.last_input.finished {
            self.handle_cmd_input();
        }
    }

    fn handle_cmd_input(&mut self) {
        trace!("Handle cmd input {}", self.last_input.input);
        self.modus = self.previous_modus;
        self.previous_modus = Modus::CMDINPUT;

        if self.cmd_mode == Some(CMDMode::JumpToPage) && !self.last_input.canceled {
            match self.last_input.input.trim().parse::<usize>() {
                Ok(page) => self.change_page(|t| t.go_to_page(page)),
                Err(_) => self.set_status_message(format!(
                    "Not a page number: {}",
                    self.last_input.input
                )),
            }
        }
        self.cmd_mode = None;
    }

    // -------------------- Columns ---------------------- //

    fn move_selected_column(&mut self, step: isize) {
        let from = self.curser_column;
        let Some(to) = from.checked_add_signed(step) else {
            return;
        };
        if self.table.move_column(from, to) {
            self.curser_column = to;
        }
    }

    fn end_drag(&mut self) {
        if let Some(gesture) = self.table.end_drag() {
            self.curser_column = gesture.index;
            // A press and release on the same header is a click
            if !gesture.moved {
                let column = self.table.column_order()[gesture.index];
                self.table.toggle_sort(column);
            }
        }
    }

    fn resize_selected_column(&mut self, delta: f64) {
        let column = self.selected_column_id();
        let width = self.table.resize_by(column, delta);
        self.set_status_message(format!("{column} width {width:.1}%"));
    }

    // -------------------- Rows ---------------------- //

    fn clamp_selection(&mut self) {
        let n = self.table.displayed_len();
        self.curser_row = self.curser_row.min(n.saturating_sub(1));
        self.scroll_to_selection();
    }

    fn scroll_to_selection(&mut self) {
        let height = self.uilayout.body_rows().max(1);
        if self.curser_row < self.offset_row {
            self.offset_row = self.curser_row;
        } else if self.curser_row >= self.offset_row + height {
            self.offset_row = self.curser_row + 1 - height;
        }
    }

    fn select_row(&mut self, row: usize) {
        if row < self.table.displayed_len() {
            self.curser_row = row;
            self.scroll_to_selection();
        }
    }

    fn move_selection_up(&mut self, size: usize) {
        self.curser_row = self.curser_row.saturating_sub(size);
        self.scroll_to_selection();
    }

    fn move_selection_down(&mut self, size: usize) {
        let last = self.table.displayed_len().saturating_sub(1);
        self.curser_row = std::cmp::min(self.curser_row + size, last);
        self.scroll_to_selection();
    }

    fn ui_resize(&mut self, width: usize, height: usize) {
        trace!(
            "UI was resized! w:{}->{}, h:{}->{}",
            self.uilayout.width, width, self.uilayout.height, height
        );
        self.uilayout = UILayout::from_values(
            width.min(u16::MAX as usize) as u16,
            height.min(u16::MAX as usize) as u16,
        );
        self.scroll_to_selection();
    }

    // -------------------- Popups ---------------------- //

    fn show_popup(&mut self, popup: Popup) {
        self.previous_modus = self.modus;
        self.modus = Modus::POPUP;
        self.popup = Some(popup);
    }

    fn close_popup(&mut self) {
        trace!("Close popup ...");
        self.modus = Modus::TABLE;
        self.previous_modus = Modus::POPUP;
        self.popup = None;
    }

    fn show_record(&mut self) {
        if self.curser_row < self.table.displayed_len() {
            self.show_popup(Popup::Record(self.curser_row));
        }
    }

    fn step_record(&mut self, step: isize) {
        if let Some(Popup::Record(idx)) = self.popup {
            let last = self.table.displayed_len().saturating_sub(1);
            let next = idx.saturating_add_signed(step).min(last);
            self.popup = Some(Popup::Record(next));
            self.curser_row = next;
            self.scroll_to_selection();
        }
    }

    pub fn popup_record(&self) -> Option<&Record> {
        match self.popup {
            Some(Popup::Record(idx)) => self.table.row(idx),
            _ => None,
        }
    }

    fn copy_row(&mut self) {
        let row = match self.popup {
            Some(Popup::Record(idx)) => idx,
            _ => self.curser_row,
        };
        let Some(content) = self
            .table
            .row(row)
            .map(|r| r.as_csv(self.table.column_order()))
        else {
            return;
        };

        if self.clipboard.is_none() {
            match Clipboard::new() {
                Ok(clipboard) => self.clipboard = Some(clipboard),
                Err(e) => {
                    error!("Clipboard unavailable: {e:?}");
                    self.set_status_message("Clipboard unavailable");
                    return;
                }
            }
        }
        if let Some(clipboard) = self.clipboard.as_mut() {
            match clipboard.set_text(content) {
                Ok(_) => self.set_status_message("Copied row to clipboard"),
                Err(e) => error!("Error copying to clipboard: {e:?}"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::crossterm::event::{KeyCode, KeyModifiers};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct Synthetic {
        records: usize,
        fetches: AtomicUsize,
    }

    impl Synthetic {
        fn new(records: usize) -> Arc<Self> {
            Arc::new(Self {
                records,
                fetches: AtomicUsize::new(0),
            })
        }
    }

    impl DataSource for Synthetic {
        fn describe(&self) -> String {
            format!("{} synthetic users", self.records)
        }
        fn fetch(&self) -> Result<SourceResponse, TVError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            Ok(SourceResponse::Records(
                (0..self.records)
                    .map(|i| Record {
                        id: i.to_string(),
                        name: format!("Person {i}"),
                        age: (i % 60) as u32 + 20,
                        gender: "female".into(),
                        email: format!("p{i}@example.com"),
                        date: "1980-01-01T00:00:00.000Z".into(),
                        thumbnail: None,
                    })
                    .collect(),
            ))
        }
        fn is_networked(&self) -> bool {
            true
        }
    }

    struct Slow {
        inner: Arc<Synthetic>,
        delay: Duration,
    }

    impl DataSource for Slow {
        fn describe(&self) -> String {
            format!("slow {}", self.inner.describe())
        }
        fn fetch(&self) -> Result<SourceResponse, TVError> {
            std::thread::sleep(self.delay);
            self.inner.fetch()
        }
        fn is_networked(&self) -> bool {
            true
        }
    }

    struct Broken;

    impl DataSource for Broken {
        fn describe(&self) -> String {
            "broken".into()
        }
        fn fetch(&self) -> Result<SourceResponse, TVError> {
            Err(TVError::IoError(std::io::Error::other("connection reset")))
        }
        fn is_networked(&self) -> bool {
            true
        }
    }

    struct Refusing;

    impl DataSource for Refusing {
        fn describe(&self) -> String {
            "refusing".into()
        }
        fn fetch(&self) -> Result<SourceResponse, TVError> {
            Ok(SourceResponse::Error("Uh oh, something has gone wrong.".into()))
        }
        fn is_networked(&self) -> bool {
            true
        }
    }

    fn settle(model: &mut Model) {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            model.update(None).unwrap();
            if !model.loading() {
                break;
            }
            assert!(Instant::now() < deadline, "fetch did not finish");
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    fn model_with(source: Arc<dyn DataSource>) -> Model {
        let mut model = Model::init(&TVConfig::default(), source, 120, 40).unwrap();
        settle(&mut model);
        model
    }

    fn send(model: &mut Model, msg: Message) {
        model.update(Some(msg)).unwrap();
    }

    fn key(c: char) -> Message {
        Message::RawKey(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE))
    }

    #[test]
    fn loads_first_page() {
        let model = model_with(Synthetic::new(1000));
        assert!(!model.loading());
        assert_eq!(model.table().max_page(), 25);
        assert_eq!(model.table().displayed_len(), 40);
    }

    #[test]
    fn page_change_refetches_whole_dataset() {
        let source = Synthetic::new(1000);
        let mut model = model_with(source.clone());
        send(&mut model, Message::NextPage);
        assert!(model.loading());
        settle(&mut model);
        assert_eq!(source.fetches.load(Ordering::SeqCst), 2);
        assert_eq!(model.table().current_page(), 2);
        assert_eq!(model.table().row(0).unwrap().id, "40");

        send(&mut model, Message::PrevPage);
        settle(&mut model);
        send(&mut model, Message::PrevPage);
        assert!(!model.loading());
        assert_eq!(source.fetches.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn cached_dataset_skips_refetch() {
        let source = Synthetic::new(100);
        let config = TVConfig::default().with_refetch_on_page_change(false);
        let mut model = Model::init(&config, source.clone(), 120, 40).unwrap();
        settle(&mut model);
        send(&mut model, Message::LastPage);
        assert!(!model.loading());
        assert_eq!(model.table().displayed_len(), 20);
        assert_eq!(source.fetches.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn transport_failure_clears_loading() {
        let model = model_with(Arc::new(Broken));
        assert!(!model.loading());
        assert_eq!(model.source_error(), None);
        assert_eq!(model.table().displayed_len(), 0);
    }

    #[test]
    fn source_error_is_kept_for_display() {
        let model = model_with(Arc::new(Refusing));
        assert_eq!(model.source_error(), Some("Uh oh, something has gone wrong."));
    }

    #[test]
    fn typing_filters_live() {
        let mut model = model_with(Synthetic::new(100));
        send(&mut model, Message::FilterName);
        assert!(model.raw_keyevents());
        for c in "person 1".chars() {
            send(&mut model, key(c));
        }
        assert_eq!(model.table().displayed_len(), 11);
        send(&mut model, key('z'));
        assert!(model.table().filter_state(FilterField::Name).no_match);
        assert_eq!(model.table().displayed_len(), 11);

        send(
            &mut model,
            Message::RawKey(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE)),
        );
        assert!(!model.raw_keyevents());
        assert_eq!(model.table().filter_state(FilterField::Name).query, "person 1z");
    }

    #[test]
    fn refetch_keeps_filter_being_typed() {
        let source = Arc::new(Slow {
            inner: Synthetic::new(100),
            delay: Duration::from_millis(300),
        });
        let mut model = model_with(source);
        send(&mut model, Message::NextPage);
        assert!(model.loading());

        send(&mut model, Message::FilterName);
        for c in "person 4".chars() {
            send(&mut model, key(c));
        }
        assert_eq!(model.table().displayed_len(), 10);

        settle(&mut model);
        assert!(model.raw_keyevents());
        assert_eq!(model.cmd_input().input, "person 4");
        assert_eq!(model.table().filter_state(FilterField::Name).query, "person 4");
        assert_eq!(model.table().displayed_len(), 10);
        assert!(model.table().displayed_rows().all(|r| r.name.starts_with("Person 4")));
    }

    #[test]
    fn refetch_while_prompt_is_empty_keeps_full_page() {
        let source = Arc::new(Slow {
            inner: Synthetic::new(100),
            delay: Duration::from_millis(100),
        });
        let mut model = model_with(source);
        send(&mut model, Message::NextPage);
        send(&mut model, Message::FilterEmail);
        settle(&mut model);
        assert!(model.raw_keyevents());
        assert_eq!(model.table().displayed_len(), 40);
        assert!(!model.loading());
    }

    #[test]
    fn escape_restores_page_and_refetches() {
        let source = Synthetic::new(100);
        let mut model = model_with(source.clone());
        send(&mut model, Message::FilterEmail);
        send(&mut model, key('7'));
        assert_eq!(model.table().displayed_len(), 4);
        send(
            &mut model,
            Message::RawKey(KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE)),
        );
        assert_eq!(model.table().displayed_len(), 40);
        settle(&mut model);
        assert_eq!(source.fetches.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn jump_prompt_changes_page() {
        let mut model = model_with(Synthetic::new(1000));
        send(&mut model, Message::JumpToPage);
        for c in "12".chars() {
            send(&mut model, key(c));
        }
        send(
            &mut model,
            Message::RawKey(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE)),
        );
        assert_eq!(model.table().current_page(), 12);
    }

    #[test]
    fn header_click_sorts_and_drag_reorders() {
        let mut model = model_with(Synthetic::new(40));
        send(&mut model, Message::BeginDrag(2));
        send(&mut model, Message::EndDrag);
        assert_eq!(model.table().sort_state().column, Some(Column::Age));
        assert_eq!(model.selected_column(), 2);

        send(&mut model, Message::BeginDrag(0));
        send(&mut model, Message::DragEnter(1));
        send(&mut model, Message::DragEnter(3));
        send(&mut model, Message::EndDrag);
        assert_eq!(model.table().column_order()[3], Column::ID);
        assert_eq!(model.selected_column(), 3);
        assert!(model.table().sort_state().ascending);
    }

    #[test]
    fn keyboard_column_moves_stay_in_range() {
        let mut model = model_with(Synthetic::new(40));
        send(&mut model, Message::MoveColumnLeft);
        assert_eq!(model.table().column_order()[0], Column::ID);
        for _ in 0..10 {
            send(&mut model, Message::MoveColumnRight);
        }
        assert_eq!(model.table().column_order()[5], Column::ID);
        assert_eq!(model.selected_column(), 5);
    }

    #[test]
    fn mouse_resize_uses_table_width() {
        let mut model = model_with(Synthetic::new(40));
        let inner = model.layout().table_inner.width;
        assert_eq!(inner, 118);
        send(&mut model, Message::BeginResize(Column::Email, 60));
        send(&mut model, Message::BeginResize(Column::Age, 10));
        send(&mut model, Message::ResizeTo(60 + 59));
        send(&mut model, Message::EndResize);
        assert_eq!(model.table().column_width(Column::Email), 70.0);
        assert_eq!(model.table().column_width(Column::Age), 10.0);
        assert_eq!(model.table().resizing(), None);
    }

    #[test]
    fn record_popup_walks_rows() {
        let mut model = model_with(Synthetic::new(40));
        send(&mut model, Message::Enter);
        assert_eq!(model.popup(), Some(Popup::Record(0)));
        send(&mut model, Message::MoveRight);
        assert_eq!(model.popup_record().unwrap().id, "1");
        send(&mut model, Message::Exit);
        assert_eq!(model.popup(), None);
        assert_eq!(model.selected_row(), 1);
    }

    #[test]
    fn selection_scrolls_with_small_terminal() {
        let mut model = model_with(Synthetic::new(40));
        send(&mut model, Message::Resize(80, 20));
        let rows = model.layout().body_rows();
        for _ in 0..rows + 3 {
            send(&mut model, Message::MoveDown);
        }
        assert_eq!(model.selected_row(), rows + 3);
        assert_eq!(model.offset_row(), 4);
        send(&mut model, Message::MovePageDown);
        assert_eq!(model.selected_row(), rows * 2 + 3);
        for _ in 0..3 {
            send(&mut model, Message::MovePageDown);
        }
        assert_eq!(model.selected_row(), 39);
        assert_eq!(model.offset_row(), 40 - rows);
    }
}
