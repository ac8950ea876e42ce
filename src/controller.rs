use std::time::Duration;
use tracing::trace;

use ratatui::crossterm::event::{
    self, Event, KeyCode, KeyEvent, MouseButton, MouseEvent, MouseEventKind,
};

use crate::domain::{Message, TVConfig, TVError};
use crate::layout::{self, HeaderHit, PageTarget};
use crate::model::Model;

pub struct Controller {
    event_poll_time: u64,
}

impl Controller {
    pub fn new(cfg: &TVConfig) -> Self {
        Self {
            event_poll_time: cfg.event_poll_time,
        }
    }

    pub fn handle_event(&self, model: &Model) -> Result<Option<Message>, TVError> {
        if event::poll(Duration::from_millis(self.event_poll_time))? {
            return Ok(self.map_event(event::read()?, model));
        }
        Ok(None)
    }

    pub fn map_event(&self, event: Event, model: &Model) -> Option<Message> {
        match event {
            Event::Key(key) if key.kind == event::KeyEventKind::Press => {
                if model.raw_keyevents() {
                    Some(Message::RawKey(key))
                } else {
                    self.handle_key(key)
                }
            }
            Event::Mouse(mouse) => self.handle_mouse(mouse, model),
            Event::Resize(width, height) => Some(Message::Resize(width as usize, height as usize)),
            // Pointer releases outside the terminal never reach us
            Event::FocusLost => {
                let table = model.table();
                (table.resizing().is_some() || table.dragging().is_some())
                    .then_some(Message::CancelGestures)
            }
            _ => None,
        }
    }

    fn handle_key(&self, key: KeyEvent) -> Option<Message> {
        let message = match key.code {
            KeyCode::Char('q') => Some(Message::Quit),
            KeyCode::Char('?') => Some(Message::Help),
            KeyCode::Enter => Some(Message::Enter),
            KeyCode::Esc => Some(Message::Exit),
            KeyCode::Char('r') => Some(Message::Reload),
            KeyCode::Char('d') => Some(Message::ToggleDarkMode),
            KeyCode::Char('y') => Some(Message::CopyRow),
            KeyCode::Char('j') | KeyCode::Down => Some(Message::MoveDown),
            KeyCode::Char('k') | KeyCode::Up => Some(Message::MoveUp),
            KeyCode::PageDown => Some(Message::MovePageDown),
            KeyCode::PageUp => Some(Message::MovePageUp),
            KeyCode::Char('h') => Some(Message::MoveLeft),
            KeyCode::Char('l') => Some(Message::MoveRight),
            KeyCode::Char('n') | KeyCode::Right => Some(Message::NextPage),
            KeyCode::Char('p') | KeyCode::Left => Some(Message::PrevPage),
            KeyCode::Home => Some(Message::FirstPage),
            KeyCode::End => Some(Message::LastPage),
            KeyCode::Char(':') => Some(Message::JumpToPage),
            KeyCode::Char('s') => Some(Message::SortSelected),
            KeyCode::Char('/') => Some(Message::FilterName),
            KeyCode::Char('@') => Some(Message::FilterEmail),
            KeyCode::Char('[') => Some(Message::MoveColumnLeft),
            KeyCode::Char(']') => Some(Message::MoveColumnRight),
            KeyCode::Char('<') => Some(Message::NarrowColumn),
            KeyCode::Char('>') => Some(Message::WidenColumn),
            _ => None,
        };
        trace!("Mapped: {key:?} => {message:?}");
        message
    }

    fn handle_mouse(&self, mouse: MouseEvent, model: &Model) -> Option<Message> {
        let ui = model.layout();
        let table = model.table();
        let (x, y) = (mouse.column, mouse.row);
        let spans = layout::column_spans(
            table.column_order(),
            |c| table.column_width(c),
            ui.header,
        );

        let message = match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                if layout::contains(ui.header, x, y) {
                    match layout::header_hit(&spans, x)? {
                        HeaderHit::Edge(idx) => Some(Message::BeginResize(table.column_order()[idx], x)),
                        HeaderHit::Cell(idx) => Some(Message::BeginDrag(idx)),
                    }
                } else if layout::contains(ui.body, x, y) {
                    Some(Message::SelectRow(model.offset_row() + (y - ui.body.y) as usize))
                } else if layout::contains(ui.name_filter, x, y) {
                    Some(Message::FilterName)
                } else if layout::contains(ui.email_filter, x, y) {
                    Some(Message::FilterEmail)
                } else if layout::contains(ui.pagination, x, y) {
                    let strip = layout::pagination(
                        table.current_page(),
                        table.max_page(),
                        ui.pagination,
                        model.config().compact_pagination_below,
                    );
                    match strip.hit(x)? {
                        PageTarget::Prev => Some(Message::PrevPage),
                        PageTarget::Next => Some(Message::NextPage),
                        PageTarget::Page(n) => Some(Message::GoToPage(n)),
                    }
                } else {
                    None
                }
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                if table.resizing().is_some() {
                    Some(Message::ResizeTo(x))
                } else if let Some(gesture) = table.dragging() {
                    match layout::header_hit(&spans, x)? {
                        HeaderHit::Cell(idx) | HeaderHit::Edge(idx) if idx != gesture.index => {
                            Some(Message::DragEnter(idx))
                        }
                        _ => None,
                    }
                } else {
                    None
                }
            }
            MouseEventKind::Up(MouseButton::Left) => {
                if table.resizing().is_some() {
                    Some(Message::EndResize)
                } else if table.dragging().is_some() {
                    Some(Message::EndDrag)
                } else {
                    None
                }
            }
            MouseEventKind::ScrollDown => Some(Message::MoveDown),
            MouseEventKind::ScrollUp => Some(Message::MoveUp),
            _ => None,
        };
        if message.is_some() {
            trace!("Mapped: {mouse:?} => {message:?}");
        }
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Column;
    use crate::source::FixtureSource;
    use ratatui::crossterm::event::KeyModifiers;
    use std::path::PathBuf;
    use std::sync::Arc;
    use std::time::Instant;

    fn fixture_model() -> Model {
        let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/users.json");
        let config = TVConfig::default();
        let mut model = Model::init(&config, Arc::new(FixtureSource::new(path, 1000)), 120, 40).unwrap();
        let deadline = Instant::now() + Duration::from_secs(5);
        while model.loading() {
            assert!(Instant::now() < deadline, "fixture did not load");
            std::thread::sleep(Duration::from_millis(5));
            model.update(None).unwrap();
        }
        model
    }

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> Event {
        Event::Mouse(MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        })
    }

    fn press(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[test]
    fn keys_map_to_messages() {
        let model = fixture_model();
        let controller = Controller::new(model.config());
        assert_eq!(controller.map_event(press(KeyCode::Char('q')), &model), Some(Message::Quit));
        assert_eq!(controller.map_event(press(KeyCode::Right), &model), Some(Message::NextPage));
        assert_eq!(controller.map_event(press(KeyCode::Char('@')), &model), Some(Message::FilterEmail));
        assert_eq!(controller.map_event(press(KeyCode::Char('x')), &model), None);
    }

    #[test]
    fn keys_go_raw_while_editing() {
        let mut model = fixture_model();
        let controller = Controller::new(model.config());
        model.update(Some(Message::FilterName)).unwrap();
        let key = KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE);
        assert_eq!(controller.map_event(Event::Key(key), &model), Some(Message::RawKey(key)));
    }

    #[test]
    fn header_press_starts_gestures() {
        let model = fixture_model();
        let controller = Controller::new(model.config());
        let header_y = model.layout().header.y;
        // Header starts at x=1 and ID spans 12 cells
        assert_eq!(
            controller.map_event(mouse(MouseEventKind::Down(MouseButton::Left), 3, header_y), &model),
            Some(Message::BeginDrag(0))
        );
        assert_eq!(
            controller.map_event(mouse(MouseEventKind::Down(MouseButton::Left), 13, header_y), &model),
            Some(Message::BeginResize(Column::ID, 13))
        );
        assert_eq!(
            controller.map_event(mouse(MouseEventKind::Up(MouseButton::Left), 13, header_y), &model),
            None
        );
    }

    #[test]
    fn drag_routes_by_active_gesture() {
        let mut model = fixture_model();
        let controller = Controller::new(model.config());
        let header_y = model.layout().header.y;

        model.update(Some(Message::BeginDrag(0))).unwrap();
        assert_eq!(
            controller.map_event(mouse(MouseEventKind::Drag(MouseButton::Left), 20, header_y), &model),
            Some(Message::DragEnter(1))
        );
        assert_eq!(
            controller.map_event(mouse(MouseEventKind::Drag(MouseButton::Left), 2, header_y), &model),
            None
        );
        assert_eq!(controller.map_event(Event::FocusLost, &model), Some(Message::CancelGestures));
        model.update(Some(Message::CancelGestures)).unwrap();

        model.update(Some(Message::BeginResize(Column::Name, 40))).unwrap();
        assert_eq!(
            controller.map_event(mouse(MouseEventKind::Drag(MouseButton::Left), 55, header_y + 3), &model),
            Some(Message::ResizeTo(55))
        );
        assert_eq!(
            controller.map_event(mouse(MouseEventKind::Up(MouseButton::Left), 55, 0), &model),
            Some(Message::EndResize)
        );
    }

    #[test]
    fn clicks_outside_header() {
        let model = fixture_model();
        let controller = Controller::new(model.config());
        let ui = model.layout().clone();
        assert_eq!(
            controller.map_event(mouse(MouseEventKind::Down(MouseButton::Left), 5, ui.body.y + 2), &model),
            Some(Message::SelectRow(2))
        );
        assert_eq!(
            controller.map_event(mouse(MouseEventKind::Down(MouseButton::Left), 90, ui.email_filter.y + 1), &model),
            Some(Message::FilterEmail)
        );
        // 45 users make two pages, "◀ Prev" starts at x=1 followed by " 1 " and " 2 "
        assert_eq!(
            controller.map_event(mouse(MouseEventKind::Down(MouseButton::Left), 13, ui.pagination.y), &model),
            Some(Message::GoToPage(2))
        );
    }
}
