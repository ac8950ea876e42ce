use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use usertable::domain::{Message, TVConfig};
use usertable::model::Model;
use usertable::record::Column;
use usertable::source::{DataSource, FixtureSource, MISSING_ID, SourceResponse};
use usertable::table::FilterField;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn loaded(config: TVConfig) -> Model {
    let source = Arc::new(FixtureSource::new(
        config.fixture.clone().unwrap(),
        config.results,
    ));
    let mut model = Model::init(&config, source, 140, 50).unwrap();
    let deadline = Instant::now() + Duration::from_secs(5);
    while model.loading() {
        assert!(Instant::now() < deadline, "fixture did not load");
        std::thread::sleep(Duration::from_millis(5));
        model.update(None).unwrap();
    }
    model
}

#[test]
fn fixture_maps_api_users() {
    let source = FixtureSource::new(fixture("users.json"), 1000);
    let SourceResponse::Records(records) = source.fetch().unwrap() else {
        panic!("expected records");
    };
    assert_eq!(records.len(), 45);
    assert_eq!(records[0].id, "36f675cc");
    assert_eq!(records[0].name, "Mr Aylin Rossi");
    assert_eq!(records[10].id, MISSING_ID);
    assert!(records.iter().all(|r| r.id.len() == 8 || r.id == MISSING_ID));
}

#[test]
fn results_cap_the_fixture() {
    let source = FixtureSource::new(fixture("users.json"), 12);
    let Ok(SourceResponse::Records(records)) = source.fetch() else {
        panic!("expected records");
    };
    assert_eq!(records.len(), 12);
}

#[test]
fn browse_fixture_pages() {
    let config = TVConfig::default()
        .with_fixture(fixture("users.json"))
        .with_page_size(10);
    let mut model = loaded(config);
    assert_eq!(model.table().max_page(), 5);

    model.update(Some(Message::LastPage)).unwrap();
    let model = {
        let deadline = Instant::now() + Duration::from_secs(5);
        while model.loading() {
            assert!(Instant::now() < deadline);
            std::thread::sleep(Duration::from_millis(5));
            model.update(None).unwrap();
        }
        model
    };
    assert_eq!(model.table().current_page(), 5);
    assert_eq!(model.table().displayed_len(), 5);
}

#[test]
fn sort_filter_and_reorder_on_fixture() {
    let config = TVConfig::default()
        .with_fixture(fixture("users.json"))
        .with_refetch_on_page_change(false);
    let mut model = loaded(config);
    assert_eq!(model.table().displayed_len(), 40);

    model.update(Some(Message::SortColumn(Column::Age))).unwrap();
    let ages: Vec<u32> = model.table().displayed_rows().map(|r| r.age).collect();
    assert!(ages.windows(2).all(|w| w[0] <= w[1]));

    model.update(Some(Message::FilterEmail)).unwrap();
    for c in "@nowhere.test".chars() {
        model
            .update(Some(Message::RawKey(ratatui::crossterm::event::KeyEvent::from(
                ratatui::crossterm::event::KeyCode::Char(c),
            ))))
            .unwrap();
    }
    assert!(model.table().filter_state(FilterField::Email).no_match);
    assert_eq!(model.table().displayed_len(), 40);

    model
        .update(Some(Message::RawKey(ratatui::crossterm::event::KeyEvent::from(
            ratatui::crossterm::event::KeyCode::Esc,
        ))))
        .unwrap();
    model.update(Some(Message::MoveColumnRight)).unwrap();
    assert_eq!(model.table().column_order()[1], Column::ID);
}

#[test]
fn error_fixture_replaces_rows() {
    let config = TVConfig::default().with_fixture(fixture("error.json"));
    let model = loaded(config);
    assert!(model.source_error().unwrap().starts_with("Uh oh"));
    assert_eq!(model.table().displayed_len(), 0);
}
