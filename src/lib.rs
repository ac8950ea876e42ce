//! Terminal viewer for a fetched list of user records: paginated, sortable,
//! filterable, with reorderable and resizable columns.

pub mod controller;
pub mod domain;
pub mod inputter;
pub mod layout;
pub mod model;
pub mod record;
pub mod source;
pub mod table;
pub mod ui;
