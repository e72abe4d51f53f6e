mod document;
mod json_store;
mod repository;
mod sqlite_store;

pub use {
    document::{ShipmentDocument, parse_documents},
    json_store::JsonShipmentRepository,
    repository::{ChangeFeed, ChangeKind, ShipmentEvent, ShipmentRepository},
    sqlite_store::SqliteShipmentRepository,
};
