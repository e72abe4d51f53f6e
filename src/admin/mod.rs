mod console;
mod new_shipment;
mod quote;

pub use {
    console::{AdminConsole, matches_search},
    new_shipment::NewShipment,
    quote::{quote_fee, round2},
};
