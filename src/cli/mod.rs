pub mod convert;
pub mod history;
pub mod rate;
pub mod setup;
pub mod table;
pub mod ui;
