pub mod properties;
pub mod status_bar;
