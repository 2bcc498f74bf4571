pub mod likert;
pub mod loader;

pub use likert::decode_likert;
pub use loader::PanelRepository;
