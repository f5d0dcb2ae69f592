pub mod captions;
pub mod check;
pub mod create;
pub mod presets;
pub mod saved;
