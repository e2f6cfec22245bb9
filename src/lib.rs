// Library surface for headless/integration tests and reuse.
// The binary in main.rs only wires terminal setup, logging and the CLI.
pub mod app;
pub mod app_dirs;
pub mod backend;
pub mod board;
pub mod config;
pub mod runtime;
pub mod scheduler;
pub mod session;
pub mod store;
pub mod ui;

pub use app::{App, AppState};
pub use session::{Session, SessionConfig, SessionSnapshot, Status};
