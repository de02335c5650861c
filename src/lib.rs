// Library surface for the binary and for headless/integration tests.
pub mod app;
pub mod app_dirs;
pub mod config;
pub mod error;
pub mod leaderboard;
pub mod logging;
pub mod runtime;
pub mod session;
pub mod timer;
pub mod ui;
pub mod words;

pub use app::App;
pub use session::{CharState, KeystrokeOutcome, Phase, Session};
pub use words::WordPair;
