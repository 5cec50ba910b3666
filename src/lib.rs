// Library surface for the binary, headless tests and reuse.
pub mod app;
pub mod app_dirs;
pub mod client;
pub mod config;
pub mod error;
pub mod history;
pub mod preferences;
pub mod quiz;
pub mod runtime;
pub mod session;
pub mod storage;
pub mod study;
pub mod ui;

pub use client::{HttpStudyClient, StudyFetcher};
pub use error::StudyError;
pub use session::{Phase, PhaseKind, SessionController, SessionState};
pub use study::{Mode, StudyData};
