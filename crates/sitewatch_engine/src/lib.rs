//! Sitewatch engine: external collaborators and the pipeline driver.
mod extract;
mod fetch;
mod notify;
mod orchestrator;
mod store;

pub use extract::{extract_content, Extraction};
pub use fetch::{FetchError, FetchSettings, FetchedPage, Fetcher, ReqwestFetcher};
pub use notify::{DisabledNotifier, Notifier, NotifyError, TelegramNotifier};
pub use orchestrator::{Orchestrator, PipelineSettings, TargetReport, TargetState};
pub use store::{ensure_state_dir, FileStateStore, StateStore, StoreError};
