//! Remote fetching and local persistence

pub mod bse;
pub mod fetch;
pub mod progress;
pub mod provider;
pub mod store;

pub use bse::BseProvider;
pub use fetch::{fetch_announcements, plan_requests};
pub use progress::{
    FetchProgress, NoProgress, ProgressEntry, RunReport, SecurityOutcome, TracingProgress,
};
pub use provider::{FetchError, Page, PageProvider, PageQuery, FIRST_PAGE};
pub use store::{read_records, AnnouncementStore, AnnouncementWriter, CollectionSummary};
