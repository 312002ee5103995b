pub mod display;
pub mod fetcher;
pub mod providers;
pub mod store;

pub use fetcher::{FetchOutcome, FetchRequest, Fetcher};
pub use store::{ResolutionPolicy, Store, ToggleOutcome};
