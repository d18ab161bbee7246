pub mod crawler;
pub mod error;
pub mod renderer;
pub mod result;
pub mod sitemap;

pub use crawler::Crawler;
pub use error::ScanError;
pub use renderer::{BrowserSession, PageRenderer};
pub use result::{CaptureResult, PageVisit};
