pub mod chromium;
pub mod error;
pub mod session;
pub mod workflow;

pub use chromium::ChromiumLauncher;
pub use error::BrowserError;
pub use session::{BrowserSession, SessionLauncher};
pub use workflow::{read_price, Workflow};
