pub mod category;
pub mod error;
pub mod state;
pub mod window;

pub use category::{Category, FallbackTable};
pub use error::{AvgError, Result};
pub use state::{Batch, WindowState, WindowStats};
pub use window::{fold, round2, WindowSize};
