pub mod icons;
pub mod output;
pub mod progress;
pub mod table;
pub mod theme;

pub use icons::Icons;
pub use output::{error, header, muted, section, status, success, summary_row, timing, warn};
pub use progress::ConsoleProgress;
pub use table::rows_table;
pub use theme::{theme, Theme};
