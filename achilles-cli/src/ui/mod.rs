pub mod bar_chart;
mod footer;
mod header;
mod help;
mod layout;
mod messages;
mod progress;
mod theme;
mod usage_table;

pub use footer::Footer;
pub use header::Header;
pub use help::HelpView;
pub use layout::AppLayout;
pub use messages::MessagesView;
pub use progress::ProgressView;
pub use theme::Theme;
pub use usage_table::UsageTable;
