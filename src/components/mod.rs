pub mod comments_panel;
pub mod history_panel;
pub mod overlay_panel;

pub use comments_panel::CommentsPanel;
pub use history_panel::HistoryPanel;
pub use overlay_panel::OverlayPanel;
