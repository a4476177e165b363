pub mod chart_list;
pub mod chat_panel;
pub mod dataset_picker;
pub mod help_overlay;
pub mod insight_modal;
pub mod text_field;

pub use chart_list::{load_charts, ChartList};
pub use chat_panel::ChatPanel;
pub use dataset_picker::{DatasetPicker, DatasetSearch};
pub use help_overlay::HelpOverlay;
pub use insight_modal::InsightModal;
pub use text_field::TextField;
