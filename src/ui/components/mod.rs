pub mod dashboard;
pub mod list_picker;
pub mod menu;
pub mod progress_bar;
pub mod quiz_card;
pub mod word_table;
