pub mod history_chart;
pub mod puzzle_menu;
pub mod stats_sidebar;
pub mod timer_panel;
