pub mod dashboards;
pub mod debug_overlay;
pub mod main_menu;
pub mod presentation;
pub mod screensaver;
