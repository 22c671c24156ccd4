pub mod drawing_canvas;
pub mod pane_chrome;
pub mod toast;
