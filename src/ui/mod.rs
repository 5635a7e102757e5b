pub mod map_canvas;
pub mod my_app;
