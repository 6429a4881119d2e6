pub mod overlay;

pub use overlay::draw_polygon;
