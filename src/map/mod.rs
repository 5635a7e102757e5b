pub mod annotation;
pub mod geo;
pub mod info_window;
pub mod registry;
pub mod scaling;
pub mod widget;

#[cfg(test)]
pub(crate) mod testing;

pub use annotation::{Annotation, AnnotationKind};
pub use geo::{Coordinate, CoordinateParseError, GeoBounds};
pub use info_window::InfoWindowManager;
pub use registry::{OverlayError, OverlayRegistry};
pub use scaling::{marker_size, Endpoint, ZoomScaler};
pub use widget::{
    ClickListener, IconImage, InfoContent, ListenerToken, MapError, MapWidget, MarkerIcon, OverlayHandle,
    PolylineStyle, Rgb, ZoomListener,
};
