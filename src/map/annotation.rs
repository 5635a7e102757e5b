//! Icons and popup text for the safety annotations drawn along safe routes.

use super::geo::Coordinate;
use super::widget::{IconImage, InfoContent, MarkerIcon, Rgb};
use crate::route::{CctvInfo, StoreInfo};

const ANNOTATION_ICON_SIZE: u32 = 24;
const CCTV_FILL: Rgb = Rgb(0xFF, 0xD7, 0x00);
const STORE_FILL: Rgb = Rgb(0x4C, 0xAF, 0x50);
const NO_ADDRESS: &str = "주소 정보 없음";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotationKind {
    Cctv,
    Store,
}

/// Something that can be pinned to the map with a clickable popup.
pub trait Annotation {
    fn kind(&self) -> AnnotationKind;
    fn position(&self) -> Coordinate;
    fn icon(&self) -> MarkerIcon;
    fn info(&self) -> InfoContent;
}

impl Annotation for CctvInfo {
    fn kind(&self) -> AnnotationKind {
        AnnotationKind::Cctv
    }

    fn position(&self) -> Coordinate {
        self.coordinate
    }

    fn icon(&self) -> MarkerIcon {
        let label = self.camera_count.unwrap_or(1).to_string();
        MarkerIcon::centered(
            IconImage::Badge {
                fill: CCTV_FILL,
                label,
                label_color: Rgb(0, 0, 0),
            },
            ANNOTATION_ICON_SIZE,
        )
    }

    fn info(&self) -> InfoContent {
        InfoContent {
            title: "CCTV 정보".to_string(),
            lines: vec![
                format!("카메라 수: {}대", self.camera_count.unwrap_or(1)),
                format!("설치 목적: {}", non_empty(&self.purpose).unwrap_or("안전 감시")),
                non_empty(&self.address).unwrap_or(NO_ADDRESS).to_string(),
            ],
        }
    }
}

impl Annotation for StoreInfo {
    fn kind(&self) -> AnnotationKind {
        AnnotationKind::Store
    }

    fn position(&self) -> Coordinate {
        self.coordinate
    }

    fn icon(&self) -> MarkerIcon {
        MarkerIcon::centered(
            IconImage::Badge {
                fill: STORE_FILL,
                label: "C".to_string(),
                label_color: Rgb::WHITE,
            },
            ANNOTATION_ICON_SIZE,
        )
    }

    fn info(&self) -> InfoContent {
        InfoContent {
            title: non_empty(&self.name).unwrap_or("편의점").to_string(),
            lines: vec![
                non_empty(&self.address).unwrap_or(NO_ADDRESS).to_string(),
                format!("거리: {}", non_empty(&self.distance).unwrap_or("정보 없음")),
            ],
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}
