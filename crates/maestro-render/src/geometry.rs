//! Page geometry for paginated backends
//!
//! All lengths are in twentieths of a point (twips), as DOCX stores them.

use serde::{Deserialize, Serialize};

/// Page orientation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

/// Page margins in twips
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Margins {
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
    pub left: u32,
}

impl Margins {
    /// Same margin on every side
    #[must_use]
    pub const fn uniform(twips: u32) -> Self {
        Self {
            top: twips,
            right: twips,
            bottom: twips,
            left: twips,
        }
    }
}

/// Paper, margins and tab stop of one paginated variant
///
/// `width` and `height` describe the sheet in portrait; landscape swaps them
/// when the page is laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageGeometry {
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub orientation: Orientation,
    pub margins: Margins,
    /// Right-aligned tab stop used for durations in task headers
    pub right_tab_position: u32,
}

impl PageGeometry {
    /// US letter, landscape, half-inch margins
    #[must_use]
    pub const fn eva() -> Self {
        Self {
            width: 12240,
            height: 15840,
            orientation: Orientation::Landscape,
            margins: Margins::uniform(720),
            right_tab_position: 14400,
        }
    }

    /// US letter, portrait, half-inch margins
    #[must_use]
    pub const fn sodf() -> Self {
        Self {
            width: 12240,
            height: 15840,
            orientation: Orientation::Portrait,
            margins: Margins::uniform(720),
            right_tab_position: 10800,
        }
    }

    /// `(width, height)` as laid out
    #[must_use]
    pub const fn page_size(&self) -> (u32, u32) {
        match self.orientation {
            Orientation::Portrait => (self.width, self.height),
            Orientation::Landscape => (self.height, self.width),
        }
    }

    /// Width between the margins
    #[must_use]
    pub const fn content_width(&self) -> u32 {
        let (width, _) = self.page_size();
        width.saturating_sub(self.margins.left + self.margins.right)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn landscape_swaps_dimensions() {
        assert_eq!(PageGeometry::eva().page_size(), (15840, 12240));
        assert_eq!(PageGeometry::sodf().page_size(), (12240, 15840));
    }

    #[test]
    fn tab_stop_fits_inside_margins() {
        for geometry in [PageGeometry::eva(), PageGeometry::sodf()] {
            assert!(geometry.right_tab_position <= geometry.content_width());
        }
    }

    #[test]
    fn deserializes_override() {
        let geometry: PageGeometry = serde_yaml::from_str(
            "width: 11906\nheight: 16838\nmargins: {top: 567, right: 567, bottom: 567, left: 567}\nright_tab_position: 9000\n",
        )
        .unwrap();
        assert_eq!(geometry.orientation, Orientation::Portrait);
        assert_eq!(geometry.page_size(), (11906, 16838));
    }
}
