//! Page sections and anchor navigation

use crate::geometry::{Rect, Viewport};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A named content block of the page, in document order
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum SectionId {
    Hero,
    About,
    Experience,
    Skills,
    Projects,
    Contact,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown section `{0}`")]
pub struct UnknownSection(pub String);

impl SectionId {
    pub const ALL: [SectionId; 6] = [
        SectionId::Hero,
        SectionId::About,
        SectionId::Experience,
        SectionId::Skills,
        SectionId::Projects,
        SectionId::Contact,
    ];

    /// Stable element id
    pub fn id(&self) -> &'static str {
        match self {
            SectionId::Hero => "hero",
            SectionId::About => "about",
            SectionId::Experience => "experience",
            SectionId::Skills => "skills",
            SectionId::Projects => "projects",
            SectionId::Contact => "contact",
        }
    }

    /// Look up a section by id, with or without a leading `#`
    pub fn from_id(id: &str) -> Result<Self, UnknownSection> {
        let trimmed = id.strip_prefix('#').unwrap_or(id);
        Self::ALL
            .into_iter()
            .find(|section| section.id().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| UnknownSection(id.to_string()))
    }

    /// In-page link target, e.g. `#about`
    pub fn anchor(&self) -> String {
        format!("#{}", self.id())
    }

    /// Position in document order
    pub fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for SectionId {
    type Err = UnknownSection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_id(s)
    }
}

/// Sections stacked top to bottom at full page width
#[derive(Clone, Debug, PartialEq)]
pub struct SectionLayout {
    width: f32,
    /// (section, top, height) in document order
    blocks: Vec<(SectionId, f32, f32)>,
}

impl SectionLayout {
    /// Stack `heights` in the given order starting at y = 0
    pub fn stacked(width: f32, heights: &[(SectionId, f32)]) -> Self {
        let mut top = 0.0;
        let blocks = heights
            .iter()
            .map(|&(section, height)| {
                let block = (section, top, height.max(0.0));
                top += height.max(0.0);
                block
            })
            .collect();
        Self { width, blocks }
    }

    /// Every section one viewport tall, the hero included
    pub fn uniform(viewport: &Viewport, height: f32) -> Self {
        let heights: Vec<_> = SectionId::ALL.iter().map(|&s| (s, height)).collect();
        Self::stacked(viewport.width, &heights)
    }

    pub fn sections(&self) -> impl Iterator<Item = SectionId> + '_ {
        self.blocks.iter().map(|(section, _, _)| *section)
    }

    pub fn bounds(&self, section: SectionId) -> Option<Rect> {
        self.blocks
            .iter()
            .find(|(s, _, _)| *s == section)
            .map(|&(_, top, height)| Rect::new(0.0, top, self.width, height))
    }

    /// Total page height
    pub fn height(&self) -> f32 {
        self.blocks
            .last()
            .map(|&(_, top, height)| top + height)
            .unwrap_or(0.0)
    }

    /// Largest scroll offset the viewport can reach
    pub fn max_scroll(&self, viewport: &Viewport) -> f32 {
        (self.height() - viewport.height).max(0.0)
    }

    /// Scroll offset that brings the section's top edge into view
    pub fn scroll_target(&self, section: SectionId, viewport: &Viewport) -> Option<f32> {
        let bounds = self.bounds(section)?;
        Some(bounds.y.min(self.max_scroll(viewport)))
    }

    /// Resolve an anchor such as `#projects` to a scroll offset
    pub fn resolve_anchor(&self, anchor: &str, viewport: &Viewport) -> Result<f32, UnknownSection> {
        let section = SectionId::from_id(anchor)?;
        self.scroll_target(section, viewport)
            .ok_or_else(|| UnknownSection(anchor.to_string()))
    }

    /// Section containing page position `y`
    pub fn section_at(&self, y: f32) -> Option<SectionId> {
        self.blocks
            .iter()
            .find(|&&(_, top, height)| y >= top && y < top + height)
            .map(|(section, _, _)| *section)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_round_trip_through_anchor() {
        for section in SectionId::ALL {
            assert_eq!(SectionId::from_id(&section.anchor()), Ok(section));
        }
        assert_eq!(SectionId::Skills.anchor(), "#skills");
        assert_eq!("Projects".parse::<SectionId>(), Ok(SectionId::Projects));
    }

    #[test]
    fn test_unknown_section() {
        let err = SectionId::from_id("#blog").unwrap_err();
        assert_eq!(err.to_string(), "unknown section `#blog`");
    }

    #[test]
    fn test_stacked_layout() {
        let layout = SectionLayout::stacked(
            1000.0,
            &[
                (SectionId::Hero, 800.0),
                (SectionId::About, 600.0),
                (SectionId::Contact, 400.0),
            ],
        );
        assert_eq!(layout.height(), 1800.0);
        assert_eq!(
            layout.bounds(SectionId::About),
            Some(Rect::new(0.0, 800.0, 1000.0, 600.0))
        );
        assert_eq!(layout.bounds(SectionId::Skills), None);
        assert_eq!(layout.section_at(0.0), Some(SectionId::Hero));
        assert_eq!(layout.section_at(1399.0), Some(SectionId::About));
        assert_eq!(layout.section_at(5000.0), None);
    }

    #[test]
    fn test_anchor_scroll_is_clamped_to_page_end() {
        let viewport = Viewport::new(1000.0, 720.0);
        let layout = SectionLayout::uniform(&viewport, 720.0);

        assert_eq!(layout.resolve_anchor("#about", &viewport), Ok(720.0));
        assert_eq!(
            layout.resolve_anchor("#contact", &viewport),
            Ok(layout.max_scroll(&viewport))
        );
        assert!(layout.resolve_anchor("#nowhere", &viewport).is_err());
    }
}
