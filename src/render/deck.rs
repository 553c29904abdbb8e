//! Deck assembly: one slide per project, written through the package layer.

use std::path::Path;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use tracing::debug;

use super::compose::SlideComposer;
use super::context::SlideAssets;
use super::model::DeckMode;
use super::normalize::ResolvedProject;
use crate::ooxml::Result;
use crate::ooxml::pptx::MutablePresentation;

/// Document title of multi-slide decks.
pub const MULTI_SLIDE_TITLE: &str = "Multi-slide presentation";

const SCRATCH_NAME: &str = "deck.pptx";

/// Builds widescreen decks from resolved projects.
pub struct DeckAssembler<'a> {
    composer: SlideComposer<'a>,
}

impl<'a> DeckAssembler<'a> {
    pub fn new(assets: &'a SlideAssets) -> Self {
        Self {
            composer: SlideComposer::new(assets),
        }
    }

    /// Lay out one slide per project, in the given order. No title slide,
    /// index or page numbers are added.
    pub fn assemble(
        &self,
        mode: DeckMode,
        projects: &[ResolvedProject],
        created: DateTime<Utc>,
    ) -> MutablePresentation {
        let mut pres = MutablePresentation::widescreen();
        match (mode, projects) {
            (DeckMode::Single, [only]) => pres.set_title(&only.project.title),
            _ => pres.set_title(MULTI_SLIDE_TITLE),
        }
        pres.set_created(created);

        for project in projects {
            self.composer.compose(pres.add_slide(), project);
        }
        pres
    }

    /// Save `pres` into `dir` and read the finished file back.
    pub fn write(&self, pres: &MutablePresentation, dir: &Path) -> Result<Bytes> {
        let path = dir.join(SCRATCH_NAME);
        pres.save(&path)?;
        let bytes = std::fs::read(&path)?;
        debug!(
            slides = pres.slide_count(),
            bytes = bytes.len(),
            "deck written"
        );
        Ok(Bytes::from(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::pptx::inspect;
    use crate::render::model::ProjectRender;
    use tempfile::TempDir;

    fn resolved(title: &str, customer: Option<&str>) -> ResolvedProject {
        ResolvedProject {
            project: ProjectRender {
                title: title.into(),
                customer_name: customer.map(String::from),
                logo: None,
                bullets: vec![],
                images: vec![],
                include_quality_badge: false,
            },
            logo: None,
            images: vec![],
        }
    }

    #[test]
    fn test_single_slide_deck() {
        let assets = SlideAssets::default();
        let assembler = DeckAssembler::new(&assets);
        let dir = TempDir::new().unwrap();

        let pres = assembler.assemble(DeckMode::Single, &[resolved("Q3 Review", None)], Utc::now());
        let summary = inspect(&assembler.write(&pres, dir.path()).unwrap()).unwrap();

        assert_eq!(summary.title.as_deref(), Some("Q3 Review"));
        assert_eq!(summary.slides.len(), 1);
        assert_eq!(summary.slide_width, 12_192_000);
        assert_eq!(summary.slide_height, 6_858_000);
        assert_eq!(
            summary.slides[0].shape("Project Title").unwrap().text,
            "Q3 Review"
        );
    }

    #[test]
    fn test_multi_slide_deck_keeps_order() {
        let assets = SlideAssets::default();
        let assembler = DeckAssembler::new(&assets);
        let dir = TempDir::new().unwrap();

        let projects = [
            resolved("one", Some("Sam's Club")),
            resolved("two", Some("Target")),
            resolved("three", Some("Walmart")),
        ];
        let pres = assembler.assemble(DeckMode::Multi, &projects, Utc::now());
        let summary = inspect(&assembler.write(&pres, dir.path()).unwrap()).unwrap();

        assert_eq!(summary.title.as_deref(), Some(MULTI_SLIDE_TITLE));
        let names: Vec<_> = summary.slides.iter().map(|s| s.name.as_deref()).collect();
        assert_eq!(
            names,
            vec![Some("Sam's Club"), Some("Target"), Some("Walmart")]
        );
    }
}
