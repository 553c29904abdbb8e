//! Request validation, normalization and image materialization.

use std::path::PathBuf;

use futures::future::join_all;
use tracing::{debug, warn};

use super::ValidationError;
use super::context::RenderContext;
use super::model::{
    CaptionedImage, DeckRequest, ImageRef, LogoSource, ProjectRender, RenderJob,
};
use super::request::{MultiSlideRequest, SlideRequest, TextContent, project_error};
use super::url::canonicalize;

/// Glyph every bullet line starts with.
pub const BULLET_GLYPH: char = '•';

/// Split bullet text into lines, trimmed, empty lines dropped, each
/// prefixed with the bullet glyph unless it already starts with one.
pub fn bullet_lines(content: &TextContent) -> Vec<String> {
    let lines: Vec<&str> = match content {
        TextContent::Text(text) => text.split(['\n', '\r', '\u{2028}']).collect(),
        TextContent::Lines(lines) => lines.iter().map(String::as_str).collect(),
    };

    lines
        .into_iter()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            if line.starts_with(BULLET_GLYPH) {
                line.to_string()
            } else {
                format!("{BULLET_GLYPH} {line}")
            }
        })
        .collect()
}

/// Check a caller-supplied artifact name and add the `.pptx` suffix.
pub fn validate_filename(name: &str) -> Result<String, ValidationError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::new("Filename must not be empty"));
    }
    if name.contains(['/', '\\']) || name.contains("..") || name.chars().any(char::is_control) {
        return Err(ValidationError::new(
            "Filename must be a plain file name without path separators",
        ));
    }
    if name.to_ascii_lowercase().ends_with(".pptx") {
        Ok(name.to_string())
    } else {
        Ok(format!("{name}.pptx"))
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Validate one slide request.
pub fn normalize_project(request: &SlideRequest) -> Result<ProjectRender, ValidationError> {
    let title = non_empty(request.title.as_deref())
        .ok_or_else(|| ValidationError::new("Title is required"))?
        .to_string();

    let logo = match (
        non_empty(request.logo_gcs_url.as_deref()),
        non_empty(request.logo_path.as_deref()),
    ) {
        (Some(url), _) => Some(LogoSource::Remote(canonicalize(url)?)),
        (None, Some(path)) => Some(LogoSource::Local(PathBuf::from(path))),
        (None, None) => None,
    };

    let images = request
        .image_data
        .iter()
        .flatten()
        .enumerate()
        .map(|(index, data)| {
            let caption = non_empty(data.title.as_deref())
                .map(String::from)
                .unwrap_or_else(|| format!("Image {}", index + 1));
            Ok(CaptionedImage {
                image: canonicalize(&data.gcs_url)?,
                caption,
            })
        })
        .collect::<Result<Vec<_>, ValidationError>>()?;

    Ok(ProjectRender {
        title,
        customer_name: non_empty(request.customer_name.as_deref()).map(String::from),
        logo,
        bullets: request
            .text_content
            .as_ref()
            .map(bullet_lines)
            .unwrap_or_default(),
        images,
        include_quality_badge: request.include_eqi.unwrap_or(true),
    })
}

/// Validate a single-slide request.
pub fn normalize_single(request: &SlideRequest) -> Result<RenderJob, ValidationError> {
    let project = normalize_project(request)?;
    Ok(RenderJob {
        deck: DeckRequest::Single(project),
        filename: request.filename.as_deref().map(validate_filename).transpose()?,
    })
}

/// Validate a multi-slide request and put its projects in customer order.
pub fn normalize_multi(request: &MultiSlideRequest) -> Result<RenderJob, ValidationError> {
    if request.projects.is_empty() {
        return Err(ValidationError::new("Projects array is required"));
    }

    let mut projects = request
        .projects
        .iter()
        .enumerate()
        .map(|(index, project)| {
            normalize_project(project).map_err(|e| project_error(index, &e))
        })
        .collect::<Result<Vec<_>, _>>()?;
    sort_by_customer(&mut projects);

    Ok(RenderJob {
        deck: DeckRequest::Multi(projects),
        filename: request.filename.as_deref().map(validate_filename).transpose()?,
    })
}

/// Stable, case-insensitive sort on the customer name. Projects without a
/// customer sort first.
pub fn sort_by_customer(projects: &mut [ProjectRender]) {
    projects.sort_by_cached_key(ProjectRender::sort_key);
}

/// A content image after materialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedImage {
    pub caption: String,
    pub source: ImageRef,
    /// Local copy; `None` when the fetch failed.
    pub path: Option<PathBuf>,
}

/// A project whose images have been fetched into the scratch directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedProject {
    pub project: ProjectRender,
    /// Local logo file; `None` when there is no logo or its fetch failed.
    pub logo: Option<PathBuf>,
    pub images: Vec<ResolvedImage>,
}

/// Fetch every image referenced by `deck` into the context's scratch
/// directory, in project order.
///
/// Fetch failures never fail the request: a logo degrades to no logo and a
/// content image keeps its slot with no local file.
pub async fn materialize(deck: &DeckRequest, ctx: &RenderContext) -> Vec<ResolvedProject> {
    join_all(
        deck.projects()
            .iter()
            .enumerate()
            .map(|(index, project)| materialize_project(index, project, ctx)),
    )
    .await
}

async fn materialize_project(
    index: usize,
    project: &ProjectRender,
    ctx: &RenderContext,
) -> ResolvedProject {
    let logo = async {
        match &project.logo {
            None => None,
            Some(LogoSource::Local(path)) => Some(path.clone()),
            Some(LogoSource::Remote(image)) => {
                let stem = format!("p{}_logo", index + 1);
                match ctx.fetcher().fetch_to(image, ctx.scratch_dir(), &stem).await {
                    Ok(path) => Some(path),
                    Err(e) => {
                        warn!(
                            project = index + 1,
                            url = %image,
                            error = %e,
                            "logo fetch failed, rendering without logo"
                        );
                        None
                    },
                }
            },
        }
    };

    let images = join_all(project.images.iter().enumerate().map(|(i, image)| async move {
        let stem = format!("p{}_image{}", index + 1, i + 1);
        let path = match ctx
            .fetcher()
            .fetch_to(&image.image, ctx.scratch_dir(), &stem)
            .await
        {
            Ok(path) => Some(path),
            Err(e) => {
                warn!(
                    project = index + 1,
                    image = i + 1,
                    url = %image.image,
                    error = %e,
                    "image fetch failed, slot becomes a placeholder"
                );
                None
            },
        };
        ResolvedImage {
            caption: image.caption.clone(),
            source: image.image.clone(),
            path,
        }
    }));

    let (logo, images) = futures::join!(logo, images);
    debug!(
        project = index + 1,
        logo = logo.is_some(),
        images = images.iter().filter(|i| i.path.is_some()).count(),
        "materialized project images"
    );

    ResolvedProject {
        project: project.clone(),
        logo,
        images,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::request::ImageData;
    use proptest::prelude::*;

    fn request(title: &str) -> SlideRequest {
        SlideRequest {
            title: Some(title.to_string()),
            ..Default::default()
        }
    }

    fn with_customer(customer: &str) -> SlideRequest {
        SlideRequest {
            customer_name: Some(customer.to_string()),
            ..request(customer)
        }
    }

    #[test]
    fn test_bullet_lines_from_text() {
        let lines = bullet_lines(&TextContent::Text(
            "Line A\r\n\n  • Line B  \n   \nLine C".into(),
        ));
        assert_eq!(lines, vec!["• Line A", "• Line B", "• Line C"]);
    }

    #[test]
    fn test_bullet_lines_pass_through_sequences() {
        let lines = bullet_lines(&TextContent::Lines(vec![
            " first ".into(),
            "".into(),
            "•second".into(),
        ]));
        assert_eq!(lines, vec!["• first", "•second"]);
    }

    #[test]
    fn test_title_is_required() {
        for req in [SlideRequest::default(), request("   ")] {
            let err = normalize_project(&req).unwrap_err();
            assert_eq!(err.message(), "Title is required");
        }
    }

    #[test]
    fn test_defaults() {
        let project = normalize_project(&request("  Q3 Review ")).unwrap();
        assert_eq!(project.title, "Q3 Review");
        assert!(project.include_quality_badge);
        assert!(project.logo.is_none());
        assert!(project.bullets.is_empty());
        assert!(project.images.is_empty());
    }

    #[test]
    fn test_logo_sources() {
        let req = SlideRequest {
            logo_gcs_url: Some("https://storage.googleapis.com/b/customer_logos/a.png".into()),
            logo_path: Some("/tmp/ignored.png".into()),
            ..request("T")
        };
        assert_eq!(
            normalize_project(&req).unwrap().logo,
            Some(LogoSource::Remote(ImageRef::new("b", "customer_logos/a.png")))
        );

        let req = SlideRequest {
            logo_gcs_url: Some("  ".into()),
            logo_path: Some("/srv/logo.png".into()),
            ..request("T")
        };
        assert_eq!(
            normalize_project(&req).unwrap().logo,
            Some(LogoSource::Local(PathBuf::from("/srv/logo.png")))
        );

        let req = SlideRequest {
            logo_gcs_url: Some("ftp://b/a.png".into()),
            ..request("T")
        };
        assert!(normalize_project(&req).is_err());
    }

    #[test]
    fn test_captions_fall_back_to_index() {
        let req = SlideRequest {
            image_data: Some(vec![
                ImageData {
                    gcs_url: "gs://b/one.png".into(),
                    title: Some(" Before ".into()),
                },
                ImageData {
                    gcs_url: "gs://b/two.png".into(),
                    title: Some("".into()),
                },
                ImageData {
                    gcs_url: "gs://b/three.png".into(),
                    title: None,
                },
            ]),
            ..request("T")
        };
        let captions: Vec<_> = normalize_project(&req)
            .unwrap()
            .images
            .into_iter()
            .map(|i| i.caption)
            .collect();
        assert_eq!(captions, vec!["Before", "Image 2", "Image 3"]);
    }

    #[test]
    fn test_multi_sorts_case_insensitively_and_stably() {
        let mut first_target = with_customer("target");
        first_target.title = Some("first".into());
        let mut second_target = with_customer("Target");
        second_target.title = Some("second".into());

        let job = normalize_multi(&MultiSlideRequest {
            projects: vec![
                with_customer("Walmart"),
                first_target,
                with_customer("Sam's Club"),
                second_target,
            ],
            filename: None,
        })
        .unwrap();

        let DeckRequest::Multi(projects) = job.deck else {
            panic!("expected a multi-slide deck");
        };
        let titles: Vec<_> = projects.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["Sam's Club", "first", "second", "Walmart"]);
    }

    #[test]
    fn test_multi_errors_carry_project_index() {
        let err = normalize_multi(&MultiSlideRequest {
            projects: vec![request("ok"), SlideRequest::default()],
            filename: None,
        })
        .unwrap_err();
        assert_eq!(
            err.message(),
            "Error processing project 2: Title is required"
        );

        let err = normalize_multi(&MultiSlideRequest::default()).unwrap_err();
        assert_eq!(err.message(), "Projects array is required");
    }

    #[test]
    fn test_filenames() {
        assert_eq!(validate_filename("weekly").unwrap(), "weekly.pptx");
        assert_eq!(validate_filename("Weekly.PPTX").unwrap(), "Weekly.PPTX");
        for bad in ["", "  ", "../x", "a/b", "a\\b", "a\nb"] {
            assert!(validate_filename(bad).is_err(), "{bad:?}");
        }

        let job = normalize_single(&SlideRequest {
            filename: Some("status".into()),
            ..request("T")
        })
        .unwrap();
        assert_eq!(job.filename.as_deref(), Some("status.pptx"));
    }

    proptest! {
        #[test]
        fn prop_one_bullet_per_non_empty_line(
            lines in prop::collection::vec("[ •]{0,2}[a-zA-Z0-9 ]{0,12}", 0..12)
        ) {
            let text = lines.join("\n");
            let expected = lines.iter().filter(|l| !l.trim().is_empty()).count();
            let bullets = bullet_lines(&TextContent::Text(text));
            prop_assert_eq!(bullets.len(), expected);
            for bullet in &bullets {
                prop_assert!(bullet.starts_with(BULLET_GLYPH));
                prop_assert!(!bullet.starts_with("• •"));
            }
        }
    }
}
