//! Project-catalog records and their conversion into slide requests.
//!
//! This is the only module that speaks the catalog's vocabulary
//! (`customer`, `overview`, `EQI`).

use serde::{Deserialize, Serialize};

use crate::render::ValidationError;
use crate::render::request::{ImageData, SlideRequest, TextContent};
use crate::render::url::canonical_url;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogImage {
    pub url: String,
    #[serde(default)]
    pub description: String,
}

/// One project as stored in the catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogProject {
    pub title: String,
    #[serde(default)]
    pub customer: Option<String>,
    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde(default)]
    pub overview: String,
    #[serde(default)]
    pub images: Vec<CatalogImage>,
    /// `"Yes"` or `"No"`.
    #[serde(default, rename = "EQI", alias = "eqi")]
    pub eqi: String,
}

impl CatalogProject {
    /// Map the record onto a `/generate` body.
    ///
    /// Links are rewritten to canonical `gs://` form; a link that is not an
    /// object-store URL is an error.
    pub fn to_slide_request(&self) -> Result<SlideRequest, ValidationError> {
        let logo_gcs_url = self
            .logo_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .map(canonical_url)
            .transpose()?;

        let image_data = self
            .images
            .iter()
            .map(|image| {
                Ok(ImageData {
                    gcs_url: canonical_url(&image.url)?,
                    title: Some(image.description.trim().to_string())
                        .filter(|d| !d.is_empty()),
                })
            })
            .collect::<Result<Vec<_>, ValidationError>>()?;

        let overview = self
            .overview
            .split(['\n', '\r', '\u{2028}'])
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect();

        Ok(SlideRequest {
            title: Some(self.title.clone()),
            customer_name: self.customer.clone(),
            logo_gcs_url,
            logo_path: None,
            text_content: Some(TextContent::Lines(overview)),
            image_data: Some(image_data),
            include_eqi: Some(self.eqi.trim().eq_ignore_ascii_case("yes")),
            filename: None,
        })
    }
}
