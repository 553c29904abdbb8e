//! Object-store URL canonicalization.
//!
//! Three spellings of the same catalog object are accepted:
//!
//! | Form | Example |
//! |---|---|
//! | canonical | `gs://bucket/key` |
//! | web | `https://storage.googleapis.com/bucket/key` |
//! | browser | `https://storage.cloud.google.com/bucket/key` |
//!
//! Web and browser links are percent-decoded and lose their query string
//! (`?authuser=0` and friends). Everything else is a [`ValidationError`].

use super::ValidationError;
use super::model::ImageRef;

const CANONICAL_PREFIX: &str = "gs://";
const WEB_HOSTS: [&str; 2] = ["storage.googleapis.com", "storage.cloud.google.com"];

/// Parse any accepted alias into a canonical [`ImageRef`].
pub fn canonicalize(url: &str) -> Result<ImageRef, ValidationError> {
    let url = url.trim();

    if let Some(rest) = url.strip_prefix(CANONICAL_PREFIX) {
        return split_bucket_key(rest, url);
    }

    if let Some(rest) = url.strip_prefix("https://") {
        let (host, path) = rest
            .split_once('/')
            .ok_or_else(|| unsupported(url))?;
        if !WEB_HOSTS.iter().any(|h| host.eq_ignore_ascii_case(h)) {
            return Err(unsupported(url));
        }
        let path = path
            .split(['?', '#'])
            .next()
            .unwrap_or_default();
        let decoded = urlencoding::decode(path).map_err(|_| unsupported(url))?;
        return split_bucket_key(&decoded, url);
    }

    Err(unsupported(url))
}

/// String form of [`canonicalize`].
pub fn canonical_url(url: &str) -> Result<String, ValidationError> {
    canonicalize(url).map(|image| image.to_string())
}

fn split_bucket_key(path: &str, original: &str) -> Result<ImageRef, ValidationError> {
    let (bucket, key) = path
        .split_once('/')
        .ok_or_else(|| ValidationError::new(format!("Image URL has no object key: {original}")))?;
    let key = key.trim_start_matches('/');
    if bucket.is_empty() || key.is_empty() {
        return Err(ValidationError::new(format!(
            "Image URL has no object key: {original}"
        )));
    }
    Ok(ImageRef::new(bucket, key))
}

fn unsupported(url: &str) -> ValidationError {
    ValidationError::new(format!("Unsupported image URL: {url}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_aliases_reduce_to_the_same_object() {
        let expected = ImageRef::new("anderson_images", "customer_logos/walmart-logo.png");
        for alias in [
            "gs://anderson_images/customer_logos/walmart-logo.png",
            "https://storage.googleapis.com/anderson_images/customer_logos/walmart-logo.png",
            "https://storage.cloud.google.com/anderson_images/customer_logos/walmart-logo.png?authuser=0",
            "  gs://anderson_images/customer_logos/walmart-logo.png\n",
        ] {
            assert_eq!(canonicalize(alias).unwrap(), expected, "{alias}");
        }
    }

    #[test]
    fn test_web_links_are_percent_decoded() {
        let image =
            canonicalize("https://storage.googleapis.com/b/project_images/site%20photo.jpg")
                .unwrap();
        assert_eq!(image.key(), "project_images/site photo.jpg");
    }

    #[test]
    fn test_rejects_other_forms() {
        for bad in [
            "",
            "http://storage.googleapis.com/b/k.png",
            "https://example.com/b/k.png",
            "s3://b/k.png",
            "gs://bucket-only",
            "gs://b/",
            "gs:///k.png",
            "/tmp/logo.png",
        ] {
            let err = canonicalize(bad).unwrap_err();
            assert!(err.message().contains("URL"), "{bad}: {err}");
        }
    }

    #[test]
    fn test_canonical_url_string() {
        assert_eq!(
            canonical_url("https://storage.cloud.google.com/b/k.png").unwrap(),
            "gs://b/k.png"
        );
    }

    fn alias() -> impl Strategy<Value = String> {
        (
            "[a-z][a-z0-9_-]{0,12}",
            "[A-Za-z0-9_-]{1,10}(/[A-Za-z0-9_.-]{1,5}( [A-Za-z0-9_.-]{1,4})?){0,3}",
            0..3usize,
        )
            .prop_map(|(bucket, key, form)| match form {
                0 => format!("gs://{bucket}/{key}"),
                1 => format!(
                    "https://storage.googleapis.com/{bucket}/{}",
                    key.replace(' ', "%20")
                ),
                _ => format!("https://storage.cloud.google.com/{bucket}/{key}?authuser=1"),
            })
    }

    proptest! {
        #[test]
        fn prop_canonicalization_is_idempotent(url in alias()) {
            let once = canonical_url(&url).unwrap();
            let twice = canonical_url(&once).unwrap();
            prop_assert_eq!(once, twice);
        }
    }
}
