use image_hasher::{HashAlg, HasherConfig};
use reachly_core::fetch::{ContentFetcher, FetchedPost};
use reachly_core::settings::VerificationSettings;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// The caption and image an offer expects the influencer to reproduce.
#[derive(Debug, Clone)]
pub struct ExpectedContent {
    pub caption: String,
    pub image_url: String,
}

/// Verification outcome. Always a value; callers branch on it explicitly.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    Accepted { similarity: f64, distance: u32 },
    CaptionMismatch { similarity: f64 },
    ImageMismatch { distance: u32 },
    /// A download or decode failed; verification fails closed.
    FetchFailed { reason: String },
    /// The account has not published anything to compare against.
    NoPost,
}

impl Verdict {
    pub fn accepted(&self) -> bool {
        matches!(self, Verdict::Accepted { .. })
    }
}

/// Checks a published post against an offer's expected caption and image.
///
/// The caption gate runs first: image comparison needs two downloads plus
/// perceptual hashing, so it is only reached once the cheap text check
/// passes.
pub struct PostVerifier {
    fetcher: Arc<dyn ContentFetcher>,
    settings: VerificationSettings,
}

impl PostVerifier {
    pub fn new(fetcher: Arc<dyn ContentFetcher>, settings: VerificationSettings) -> Self {
        Self { fetcher, settings }
    }

    /// Fetch the handle's latest post and verify it.
    pub async fn verify_latest(&self, handle: &str, expected: &ExpectedContent) -> Verdict {
        let post = match self.fetcher.latest_post(handle).await {
            Ok(Some(post)) => post,
            Ok(None) => return Verdict::NoPost,
            Err(e) => {
                warn!(handle, error = %e, "post lookup failed, rejecting");
                return Verdict::FetchFailed {
                    reason: e.to_string(),
                };
            }
        };
        self.verify_post(handle, &post, expected).await
    }

    pub async fn verify_post(
        &self,
        handle: &str,
        post: &FetchedPost,
        expected: &ExpectedContent,
    ) -> Verdict {
        let wanted = format!("{} {}", expected.caption, self.settings.caption_suffix);
        let posted = post.caption.as_deref().unwrap_or("");
        let similarity = strsim::jaro_winkler(posted, &wanted);

        info!(handle, similarity, posted, expected = %wanted, "caption comparison");

        if similarity < self.settings.caption_threshold {
            return Verdict::CaptionMismatch { similarity };
        }

        // Both downloads are scoped to this block; the temp files are
        // removed on drop, whichever way we leave.
        let expected_image = match self.fetcher.download(&expected.image_url).await {
            Ok(download) => download,
            Err(e) => {
                warn!(handle, error = %e, "expected image download failed, rejecting");
                return Verdict::FetchFailed {
                    reason: e.to_string(),
                };
            }
        };
        let posted_image = match self.fetcher.download(&post.image_url).await {
            Ok(download) => download,
            Err(e) => {
                warn!(handle, error = %e, "posted image download failed, rejecting");
                return Verdict::FetchFailed {
                    reason: e.to_string(),
                };
            }
        };

        let distance = match image_distance(expected_image.path(), posted_image.path()) {
            Ok(distance) => distance,
            Err(reason) => {
                warn!(handle, %reason, "image decode failed, rejecting");
                return Verdict::FetchFailed { reason };
            }
        };

        info!(handle, distance, "image comparison");

        if distance < self.settings.max_image_distance {
            Verdict::Accepted {
                similarity,
                distance,
            }
        } else {
            Verdict::ImageMismatch { distance }
        }
    }
}

/// Perceptual hash distance between two image files; smaller means more
/// similar.
fn image_distance(expected: &Path, posted: &Path) -> Result<u32, String> {
    let hasher = HasherConfig::new()
        .hash_alg(HashAlg::Gradient)
        .hash_size(8, 8)
        .to_hasher();

    let expected = decode(expected)?;
    let posted = decode(posted)?;

    Ok(hasher.hash_image(&expected).dist(&hasher.hash_image(&posted)))
}

fn decode(path: &Path) -> Result<image::DynamicImage, String> {
    image::ImageReader::open(path)
        .map_err(|e| e.to_string())?
        .with_guessed_format()
        .map_err(|e| e.to_string())?
        .decode()
        .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use image::{ImageFormat, RgbImage};
    use reachly_core::fetch::{Download, FetchError};
    use std::collections::HashMap;
    use std::io::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::NamedTempFile;

    struct MockFetcher {
        post: Option<FetchedPost>,
        images: HashMap<String, Vec<u8>>,
        fail_downloads: bool,
        downloads: AtomicUsize,
    }

    impl MockFetcher {
        fn new(post: Option<FetchedPost>) -> Self {
            Self {
                post,
                images: HashMap::new(),
                fail_downloads: false,
                downloads: AtomicUsize::new(0),
            }
        }

        fn with_image(mut self, url: &str, bytes: Vec<u8>) -> Self {
            self.images.insert(url.to_string(), bytes);
            self
        }
    }

    #[async_trait]
    impl ContentFetcher for MockFetcher {
        async fn latest_post(&self, _handle: &str) -> Result<Option<FetchedPost>, FetchError> {
            Ok(self.post.clone())
        }

        async fn download(&self, url: &str) -> Result<Download, FetchError> {
            self.downloads.fetch_add(1, Ordering::SeqCst);
            if self.fail_downloads {
                return Err(FetchError::Download {
                    url: url.to_string(),
                    reason: "connection reset".to_string(),
                });
            }
            let bytes = self.images.get(url).ok_or_else(|| FetchError::Download {
                url: url.to_string(),
                reason: "404".to_string(),
            })?;
            let mut file = NamedTempFile::new()?;
            file.write_all(bytes)?;
            file.flush()?;
            Ok(Download::new(file))
        }
    }

    /// Horizontal luminance ramp.
    fn ramp_png() -> Vec<u8> {
        png_bytes(RgbImage::from_fn(64, 64, |x, _| {
            image::Rgb([(x * 4) as u8; 3])
        }))
    }

    /// Vertical luminance ramp; gradient-hashes far from the horizontal one.
    fn vertical_ramp_png() -> Vec<u8> {
        png_bytes(RgbImage::from_fn(64, 64, |_, y| {
            image::Rgb([(y * 4) as u8; 3])
        }))
    }

    fn png_bytes(img: RgbImage) -> Vec<u8> {
        let mut buf = std::io::Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    fn expected() -> ExpectedContent {
        ExpectedContent {
            caption: "Summer vibes with @brand".to_string(),
            image_url: "https://cdn.example/campaign.png".to_string(),
        }
    }

    fn post(caption: &str) -> FetchedPost {
        FetchedPost {
            caption: Some(caption.to_string()),
            image_url: "https://gram.example/post.png".to_string(),
        }
    }

    fn verifier(fetcher: MockFetcher) -> PostVerifier {
        PostVerifier::new(Arc::new(fetcher), VerificationSettings::default())
    }

    #[tokio::test]
    async fn accepts_matching_caption_and_image() {
        let fetcher = MockFetcher::new(Some(post("Summer vibes with @brand #ad")))
            .with_image("https://cdn.example/campaign.png", ramp_png())
            .with_image("https://gram.example/post.png", ramp_png());

        let verdict = verifier(fetcher)
            .verify_latest("creator", &expected())
            .await;
        assert!(verdict.accepted(), "got {verdict:?}");
    }

    #[tokio::test]
    async fn rejects_wrong_caption_without_downloading() {
        let fetcher = MockFetcher::new(Some(post("totally unrelated text")));
        let verifier = PostVerifier::new(Arc::new(fetcher), VerificationSettings::default());

        let verdict = verifier.verify_latest("creator", &expected()).await;
        assert!(matches!(verdict, Verdict::CaptionMismatch { similarity } if similarity < 0.95));
    }

    #[tokio::test]
    async fn caption_gate_skips_image_downloads() {
        let fetcher = Arc::new(MockFetcher::new(Some(post("totally unrelated text"))));
        let verifier =
            PostVerifier::new(fetcher.clone(), VerificationSettings::default());

        verifier.verify_latest("creator", &expected()).await;
        assert_eq!(fetcher.downloads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn rejects_dissimilar_images() {
        let fetcher = MockFetcher::new(Some(post("Summer vibes with @brand #ad")))
            .with_image("https://cdn.example/campaign.png", ramp_png())
            .with_image("https://gram.example/post.png", vertical_ramp_png());

        let verdict = verifier(fetcher)
            .verify_latest("creator", &expected())
            .await;
        assert!(matches!(verdict, Verdict::ImageMismatch { distance } if distance >= 10));
    }

    #[tokio::test]
    async fn fails_closed_on_download_error() {
        let mut fetcher = MockFetcher::new(Some(post("Summer vibes with @brand #ad")));
        fetcher.fail_downloads = true;

        let verdict = verifier(fetcher)
            .verify_latest("creator", &expected())
            .await;
        assert!(matches!(verdict, Verdict::FetchFailed { .. }));
    }

    #[tokio::test]
    async fn missing_caption_compares_as_empty() {
        let fetcher = MockFetcher::new(Some(FetchedPost {
            caption: None,
            image_url: "https://gram.example/post.png".to_string(),
        }));

        let verdict = verifier(fetcher)
            .verify_latest("creator", &expected())
            .await;
        assert!(matches!(verdict, Verdict::CaptionMismatch { .. }));
    }

    #[tokio::test]
    async fn no_post_is_its_own_verdict() {
        let verdict = verifier(MockFetcher::new(None))
            .verify_latest("creator", &expected())
            .await;
        assert_eq!(verdict, Verdict::NoPost);
    }
}
