//! Image providers: OpenAI image generation plus the local card renderers
//! used as fallbacks and for meme replies.

use std::path::{Path, PathBuf};
use std::time::Duration;

use ab_glyph::{FontRef, PxScale};
use async_trait::async_trait;
use chrono::Local;
use image::{ImageFormat, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tweetsmith_core::strip_hashtags;

use crate::error::ImageError;
use crate::meme::{MemeConcept, MemeType};
use crate::openai::DEFAULT_OPENAI_BASE_URL;
use crate::retry::{retry_with_backoff, RetryPolicy};

/// Produces an image file for a post.
#[async_trait]
pub trait ImageProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Render an image for `text` and return its path. `prefix` starts the
    /// file name, e.g. `story` or `quote`.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError`] if the image cannot be produced or saved.
    async fn render(&self, text: &str, prefix: &str) -> Result<PathBuf, ImageError>;
}

/// Image generation prompt for `text` in the given visual `style`.
#[must_use]
pub fn image_prompt(text: &str, style: &str) -> String {
    format!(
        "Create a {style} image that visually represents this text: \"{}\"\n\n\
         The image should be thought-provoking, use calm but powerful colors, \
         carry little or no text, have a clean modern aesthetic, and suit social media.\n\n\
         Style: {style}",
        strip_hashtags(text)
    )
}

fn timestamped(dir: &Path, stem: &str, time_format: &str) -> PathBuf {
    dir.join(format!("{stem}_{}.png", Local::now().format(time_format)))
}

fn ensure_dir(dir: &Path) -> Result<(), ImageError> {
    std::fs::create_dir_all(dir).map_err(|e| ImageError::Io {
        path: dir.display().to_string(),
        source: e,
    })
}

#[derive(Serialize)]
struct ImageRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    size: &'a str,
    quality: &'static str,
    n: u8,
}

#[derive(Deserialize)]
struct ImageResponse {
    #[serde(default)]
    data: Vec<ImageData>,
}

#[derive(Deserialize)]
struct ImageData {
    url: Option<String>,
}

/// OpenAI image generation; the returned URL is downloaded into `output_dir`.
pub struct DalleProvider {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    size: String,
    style: String,
    output_dir: PathBuf,
    retry: RetryPolicy,
}

/// Settings for [`DalleProvider`].
#[derive(Debug, Clone)]
pub struct DalleSettings {
    pub model: String,
    pub size: String,
    pub style: String,
    pub output_dir: PathBuf,
    pub timeout_secs: u64,
    pub retry: RetryPolicy,
}

impl DalleProvider {
    /// # Errors
    ///
    /// Returns [`ImageError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(api_key: &str, settings: DalleSettings) -> Result<Self, ImageError> {
        Self::with_base_url(api_key, settings, DEFAULT_OPENAI_BASE_URL)
    }

    /// Creates a provider with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn with_base_url(
        api_key: &str,
        settings: DalleSettings,
        base_url: &str,
    ) -> Result<Self, ImageError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs.max(60)))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            base_url: base_url.trim_end_matches('/').to_owned(),
            model: settings.model,
            size: settings.size,
            style: settings.style,
            output_dir: settings.output_dir,
            retry: settings.retry,
        })
    }

    async fn request_url(&self, prompt: &str) -> Result<String, ImageError> {
        let request = ImageRequest {
            model: &self.model,
            prompt,
            size: &self.size,
            quality: "standard",
            n: 1,
        };
        let response = self
            .client
            .post(format!("{}/v1/images/generations", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?
            .error_for_status()?;
        let body = response.text().await?;
        let parsed: ImageResponse =
            serde_json::from_str(&body).map_err(|e| ImageError::Deserialize {
                context: "images/generations".to_string(),
                source: e,
            })?;
        parsed
            .data
            .into_iter()
            .find_map(|d| d.url)
            .ok_or(ImageError::MissingUrl)
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, ImageError> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.bytes().await?.to_vec())
    }
}

#[async_trait]
impl ImageProvider for DalleProvider {
    fn name(&self) -> &'static str {
        "dall-e"
    }

    async fn render(&self, text: &str, prefix: &str) -> Result<PathBuf, ImageError> {
        let prompt = image_prompt(text, &self.style);
        let url = retry_with_backoff(self.retry, "image generation", || {
            self.request_url(&prompt)
        })
        .await?;
        let bytes = retry_with_backoff(self.retry, "image download", || self.download(&url)).await?;

        ensure_dir(&self.output_dir)?;
        let path = timestamped(&self.output_dir, prefix, "%H%M%S");
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| ImageError::Io {
                path: path.display().to_string(),
                source: e,
            })?;
        tracing::info!(path = %path.display(), "image: generated");
        Ok(path)
    }
}

const CARD_SIZE: u32 = 1080;
const CARD_BACKGROUND: Rgb<u8> = Rgb([25, 35, 50]);
const CARD_BORDER: Rgb<u8> = Rgb([100, 110, 130]);
const CARD_CORNER: Rgb<u8> = Rgb([150, 160, 180]);
const CARD_TEXT: Rgb<u8> = Rgb([255, 255, 255]);
const CARD_MARGIN: u32 = 50;
const CARD_BORDER_WIDTH: u32 = 3;
const CARD_CORNER_SIZE: u32 = 20;
const CARD_TEXT_MARGIN: u32 = 100;
const CARD_FONT_PX: f32 = 48.0;
const CARD_LINE_HEIGHT: i32 = 58;

const FONT_BYTES: &[u8] = include_bytes!("../assets/DejaVuSans-Bold.ttf");

fn font() -> Result<FontRef<'static>, ImageError> {
    Ok(FontRef::try_from_slice(FONT_BYTES)?)
}

/// Local fallback: the post text centred on a decorated navy card, no
/// network access needed.
pub struct CardRenderer {
    output_dir: PathBuf,
}

impl CardRenderer {
    #[must_use]
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Draw the card for `text` into memory. Hashtags are left off the image.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::Font`] if the embedded font cannot be parsed.
    pub fn draw(text: &str) -> Result<RgbImage, ImageError> {
        let font = font()?;
        let scale = PxScale::from(CARD_FONT_PX);
        let mut img = RgbImage::from_pixel(CARD_SIZE, CARD_SIZE, CARD_BACKGROUND);

        let lines = wrap(&strip_hashtags(text), &font, scale, CARD_SIZE - 2 * CARD_TEXT_MARGIN);
        let block = i32::try_from(lines.len()).unwrap_or(i32::MAX).saturating_mul(CARD_LINE_HEIGHT);
        let mut y = px(CARD_SIZE).saturating_sub(block) / 2;
        for line in &lines {
            let x = centred(CARD_SIZE, text_size(scale, &font, line).0);
            draw_text_mut(&mut img, CARD_TEXT, x, y, scale, &font, line);
            y = y.saturating_add(CARD_LINE_HEIGHT);
        }

        let (w, m, b, c) = (CARD_SIZE, CARD_MARGIN, CARD_BORDER_WIDTH, CARD_CORNER_SIZE);
        let edge = px(m);
        let far = px(w - m);
        for y in [edge, far - px(b)] {
            draw_filled_rect_mut(&mut img, Rect::at(edge, y).of_size(w - 2 * m, b), CARD_BORDER);
        }
        let inner = far - px(c);
        for (x, y) in [(edge, edge), (inner, edge), (edge, inner), (inner, inner)] {
            draw_filled_rect_mut(&mut img, Rect::at(x, y).of_size(c, c), CARD_CORNER);
        }
        Ok(img)
    }
}

#[async_trait]
impl ImageProvider for CardRenderer {
    fn name(&self) -> &'static str {
        "card"
    }

    async fn render(&self, text: &str, prefix: &str) -> Result<PathBuf, ImageError> {
        ensure_dir(&self.output_dir)?;
        let path = timestamped(&self.output_dir, &format!("{prefix}_text"), "%H%M%S");
        Self::draw(text)?.save_with_format(&path, ImageFormat::Png)?;
        tracing::info!(path = %path.display(), "image: rendered fallback card");
        Ok(path)
    }
}

const MEME_SIZE: u32 = 600;
const MEME_MARKER_DIAMETER: u32 = 30;
const MEME_TEXT: Rgb<u8> = Rgb([255, 255, 255]);
const MEME_STROKE: Rgb<u8> = Rgb([0, 0, 0]);
const MEME_STROKE_WIDTH: i32 = 3;
const MEME_SIDE_MARGIN: u32 = 20;
const MEME_LINE_HEIGHT: i32 = 55;
const MEME_TOP_Y: i32 = 60;
const MEME_BOTTOM_OFFSET: i32 = 100;
const MEME_TOP_PX: f32 = 48.0;
const MEME_BOTTOM_PX: f32 = 44.0;

/// Renders meme concepts as coloured cards with outlined captions and a
/// type marker.
pub struct MemeRenderer {
    output_dir: PathBuf,
}

impl MemeRenderer {
    #[must_use]
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    #[must_use]
    pub fn background(meme_type: MemeType) -> Rgb<u8> {
        match meme_type {
            MemeType::Reaction => Rgb([70, 130, 180]),
            MemeType::Agreement => Rgb([60, 179, 113]),
            MemeType::Irony => Rgb([255, 140, 0]),
            MemeType::Observation => Rgb([147, 112, 219]),
            MemeType::Other => Rgb([100, 100, 100]),
        }
    }

    /// Marker position (top-left of its bounding box) and colour.
    fn marker(meme_type: MemeType) -> Option<((u32, u32), Rgb<u8>)> {
        let (w, h) = (MEME_SIZE, MEME_SIZE);
        match meme_type {
            MemeType::Reaction => Some(((w - 80, h - 150), Rgb([255, 215, 0]))),
            MemeType::Agreement => Some(((50, h - 150), Rgb([255, 69, 0]))),
            MemeType::Irony => Some(((w - 80, 50), Rgb([255, 192, 203]))),
            MemeType::Observation => Some(((50, 50), Rgb([173, 216, 230]))),
            MemeType::Other => None,
        }
    }

    /// Draw the meme card: upper-cased top and bottom captions in white
    /// with a black outline.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::Font`] if the embedded font cannot be parsed.
    pub fn draw(concept: &MemeConcept) -> Result<RgbImage, ImageError> {
        let font = font()?;
        let mut img = RgbImage::from_pixel(MEME_SIZE, MEME_SIZE, Self::background(concept.meme_type));

        let bottom_y = px(MEME_SIZE) - MEME_BOTTOM_OFFSET;
        for (caption, y, px) in [
            (&concept.text_top, MEME_TOP_Y, MEME_TOP_PX),
            (&concept.text_bottom, bottom_y, MEME_BOTTOM_PX),
        ] {
            draw_caption(&mut img, &font, &caption.to_uppercase(), y, PxScale::from(px));
        }

        if let Some(((x, y), color)) = Self::marker(concept.meme_type) {
            let r = MEME_MARKER_DIAMETER / 2;
            draw_filled_circle_mut(&mut img, (px(x + r), px(y + r)), px(r), color);
        }
        Ok(img)
    }

    /// Save the meme card as `<prefix>_<YYYYmmdd_HHMMSS>.png`.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError`] if the font, directory or file cannot be used.
    pub fn render(&self, concept: &MemeConcept, prefix: &str) -> Result<PathBuf, ImageError> {
        ensure_dir(&self.output_dir)?;
        let path = timestamped(&self.output_dir, prefix, "%Y%m%d_%H%M%S");
        Self::draw(concept)?.save_with_format(&path, ImageFormat::Png)?;
        tracing::info!(path = %path.display(), meme_type = ?concept.meme_type, "image: rendered meme card");
        Ok(path)
    }
}

/// Centred, wrapped caption starting at `y`, outlined by redrawing it
/// offset in every direction first.
fn draw_caption(img: &mut RgbImage, font: &FontRef<'_>, caption: &str, y: i32, scale: PxScale) {
    let mut y = y;
    for line in wrap(caption, font, scale, img.width() - 2 * MEME_SIDE_MARGIN) {
        let x = centred(img.width(), text_size(scale, font, &line).0);
        for dx in -MEME_STROKE_WIDTH..=MEME_STROKE_WIDTH {
            for dy in -MEME_STROKE_WIDTH..=MEME_STROKE_WIDTH {
                if dx != 0 || dy != 0 {
                    draw_text_mut(img, MEME_STROKE, x + dx, y + dy, scale, font, &line);
                }
            }
        }
        draw_text_mut(img, MEME_TEXT, x, y, scale, font, &line);
        y = y.saturating_add(MEME_LINE_HEIGHT);
    }
}

/// Greedy word wrap measured in rendered pixels. A word wider than
/// `max_width` gets a line of its own.
fn wrap(text: &str, font: &FontRef<'_>, scale: PxScale, max_width: u32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();
    for word in text.split_whitespace() {
        if line.is_empty() {
            line.push_str(word);
            continue;
        }
        let candidate = format!("{line} {word}");
        if text_size(scale, font, &candidate).0 <= max_width {
            line = candidate;
        } else {
            lines.push(std::mem::replace(&mut line, word.to_string()));
        }
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

/// Left edge that centres `content` pixels on a `canvas`-wide image.
fn centred(canvas: u32, content: u32) -> i32 {
    px(canvas.saturating_sub(content) / 2)
}

fn px(n: u32) -> i32 {
    i32::try_from(n).unwrap_or(i32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn concept(meme_type: MemeType) -> MemeConcept {
        MemeConcept {
            meme_type,
            text_top: "TOP".to_string(),
            text_bottom: "BOTTOM".to_string(),
            description: String::new(),
            reply_text: "reply #Tag".to_string(),
        }
    }

    #[test]
    fn prompt_strips_hashtags() {
        let prompt = image_prompt("Be brave today. #Courage #Growth", "minimalist");
        assert!(prompt.contains("\"Be brave today.\""));
        assert!(!prompt.contains('#'));
        assert!(prompt.starts_with("Create a minimalist image"));
    }

    /// Whether any pixel in rows `ys` differs from `background`.
    fn has_ink(img: &RgbImage, ys: std::ops::Range<u32>, background: Rgb<u8>) -> bool {
        ys.flat_map(|y| (0..img.width()).map(move |x| (x, y)))
            .any(|(x, y)| *img.get_pixel(x, y) != background)
    }

    #[test]
    fn card_has_border_and_corners() {
        let img = CardRenderer::draw("").unwrap();
        assert_eq!(img.dimensions(), (1080, 1080));
        assert_eq!(*img.get_pixel(540, 540), CARD_BACKGROUND);
        assert_eq!(*img.get_pixel(540, 51), CARD_BORDER);
        assert_eq!(*img.get_pixel(540, 1028), CARD_BORDER);
        assert_eq!(*img.get_pixel(55, 55), CARD_CORNER);
        assert_eq!(*img.get_pixel(1025, 1025), CARD_CORNER);
        assert_eq!(*img.get_pixel(10, 10), CARD_BACKGROUND);
    }

    #[test]
    fn card_draws_text_in_the_middle() {
        let blank = CardRenderer::draw("#OnlyTags").unwrap();
        assert!(!has_ink(&blank, 400..680, CARD_BACKGROUND));

        let img = CardRenderer::draw("Courage grows in quiet rooms. #Courage").unwrap();
        assert!(has_ink(&img, 400..680, CARD_BACKGROUND));
        assert!(img.pixels().any(|p| p.0.iter().all(|&c| c > 200)));
    }

    #[test]
    fn long_card_text_wraps_inside_the_margins() {
        let font = font().unwrap();
        let scale = PxScale::from(CARD_FONT_PX);
        let text = "The lighthouse keeper counted ships every night and one evening a ship counted him back";
        let lines = wrap(text, &font, scale, 880);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(text_size(scale, &font, line).0 <= 880, "{line}");
        }
        assert_eq!(lines.join(" "), text);
    }

    #[test]
    fn meme_card_is_coloured_by_type() {
        let img = MemeRenderer::draw(&concept(MemeType::Agreement)).unwrap();
        assert_eq!(img.dimensions(), (600, 600));
        assert_eq!(*img.get_pixel(300, 300), Rgb([60, 179, 113]));
        // Marker centre for agreement sits at (65, 465).
        assert_eq!(*img.get_pixel(65, 465), Rgb([255, 69, 0]));

        let other = MemeRenderer::draw(&concept(MemeType::Other)).unwrap();
        assert_eq!(*other.get_pixel(65, 465), Rgb([100, 100, 100]));
    }

    #[test]
    fn meme_captions_are_drawn_with_outline() {
        let background = MemeRenderer::background(MemeType::Other);
        let img = MemeRenderer::draw(&concept(MemeType::Other)).unwrap();
        assert!(has_ink(&img, 60..110, background));
        assert!(has_ink(&img, 500..550, background));
        assert!(img.pixels().any(|p| p.0.iter().all(|&c| c > 200)));
        assert!(img.pixels().any(|p| p.0.iter().all(|&c| c < 50)));

        let mut silent = concept(MemeType::Other);
        silent.text_top.clear();
        silent.text_bottom.clear();
        let img = MemeRenderer::draw(&silent).unwrap();
        assert!(!has_ink(&img, 0..600, background));
    }

    #[tokio::test]
    async fn card_renderer_writes_png() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = CardRenderer::new(dir.path().join("images"));
        let path = renderer.render("Stay curious.", "story").await.unwrap();
        assert!(path.exists());
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("story_text_") && name.ends_with(".png"), "{name}");
        let decoded = image::open(&path).unwrap();
        assert_eq!(decoded.width(), 1080);
    }

    #[test]
    fn meme_renderer_writes_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = MemeRenderer::new(dir.path())
            .render(&concept(MemeType::Irony), "meme_reply_42")
            .unwrap();
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("meme_reply_42_"), "{name}");
        assert_eq!(image::open(&path).unwrap().height(), 600);
    }
}
