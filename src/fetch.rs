use std::fmt;
use std::io::Read;
use std::time::Duration;

use image::imageops::FilterType;
use reqwest::blocking::{Client, Response};
use reqwest::header::{
    HeaderMap, HeaderValue, CONTENT_LENGTH, CONTENT_RANGE, RANGE, REFERER, USER_AGENT,
};

use crate::config::FetchConfig;
use crate::error::{ConfigError, FetchCause, FetchFailure};

/// Leading bytes read from a video response.  Covers every signature
/// [`sniff_video`] knows, including the second MPEG-TS sync byte at 188.
pub const VIDEO_SNIFF_LEN: u64 = 512;

/// Longest side of a decoded image; larger images are scaled down to fit.
/// 2048 is the smallest maximum texture size egui backends guarantee.
pub const MAX_IMAGE_SIDE: u32 = 2048;

// ---------------------------------------------------------------------------
// Asset types
// ---------------------------------------------------------------------------

/// How the bytes behind a URL should be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Image,
    Video,
}

/// A fetched image, decoded to straight (non-premultiplied) RGBA8.
#[derive(Clone)]
pub struct DecodedImage {
    pub url: String,
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl fmt::Debug for DecodedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodedImage")
            .field("url", &self.url)
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

/// Video container families recognised from their leading bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoContainer {
    Mp4,
    ThreeGp,
    QuickTime,
    WebM,
    Matroska,
    Ogg,
    Avi,
    Asf,
    Flv,
    MpegPs,
    MpegTs,
}

impl fmt::Display for VideoContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            VideoContainer::Mp4 => "MP4",
            VideoContainer::ThreeGp => "3GP",
            VideoContainer::QuickTime => "QuickTime",
            VideoContainer::WebM => "WebM",
            VideoContainer::Matroska => "Matroska",
            VideoContainer::Ogg => "Ogg",
            VideoContainer::Avi => "AVI",
            VideoContainer::Asf => "ASF/WMV",
            VideoContainer::Flv => "FLV",
            VideoContainer::MpegPs => "MPEG-PS",
            VideoContainer::MpegTs => "MPEG-TS",
        };
        f.write_str(label)
    }
}

/// A probed video.  Only the container is identified from the first bytes;
/// the clip itself is never downloaded and playback happens outside this
/// crate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoClip {
    pub url: String,
    pub container: VideoContainer,
    /// Full size in bytes as reported by the server, when known.
    pub size: Option<u64>,
}

#[derive(Debug, Clone)]
pub enum Asset {
    Image(DecodedImage),
    Video(VideoClip),
}

impl Asset {
    pub fn url(&self) -> &str {
        match self {
            Asset::Image(img) => &img.url,
            Asset::Video(clip) => &clip.url,
        }
    }
}

/// Result of fetching one item of a batch.
pub type FetchOutcome = Result<Asset, FetchFailure>;

// ---------------------------------------------------------------------------
// AssetFetcher
// ---------------------------------------------------------------------------

/// Blocking HTTP fetcher for remote assets.  Cheap to clone; clones share the
/// connection pool.
#[derive(Debug, Clone)]
pub struct AssetFetcher {
    http: Client,
}

impl AssetFetcher {
    /// Build a client with the configured timeout and the browser-like
    /// `User-Agent` / `Referer` pair the asset host expects.
    pub fn new(config: &FetchConfig) -> Result<Self, ConfigError> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, header_value("fetch.user_agent", &config.user_agent)?);
        headers.insert(REFERER, header_value("fetch.referer", &config.referer)?);

        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()?;

        Ok(Self { http })
    }

    /// Fetch and decode a single asset.  One attempt, no retry.
    pub fn fetch(&self, url: &str, kind: AssetKind) -> FetchOutcome {
        let outcome = match kind {
            AssetKind::Image => self.fetch_image(url),
            AssetKind::Video => self.probe_video(url),
        }
        .map_err(|cause| FetchFailure::new(url, cause));

        match &outcome {
            Ok(_) => log::debug!("Fetched {url}"),
            Err(e) => log::warn!("{e}"),
        }
        outcome
    }

    /// Fetch every URL in order.  Each item gets its own outcome; a failure
    /// never stops the remaining items.
    pub fn fetch_batch<I, S>(&self, urls: I, kind: AssetKind) -> Vec<FetchOutcome>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let outcomes: Vec<FetchOutcome> = urls
            .into_iter()
            .map(|url| self.fetch(url.as_ref(), kind))
            .collect();
        let failed = outcomes.iter().filter(|o| o.is_err()).count();
        if failed > 0 {
            log::info!("{failed} of {} assets could not be fetched", outcomes.len());
        }
        outcomes
    }

    fn fetch_image(&self, url: &str) -> Result<Asset, FetchCause> {
        let response = success(self.http.get(url).send()?)?;
        let bytes = response.bytes()?;
        if bytes.is_empty() {
            return Err(FetchCause::EmptyBody);
        }
        decode_image(url, &bytes).map(Asset::Image)
    }

    /// Ask for the first [`VIDEO_SNIFF_LEN`] bytes and read at most that many,
    /// whether or not the server honours the range.  The rest of the body is
    /// dropped unread.
    fn probe_video(&self, url: &str) -> Result<Asset, FetchCause> {
        let response = self
            .http
            .get(url)
            .header(RANGE, format!("bytes=0-{}", VIDEO_SNIFF_LEN - 1))
            .send()?;
        let response = success(response)?;
        let size = content_size(response.headers());

        let mut head = Vec::with_capacity(VIDEO_SNIFF_LEN as usize);
        response
            .take(VIDEO_SNIFF_LEN)
            .read_to_end(&mut head)
            .map_err(FetchCause::Body)?;
        video_from_prefix(url, &head, size)
    }
}

fn success(response: Response) -> Result<Response, FetchCause> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(FetchCause::Status(status))
    }
}

/// Full resource size: the total of `Content-Range` on a partial reply,
/// otherwise `Content-Length`.
fn content_size(headers: &HeaderMap) -> Option<u64> {
    if let Some(range) = headers.get(CONTENT_RANGE) {
        return range
            .to_str()
            .ok()
            .and_then(|r| r.rsplit('/').next())
            .and_then(|total| total.trim().parse().ok());
    }
    headers
        .get(CONTENT_LENGTH)
        .and_then(|len| len.to_str().ok())
        .and_then(|len| len.trim().parse().ok())
}

fn header_value(field: &'static str, value: &str) -> Result<HeaderValue, ConfigError> {
    HeaderValue::from_str(value).map_err(|e| ConfigError::Invalid {
        field,
        reason: e.to_string(),
    })
}

fn video_from_prefix(url: &str, head: &[u8], size: Option<u64>) -> Result<Asset, FetchCause> {
    if head.is_empty() {
        return Err(FetchCause::EmptyBody);
    }
    let container = sniff_video(head).ok_or(FetchCause::UnknownVideoContainer)?;
    Ok(Asset::Video(VideoClip {
        url: url.to_string(),
        container,
        size,
    }))
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Decode image bytes of any supported format (format guessed from content).
/// Images with a side above [`MAX_IMAGE_SIDE`] are scaled down, keeping the
/// aspect ratio.
pub fn decode_image(url: &str, bytes: &[u8]) -> Result<DecodedImage, FetchCause> {
    let mut img = image::load_from_memory(bytes)?;
    if img.width() > MAX_IMAGE_SIDE || img.height() > MAX_IMAGE_SIDE {
        img = img.resize(MAX_IMAGE_SIDE, MAX_IMAGE_SIDE, FilterType::Triangle);
    }
    let rgba = img.to_rgba8();
    Ok(DecodedImage {
        url: url.to_string(),
        width: rgba.width(),
        height: rgba.height(),
        rgba: rgba.into_raw(),
    })
}

/// Identify a video container from its signature.
pub fn sniff_video(bytes: &[u8]) -> Option<VideoContainer> {
    const EBML: [u8; 4] = [0x1A, 0x45, 0xDF, 0xA3];
    const ASF: [u8; 8] = [0x30, 0x26, 0xB2, 0x75, 0x8E, 0x66, 0xCF, 0x11];
    const MPEG_PS: [u8; 4] = [0x00, 0x00, 0x01, 0xBA];
    const TS_SYNC: u8 = 0x47;
    const TS_PACKET: usize = 188;

    if bytes.len() >= 12 && &bytes[4..8] == b"ftyp" {
        let brand = &bytes[8..12];
        return Some(if brand.starts_with(b"3g") {
            VideoContainer::ThreeGp
        } else if brand == b"qt  " {
            VideoContainer::QuickTime
        } else {
            VideoContainer::Mp4
        });
    }
    if bytes.starts_with(&EBML) {
        let head = &bytes[..bytes.len().min(64)];
        let is_webm = head.windows(4).any(|w| w == b"webm");
        return Some(if is_webm {
            VideoContainer::WebM
        } else {
            VideoContainer::Matroska
        });
    }
    if bytes.starts_with(b"OggS") {
        return Some(VideoContainer::Ogg);
    }
    if bytes.len() >= 12 && bytes.starts_with(b"RIFF") && &bytes[8..12] == b"AVI " {
        return Some(VideoContainer::Avi);
    }
    if bytes.starts_with(&ASF) {
        return Some(VideoContainer::Asf);
    }
    if bytes.starts_with(b"FLV") {
        return Some(VideoContainer::Flv);
    }
    if bytes.starts_with(&MPEG_PS) {
        return Some(VideoContainer::MpegPs);
    }
    if bytes.len() > TS_PACKET && bytes[0] == TS_SYNC && bytes[TS_PACKET] == TS_SYNC {
        return Some(VideoContainer::MpegTs);
    }
    None
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use image::{ImageFormat, Rgba, RgbaImage};

    use super::*;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, Rgba([10, 20, 30, 255]));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png).unwrap();
        buf
    }

    #[test]
    fn decodes_png_to_rgba() {
        let decoded = decode_image("https://example.org/a.png", &png_bytes(3, 2)).unwrap();
        assert_eq!((decoded.width, decoded.height), (3, 2));
        assert_eq!(decoded.rgba.len(), 3 * 2 * 4);
        assert_eq!(&decoded.rgba[..4], &[10, 20, 30, 255]);
    }

    #[test]
    fn garbage_is_a_decode_failure() {
        let err = decode_image("https://example.org/a.jpg", b"<html>moved</html>").unwrap_err();
        assert!(matches!(err, FetchCause::Decode(_)));
    }

    #[test]
    fn sniffs_common_containers() {
        let mut mp4 = vec![0, 0, 0, 0x18];
        mp4.extend_from_slice(b"ftypisom");
        assert_eq!(sniff_video(&mp4), Some(VideoContainer::Mp4));

        let mut three_gp = vec![0, 0, 0, 0x14];
        three_gp.extend_from_slice(b"ftyp3gp4");
        assert_eq!(sniff_video(&three_gp), Some(VideoContainer::ThreeGp));

        let mut webm = vec![0x1A, 0x45, 0xDF, 0xA3, 0x9F, 0x42, 0x82, 0x84];
        webm.extend_from_slice(b"webm");
        assert_eq!(sniff_video(&webm), Some(VideoContainer::WebM));

        let mut avi = b"RIFF".to_vec();
        avi.extend_from_slice(&[0, 0, 0, 0]);
        avi.extend_from_slice(b"AVI LIST");
        assert_eq!(sniff_video(&avi), Some(VideoContainer::Avi));

        assert_eq!(sniff_video(b"OggS\0\x02"), Some(VideoContainer::Ogg));
        assert_eq!(sniff_video(b"FLV\x01\x05"), Some(VideoContainer::Flv));
        assert_eq!(
            sniff_video(&[0x30, 0x26, 0xB2, 0x75, 0x8E, 0x66, 0xCF, 0x11, 0xA6]),
            Some(VideoContainer::Asf)
        );

        let mut ts = vec![0u8; 189];
        ts[0] = 0x47;
        ts[188] = 0x47;
        assert_eq!(sniff_video(&ts), Some(VideoContainer::MpegTs));
    }

    #[test]
    fn unknown_bytes_are_not_video() {
        assert_eq!(sniff_video(b""), None);
        assert_eq!(sniff_video(b"<!DOCTYPE html>"), None);
        assert_eq!(sniff_video(&png_bytes(1, 1)), None);
    }

    #[test]
    fn oversized_images_are_scaled_to_the_texture_limit() {
        let decoded = decode_image("https://example.org/wide.png", &png_bytes(3000, 100)).unwrap();
        assert_eq!(decoded.width, MAX_IMAGE_SIDE);
        assert!(decoded.height < 100 && decoded.height > 0);
        assert_eq!(
            decoded.rgba.len(),
            decoded.width as usize * decoded.height as usize * 4
        );
    }

    #[test]
    fn video_prefix_keeps_container_and_size_only() {
        let mut mp4 = vec![0, 0, 0, 0x18];
        mp4.extend_from_slice(b"ftypmp42");
        let asset = video_from_prefix("https://example.org/v.mp4", &mp4, Some(8_388_608)).unwrap();
        assert_eq!(asset.url(), "https://example.org/v.mp4");
        match asset {
            Asset::Video(clip) => {
                assert_eq!(clip.container, VideoContainer::Mp4);
                assert_eq!(clip.size, Some(8_388_608));
            }
            other => panic!("expected video, got {other:?}"),
        }

        assert!(matches!(
            video_from_prefix("https://example.org/v.mp4", b"", None),
            Err(FetchCause::EmptyBody)
        ));
        assert!(matches!(
            video_from_prefix("https://example.org/v.mp4", b"<html>", None),
            Err(FetchCause::UnknownVideoContainer)
        ));
    }

    #[test]
    fn size_comes_from_content_range_before_content_length() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_LENGTH, HeaderValue::from_static("512"));
        assert_eq!(content_size(&headers), Some(512));

        headers.insert(CONTENT_RANGE, HeaderValue::from_static("bytes 0-511/8388608"));
        assert_eq!(content_size(&headers), Some(8_388_608));

        headers.insert(CONTENT_RANGE, HeaderValue::from_static("bytes 0-511/*"));
        assert_eq!(content_size(&headers), None);

        assert_eq!(content_size(&HeaderMap::new()), None);
    }

    #[test]
    fn invalid_header_value_is_a_config_error() {
        let config = FetchConfig {
            user_agent: "bad\nagent".to_string(),
            ..FetchConfig::default()
        };
        assert!(matches!(
            AssetFetcher::new(&config),
            Err(ConfigError::Invalid { field: "fetch.user_agent", .. })
        ));
    }
}
