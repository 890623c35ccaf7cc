use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use image::RgbaImage;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use super::BackgroundSynthesizer;
use crate::error::{BlendError, BlendResult};

/// Diffusion steps requested per image.
const TXT2IMG_STEPS: u32 = 50;

/// Client for a Stable Diffusion WebUI compatible txt2img endpoint.
///
/// Generation can take minutes per image on CPU hosts, so the HTTP
/// client runs without a timeout and requests are strictly sequential.
pub struct SdWebuiSynthesizer {
    endpoint: String,
    client: Client,
}

/// txt2img API request.
#[derive(Debug, Serialize)]
struct Txt2ImgRequest<'a> {
    prompt: &'a str,
    width: u32,
    height: u32,
    steps: u32,
}

/// txt2img API response.
#[derive(Debug, Deserialize)]
struct Txt2ImgResponse {
    images: Vec<String>,
}

impl SdWebuiSynthesizer {
    /// Create a client for the service at `base_url`, e.g.
    /// `http://127.0.0.1:7860`.
    pub fn new(base_url: &str) -> BlendResult<Self> {
        let client = Client::builder()
            .timeout(None)
            .build()
            .map_err(|e| BlendError::collaborator(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            endpoint: txt2img_url(base_url),
            client,
        })
    }
}

impl BackgroundSynthesizer for SdWebuiSynthesizer {
    fn generate(&mut self, prompt: &str, width: u32, height: u32) -> BlendResult<RgbaImage> {
        if width == 0 || height == 0 {
            return Err(BlendError::invalid_input(format!(
                "background of {width}x{height} cannot be generated"
            )));
        }
        if width % 8 != 0 || height % 8 != 0 {
            return Err(BlendError::invalid_input(format!(
                "diffusion dimensions must be multiples of 8, got {width}x{height}"
            )));
        }

        let request = Txt2ImgRequest {
            prompt,
            width,
            height,
            steps: TXT2IMG_STEPS,
        };

        tracing::info!("Requesting {}x{} background from {}", width, height, self.endpoint);

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .map_err(|e| BlendError::collaborator(format!("txt2img request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().unwrap_or_default();
            return Err(BlendError::collaborator(format!(
                "txt2img service returned {status}: {error_text}"
            )));
        }

        let body: Txt2ImgResponse = response
            .json()
            .map_err(|e| BlendError::collaborator(format!("failed to parse txt2img response: {e}")))?;

        let encoded = body
            .images
            .first()
            .ok_or_else(|| BlendError::collaborator("txt2img response held no images"))?;

        decode_background(encoded, width, height)
    }
}

fn txt2img_url(base_url: &str) -> String {
    format!("{}/sdapi/v1/txt2img", base_url.trim_end_matches('/'))
}

/// Decode one base64 image from the service and check it is the size
/// that was ordered.
fn decode_background(encoded: &str, width: u32, height: u32) -> BlendResult<RgbaImage> {
    let bytes = STANDARD
        .decode(encoded)
        .map_err(|e| BlendError::collaborator(format!("txt2img image is not valid base64: {e}")))?;

    let background = image::load_from_memory(&bytes)
        .map_err(|e| BlendError::collaborator(format!("txt2img image failed to decode: {e}")))?
        .to_rgba8();

    if background.dimensions() != (width, height) {
        return Err(BlendError::collaborator(format!(
            "txt2img returned {}x{}, expected {}x{}",
            background.width(),
            background.height(),
            width,
            height
        )));
    }

    Ok(background)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba};
    use std::io::Cursor;

    #[test]
    fn url_join_handles_trailing_slash() {
        assert_eq!(
            txt2img_url("http://localhost:7860/"),
            "http://localhost:7860/sdapi/v1/txt2img"
        );
        assert_eq!(
            txt2img_url("http://localhost:7860"),
            "http://localhost:7860/sdapi/v1/txt2img"
        );
    }

    #[test]
    fn request_carries_prompt_and_geometry() {
        let request = Txt2ImgRequest {
            prompt: "a foggy harbor",
            width: 768,
            height: 512,
            steps: TXT2IMG_STEPS,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["prompt"], "a foggy harbor");
        assert_eq!(value["width"], 768);
        assert_eq!(value["height"], 512);
        assert_eq!(value["steps"], TXT2IMG_STEPS);
    }

    #[test]
    fn response_parses_image_list() {
        let body: Txt2ImgResponse = serde_json::from_str(r#"{"images":["aGVsbG8="]}"#).unwrap();
        assert_eq!(body.images.len(), 1);
    }

    #[test]
    fn rejects_off_grid_dimensions_before_any_request() {
        let mut synth = SdWebuiSynthesizer::new("http://localhost:7860").unwrap();
        let err = synth.generate("x", 100, 512).unwrap_err();
        assert!(matches!(err, BlendError::InvalidInput(_)));
    }

    #[test]
    fn decodes_served_image() {
        let served = RgbaImage::from_pixel(16, 8, Rgba([1, 2, 3, 255]));
        let mut bytes = Vec::new();
        served
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        let encoded = STANDARD.encode(&bytes);

        let background = decode_background(&encoded, 16, 8).unwrap();
        assert_eq!(background.dimensions(), (16, 8));
        assert_eq!(background.get_pixel(0, 0), &Rgba([1, 2, 3, 255]));
    }

    #[test]
    fn rejects_wrong_size_image() {
        let served = RgbaImage::from_pixel(8, 8, Rgba([0, 0, 0, 255]));
        let mut bytes = Vec::new();
        served
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        let encoded = STANDARD.encode(&bytes);

        let err = decode_background(&encoded, 16, 8).unwrap_err();
        assert!(matches!(err, BlendError::Collaborator(_)));
    }

    #[test]
    fn rejects_garbage_base64() {
        let err = decode_background("!!!not base64!!!", 8, 8).unwrap_err();
        assert!(matches!(err, BlendError::Collaborator(_)));
    }
}
