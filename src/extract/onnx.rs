use image::{imageops, GrayImage, Luma, RgbImage, Rgba, RgbaImage};
use ndarray::{Array4, ArrayD};
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::TensorRef;
use std::path::Path;

use super::ObjectExtractor;
use crate::error::{BlendError, BlendResult};

/// Salient-object matting through an ONNX model (U2-Net and friends).
///
/// The model takes a single NCHW float input normalized to [0, 1] and
/// produces a one-channel saliency map. The map is min-max rescaled,
/// resized back to the source size, and written into the alpha channel.
pub struct OnnxExtractor {
    session: Session,
    input_width: u32,
    input_height: u32,
}

impl OnnxExtractor {
    /// Load a matting model from an ONNX file
    ///
    /// # Default Configuration
    /// - Input size: 320x320, the footprint of the U2-Net family
    pub fn new<P: AsRef<Path>>(model_path: P) -> BlendResult<Self> {
        let path = model_path.as_ref();

        tracing::info!("Loading matting model from {}", path.display());

        let session = build_session(path).map_err(|e| {
            BlendError::collaborator(format!(
                "failed to load matting model from {}: {e}",
                path.display()
            ))
        })?;

        tracing::info!("Matting model loaded");

        Ok(Self {
            session,
            input_width: 320,
            input_height: 320,
        })
    }

    /// Run one inference pass and pull out the first output tensor
    fn run_matting(&mut self, input: &Array4<f32>) -> ort::Result<ArrayD<f32>> {
        let outputs = self
            .session
            .run(ort::inputs![TensorRef::from_array_view(input.view())?])?;
        Ok(outputs[0].try_extract_array::<f32>()?.view().to_owned())
    }
}

impl ObjectExtractor for OnnxExtractor {
    fn extract(&mut self, bytes: &[u8]) -> BlendResult<RgbaImage> {
        let _span = tracing::debug_span!("extract_object").entered();

        let decoded = image::load_from_memory(bytes)
            .map_err(|e| BlendError::invalid_input(format!("unreadable object image: {e}")))?;
        let source = decoded.to_rgb8();

        let tensor = preprocess(&source, self.input_width, self.input_height);
        let saliency = self
            .run_matting(&tensor)
            .map_err(|e| BlendError::collaborator(format!("matting inference failed: {e}")))?;

        let mask = saliency_to_mask(&saliency)?;
        let matte = imageops::resize(
            &mask,
            source.width(),
            source.height(),
            imageops::FilterType::Lanczos3,
        );

        Ok(apply_matte(&source, &matte))
    }
}

fn build_session(path: &Path) -> ort::Result<Session> {
    Session::builder()?
        .with_optimization_level(GraphOptimizationLevel::Level3)?
        .with_intra_threads(4)?
        .commit_from_file(path)
}

/// Resize to the model footprint and pack into a [1, 3, H, W] tensor
/// normalized to [0, 1]
fn preprocess(image: &RgbImage, target_width: u32, target_height: u32) -> Array4<f32> {
    let resized = if image.dimensions() != (target_width, target_height) {
        imageops::resize(
            image,
            target_width,
            target_height,
            imageops::FilterType::Lanczos3,
        )
    } else {
        image.clone()
    };

    let (width, height) = resized.dimensions();
    let mut tensor = Array4::<f32>::zeros((1, 3, height as usize, width as usize));

    for y in 0..height {
        for x in 0..width {
            let pixel = resized.get_pixel(x, y);
            tensor[[0, 0, y as usize, x as usize]] = pixel[0] as f32 / 255.0;
            tensor[[0, 1, y as usize, x as usize]] = pixel[1] as f32 / 255.0;
            tensor[[0, 2, y as usize, x as usize]] = pixel[2] as f32 / 255.0;
        }
    }

    tensor
}

/// Collapse the model output to a grayscale mask, min-max rescaled so
/// the matte spans the full [0, 255] range.
///
/// Accepts [1, 1, H, W], [1, H, W], and [H, W] output shapes.
fn saliency_to_mask(output: &ArrayD<f32>) -> BlendResult<GrayImage> {
    let shape = output.shape();
    let (height, width) = match shape.len() {
        4 if shape[0] == 1 && shape[1] == 1 => (shape[2], shape[3]),
        3 if shape[0] == 1 => (shape[1], shape[2]),
        2 => (shape[0], shape[1]),
        _ => {
            return Err(BlendError::collaborator(format!(
                "unsupported matting output shape {shape:?}"
            )))
        }
    };

    let values: Vec<f32> = output.iter().copied().collect();
    if values.len() != height * width {
        return Err(BlendError::collaborator(format!(
            "matting output holds {} values, expected {}x{}",
            values.len(),
            width,
            height
        )));
    }

    let mut lo = f32::INFINITY;
    let mut hi = f32::NEG_INFINITY;
    for &v in &values {
        lo = lo.min(v);
        hi = hi.max(v);
    }
    let range = hi - lo;

    Ok(GrayImage::from_fn(width as u32, height as u32, |x, y| {
        let v = values[y as usize * width + x as usize];
        let scaled = if range > f32::EPSILON {
            (v - lo) / range
        } else {
            v.clamp(0.0, 1.0)
        };
        Luma([(scaled * 255.0).clamp(0.0, 255.0) as u8])
    }))
}

/// Write the matte into the alpha channel of the source image
fn apply_matte(source: &RgbImage, matte: &GrayImage) -> RgbaImage {
    RgbaImage::from_fn(source.width(), source.height(), |x, y| {
        let rgb = source.get_pixel(x, y);
        let alpha = matte.get_pixel(x, y)[0];
        Rgba([rgb[0], rgb[1], rgb[2], alpha])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use ndarray::IxDyn;

    #[test]
    fn preprocess_packs_nchw_in_unit_range() {
        let mut image = RgbImage::from_pixel(2, 2, Rgb([0, 0, 0]));
        image.put_pixel(1, 0, Rgb([255, 128, 64]));

        let tensor = preprocess(&image, 2, 2);
        assert_eq!(tensor.shape(), &[1, 3, 2, 2]);
        assert!((tensor[[0, 0, 0, 1]] - 1.0).abs() < 1e-6);
        assert!((tensor[[0, 1, 0, 1]] - 128.0 / 255.0).abs() < 1e-6);
        assert!((tensor[[0, 2, 0, 1]] - 64.0 / 255.0).abs() < 1e-6);
        assert_eq!(tensor[[0, 0, 1, 1]], 0.0);
    }

    #[test]
    fn preprocess_resizes_to_model_footprint() {
        let image = RgbImage::from_pixel(10, 20, Rgb([50, 100, 150]));
        let tensor = preprocess(&image, 4, 4);
        assert_eq!(tensor.shape(), &[1, 3, 4, 4]);
    }

    #[test]
    fn saliency_rescales_to_full_range() {
        let output =
            ArrayD::from_shape_vec(IxDyn(&[1, 1, 2, 2]), vec![0.0, 0.5, 0.75, 1.0]).unwrap();
        let mask = saliency_to_mask(&output).unwrap();
        assert_eq!(mask.get_pixel(0, 0)[0], 0);
        assert_eq!(mask.get_pixel(1, 0)[0], 127);
        assert_eq!(mask.get_pixel(0, 1)[0], 191);
        assert_eq!(mask.get_pixel(1, 1)[0], 255);
    }

    #[test]
    fn flat_saliency_is_clamped_not_rescaled() {
        let output = ArrayD::from_shape_vec(IxDyn(&[1, 1, 1, 2]), vec![0.6, 0.6]).unwrap();
        let mask = saliency_to_mask(&output).unwrap();
        assert_eq!(mask.get_pixel(0, 0)[0], 153);
        assert_eq!(mask.get_pixel(1, 0)[0], 153);
    }

    #[test]
    fn squeezed_output_shapes_are_accepted() {
        let three = ArrayD::from_shape_vec(IxDyn(&[1, 2, 2]), vec![0.0, 1.0, 1.0, 0.0]).unwrap();
        assert_eq!(saliency_to_mask(&three).unwrap().dimensions(), (2, 2));

        let two = ArrayD::from_shape_vec(IxDyn(&[2, 3]), vec![0.0; 6]).unwrap();
        assert_eq!(saliency_to_mask(&two).unwrap().dimensions(), (3, 2));
    }

    #[test]
    fn batched_output_is_rejected() {
        let output = ArrayD::from_shape_vec(IxDyn(&[2, 1, 2, 2]), vec![0.0; 8]).unwrap();
        let err = saliency_to_mask(&output).unwrap_err();
        assert!(matches!(err, BlendError::Collaborator(_)));
    }

    #[test]
    fn matte_lands_in_alpha_channel() {
        let source = RgbImage::from_pixel(2, 1, Rgb([10, 20, 30]));
        let mut matte = GrayImage::from_pixel(2, 1, Luma([255]));
        matte.put_pixel(1, 0, Luma([0]));

        let cutout = apply_matte(&source, &matte);
        assert_eq!(cutout.get_pixel(0, 0), &Rgba([10, 20, 30, 255]));
        assert_eq!(cutout.get_pixel(1, 0), &Rgba([10, 20, 30, 0]));
    }
}
