pub const LIVENESS_MODEL_NAME: &str = "liveness_model.onnx";

/// Square input resolution of the bundled spoof classifier.
pub const CLASSIFIER_INPUT_SIZE: u32 = 224;

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];
