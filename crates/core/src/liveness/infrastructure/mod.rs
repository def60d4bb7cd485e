mod execution_provider;
pub mod onnx_spoof_classifier;
