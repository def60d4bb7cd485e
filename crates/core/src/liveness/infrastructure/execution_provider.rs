use ort::execution_providers::ExecutionProviderDispatch;

/// Hardware-accelerated providers to try for the spoof classifier.
///
/// ONNX Runtime silently falls back to CPU when none of these register,
/// so an empty list simply means "CPU only".
pub fn classifier_execution_providers() -> Vec<ExecutionProviderDispatch> {
    #[cfg(target_os = "macos")]
    let providers = vec![ort::execution_providers::CoreMLExecutionProvider::default().build()];
    #[cfg(target_os = "windows")]
    let providers = vec![ort::execution_providers::DirectMLExecutionProvider::default().build()];
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    let providers = Vec::new();

    log::debug!(
        "Spoof classifier execution providers: {} accelerated, CPU fallback",
        providers.len()
    );
    providers
}
