use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelLoadError {
    #[error("failed to load model {path}: {message}")]
    Session { path: PathBuf, message: String },
}

/// Opens an ONNX Runtime session with the platform's preferred execution
/// provider, falling back to CPU when it is unavailable.
pub fn load_session(model_path: &Path) -> Result<ort::session::Session, ModelLoadError> {
    let fail = |e: &dyn std::fmt::Display| ModelLoadError::Session {
        path: model_path.to_path_buf(),
        message: e.to_string(),
    };
    let intra_threads = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);

    let builder = ort::session::Session::builder().map_err(|e| fail(&e))?;
    let builder = builder
        .with_intra_threads(intra_threads)
        .map_err(|e| fail(&e))?;
    let mut builder = builder
        .with_execution_providers(preferred_execution_providers())
        .map_err(|e| fail(&e))?;
    let session = builder.commit_from_file(model_path).map_err(|e| fail(&e))?;

    log::info!("Loaded model {}", model_path.display());
    Ok(session)
}

/// NCHW input height of the first input, if the model declares a static one.
pub fn static_input_size(session: &ort::session::Session) -> Option<u32> {
    session.inputs().first().and_then(|input| match input.dtype() {
        ort::value::ValueType::Tensor { shape, .. } if shape.len() >= 4 && shape[2] > 0 => {
            Some(shape[2] as u32)
        }
        _ => None,
    })
}

fn preferred_execution_providers() -> Vec<ort::execution_providers::ExecutionProviderDispatch> {
    #[cfg(target_os = "macos")]
    {
        vec![ort::execution_providers::CoreMLExecutionProvider::default().build()]
    }
    #[cfg(target_os = "windows")]
    {
        vec![ort::execution_providers::DirectMLExecutionProvider::default().build()]
    }
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        vec![]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_model_file_is_a_session_error() {
        let result = load_session(Path::new("/nonexistent/model.onnx"));
        assert!(matches!(
            result,
            Err(ModelLoadError::Session { path, .. }) if path == Path::new("/nonexistent/model.onnx")
        ));
    }

    #[test]
    fn test_garbage_model_file_is_a_session_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.onnx");
        std::fs::write(&path, b"definitely not protobuf").unwrap();

        assert!(matches!(load_session(&path), Err(ModelLoadError::Session { .. })));
    }
}
