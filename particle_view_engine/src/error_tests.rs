use super::*;

#[test]
fn test_error_display() {
    assert_eq!(
        Error::BackendError("boom".to_string()).to_string(),
        "Backend error: boom"
    );
    assert_eq!(Error::OutOfMemory.to_string(), "Out of GPU memory");
    assert_eq!(
        Error::InvalidResource("bad shader".to_string()).to_string(),
        "Invalid resource: bad shader"
    );
    assert_eq!(
        Error::InitializationFailed("no gpu".to_string()).to_string(),
        "Initialization failed: no gpu"
    );
    assert_eq!(
        Error::DeviceLost("fence timeout".to_string()).to_string(),
        "Device lost: fence timeout"
    );
}

#[test]
fn test_error_is_std_error() {
    fn assert_error<E: std::error::Error>(_e: &E) {}
    assert_error(&Error::OutOfMemory);
}

#[test]
fn test_result_propagation() {
    fn fails() -> Result<()> {
        Err(Error::DeviceLost("gone".to_string()))
    }
    fn wraps() -> Result<()> {
        fails()?;
        Ok(())
    }
    assert!(matches!(wraps(), Err(Error::DeviceLost(_))));
}
