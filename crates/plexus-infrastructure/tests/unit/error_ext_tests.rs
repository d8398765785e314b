//! Error Extension Tests

use plexus_domain::error::{Error, Result};
use plexus_infrastructure::error_ext::ErrorContext;
use std::io;

#[test]
fn test_config_context_keeps_source() {
    let io_error = io::Error::new(io::ErrorKind::NotFound, "file not found");

    let result: Result<()> = Err(io_error).config_context("failed to read plexus.toml");

    match result {
        Err(Error::Configuration { message, source }) => {
            assert_eq!(message, "failed to read plexus.toml: file not found");
            assert!(source.is_some());
        }
        other => panic!("expected configuration error, got {other:?}"),
    }
}

#[test]
fn test_with_config_context_is_lazy() {
    let ok: std::result::Result<u8, io::Error> = Ok(7);
    let value = ok
        .with_config_context(|| -> String { panic!("context must not be built on success") })
        .expect("ok value");
    assert_eq!(value, 7);

    let failed: std::result::Result<u8, io::Error> =
        Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"));
    let err = failed
        .with_config_context(|| format!("writing {}", "out.toml"))
        .expect_err("should fail");
    assert_eq!(err.to_string(), "Configuration error: writing out.toml: denied");
}

#[test]
fn test_context_produces_generic_error() {
    let failed: std::result::Result<(), io::Error> =
        Err(io::Error::other("socket closed"));

    let err = failed.context("notify host").expect_err("should fail");
    assert!(matches!(err, Error::Generic(_)));
    assert_eq!(err.to_string(), "Generic error: notify host: socket closed");
}
