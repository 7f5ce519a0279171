// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use muxer_core::MuxerError;

#[test]
fn test_configuration_error_display() {
    let err = MuxerError::configuration("at least one source is required");

    assert_eq!(
        err.to_string(),
        "Configuration error: at least one source is required"
    );
    assert!(err.is_configuration());
    assert!(!err.is_destination_closed());
}

#[test]
fn test_destination_closed_display() {
    let err = MuxerError::DestinationClosed;

    assert_eq!(err.to_string(), "Destination closed");
    assert!(err.is_destination_closed());
}

#[test]
fn test_errors_are_std_errors() {
    fn assert_error<E: std::error::Error + Send + Sync + 'static>(_: &E) {}
    assert_error(&MuxerError::DestinationClosed);
}
