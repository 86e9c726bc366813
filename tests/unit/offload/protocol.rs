//! Tests for offload request and response messages

#[cfg(test)]
mod tests {
    use seamtile::SynthesisError;
    use seamtile::io::image::{EncodedImage, OutputFormat};
    use seamtile::io::error::{channel_error, decode_error};
    use seamtile::offload::protocol::{
        FailureKind, OffloadRequest, OffloadResponse, parse_request, parse_response, to_json,
    };
    use seamtile::synthesis::options::TileOptions;

    fn sample_image() -> EncodedImage {
        EncodedImage {
            bytes: vec![0x89, b'P', b'N', b'G'],
            format: OutputFormat::Jpeg { quality: 80 },
            width: 8,
            height: 4,
        }
    }

    // Tests requests carry the image as base64 with camelCase options
    // Verified by serializing the image as a number array
    #[test]
    fn test_request_wire_form() {
        let request = OffloadRequest {
            image: b"hello".to_vec(),
            options: TileOptions::grid(2, 3, 1.5).with_noise(true),
        };

        let json = to_json(&request).expect("request serializes");
        let value: serde_json::Value = serde_json::from_str(&json).expect("valid json");
        assert_eq!(value["image"], "aGVsbG8=");
        assert_eq!(value["options"]["addNoise"], true);
        assert_eq!(value["options"]["cols"], 2);

        assert_eq!(parse_request(&json).expect("request parses"), request);
    }

    // Tests malformed requests are channel errors
    // Verified by accepting non-base64 image strings
    #[test]
    fn test_parse_request_rejects_malformed() {
        for message in [
            "",
            "{}",
            r#"{"image":"!!!","options":{"cols":1,"rows":1,"scale":1}}"#,
            r#"{"image":"aGk=","options":{"cols":"two","rows":1,"scale":1}}"#,
        ] {
            assert!(
                matches!(parse_request(message), Err(SynthesisError::Channel { .. })),
                "accepted {message:?}"
            );
        }
    }

    // Tests success responses omit the error field and parse back
    // Verified by always serializing both optional fields
    #[test]
    fn test_success_response() {
        let response = OffloadResponse::ok(sample_image());
        let json = to_json(&response).expect("response serializes");

        assert!(!json.contains("\"error\""));
        assert!(json.contains("\"kind\":\"jpeg\""));
        let parsed = parse_response(&json).expect("response parses");
        assert_eq!(parsed.into_result().expect("success"), sample_image());
    }

    // Tests failure responses rebuild decode errors with the worker's message
    // Verified by dropping the kind from serialized failures
    #[test]
    fn test_failure_response_keeps_kind() {
        let response = OffloadResponse::from_result(Err(decode_error(&"corrupt")));
        assert!(!response.success);
        assert_eq!(response.kind, Some(FailureKind::Decode));

        let json = to_json(&response).expect("serializes");
        assert!(json.contains("\"kind\":\"decode\""));
        match parse_response(&json).expect("parses").into_result() {
            Err(SynthesisError::Decode { reason, .. }) => assert_eq!(reason, "corrupt"),
            other => panic!("expected decode failure, got {other:?}"),
        }
    }

    // Tests each failure kind maps back onto the error taxonomy
    // Verified by rebuilding every kind as an offloaded failure
    #[test]
    fn test_failure_kinds_rebuild() {
        let rebuilt = |error: SynthesisError| {
            OffloadResponse::from_error(&error)
                .into_result()
                .expect_err("failure stays a failure")
        };

        assert!(matches!(
            rebuilt(channel_error(&"closed")),
            SynthesisError::Channel { reason } if reason == "closed"
        ));
        assert!(matches!(
            rebuilt(SynthesisError::Cancelled { stage: "noise" }),
            SynthesisError::Cancelled { .. }
        ));
        assert!(matches!(
            rebuilt(SynthesisError::SizeConstraintExceeded {
                axis: "area",
                requested: 10.0,
                limit: 5.0,
            }),
            SynthesisError::Offloaded { reason } if reason.contains("area")
        ));
        assert_eq!(
            FailureKind::of(&SynthesisError::BatchAborted {
                index: 0,
                reason: String::new(),
            }),
            FailureKind::Other
        );
    }

    // Tests failures without a kind still read back as opaque worker failures
    // Verified by requiring the kind field when parsing
    #[test]
    fn test_failure_without_kind() {
        let parsed = parse_response(r#"{"success":false,"error":"boom"}"#).expect("parses");
        assert!(parsed.kind.is_none());
        match parsed.into_result() {
            Err(SynthesisError::Offloaded { reason }) => assert_eq!(reason, "boom"),
            other => panic!("expected offloaded failure, got {other:?}"),
        }
    }

    #[test]
    fn test_contradictory_response_rejected() {
        let response = OffloadResponse {
            success: true,
            result: None,
            error: None,
            kind: None,
        };
        assert!(matches!(
            response.into_result(),
            Err(SynthesisError::Channel { .. })
        ));

        let parsed = parse_response(r#"{"success":false}"#).expect("parses");
        assert!(matches!(
            parsed.into_result(),
            Err(SynthesisError::Channel { .. })
        ));
    }
}
