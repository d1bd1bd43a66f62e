//! Protocol OIDs used by the client.

/// StartTLS extended operation (RFC 4511, 4.14).
pub const STARTTLS_OID: &[u8] = b"1.3.6.1.4.1.1466.20037";

/// "Who am I?" extended operation (RFC 4532).
pub const WHOAMI_OID: &str = "1.3.6.1.4.1.4203.1.11.3";

/// Notice of disconnection unsolicited response (RFC 4511, 4.4.1).
pub const NOTICE_OF_DISCONNECTION_OID: &[u8] = b"1.3.6.1.4.1.1466.20036";

/// Simple paged results control (RFC 2696).
pub const SIMPLE_PAGED_RESULTS_CONTROL_OID: &[u8] = b"1.2.840.113556.1.4.319";
