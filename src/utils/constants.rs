//! Shared constants and invariants

pub const DEFAULT_BASE_URL: &str = "https://api-sandbox.pitneybowes.com/shippingservices";
pub const DEFAULT_BASE_TEST_URL: &str = "https://api-test.pitneybowes.com";
pub const DEFAULT_CARRIER: &str = "USPS";

// The authorization host is the service base url without this segment
pub const SHIPPING_SERVICES_SEGMENT: &str = "/shippingservices";
pub const OAUTH_TOKEN_PATH: &str = "/oauth/token";
pub const GRANT_TYPE_CLIENT_CREDENTIALS: &str = "client_credentials";

pub const TLS_TEST_PATH: &str = "/tlstest";
pub const TLS_TEST_SUCCESS: &str = "TLS_Connection_Success";

// Optional shipment headers
pub const HEADER_INTEGRATOR_CARRIER_ID: &str = "X-PB-Integrator-CarrierId";
pub const HEADER_SHIPMENT_GROUP_ID: &str = "X-PB-ShipmentGroupId";
pub const HEADER_TRANSACTION_ID: &str = "X-PB-TransactionId";
