// Stable machine-readable error codes emitted in the `error` field of every
// JSON error body. Clients branch on these; messages are free text.

pub const INVALID_REQUEST: &str = "invalid_request";
pub const NOT_FOUND: &str = "not_found";
pub const CONFLICT: &str = "conflict";
pub const UNAUTHORIZED: &str = "unauthorized";
pub const INTERNAL_ERROR: &str = "internal_error";
