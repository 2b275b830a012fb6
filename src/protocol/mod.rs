//! Protocol Module
//!
//! JSON wire format of the HTTP API.
//!
//! ## Request Bodies
//! ```text
//! POST  /config                      {client, version, key, value}
//! PATCH /config                      {client, version, key, value}
//! PATCH /config/{client}/{version}   {key, value}
//! PUT   /config/{client}/{version}   {key, value}
//! ```
//!
//! ## Responses
//! - Record: `{"client": .., "version": .., <key>: <value>, ..}`
//! - Error:  `{"status": "fail" | "error", "message": ..}`
//!
//! ### Status Codes
//! - 200: OK (reads and updates)
//! - 201: CREATED
//! - 204: NO_CONTENT (delete)
//! - 400: invalid input or duplicate (client, version)
//! - 404: no matching record, or no matching route
//! - 413: body over the size limit
//! - 500: anything unexpected

mod request;
mod response;

pub use request::{parse_body, JsonBody, BODY_TOO_LARGE_MESSAGE};
pub use response::{record_response, ErrorBody, ErrorStatus, INTERNAL_ERROR_MESSAGE};
