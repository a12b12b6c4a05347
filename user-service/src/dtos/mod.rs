pub mod auth;
pub mod role;
pub mod user;

use serde::{Deserialize, Serialize};

/// Plain `{"detail": "..."}` acknowledgement used by mutation endpoints.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct MessageResponse {
    pub detail: String,
}

impl MessageResponse {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}
