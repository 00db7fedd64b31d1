mod dto;
mod error;
mod runtime;
mod service;

pub use dto::{ClearVersionsResponse, GenerateRequest, VersionListResponse};
pub use error::{ApiError, ErrorCode};
pub use runtime::RuntimeApi;
pub use service::ApiService;
