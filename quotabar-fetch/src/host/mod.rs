//! Host APIs used by resolvers and fetchers.
//!
//! This module provides abstractions for interacting with external systems:
//!
//! - [`http`] - Transport trait and the async `reqwest` client
//! - [`blocking`] - Minimal blocking `ureq` client
//! - [`keychain`] - Read access to the system keychain
//! - [`process`] - Subprocess execution for companion CLIs
//! - [`files`] - Atomic writes and JSON reads

pub mod blocking;
pub mod files;
pub mod http;
pub mod keychain;
pub mod process;

// Re-export key types
pub use blocking::UreqTransport;
pub use files::{read_json_file, temp_path, write_atomic};
pub use http::{
    HttpRequest, HttpResponse, HttpTransport, Method, RequestBody, ReqwestTransport, ResponseBody,
};
pub use keychain::{KeychainApi, SystemKeychain};
pub use process::{ProcessOutput, ProcessRunner};
