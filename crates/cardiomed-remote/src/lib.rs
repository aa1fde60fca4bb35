//! [`DataService`] implementation that forwards every call to the clinic's
//! data server as a JSON request.

mod client;
mod service;

pub use client::{RpcClient, RpcError, RpcRequest, RpcResponse};
pub use service::RemoteDataService;

pub use cardiomed_backend::{DataService, Record, RecordId, ServiceError, VersionRequirement};
