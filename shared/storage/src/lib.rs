//! Remote storage integration: the Apps Script Drive gateway client and the
//! background task runner that keeps slow transfers off the request path.

pub mod gateway;
pub mod tasks;

pub use gateway::{DriveGatewayClient, GatewayUpload, GatewayUploadRequest, StorageGateway};
pub use tasks::BackgroundRunner;
