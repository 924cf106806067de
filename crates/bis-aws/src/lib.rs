//! Cloud plumbing for BIS pipelines
//!
//! - [`Storage`] - S3 objects (cached source files, JSON documents)
//! - [`Messaging`] - SQS work queues carrying JSON message bodies
//! - [`Search`] - Elasticsearch indexes over the REST API
//!
//! Endpoints can be pointed at local stand-ins (LocalStack, a local
//! Elasticsearch) with `AWS_HOST_{SERVICE}` environment variables, e.g.
//! `AWS_HOST_S3`, `AWS_HOST_SQS` and `AWS_HOST_Elasticsearch`.

mod connect;
mod error;
mod messaging;
mod search;
mod storage;

pub use connect::{endpoint_override, http_client, s3_client, sqs_client, REQUEST_TIMEOUT};
pub use error::{AwsError, Result};
pub use messaging::{queue_name, Messaging, QueueMessage};
pub use search::{index_settings, Search};
pub use storage::{url_to_s3_key, ObjectContent, ReturnType, Storage, TransferResult};
