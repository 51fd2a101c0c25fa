pub mod vision;

pub use vision::VisionClient;

use futures_util::future::BoxFuture;

use crate::error::SendError;
use crate::session::SendRequest;

/// Anything that can turn a frame + message into reply text.
///
/// The returned future owns everything it needs so it can be spawned.
pub trait ChatBackend: Send + Sync {
    fn send(&self, request: &SendRequest) -> BoxFuture<'static, Result<String, SendError>>;
}

impl ChatBackend for VisionClient {
    fn send(&self, request: &SendRequest) -> BoxFuture<'static, Result<String, SendError>> {
        let client = self.clone();
        let request = request.clone();
        Box::pin(async move { client.upload_info(&request.img, &request.text).await })
    }
}
