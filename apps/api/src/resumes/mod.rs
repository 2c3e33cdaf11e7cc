// Resume intake: multipart upload, PDF text extraction, storage listing.

pub mod extract;
pub mod handlers;
pub mod upload;
