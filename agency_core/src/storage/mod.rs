pub mod signer;
pub mod store;
pub mod validation;

#[cfg(test)]
mod tests;

pub use signer::{ObjectOperation, SignedObjectClaims, UrlSigner};
pub use store::{
    ObjectData, ObjectStorage, StoredObject, UploadUrlRequest, UploadUrlResponse, OBJECTS_PATH,
    UPLOAD_PATH,
};
pub use validation::{normalize_key, UploadValidationError, UploadValidator};
