use serde::{Deserialize, Serialize};

/// Multipart body of the create call: the justification file plus the
/// submitter's email. The transport serializes this however it likes; the
/// core only guarantees the shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BillFormData {
    pub file_name: String,
    pub file: Vec<u8>,
    pub email: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreateHeaders {
    /// The backend infers the multipart boundary itself; the client must not
    /// force a content type on the create call.
    pub no_content_type: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateBillPayload {
    pub data: BillFormData,
    pub headers: CreateHeaders,
}

/// What the store hands back after a successful create: the stored file's
/// URL and the identifying key for the follow-up update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateBillReceipt {
    #[serde(rename = "fileUrl")]
    pub file_url: String,
    pub key: String,
}

/// Update call payload: the serialized bill record keyed by the identifier
/// captured from the create receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateBillPayload {
    pub data: String,
    pub selector: String,
}

/// A file picked in the form's file input, as handed to the change handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub bytes: Vec<u8>,
}
