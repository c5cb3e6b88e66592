use bls::SignatureBytes;
use serde::{Deserialize, Serialize};
use types::phase0::primitives::H256;

use crate::types::{ForkInfo, SigningMessage};

#[derive(Debug, Serialize)]
pub struct RequestBody {
    // `type` is a keyword in Rust.
    #[serde(rename = "type")]
    message_type: MessageType,
    #[serde(skip_serializing_if = "Option::is_none")]
    fork_info: Option<ForkInfo>,
    #[serde(rename = "signingRoot")]
    signing_root: H256,
    #[serde(flatten)]
    message: SigningMessage,
}

impl RequestBody {
    pub const fn new(
        message: SigningMessage,
        signing_root: H256,
        fork_info: Option<ForkInfo>,
    ) -> Self {
        let message_type = match message {
            SigningMessage::Attestation(_) => MessageType::Attestation,
        };

        Self {
            message_type,
            fork_info,
            signing_root,
            message,
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
enum MessageType {
    Attestation,
}

#[derive(Debug, Deserialize)]
pub struct SigningResponse {
    pub signature: SignatureBytes,
}
