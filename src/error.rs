use alloy::transports::{RpcError, TransportError};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SniperError {
    /// RPC unreachable, transport failure, closed stream.
    #[error("Network error: {0}")]
    Network(String),

    /// Revert or ABI decode failure.
    #[error("Contract error: {0}")]
    Contract(String),

    #[error("Configuration error: {0}")]
    Config(String),

    /// The monitor already fired its one buy; nothing was sent.
    #[error("Pair already matched: {0}")]
    AlreadyMatched(String),
}

pub type Result<T> = std::result::Result<T, SniperError>;

impl From<TransportError> for SniperError {
    fn from(err: TransportError) -> Self {
        // The node answered with an error object: revert or bad call.
        match err {
            RpcError::ErrorResp(payload) => SniperError::Contract(payload.to_string()),
            other => SniperError::Network(other.to_string()),
        }
    }
}

impl From<alloy::contract::Error> for SniperError {
    fn from(err: alloy::contract::Error) -> Self {
        match err {
            alloy::contract::Error::TransportError(e) => e.into(),
            other => SniperError::Contract(other.to_string()),
        }
    }
}

impl From<alloy::sol_types::Error> for SniperError {
    fn from(err: alloy::sol_types::Error) -> Self {
        SniperError::Contract(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::{rpc::json_rpc::ErrorPayload, transports::TransportErrorKind};

    #[test]
    fn test_error_response_maps_to_contract() {
        let payload = ErrorPayload {
            code: 3,
            message: "execution reverted: PancakeLibrary: INSUFFICIENT_LIQUIDITY".into(),
            data: None,
        };
        let err: SniperError = TransportError::ErrorResp(payload).into();
        assert!(matches!(err, SniperError::Contract(msg) if msg.contains("INSUFFICIENT_LIQUIDITY")));
    }

    #[test]
    fn test_transport_failure_maps_to_network() {
        let err: SniperError = TransportErrorKind::backend_gone().into();
        assert!(matches!(err, SniperError::Network(_)));
    }
}
