use thiserror::Error;

use crate::protocol::Protocol;

#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("unknown protocol: {protocol}")]
    ProtocolUnknown { protocol: String },

    #[error("the type of the connection must be {expected}, not {found}")]
    ConnectionType { expected: Protocol, found: String },

    #[error("message protocol ({found}) does not match the connection protocol ({expected})")]
    ProtocolMismatch { expected: Protocol, found: Protocol },

    #[error("request type ({found}) does not match the expected type ({expected})")]
    TypeMismatch { expected: &'static str, found: String },

    #[error("invalid connection state: {reason}")]
    InvalidConnectionState { reason: String },

    #[error("invalid data: {reason}")]
    InvalidData { reason: String },

    #[error("transport error: {source}")]
    Transport {
        #[from]
        source: TransportError,
    },
}

impl ConnectionError {
    pub fn protocol_unknown<S: ToString>(protocol: S) -> Self {
        Self::ProtocolUnknown { protocol: protocol.to_string() }
    }

    pub fn connection_type<S: ToString>(expected: Protocol, found: S) -> Self {
        Self::ConnectionType { expected, found: found.to_string() }
    }

    pub fn protocol_mismatch(expected: Protocol, found: Protocol) -> Self {
        Self::ProtocolMismatch { expected, found }
    }

    pub fn type_mismatch<S: ToString>(expected: &'static str, found: S) -> Self {
        Self::TypeMismatch { expected, found: found.to_string() }
    }

    pub fn invalid_connection_state<S: ToString>(str: S) -> Self {
        Self::InvalidConnectionState { reason: str.to_string() }
    }

    pub fn invalid_data<S: ToString>(str: S) -> Self {
        Self::InvalidData { reason: str.to_string() }
    }
}

/// Failures of the receive/send primitives themselves.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("transport closed")]
    Closed,
}
