//! JSON-RPC 2.0 front end for the Home Assistant operations.
//!
//! Every operation is exposed as `homeassistant.<operation>` and answers with
//! the Result Envelope. `RpcRouter::serve_lines` speaks newline-delimited
//! JSON over any async reader/writer pair, e.g. stdio.

pub mod protocol;
pub mod router;

pub use protocol::{
    INTERNAL_ERROR, INVALID_PARAMS, INVALID_REQUEST, JSONRPC_VERSION, JsonRpcError,
    JsonRpcRequest, JsonRpcResponse, METHOD_LIST, METHOD_NOT_FOUND, METHOD_PREFIX, PARSE_ERROR,
    method_name, operation_for,
};
pub use router::{RpcRouter, method_catalogue};
