//! # Request and Reply Payloads
//!
//! Domain management requests carry their arguments as NUL-separated
//! decimal strings. Replies are NUL-terminated strings.
//!
//! | Request | Arguments | Reply |
//! |---------|-----------|-------|
//! | `INTRODUCE` | domid, frame, port | `OK` |
//! | `RELEASE` | domid | `OK` |
//! | `RESUME` | domid | `OK` |
//! | `SET_TARGET` | domid, target | `OK` |
//! | `GET_DOMAIN_PATH` | domid | path |
//! | `IS_DOMAIN_INTRODUCED` | domid | `T` / `F` |
//! | `RESET_WATCHES` | none | `OK` |

use crate::domain::DomainError;
use serde::{Deserialize, Serialize};
use shared_types::{DomainId, Errno, EvtchnPort, FrameId};

// ============================================================
// INCOMING REQUESTS
// ============================================================

/// Domain management request types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestKind {
    Introduce,
    Release,
    Resume,
    SetTarget,
    GetDomainPath,
    IsDomainIntroduced,
    ResetWatches,
}

impl RequestKind {
    /// Message type code on the wire.
    pub const fn code(self) -> u32 {
        match self {
            RequestKind::Introduce => 8,
            RequestKind::Release => 9,
            RequestKind::GetDomainPath => 10,
            RequestKind::IsDomainIntroduced => 14,
            RequestKind::Resume => 18,
            RequestKind::SetTarget => 19,
            RequestKind::ResetWatches => 21,
        }
    }

    pub fn from_code(code: u32) -> Option<Self> {
        Some(match code {
            8 => RequestKind::Introduce,
            9 => RequestKind::Release,
            10 => RequestKind::GetDomainPath,
            14 => RequestKind::IsDomainIntroduced,
            18 => RequestKind::Resume,
            19 => RequestKind::SetTarget,
            21 => RequestKind::ResetWatches,
            _ => return None,
        })
    }

    pub const fn name(self) -> &'static str {
        match self {
            RequestKind::Introduce => "INTRODUCE",
            RequestKind::Release => "RELEASE",
            RequestKind::Resume => "RESUME",
            RequestKind::SetTarget => "SET_TARGET",
            RequestKind::GetDomainPath => "GET_DOMAIN_PATH",
            RequestKind::IsDomainIntroduced => "IS_DOMAIN_INTRODUCED",
            RequestKind::ResetWatches => "RESET_WATCHES",
        }
    }

    /// Whether the request is refused to read-only connections.
    pub const fn requires_write(self) -> bool {
        matches!(self, RequestKind::Introduce | RequestKind::SetTarget)
    }
}

/// A parsed domain management request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomainRequest {
    /// A port of zero or less parses as `EvtchnPort::UNBOUND`; the registry
    /// rejects it after checking write access.
    Introduce {
        domid: DomainId,
        frame: FrameId,
        port: EvtchnPort,
    },
    Release(DomainId),
    Resume(DomainId),
    SetTarget {
        domid: DomainId,
        target: DomainId,
    },
    GetDomainPath(DomainId),
    IsDomainIntroduced(DomainId),
    ResetWatches,
}

impl DomainRequest {
    /// Parse the payload of a `kind` request.
    ///
    /// Vector requests accept trailing extra arguments; single-argument
    /// requests need exactly one.
    pub fn parse(kind: RequestKind, payload: &[u8]) -> Result<Self, DomainError> {
        let request = match kind {
            RequestKind::Introduce => {
                let args = vector_args(payload, 3)?;
                DomainRequest::Introduce {
                    domid: parse_domid(args[0])?,
                    frame: FrameId(parse_number(args[1], "frame")?),
                    port: parse_port(args[2])?,
                }
            }
            RequestKind::SetTarget => {
                let args = vector_args(payload, 2)?;
                DomainRequest::SetTarget {
                    domid: parse_domid(args[0])?,
                    target: parse_domid(args[1])?,
                }
            }
            RequestKind::Release => DomainRequest::Release(nonzero_domid(payload)?),
            RequestKind::Resume => DomainRequest::Resume(nonzero_domid(payload)?),
            RequestKind::GetDomainPath => {
                DomainRequest::GetDomainPath(parse_domid(one_arg(payload)?)?)
            }
            RequestKind::IsDomainIntroduced => {
                DomainRequest::IsDomainIntroduced(parse_domid(one_arg(payload)?)?)
            }
            RequestKind::ResetWatches => DomainRequest::ResetWatches,
        };
        Ok(request)
    }

    /// Check only that a `kind` request carries enough arguments.
    pub fn check_arity(kind: RequestKind, payload: &[u8]) -> Result<(), DomainError> {
        match kind {
            RequestKind::Introduce => vector_args(payload, 3).map(drop),
            RequestKind::SetTarget => vector_args(payload, 2).map(drop),
            _ => Ok(()),
        }
    }

    pub fn kind(&self) -> RequestKind {
        match self {
            DomainRequest::Introduce { .. } => RequestKind::Introduce,
            DomainRequest::Release(_) => RequestKind::Release,
            DomainRequest::Resume(_) => RequestKind::Resume,
            DomainRequest::SetTarget { .. } => RequestKind::SetTarget,
            DomainRequest::GetDomainPath(_) => RequestKind::GetDomainPath,
            DomainRequest::IsDomainIntroduced(_) => RequestKind::IsDomainIntroduced,
            DomainRequest::ResetWatches => RequestKind::ResetWatches,
        }
    }
}

fn split_args(payload: &[u8]) -> Result<Vec<&str>, DomainError> {
    let body = payload.strip_suffix(&[0u8]).unwrap_or(payload);
    if body.is_empty() {
        return Ok(Vec::new());
    }
    body.split(|b| *b == 0)
        .map(|arg| {
            std::str::from_utf8(arg).map_err(|_| DomainError::invalid("argument is not UTF-8"))
        })
        .collect()
}

fn vector_args(payload: &[u8], needed: usize) -> Result<Vec<&str>, DomainError> {
    let args = split_args(payload)?;
    if args.len() < needed {
        return Err(DomainError::invalid(format!(
            "expected {needed} arguments, got {}",
            args.len()
        )));
    }
    Ok(args)
}

/// The single NUL-terminated argument of a one-argument request.
fn one_arg(payload: &[u8]) -> Result<&str, DomainError> {
    let Some(body) = payload.strip_suffix(&[0u8]) else {
        return Err(DomainError::invalid("argument is not NUL-terminated"));
    };
    if body.contains(&0) {
        return Err(DomainError::invalid("expected a single argument"));
    }
    std::str::from_utf8(body).map_err(|_| DomainError::invalid("argument is not UTF-8"))
}

fn nonzero_domid(payload: &[u8]) -> Result<DomainId, DomainError> {
    let domid = parse_domid(one_arg(payload)?)?;
    if domid == DomainId::CONTROL {
        return Err(DomainError::invalid("domain 0 cannot be released or resumed"));
    }
    Ok(domid)
}

fn parse_number<T: std::str::FromStr>(arg: &str, what: &str) -> Result<T, DomainError> {
    arg.parse()
        .map_err(|_| DomainError::invalid(format!("bad {what} {arg:?}")))
}

fn parse_domid(arg: &str) -> Result<DomainId, DomainError> {
    parse_number(arg, "domain id").map(DomainId)
}

fn parse_port(arg: &str) -> Result<EvtchnPort, DomainError> {
    let port: i64 = parse_number(arg, "port")?;
    if port <= 0 {
        return Ok(EvtchnPort::UNBOUND);
    }
    u32::try_from(port)
        .map(EvtchnPort)
        .map_err(|_| DomainError::invalid(format!("port {port} out of range")))
}

// ============================================================
// OUTGOING REPLIES
// ============================================================

/// Reply to a domain management request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DomainReply {
    Ack,
    Path(String),
    Bool(bool),
    Error(Errno),
}

impl DomainReply {
    /// NUL-terminated reply body.
    pub fn to_payload(&self) -> Vec<u8> {
        let mut out = match self {
            DomainReply::Ack => b"OK".to_vec(),
            DomainReply::Path(path) => path.as_bytes().to_vec(),
            DomainReply::Bool(true) => b"T".to_vec(),
            DomainReply::Bool(false) => b"F".to_vec(),
            DomainReply::Error(errno) => errno.name().as_bytes().to_vec(),
        };
        out.push(0);
        out
    }

    pub fn is_error(&self) -> bool {
        matches!(self, DomainReply::Error(_))
    }
}

impl From<DomainError> for DomainReply {
    fn from(err: DomainError) -> Self {
        DomainReply::Error(err.errno())
    }
}
