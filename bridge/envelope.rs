use crate::error::App;
use crate::signals::{BackendError, Signal};
use serde::{Deserialize, Serialize};

/// Correlation id carried by a request and echoed by its response.
pub type RequestId = u64;

/// Id carried by signals the backend sends on its own.
pub const UNSOLICITED: RequestId = 0;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct RequestEnvelope {
    pub id: RequestId,
    pub name: String,
    pub payload: String,
}

impl RequestEnvelope {
    pub fn encode<S: Signal>(id: RequestId, signal: &S) -> Result<Self, App> {
        Ok(Self {
            id,
            name: S::NAME.to_string(),
            payload: serde_json::to_string(signal)?,
        })
    }

    pub fn decode<S: Signal>(&self) -> Result<S, App> {
        decode_named(S::NAME, &self.name, &self.payload)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ResponseEnvelope {
    pub id: RequestId,
    pub name: String,
    pub payload: String,
}

impl ResponseEnvelope {
    pub fn encode<S: Signal>(id: RequestId, signal: &S) -> Result<Self, App> {
        Ok(Self {
            id,
            name: S::NAME.to_string(),
            payload: serde_json::to_string(signal)?,
        })
    }

    pub fn unsolicited<S: Signal>(signal: &S) -> Result<Self, App> {
        Self::encode(UNSOLICITED, signal)
    }

    pub fn is_unsolicited(&self) -> bool {
        self.id == UNSOLICITED
    }

    pub fn decode<S: Signal>(&self) -> Result<S, App> {
        decode_named(S::NAME, &self.name, &self.payload)
    }

    /// Decodes the answer to a request, turning a `BackendError` into an
    /// error.
    pub fn into_response<S: Signal>(self) -> Result<S, App> {
        if self.name == BackendError::NAME {
            let error: BackendError = serde_json::from_str(&self.payload)?;
            return Err(App::Backend(error.message));
        }
        self.decode()
    }
}

fn decode_named<S: Signal>(expected: &'static str, name: &str, payload: &str) -> Result<S, App> {
    if name != expected {
        return Err(App::UnexpectedSignal {
            expected,
            received: name.to_string(),
        });
    }
    Ok(serde_json::from_str(payload)?)
}
