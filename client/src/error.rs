// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use std::error::Error;
use std::fmt;

#[derive(Debug)]
pub enum ClientError {
    /// The request never produced a response.
    Transport(reqwest::Error),
    /// The server answered with a non-success status.
    Api { status: u16, message: String },
    /// The response body did not have the expected shape.
    Decode(serde_json::Error),
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::Transport(err) => write!(f, "request failed: {}", err),
            ClientError::Api { status, message } => write!(f, "{}: {}", status, message),
            ClientError::Decode(err) => write!(f, "unexpected response body: {}", err),
        }
    }
}

impl Error for ClientError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ClientError::Transport(err) => Some(err),
            ClientError::Api { .. } => None,
            ClientError::Decode(err) => Some(err),
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Transport(err)
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Decode(err)
    }
}
