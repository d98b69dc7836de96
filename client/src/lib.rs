// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.

//! HTTP client for the ProjectFlow API with a per-resource query cache.
pub mod api;
pub mod cache;
pub mod error;

pub use api::ApiClient;
pub use cache::{KeyPart, Mutation, QueryCache, QueryKey};
pub use error::ClientError;
