// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication and authorization failures.
//!
//! Every failure carries a fixed wire code and a literal description.
//! The HTTP status is decided in exactly one place, [`AuthError::status_code`].

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

/// Reasons an `Authorization` header or the token inside it was rejected
/// before its signature could be trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderFault {
    /// Scheme is not the literal `Bearer`.
    MissingBearerScheme,
    /// `Bearer` with nothing after it.
    TokenNotFound,
    /// More than two space-separated parts, or a non-ASCII header value.
    NotBearerToken,
    /// Token is not three segments, has no decodable header, or has no `kid`.
    Malformed,
    /// Payload or algorithm could not be accepted.
    Unparseable,
    /// No key in the signing key set matches the token's `kid`.
    NoMatchingKey,
}

impl HeaderFault {
    pub fn description(&self) -> &'static str {
        match self {
            HeaderFault::MissingBearerScheme => "Authorization header must start with \"Bearer\".",
            HeaderFault::TokenNotFound => "Token not found.",
            HeaderFault::NotBearerToken => "Authorization header must be bearer token.",
            HeaderFault::Malformed => "Authorization malformed.",
            HeaderFault::Unparseable => "Unable to parse authentication token.",
            HeaderFault::NoMatchingKey => "Unable to find the appropriate key.",
        }
    }
}

/// Authentication error type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// No authorization header present
    #[error("Authorization header is expected.")]
    MissingAuthHeader,
    /// Header or token structure rejected
    #[error("{}", .0.description())]
    InvalidHeader(HeaderFault),
    /// Token signature does not match the located key
    #[error("Token signature is invalid.")]
    InvalidSignature,
    /// `exp` is at or before the current time
    #[error("Token expired.")]
    TokenExpired,
    /// Issuer, audience or `nbf` did not validate
    #[error("Incorrect claims. Please, check the audience and issuer.")]
    IncorrectClaims,
    /// Token carries no `permissions` claim at all
    #[error("Permissions not included in JWT.")]
    PermissionsMissing,
    /// `permissions` claim lacks the required entry
    #[error("Permission not found.")]
    PermissionNotFound,
    /// Signing keys could not be fetched or parsed
    #[error("Unable to fetch signing keys.")]
    KeyFetch(String),
}

/// Wire body for every auth failure.
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthErrorBody {
    pub success: bool,
    pub code: String,
    pub description: String,
}

impl AuthError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingAuthHeader => "authorization_header_missing",
            AuthError::InvalidHeader(_) => "invalid_header",
            AuthError::InvalidSignature => "invalid_signature",
            AuthError::TokenExpired => "token_expired",
            AuthError::IncorrectClaims | AuthError::PermissionsMissing => "invalid_claims",
            AuthError::PermissionNotFound => "unauthorized",
            AuthError::KeyFetch(_) => "key_fetch_error",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MissingAuthHeader
            | AuthError::InvalidHeader(_)
            | AuthError::InvalidSignature
            | AuthError::TokenExpired
            | AuthError::IncorrectClaims
            | AuthError::KeyFetch(_) => StatusCode::UNAUTHORIZED,
            AuthError::PermissionsMissing => StatusCode::BAD_REQUEST,
            AuthError::PermissionNotFound => StatusCode::FORBIDDEN,
        }
    }

    pub fn body(&self) -> AuthErrorBody {
        AuthErrorBody {
            success: false,
            code: self.error_code().to_string(),
            description: self.to_string(),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self.body())).into_response()
    }
}
