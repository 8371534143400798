//! Access errors
//!
//! Every failure an entry point can report, each with a stable machine code
//! and a human message.

use thiserror::Error;

use crate::claims::ClaimsError;

/// Coarse failure class, used for transport status mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Input,
    Unauthenticated,
    Authorization,
    NotFound,
    Storage,
    Internal,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessError {
    #[error("Invalid token format provided.")]
    InvalidFormat,
    #[error("Token exceeds maximum allowed length.")]
    TokenTooLong,
    #[error("Failed to decode token.")]
    DecodeFailed,
    #[error("Invalid token data structure.")]
    MalformedClaims,
    #[error("Missing required token field: {0}")]
    MissingField(&'static str),
    #[error("Meeting token has expired.")]
    TokenExpired,
    #[error("Token is not valid for this site.")]
    InvalidSite,
    #[error("Booking not found.")]
    BookingNotFound,
    #[error("You do not have permission to access this meeting.")]
    AccessDenied,
    #[error("Meeting data not found.")]
    MeetingNotFound,
    #[error("This meeting link is not valid for your account. Please use the correct meeting link for your account.")]
    UserMismatch,
    #[error("You must be logged in to access this meeting. Please log in and try again.")]
    AuthenticationRequired,
    #[error("Meeting is only available for confirmed bookings.")]
    BookingNotConfirmed,
    #[error("Meeting will be available {lead_minutes} minutes before the scheduled time.")]
    MeetingNotAvailable { lead_minutes: i64 },
    #[error("This meeting has ended.")]
    MeetingEnded,
    #[error("Invalid booking ID provided.")]
    InvalidBookingId,
    #[error("Invalid user ID provided.")]
    InvalidUserId,
    #[error("Security verification failed. Please refresh the page and try again.")]
    NonceFailed,
    #[error("Unable to determine meeting status. Please try again later.")]
    StatusUnavailable,
    #[error("Failed to store meeting token.")]
    StorageFailed(String),
    #[error("An internal error occurred.")]
    Internal(String),
}

impl AccessError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidFormat => "invalid_token_format",
            Self::TokenTooLong => "token_too_long",
            Self::DecodeFailed => "token_decode_failed",
            Self::MalformedClaims => "invalid_token_data",
            Self::MissingField(_) => "missing_token_field",
            Self::TokenExpired => "token_expired",
            Self::InvalidSite => "invalid_site",
            Self::BookingNotFound => "booking_not_found",
            Self::AccessDenied => "access_denied",
            Self::MeetingNotFound => "meeting_not_found",
            Self::UserMismatch => "user_mismatch",
            Self::AuthenticationRequired => "authentication_required",
            Self::BookingNotConfirmed => "booking_not_confirmed",
            Self::MeetingNotAvailable { .. } => "meeting_not_available",
            Self::MeetingEnded => "meeting_ended",
            Self::InvalidBookingId => "invalid_booking_id",
            Self::InvalidUserId => "invalid_user_id",
            Self::NonceFailed => "nonce_failed",
            Self::StatusUnavailable => "status_error",
            Self::StorageFailed(_) => "token_storage_failed",
            Self::Internal(_) => "internal_error",
        }
    }

    /// Heading of the error page
    pub fn title(&self) -> &'static str {
        match self {
            Self::AuthenticationRequired => "Authentication Required",
            Self::UserMismatch | Self::AccessDenied => "Access Denied",
            Self::BookingNotFound | Self::MeetingNotFound => "Meeting Not Found",
            Self::StatusUnavailable => "Meeting Status Error",
            Self::StorageFailed(_) | Self::Internal(_) => "Something Went Wrong",
            _ => "Invalid Meeting Link",
        }
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            Self::InvalidFormat
            | Self::TokenTooLong
            | Self::DecodeFailed
            | Self::MalformedClaims
            | Self::MissingField(_)
            | Self::BookingNotConfirmed
            | Self::MeetingNotAvailable { .. }
            | Self::MeetingEnded
            | Self::InvalidBookingId
            | Self::InvalidUserId => ErrorClass::Input,
            Self::AuthenticationRequired => ErrorClass::Unauthenticated,
            Self::TokenExpired
            | Self::InvalidSite
            | Self::AccessDenied
            | Self::UserMismatch
            | Self::NonceFailed => ErrorClass::Authorization,
            Self::BookingNotFound | Self::MeetingNotFound => ErrorClass::NotFound,
            Self::StorageFailed(_) => ErrorClass::Storage,
            Self::StatusUnavailable | Self::Internal(_) => ErrorClass::Internal,
        }
    }
}

impl From<ClaimsError> for AccessError {
    fn from(err: ClaimsError) -> Self {
        match err {
            ClaimsError::TokenTooLong { .. } => Self::TokenTooLong,
            ClaimsError::DecodeFailed => Self::DecodeFailed,
            ClaimsError::MalformedClaims => Self::MalformedClaims,
            ClaimsError::MissingField(field) => Self::MissingField(field),
        }
    }
}

impl From<crate::Error> for AccessError {
    fn from(err: crate::Error) -> Self {
        match err {
            crate::Error::BookingNotFound(_) => Self::BookingNotFound,
            crate::Error::Storage(_) | crate::Error::Io(_) | crate::Error::Serialization(_) => {
                Self::StorageFailed(err.to_string())
            }
            crate::Error::NotFound(_) | crate::Error::InvalidInput(_) => {
                Self::Internal(err.to_string())
            }
        }
    }
}
