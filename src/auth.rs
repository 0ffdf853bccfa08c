use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::AppError;
use crate::models::driver::Driver;
use crate::models::ride::Ride;

pub const CALLER_HEADER: &str = "x-caller-id";

/// The verified identity invoking an operation, carried in the `x-caller-id`
/// header. Identity verification itself is an external collaborator's job;
/// the engine only requires that every mutating call names who it acts as.
#[derive(Debug, Clone)]
pub struct CallerIdentity(pub String);

impl CallerIdentity {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for CallerIdentity
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let identity = parts
            .headers
            .get(CALLER_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| {
                AppError::Unauthorized(format!("missing {CALLER_HEADER} header"))
            })?;

        Ok(CallerIdentity(identity.to_string()))
    }
}

/// Caller must own the driver record.
pub fn require_driver_owner(driver: &Driver, caller: &CallerIdentity) -> Result<(), AppError> {
    if driver.owner != caller.0 {
        return Err(AppError::Unauthorized(format!(
            "caller does not own driver {}",
            driver.id
        )));
    }
    Ok(())
}

/// Caller must be the ride's original requester.
pub fn require_requester(ride: &Ride, caller: &CallerIdentity) -> Result<(), AppError> {
    if ride.requester != caller.0 {
        return Err(AppError::Unauthorized(format!(
            "caller did not request ride {}",
            ride.id
        )));
    }
    Ok(())
}

/// Caller must be the platform owner identity.
pub fn require_platform(platform_account: &str, caller: &CallerIdentity) -> Result<(), AppError> {
    if platform_account != caller.0 {
        return Err(AppError::Unauthorized(
            "caller is not the platform owner".to_string(),
        ));
    }
    Ok(())
}
