//! Domain factories for creating domain entities and value objects.

use super::{ConnectionId, error::ValueObjectError};

/// Factory for generating ConnectionId instances.
///
/// Connection ids are assigned by the server when a channel opens; clients
/// never choose their own.
pub struct ConnectionIdFactory;

impl ConnectionIdFactory {
    /// Generate a new ConnectionId with a random UUID v4.
    ///
    /// # Errors
    ///
    /// This method should not fail in practice, but returns Result for consistency
    /// with the domain error handling pattern.
    pub fn generate() -> Result<ConnectionId, ValueObjectError> {
        let uuid = uuid::Uuid::new_v4();
        ConnectionId::new(uuid.to_string())
    }
}
