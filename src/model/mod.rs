//! # Domain Model
//!
//! Wire payloads exchanged between the ride participants. Every payload is a
//! JSON object with PascalCase field names and a `Timestamp`; decoders ignore
//! fields they do not know.
//!
//! - [`ride`] - ride request and the dispatcher's response
//! - [`pickup`] - pickup request, completion and location notifications
//! - [`payment`] - payment request

pub mod payment;
pub mod pickup;
pub mod ride;

pub use payment::*;
pub use pickup::*;
pub use ride::*;

use std::fmt;

/// The five participant roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Requester,
    Dispatcher,
    Carrier,
    Settlement,
    Ledger,
}

impl Role {
    /// Tag used in logs and identities.
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Requester => "requester",
            Role::Dispatcher => "dispatcher",
            Role::Carrier => "carrier",
            Role::Settlement => "settlement",
            Role::Ledger => "ledger",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
