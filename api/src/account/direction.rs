//! The two directions an account can face.
//!
//! Payables and receivables share one state machine; what differs is the
//! number prefix, the name of the counterparty, and a handful of attributes
//! that only make sense on one side. Those differences live here.

use payloads::{AccountKind, PayableDetails, ReceivableDetails};
use serde::{Serialize, de::DeserializeOwned};
use std::fmt::Debug;

pub trait Direction:
    Debug + Clone + Copy + PartialEq + Eq + Send + Sync + 'static
{
    const KIND: AccountKind;

    /// Direction-specific attributes, copied verbatim onto successors.
    type Details: Debug
        + Clone
        + Default
        + PartialEq
        + Serialize
        + DeserializeOwned
        + Send
        + Sync
        + 'static;
}

/// Money owed by the operator to a supplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Payable;

/// Money owed to the operator by a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Receivable;

impl Direction for Payable {
    const KIND: AccountKind = AccountKind::Payable;
    type Details = PayableDetails;
}

impl Direction for Receivable {
    const KIND: AccountKind = AccountKind::Receivable;
    type Details = ReceivableDetails;
}
