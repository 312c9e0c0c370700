//! Last-request-wins bookkeeping for asynchronous resolutions.
//!
//! Every resolution is issued with a ticket carrying a generation number.
//! Only the most recent ticket of each [`ResolutionKind`] is current; a
//! response for any older ticket is stale and must be dropped.

use std::collections::HashMap;

use chrono::NaiveDate;
use tracing::debug;

use super::resolver::{ConstraintResolver, ResolutionError, SubtypeResolution};
use crate::models::{Circuit, CustomerVendor, DocumentType, ResponsibilityCentre, TierType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResolutionKind {
    DocumentTypes,
    SubTypes,
    Circuits,
    CustomerVendors,
    Centres,
}

/// The inputs a resolution was issued for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResolutionKey {
    DocumentTypes,
    SubTypes { type_id: i64, date: NaiveDate },
    Circuits { type_id: i64 },
    CustomerVendors { tier: TierType },
    Centres,
}

impl ResolutionKey {
    pub fn kind(&self) -> ResolutionKind {
        match self {
            Self::DocumentTypes => ResolutionKind::DocumentTypes,
            Self::SubTypes { .. } => ResolutionKind::SubTypes,
            Self::Circuits { .. } => ResolutionKind::Circuits,
            Self::CustomerVendors { .. } => ResolutionKind::CustomerVendors,
            Self::Centres => ResolutionKind::Centres,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionTicket {
    pub key: ResolutionKey,
    pub generation: u64,
}

/// Issues tickets and remembers the current one per kind.
#[derive(Debug, Default)]
pub struct ResolutionTracker {
    next_generation: u64,
    current: HashMap<ResolutionKind, u64>,
}

impl ResolutionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a ticket for `key`, superseding any outstanding ticket of the
    /// same kind.
    pub fn issue(
        &mut self,
        key: ResolutionKey,
    ) -> ResolutionTicket {
        self.next_generation += 1;
        let generation = self.next_generation;
        self.current.insert(key.kind(), generation);
        ResolutionTicket { key, generation }
    }

    /// Make every outstanding ticket of `kind` stale.
    pub fn invalidate(
        &mut self,
        kind: ResolutionKind,
    ) {
        self.current.remove(&kind);
    }

    pub fn is_current(
        &self,
        ticket: &ResolutionTicket,
    ) -> bool {
        self.current.get(&ticket.key.kind()) == Some(&ticket.generation)
    }

    /// True while a ticket of `kind` has been issued and not yet settled.
    pub fn is_outstanding(
        &self,
        kind: ResolutionKind,
    ) -> bool {
        self.current.contains_key(&kind)
    }

    /// Retire `ticket` if it is current. Returns false for a stale ticket.
    pub fn settle(
        &mut self,
        ticket: &ResolutionTicket,
    ) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.current.remove(&ticket.key.kind());
        true
    }

    pub fn clear(&mut self) {
        self.current.clear();
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Requests and responses
// ─────────────────────────────────────────────────────────────────────────────

/// A resolution the controller wants performed. Running it needs no access
/// to the controller, so callers are free to await it however they like.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionRequest {
    ticket: ResolutionTicket,
}

impl ResolutionRequest {
    pub(crate) fn new(ticket: ResolutionTicket) -> Self {
        Self { ticket }
    }

    pub fn ticket(&self) -> &ResolutionTicket {
        &self.ticket
    }

    pub fn key(&self) -> &ResolutionKey {
        &self.ticket.key
    }

    pub fn kind(&self) -> ResolutionKind {
        self.ticket.key.kind()
    }

    /// Perform the lookup against `resolver`.
    pub async fn run(
        self,
        resolver: &dyn ConstraintResolver,
    ) -> ResolutionResponse {
        debug!(key = ?self.ticket.key, generation = self.ticket.generation, "running resolution");

        let result = match &self.ticket.key {
            ResolutionKey::DocumentTypes => resolver
                .document_types()
                .await
                .map(ResolutionPayload::DocumentTypes),
            ResolutionKey::SubTypes { type_id, date } => resolver
                .resolve_subtypes(*type_id, *date)
                .await
                .map(ResolutionPayload::SubTypes),
            ResolutionKey::Circuits { type_id } => resolver
                .resolve_circuits(*type_id)
                .await
                .map(ResolutionPayload::Circuits),
            ResolutionKey::CustomerVendors { tier } => resolver
                .resolve_customer_vendors(*tier)
                .await
                .map(ResolutionPayload::CustomerVendors),
            ResolutionKey::Centres => resolver
                .resolve_responsibility_centres()
                .await
                .map(ResolutionPayload::Centres),
        };

        ResolutionResponse {
            ticket: self.ticket,
            result,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionPayload {
    DocumentTypes(Vec<DocumentType>),
    SubTypes(SubtypeResolution),
    Circuits(Vec<Circuit>),
    CustomerVendors(Vec<CustomerVendor>),
    Centres(Vec<ResponsibilityCentre>),
}

#[derive(Debug)]
pub struct ResolutionResponse {
    pub ticket: ResolutionTicket,
    pub result: Result<ResolutionPayload, ResolutionError>,
}
