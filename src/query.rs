//! Bookkeeping for queries awaiting a device response.
//!
//! Maestro responses carry no request tag, so at most one query of each
//! [`QueryKind`] may be outstanding. Every registered query gets a
//! monotonically increasing id; a response only completes the query whose id
//! it was issued with, so a response arriving after a timeout is dropped.

use crate::error::{Error, Result};
use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};

/// Kinds of query that can be in flight at the same time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKind {
    /// Capability dump issued during discovery.
    Capabilities,
    Version,
    Firmware,
    AnalogRead,
    DigitalRead,
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            QueryKind::Capabilities => "capability",
            QueryKind::Version => "version",
            QueryKind::Firmware => "firmware",
            QueryKind::AnalogRead => "analog read",
            QueryKind::DigitalRead => "digital read",
        };
        f.write_str(name)
    }
}

/// Raw response handed to a completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Reply {
    Script(Vec<u8>),
    Analog(u16),
    Digital(bool),
}

pub(crate) type Completion = Box<dyn FnOnce(Result<Reply>)>;

struct PendingQuery {
    id: u64,
    issued_at: Instant,
    complete: Completion,
}

#[derive(Default)]
pub(crate) struct PendingQueries {
    next_id: u64,
    in_flight: HashMap<QueryKind, PendingQuery>,
}

impl fmt::Debug for PendingQueries {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.in_flight.iter().map(|(kind, query)| (kind, query.id)))
            .finish()
    }
}

impl PendingQueries {
    /// Registers a query, returning its id.
    pub(crate) fn register(
        &mut self,
        kind: QueryKind,
        issued_at: Instant,
        complete: Completion,
    ) -> Result<u64> {
        if self.in_flight.contains_key(&kind) {
            return Err(Error::QueryInFlight(kind));
        }
        self.next_id += 1;
        let id = self.next_id;
        self.in_flight.insert(
            kind,
            PendingQuery {
                id,
                issued_at,
                complete,
            },
        );
        Ok(id)
    }

    /// Removes and returns the completion of query `id`, if it is still pending.
    pub(crate) fn take(&mut self, kind: QueryKind, id: u64) -> Option<Completion> {
        match self.in_flight.get(&kind) {
            Some(query) if query.id == id => self.in_flight.remove(&kind).map(|q| q.complete),
            _ => None,
        }
    }

    pub(crate) fn is_in_flight(&self, kind: QueryKind) -> bool {
        self.in_flight.contains_key(&kind)
    }

    pub(crate) fn len(&self) -> usize {
        self.in_flight.len()
    }

    /// Removes every query older than `timeout`.
    pub(crate) fn expire(
        &mut self,
        now: Instant,
        timeout: Duration,
    ) -> Vec<(QueryKind, Completion)> {
        let stale: Vec<QueryKind> = self
            .in_flight
            .iter()
            .filter(|(_, q)| now.saturating_duration_since(q.issued_at) >= timeout)
            .map(|(kind, _)| *kind)
            .collect();
        stale
            .into_iter()
            .filter_map(|kind| self.in_flight.remove(&kind).map(|q| (kind, q.complete)))
            .collect()
    }

    /// Removes every pending query.
    pub(crate) fn drain(&mut self) -> Vec<(QueryKind, Completion)> {
        self.in_flight
            .drain()
            .map(|(kind, q)| (kind, q.complete))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn recorder() -> (Rc<RefCell<Vec<String>>>, impl Fn() -> Completion) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let log2 = log.clone();
        let make = move || -> Completion {
            let log = log2.clone();
            Box::new(move |result: Result<Reply>| {
                let entry = format!("{:?}", result);
                log.borrow_mut().push(entry);
            })
        };
        (log, make)
    }

    #[test]
    fn test_one_query_per_kind() {
        let (_, make) = recorder();
        let mut pending = PendingQueries::default();
        let now = Instant::now();
        let first = pending.register(QueryKind::Version, now, make()).unwrap();
        assert!(matches!(
            pending.register(QueryKind::Version, now, make()),
            Err(Error::QueryInFlight(QueryKind::Version))
        ));
        let second = pending.register(QueryKind::Firmware, now, make()).unwrap();
        assert!(second > first);
        assert_eq!(pending.len(), 2);
    }

    #[test]
    fn test_take_checks_id() {
        let (log, make) = recorder();
        let mut pending = PendingQueries::default();
        let id = pending
            .register(QueryKind::AnalogRead, Instant::now(), make())
            .unwrap();
        assert!(pending.take(QueryKind::AnalogRead, id + 1).is_none());
        let complete = pending.take(QueryKind::AnalogRead, id).unwrap();
        complete(Ok(Reply::Analog(512)));
        assert_eq!(*log.borrow(), vec!["Ok(Analog(512))".to_string()]);
        assert!(pending.take(QueryKind::AnalogRead, id).is_none());
        assert!(!pending.is_in_flight(QueryKind::AnalogRead));
    }

    #[test]
    fn test_expire_only_stale_queries() {
        let (_, make) = recorder();
        let mut pending = PendingQueries::default();
        let start = Instant::now();
        pending.register(QueryKind::Version, start, make()).unwrap();
        pending
            .register(QueryKind::DigitalRead, start + Duration::from_millis(800), make())
            .unwrap();

        let timeout = Duration::from_millis(1000);
        let expired = pending.expire(start + timeout, timeout);
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].0, QueryKind::Version);
        assert!(pending.is_in_flight(QueryKind::DigitalRead));
        assert_eq!(pending.drain().len(), 1);
        assert_eq!(pending.len(), 0);
    }
}
