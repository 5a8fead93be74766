//! In-memory events and ticket bookings.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use event_wire::{CreateEventRequest, Event, Ticket};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BookingError {
    #[error("event not found")]
    EventNotFound,
    #[error("not enough tickets available")]
    NotEnoughTickets,
}

#[derive(Default)]
struct Inner {
    /// Last identifier handed out, events and tickets draw from the same sequence.
    last_id: u64,
    events: BTreeMap<u64, Event>,
}

impl Inner {
    fn next_id(&mut self) -> u64 {
        self.last_id += 1;
        self.last_id
    }
}

#[derive(Clone, Default)]
pub struct TicketService {
    inner: Arc<Mutex<Inner>>,
}

impl TicketService {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn create_event(&self, request: CreateEventRequest) -> Event {
        let mut inner = self.lock();
        let id = inner.next_id();
        let event = Event {
            id: id.to_string(),
            name: request.name,
            date: request.date,
            total_tickets: request.total_tickets,
            available_tickets: request.total_tickets,
        };
        inner.events.insert(id, event.clone());
        event
    }

    /// All events ordered by identifier.
    #[must_use]
    pub fn list_events(&self) -> Vec<Event> {
        self.lock().events.values().cloned().collect()
    }

    /// Books `count` tickets of `event_id`, all or none.
    ///
    /// Only the exact ID string an event was created with matches it.
    pub fn book_tickets(&self, event_id: &str, count: u32) -> Result<Vec<Ticket>, BookingError> {
        let key = event_key(event_id).ok_or(BookingError::EventNotFound)?;
        let mut inner = self.lock();
        let available = inner
            .events
            .get(&key)
            .ok_or(BookingError::EventNotFound)?
            .available_tickets;
        if available < i64::from(count) {
            return Err(BookingError::NotEnoughTickets);
        }
        let tickets = (0..count)
            .map(|_| Ticket {
                id: inner.next_id().to_string(),
                event_id: event_id.to_owned(),
            })
            .collect();
        if let Some(event) = inner.events.get_mut(&key) {
            event.available_tickets -= i64::from(count);
        }
        Ok(tickets)
    }
}

fn event_key(event_id: &str) -> Option<u64> {
    let key: u64 = event_id.parse().ok()?;
    (key.to_string() == event_id).then_some(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gig(total_tickets: i64) -> CreateEventRequest {
        CreateEventRequest {
            total_tickets,
            ..CreateEventRequest::test_event()
        }
    }

    #[test]
    fn assigns_sequential_ids() {
        let service = TicketService::new();
        let first = service.create_event(gig(10));
        let second = service.create_event(gig(5));
        assert_eq!(first.id, "1");
        assert_eq!(second.id, "2");
        assert_eq!(second.available_tickets, 5);
    }

    #[test]
    fn lists_events_in_numeric_order() {
        let service = TicketService::new();
        for _ in 0..12 {
            service.create_event(gig(1));
        }
        let ids: Vec<String> = service.list_events().into_iter().map(|e| e.id).collect();
        let expected: Vec<String> = (1..=12).map(|i| i.to_string()).collect();
        assert_eq!(ids, expected);
    }

    #[test]
    fn booking_draws_ticket_ids_from_the_event_sequence() {
        let service = TicketService::new();
        let event = service.create_event(gig(3));
        let tickets = service.book_tickets(&event.id, 2).unwrap();
        assert_eq!(
            tickets,
            vec![
                Ticket {
                    id: "2".to_owned(),
                    event_id: "1".to_owned()
                },
                Ticket {
                    id: "3".to_owned(),
                    event_id: "1".to_owned()
                },
            ]
        );
        assert_eq!(service.list_events()[0].available_tickets, 1);
        assert_eq!(service.create_event(gig(1)).id, "4");
    }

    #[test]
    fn rejects_overbooking_without_side_effects() {
        let service = TicketService::new();
        let event = service.create_event(gig(2));
        assert_eq!(
            service.book_tickets(&event.id, 3),
            Err(BookingError::NotEnoughTickets)
        );
        assert_eq!(service.list_events()[0].available_tickets, 2);
        assert_eq!(service.book_tickets(&event.id, 2).unwrap().len(), 2);
        assert_eq!(
            service.book_tickets(&event.id, 1),
            Err(BookingError::NotEnoughTickets)
        );
    }

    #[test]
    fn unknown_events_are_not_found() {
        let service = TicketService::new();
        assert_eq!(
            service.book_tickets("1", 1),
            Err(BookingError::EventNotFound)
        );
        assert_eq!(
            service.book_tickets("abc", 1),
            Err(BookingError::EventNotFound)
        );
    }

    #[test]
    fn ids_must_match_exactly() {
        let service = TicketService::new();
        let event = service.create_event(gig(5));
        assert_eq!(event.id, "1");

        for alias in ["01", "+1", " 1", "1 "] {
            assert_eq!(
                service.book_tickets(alias, 1),
                Err(BookingError::EventNotFound),
                "{alias}"
            );
        }
        assert_eq!(service.list_events()[0].available_tickets, 5);
        assert_eq!(service.book_tickets("1", 1).unwrap().len(), 1);
    }
}
