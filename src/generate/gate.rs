use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct Tickets {
    next: u64,
    serving: u64,
}

/// Admits one caller at a time, in arrival order.
///
/// Each caller draws a ticket and waits until that ticket is being served;
/// dropping the returned [`Permit`] hands the gate to the next ticket.
#[derive(Debug, Default)]
pub struct SingleFlight {
    tickets: Mutex<Tickets>,
    turn: Condvar,
}

impl SingleFlight {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Tickets> {
        // the counters stay consistent even if a holder panicked
        self.tickets.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn acquire(&self) -> Permit<'_> {
        let mut tickets = self.lock();
        let ticket = tickets.next;
        tickets.next += 1;
        while tickets.serving != ticket {
            tickets = self
                .turn
                .wait(tickets)
                .unwrap_or_else(PoisonError::into_inner);
        }
        Permit { gate: self }
    }

    /// Run `f` while holding the gate.
    pub fn run<T>(&self, f: impl FnOnce() -> T) -> T {
        let _permit = self.acquire();
        f()
    }

    /// Callers holding or waiting for the gate.
    pub fn pending(&self) -> u64 {
        let tickets = self.lock();
        tickets.next - tickets.serving
    }
}

#[must_use = "the gate is released as soon as the permit is dropped"]
pub struct Permit<'a> {
    gate: &'a SingleFlight,
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        let mut tickets = self.gate.lock();
        tickets.serving += 1;
        drop(tickets);
        self.gate.turn.notify_all();
    }
}
