// Request sequencing - stale historical responses are recognised by ticket

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestTicket(u64);

impl RequestTicket {
    pub fn sequence(&self) -> u64 {
        self.0
    }
}

/// Monotonic counter bumped on every domain-object switch.
#[derive(Debug, Default)]
pub struct RequestSequencer {
    current: u64,
}

impl RequestSequencer {
    /// Issue a new ticket; every earlier ticket becomes stale.
    pub fn next(&mut self) -> RequestTicket {
        self.current = self.current.wrapping_add(1);
        RequestTicket(self.current)
    }

    pub fn is_current(&self, ticket: RequestTicket) -> bool {
        ticket.0 == self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_latest_ticket_is_current() {
        let mut sequencer = RequestSequencer::default();
        let first = sequencer.next();
        assert!(sequencer.is_current(first));

        let second = sequencer.next();
        assert!(!sequencer.is_current(first));
        assert!(sequencer.is_current(second));
        assert_eq!(second.sequence(), first.sequence() + 1);
    }
}
