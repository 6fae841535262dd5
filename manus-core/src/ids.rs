//! Client-side step identifiers.

use crate::StepId;
use chrono::Utc;

/// Generates `step-<millis>` identifiers from the wall clock.
///
/// Ids are strictly increasing for a single generator: when the clock has not
/// advanced (or went backwards) the previous value is bumped by one.
#[derive(Debug, Clone, Default)]
pub struct StepIdGenerator {
    last: i64,
}

impl StepIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&mut self) -> StepId {
        self.next_at(Utc::now().timestamp_millis())
    }

    pub fn next_at(&mut self, now_millis: i64) -> StepId {
        let value = if now_millis > self.last {
            now_millis
        } else {
            self.last + 1
        };
        self.last = value;
        format!("step-{}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_use_clock_when_it_advances() {
        let mut ids = StepIdGenerator::new();
        assert_eq!(ids.next_at(1_000), "step-1000");
        assert_eq!(ids.next_at(2_000), "step-2000");
    }

    #[test]
    fn ids_stay_unique_within_one_millisecond() {
        let mut ids = StepIdGenerator::new();
        let a = ids.next_at(5_000);
        let b = ids.next_at(5_000);
        let c = ids.next_at(4_999);
        assert_eq!(a, "step-5000");
        assert_eq!(b, "step-5001");
        assert_eq!(c, "step-5002");
    }
}
