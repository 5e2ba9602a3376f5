use chrono::{DateTime, Utc};

/// Issues clock-derived ids (epoch milliseconds as decimal strings).
///
/// Two calls inside the same millisecond, or a clock that steps backwards,
/// would repeat a value; the generator bumps such values past the last one
/// issued so ids stay unique within a store. Once the numeric range is
/// used up, ids fall back to random UUIDs.
#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    last: i64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make sure future ids sort after `id` when it is numeric.
    pub fn observe(&mut self, id: &str) {
        if let Ok(value) = id.parse::<i64>() {
            self.last = self.last.max(value);
        }
    }

    pub fn next_at(&mut self, now: DateTime<Utc>) -> String {
        let mut value = now.timestamp_millis();
        if value <= self.last {
            match self.last.checked_add(1) {
                Some(next) => value = next,
                None => return uuid::Uuid::new_v4().to_string(),
            }
        }
        self.last = value;
        value.to_string()
    }
}
