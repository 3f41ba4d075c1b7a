use crate::error::KrbError;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{trace, warn};

/// Seconds per unit of a linear lifetime code.
pub const LIFETIME_LINEAR_UNIT: u64 = 300;

const LIFETIME_LINEAR_MAX: u64 = 127;
const LIFETIME_TABLE_BASE: u8 = 128;

/// Lifetimes beyond the linear range are looked up in this table, where entry `i`
/// is `38400 * 1.06914489^i` seconds rounded. Legacy services decode by index,
/// so these must never change.
pub const LIFETIME_TABLE: [u64; 64] = [
    38400, 41055, 43894, 46929, 50174, 53643, 57352, 61318, //
    65558, 70091, 74937, 80119, 85658, 91581, 97914, 104684, //
    111922, 119661, 127935, 136781, 146239, 156350, 167161, 178720, //
    191077, 204289, 218415, 233517, 249663, 266926, 285383, 305116, //
    326213, 348769, 372885, 398668, 426233, 455705, 487215, 520903, //
    556921, 595430, 636600, 680618, 727679, 777995, 831789, 889303, //
    950794, 1016536, 1086825, 1161973, 1242317, 1328217, 1420057, 1518246, //
    1623225, 1735463, 1855462, 1983757, 2120924, 2267575, 2424366, 2591999, //
];

/// The largest code a legacy service can decode.
pub const LIFETIME_CODE_MAX: u8 = LIFETIME_TABLE_BASE + (LIFETIME_TABLE.len() as u8 - 1);

/// A single byte legacy lifetime. Codes below 128 count five minute units, codes
/// from 128 index into [`LIFETIME_TABLE`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LifetimeCode(u8);

impl LifetimeCode {
    /// Encode a remaining lifetime, rounding down in the linear range and up to the
    /// next table threshold above it.
    pub fn from_remaining(remaining: Duration) -> Self {
        let secs = remaining.as_secs();
        let linear = secs / LIFETIME_LINEAR_UNIT;

        if linear <= LIFETIME_LINEAR_MAX {
            return LifetimeCode(linear as u8);
        }

        match LIFETIME_TABLE.iter().position(|threshold| *threshold >= secs) {
            Some(idx) => LifetimeCode(LIFETIME_TABLE_BASE + idx as u8),
            None => {
                warn!(
                    remaining = secs,
                    "remaining lifetime exceeds the legacy lifetime table, clamping"
                );
                LifetimeCode(LIFETIME_CODE_MAX)
            }
        }
    }

    pub fn from_byte(code: u8) -> Self {
        LifetimeCode(code)
    }

    pub fn as_byte(self) -> u8 {
        self.0
    }

    pub fn is_linear(self) -> bool {
        self.0 < LIFETIME_TABLE_BASE
    }

    /// The lifetime a legacy service grants for this code. Codes past the table
    /// end are treated as the table's last entry.
    pub fn duration(self) -> Duration {
        if self.is_linear() {
            return Duration::from_secs(self.0 as u64 * LIFETIME_LINEAR_UNIT);
        }

        let idx = ((self.0 - LIFETIME_TABLE_BASE) as usize).min(LIFETIME_TABLE.len() - 1);
        Duration::from_secs(LIFETIME_TABLE[idx])
    }
}

impl From<LifetimeCode> for u8 {
    fn from(code: LifetimeCode) -> u8 {
        code.0
    }
}

impl From<u8> for LifetimeCode {
    fn from(code: u8) -> Self {
        LifetimeCode(code)
    }
}

/// The times from a modern ticket that bound when it may be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidityWindow {
    pub auth_time: SystemTime,
    pub start_time: Option<SystemTime>,
    pub end_time: SystemTime,
}

impl ValidityWindow {
    pub fn new(auth_time: SystemTime, start_time: Option<SystemTime>, end_time: SystemTime) -> Self {
        ValidityWindow {
            auth_time,
            start_time,
            end_time,
        }
    }

    /// The start time, falling back to the auth time when it is absent or zero.
    pub fn effective_start(&self) -> SystemTime {
        match self.start_time {
            Some(start) if start != UNIX_EPOCH => start,
            _ => self.auth_time,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeBoundError {
    NotYetValid,
    Expired,
    /// The current time is before the epoch.
    TimeMachine,
}

impl From<TimeBoundError> for KrbError {
    fn from(err: TimeBoundError) -> Self {
        match err {
            TimeBoundError::NotYetValid => KrbError::TicketNotYetValid,
            TimeBoundError::Expired => KrbError::TicketExpired,
            TimeBoundError::TimeMachine => KrbError::DoYouHaveATimeMachine,
        }
    }
}

/// The outcome of checking a modern ticket's window against the current time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LegacyTimeBound {
    lifetime: LifetimeCode,
    remaining: Duration,
    issue_time: u64,
}

impl LegacyTimeBound {
    pub fn lifetime(&self) -> LifetimeCode {
        self.lifetime
    }

    /// The validity left to the ticket, measured from the earliest time `now`
    /// could be given the allowed clock skew.
    pub fn remaining(&self) -> Duration {
        self.remaining
    }

    /// The current time in whole seconds since the epoch.
    pub fn issue_time(&self) -> u64 {
        self.issue_time
    }

    pub fn evaluate(
        window: &ValidityWindow,
        current_time: SystemTime,
        clock_skew: Duration,
    ) -> Result<Self, TimeBoundError> {
        let now = current_time
            .duration_since(UNIX_EPOCH)
            .map_err(|_| TimeBoundError::TimeMachine)?
            .as_secs() as i128;
        let skew = clock_skew.as_secs() as i128;
        let start = unix_secs(window.effective_start());
        let end = unix_secs(window.end_time);

        trace!(%now, %skew, %start, %end, "evaluating ticket window");

        let earliest_now = now - skew;
        let latest_now = now + skew;

        if latest_now < start {
            return Err(TimeBoundError::NotYetValid);
        }
        if earliest_now > end {
            return Err(TimeBoundError::Expired);
        }

        let remaining = Duration::from_secs((end - earliest_now) as u64);

        Ok(LegacyTimeBound {
            lifetime: LifetimeCode::from_remaining(remaining),
            remaining,
            issue_time: now as u64,
        })
    }
}

// Times before the epoch are only reachable through a hand built window.
fn unix_secs(time: SystemTime) -> i128 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_secs() as i128,
        Err(e) => -(e.duration().as_secs() as i128),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SKEW: Duration = Duration::from_secs(300);

    fn at(secs: u64) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(secs)
    }

    fn window(start: u64, end: u64) -> ValidityWindow {
        ValidityWindow::new(at(start), Some(at(start)), at(end))
    }

    #[test]
    fn lifetime_table_is_ascending() {
        assert!(LIFETIME_TABLE.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(LIFETIME_TABLE[0], 38400);
        assert_eq!(LIFETIME_TABLE[63], 2591999);
        assert_eq!(LIFETIME_CODE_MAX, 191);
    }

    #[test]
    fn lifetime_linear_range() {
        for secs in [0, 1, 299, 300, 301, 3600, 36000, 127 * 300, 127 * 300 + 299] {
            let code = LifetimeCode::from_remaining(Duration::from_secs(secs));
            assert!(code.is_linear());
            assert_eq!(code.as_byte() as u64, secs / 300);
            let decoded = code.duration().as_secs();
            assert!(decoded <= secs);
            assert!(decoded + 300 > secs);
        }
    }

    #[test]
    fn lifetime_table_range() {
        // First value past the linear range.
        let code = LifetimeCode::from_remaining(Duration::from_secs(128 * 300));
        assert_eq!(code.as_byte(), 128);

        // Exactly on a threshold selects that threshold.
        for (i, threshold) in LIFETIME_TABLE.iter().enumerate() {
            let code = LifetimeCode::from_remaining(Duration::from_secs(*threshold));
            assert_eq!(code.as_byte(), 128 + i as u8);
            assert_eq!(code.duration().as_secs(), *threshold);
        }

        // Just above a threshold moves to the next one.
        let code = LifetimeCode::from_remaining(Duration::from_secs(38401));
        assert_eq!(code.as_byte(), 129);

        // One day.
        let code = LifetimeCode::from_remaining(Duration::from_secs(86400));
        assert_eq!(code.as_byte(), 128 + 13);
        assert_eq!(code.duration().as_secs(), 91581);
    }

    #[test]
    fn lifetime_overflow_clamps() {
        let code = LifetimeCode::from_remaining(Duration::from_secs(2591999 + 1));
        assert_eq!(code.as_byte(), LIFETIME_CODE_MAX);

        let code = LifetimeCode::from_remaining(Duration::from_secs(u32::MAX as u64 * 4));
        assert_eq!(code.as_byte(), LIFETIME_CODE_MAX);

        assert_eq!(
            LifetimeCode::from_byte(255).duration(),
            Duration::from_secs(2591999)
        );
    }

    #[test]
    fn time_bound_within_window() {
        let w = window(1_000_000, 1_036_000);

        let bound = LegacyTimeBound::evaluate(&w, at(1_000_000), SKEW).unwrap();
        // 10 hours plus the skew.
        assert_eq!(bound.remaining(), Duration::from_secs(36_300));
        assert_eq!(bound.lifetime().as_byte(), 121);
        assert_eq!(bound.issue_time(), 1_000_000);
    }

    #[test]
    fn time_bound_boundaries() {
        let w = window(1_000_000, 1_036_000);

        // Just inside the expiry tolerance.
        let bound = LegacyTimeBound::evaluate(&w, at(1_036_000 - 300 - 1), SKEW).unwrap();
        assert_eq!(bound.remaining(), Duration::from_secs(601));
        assert_eq!(bound.lifetime().as_byte(), 2);

        // Inside the tolerance past the end time.
        let bound = LegacyTimeBound::evaluate(&w, at(1_036_000 + 300), SKEW).unwrap();
        assert_eq!(bound.remaining(), Duration::ZERO);
        assert_eq!(bound.lifetime().as_byte(), 0);

        assert_eq!(
            LegacyTimeBound::evaluate(&w, at(1_036_000 + 300 + 1), SKEW),
            Err(TimeBoundError::Expired)
        );

        assert!(LegacyTimeBound::evaluate(&w, at(1_000_000 - 300), SKEW).is_ok());
        assert_eq!(
            LegacyTimeBound::evaluate(&w, at(1_000_000 - 300 - 1), SKEW),
            Err(TimeBoundError::NotYetValid)
        );
    }

    #[test]
    fn time_bound_missing_start_uses_auth_time() {
        let w = ValidityWindow::new(at(2_000_000), None, at(2_100_000));
        assert_eq!(w.effective_start(), at(2_000_000));
        assert_eq!(
            LegacyTimeBound::evaluate(&w, at(1_999_000), SKEW),
            Err(TimeBoundError::NotYetValid)
        );

        let w = ValidityWindow::new(at(2_000_000), Some(UNIX_EPOCH), at(2_100_000));
        assert_eq!(w.effective_start(), at(2_000_000));

        let w = ValidityWindow::new(at(2_000_000), Some(at(2_050_000)), at(2_100_000));
        assert_eq!(w.effective_start(), at(2_050_000));
        assert_eq!(
            LegacyTimeBound::evaluate(&w, at(2_010_000), SKEW),
            Err(TimeBoundError::NotYetValid)
        );
    }

    #[test]
    fn time_bound_long_ticket_uses_table() {
        let w = window(1_000_000, 1_000_000 + 7 * 86400);
        let bound = LegacyTimeBound::evaluate(&w, at(1_000_000), Duration::ZERO).unwrap();
        assert_eq!(bound.remaining(), Duration::from_secs(604800));
        // 595430 < 604800 <= 636600
        assert_eq!(bound.lifetime().as_byte(), 128 + 42);
    }

    #[test]
    fn time_bound_errors_convert() {
        assert_eq!(
            KrbError::from(TimeBoundError::NotYetValid),
            KrbError::TicketNotYetValid
        );
        assert_eq!(KrbError::from(TimeBoundError::Expired), KrbError::TicketExpired);
    }
}
