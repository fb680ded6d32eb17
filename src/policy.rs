//! Pure admission decisions for schedules and bookings. No I/O, no clock;
//! callers gather the counts and lookups, the policy only decides.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleDecision {
    Admit,
    RejectDayFull,
    RejectDuplicate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingDecision {
    Admit,
    RejectAlreadyBooked,
    RejectClassFull,
}

#[derive(Debug, Clone, Copy)]
pub struct CapacityPolicy {
    /// Maximum bookings per class.
    pub class_capacity: u32,
    /// Maximum classes per calendar day.
    pub daily_class_limit: u32,
}

impl CapacityPolicy {
    pub fn new(class_capacity: u32, daily_class_limit: u32) -> Self {
        Self {
            class_capacity,
            daily_class_limit,
        }
    }

    /// Day-capacity check first, then the exact-duplicate check.
    pub fn can_schedule(&self, same_day_count: u32, exact_duplicate: bool) -> ScheduleDecision {
        if same_day_count >= self.daily_class_limit {
            ScheduleDecision::RejectDayFull
        } else if exact_duplicate {
            ScheduleDecision::RejectDuplicate
        } else {
            ScheduleDecision::Admit
        }
    }

    /// Duplicate check first, then the capacity check.
    pub fn can_book(&self, already_booked: bool, class_booking_count: u32) -> BookingDecision {
        if already_booked {
            BookingDecision::RejectAlreadyBooked
        } else if class_booking_count >= self.class_capacity {
            BookingDecision::RejectClassFull
        } else {
            BookingDecision::Admit
        }
    }
}

impl Default for CapacityPolicy {
    fn default() -> Self {
        Self::new(10, 5)
    }
}
