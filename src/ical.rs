use chrono::Duration;
use icalendar::{Calendar, Component, Event, EventLike};

use crate::models::BookingView;

#[derive(Clone, Default)]
pub struct BookingExporter;

impl BookingExporter {
    pub fn new() -> Self {
        Self
    }

    /// Renders the caller's bookings as an iCalendar file. Bookings whose
    /// class reference dangles are skipped.
    pub fn generate(&self, bookings: &[BookingView]) -> Vec<u8> {
        if bookings.is_empty() {
            return Vec::new();
        }

        let mut calendar = Calendar::new();
        calendar.name("Gym Class Bookings");

        for view in bookings {
            let Some(class) = &view.class else { continue };

            let start = class.schedule;
            let end = class.schedule + Duration::minutes(class.duration as i64);

            let mut event = Event::new();
            event.summary(&format!("Gym class: {}", class.class_name));
            event.starts(start);
            event.ends(end);
            event.description(&format!(
                "Booked on {}\nTrainer: {}",
                view.booking.booking_date.format("%Y-%m-%d %H:%M"),
                class.trainer_id
            ));
            event.uid(&format!("{}-gym-booking", view.booking.id));
            calendar.push(event);
        }

        calendar.to_string().into_bytes()
    }
}
