use std::sync::Arc;

use tracing::{debug, error};
use uuid::Uuid;

use crate::{Car, CarRepository, DateRange, ReservationRepository, StoreError};

/// Outcome of an availability check for one car and one date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    Available,
    NotFound,
    /// The car exists but an agent took it out of the bookable pool.
    MarkedUnavailable,
    /// The range collides with this existing reservation.
    Overlap(Uuid),
    /// The requested dates could not be parsed.
    MalformedRange,
}

impl Availability {
    pub fn is_available(&self) -> bool {
        matches!(self, Availability::Available)
    }

    pub fn reason(&self) -> Option<&'static str> {
        match self {
            Availability::Available => None,
            Availability::NotFound => Some("not_found"),
            Availability::MarkedUnavailable => Some("marked_unavailable"),
            Availability::Overlap(_) => Some("overlap"),
            Availability::MalformedRange => Some("malformed_range"),
        }
    }
}

#[derive(Clone)]
pub struct AvailabilityEngine {
    cars: Arc<dyn CarRepository>,
    reservations: Arc<dyn ReservationRepository>,
}

impl AvailabilityEngine {
    pub fn new(cars: Arc<dyn CarRepository>, reservations: Arc<dyn ReservationRepository>) -> Self {
        Self { cars, reservations }
    }

    /// Boolean form: anything but a clean `Available` is `false`, including
    /// unparseable dates and store errors.
    pub async fn is_available(&self, car_id: Uuid, start_date: &str, end_date: &str) -> bool {
        match self.check_raw(car_id, start_date, end_date).await {
            Ok(availability) => availability.is_available(),
            Err(e) => {
                error!(%car_id, "availability check failed: {}", e);
                false
            }
        }
    }

    pub async fn check_raw(
        &self,
        car_id: Uuid,
        start_date: &str,
        end_date: &str,
    ) -> Result<Availability, StoreError> {
        match DateRange::parse(start_date, end_date) {
            Ok(range) => self.check(car_id, &range).await,
            Err(e) => {
                debug!(%car_id, "rejecting malformed range: {}", e);
                Ok(Availability::MalformedRange)
            }
        }
    }

    pub async fn check(&self, car_id: Uuid, range: &DateRange) -> Result<Availability, StoreError> {
        match self.cars.find_by_id(car_id).await? {
            Some(car) => self.check_car(&car, range).await,
            None => Ok(Availability::NotFound),
        }
    }

    /// Checks an already-resolved car against its existing reservations.
    pub async fn check_car(&self, car: &Car, range: &DateRange) -> Result<Availability, StoreError> {
        if !car.available {
            return Ok(Availability::MarkedUnavailable);
        }

        let existing = self.reservations.find_by_car_id(car.id).await?;
        let clash = existing
            .iter()
            .find(|reservation| range.overlaps(&reservation.range()));

        Ok(match clash {
            Some(reservation) => Availability::Overlap(reservation.id),
            None => Availability::Available,
        })
    }
}
