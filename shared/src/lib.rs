use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use num_traits::Zero;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod availability;
pub mod credentials;
pub mod dates;
pub mod desk;
pub mod error;
pub mod memory;
pub mod repository;

pub use availability::{Availability, AvailabilityEngine};
pub use credentials::{BcryptVerifier, CredentialGate};
pub use dates::{days_between, reservation_price, DateRange};
pub use desk::RentalDesk;
pub use error::{AdmissionError, StoreError};
pub use memory::InMemoryStore;
pub use repository::*;

/// Agent credentials carried by every request that reaches the desk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Car {
    pub id: Uuid,
    pub brand: String,
    pub model: String,
    #[serde(rename = "numberOfSeat")]
    pub seats: i32,
    #[serde(rename = "pricePerDay")]
    pub price_per_day: BigDecimal,
    pub available: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCar {
    pub brand: String,
    pub model: String,
    #[serde(rename = "numberOfSeat")]
    pub seats: i32,
    #[serde(rename = "pricePerDay")]
    pub price_per_day: BigDecimal,
    #[serde(default = "default_available")]
    pub available: bool,
}

fn default_available() -> bool {
    true
}

impl NewCar {
    pub fn validate(&self) -> Result<(), AdmissionError> {
        if self.brand.trim().is_empty() {
            return Err(AdmissionError::invalid("brand must not be empty"));
        }
        if self.model.trim().is_empty() {
            return Err(AdmissionError::invalid("model must not be empty"));
        }
        if self.seats <= 0 {
            return Err(AdmissionError::invalid("numberOfSeat must be a positive integer"));
        }
        if self.price_per_day <= BigDecimal::zero() {
            return Err(AdmissionError::invalid("pricePerDay must be positive"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: Uuid,
    #[serde(rename = "userID")]
    pub customer_id: Uuid,
    #[serde(rename = "carID")]
    pub car_id: Uuid,
    #[serde(rename = "startDate")]
    pub start_date: DateTime<Utc>,
    #[serde(rename = "endDate")]
    pub end_date: DateTime<Utc>,
    pub price: BigDecimal,
    #[serde(rename = "paymentStatus")]
    pub payment_status: String,
    #[serde(rename = "paymentMethod")]
    pub payment_method: String,
    #[serde(rename = "ReservationStatus")]
    pub reservation_status: String,
}

impl Reservation {
    pub fn range(&self) -> DateRange {
        DateRange::new(self.start_date, self.end_date)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewReservation {
    pub customer_id: Uuid,
    pub car_id: Uuid,
    pub range: DateRange,
    pub price: BigDecimal,
    pub payment_status: String,
    pub payment_method: String,
    pub reservation_status: String,
}

/// Everything an agent submits to book a car for a customer.
#[derive(Debug, Clone)]
pub struct ReservationRequest {
    pub car_id: Uuid,
    pub customer_email: String,
    pub start_date: String,
    pub end_date: String,
    pub payment_status: String,
    pub payment_method: String,
    pub reservation_status: String,
}

impl ReservationRequest {
    /// Checks the raw fields and returns the parsed, normalized range.
    pub fn validate(&self) -> Result<DateRange, AdmissionError> {
        if self.customer_email.trim().is_empty() {
            return Err(AdmissionError::invalid("customerEmail must not be empty"));
        }
        for (field, value) in [
            ("paymentStatus", &self.payment_status),
            ("paymentMethod", &self.payment_method),
            ("ReservationStatus", &self.reservation_status),
        ] {
            if value.trim().is_empty() {
                return Err(AdmissionError::invalid(format!("{field} must not be empty")));
            }
        }

        let range = DateRange::parse(&self.start_date, &self.end_date)
            .map_err(|e| AdmissionError::invalid(e.to_string()))?;
        if range.is_empty() {
            return Err(AdmissionError::invalid(
                "startDate and endDate must not be the same instant",
            ));
        }
        Ok(range)
    }
}

/// Agent record as stored. The password hash never leaves the crate boundary
/// in a response; use [`AgentProfile`] for that.
#[derive(Debug, Clone)]
pub struct Agent {
    pub id: Uuid,
    pub name: String,
    pub surname: String,
    pub email: String,
    pub password_hash: String,
}

#[derive(Debug, Clone)]
pub struct NewAgent {
    pub name: String,
    pub surname: String,
    pub email: String,
    pub password_hash: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentRegistration {
    pub name: String,
    pub surname: String,
    pub email: String,
    pub password: String,
}

impl AgentRegistration {
    pub fn validate(&self) -> Result<(), AdmissionError> {
        if self.name.trim().is_empty() || self.surname.trim().is_empty() {
            return Err(AdmissionError::invalid("name and surname must not be empty"));
        }
        if !self.email.contains('@') {
            return Err(AdmissionError::invalid("email must be a valid address"));
        }
        if self.password.len() < 6 {
            return Err(AdmissionError::invalid(
                "password must be at least 6 characters long",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentProfile {
    pub id: Uuid,
    pub name: String,
    pub surname: String,
    pub email: String,
}

impl From<Agent> for AgentProfile {
    fn from(agent: Agent) -> Self {
        Self {
            id: agent.id,
            name: agent.name,
            surname: agent.surname,
            email: agent.email,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: Uuid,
    pub name: String,
    pub surname: String,
    pub email: String,
    pub address: String,
    pub city: String,
    pub zip_code: String,
    pub country: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCustomer {
    pub name: String,
    pub surname: String,
    pub email: String,
    pub address: String,
    pub city: String,
    pub zip_code: String,
    pub country: String,
}
