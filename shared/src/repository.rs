use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    Agent, Car, Customer, NewAgent, NewCar, NewCustomer, NewReservation, Reservation, StoreError,
};

#[async_trait]
pub trait AgentRepository: Send + Sync {
    /// Looks up an agent by login email.
    async fn find_by_email(&self, email: &str) -> Result<Option<Agent>, StoreError>;
    /// Stores a new agent. Fails with [`StoreError::Duplicate`] when the email is taken.
    async fn insert(&self, agent: NewAgent) -> Result<Agent, StoreError>;
}

#[async_trait]
pub trait CarRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Car>, StoreError>;
    async fn insert(&self, car: NewCar) -> Result<Car, StoreError>;
    async fn list(&self) -> Result<Vec<Car>, StoreError>;
    /// Flips the availability flag. Returns `None` when the car does not exist.
    async fn set_available(&self, id: Uuid, available: bool) -> Result<Option<Car>, StoreError>;
}

#[async_trait]
pub trait CustomerRepository: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Vec<Customer>, StoreError>;
    async fn insert(&self, customer: NewCustomer) -> Result<Customer, StoreError>;
}

#[async_trait]
pub trait ReservationRepository: Send + Sync {
    async fn find_by_car_id(&self, car_id: Uuid) -> Result<Vec<Reservation>, StoreError>;
    /// Persists a reservation. Implementations refuse the write with
    /// [`StoreError::Conflict`] if another reservation for the same car
    /// overlaps it at write time.
    async fn insert(&self, reservation: NewReservation) -> Result<Reservation, StoreError>;
}

pub trait PasswordVerifier: Send + Sync {
    fn verify(&self, password: &str, hash: &str) -> bool;
    fn hash(&self, password: &str) -> Result<String, StoreError>;
}
