use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::OwnedMutexGuard;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    reservation_price, AdmissionError, AgentProfile, AgentRegistration, AgentRepository,
    Availability, AvailabilityEngine, Car, CarRepository, CredentialGate, Credentials, Customer,
    CustomerRepository, NewAgent, NewCar, NewReservation, PasswordVerifier, Reservation,
    ReservationRepository, ReservationRequest, StoreError,
};

/// One async mutex per car, so the car lookup, the availability check and
/// the reservation write for a given car never interleave inside this process.
/// Entries nobody holds or waits on are pruned on the next acquire, so the map
/// only tracks cars with admissions in flight.
#[derive(Default)]
struct CarLocks {
    locks: Mutex<HashMap<Uuid, Arc<tokio::sync::Mutex<()>>>>,
}

impl CarLocks {
    async fn acquire(&self, car_id: Uuid) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks.entry(car_id).or_default().clone()
        };
        lock.lock_owned().await
    }

    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

/// Entry point for every agent-facing operation: catalog management,
/// availability queries and reservation admission.
pub struct RentalDesk {
    gate: CredentialGate,
    engine: AvailabilityEngine,
    agents: Arc<dyn AgentRepository>,
    cars: Arc<dyn CarRepository>,
    customers: Arc<dyn CustomerRepository>,
    reservations: Arc<dyn ReservationRepository>,
    car_locks: CarLocks,
}

impl RentalDesk {
    pub fn new(
        agents: Arc<dyn AgentRepository>,
        cars: Arc<dyn CarRepository>,
        customers: Arc<dyn CustomerRepository>,
        reservations: Arc<dyn ReservationRepository>,
        verifier: Arc<dyn PasswordVerifier>,
    ) -> Self {
        Self {
            gate: CredentialGate::new(agents.clone(), verifier),
            engine: AvailabilityEngine::new(cars.clone(), reservations.clone()),
            agents,
            cars,
            customers,
            reservations,
            car_locks: CarLocks::default(),
        }
    }

    /// Builds a desk whose four repositories are all served by one store.
    pub fn with_store<S>(store: Arc<S>, verifier: Arc<dyn PasswordVerifier>) -> Self
    where
        S: AgentRepository
            + CarRepository
            + CustomerRepository
            + ReservationRepository
            + 'static,
    {
        Self::new(
            store.clone(),
            store.clone(),
            store.clone(),
            store,
            verifier,
        )
    }

    pub async fn add_car(&self, credentials: &Credentials, car: NewCar) -> Result<Car, AdmissionError> {
        car.validate()?;
        self.gate.authorize(credentials).await?;

        let car = self.cars.insert(car).await.map_err(AdmissionError::storage)?;
        info!(car_id = %car.id, brand = %car.brand, model = %car.model, "car added to catalog");
        Ok(car)
    }

    pub async fn list_catalog(&self, credentials: &Credentials) -> Result<Vec<Car>, AdmissionError> {
        self.gate.authorize(credentials).await?;
        self.cars.list().await.map_err(AdmissionError::storage)
    }

    pub async fn set_car_availability(
        &self,
        credentials: &Credentials,
        car_id: Uuid,
        available: bool,
    ) -> Result<Car, AdmissionError> {
        self.gate.authorize(credentials).await?;

        let _guard = self.car_locks.acquire(car_id).await;
        let car = self
            .cars
            .set_available(car_id, available)
            .await
            .map_err(AdmissionError::storage)?
            .ok_or(AdmissionError::CarNotFound)?;
        info!(%car_id, available, "car availability changed");
        Ok(car)
    }

    /// Unauthenticated boolean check, kept for callers that only need yes/no.
    pub async fn is_available(&self, car_id: Uuid, start_date: &str, end_date: &str) -> bool {
        self.engine.is_available(car_id, start_date, end_date).await
    }

    pub async fn check_availability(
        &self,
        credentials: &Credentials,
        car_id: Uuid,
        start_date: &str,
        end_date: &str,
    ) -> Result<Availability, AdmissionError> {
        self.gate.authorize(credentials).await?;
        self.engine
            .check_raw(car_id, start_date, end_date)
            .await
            .map_err(AdmissionError::storage)
    }

    pub async fn lookup_customer(
        &self,
        credentials: &Credentials,
        customer_email: &str,
    ) -> Result<Vec<Customer>, AdmissionError> {
        self.gate.authorize(credentials).await?;

        let customers = self
            .customers
            .find_by_email(customer_email)
            .await
            .map_err(AdmissionError::storage)?;
        if customers.is_empty() {
            return Err(AdmissionError::CustomerNotFound);
        }
        Ok(customers)
    }

    pub async fn register_agent(
        &self,
        credentials: &Credentials,
        registration: AgentRegistration,
    ) -> Result<AgentProfile, AdmissionError> {
        registration.validate()?;
        self.gate.authorize(credentials).await?;

        let password_hash = self.gate.hash_password(&registration.password).await?;
        let agent = self
            .agents
            .insert(NewAgent {
                name: registration.name,
                surname: registration.surname,
                email: registration.email,
                password_hash,
            })
            .await
            .map_err(|e| match e {
                StoreError::Duplicate(email) => {
                    AdmissionError::invalid(format!("an agent with email {email} already exists"))
                }
                other => AdmissionError::storage(other),
            })?;
        info!(agent_id = %agent.id, registered_by = %credentials.email, "agent registered");
        Ok(agent.into())
    }

    /// Admits a reservation: validation, agent authorization, customer and
    /// car resolution, availability, pricing, then a single write.
    pub async fn create_reservation(
        &self,
        credentials: &Credentials,
        request: ReservationRequest,
    ) -> Result<Reservation, AdmissionError> {
        let range = request.validate()?;
        self.gate.authorize(credentials).await?;

        let customer = self
            .customers
            .find_by_email(&request.customer_email)
            .await
            .map_err(AdmissionError::storage)?
            .into_iter()
            .next()
            .ok_or_else(|| {
                warn!(email = %request.customer_email, "reservation for unknown customer");
                AdmissionError::CustomerNotFound
            })?;

        let _guard = self.car_locks.acquire(request.car_id).await;

        let car = self
            .cars
            .find_by_id(request.car_id)
            .await
            .map_err(AdmissionError::storage)?
            .ok_or_else(|| {
                warn!(car_id = %request.car_id, "reservation for unknown car");
                AdmissionError::CarNotFound
            })?;

        let availability = self
            .engine
            .check_car(&car, &range)
            .await
            .map_err(AdmissionError::storage)?;
        if !availability.is_available() {
            warn!(car_id = %car.id, reason = ?availability.reason(), "car unavailable");
            return Err(AdmissionError::CarUnavailable);
        }

        let price = reservation_price(range.days(), &car.price_per_day);
        let reservation = self
            .reservations
            .insert(NewReservation {
                customer_id: customer.id,
                car_id: car.id,
                range,
                price,
                payment_status: request.payment_status,
                payment_method: request.payment_method,
                reservation_status: request.reservation_status,
            })
            .await
            .map_err(|e| match e {
                StoreError::Conflict => {
                    warn!(car_id = %car.id, "overlap detected at write time");
                    AdmissionError::CarUnavailable
                }
                other => AdmissionError::storage(other),
            })?;

        info!(
            reservation_id = %reservation.id,
            car_id = %car.id,
            customer_id = %customer.id,
            price = %reservation.price,
            "reservation created"
        );
        Ok(reservation)
    }
}
