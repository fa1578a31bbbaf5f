use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    Agent, AgentRepository, Car, CarRepository, Customer, CustomerRepository, NewAgent, NewCar,
    NewCustomer, NewReservation, Reservation, ReservationRepository, StoreError,
};

#[derive(Default)]
struct Tables {
    agents: Vec<Agent>,
    cars: Vec<Car>,
    customers: Vec<Customer>,
    reservations: Vec<Reservation>,
}

/// Process-local store implementing every repository trait. Enforces the same
/// write-time guards as the Postgres store: unique agent emails and no
/// overlapping reservations per car.
#[derive(Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn reservation_count(&self) -> usize {
        self.tables.read().await.reservations.len()
    }
}

#[async_trait]
impl AgentRepository for InMemoryStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<Agent>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.agents.iter().find(|a| a.email == email).cloned())
    }

    async fn insert(&self, agent: NewAgent) -> Result<Agent, StoreError> {
        let mut tables = self.tables.write().await;
        if tables.agents.iter().any(|a| a.email == agent.email) {
            return Err(StoreError::Duplicate(agent.email));
        }
        let agent = Agent {
            id: Uuid::new_v4(),
            name: agent.name,
            surname: agent.surname,
            email: agent.email,
            password_hash: agent.password_hash,
        };
        tables.agents.push(agent.clone());
        Ok(agent)
    }
}

#[async_trait]
impl CarRepository for InMemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Car>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.cars.iter().find(|c| c.id == id).cloned())
    }

    async fn insert(&self, car: NewCar) -> Result<Car, StoreError> {
        let car = Car {
            id: Uuid::new_v4(),
            brand: car.brand,
            model: car.model,
            seats: car.seats,
            price_per_day: car.price_per_day,
            available: car.available,
        };
        self.tables.write().await.cars.push(car.clone());
        Ok(car)
    }

    async fn list(&self) -> Result<Vec<Car>, StoreError> {
        Ok(self.tables.read().await.cars.clone())
    }

    async fn set_available(&self, id: Uuid, available: bool) -> Result<Option<Car>, StoreError> {
        let mut tables = self.tables.write().await;
        Ok(tables.cars.iter_mut().find(|c| c.id == id).map(|car| {
            car.available = available;
            car.clone()
        }))
    }
}

#[async_trait]
impl CustomerRepository for InMemoryStore {
    async fn find_by_email(&self, email: &str) -> Result<Vec<Customer>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .customers
            .iter()
            .filter(|c| c.email == email)
            .cloned()
            .collect())
    }

    async fn insert(&self, customer: NewCustomer) -> Result<Customer, StoreError> {
        let customer = Customer {
            id: Uuid::new_v4(),
            name: customer.name,
            surname: customer.surname,
            email: customer.email,
            address: customer.address,
            city: customer.city,
            zip_code: customer.zip_code,
            country: customer.country,
        };
        self.tables.write().await.customers.push(customer.clone());
        Ok(customer)
    }
}

#[async_trait]
impl ReservationRepository for InMemoryStore {
    async fn find_by_car_id(&self, car_id: Uuid) -> Result<Vec<Reservation>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .reservations
            .iter()
            .filter(|r| r.car_id == car_id)
            .cloned()
            .collect())
    }

    async fn insert(&self, reservation: NewReservation) -> Result<Reservation, StoreError> {
        let mut tables = self.tables.write().await;
        let clash = tables
            .reservations
            .iter()
            .filter(|r| r.car_id == reservation.car_id)
            .any(|r| reservation.range.overlaps(&r.range()));
        if clash {
            return Err(StoreError::Conflict);
        }

        let reservation = Reservation {
            id: Uuid::new_v4(),
            customer_id: reservation.customer_id,
            car_id: reservation.car_id,
            start_date: reservation.range.start(),
            end_date: reservation.range.end(),
            price: reservation.price,
            payment_status: reservation.payment_status,
            payment_method: reservation.payment_method,
            reservation_status: reservation.reservation_status,
        };
        tables.reservations.push(reservation.clone());
        Ok(reservation)
    }
}
