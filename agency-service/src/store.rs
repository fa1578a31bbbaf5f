use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel_async::pooled_connection::bb8::{Pool, PooledConnection};
use diesel_async::pooled_connection::PoolError;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use shared::*;
use uuid::Uuid;

use crate::models::*;
use crate::schema::*;

pub type DbPool = Pool<AsyncPgConnection>;

/// Postgres-backed implementation of every repository the desk needs.
#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

/// Failure inside the reservation write transaction.
#[derive(Debug)]
enum WriteError {
    Overlap,
    Diesel(DieselError),
}

impl From<DieselError> for WriteError {
    fn from(e: DieselError) -> Self {
        WriteError::Diesel(e)
    }
}

fn backend(e: DieselError) -> StoreError {
    StoreError::Backend(e.to_string())
}

fn pool_error(e: bb8::RunError<PoolError>) -> StoreError {
    StoreError::Backend(format!("connection pool: {}", e))
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn conn(&self) -> Result<PooledConnection<'_, AsyncPgConnection>, StoreError> {
        self.pool.get().await.map_err(pool_error)
    }
}

#[async_trait]
impl AgentRepository for PgStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<Agent>, StoreError> {
        let mut conn = self.conn().await?;
        let agent = agents::table
            .filter(agents::email.eq(email))
            .first::<DbAgent>(&mut conn)
            .await
            .optional()
            .map_err(backend)?;
        Ok(agent.map(Agent::from))
    }

    async fn insert(&self, agent: NewAgent) -> Result<Agent, StoreError> {
        let mut conn = self.conn().await?;
        let email = agent.email.clone();
        diesel::insert_into(agents::table)
            .values(&NewDbAgent::from(agent))
            .get_result::<DbAgent>(&mut conn)
            .await
            .map(Agent::from)
            .map_err(|e| match e {
                DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                    StoreError::Duplicate(email)
                }
                other => backend(other),
            })
    }
}

#[async_trait]
impl CarRepository for PgStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Car>, StoreError> {
        let mut conn = self.conn().await?;
        let car = cars::table
            .find(id)
            .first::<DbCar>(&mut conn)
            .await
            .optional()
            .map_err(backend)?;
        Ok(car.map(Car::from))
    }

    async fn insert(&self, car: NewCar) -> Result<Car, StoreError> {
        let mut conn = self.conn().await?;
        diesel::insert_into(cars::table)
            .values(&NewDbCar::from(car))
            .get_result::<DbCar>(&mut conn)
            .await
            .map(Car::from)
            .map_err(backend)
    }

    async fn list(&self) -> Result<Vec<Car>, StoreError> {
        let mut conn = self.conn().await?;
        let rows = cars::table
            .order(cars::created_at.asc())
            .load::<DbCar>(&mut conn)
            .await
            .map_err(backend)?;
        Ok(rows.into_iter().map(Car::from).collect())
    }

    async fn set_available(&self, id: Uuid, available: bool) -> Result<Option<Car>, StoreError> {
        let mut conn = self.conn().await?;
        let car = diesel::update(cars::table.find(id))
            .set((
                cars::available.eq(available),
                cars::updated_at.eq(Some(Utc::now())),
            ))
            .get_result::<DbCar>(&mut conn)
            .await
            .optional()
            .map_err(backend)?;
        Ok(car.map(Car::from))
    }
}

#[async_trait]
impl CustomerRepository for PgStore {
    async fn find_by_email(&self, email: &str) -> Result<Vec<Customer>, StoreError> {
        let mut conn = self.conn().await?;
        let rows = customers::table
            .filter(customers::email.eq(email))
            .order(customers::created_at.asc())
            .load::<DbCustomer>(&mut conn)
            .await
            .map_err(backend)?;
        Ok(rows.into_iter().map(Customer::from).collect())
    }

    async fn insert(&self, customer: NewCustomer) -> Result<Customer, StoreError> {
        let mut conn = self.conn().await?;
        diesel::insert_into(customers::table)
            .values(&NewDbCustomer::from(customer))
            .get_result::<DbCustomer>(&mut conn)
            .await
            .map(Customer::from)
            .map_err(backend)
    }
}

#[async_trait]
impl ReservationRepository for PgStore {
    async fn find_by_car_id(&self, car_id: Uuid) -> Result<Vec<Reservation>, StoreError> {
        let mut conn = self.conn().await?;
        let rows = reservations::table
            .filter(reservations::car_id.eq(car_id))
            .load::<DbReservation>(&mut conn)
            .await
            .map_err(backend)?;
        Ok(rows.into_iter().map(Reservation::from).collect())
    }

    /// Locks the car row, re-checks for an overlapping reservation and only
    /// then inserts, all in one transaction. Concurrent writers for the same
    /// car queue on the row lock, so the re-check always sees committed
    /// competitors.
    async fn insert(&self, reservation: NewReservation) -> Result<Reservation, StoreError> {
        let mut conn = self.conn().await?;
        let new_reservation = NewDbReservation::from(reservation);

        let result = conn
            .transaction::<_, WriteError, _>(|conn| {
                Box::pin(async move {
                    cars::table
                        .find(new_reservation.car_id)
                        .select(cars::id)
                        .for_update()
                        .first::<Uuid>(conn)
                        .await?;

                    // Inclusive overlap on ordered ranges.
                    let clashes = reservations::table
                        .filter(reservations::car_id.eq(new_reservation.car_id))
                        .filter(reservations::start_date.le(new_reservation.end_date))
                        .filter(reservations::end_date.ge(new_reservation.start_date))
                        .count()
                        .get_result::<i64>(conn)
                        .await?;
                    if clashes > 0 {
                        return Err(WriteError::Overlap);
                    }

                    let row = diesel::insert_into(reservations::table)
                        .values(&new_reservation)
                        .get_result::<DbReservation>(conn)
                        .await?;
                    Ok(row)
                })
            })
            .await;

        match result {
            Ok(row) => Ok(row.into()),
            Err(WriteError::Overlap) => Err(StoreError::Conflict),
            Err(WriteError::Diesel(e)) => Err(backend(e)),
        }
    }
}
