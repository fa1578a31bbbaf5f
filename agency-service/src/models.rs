use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use shared::*;
use uuid::Uuid;

#[derive(Debug, Clone, Queryable)]
#[diesel(table_name = crate::schema::agents)]
pub struct DbAgent {
    pub id: Uuid,
    pub name: String,
    pub surname: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::schema::agents)]
pub struct NewDbAgent {
    pub id: Uuid,
    pub name: String,
    pub surname: String,
    pub email: String,
    pub password_hash: String,
}

#[derive(Debug, Clone, Queryable)]
#[diesel(table_name = crate::schema::customers)]
pub struct DbCustomer {
    pub id: Uuid,
    pub name: String,
    pub surname: String,
    pub email: String,
    pub address: String,
    pub city: String,
    pub zip_code: String,
    pub country: String,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::schema::customers)]
pub struct NewDbCustomer {
    pub id: Uuid,
    pub name: String,
    pub surname: String,
    pub email: String,
    pub address: String,
    pub city: String,
    pub zip_code: String,
    pub country: String,
}

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = crate::schema::cars)]
pub struct DbCar {
    pub id: Uuid,
    pub brand: String,
    pub model: String,
    pub seats: i32,
    pub price_per_day: BigDecimal,
    pub available: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::schema::cars)]
pub struct NewDbCar {
    pub id: Uuid,
    pub brand: String,
    pub model: String,
    pub seats: i32,
    pub price_per_day: BigDecimal,
    pub available: bool,
}

#[derive(Debug, Clone, Queryable)]
#[diesel(table_name = crate::schema::reservations)]
pub struct DbReservation {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub car_id: Uuid,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub price: BigDecimal,
    pub payment_status: String,
    pub payment_method: String,
    pub reservation_status: String,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::schema::reservations)]
pub struct NewDbReservation {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub car_id: Uuid,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub price: BigDecimal,
    pub payment_status: String,
    pub payment_method: String,
    pub reservation_status: String,
}

impl From<DbAgent> for Agent {
    fn from(row: DbAgent) -> Self {
        Self {
            id: row.id,
            name: row.name,
            surname: row.surname,
            email: row.email,
            password_hash: row.password_hash,
        }
    }
}

impl From<NewAgent> for NewDbAgent {
    fn from(agent: NewAgent) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: agent.name,
            surname: agent.surname,
            email: agent.email,
            password_hash: agent.password_hash,
        }
    }
}

impl From<DbCustomer> for Customer {
    fn from(row: DbCustomer) -> Self {
        Self {
            id: row.id,
            name: row.name,
            surname: row.surname,
            email: row.email,
            address: row.address,
            city: row.city,
            zip_code: row.zip_code,
            country: row.country,
        }
    }
}

impl From<NewCustomer> for NewDbCustomer {
    fn from(customer: NewCustomer) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: customer.name,
            surname: customer.surname,
            email: customer.email,
            address: customer.address,
            city: customer.city,
            zip_code: customer.zip_code,
            country: customer.country,
        }
    }
}

impl From<DbCar> for Car {
    fn from(row: DbCar) -> Self {
        Self {
            id: row.id,
            brand: row.brand,
            model: row.model,
            seats: row.seats,
            price_per_day: row.price_per_day,
            available: row.available,
        }
    }
}

impl From<NewCar> for NewDbCar {
    fn from(car: NewCar) -> Self {
        Self {
            id: Uuid::new_v4(),
            brand: car.brand,
            model: car.model,
            seats: car.seats,
            price_per_day: car.price_per_day,
            available: car.available,
        }
    }
}

impl From<DbReservation> for Reservation {
    fn from(row: DbReservation) -> Self {
        Self {
            id: row.id,
            customer_id: row.customer_id,
            car_id: row.car_id,
            start_date: row.start_date,
            end_date: row.end_date,
            price: row.price,
            payment_status: row.payment_status,
            payment_method: row.payment_method,
            reservation_status: row.reservation_status,
        }
    }
}

impl From<NewReservation> for NewDbReservation {
    fn from(reservation: NewReservation) -> Self {
        Self {
            id: Uuid::new_v4(),
            customer_id: reservation.customer_id,
            car_id: reservation.car_id,
            start_date: reservation.range.start(),
            end_date: reservation.range.end(),
            price: reservation.price,
            payment_status: reservation.payment_status,
            payment_method: reservation.payment_method,
            reservation_status: reservation.reservation_status,
        }
    }
}
