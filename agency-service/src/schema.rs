diesel::table! {
    agents (id) {
        id -> Uuid,
        name -> Varchar,
        surname -> Varchar,
        email -> Varchar,
        password_hash -> Varchar,
        created_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    customers (id) {
        id -> Uuid,
        name -> Varchar,
        surname -> Varchar,
        email -> Varchar,
        address -> Varchar,
        city -> Varchar,
        zip_code -> Varchar,
        country -> Varchar,
        created_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    cars (id) {
        id -> Uuid,
        brand -> Varchar,
        model -> Varchar,
        seats -> Int4,
        price_per_day -> Numeric,
        available -> Bool,
        created_at -> Nullable<Timestamptz>,
        updated_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    reservations (id) {
        id -> Uuid,
        customer_id -> Uuid,
        car_id -> Uuid,
        start_date -> Timestamptz,
        end_date -> Timestamptz,
        price -> Numeric,
        payment_status -> Varchar,
        payment_method -> Varchar,
        reservation_status -> Varchar,
        created_at -> Nullable<Timestamptz>,
    }
}

diesel::joinable!(reservations -> cars (car_id));
diesel::joinable!(reservations -> customers (customer_id));

diesel::allow_tables_to_appear_in_same_query!(
    agents,
    cars,
    customers,
    reservations,
);
