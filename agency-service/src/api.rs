use std::sync::Arc;

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, FromRequestParts, Path, Request, State},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, patch, post},
    Router,
};
use serde::{Deserialize, Serialize};
use shared::*;
use tower_http::{cors, trace::TraceLayer};
use uuid::Uuid;

#[derive(Clone)]
pub struct AppState {
    pub desk: Arc<RentalDesk>,
}

#[derive(Debug, Deserialize)]
pub struct AddCarRequest {
    #[serde(flatten)]
    pub credentials: Credentials,
    #[serde(flatten)]
    pub car: NewCar,
}

#[derive(Debug, Deserialize)]
pub struct SetAvailabilityRequest {
    #[serde(flatten)]
    pub credentials: Credentials,
    pub available: bool,
}

#[derive(Debug, Deserialize)]
pub struct CreateReservationRequest {
    #[serde(flatten)]
    pub credentials: Credentials,
    #[serde(rename = "carID")]
    pub car_id: Uuid,
    #[serde(rename = "customerEmail")]
    pub customer_email: String,
    #[serde(rename = "startDate")]
    pub start_date: String,
    #[serde(rename = "endDate")]
    pub end_date: String,
    #[serde(rename = "paymentStatus")]
    pub payment_status: String,
    #[serde(rename = "paymentMethod")]
    pub payment_method: String,
    #[serde(rename = "ReservationStatus")]
    pub reservation_status: String,
}

#[derive(Debug, Deserialize)]
pub struct AvailabilityRequest {
    #[serde(flatten)]
    pub credentials: Credentials,
    #[serde(rename = "carID")]
    pub car_id: Uuid,
    #[serde(rename = "startDate")]
    pub start_date: String,
    #[serde(rename = "endDate")]
    pub end_date: String,
}

#[derive(Debug, Serialize)]
pub struct AvailabilityResponse {
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'static str>,
    #[serde(rename = "conflictingReservation", skip_serializing_if = "Option::is_none")]
    pub conflicting_reservation: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct RegisterAgentRequest {
    #[serde(flatten)]
    pub credentials: Credentials,
    #[serde(rename = "newAgent")]
    pub agent: AgentRegistration,
}

#[derive(Debug, Deserialize)]
pub struct LookupCustomerRequest {
    #[serde(flatten)]
    pub credentials: Credentials,
    #[serde(rename = "customerEmail")]
    pub customer_email: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: &'static str,
}

/// HTTP face of [`AdmissionError`].
#[derive(Debug)]
pub struct ApiError(AdmissionError);

impl From<AdmissionError> for ApiError {
    fn from(e: AdmissionError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            AdmissionError::ValidationFailed(_) => StatusCode::BAD_REQUEST,
            AdmissionError::Unauthorized => StatusCode::UNAUTHORIZED,
            AdmissionError::CarNotFound => StatusCode::NOT_FOUND,
            AdmissionError::CarUnavailable => StatusCode::CONFLICT,
            AdmissionError::CustomerNotFound => StatusCode::UNPROCESSABLE_ENTITY,
            AdmissionError::StorageFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        // Store errors were logged where they were wrapped; callers get a generic message.
        let error = match &self.0 {
            AdmissionError::StorageFailure(_) => "Internal storage error".to_string(),
            other => other.to_string(),
        };
        let body = Json(ErrorResponse {
            error,
            code: self.0.code(),
        });
        (status, body).into_response()
    }
}

/// `Json` whose rejections answer like any other validation failure.
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AdmissionError::invalid(rejection.body_text()))?;
        Ok(Self(value))
    }
}

/// Car id taken from the path; a malformed id is a validation failure.
pub struct CarId(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for CarId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(car_id) = Path::<Uuid>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| AdmissionError::invalid(rejection.body_text()))?;
        Ok(Self(car_id))
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/car/catalog", post(add_car).get(list_catalog))
        .route(
            "/api/car/catalog/:car_id/availability",
            patch(set_car_availability),
        )
        .route("/api/car/reservation", post(create_reservation))
        .route("/api/car/availability", get(check_availability))
        .route("/api/car/register", post(register_agent))
        .route("/api/customer/isClient", get(lookup_customer))
        .route("/api/healthcheck", get(health_check))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(
            cors::CorsLayer::new()
                .allow_origin(cors::Any)
                .allow_methods(cors::Any)
                .allow_headers(cors::Any),
        )
}

pub async fn add_car(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<AddCarRequest>,
) -> Result<(StatusCode, Json<Car>), ApiError> {
    let car = state.desk.add_car(&request.credentials, request.car).await?;
    Ok((StatusCode::CREATED, Json(car)))
}

pub async fn list_catalog(
    State(state): State<AppState>,
    JsonBody(credentials): JsonBody<Credentials>,
) -> Result<Json<Vec<Car>>, ApiError> {
    Ok(Json(state.desk.list_catalog(&credentials).await?))
}

pub async fn set_car_availability(
    State(state): State<AppState>,
    CarId(car_id): CarId,
    JsonBody(request): JsonBody<SetAvailabilityRequest>,
) -> Result<Json<Car>, ApiError> {
    let car = state
        .desk
        .set_car_availability(&request.credentials, car_id, request.available)
        .await?;
    Ok(Json(car))
}

pub async fn create_reservation(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<CreateReservationRequest>,
) -> Result<(StatusCode, Json<Reservation>), ApiError> {
    let reservation = state
        .desk
        .create_reservation(
            &request.credentials,
            ReservationRequest {
                car_id: request.car_id,
                customer_email: request.customer_email,
                start_date: request.start_date,
                end_date: request.end_date,
                payment_status: request.payment_status,
                payment_method: request.payment_method,
                reservation_status: request.reservation_status,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(reservation)))
}

pub async fn check_availability(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<AvailabilityRequest>,
) -> Result<Json<AvailabilityResponse>, ApiError> {
    let availability = state
        .desk
        .check_availability(
            &request.credentials,
            request.car_id,
            &request.start_date,
            &request.end_date,
        )
        .await?;

    let conflicting_reservation = match availability {
        Availability::NotFound => return Err(AdmissionError::CarNotFound.into()),
        Availability::Overlap(id) => Some(id),
        _ => None,
    };
    Ok(Json(AvailabilityResponse {
        available: availability.is_available(),
        reason: availability.reason(),
        conflicting_reservation,
    }))
}

pub async fn register_agent(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<RegisterAgentRequest>,
) -> Result<(StatusCode, Json<AgentProfile>), ApiError> {
    let profile = state
        .desk
        .register_agent(&request.credentials, request.agent)
        .await?;
    Ok((StatusCode::CREATED, Json(profile)))
}

pub async fn lookup_customer(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<LookupCustomerRequest>,
) -> Result<Json<Vec<Customer>>, ApiError> {
    let customers = state
        .desk
        .lookup_customer(&request.credentials, &request.customer_email)
        .await?;
    Ok(Json(customers))
}

pub async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use bigdecimal::BigDecimal;
    use serde_json::{json, Value};
    use std::str::FromStr;
    use tower::ServiceExt;

    struct TestApp {
        store: Arc<InMemoryStore>,
        router: Router,
    }

    async fn test_app() -> TestApp {
        let store = Arc::new(InMemoryStore::new());
        let verifier = BcryptVerifier::new(4);
        AgentRepository::insert(
            store.as_ref(),
            NewAgent {
                name: "John".to_string(),
                surname: "Doe".to_string(),
                email: "agent1@car.com".to_string(),
                password_hash: verifier.hash("123456").unwrap(),
            },
        )
        .await
        .unwrap();
        CustomerRepository::insert(
            store.as_ref(),
            NewCustomer {
                name: "John".to_string(),
                surname: "Doe".to_string(),
                email: "john@test.com".to_string(),
                address: "6 avenue de la république".to_string(),
                city: "villejuif".to_string(),
                zip_code: "94200".to_string(),
                country: "France".to_string(),
            },
        )
        .await
        .unwrap();

        let desk = Arc::new(RentalDesk::with_store(store.clone(), Arc::new(verifier)));
        TestApp {
            store,
            router: create_router(AppState { desk }),
        }
    }

    async fn send(router: &Router, method: &str, uri: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    fn citroen() -> Value {
        json!({
            "email": "agent1@car.com",
            "password": "123456",
            "brand": "Citroen",
            "model": "C4",
            "numberOfSeat": 5,
            "pricePerDay": 80,
            "available": true
        })
    }

    fn reservation(car_id: &str) -> Value {
        json!({
            "email": "agent1@car.com",
            "password": "123456",
            "carID": car_id,
            "customerEmail": "john@test.com",
            "startDate": "2020-04-24",
            "endDate": "2020-05-4",
            "paymentStatus": "Paid",
            "paymentMethod": "Cash",
            "ReservationStatus": "In progress"
        })
    }

    async fn add_citroen(app: &TestApp) -> String {
        let (status, car) = send(&app.router, "POST", "/api/car/catalog", citroen()).await;
        assert_eq!(status, StatusCode::CREATED);
        car["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn add_car_returns_created_car() {
        let app = test_app().await;
        let (status, car) = send(&app.router, "POST", "/api/car/catalog", citroen()).await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(car["brand"], "Citroen");
        assert_eq!(car["model"], "C4");
        assert_eq!(car["numberOfSeat"], 5);
    }

    #[tokio::test]
    async fn add_car_with_zero_seats_is_bad_request() {
        let app = test_app().await;
        let mut body = citroen();
        body["numberOfSeat"] = json!(0);
        let (status, error) = send(&app.router, "POST", "/api/car/catalog", body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error["code"], "validation_failed");
    }

    #[tokio::test]
    async fn reservation_is_created_and_priced() {
        let app = test_app().await;
        let car_id = add_citroen(&app).await;

        let (status, body) = send(
            &app.router,
            "POST",
            "/api/car/reservation",
            reservation(&car_id),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["carID"], car_id.as_str());
        assert_eq!(body["paymentStatus"], "Paid");
        assert_eq!(body["paymentMethod"], "Cash");
        assert_eq!(body["ReservationStatus"], "In progress");
        let price = BigDecimal::from_str(body["price"].as_str().unwrap()).unwrap();
        assert_eq!(price, BigDecimal::from(800));
    }

    #[tokio::test]
    async fn repeated_reservation_conflicts() {
        let app = test_app().await;
        let car_id = add_citroen(&app).await;
        let (status, _) = send(&app.router, "POST", "/api/car/reservation", reservation(&car_id)).await;
        assert_eq!(status, StatusCode::CREATED);

        let mut overlapping = reservation(&car_id);
        overlapping["startDate"] = json!("2020-05-01");
        overlapping["endDate"] = json!("2020-05-10");
        let (status, error) = send(&app.router, "POST", "/api/car/reservation", overlapping).await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(error["code"], "car_unavailable");
        assert_eq!(app.store.reservation_count().await, 1);
    }

    #[tokio::test]
    async fn reservation_errors_have_distinct_statuses() {
        let app = test_app().await;
        let car_id = add_citroen(&app).await;

        let mut unknown_customer = reservation(&car_id);
        unknown_customer["customerEmail"] = json!("ghost@test.com");
        let (status, _) = send(&app.router, "POST", "/api/car/reservation", unknown_customer).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let unknown_car = reservation(&Uuid::new_v4().to_string());
        let (status, _) = send(&app.router, "POST", "/api/car/reservation", unknown_car).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let mut bad_password = reservation(&car_id);
        bad_password["password"] = json!("000000");
        let (status, error) = send(&app.router, "POST", "/api/car/reservation", bad_password).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(error["code"], "unauthorized");

        assert_eq!(app.store.reservation_count().await, 0);
    }

    #[tokio::test]
    async fn malformed_bodies_are_validation_failures() {
        let app = test_app().await;
        let car_id = add_citroen(&app).await;

        let (status, error) = send(
            &app.router,
            "POST",
            "/api/car/reservation",
            reservation("not-a-uuid"),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error["code"], "validation_failed");

        let mut missing_field = reservation(&car_id);
        missing_field.as_object_mut().unwrap().remove("endDate");
        let (status, error) = send(&app.router, "POST", "/api/car/reservation", missing_field).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error["code"], "validation_failed");

        let (status, error) = send(
            &app.router,
            "PATCH",
            "/api/car/catalog/not-a-uuid/availability",
            json!({"email": "agent1@car.com", "password": "123456", "available": false}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error["code"], "validation_failed");

        assert_eq!(app.store.reservation_count().await, 0);
    }

    #[tokio::test]
    async fn unauthorized_mutations_change_nothing() {
        let app = test_app().await;
        let car_id = add_citroen(&app).await;

        let (status, _) = send(
            &app.router,
            "PATCH",
            &format!("/api/car/catalog/{car_id}/availability"),
            json!({"email": "agent1@car.com", "password": "000000", "available": false}),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = send(
            &app.router,
            "POST",
            "/api/car/register",
            json!({
                "email": "agent1@car.com",
                "password": "000000",
                "newAgent": {
                    "name": "Eve",
                    "surname": "Doe",
                    "email": "agent3@car.com",
                    "password": "letmein"
                }
            }),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (_, cars) = send(
            &app.router,
            "GET",
            "/api/car/catalog",
            json!({"email": "agent1@car.com", "password": "123456"}),
        )
        .await;
        assert_eq!(cars[0]["available"], true);
        let newcomer = AgentRepository::find_by_email(app.store.as_ref(), "agent3@car.com")
            .await
            .unwrap();
        assert!(newcomer.is_none());
    }

    #[tokio::test]
    async fn empty_catalog_is_an_empty_list() {
        let app = test_app().await;
        let (status, body) = send(
            &app.router,
            "GET",
            "/api/car/catalog",
            json!({"email": "agent1@car.com", "password": "123456"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));
    }

    #[tokio::test]
    async fn availability_reflects_reservations_and_flag() {
        let app = test_app().await;
        let car_id = add_citroen(&app).await;
        send(&app.router, "POST", "/api/car/reservation", reservation(&car_id)).await;

        let query = |start: &str, end: &str| {
            json!({
                "email": "agent1@car.com",
                "password": "123456",
                "carID": car_id,
                "startDate": start,
                "endDate": end
            })
        };

        let (status, body) = send(&app.router, "GET", "/api/car/availability", query("2022-04-24", "2022-05-4")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["available"], true);

        let (_, body) = send(&app.router, "GET", "/api/car/availability", query("2020-04-30", "2020-05-02")).await;
        assert_eq!(body["available"], false);
        assert_eq!(body["reason"], "overlap");

        let (_, body) = send(&app.router, "GET", "/api/car/availability", query("soon", "later")).await;
        assert_eq!(body["available"], false);
        assert_eq!(body["reason"], "malformed_range");

        let (status, car) = send(
            &app.router,
            "PATCH",
            &format!("/api/car/catalog/{car_id}/availability"),
            json!({"email": "agent1@car.com", "password": "123456", "available": false}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(car["available"], false);

        let (_, body) = send(&app.router, "GET", "/api/car/availability", query("2022-04-24", "2022-05-4")).await;
        assert_eq!(body["reason"], "marked_unavailable");
    }

    #[tokio::test]
    async fn availability_of_unknown_car_is_not_found() {
        let app = test_app().await;
        let (status, _) = send(
            &app.router,
            "GET",
            "/api/car/availability",
            json!({
                "email": "agent1@car.com",
                "password": "123456",
                "carID": Uuid::new_v4(),
                "startDate": "2022-04-24",
                "endDate": "2022-05-04"
            }),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn customer_lookup_and_agent_registration() {
        let app = test_app().await;
        let (status, customers) = send(
            &app.router,
            "GET",
            "/api/customer/isClient",
            json!({"email": "agent1@car.com", "password": "123456", "customerEmail": "john@test.com"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(customers[0]["zipCode"], "94200");

        let (status, profile) = send(
            &app.router,
            "POST",
            "/api/car/register",
            json!({
                "email": "agent1@car.com",
                "password": "123456",
                "newAgent": {
                    "name": "Jane",
                    "surname": "Doe",
                    "email": "agent2@car.com",
                    "password": "abcdef"
                }
            }),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(profile["email"], "agent2@car.com");
        assert!(profile.get("password").is_none());
        assert!(profile.get("password_hash").is_none());
    }

    #[tokio::test]
    async fn health_check_is_ok() {
        let app = test_app().await;
        let request = Request::builder()
            .uri("/api/healthcheck")
            .body(Body::empty())
            .unwrap();
        let response = app.router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
