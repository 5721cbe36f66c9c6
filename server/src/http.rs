use std::{
    net::{IpAddr, SocketAddr},
    sync::Arc,
};

use anyhow::Context;
use axum::{
    Json, Router,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::{self, HeaderName, HeaderValue, Method, StatusCode, header},
    response::IntoResponse,
    routing::{delete, get, post, put},
};
use platform_api::{ApiError, ApiResult};
use platform_db::DbPool;
use products_hr::{Employee, EmployeeDraft, EmployeeFilter, EmployeeService, EmployeeStatistics, HrError};
use sea_orm::{ConnectionTrait, Statement};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::info;

use crate::config::AppConfig;

const EMPLOYEES_PREFIX: &str = "/api/empleados";

#[derive(Clone)]
pub struct AppState {
    pub pool: Arc<DbPool>,
    pub employees: EmployeeService,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(pool: Arc<DbPool>, config: Arc<AppConfig>) -> Self {
        Self {
            employees: EmployeeService::with_connection(pool.clone()),
            pool,
            config,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ServeConfig {
    addr: SocketAddr,
}

impl ServeConfig {
    pub fn new(host: IpAddr, port: u16) -> Self {
        Self {
            addr: SocketAddr::from((host, port)),
        }
    }
}

pub async fn serve(config: ServeConfig, state: AppState) -> anyhow::Result<()> {
    let router = build_router(state);
    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.addr))?;

    info!(%config.addr, "hr server listening");
    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;
    Ok(())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed = origins
        .iter()
        .filter_map(|origin| origin.parse::<HeaderValue>().ok())
        .collect::<Vec<_>>();
    let allow_origin = if allowed.is_empty() {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(allowed)
    };
    CorsLayer::new()
        .allow_headers([http::header::CONTENT_TYPE])
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_origin(allow_origin)
}

pub fn build_router(state: AppState) -> Router {
    let request_id = MakeRequestUuid;
    let header_name = HeaderName::from_static("x-request-id");
    Router::new()
        .route("/health", get(health_handler))
        .nest(EMPLOYEES_PREFIX, employee_routes())
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(header_name.clone(), request_id))
                .layer(PropagateRequestIdLayer::new(header_name))
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(&state.config.cors_allowed_origins)),
        )
        .with_state(state)
}

fn employee_routes() -> Router<AppState> {
    Router::new()
        .route("/CrearEmpleado", post(create_employee))
        .route("/ObtenerEmpleadoPorId/{id}", get(get_employee))
        .route("/ListarEmpleados", get(list_employees))
        .route("/ListarMayoresDe30", get(list_older_than_30))
        .route("/ActualizarEmpleado/{id}", put(update_employee))
        .route("/EliminarEmpleado/{id}", delete(delete_employee))
        .route("/ObtenerEstadisticas", get(employee_statistics))
}

async fn create_employee(
    State(state): State<AppState>,
    payload: Result<Json<EmployeeDraft>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(draft) = payload.map_err(body_rejected)?;
    let employee = state
        .employees
        .create(draft)
        .await
        .map_err(|err| hr_error(err, "Error interno al crear el empleado."))?;
    let location = format!("{EMPLOYEES_PREFIX}/ObtenerEmpleadoPorId/{}", employee.id);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(employee),
    ))
}

async fn get_employee(
    State(state): State<AppState>,
    id: Result<Path<i32>, PathRejection>,
) -> ApiResult<Json<Employee>> {
    let Path(id) = id.map_err(path_rejected)?;
    let employee = state
        .employees
        .get_by_id(id)
        .await
        .map_err(|err| hr_error(err, "Error interno al obtener el empleado."))?;
    Ok(Json(employee))
}

async fn list_employees(
    State(state): State<AppState>,
    pairs: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> ApiResult<Json<Vec<Employee>>> {
    let Query(pairs) = pairs.map_err(query_rejected)?;
    let filter = EmployeeFilter::from_query_pairs(pairs).map_err(query_rejected)?;
    let records = state
        .employees
        .list(filter)
        .await
        .map_err(|err| hr_error(err, "Error interno al listar empleados."))?;
    non_empty(
        records,
        "No se encontraron empleados con los filtros aplicados.",
    )
}

async fn list_older_than_30(State(state): State<AppState>) -> ApiResult<Json<Vec<Employee>>> {
    let records = state.employees.list_older_than_30().await.map_err(|err| {
        hr_error(
            err,
            "Error interno al listar empleados mayores de 30 años.",
        )
    })?;
    non_empty(records, "No se encontraron empleados mayores de 30 años.")
}

async fn update_employee(
    State(state): State<AppState>,
    id: Result<Path<i32>, PathRejection>,
    payload: Result<Json<EmployeeDraft>, JsonRejection>,
) -> ApiResult<Json<Employee>> {
    let Path(id) = id.map_err(path_rejected)?;
    let Json(draft) = payload.map_err(body_rejected)?;
    let employee = state
        .employees
        .update(id, draft)
        .await
        .map_err(|err| hr_error(err, "Error interno al actualizar el empleado."))?;
    Ok(Json(employee))
}

async fn delete_employee(
    State(state): State<AppState>,
    id: Result<Path<i32>, PathRejection>,
) -> ApiResult<StatusCode> {
    let Path(id) = id.map_err(path_rejected)?;
    state
        .employees
        .delete(id)
        .await
        .map_err(|err| hr_error(err, "Error interno al eliminar el empleado."))?;
    Ok(StatusCode::NO_CONTENT)
}

async fn employee_statistics(
    State(state): State<AppState>,
) -> ApiResult<Json<EmployeeStatistics>> {
    let stats = state
        .employees
        .statistics()
        .await
        .map_err(|err| hr_error(err, "Error interno al obtener estadísticas."))?;
    Ok(Json(stats))
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let backend = state.pool.get_database_backend();
    let db_ok = state
        .pool
        .execute(Statement::from_string(backend, "SELECT 1".to_string()))
        .await
        .is_ok();
    Json(HealthResponse {
        ok: db_ok,
        db_ok,
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Serialize)]
struct HealthResponse {
    ok: bool,
    db_ok: bool,
    version: &'static str,
}

fn non_empty(records: Vec<Employee>, message: &str) -> ApiResult<Json<Vec<Employee>>> {
    if records.is_empty() {
        return Err(ApiError::not_found(message));
    }
    Ok(Json(records))
}

/// `unexpected` is the client-facing message used when storage fails.
fn hr_error(err: HrError, unexpected: &str) -> ApiError {
    match err {
        HrError::Validation(rule) => ApiError::bad_request(rule.to_string()),
        err @ HrError::NotFound { .. } => ApiError::not_found(err.to_string()),
        HrError::Unexpected(cause) => ApiError::internal(unexpected, anyhow::anyhow!("{cause:#}")),
    }
}

fn body_rejected(rejection: JsonRejection) -> ApiError {
    tracing::debug!(%rejection, "request body rejected");
    ApiError::bad_request("El cuerpo de la petición está vacío o es inválido.")
}

fn path_rejected(rejection: PathRejection) -> ApiError {
    tracing::debug!(%rejection, "path parameter rejected");
    ApiError::bad_request("El identificador del empleado no es válido.")
}

fn query_rejected(rejection: impl std::fmt::Display) -> ApiError {
    tracing::debug!(%rejection, "query string rejected");
    ApiError::bad_request("Parámetros de consulta inválidos.")
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install CTRL+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        signal(SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    ctrl_c.await;

    #[cfg(unix)]
    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use http_body_util::BodyExt;
    use migration::{Migrator, MigratorTrait};
    use sea_orm::Database;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    async fn test_router() -> Router {
        let conn = Database::connect("sqlite::memory:").await.unwrap();
        Migrator::up(&conn, None).await.unwrap();
        let state = AppState::new(Arc::new(conn), Arc::new(AppConfig::default()));
        build_router(state)
    }

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, http::HeaderMap, Value) {
        let mut builder = http::Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        let response = app
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, headers, value)
    }

    async fn create(app: &Router, payload: Value) -> Value {
        let (status, _, body) = send(
            app,
            Method::POST,
            "/api/empleados/CrearEmpleado",
            Some(payload),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body
    }

    #[tokio::test]
    async fn create_returns_201_with_location() {
        let app = test_router().await;
        let (status, headers, body) = send(
            &app,
            Method::POST,
            "/api/empleados/CrearEmpleado",
            Some(json!({"nombre": "Ana María", "edad": 29, "puesto": "Dev", "departamento": "Eng"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let id = body["id"].as_i64().unwrap();
        assert_eq!(
            body,
            json!({"id": id, "nombre": "Ana María", "edad": 29, "puesto": "Dev", "departamento": "Eng"})
        );
        assert_eq!(
            headers[header::LOCATION],
            format!("/api/empleados/ObtenerEmpleadoPorId/{id}")
        );
        assert!(headers.contains_key("x-request-id"));

        let (status, _, fetched) = send(
            &app,
            Method::GET,
            &format!("/api/empleados/ObtenerEmpleadoPorId/{id}"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched, body);
    }

    #[tokio::test]
    async fn validation_failures_are_400() {
        let app = test_router().await;
        let (status, _, body) = send(
            &app,
            Method::POST,
            "/api/empleados/CrearEmpleado",
            Some(json!({"nombre": "Al", "edad": 0, "puesto": "Dev", "departamento": "Eng"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body,
            json!({"mensaje": "El nombre debe tener al menos 3 caracteres."})
        );

        let (status, _, body) = send(
            &app,
            Method::POST,
            "/api/empleados/CrearEmpleado",
            Some(json!({"nombre": "Ana", "edad": -4, "puesto": "Dev", "departamento": "Eng"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["mensaje"], "La edad debe ser un número positivo.");
    }

    #[tokio::test]
    async fn malformed_body_is_400() {
        let app = test_router().await;
        let response = app
            .clone()
            .oneshot(
                http::Request::builder()
                    .method(Method::POST)
                    .uri("/api/empleados/CrearEmpleado")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from("{not json"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unknown_ids_are_404() {
        let app = test_router().await;
        let (status, _, body) =
            send(&app, Method::GET, "/api/empleados/ObtenerEmpleadoPorId/99", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"mensaje": "Empleado con ID 99 no encontrado."}));

        let (status, _, _) = send(
            &app,
            Method::PUT,
            "/api/empleados/ActualizarEmpleado/99",
            Some(json!({"nombre": "x", "edad": -1})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn update_then_delete_twice() {
        let app = test_router().await;
        let created = create(
            &app,
            json!({"nombre": "Ana", "edad": 29, "puesto": "Dev", "departamento": "Eng"}),
        )
        .await;
        let id = created["id"].as_i64().unwrap();

        let (status, _, body) = send(
            &app,
            Method::PUT,
            &format!("/api/empleados/ActualizarEmpleado/{id}"),
            Some(json!({"id": 5000, "nombre": "Ana Lucía", "edad": 31, "puesto": "Lead", "departamento": "Ops"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({"id": id, "nombre": "Ana Lucía", "edad": 31, "puesto": "Lead", "departamento": "Ops"})
        );

        let (status, _, body) = send(
            &app,
            Method::PUT,
            &format!("/api/empleados/ActualizarEmpleado/{id}"),
            Some(json!({"nombre": "Ana", "edad": 0, "puesto": "Lead", "departamento": "Ops"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["mensaje"], "La edad debe ser un número positivo.");

        let uri = format!("/api/empleados/EliminarEmpleado/{id}");
        let (status, _, body) = send(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(body, Value::Null);
        let (status, _, _) = send(&app, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn listing_filters_and_empty_results() {
        let app = test_router().await;
        let (status, _, body) = send(&app, Method::GET, "/api/empleados/ListarEmpleados", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(
            body["mensaje"],
            "No se encontraron empleados con los filtros aplicados."
        );
        let (status, _, body) =
            send(&app, Method::GET, "/api/empleados/ListarMayoresDe30", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(
            body["mensaje"],
            "No se encontraron empleados mayores de 30 años."
        );

        for (name, age, position) in [("Ana", 25, "Dev"), ("Beto", 35, "dev"), ("Carla", 41, "QA")] {
            create(
                &app,
                json!({"nombre": name, "edad": age, "puesto": position, "departamento": "Eng"}),
            )
            .await;
        }

        let (status, _, body) = send(
            &app,
            Method::GET,
            "/api/empleados/ListarEmpleados?puesto=DEV&edadMin=30",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["nombre"], "Beto");

        let (status, _, older) =
            send(&app, Method::GET, "/api/empleados/ListarMayoresDe30", None).await;
        assert_eq!(status, StatusCode::OK);
        let (_, _, min_31) = send(
            &app,
            Method::GET,
            "/api/empleados/ListarEmpleados?edadMin=31",
            None,
        )
        .await;
        assert_eq!(older, min_31);
        assert_eq!(older.as_array().unwrap().len(), 2);

        let (status, _, _) = send(
            &app,
            Method::GET,
            "/api/empleados/ListarEmpleados?edadMin=abc",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn listing_query_keys_ignore_case_and_blank_ages() {
        let app = test_router().await;
        for (name, age, position) in [("Ana", 25, "Dev"), ("Beto", 35, "dev")] {
            create(
                &app,
                json!({"nombre": name, "edad": age, "puesto": position, "departamento": "Eng"}),
            )
            .await;
        }

        let (status, _, body) = send(
            &app,
            Method::GET,
            "/api/empleados/ListarEmpleados?edadMin=&edadMax=&puesto=dev",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 2);

        let (status, _, body) = send(
            &app,
            Method::GET,
            "/api/empleados/ListarEmpleados?Puesto=QA",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(
            body["mensaje"],
            "No se encontraron empleados con los filtros aplicados."
        );

        let (status, _, body) = send(
            &app,
            Method::GET,
            "/api/empleados/ListarEmpleados?EDADMIN=30&PUESTO=DEV",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["nombre"], "Beto");
    }

    #[tokio::test]
    async fn update_rejects_short_names() {
        let app = test_router().await;
        let created = create(
            &app,
            json!({"nombre": "Ana", "edad": 29, "puesto": "Dev", "departamento": "Eng"}),
        )
        .await;
        let id = created["id"].as_i64().unwrap();
        let uri = format!("/api/empleados/ActualizarEmpleado/{id}");

        let (status, _, body) = send(
            &app,
            Method::PUT,
            &uri,
            Some(json!({"nombre": " Al ", "edad": 40, "puesto": "Dev", "departamento": "Eng"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body,
            json!({"mensaje": "El nombre debe tener al menos 3 caracteres."})
        );

        let (_, _, unchanged) = send(
            &app,
            Method::GET,
            &format!("/api/empleados/ObtenerEmpleadoPorId/{id}"),
            None,
        )
        .await;
        assert_eq!(unchanged, created);
    }

    #[tokio::test]
    async fn statistics_endpoint() {
        let app = test_router().await;
        let (status, _, body) =
            send(&app, Method::GET, "/api/empleados/ObtenerEstadisticas", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({
                "totalEmpleados": 0,
                "promedioEdad": 0.0,
                "cantidadPorPuesto": [],
                "cantidadPorDepartamento": []
            })
        );

        for (name, age, position) in [("Ana", 21, "Dev"), ("Beto", 22, "dev")] {
            create(
                &app,
                json!({"nombre": name, "edad": age, "puesto": position, "departamento": "Eng"}),
            )
            .await;
        }
        let (_, _, body) =
            send(&app, Method::GET, "/api/empleados/ObtenerEstadisticas", None).await;
        assert_eq!(
            body,
            json!({
                "totalEmpleados": 2,
                "promedioEdad": 21.5,
                "cantidadPorPuesto": [
                    {"puesto": "Dev", "cantidad": 1},
                    {"puesto": "dev", "cantidad": 1}
                ],
                "cantidadPorDepartamento": [
                    {"departamento": "Eng", "cantidad": 2}
                ]
            })
        );
    }

    #[tokio::test]
    async fn health_reports_database() {
        let app = test_router().await;
        let (status, _, body) = send(&app, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], true);
        assert_eq!(body["db_ok"], true);
    }

    #[test]
    fn storage_failures_map_to_operation_message() {
        let err = hr_error(
            HrError::unexpected(anyhow::anyhow!("pool timed out")),
            "Error interno al listar empleados.",
        );
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = err.body();
        assert_eq!(body.mensaje, "Error interno al listar empleados.");
        assert_eq!(body.detalle.as_deref(), Some("pool timed out"));
    }
}
