use axum::extract::rejection::PathRejection;
use axum::extract::rejection::QueryRejection;
use axum::extract::Path;
use axum::extract::Query;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use tracing::Instrument;

use super::params::BalanceParams;
use super::response::json_response;
use super::shaping::Balances;
use super::AppState;
use crate::errors::Cause;
use crate::errors::Code;
use crate::errors::Error;
use crate::store::BalanceQuery;

/// GET /balances/:pkh
pub(super) async fn get_balances(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
    params: Result<Query<BalanceParams>, QueryRejection>,
) -> Response {
    let span = state.span.clone();
    async move { balances(&state, path, params).await.into_response() }
        .instrument(span)
        .await
}

async fn balances(
    state: &AppState,
    path: Result<Path<String>, PathRejection>,
    params: Result<Query<BalanceParams>, QueryRejection>,
) -> Result<Response, Error> {
    let Path(pkh) = path.map_err(|e| bad_request("Invalid address", e.body_text()))?;
    let Query(params) = params.map_err(|e| bad_request("Invalid query parameters", e.body_text()))?;
    tracing::debug!("balances for {pkh} {params:?}");

    let query = BalanceQuery::new(&pkh)
        .start(params.start)
        .end(params.end)
        .limit(params.limit);
    let records = state.fetch(&query).await?;

    let balances = Balances::new(records, params.compact);
    tracing::debug!("returning {} records for {pkh}", balances.len());
    Ok(json_response(StatusCode::OK, &balances))
}

/// Rejections keep their detail in the body text, not in their source chain.
fn bad_request(message: &str, detail: String) -> Error {
    Error::with_cause(Code::BadRequest, message, Cause::new(detail))
}

/// Fallback for unmatched routes and methods.
pub(super) async fn endpoint_not_found() -> Error {
    Error::endpoint_not_found()
}
