use crate::middleware::Authorised;
use crate::rpc::RpcResponse;
use axum::Json;
use service_core::error::AppError;

/// Dispatches an authorised call. Method failures travel back as a
/// JSON-RPC error object; resolution and authorisation failures as HTTP
/// status codes.
pub async fn handle_rpc(Authorised(call): Authorised) -> Result<Json<RpcResponse>, AppError> {
    let full_method = format!("{}.{}", call.provider.name(), call.method);

    match call
        .provider
        .call(&call.context, &call.method, call.params)
        .await
    {
        Ok(result) => Ok(Json(RpcResponse::success(call.id, result))),
        Err(e) if e.is_transport() => {
            tracing::info!(method = %full_method, reason = %e, "Call rejected by provider");
            Err(e.into())
        }
        Err(e) => {
            tracing::info!(method = %full_method, error = %e, "RPC method failed");
            Ok(Json(RpcResponse::failure(call.id, &e)))
        }
    }
}
