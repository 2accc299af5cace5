//! Public write endpoints: order checkout and ad-conversion forwarding.

use crate::{
    core::{
        order::{CheckoutForm, submit_order},
        outcome::{Done, OrderCreated, Outcome},
    },
    integrations::conversions::ConversionEvent,
    web::{AppState, JsonBody, json_body, metadata::ClientMetadata},
};
use axum::{
    Json,
    extract::State,
    response::{IntoResponse, Response},
};

/// `POST /api/checkout`
///
/// Always answers `200`; a rejected order or malformed body is reported as
/// `{ok: false, message}`.
pub async fn checkout(
    State(state): State<AppState>,
    ClientMetadata(metadata): ClientMetadata,
    body: JsonBody<CheckoutForm>,
) -> Json<Outcome<OrderCreated>> {
    match json_body(body) {
        Ok(form) => Json(submit_order(&state.db, state.notifier.as_ref(), form, metadata).await),
        Err(e) => Json(Outcome::from_result("create_order", Err(e))),
    }
}

/// `POST /api/conversions`
///
/// Fills in network identifiers the browser did not send, forwards the event and
/// returns the platform's acknowledgment unchanged.
pub async fn forward_conversion(
    State(state): State<AppState>,
    ClientMetadata(metadata): ClientMetadata,
    body: JsonBody<ConversionEvent>,
) -> Response {
    let mut event = match json_body(body) {
        Ok(event) => event,
        Err(e) => return Json(Outcome::<Done>::from_result("send_conversion", Err(e))).into_response(),
    };
    event.client_ip = event.client_ip.or(metadata.client_ip);
    event.user_agent = event.user_agent.or(metadata.user_agent);
    event.fbc = event.fbc.or(metadata.fbc);
    event.fbp = event.fbp.or(metadata.fbp);

    match state.conversions.send(&event).await {
        Ok(ack) => Json(ack).into_response(),
        Err(e) => Json(Outcome::<Done>::from_result("send_conversion", Err(e))).into_response(),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use crate::core::product::get_product_by_id;
    use crate::test_utils::{create_custom_product, create_test_product, setup_test_db};
    use crate::web::{INVALID_BODY_MESSAGE, build_router, test_support::*};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::json;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_checkout_creates_order() {
        let db = setup_test_db().await.unwrap();
        let product = create_test_product(&db, "Colágeno").await.unwrap();
        let app = build_router(test_state(db.clone()));

        let body = json!({
            "productId": product.id.to_string(),
            "quantity": "2",
            "fullName": "Laura Gómez",
            "phone": "3001234567",
            "city": "Medellín",
            "address": "Cra 43A # 1-50",
        });
        let response = app
            .oneshot(json_request("POST", "/api/checkout", &body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["ok"], true);
        assert!(json["orderId"].as_i64().unwrap() > 0);

        let stock = get_product_by_id(&db, product.id).await.unwrap().unwrap().stock;
        assert_eq!(stock, 8);
    }

    #[tokio::test]
    async fn test_checkout_rejection_is_reported_in_body() {
        let db = setup_test_db().await.unwrap();
        let product = create_test_product(&db, "Colágeno").await.unwrap();
        let app = build_router(test_state(db));

        let body = json!({
            "productId": product.id,
            "quantity": 1,
            "fullName": "Laura Gómez",
            "phone": "3001234567",
            "city": "Medellín",
            "address": "   ",
        });
        let response = app
            .oneshot(json_request("POST", "/api/checkout", &body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({"ok": false, "message": "Dirección requerida."})
        );
    }

    #[tokio::test]
    async fn test_checkout_null_or_malformed_body_keeps_outcome_shape() {
        let db = setup_test_db().await.unwrap();
        let product = create_test_product(&db, "Colágeno").await.unwrap();
        let app = build_router(test_state(db.clone()));

        let body = json!({
            "productId": product.id,
            "quantity": 1,
            "fullName": null,
            "phone": "3001234567",
            "city": "Medellín",
            "address": "Cra 43A # 1-50",
        });
        let response = app
            .clone()
            .oneshot(json_request("POST", "/api/checkout", &body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({"ok": false, "message": "Nombre requerido."})
        );

        let garbled = Request::post("/api/checkout")
            .header("content-type", "application/json")
            .body(Body::from("{\"productId\": "))
            .unwrap();
        let response = app.clone().oneshot(garbled).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({"ok": false, "message": INVALID_BODY_MESSAGE})
        );

        let wrong_type = json!({"productId": product.id, "fullName": 5});
        let response = app
            .oneshot(json_request("POST", "/api/checkout", &wrong_type))
            .await
            .unwrap();
        assert_eq!(
            body_json(response).await,
            json!({"ok": false, "message": INVALID_BODY_MESSAGE})
        );

        let stock = get_product_by_id(&db, product.id).await.unwrap().unwrap().stock;
        assert_eq!(stock, 10);
    }

    #[tokio::test]
    async fn test_checkout_quantity_in_exponent_form() {
        let db = setup_test_db().await.unwrap();
        let product = create_custom_product(&db, "Creatina 1kg", 1_000, 1_000, true)
            .await
            .unwrap();
        let app = build_router(test_state(db.clone()));

        let mut body = json!({
            "productId": product.id,
            "quantity": "1e3",
            "fullName": "Laura Gómez",
            "phone": "3001234567",
            "city": "Medellín",
            "address": "Cra 43A # 1-50",
        });
        let response = app
            .clone()
            .oneshot(json_request("POST", "/api/checkout", &body))
            .await
            .unwrap();
        assert_eq!(body_json(response).await["ok"], true);
        let stock = get_product_by_id(&db, product.id).await.unwrap().unwrap().stock;
        assert_eq!(stock, 0);

        body["quantity"] = json!("99999999999");
        let response = app
            .oneshot(json_request("POST", "/api/checkout", &body))
            .await
            .unwrap();
        assert_eq!(
            body_json(response).await,
            json!({"ok": false, "message": "Stock insuficiente."})
        );
    }

    #[tokio::test]
    async fn test_conversion_with_malformed_body() {
        let app = build_router(test_state(setup_test_db().await.unwrap()));
        let response = app
            .oneshot(json_request("POST", "/api/conversions", &json!("Lead")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({"ok": false, "message": INVALID_BODY_MESSAGE})
        );
    }

    #[tokio::test]
    async fn test_conversion_without_credentials_is_refused() {
        let app = build_router(test_state(setup_test_db().await.unwrap()));
        let response = app
            .oneshot(json_request(
                "POST",
                "/api/conversions",
                &json!({"event_name": "Lead"}),
            ))
            .await
            .unwrap();
        let json = body_json(response).await;
        assert_eq!(json["ok"], false);
        assert_eq!(json["message"], "Servicio no configurado.");
    }
}
