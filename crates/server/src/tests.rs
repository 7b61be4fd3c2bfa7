//! Tests for the report server API
//!
//! - Request body mapping and percentage properties (proptest)
//! - HTTP endpoint behaviour (axum-test)

#[cfg(test)]
mod property_tests {
    use proptest::prelude::*;
    use recmap_report::model::{percentage_denominator, StatusTable};
    use recmap_report::ReportInput;
    use serde_json::json;

    use crate::api::GenerateReportRequest;

    fn status_items() -> impl Strategy<Value = Vec<(String, u64)>> {
        prop::collection::vec(("[A-Z]{3,12}", 0u64..10_000), 0..12)
    }

    proptest! {
        /// Property: the request maps field for field onto the report input
        #[test]
        fn request_maps_one_to_one(
            total in 0u64..1_000_000,
            pendentes in 0u64..1_000_000,
            validadas in 0u64..1_000_000,
            pontos in 0u64..1_000_000,
            items in status_items(),
        ) {
            let body = json!({
                "totalDenuncias": total,
                "denunciasPendentes": pendentes,
                "denunciasValidadas": validadas,
                "totalPontosColeta": pontos,
                "denunciasPorStatus": items
                    .iter()
                    .map(|(status, count)| json!({ "status": status, "count": count }))
                    .collect::<Vec<_>>(),
            });

            let req: GenerateReportRequest = serde_json::from_value(body).unwrap();
            let input = ReportInput::from(req);

            prop_assert_eq!(input.total_denuncias(), total);
            prop_assert_eq!(input.denuncias_pendentes(), pendentes);
            prop_assert_eq!(input.denuncias_validadas(), validadas);
            prop_assert_eq!(input.total_pontos_coleta(), pontos);
            prop_assert_eq!(input.denuncias_por_status().len(), items.len());
            for (status, (expected_status, expected_count)) in
                input.denuncias_por_status().iter().zip(&items)
            {
                prop_assert_eq!(status.status(), expected_status.as_str());
                prop_assert_eq!(status.count(), *expected_count);
            }
        }

        /// Property: every percentage cell uses the total as denominator
        #[test]
        fn percentages_follow_total(total in 0u64..100_000, items in status_items()) {
            let input = ReportInput::new(total).with_statuses(
                items
                    .iter()
                    .map(|(status, count)| recmap_report::StatusCount::new(status.clone(), *count)),
            );
            let table = StatusTable::from_input(&input);
            let denominator = percentage_denominator(total);

            prop_assert_eq!(table.rows().len(), items.len());
            for (row, (_, count)) in table.rows().iter().zip(&items) {
                let expected = format!("{:.1}%", *count as f64 / denominator as f64 * 100.0);
                prop_assert_eq!(row.percentage(), expected.as_str());
                prop_assert!(row.percentage().ends_with('%'));
            }
        }

        /// Property: negative counts never deserialize
        #[test]
        fn negative_counts_are_rejected(count in i64::MIN..0) {
            let body = json!({
                "totalDenuncias": 1,
                "denunciasPendentes": 0,
                "denunciasValidadas": 0,
                "totalPontosColeta": 0,
                "denunciasPorStatus": [{ "status": "VALIDADA", "count": count }],
            });
            prop_assert!(serde_json::from_value::<GenerateReportRequest>(body).is_err());
        }
    }
}

#[cfg(test)]
mod endpoint_tests {
    //! HTTP endpoint integration tests using axum-test

    use std::path::PathBuf;

    use axum::http::{header, HeaderValue, Method, StatusCode};
    use axum_test::TestServer;
    use recmap_report::{fonts, ReportCompositor, ReportInput, ReportOptions};
    use serde_json::json;

    use crate::api::{cors_layer, router, AppState};

    const FRONTEND: &str = "http://localhost:5173";

    /// Create a test server with the full router and CORS policy
    fn create_test_server() -> TestServer {
        let options = ReportOptions::default().with_logo_path(None::<PathBuf>);
        let state = AppState::new(ReportCompositor::new(options));
        let cors = cors_layer(&[FRONTEND.to_string()]).unwrap();

        TestServer::new(router(state).layer(cors)).unwrap()
    }

    /// Skips rendering tests only when no font directory was configured
    fn fonts_ready() -> bool {
        if fonts::fonts_available() {
            return true;
        }
        assert!(
            std::env::var_os(fonts::FONTS_DIR_ENV).is_none(),
            "{} is set but no font family could be loaded from it",
            fonts::FONTS_DIR_ENV
        );
        eprintln!("Skipping render: no font family found.");
        false
    }

    fn sample_body() -> serde_json::Value {
        json!({
            "totalDenuncias": 150,
            "denunciasPendentes": 30,
            "denunciasValidadas": 100,
            "totalPontosColeta": 45,
            "denunciasPorStatus": [
                { "status": "VALIDADA", "count": 100 },
                { "status": "PENDENTE", "count": 30 },
                { "status": "REJEITADA", "count": 20 }
            ]
        })
    }

    #[tokio::test]
    async fn test_health_returns_200() {
        let server = create_test_server();
        let response = server.get("/health").await;
        response.assert_status_ok();

        let json = response.json::<serde_json::Value>();
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["service"], "recmap-report-server");
    }

    #[tokio::test]
    async fn test_generate_pdf_returns_attachment() {
        if !fonts_ready() {
            return;
        }

        let server = create_test_server();
        let response = server.post("/generate-pdf").json(&sample_body()).await;

        response.assert_status_ok();
        assert_eq!(response.header(header::CONTENT_TYPE), "application/pdf");
        assert_eq!(
            response.header(header::CONTENT_DISPOSITION),
            "attachment; filename=relatorio_infografico.pdf"
        );
        assert!(response.as_bytes().starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn test_generate_pdf_renders_builtin_sample() {
        if !fonts_ready() {
            return;
        }

        let server = create_test_server();
        let body = serde_json::to_value(ReportInput::sample()).unwrap();
        assert_eq!(body["totalDenuncias"], 150);

        let response = server.post("/generate-pdf").json(&body).await;

        response.assert_status(StatusCode::OK);
        assert!(response.as_bytes().starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn test_generate_pdf_accepts_empty_status_list() {
        if !fonts_ready() {
            return;
        }

        let server = create_test_server();
        let response = server
            .post("/generate-pdf")
            .json(&json!({
                "totalDenuncias": 0,
                "denunciasPendentes": 0,
                "denunciasValidadas": 0,
                "totalPontosColeta": 0,
                "denunciasPorStatus": []
            }))
            .await;

        response.assert_status_ok();
    }

    #[tokio::test]
    async fn test_missing_field_is_unprocessable() {
        let server = create_test_server();
        let mut body = sample_body();
        body.as_object_mut().unwrap().remove("totalPontosColeta");

        let response = server.post("/generate-pdf").json(&body).await;

        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        let json = response.json::<serde_json::Value>();
        let detail = json["detail"].as_array().unwrap();
        assert_eq!(detail.len(), 1);
        assert_eq!(detail[0]["loc"][0], "body");
        assert!(detail[0]["msg"]
            .as_str()
            .unwrap()
            .contains("totalPontosColeta"));
    }

    #[tokio::test]
    async fn test_negative_count_is_unprocessable() {
        let server = create_test_server();
        let mut body = sample_body();
        body["denunciasPorStatus"][0]["count"] = json!(-5);

        let response = server.post("/generate-pdf").json(&body).await;

        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_malformed_json_is_unprocessable() {
        let server = create_test_server();
        let response = server
            .post("/generate-pdf")
            .text("{\"totalDenuncias\": ")
            .content_type("application/json")
            .await;

        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_cors_allows_configured_origin() {
        let server = create_test_server();
        let response = server
            .method(Method::OPTIONS, "/generate-pdf")
            .add_header(header::ORIGIN, HeaderValue::from_static(FRONTEND))
            .add_header(
                header::ACCESS_CONTROL_REQUEST_METHOD,
                HeaderValue::from_static("POST"),
            )
            .add_header(
                header::ACCESS_CONTROL_REQUEST_HEADERS,
                HeaderValue::from_static("content-type"),
            )
            .await;

        assert_eq!(response.header(header::ACCESS_CONTROL_ALLOW_ORIGIN), FRONTEND);
        assert_eq!(
            response.header(header::ACCESS_CONTROL_ALLOW_CREDENTIALS),
            "true"
        );
        assert_eq!(response.header(header::ACCESS_CONTROL_ALLOW_METHODS), "POST");
    }

    #[tokio::test]
    async fn test_cors_ignores_unknown_origin() {
        let server = create_test_server();
        let response = server
            .get("/health")
            .add_header(
                header::ORIGIN,
                HeaderValue::from_static("http://evil.example"),
            )
            .await;

        response.assert_status_ok();
        assert!(response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_none());
    }
}
