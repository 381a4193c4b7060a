use serde_json::json;

use crate::common::{EQUIPMENT_OK, JHA_OK, TestApp, routes};

mod equipment {
    use super::*;

    #[tokio::test]
    async fn staged_location_yields_csv_and_cleans_up() {
        let app = TestApp::spawn().await;
        app.stage_equipment("42").await;

        let res = app
            .post_json(routes::PROCESS, &json!({"locationNumber": "42"}))
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(
            res.header("content-disposition"),
            "attachment; filename=\"equipment_report_42.csv\""
        );
        assert_eq!(res.header("content-type"), "text/csv");
        assert_eq!(res.text, "photo\nIMG_1.jpg\nIMG_2.png\n");
        assert_eq!(app.invocations(), vec!["42"]);
        assert!(!app.staged("output/equipment_inventory.csv"));
        assert!(app.pending_deliveries().is_empty());
    }

    #[tokio::test]
    async fn numeric_location_is_accepted() {
        let app = TestApp::spawn().await;
        app.stage_equipment("42").await;

        let res = app
            .post_json(routes::PROCESS, &json!({"locationNumber": 42}))
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(app.invocations(), vec!["42"]);
    }

    #[tokio::test]
    async fn nothing_staged_fails_before_invoking() {
        let app = TestApp::spawn().await;

        let res = app
            .post_json(routes::PROCESS, &json!({"locationNumber": "42"}))
            .await;

        assert_eq!(res.status, 400);
        assert!(res.error().contains("uploads/photos/42"), "{}", res.text);
        assert!(res.body["requestId"].is_u64());
        assert!(app.invocations().is_empty());
    }

    #[tokio::test]
    async fn missing_location_number() {
        let app = TestApp::spawn().await;

        let res = app.post_json(routes::PROCESS, &json!({})).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.error(), "Location number is required");
    }

    #[tokio::test]
    async fn malformed_json_is_a_json_error() {
        let app = TestApp::spawn().await;

        let res = app
            .client
            .post(format!("http://{}{}", app.addr, routes::PROCESS))
            .header("content-type", "application/json")
            .body("{not json")
            .send()
            .await
            .unwrap();
        let res = crate::common::TestResponse::from_response(res).await;

        assert_eq!(res.status, 400);
        assert!(!res.error().is_empty());
        assert!(res.body["requestId"].is_u64());
    }

    #[tokio::test]
    async fn photos_without_images_list_the_directory() {
        let app = TestApp::spawn().await;
        app.upload(&routes::photos("42"), "photos[]", &[("notes.txt", b"x")])
            .await;
        app.upload(&routes::manufacturer("42"), "file", &[("p.xlsx", b"x")])
            .await;

        let res = app
            .post_json(routes::PROCESS, &json!({"locationNumber": "42"}))
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.error(), "No valid photos found for location 42");
        assert_eq!(res.body["details"]["files"], json!(["notes.txt"]));
        assert!(app.invocations().is_empty());
    }

    #[tokio::test]
    async fn analyzer_failure_reports_stderr() {
        let app = TestApp::spawn_with("echo 'model not found' >&2\nexit 3\n", JHA_OK).await;
        app.stage_equipment("42").await;

        let res = app
            .post_json(routes::PROCESS, &json!({"locationNumber": "42"}))
            .await;

        assert_eq!(res.status, 500);
        assert_eq!(res.error(), "Processing failed");
        assert_eq!(res.body["details"], "model not found\n");
    }

    #[tokio::test]
    async fn sentinel_output_is_a_client_error() {
        let app = TestApp::spawn_with(
            "echo 'No manufacturer file found for location'\n",
            JHA_OK,
        )
        .await;
        app.stage_equipment("42").await;

        let res = app
            .post_json(routes::PROCESS, &json!({"locationNumber": "42"}))
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.error(), "Manufacturer file processing failed");
    }

    #[tokio::test]
    async fn clean_exit_without_result() {
        let app = TestApp::spawn_with("echo done\n", JHA_OK).await;
        app.stage_equipment("42").await;

        let res = app
            .post_json(routes::PROCESS, &json!({"locationNumber": "42"}))
            .await;

        assert_eq!(res.status, 500);
        assert_eq!(
            res.error(),
            "Processing completed but no result file was generated"
        );
        assert_eq!(res.body["details"]["stdout"], "done\n");
    }

    #[tokio::test]
    async fn consecutive_runs_see_fresh_results() {
        let app = TestApp::spawn().await;
        app.stage_equipment("1").await;
        app.stage_equipment("2").await;

        let first = app
            .post_json(routes::PROCESS, &json!({"locationNumber": "1"}))
            .await;
        let second = app
            .post_json(routes::PROCESS, &json!({"locationNumber": "2"}))
            .await;

        assert_eq!(first.status, 200);
        assert_eq!(second.status, 200);
        assert_eq!(
            second.header("content-disposition"),
            "attachment; filename=\"equipment_report_2.csv\""
        );
        assert_eq!(app.invocations(), vec!["1", "2"]);
    }

    #[tokio::test]
    async fn concurrent_runs_each_get_a_report() {
        let app = TestApp::spawn_with(
            &format!("sleep 0.2\n{EQUIPMENT_OK}"),
            JHA_OK,
        )
        .await;
        app.stage_equipment("1").await;
        app.stage_equipment("2").await;

        let first = json!({"locationNumber": "1"});
        let second = json!({"locationNumber": "2"});
        let (a, b) = tokio::join!(
            app.post_json(routes::PROCESS, &first),
            app.post_json(routes::PROCESS, &second),
        );

        assert_eq!(a.status, 200, "{}", a.text);
        assert_eq!(b.status, 200, "{}", b.text);
        assert_eq!(a.text, "photo\nIMG_1.jpg\nIMG_2.png\n");
        assert_eq!(b.text, "photo\nIMG_1.jpg\nIMG_2.png\n");
        assert_eq!(app.invocations().len(), 2);
        assert!(!app.staged("output/equipment_inventory.csv"));
        assert!(app.pending_deliveries().is_empty());
    }
}

mod hazard {
    use super::*;

    #[tokio::test]
    async fn staged_documents_yield_workbook() {
        let app = TestApp::spawn().await;
        app.upload(&routes::jha_pdfs("7"), "pdfs[]", &[("site.pdf", b"%PDF")])
            .await;

        let res = app.post_empty(&routes::jha_process("7")).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(
            res.header("content-disposition"),
            "attachment; filename=\"jha_processed.xlsx\""
        );
        assert_eq!(res.text, "WORKBOOK");
        assert_eq!(app.invocations(), vec!["7"]);
        assert!(!app.staged("output/jha_processed.xlsb"));
    }

    #[tokio::test]
    async fn workbook_alone_is_enough() {
        let app = TestApp::spawn().await;
        app.upload(&routes::jha_excel("7"), "file", &[("h.xlsb", b"wb")])
            .await;

        let res = app.post_empty(&routes::jha_process("7")).await;

        assert_eq!(res.status, 200, "{}", res.text);
    }

    #[tokio::test]
    async fn unknown_location_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app.post_empty(&routes::jha_process("7")).await;

        assert_eq!(res.status, 400);
        assert!(res.error().contains("uploads/jha/7"), "{}", res.text);
        assert!(app.invocations().is_empty());
    }
}
