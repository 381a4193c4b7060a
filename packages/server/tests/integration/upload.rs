use crate::common::{TestApp, routes};

mod health {
    use super::*;

    #[tokio::test]
    async fn root_reports_running() {
        let app = TestApp::spawn().await;

        let res = app.get(routes::HEALTH).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["status"], "Backend is running");
        assert!(!res.header("x-request-id").is_empty());
    }

    #[tokio::test]
    async fn api_reference_is_served() {
        let app = TestApp::spawn().await;

        let res = app.get("/scalar").await;

        assert_eq!(res.status, 200);
        assert!(res.text.contains("/api/upload/photos/{location}"));
    }
}

mod photos {
    use super::*;

    #[tokio::test]
    async fn stores_batch_under_location() {
        let app = TestApp::spawn().await;

        let res = app
            .upload(
                &routes::photos("42"),
                "photos[]",
                &[("a.jpg", b"1"), ("b.jpg", b"2")],
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["success"], true);
        assert_eq!(res.body["message"], "Photo upload complete");
        assert_eq!(res.body["uploaded"], serde_json::json!(["a.jpg", "b.jpg"]));
        assert_eq!(res.body["skipped"], serde_json::json!([]));
        assert_eq!(res.body["location"], "42");
        assert!(app.staged("uploads/photos/42/a.jpg"));
        assert!(app.staged("uploads/photos/42/b.jpg"));
    }

    #[tokio::test]
    async fn second_upload_of_same_name_is_skipped() {
        let app = TestApp::spawn().await;
        app.upload(&routes::photos("42"), "photos[]", &[("a.jpg", b"first")])
            .await;

        let res = app
            .upload(
                &routes::photos("42"),
                "photos[]",
                &[("a.jpg", b"second"), ("c.jpg", b"3")],
            )
            .await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["uploaded"], serde_json::json!(["c.jpg"]));
        assert_eq!(res.body["skipped"], serde_json::json!(["a.jpg"]));
        let stored = std::fs::read(app.root.join("uploads/photos/42/a.jpg")).unwrap();
        assert_eq!(stored, b"first");
    }

    #[tokio::test]
    async fn accepts_field_without_brackets() {
        let app = TestApp::spawn().await;

        let res = app
            .upload(&routes::photos("7"), "photos", &[("a.png", b"1")])
            .await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["uploaded"], serde_json::json!(["a.png"]));
    }

    #[tokio::test]
    async fn empty_batch_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app
            .upload(&routes::photos("42"), "other", &[("a.jpg", b"1")])
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.error(), "No photos uploaded");
        assert!(res.body["requestId"].is_u64());
        assert!(!app.staged("uploads/photos/42"));
    }

    #[tokio::test]
    async fn traversal_location_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app
            .upload("/api/upload/photos/..%2Fescape", "photos[]", &[("a.jpg", b"1")])
            .await;

        assert_eq!(res.status, 400, "{}", res.text);
        assert!(res.error().starts_with("Invalid location"));
        assert!(!app.root.join("uploads/escape").exists());
        assert!(!app.root.parent().unwrap().join("escape").exists());
    }

    #[tokio::test]
    async fn traversal_filename_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app
            .upload(&routes::photos("42"), "photos[]", &[("../a.jpg", b"1")])
            .await;

        assert_eq!(res.status, 400, "{}", res.text);
        assert!(!app.staged("uploads/photos/a.jpg"));
    }
}

mod manufacturer {
    use super::*;

    #[tokio::test]
    async fn stores_normalized_name() {
        let app = TestApp::spawn().await;

        let res = app
            .upload(&routes::manufacturer("42"), "file", &[("Parts List.XLSX", b"x")])
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["success"], true);
        assert_eq!(res.body["filename"], "manufacturer_file_42.xlsx");
        assert_eq!(res.body["location"], "42");
        assert!(res.body.get("message").is_none());
        assert!(app.staged("uploads/manufacturer/42/manufacturer_file_42.xlsx"));
    }

    #[tokio::test]
    async fn new_sheet_replaces_old_one() {
        let app = TestApp::spawn().await;
        app.upload(&routes::manufacturer("42"), "file", &[("old.xls", b"old")])
            .await;

        let res = app
            .upload(&routes::manufacturer("42"), "file", &[("new.xlsx", b"new")])
            .await;

        assert_eq!(res.status, 200);
        assert!(!app.staged("uploads/manufacturer/42/manufacturer_file_42.xls"));
        let stored =
            std::fs::read(app.root.join("uploads/manufacturer/42/manufacturer_file_42.xlsx"))
                .unwrap();
        assert_eq!(stored, b"new");
    }

    #[tokio::test]
    async fn non_excel_is_rejected_with_request_id() {
        let app = TestApp::spawn().await;

        let res = app
            .upload(&routes::manufacturer("42"), "file", &[("parts.csv", b"x")])
            .await;

        assert_eq!(res.status, 400);
        assert!(res.error().contains("parts.csv"), "{}", res.text);
        let header_id: u64 = res.header("x-request-id").parse().unwrap();
        assert_eq!(res.body["requestId"].as_u64(), Some(header_id));
        assert!(!app.staged("uploads/manufacturer/42"));
    }

    #[tokio::test]
    async fn missing_file_part_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app
            .upload(&routes::manufacturer("42"), "sheet", &[("parts.xlsx", b"x")])
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.error(), "No manufacturer file uploaded");
    }
}

mod hazard {
    use super::*;

    #[tokio::test]
    async fn pdfs_are_staged_with_skip_semantics() {
        let app = TestApp::spawn().await;
        app.upload(&routes::jha_pdfs("7"), "pdfs[]", &[("site.pdf", b"1")])
            .await;

        let res = app
            .upload(
                &routes::jha_pdfs("7"),
                "pdfs",
                &[("site.pdf", b"1"), ("crane.pdf", b"2")],
            )
            .await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["message"], "JHA PDFs uploaded successfully");
        assert_eq!(res.body["uploaded"], serde_json::json!(["crane.pdf"]));
        assert_eq!(res.body["skipped"], serde_json::json!(["site.pdf"]));
        assert!(app.staged("uploads/jha/7/pdfs/crane.pdf"));
    }

    #[tokio::test]
    async fn excel_accepts_binary_workbook() {
        let app = TestApp::spawn().await;

        let res = app
            .upload(&routes::jha_excel("7"), "file", &[("hazards.xlsb", b"wb")])
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["message"], "JHA Excel uploaded successfully");
        assert_eq!(res.body["filename"], "jha_excel_7.xlsb");
        assert!(app.staged("uploads/jha/7/excel/jha_excel_7.xlsb"));
    }

    #[tokio::test]
    async fn excel_rejects_documents() {
        let app = TestApp::spawn().await;

        let res = app
            .upload(&routes::jha_excel("7"), "file", &[("hazards.pdf", b"x")])
            .await;

        assert_eq!(res.status, 400);
    }
}
