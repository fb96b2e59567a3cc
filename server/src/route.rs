use axum::Router;

use crate::handler::{AppModule, Database};

pub use self::{author::*, author_collection::*, book::*};

mod author;
mod author_collection;
mod book;

pub fn routes<D: Database>() -> Router<AppModule<D>> {
    Router::new()
        .route_author()
        .route_author_collection()
        .route_book()
}

#[cfg(test)]
mod test {
    use axum::body::Body;
    use axum::http::header::{ACCEPT, CONTENT_TYPE, LOCATION};
    use axum::http::{Request, StatusCode};
    use axum::response::Response;
    use axum::Router;
    use serde_json::{json, Value};
    use time::macros::datetime;
    use tower::ServiceExt;
    use uuid::Uuid;

    use application::mapper::Mapper;
    use driver::database::InMemoryDatabase;

    use crate::handler::AppModule;
    use crate::route::routes;

    fn app() -> Router {
        let mapper = Mapper::new().with_clock(|| datetime!(2024-01-01 0:00 UTC));
        routes::<InMemoryDatabase>()
            .with_state(AppModule::with(InMemoryDatabase::new(), mapper))
    }

    async fn send(app: &Router, request: Request<Body>) -> Response {
        app.clone().oneshot(request).await.unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn with_body(
        method: &str,
        uri: &str,
        content_type: &str,
        body: impl Into<Body>,
    ) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(CONTENT_TYPE, content_type)
            .body(body.into())
            .unwrap()
    }

    fn json(method: &str, uri: &str, body: Value) -> Request<Body> {
        with_body(method, uri, "application/json", body.to_string())
    }

    async fn text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    async fn body(response: Response) -> Value {
        serde_json::from_str(&text(response).await).unwrap()
    }

    fn location(response: &Response) -> String {
        response.headers()[LOCATION].to_str().unwrap().to_string()
    }

    fn author(first_name: &str) -> Value {
        json!({
            "first_name": first_name,
            "last_name": "Tolkien",
            "date_of_birth": "1892-01-03T00:00:00Z",
            "genre": "Fantasy",
        })
    }

    async fn create_author(app: &Router, first_name: &str) -> String {
        let response = send(app, json("POST", "/authors", author(first_name))).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        body(response).await["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn authors_are_created_and_read_back() {
        let app = app();

        let response = send(&app, json("POST", "/authors", author("John"))).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let location = location(&response);
        let created = body(response).await;
        assert_eq!(location, format!("/authors/{}", created["id"].as_str().unwrap()));
        assert_eq!(created["name"], "John Tolkien");
        assert_eq!(created["age"], 131);

        let response = send(&app, get(&location)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body(response).await, created);

        let response = send(&app, get("/authors")).await;
        assert_eq!(body(response).await, json!([created]));

        let response = send(&app, get(&format!("/authors/{}", Uuid::new_v4()))).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn formats_are_negotiated() {
        let app = app();

        let xml = "<author>\
            <first_name>Mary</first_name>\
            <last_name>Shelley</last_name>\
            <date_of_birth>1797-08-30T00:00:00Z</date_of_birth>\
            <genre>Horror</genre>\
            </author>";
        let mut request = with_body("POST", "/authors", "application/xml", xml);
        request
            .headers_mut()
            .insert(ACCEPT, "application/xml".parse().unwrap());
        let response = send(&app, request).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()[CONTENT_TYPE], "application/xml");
        let created = text(response).await;
        assert!(created.starts_with("<author>"));
        assert!(created.contains("<name>Mary Shelley</name>"));

        let request = Request::builder()
            .uri("/authors")
            .header(ACCEPT, "text/html")
            .body(Body::empty())
            .unwrap();
        let response = send(&app, request).await;
        assert_eq!(response.status(), StatusCode::NOT_ACCEPTABLE);

        let response = send(&app, with_body("POST", "/authors", "text/plain", "Mary")).await;
        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);

        let response = send(&app, with_body("POST", "/authors", "application/json", "")).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = send(&app, with_body("POST", "/authors", "application/json", "{")).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn put_creates_then_replaces() {
        let app = app();
        let author_id = create_author(&app, "Christopher").await;
        let uri = format!("/authors/{author_id}/books/{}", Uuid::new_v4());
        let book = json!({ "title": "The Silmarillion", "description": "Elder days" });

        let response = send(&app, json("PUT", &uri, book.clone())).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(location(&response), uri);

        let response = send(&app, json("PUT", &uri, book.clone())).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = send(&app, get(&format!("/authors/{author_id}/books"))).await;
        let books = body(response).await;
        assert_eq!(books.as_array().map(Vec::len), Some(1));
        assert_eq!(books[0]["title"], "The Silmarillion");

        let response = send(
            &app,
            json("PUT", &uri, json!({ "title": "Same", "description": "Same" })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let violations = body(response).await;
        assert_eq!(
            violations["description"],
            json!(["The provided description should be different from the title."])
        );

        let elsewhere = format!("/authors/{}/books/{}", Uuid::new_v4(), Uuid::new_v4());
        let response = send(&app, json("PUT", &elsewhere, book)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn patch_reports_structural_and_validation_failures() {
        let app = app();
        let author_id = create_author(&app, "Christopher").await;
        let response = send(
            &app,
            json(
                "POST",
                &format!("/authors/{author_id}/books"),
                json!({ "title": "Unfinished Tales", "description": "Fragments" }),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let uri = location(&response);
        let before = body(send(&app, get(&uri)).await).await;

        let patch = |operations: Value| {
            with_body("PATCH", &uri, "application/json-patch+json", operations.to_string())
        };

        let unknown_member = json!([{ "op": "add", "path": "/isbn", "value": "1" }]);
        let response = send(&app, patch(unknown_member)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = send(&app, patch(json!([{ "op": "merge", "path": "/title" }]))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let same_as_title =
            json!([{ "op": "replace", "path": "/description", "value": "Unfinished Tales" }]);
        let response = send(&app, patch(same_as_title)).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body(send(&app, get(&uri)).await).await, before);

        let response = send(
            &app,
            patch(json!([{ "op": "replace", "path": "/page_count", "value": 472 }])),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        let after = body(send(&app, get(&uri)).await).await;
        assert_eq!(after["page_count"], 472);
        assert_eq!(after["title"], before["title"]);

        let xml = with_body("PATCH", &uri, "application/xml", "<op/>");
        assert_eq!(send(&app, xml).await.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }

    #[tokio::test]
    async fn patch_creates_missing_books() {
        let app = app();
        let author_id = create_author(&app, "Christopher").await;
        let uri = format!("/authors/{author_id}/books/{}", Uuid::new_v4());
        let operations = json!([
            { "op": "replace", "path": "/title", "value": "The Book of Lost Tales" },
            { "op": "replace", "path": "/description", "value": "Early mythology" },
        ]);

        let request = json("PATCH", &uri, operations.clone());
        let response = send(&app, request).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(location(&response), uri);
        let created = body(response).await;
        assert_eq!(created["title"], "The Book of Lost Tales");
        assert_eq!(body(send(&app, get(&uri)).await).await, created);

        let stranger = format!("/authors/{}/books/{}", Uuid::new_v4(), Uuid::new_v4());
        let response = send(&app, json("PATCH", &stranger, operations)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn books_need_an_existing_author() {
        let app = app();
        let uri = format!("/authors/{}/books", Uuid::new_v4());
        let book = json!({ "title": "The Hobbit", "description": "There and back again" });

        let response = send(&app, json("POST", &uri, book)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(send(&app, get(&uri)).await.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn author_fields_are_validated() {
        let app = app();
        let mut request = author(&"J".repeat(51));
        request["genre"] = json!("");

        let response = send(&app, json("POST", "/authors", request)).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let violations = body(response).await;
        assert_eq!(
            violations["first_name"],
            json!(["The first name shouldn't have more than 50 characters."])
        );
        assert_eq!(violations["genre"], json!(["You should fill out a genre."]));
        assert!(violations.get("last_name").is_none());

        let response = send(&app, get("/authors")).await;
        assert_eq!(body(response).await, json!([]));
    }

    #[tokio::test]
    async fn collections_are_all_or_nothing() {
        let app = app();

        let response = send(
            &app,
            json("POST", "/authorcollections", json!([author("A"), author("B")])),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let location = location(&response);
        let created = body(response).await;
        let ids = created
            .as_array()
            .unwrap()
            .iter()
            .map(|author| author["id"].as_str().unwrap().to_string())
            .collect::<Vec<_>>();
        assert_eq!(location, format!("/authorcollections/({},{})", ids[0], ids[1]));

        let response = send(&app, get(&location)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body(response).await, created);

        let partial = format!("/authorcollections/({}, {})", ids[1], Uuid::new_v4());
        let response = send(&app, get(&partial.replace(' ', "%20"))).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(text(response).await.is_empty());

        let response = send(&app, get("/authorcollections/(nope)")).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = send(&app, json("POST", "/authorcollections", json!([]))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn deleting_an_author_deletes_its_books() {
        let app = app();
        let mut with_books = author("Christopher");
        with_books["books"] = json!([
            { "title": "The Silmarillion", "description": "Elder days" },
            { "title": "Unfinished Tales" },
        ]);
        let response = send(&app, json("POST", "/authors", with_books)).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let author_id = body(response).await["id"].as_str().unwrap().to_string();

        let books = body(send(&app, get(&format!("/authors/{author_id}/books"))).await).await;
        let books = books.as_array().unwrap().clone();
        assert_eq!(books.len(), 2);

        let request = Request::builder()
            .method("DELETE")
            .uri(format!("/authors/{author_id}"))
            .body(Body::empty())
            .unwrap();
        assert_eq!(send(&app, request).await.status(), StatusCode::NO_CONTENT);

        for book in books {
            let uri = format!("/authors/{author_id}/books/{}", book["id"].as_str().unwrap());
            assert_eq!(send(&app, get(&uri)).await.status(), StatusCode::NOT_FOUND);
        }
        let response = send(&app, get(&format!("/authors/{author_id}/books"))).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
