//! Tests for transport request/response types.

use super::{HttpRequest, HttpResponse, RELAYED_METHODS, carries_body, is_relayed_method};

mod http_request {
    use super::*;

    #[test]
    fn new_creates_request_with_method_and_url() {
        let url = url::Url::parse("https://example.com/api").unwrap();
        let req = HttpRequest::new(http::Method::PUT, url.clone());

        assert_eq!(req.method, http::Method::PUT);
        assert_eq!(req.url, url);
        assert!(req.body.is_none());
    }

    #[test]
    fn get_and_post_shortcuts_set_method() {
        let url = url::Url::parse("https://example.com/").unwrap();

        assert_eq!(HttpRequest::get(url.clone()).method, http::Method::GET);
        assert_eq!(HttpRequest::post(url).method, http::Method::POST);
    }

    #[test]
    fn with_body_sets_body() {
        let url = url::Url::parse("https://example.com/").unwrap();
        let body = b"test body".to_vec();
        let req = HttpRequest::post(url).with_body(body.clone());

        assert_eq!(req.body, Some(body));
    }

    #[test]
    fn clone_keeps_body_independent() {
        let url = url::Url::parse("https://example.com/").unwrap();
        let original = HttpRequest::post(url).with_body(b"original".to_vec());
        let mut copy = original.clone();
        copy.body = None;

        assert_eq!(original.body, Some(b"original".to_vec()));
    }
}

mod http_response {
    use super::*;

    #[test]
    fn is_success_returns_true_for_2xx() {
        let statuses = [
            http::StatusCode::OK,
            http::StatusCode::CREATED,
            http::StatusCode::ACCEPTED,
            http::StatusCode::NO_CONTENT,
        ];

        for status in statuses {
            let resp = HttpResponse::new(status, vec![]);
            assert!(resp.is_success(), "Expected {status} to be success");
        }
    }

    #[test]
    fn is_success_returns_false_for_non_2xx() {
        let statuses = [
            http::StatusCode::MOVED_PERMANENTLY,
            http::StatusCode::BAD_REQUEST,
            http::StatusCode::NOT_FOUND,
            http::StatusCode::INTERNAL_SERVER_ERROR,
            http::StatusCode::SERVICE_UNAVAILABLE,
        ];

        for status in statuses {
            let resp = HttpResponse::new(status, vec![]);
            assert!(!resp.is_success(), "Expected {status} to not be success");
        }
    }

    #[test]
    fn body_text_returns_none_for_invalid_utf8() {
        let resp = HttpResponse::new(http::StatusCode::OK, vec![0xff, 0xfe]);
        assert!(resp.body_text().is_none());

        let resp = HttpResponse::new(http::StatusCode::OK, b"hello".to_vec());
        assert_eq!(resp.body_text(), Some("hello"));
    }
}

mod methods {
    use super::*;

    #[test]
    fn relayed_methods_cover_the_seven_verbs() {
        for name in ["DELETE", "GET", "HEAD", "OPTIONS", "POST", "PUT", "TRACE"] {
            let method: http::Method = name.parse().unwrap();
            assert!(is_relayed_method(&method), "{name} should be relayed");
        }
        assert_eq!(RELAYED_METHODS.len(), 7);
    }

    #[test]
    fn patch_and_connect_are_not_relayed() {
        assert!(!is_relayed_method(&http::Method::PATCH));
        assert!(!is_relayed_method(&http::Method::CONNECT));
    }

    #[test]
    fn get_and_head_never_carry_a_body() {
        assert!(!carries_body(&http::Method::GET));
        assert!(!carries_body(&http::Method::HEAD));
    }

    #[test]
    fn other_verbs_carry_a_body() {
        for method in [
            http::Method::DELETE,
            http::Method::OPTIONS,
            http::Method::POST,
            http::Method::PUT,
            http::Method::TRACE,
        ] {
            assert!(carries_body(&method), "{method} should carry a body");
        }
    }
}
