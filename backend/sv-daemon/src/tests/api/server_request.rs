use crate::{ServerQuery, ServerRequest};

use std::path::PathBuf;

use googletest::assert_that;
use googletest::prelude::{anything, err, ok};

#[test]
fn given_absolute_path_when_validated_then_accepted() {
    let request: ServerRequest = serde_json::from_str(r#"{"path": "/srv/pr"}"#).unwrap();

    assert_that!(request.into_path(), ok(anything()));
}

#[test]
fn given_relative_path_when_validated_then_invalid_path() {
    let request = ServerRequest {
        path: PathBuf::from("srv/pr"),
    };

    assert_that!(request.into_path(), err(anything()));
}

#[test]
fn given_empty_query_path_when_validated_then_invalid_path() {
    let query = ServerQuery {
        path: PathBuf::new(),
    };

    assert_that!(query.into_path(), err(anything()));
}
