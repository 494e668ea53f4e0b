//! Deterministic cache-key derivation.

/// Build a cache key from a resource prefix, an operation name, and the
/// query-affecting parameters in declaration order.
///
/// Parameters with a `None` value are omitted entirely, so a request
/// without a filter and a request with that filter unset produce the same
/// key. An explicitly empty value still contributes a `name:` part — for
/// the caller an empty search term is not the same request as no search
/// term.
///
/// The result is stable across processes (`prefix:operation:k1:v1:...`),
/// which keeps keys shareable if the backend ever moves out of process.
#[must_use]
pub fn cache_key(prefix: &str, operation: &str, params: &[(&str, Option<String>)]) -> String {
    let mut parts = Vec::with_capacity(2 + params.len());
    parts.push(prefix.to_owned());
    parts.push(operation.to_owned());
    for (name, value) in params {
        if let Some(value) = value {
            parts.push(format!("{name}:{value}"));
        }
    }
    parts.join(":")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_params_yield_identical_keys() {
        let build = || {
            cache_key(
                "products",
                "getAll",
                &[
                    ("page", Some("1".to_owned())),
                    ("limit", Some("8".to_owned())),
                ],
            )
        };
        assert_eq!(build(), build());
        assert_eq!(build(), "products:getAll:page:1:limit:8");
    }

    #[test]
    fn different_params_yield_distinct_keys() {
        let page = |n: i64| cache_key("products", "getAll", &[("page", Some(n.to_string()))]);
        assert_ne!(page(1), page(2));
    }

    #[test]
    fn none_params_are_omitted() {
        let key = cache_key(
            "orders",
            "getAll",
            &[
                ("status", None),
                ("page", Some("1".to_owned())),
                ("search", None),
            ],
        );
        assert_eq!(key, "orders:getAll:page:1");
    }

    #[test]
    fn empty_string_is_not_the_same_as_absent() {
        let absent = cache_key("products", "getAll", &[("search", None)]);
        let empty = cache_key("products", "getAll", &[("search", Some(String::new()))]);
        assert_ne!(absent, empty);
    }
}
