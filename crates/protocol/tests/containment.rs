use proptest::prelude::*;
use schemefs_protocol::*;
use std::path::Path;

fn segment() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("..".to_owned()),
        Just(".".to_owned()),
        Just("%2e%2e".to_owned()),
        Just("..%2F..".to_owned()),
        Just("..%5C..".to_owned()),
        Just("/etc".to_owned()),
        Just("C:".to_owned()),
        Just(String::new()),
        "[a-z0-9_.-]{1,8}",
    ]
}

fn request_path() -> impl Strategy<Value = String> {
    prop::collection::vec(segment(), 0..10).prop_map(|parts| format!("/{}", parts.join("/")))
}

proptest! {
    #[test]
    fn direct_resolution_stays_inside_root(host in segment(), path in request_path()) {
        let root = Path::new("/srv/bundle/web");
        match resolve_direct(root, &host, &path) {
            Ok(resolved) => {
                prop_assert!(resolved.path().starts_with(root), "{} escaped", resolved.path().display());
                prop_assert_eq!(lexical_normalize(resolved.path()), resolved.path());
            },
            Err(err) => prop_assert!(matches!(err, ProtocolError::Forbidden { .. }), "{err}"),
        }
    }

    #[test]
    fn joined_paths_are_normalized_descendants(path in request_path()) {
        let root = Path::new("/srv/bundle");
        if let Ok(decoded) = decode_request_path(&path) {
            if let Ok(joined) = contained_join(root, &[&decoded]) {
                prop_assert!(is_contained(root, &joined));
                prop_assert!(!joined.components().any(|c| matches!(c, std::path::Component::ParentDir)));
            }
        }
    }
}
