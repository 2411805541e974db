//! Property-based tests for remote address parsing and joining.
//!
//! These tests use proptest to generate random inputs and verify that
//! invariants hold for all possible inputs.

#[cfg(test)]
mod proptest_tests {
    use crate::address::{AddressKind, RemoteAddress};
    use proptest::prelude::*;
    use std::path::{Component, Path};

    fn optional(prefix: &str, value: Option<String>, suffix: &str) -> String {
        value.map_or_else(String::new, |v| format!("{}{}{}", prefix, v, suffix))
    }

    // ============================================================================
    // parse / deparse property tests
    // ============================================================================

    proptest! {
        /// Property: parse accepts any string
        #[test]
        fn parse_never_panics(input in ".*") {
            let _ = RemoteAddress::parse(&input);
        }

        /// Property: parse is deterministic
        #[test]
        fn parse_is_deterministic(input in ".*") {
            prop_assert_eq!(RemoteAddress::parse(&input), RemoteAddress::parse(&input));
        }

        /// Property: a URL address deparses to exactly its input
        #[test]
        fn url_round_trips(
            scheme in "[a-z]{2,6}",
            user in proptest::option::of("[a-z][a-z0-9_]{0,7}"),
            host in "[a-z0-9][a-z0-9.-]{0,14}",
            port in proptest::option::of("[1-9][0-9]{0,4}"),
            path in "/[a-zA-Z0-9/._-]{0,30}",
        ) {
            // `file://` always means a local path
            prop_assume!(scheme != "file");
            let input = format!(
                "{}://{}{}{}{}",
                scheme,
                optional("", user, "@"),
                host,
                optional(":", port, ""),
                path
            );
            let parsed = RemoteAddress::parse(&input);
            prop_assert_eq!(parsed.kind(), AddressKind::Url);
            prop_assert_eq!(parsed.host(), host.as_str());
            prop_assert_eq!(parsed.path(), path.as_str());
            prop_assert_eq!(parsed.deparse(), input);
        }

        /// Property: an scp-like address deparses to exactly its input
        #[test]
        fn scp_round_trips(
            user in proptest::option::of("[a-z][a-z0-9_]{0,7}"),
            host in "[a-z0-9][a-z0-9.-]{0,14}",
            path in "[a-zA-Z0-9._-][a-zA-Z0-9/._-]{0,30}",
        ) {
            let input = format!("{}{}:{}", optional("", user, "@"), host, path);
            let parsed = RemoteAddress::parse(&input);
            prop_assert_eq!(parsed.kind(), AddressKind::Scp);
            prop_assert_eq!(parsed.path(), path.as_str());
            prop_assert_eq!(parsed.deparse(), input.clone());
            prop_assert_eq!(RemoteAddress::parse(&parsed.deparse()), parsed);
        }
    }

    // ============================================================================
    // join property tests
    // ============================================================================

    proptest! {
        /// Property: joining an absolute path replaces the path and keeps the rest
        #[test]
        fn join_absolute_replaces_path(
            base in "/[a-z]{1,8}(/[a-z]{1,8}){0,4}",
            absolute in "/[a-z]{1,8}(/[a-z]{1,8}){0,4}",
        ) {
            let parent = RemoteAddress::parse(&format!("ssh://git@host:22{}", base));
            let joined = parent.join(&absolute);
            prop_assert_eq!(joined.path(), absolute.as_str());
            prop_assert_eq!(joined.host(), parent.host());
            prop_assert_eq!(joined.user(), parent.user());
            prop_assert_eq!(joined.port(), parent.port());
            prop_assert_eq!(joined.scheme(), parent.scheme());
        }

        /// Property: each leading `../` removes exactly one trailing component
        #[test]
        fn join_parent_segments_pop_components(
            components in proptest::collection::vec("[a-z]{1,8}", 1..6),
            ups in 0usize..8,
            leaf in "[a-z]{1,8}\\.git",
        ) {
            let parent = RemoteAddress::parse(
                &format!("ssh://host/{}", components.join("/")),
            );
            let relative = format!("{}{}", "../".repeat(ups), leaf);

            let kept = components.len().saturating_sub(ups);
            let mut expected: Vec<&str> =
                components[..kept].iter().map(String::as_str).collect();
            expected.push(&leaf);

            let joined = parent.join(&relative);
            prop_assert_eq!(joined.path(), format!("/{}", expected.join("/")));
        }

        /// Property: the local target of any address lies under the root,
        /// with no `.` or `..` component left to climb out of it
        #[test]
        fn local_path_is_under_root(input in "[ -~]{0,40}") {
            let root = Path::new("/srv/mirrors");
            let target = RemoteAddress::parse(&input).local_path(root);
            prop_assert!(target.starts_with(root));
            prop_assert!(target
                .components()
                .all(|c| !matches!(c, Component::ParentDir | Component::CurDir)));
        }

        /// Property: dot segments spliced into a path never change its target
        #[test]
        fn local_path_ignores_dot_segments(
            components in proptest::collection::vec("[a-z]{1,8}", 1..6),
            detour in "[a-z]{1,8}",
            at in 0usize..6,
        ) {
            let root = Path::new("/srv/mirrors");
            let at = at.min(components.len());
            let mut dotted: Vec<&str> = components.iter().map(String::as_str).collect();
            dotted.insert(at, "..");
            dotted.insert(at, &detour);
            dotted.insert(at, ".");

            let plain = RemoteAddress::parse(&format!("ssh://host/{}", components.join("/")));
            let spliced = RemoteAddress::parse(&format!("ssh://host/{}", dotted.join("/")));
            prop_assert_eq!(plain.local_path(root), spliced.local_path(root));
        }

        /// Property: climbing with `..` never reaches above the root
        #[test]
        fn local_path_clamps_parent_segments(
            ups in 1usize..10,
            leaf in "[a-z]{1,8}\\.git",
        ) {
            let root = Path::new("/srv/mirrors");
            let input = format!("ssh://host/{}{}", "../".repeat(ups), leaf);
            let target = RemoteAddress::parse(&input).local_path(root);
            prop_assert_eq!(target, root.join(&leaf));
        }
    }
}
