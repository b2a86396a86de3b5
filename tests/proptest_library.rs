use std::path::Path;

use a2dl::library::{parse_mxlibrary_slice, parse_mxlibrary_str};
use proptest::prelude::*;

mod proptest_helpers;

proptest! {
    #![proptest_config(proptest_helpers::proptest_config())]

    #[test]
    fn library_container_preserves_icon_attributes(doc in proptest_helpers::arb_icon_doc(4)) {
        let library = doc.library();
        let icon = &library.icons()[0];
        let expected = icon.to_object(library.placement(icon));

        let raw = library.to_mxlibrary_string().expect("serialize library");
        let entries = parse_mxlibrary_str(&raw, Path::new("generated.xml")).expect("parse library");
        prop_assert_eq!(entries.len(), 1);

        let object = entries[0].object().expect("entry object");
        prop_assert_eq!(object.attr("name"), Some(doc.name.as_str()));
        prop_assert_eq!(object.attr("id"), Some(doc.name.as_str()));
        prop_assert_eq!(&object.attributes, &expected.attributes);

        for section in &doc.sections {
            let joined = section.lines.join("\n");
            prop_assert_eq!(object.attr(&section.attribute), Some(joined.as_str()));
            prop_assert!(section
                .attribute
                .starts_with(|c: char| c.is_ascii_alphabetic() || c == '_'));
            prop_assert!(section
                .attribute
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-')));
        }
    }

    #[test]
    fn container_parser_never_panics(bytes in proptest::collection::vec(any::<u8>(), 0..256)) {
        let _ = parse_mxlibrary_slice(&bytes);
    }
}
