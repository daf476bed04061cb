#![allow(clippy::uninlined_format_args)]

use proptest::prelude::*;
use tincture::{RESET, Style};

const NAMES: [&str; 9] = [
    "black", "red", "green", "yellow", "blue", "magenta", "cyan", "white", "default",
];

proptest! {
    #[test]
    fn painted_text_is_preserved_between_escapes(
        name in prop::sample::select(NAMES.to_vec()),
        attrs in "[bdiuBrsh]{0,4}",
        text in "\\PC{1,60}",
    ) {
        let spec = if attrs.is_empty() { name.to_string() } else { format!("{}+{}", name, attrs) };
        let style = Style::parse(&spec).unwrap();
        let painted = style.paint(&text);

        prop_assert!(painted.starts_with("\x1b["));
        prop_assert!(painted.ends_with(RESET));
        let body = &painted[..painted.len() - RESET.len()];
        prop_assert!(body.ends_with(text.as_str()));
    }

    #[test]
    fn palette_indices_always_parse(n in 0u16..=255) {
        let style = Style::parse(&n.to_string()).unwrap();
        let expected = format!("\x1b[38;5;{}mx{}", n, RESET);
        prop_assert_eq!(style.paint("x"), expected);
    }

    #[test]
    fn out_of_range_indices_are_rejected(n in 256u32..100_000) {
        prop_assert!(Style::parse(&n.to_string()).is_err());
    }

    #[test]
    fn plain_style_is_identity(text in "\\PC{0,60}") {
        prop_assert_eq!(Style::plain().paint(&text), text);
    }
}
